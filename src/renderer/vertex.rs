use gfx_hal::{format as f, pso};
use std::mem;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub const fn splat(n: f32) -> Self {
        Vec2 { x: n, y: n }
    }
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub const fn splat(n: f32) -> Self {
        Vec3 { x: n, y: n, z: n }
    }
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Vec4 { x, y, z, w }
    }

    pub const fn splat(n: f32) -> Self {
        Vec4 {
            x: n,
            y: n,
            z: n,
            w: n,
        }
    }
}

/// Per-vertex record. Field order is the attribute location order declared
/// by the vertex shader.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub texcoord: Vec2,
    pub normal: Vec3,
    pub color: Vec4,
}

/// Input-assembly state: one interleaved vertex buffer and the attributes read from it.
pub struct VertexInput {
    pub buffer: pso::VertexBufferDesc,
    pub attributes: [pso::AttributeDesc; 4],
}

const POSITION_OFFSET: u32 = 0;
const TEXCOORD_OFFSET: u32 = POSITION_OFFSET + mem::size_of::<Vec3>() as u32;
const NORMAL_OFFSET: u32 = TEXCOORD_OFFSET + mem::size_of::<Vec2>() as u32;
const COLOR_OFFSET: u32 = NORMAL_OFFSET + mem::size_of::<Vec3>() as u32;

const fn attribute(location: u32, format: f::Format, offset: u32) -> pso::AttributeDesc {
    pso::AttributeDesc {
        location,
        binding: 0,
        element: pso::Element { format, offset },
    }
}

impl Vertex {
    pub const STRIDE: u32 = mem::size_of::<Vertex>() as u32;

    pub const INPUT: VertexInput = VertexInput {
        buffer: pso::VertexBufferDesc {
            binding: 0,
            stride: Self::STRIDE,
            rate: pso::VertexInputRate::Vertex,
        },
        attributes: [
            attribute(0, f::Format::Rgb32Sfloat, POSITION_OFFSET),
            attribute(1, f::Format::Rg32Sfloat, TEXCOORD_OFFSET),
            attribute(2, f::Format::Rgb32Sfloat, NORMAL_OFFSET),
            attribute(3, f::Format::Rgba32Sfloat, COLOR_OFFSET),
        ],
    };
}

const WHITE_NORMAL: Vec3 = Vec3::splat(1.0);

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: Vec3::new(-0.5, -0.5, 0.0),
        texcoord: Vec2::splat(0.0),
        normal: WHITE_NORMAL,
        color: Vec4::new(1.0, 0.0, 0.0, 1.0),
    },
    Vertex {
        position: Vec3::new(0.0, 0.5, 0.0),
        texcoord: Vec2::splat(0.0),
        normal: WHITE_NORMAL,
        color: Vec4::new(0.0, 1.0, 0.0, 1.0),
    },
    Vertex {
        position: Vec3::new(0.5, -0.5, 0.0),
        texcoord: Vec2::splat(0.0),
        normal: WHITE_NORMAL,
        color: Vec4::new(0.0, 0.0, 1.0, 1.0),
    },
];

pub const INDICES: [u32; 3] = [0, 1, 2];

#[cfg(test)]
mod tests {
    use super::*;

    fn field_offset<T>(base: &Vertex, field: &T) -> usize {
        field as *const T as usize - base as *const Vertex as usize
    }

    #[test]
    fn constructors() {
        assert_eq!(Vec2::default(), Vec2::new(0.0, 0.0));
        assert_eq!(Vec3::splat(2.5), Vec3::new(2.5, 2.5, 2.5));
        assert_eq!(Vec4::splat(-1.0), Vec4::new(-1.0, -1.0, -1.0, -1.0));
        assert_eq!(Vec4::default(), Vec4::splat(0.0));
    }

    #[test]
    fn layout_has_no_padding() {
        assert_eq!(mem::size_of::<Vertex>(), (3 + 2 + 3 + 4) * mem::size_of::<f32>());

        let v = Vertex::default();
        assert_eq!(field_offset(&v, &v.position), 0);
        assert_eq!(field_offset(&v, &v.texcoord), 12);
        assert_eq!(field_offset(&v, &v.normal), 20);
        assert_eq!(field_offset(&v, &v.color), 32);
    }

    #[test]
    fn attributes_match_fields() {
        let v = Vertex::default();
        let offsets = [
            field_offset(&v, &v.position),
            field_offset(&v, &v.texcoord),
            field_offset(&v, &v.normal),
            field_offset(&v, &v.color),
        ];
        for (location, attr) in Vertex::INPUT.attributes.iter().enumerate() {
            assert_eq!(attr.location as usize, location);
            assert_eq!(attr.binding, Vertex::INPUT.buffer.binding);
            assert_eq!(attr.element.offset as usize, offsets[location]);
        }
        assert_eq!(Vertex::INPUT.buffer.stride as usize, mem::size_of::<Vertex>());
    }

    #[test]
    fn uploaded_bytes_are_the_records_in_order() {
        let mut expected = Vec::new();
        for v in TRIANGLE.iter() {
            let floats = [
                v.position.x, v.position.y, v.position.z,
                v.texcoord.x, v.texcoord.y,
                v.normal.x, v.normal.y, v.normal.z,
                v.color.x, v.color.y, v.color.z, v.color.w,
            ];
            for c in floats.iter() {
                expected.extend_from_slice(&c.to_ne_bytes());
            }
        }

        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE);
        assert_eq!(bytes.len(), 3 * mem::size_of::<Vertex>());
        assert_eq!(bytes, &expected[..]);
    }

    #[test]
    fn indices_form_one_triangle_over_every_vertex() {
        assert_eq!(INDICES.len() % 3, 0);
        assert_eq!(INDICES.len() / 3, 1);

        let mut seen = vec![false; TRIANGLE.len()];
        for &i in INDICES.iter() {
            assert!(!seen[i as usize], "vertex {} referenced twice", i);
            seen[i as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn centroid_color_is_the_average() {
        let third = 1.0 / 3.0;
        let mut centroid = Vec4::default();
        for &i in INDICES.iter() {
            let c = TRIANGLE[i as usize].color;
            centroid.x += c.x * third;
            centroid.y += c.y * third;
            centroid.z += c.z * third;
            centroid.w += c.w * third;
        }
        for &(got, want) in [
            (centroid.x, third),
            (centroid.y, third),
            (centroid.z, third),
            (centroid.w, 1.0),
        ]
        .iter()
        {
            assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
        }
    }
}
