use crate::error::{bounded_log, RenderError, Result};
use gfx_hal::{pass::Subpass, prelude::*, pso, Backend};
use std::collections::HashSet;
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

use super::shader::{self, ShaderStage};
use super::vertex::VertexInput;

const ENTRY_NAME: &str = "main";

/// A vertex and a fragment shader linked into one graphics pipeline.
///
/// Mirrors the compile -> link -> validate sequence: each step only succeeds
/// once the previous one has.
pub struct ShaderProgram<'a, B: Backend> {
    device: &'a B::Device,
    vertex: Option<B::ShaderModule>,
    fragment: Option<B::ShaderModule>,
    pipeline_layout: ManuallyDrop<B::PipelineLayout>,
    pipeline: Option<B::GraphicsPipeline>,
    linked: Option<LinkedInterface>,
}

/// The pipeline state a program was linked against.
#[derive(Debug, Clone)]
pub struct LinkedInterface {
    pub vertex_buffers: Vec<pso::VertexBufferDesc>,
    pub attributes: Vec<pso::AttributeDesc>,
    pub color_targets: usize,
    pub color_attachments: usize,
}

impl<'a, B: Backend> ShaderProgram<'a, B> {
    pub fn new(device: &'a B::Device, set_layout: &B::DescriptorSetLayout) -> Result<Self> {
        let pipeline_layout = unsafe { device.create_pipeline_layout(iter::once(set_layout), &[]) }
            .map_err(|err| RenderError::resource("pipeline layout", err))?;

        Ok(ShaderProgram {
            device,
            vertex: None,
            fragment: None,
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: None,
            linked: None,
        })
    }

    pub fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<()> {
        let device = self.device;
        let spirv = shader::compile(stage, source)?;
        let module = unsafe { device.create_shader_module(&spirv) }.map_err(|err| {
            RenderError::ShaderCompile {
                stage,
                log: bounded_log(&format!("{:?}", err)),
            }
        })?;

        let slot = match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        };
        if let Some(old) = slot.replace(module) {
            unsafe { device.destroy_shader_module(old) };
        }
        log::info!("compiled {} shader ({} words)", stage, spirv.len());
        Ok(())
    }

    pub fn link(
        &mut self,
        render_pass: &B::RenderPass,
        color_attachments: usize,
        input: &VertexInput,
    ) -> Result<()> {
        let (vs_module, fs_module) = match (&self.vertex, &self.fragment) {
            (Some(vs), Some(fs)) => (vs, fs),
            (vs, _) => {
                let missing = if vs.is_none() {
                    ShaderStage::Vertex
                } else {
                    ShaderStage::Fragment
                };
                return Err(RenderError::ProgramLink {
                    log: format!("no compiled {} shader attached", missing),
                });
            }
        };

        let shader_entries = pso::GraphicsShaderSet {
            vertex: pso::EntryPoint {
                entry: ENTRY_NAME,
                module: vs_module,
                specialization: pso::Specialization::default(),
            },
            hull: None,
            domain: None,
            geometry: None,
            fragment: Some(pso::EntryPoint {
                entry: ENTRY_NAME,
                module: fs_module,
                specialization: pso::Specialization::default(),
            }),
        };

        let subpass = Subpass {
            index: 0,
            main_pass: render_pass,
        };

        let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
            shader_entries,
            pso::Primitive::TriangleList,
            pso::Rasterizer::FILL,
            &*self.pipeline_layout,
            subpass,
        );
        pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
            mask: pso::ColorMask::ALL,
            blend: None,
        });
        pipeline_desc.vertex_buffers.push(input.buffer.clone());
        pipeline_desc
            .attributes
            .extend(input.attributes.iter().cloned());

        let pipeline = unsafe { self.device.create_graphics_pipeline(&pipeline_desc, None) }
            .map_err(|err| RenderError::ProgramLink {
                log: bounded_log(&format!("{:?}", err)),
            })?;

        let linked = LinkedInterface {
            vertex_buffers: pipeline_desc.vertex_buffers.clone(),
            attributes: pipeline_desc.attributes.clone(),
            color_targets: pipeline_desc.blender.targets.len(),
            color_attachments,
        };

        if let Some(old) = self.pipeline.replace(pipeline) {
            unsafe { self.device.destroy_graphics_pipeline(old) };
        }
        self.linked = Some(linked);
        Ok(())
    }

    /// Checks the linked pipeline against the vertex input and render pass it was built for.
    pub fn validate(&self) -> Result<()> {
        let linked = self.linked.as_ref().ok_or_else(|| RenderError::ProgramValidation {
            log: "program has not been linked".to_owned(),
        })?;
        validate_interface(linked).map_err(|problems| RenderError::ProgramValidation {
            log: bounded_log(&problems.join("\n")),
        })
    }

    pub fn pipeline(&self) -> Option<&B::GraphicsPipeline> {
        self.pipeline.as_ref()
    }
}

pub fn validate_interface(linked: &LinkedInterface) -> std::result::Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if linked.vertex_buffers.is_empty() {
        problems.push("no vertex buffer is described".to_owned());
    }
    if linked.color_targets != linked.color_attachments {
        problems.push(format!(
            "{} color targets for {} color attachments",
            linked.color_targets, linked.color_attachments
        ));
    }

    let mut locations = HashSet::new();
    for attr in &linked.attributes {
        if !locations.insert(attr.location) {
            problems.push(format!("location {} is bound twice", attr.location));
        }

        let buffer = match linked
            .vertex_buffers
            .iter()
            .find(|desc| desc.binding == attr.binding)
        {
            Some(buffer) => buffer,
            None => {
                problems.push(format!(
                    "location {} reads undescribed binding {}",
                    attr.location, attr.binding
                ));
                continue;
            }
        };

        let size = attr.element.format.surface_desc().bits as u32 / 8;
        if attr.element.offset + size > buffer.stride {
            problems.push(format!(
                "location {} ({:?} at offset {}) overruns stride {}",
                attr.location, attr.element.format, attr.element.offset, buffer.stride
            ));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

impl<'a, B: Backend> Drop for ShaderProgram<'a, B> {
    fn drop(&mut self) {
        unsafe {
            if let Some(pipeline) = self.pipeline.take() {
                self.device.destroy_graphics_pipeline(pipeline);
            }
            for module in self.vertex.take().into_iter().chain(self.fragment.take()) {
                self.device.destroy_shader_module(module);
            }
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::vertex::Vertex;
    use gfx_hal::format as f;

    fn triangle_interface() -> LinkedInterface {
        LinkedInterface {
            vertex_buffers: vec![Vertex::INPUT.buffer.clone()],
            attributes: Vertex::INPUT.attributes.to_vec(),
            color_targets: 1,
            color_attachments: 1,
        }
    }

    #[test]
    fn triangle_layout_is_valid() {
        assert_eq!(validate_interface(&triangle_interface()), Ok(()));
    }

    #[test]
    fn overrunning_attribute_is_rejected() {
        let mut linked = triangle_interface();
        linked.attributes[3].element.format = f::Format::Rgba32Sfloat;
        linked.attributes[3].element.offset = 40;
        let problems = validate_interface(&linked).unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("location 3"));
    }

    #[test]
    fn duplicate_location_is_rejected() {
        let mut linked = triangle_interface();
        linked.attributes[1].location = 0;
        assert!(validate_interface(&linked).is_err());
    }

    #[test]
    fn unknown_binding_is_rejected() {
        let mut linked = triangle_interface();
        linked.attributes[2].binding = 1;
        let problems = validate_interface(&linked).unwrap_err();
        assert!(problems[0].contains("binding 1"));
    }

    #[test]
    fn target_count_must_match_attachments() {
        let mut linked = triangle_interface();
        linked.color_targets = 0;
        assert!(validate_interface(&linked).is_err());
    }
}
