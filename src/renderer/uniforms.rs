use crate::error::{RenderError, Result};
use gfx_hal::{prelude::*, pso, Backend};
use std::mem::ManuallyDrop;
use std::ptr;

/// Layout of the fragment shader's `Globals` block (set 0, binding 0).
///
/// The block is part of the pipeline interface but no descriptor set is
/// allocated or bound for it.
pub struct UniformLayout<'a, B: Backend> {
    device: &'a B::Device,
    pub set_layout: ManuallyDrop<B::DescriptorSetLayout>,
}

pub const GLOBALS_BINDING: u32 = 0;

impl<'a, B: Backend> UniformLayout<'a, B> {
    pub fn new(device: &'a B::Device) -> Result<Self> {
        let set_layout = unsafe {
            device.create_descriptor_set_layout(&[Self::globals_binding()], &[])
        }
        .map_err(|err| RenderError::resource("descriptor set layout", err))?;

        Ok(UniformLayout {
            device,
            set_layout: ManuallyDrop::new(set_layout),
        })
    }

    fn globals_binding() -> pso::DescriptorSetLayoutBinding {
        pso::DescriptorSetLayoutBinding {
            binding: GLOBALS_BINDING,
            ty: pso::DescriptorType::Buffer {
                ty: pso::BufferDescriptorType::Uniform,
                format: pso::BufferDescriptorFormat::Structured {
                    dynamic_offset: false,
                },
            },
            count: 1,
            stage_flags: pso::ShaderStageFlags::FRAGMENT,
            immutable_samplers: false,
        }
    }
}

impl<'a, B: Backend> Drop for UniformLayout<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_descriptor_set_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.set_layout,
                )));
        }
    }
}
