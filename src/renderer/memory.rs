use crate::error::{RenderError, Result};
use gfx_hal::{adapter::MemoryType, memory as m, prelude::*, Backend, MemoryTypeId};
use std::iter;
use std::mem::ManuallyDrop;
use std::ptr;

use super::buffer::Buffer;

/// A buffer together with the CPU-visible memory backing it. The content is
/// uploaded once at creation and never rewritten.
pub struct Memory<'a, B: Backend, T> {
    pub buffer: ManuallyDrop<Buffer<'a, B, T>>,
    memory: ManuallyDrop<B::Memory>,
}

impl<'a, B: Backend, T: bytemuck::Pod> Memory<'a, B, T> {
    pub fn new(mut buffer: Buffer<'a, B, T>, memory_types: &[MemoryType]) -> Result<Self> {
        let memory = Self::upload(&mut buffer, memory_types)?;
        Ok(Memory {
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
        })
    }

    fn upload(buffer: &mut Buffer<'a, B, T>, memory_types: &[MemoryType]) -> Result<B::Memory> {
        let device = buffer.device;
        unsafe {
            let buffer_req = device.get_buffer_requirements(&buffer.buf);
            let upload_type = Self::upload_type(memory_types, &buffer_req)?;
            let memory = device
                .allocate_memory(upload_type, buffer_req.size)
                .map_err(|err| RenderError::resource("device memory", err))?;

            let written = Self::write(device, &memory, buffer);
            if let Err(err) = written {
                device.free_memory(memory);
                return Err(err);
            }
            Ok(memory)
        }
    }

    unsafe fn write(
        device: &B::Device,
        memory: &B::Memory,
        buffer: &mut Buffer<'a, B, T>,
    ) -> Result<()> {
        device
            .bind_buffer_memory(memory, 0, &mut buffer.buf)
            .map_err(|err| RenderError::resource("device memory", err))?;
        let mapping = device
            .map_memory(memory, m::Segment::ALL)
            .map_err(|err| RenderError::resource("memory mapping", err))?;

        let bytes = buffer.bytes();
        ptr::copy_nonoverlapping(bytes.as_ptr(), mapping, bytes.len());

        let flushed = device.flush_mapped_memory_ranges(iter::once((memory, m::Segment::ALL)));
        device.unmap_memory(memory);
        flushed.map_err(|err| RenderError::resource("memory mapping", err))
    }

    fn upload_type(properties: &[MemoryType], buffer_req: &m::Requirements) -> Result<MemoryTypeId> {
        properties
            .iter()
            .enumerate()
            .position(|(id, mem_type)| {
                buffer_req.type_mask & (1 << id) != 0
                    && mem_type.properties.contains(m::Properties::CPU_VISIBLE)
            })
            .map(MemoryTypeId::from)
            .ok_or_else(|| RenderError::resource("device memory", "no CPU-visible memory type"))
    }
}

impl<'a, B: Backend, T> Drop for Memory<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            let device = self.buffer.device;
            ManuallyDrop::drop(&mut self.buffer);
            device.free_memory(ManuallyDrop::into_inner(ptr::read(&self.memory)))
        }
    }
}
