use crate::error::{RenderError, Result};
use gfx_hal::{buffer, prelude::*, Backend, Limits};
use std::mem::{self, ManuallyDrop};
use std::ptr;

pub struct Buffer<'a, B: Backend, T> {
    pub device: &'a B::Device,
    pub buf: ManuallyDrop<B::Buffer>,
    pub content: &'a [T],
    pub len: u64,
}

impl<'a, B: Backend, T: bytemuck::Pod> Buffer<'a, B, T> {
    pub fn new(
        device: &'a B::Device,
        content: &'a [T],
        usage: buffer::Usage,
        limits: &Limits,
    ) -> Result<Self> {
        let buffer_len = (content.len() * mem::size_of::<T>()) as u64;
        if buffer_len == 0 {
            return Err(RenderError::resource("buffer", "empty content"));
        }
        let memory_size = padded_size(buffer_len, limits.non_coherent_atom_size as u64);

        let buf = unsafe { device.create_buffer(memory_size, usage) }
            .map_err(|err| RenderError::resource("buffer", err))?;

        Ok(Buffer {
            device,
            buf: ManuallyDrop::new(buf),
            content,
            len: buffer_len,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.content)
    }
}

/// Rounds `len` up to a whole number of non-coherent atoms so the mapped range can be flushed.
fn padded_size(len: u64, atom: u64) -> u64 {
    if atom <= 1 {
        return len;
    }
    ((len + atom - 1) / atom) * atom
}

impl<'a, B: Backend, T> Drop for Buffer<'a, B, T> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_buffer(ManuallyDrop::into_inner(ptr::read(&self.buf)))
        }
    }
}
