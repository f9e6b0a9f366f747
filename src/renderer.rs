use gfx_hal::{
    adapter, buffer as b, command, format as f, image as i, pass, pool,
    prelude::*,
    queue::{QueueGroup, Submission},
    Backend, IndexType,
};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;

mod buffer;
mod memory;
mod owned;
pub mod program;
pub mod shader;
mod swapchain;
mod uniforms;
pub mod vertex;

use crate::config::ContextConfig;
use crate::error::{RenderError, Result};
use crate::lifecycle::Lifecycle;
use crate::render_loop::FramePresenter;
use buffer::Buffer;
use memory::Memory;
use owned::Owned;
use program::ShaderProgram;
use shader::{ShaderStage, FRAGMENT_SOURCE, VERTEX_SOURCE};
use swapchain::Swapchain;
use uniforms::UniformLayout;
use vertex::{Vertex, INDICES, TRIANGLE};

const FRAMES_IN_FLIGHT: usize = 2;

pub struct Renderer<'a, B: Backend> {
    frame: usize,
    device: &'a B::Device,
    queue_group: QueueGroup<B>,
    clear_color: [f32; 4],
    fps_counter: fps_counter::FPSCounter,
    command_buffers: Vec<B::CommandBuffer>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    uniforms: ManuallyDrop<UniformLayout<'a, B>>,
    vertices: ManuallyDrop<Memory<'a, B, Vertex>>,
    indices: ManuallyDrop<Memory<'a, B, u32>>,
    swapchain: ManuallyDrop<Swapchain<'a, B>>,
    program: ManuallyDrop<ShaderProgram<'a, B>>,
    // Released after `drop` has waited for the device to go idle.
    render_pass: Owned<'a, B::RenderPass>,
    command_pool: Owned<'a, B::CommandPool>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    /// Runs the setup sequence on an already current context: geometry
    /// upload, then shader compile, link and validate. The lifecycle is
    /// advanced after each phase.
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        queue_group: QueueGroup<B>,
        config: &ContextConfig,
        lifecycle: &mut Lifecycle,
    ) -> Result<Self> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let swapchain = Swapchain::new(device, surface, adapter, config.dims, config.present_mode())?;
        let render_pass = Self::create_render_pass(device, swapchain.format)?;

        let vertex_buffer = Buffer::new(device, &TRIANGLE, b::Usage::VERTEX, &limits)?;
        let vertices = Memory::new(vertex_buffer, &memory_types)?;
        let index_buffer = Buffer::new(device, &INDICES, b::Usage::INDEX, &limits)?;
        let indices = Memory::new(index_buffer, &memory_types)?;
        log::info!(
            "uploaded {} vertices ({} bytes), {} indices",
            TRIANGLE.len(),
            vertices.buffer.len,
            INDICES.len()
        );
        lifecycle.advance();

        let uniforms = UniformLayout::new(device)?;
        let mut program = ShaderProgram::new(device, &*uniforms.set_layout)?;
        program.compile(ShaderStage::Vertex, VERTEX_SOURCE)?;
        program.compile(ShaderStage::Fragment, FRAGMENT_SOURCE)?;
        lifecycle.advance();

        program.link(&*render_pass, 1, &Vertex::INPUT)?;
        lifecycle.advance();

        program.validate()?;
        lifecycle.advance();

        let command_pool = unsafe {
            device.create_command_pool(
                queue_group.family,
                pool::CommandPoolCreateFlags::empty(),
            )
        }
        .map_err(|err| RenderError::resource("command pool", err))?;
        let mut command_pool =
            Owned::new(command_pool, move |pool| unsafe { device.destroy_command_pool(pool) });

        let command_buffers = Self::allocate_command_buffers(&mut command_pool, FRAMES_IN_FLIGHT);
        let submission_complete_semaphores = Self::create_semaphores(device, FRAMES_IN_FLIGHT)?;
        let submission_complete_fences = Self::create_fences(device, FRAMES_IN_FLIGHT)?;

        Ok(Renderer {
            device,
            queue_group,
            clear_color: config.clear_color,
            fps_counter: fps_counter::FPSCounter::new(),
            submission_complete_semaphores,
            submission_complete_fences,
            command_pool,
            uniforms: ManuallyDrop::new(uniforms),
            vertices: ManuallyDrop::new(vertices),
            indices: ManuallyDrop::new(indices),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass,
            program: ManuallyDrop::new(program),
            command_buffers,
            frame: 0,
        })
    }

    /// Records and submits one frame. Returns `false` if the swapchain had to
    /// be recreated before an image could be acquired.
    pub fn render(&mut self) -> Result<bool> {
        let surface_image = unsafe {
            match self.swapchain.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(err) => {
                    log::warn!("acquire failed ({:?}), recreating swapchain", err);
                    self.swapchain.recreate()?;
                    return Ok(false);
                }
            }
        };

        let frame_buffer = unsafe {
            self.device.create_framebuffer(
                &self.render_pass,
                iter::once(surface_image.borrow()),
                i::Extent {
                    width: self.swapchain.dims.width,
                    height: self.swapchain.dims.height,
                    depth: 1,
                },
            )
        }
        .map_err(|err| RenderError::Frame(format!("framebuffer: {:?}", err)))?;

        let frame_idx = self.frame % FRAMES_IN_FLIGHT;

        unsafe {
            let fence = &self.submission_complete_fences[frame_idx];
            self.device
                .wait_for_fence(fence, !0)
                .map_err(|err| RenderError::Frame(format!("fence wait: {:?}", err)))?;
            self.device
                .reset_fence(fence)
                .map_err(|err| RenderError::Frame(format!("fence reset: {:?}", err)))?;
            if frame_idx == 0 {
                self.command_pool.reset(false);
            }
        }

        let pipeline = self
            .program
            .pipeline()
            .ok_or_else(|| RenderError::Frame("program is not linked".to_owned()))?;

        let cmd_buffer = &mut self.command_buffers[frame_idx];
        let presented = unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[self.swapchain.viewport.rect]);
            cmd_buffer.bind_graphics_pipeline(pipeline);
            cmd_buffer.bind_vertex_buffers(
                0,
                iter::once((&*self.vertices.buffer.buf, b::SubRange::WHOLE)),
            );
            cmd_buffer.bind_index_buffer(b::IndexBufferView {
                buffer: &*self.indices.buffer.buf,
                range: b::SubRange::WHOLE,
                index_type: IndexType::U32,
            });
            cmd_buffer.begin_render_pass(
                &self.render_pass,
                &frame_buffer,
                self.swapchain.viewport.rect,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: self.clear_color,
                    },
                }],
                command::SubpassContents::Inline,
            );
            cmd_buffer.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: None,
                signal_semaphores: iter::once(&self.submission_complete_semaphores[frame_idx]),
            };

            let queue = &mut self.queue_group.queues[0];
            queue.submit(
                submission,
                Some(&self.submission_complete_fences[frame_idx]),
            );

            let result = queue.present_surface(
                &mut self.swapchain.surface,
                surface_image,
                Some(&self.submission_complete_semaphores[frame_idx]),
            );

            self.device.destroy_framebuffer(frame_buffer);
            result
        };

        self.frame += 1;
        if let Err(err) = presented {
            log::warn!("present failed ({:?}), recreating swapchain", err);
            self.swapchain.recreate()?;
            return Ok(false);
        }
        log::debug!("frame {} ({} fps)", self.frame, self.fps_counter.tick());
        Ok(true)
    }

    fn create_render_pass(device: &'a B::Device, format: f::Format) -> Result<Owned<'a, B::RenderPass>> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        let render_pass = unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(|err| RenderError::resource("render pass", err))?;
        Ok(Owned::new(render_pass, move |pass| unsafe {
            device.destroy_render_pass(pass)
        }))
    }

    fn allocate_command_buffers(
        command_pool: &mut B::CommandPool,
        frames_in_flight: usize,
    ) -> Vec<B::CommandBuffer> {
        (0..frames_in_flight)
            .map(|_| unsafe { command_pool.allocate_one(command::Level::Primary) })
            .collect()
    }

    fn create_semaphores(device: &B::Device, frames_in_flight: usize) -> Result<Vec<B::Semaphore>> {
        (0..frames_in_flight)
            .map(|_| {
                device
                    .create_semaphore()
                    .map_err(|err| RenderError::resource("semaphore", err))
            })
            .collect()
    }

    fn create_fences(device: &B::Device, frames_in_flight: usize) -> Result<Vec<B::Fence>> {
        (0..frames_in_flight)
            .map(|_| {
                device
                    .create_fence(true)
                    .map_err(|err| RenderError::resource("fence", err))
            })
            .collect()
    }
}

impl<'a, B: Backend> FramePresenter for Renderer<'a, B> {
    fn present_frame(&mut self) -> Result<bool> {
        self.render()
    }
}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        let device = self.device;
        if let Err(err) = device.wait_idle() {
            log::error!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            ManuallyDrop::drop(&mut self.program);
            ManuallyDrop::drop(&mut self.uniforms);
            ManuallyDrop::drop(&mut self.indices);
            ManuallyDrop::drop(&mut self.vertices);
            for s in self.submission_complete_semaphores.drain(..) {
                device.destroy_semaphore(s);
            }

            for f in self.submission_complete_fences.drain(..) {
                device.destroy_fence(f);
            }

            ManuallyDrop::drop(&mut self.swapchain);
        }
    }
}
