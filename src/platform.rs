use crate::config::ContextConfig;
use crate::error::{RenderError, Result};
use crate::render_loop::EventSource;

use winit::{
    dpi,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::desktop::EventLoopExtDesktop,
    window::{Window, WindowBuilder},
};

/// The single window and the event loop feeding it.
pub struct Platform {
    event_loop: EventLoop<()>,
    pub window: Window,
    close_requested: bool,
}

impl Platform {
    pub fn new(config: &ContextConfig) -> Result<Self> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(config.title)
            .with_inner_size(dpi::Size::Physical(dpi::PhysicalSize::new(
                config.dims.width,
                config.dims.height,
            )))
            .with_resizable(config.resizable)
            .build(&event_loop)
            .map_err(|err| RenderError::ContextCreation(format!("window: {}", err)))?;

        Ok(Platform {
            event_loop,
            window,
            close_requested: false,
        })
    }
}

impl EventSource for Platform {
    fn poll_events(&mut self) {
        let window_id = self.window.id();
        let close_requested = &mut self.close_requested;
        self.event_loop.run_return(|event, _, control_flow| {
            // Drain what is queued, then hand control back to the render loop.
            *control_flow = ControlFlow::Exit;
            if let Event::WindowEvent {
                window_id: id,
                event: WindowEvent::CloseRequested,
            } = event
            {
                if id == window_id {
                    log::info!("close requested");
                    *close_requested = true;
                }
            }
        });
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }
}
