#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

mod config;
mod error;
mod lifecycle;
mod platform;
mod render_loop;
mod renderer;

use config::{device_features, ContextConfig};
use error::{RenderError, Result};
use lifecycle::Lifecycle;
use platform::Platform;
use renderer::Renderer;

use gfx_hal::{prelude::*, Features};
use std::process;

fn main() {
    env_logger::init();
    println!("Hello, Triangle!");

    let config = ContextConfig::default();
    let mut lifecycle = Lifecycle::new();

    if let Err(err) = run(&config, &mut lifecycle) {
        log::error!("{} (after {})", err, lifecycle.stage());
        lifecycle.fail();
        process::exit(err.exit_code());
    }
}

fn run(config: &ContextConfig, lifecycle: &mut Lifecycle) -> Result<()> {
    let mut platform = Platform::new(config)?;

    let instance = back::Instance::create(config.app_name, config.app_version)
        .map_err(|err| RenderError::ContextCreation(format!("backend: {:?}", err)))?;
    let mut surface = unsafe { instance.create_surface(&platform.window) }
        .map_err(|err| RenderError::ContextCreation(format!("surface: {:?}", err)))?;

    let result = render(&instance, &mut surface, &mut platform, config, lifecycle);

    unsafe {
        instance.destroy_surface(surface);
    }
    result
}

fn render(
    instance: &back::Instance,
    surface: &mut <back::Backend as gfx_hal::Backend>::Surface,
    platform: &mut Platform,
    config: &ContextConfig,
    lifecycle: &mut Lifecycle,
) -> Result<()> {
    let mut adapters = instance.enumerate_adapters();
    if adapters.is_empty() {
        return Err(RenderError::ContextCreation("no graphics adapter".to_owned()));
    }
    let adapter = adapters.remove(0);
    log::info!("adapter: {}", adapter.info.name);

    let family = adapter
        .queue_families
        .iter()
        .find(|family| {
            surface.supports_queue_family(family) && family.queue_type().supports_graphics()
        })
        .ok_or_else(|| RenderError::ContextCreation("no graphics queue family".to_owned()))?;

    let features = device_features(adapter.physical_device.features());
    if !features.contains(Features::NDC_Y_UP) {
        log::warn!("adapter lacks NDC_Y_UP, the image will be flipped vertically");
    }
    let mut gpu = unsafe {
        adapter
            .physical_device
            .open(&[(family, &[1.0])], features)
    }
    .map_err(|err| RenderError::ContextCreation(format!("device: {:?}", err)))?;

    let queue_group = gpu
        .queue_groups
        .pop()
        .ok_or_else(|| RenderError::ContextCreation("no queue group".to_owned()))?;
    let device = gpu.device;
    lifecycle.advance();

    let mut renderer = Renderer::new(surface, &adapter, &device, queue_group, config, lifecycle)?;

    lifecycle.advance();
    let presented = render_loop::run(platform, &mut renderer)?;
    log::info!("presented {} frames", presented);

    drop(renderer);
    lifecycle.advance();
    Ok(())
}
