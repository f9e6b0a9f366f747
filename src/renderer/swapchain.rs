use crate::error::{RenderError, Result};
use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    pub dims: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
    present_mode: window::PresentMode,
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
        present_mode: window::PresentMode,
    ) -> Result<Self> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = formats.map_or(f::Format::Rgba8Unorm, |formats| pick_format(&formats));
        log::info!("surface format: {:?}", format);

        let viewport = pso::Viewport {
            rect: pso::Rect {
                x: 0,
                y: 0,
                w: dims.width as _,
                h: dims.height as _,
            },
            depth: 0.0..1.0,
        };

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport,
            format,
            dims,
            present_mode,
        };

        swapchain.recreate()?;
        Ok(swapchain)
    }

    pub fn recreate(&mut self) -> Result<()> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);

        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        if caps.present_modes.contains(self.present_mode) {
            swap_config.present_mode = self.present_mode;
        } else {
            log::warn!(
                "present mode {:?} unsupported, using {:?}",
                self.present_mode,
                swap_config.present_mode
            );
        }
        let extent = swap_config.extent;
        unsafe {
            self.surface
                .configure_swapchain(&self.device, swap_config)
                .map_err(|err| RenderError::resource("swapchain", err))?;
        }

        self.viewport.rect.w = extent.width as _;
        self.viewport.rect.h = extent.height as _;
        Ok(())
    }
}

/// Prefers a linear (`Unorm`) format so fragment colours are stored as written,
/// without sRGB encoding. Falls back to the first format offered.
pub fn pick_format(formats: &[f::Format]) -> f::Format {
    formats
        .iter()
        .find(|format| format.base_format().1 == f::ChannelType::Unorm)
        .or_else(|| formats.first())
        .copied()
        .unwrap_or(f::Format::Rgba8Unorm)
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        unsafe { self.surface.unconfigure_swapchain(&self.device) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_format_wins_over_srgb() {
        let formats = [f::Format::Bgra8Srgb, f::Format::Bgra8Unorm, f::Format::Rgba8Srgb];
        assert_eq!(pick_format(&formats), f::Format::Bgra8Unorm);
    }

    #[test]
    fn srgb_is_never_picked_while_unorm_exists() {
        let formats = [f::Format::Rgba8Srgb, f::Format::Bgra8Srgb, f::Format::Rgba8Unorm];
        let picked = pick_format(&formats);
        assert_eq!(picked.base_format().1, f::ChannelType::Unorm);
    }

    #[test]
    fn falls_back_to_first_offered() {
        assert_eq!(pick_format(&[f::Format::Bgra8Srgb]), f::Format::Bgra8Srgb);
        assert_eq!(pick_format(&[]), f::Format::Rgba8Unorm);
    }
}
