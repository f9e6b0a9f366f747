use gfx_hal::{window, Features};

/// Fixed parameters of the window and graphics context.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub app_name: &'static str,
    /// Application version reported to the backend instance.
    pub app_version: u32,
    pub title: &'static str,
    pub dims: window::Extent2D,
    pub resizable: bool,
    pub vsync: bool,
    pub clear_color: [f32; 4],
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            app_name: "hello-triangle",
            app_version: 1,
            title: "Hello Triangle",
            dims: window::Extent2D {
                width: 800,
                height: 600,
            },
            resizable: false,
            vsync: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl ContextConfig {
    pub fn present_mode(&self) -> window::PresentMode {
        if self.vsync {
            window::PresentMode::FIFO
        } else {
            window::PresentMode::IMMEDIATE
        }
    }
}

/// Device features to request from what the adapter supports. Nothing beyond
/// the core API is asked for, except a y-up clip space so positions land
/// where a GL context would put them.
pub fn device_features(supported: Features) -> Features {
    supported & Features::NDC_Y_UP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_up_is_requested_when_supported() {
        let supported = Features::NDC_Y_UP | Features::SAMPLER_ANISOTROPY;
        assert_eq!(device_features(supported), Features::NDC_Y_UP);
    }

    #[test]
    fn unsupported_features_are_never_requested() {
        assert_eq!(device_features(Features::empty()), Features::empty());
        assert_eq!(
            device_features(Features::SAMPLER_ANISOTROPY),
            Features::empty()
        );
    }

    #[test]
    fn defaults_match_the_demo_window() {
        let config = ContextConfig::default();
        assert_eq!((config.dims.width, config.dims.height), (800, 600));
        assert!(!config.resizable);
        assert_eq!(config.present_mode(), window::PresentMode::FIFO);
    }
}
