use crate::config::MAX_DEVICE_SCALE;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Viewport {
    pub(crate) fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub(crate) fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Surface {
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
    pub(crate) css_width: f32,
    pub(crate) css_height: f32,
    pub(crate) device_scale: f32,
}

impl Surface {
    pub(crate) fn measure(viewport: Viewport, device_scale: f32) -> Self {
        let device_scale = clamp_device_scale(device_scale);
        let css_width = viewport.width.max(0.0);
        let css_height = viewport.height.max(0.0);
        Self {
            pixel_width: (css_width * device_scale) as u32,
            pixel_height: (css_height * device_scale) as u32,
            css_width,
            css_height,
            device_scale,
        }
    }

    pub(crate) fn to_device(&self, css: f32) -> f32 {
        css * self.device_scale
    }
}

pub(crate) fn clamp_device_scale(raw: f32) -> f32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    raw.min(MAX_DEVICE_SCALE)
}
