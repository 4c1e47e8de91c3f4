use crate::canvas::Layer;
use crate::glyph::Rgb;
use crate::pointer::PointerState;
use crate::surface::Viewport;
use std::time::Duration;

pub(crate) const CANVAS_OPACITY: f32 = 0.7;
pub(crate) const GLARE_COLOR: Rgb = Rgb::new(0.0, 1.0, 157.0 / 255.0);
const GLARE_ALPHA: f32 = 0.35;
const GLARE_EXTENT: f32 = 0.45; // of the centre-to-corner distance
const GLARE_SHIFT_X: f32 = 45.0;
const GLARE_SHIFT_Y: f32 = 30.0;

const SPRING_STIFFNESS: f32 = 150.0;
const SPRING_DAMPING: f32 = 40.0;
const SPRING_MASS: f32 = 0.4;
const SPRING_SUBSTEP: f32 = 0.001;
const MAX_FRAME_DT: f32 = 0.1;

// #01090b
pub(crate) fn page_background() -> Rgb {
    Rgb::from_hex(0x01090b)
}

// `xs` must be ascending.
pub(crate) fn piecewise(x: f32, xs: &[f32], ys: &[f32]) -> f32 {
    debug_assert_eq!(xs.len(), ys.len());
    if x <= xs[0] {
        return ys[0];
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let t = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
            return ys[i - 1] + (ys[i] - ys[i - 1]) * t;
        }
    }
    ys[ys.len() - 1]
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Spring {
    pub(crate) value: f32,
    velocity: f32,
    pub(crate) target: f32,
}

impl Spring {
    pub(crate) fn new(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
        }
    }

    pub(crate) fn step(&mut self, dt: Duration) {
        let mut left = dt.as_secs_f32().min(MAX_FRAME_DT);
        while left > 0.0 {
            let h = left.min(SPRING_SUBSTEP);
            let force =
                -SPRING_STIFFNESS * (self.value - self.target) - SPRING_DAMPING * self.velocity;
            self.velocity += force / SPRING_MASS * h;
            self.value += self.velocity * h;
            left -= h;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Glare {
    pub(crate) cx: f32,
    pub(crate) cy: f32,
    pub(crate) radius: f32,
    pub(crate) opacity: f32,
}

#[derive(Debug)]
pub(crate) struct Overlay {
    x: Spring,
    y: Spring,
    scroll_offset: f32,
    scroll_extent: f32,
    pub(crate) visible: bool,
}

impl Overlay {
    pub(crate) fn new(scroll_extent: f32, visible: bool) -> Self {
        Self {
            x: Spring::new(0.5),
            y: Spring::new(0.5),
            scroll_offset: 0.0,
            scroll_extent: scroll_extent.max(1.0),
            visible,
        }
    }

    pub(crate) fn follow(&mut self, pointer: PointerState, dt: Duration) {
        self.x.target = pointer.x;
        self.y.target = pointer.y;
        self.x.step(dt);
        self.y.step(dt);
    }

    pub(crate) fn smoothed(&self) -> (f32, f32) {
        (self.x.value, self.y.value)
    }

    pub(crate) fn scroll_by(&mut self, delta: f32) {
        self.scroll_offset = (self.scroll_offset + delta).clamp(0.0, self.scroll_extent);
    }

    pub(crate) fn scroll_progress(&self) -> f32 {
        self.scroll_offset / self.scroll_extent
    }

    pub(crate) fn glare(&self, viewport: Viewport) -> Glare {
        let (sx, sy) = self.smoothed();
        let half_diag = (viewport.width * viewport.width + viewport.height * viewport.height)
            .sqrt()
            * 0.5;
        Glare {
            cx: viewport.width * 0.5 + lerp(-GLARE_SHIFT_X, GLARE_SHIFT_X, sx),
            cy: viewport.height * 0.5 + lerp(-GLARE_SHIFT_Y, GLARE_SHIFT_Y, sy),
            radius: half_diag * GLARE_EXTENT,
            opacity: piecewise(sx, &[0.0, 1.0], &[0.25, 0.55]),
        }
    }

    pub(crate) fn dim_opacity(&self) -> f32 {
        piecewise(self.scroll_progress(), &[0.0, 0.45, 1.0], &[0.0, 0.28, 0.65])
    }

    pub(crate) fn shade(&self, canvas: Layer, px: f32, py: f32, viewport: Viewport) -> Rgb {
        let mut out = page_background().mix(canvas.rgb, canvas.a * CANVAS_OPACITY);
        if !self.visible {
            return out;
        }

        let g = self.glare(viewport);
        if g.radius > 0.0 {
            let d = ((px - g.cx).powi(2) + (py - g.cy).powi(2)).sqrt();
            let strength = (1.0 - d / g.radius).max(0.0);
            if strength > 0.0 {
                out = out.screen(GLARE_COLOR, GLARE_ALPHA * strength * g.opacity);
            }
        }

        let dim = self.dim_opacity();
        if dim > 0.0 && viewport.height > 0.0 {
            let t = (py / viewport.height).clamp(0.0, 1.0);
            let shade = piecewise(t, &[0.0, 0.5, 1.0], &[0.1, 0.4, 0.8]);
            out = out.mix(Rgb::BLACK, shade * dim);
        }
        out
    }
}
