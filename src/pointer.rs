use crate::surface::Viewport;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PointerState {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl PointerState {
    pub(crate) const CENTER: PointerState = PointerState { x: 0.5, y: 0.5 };

    pub(crate) fn to_pixels(self, width: f32, height: f32) -> (f32, f32) {
        (self.x * width, self.y * height)
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::CENTER
    }
}

#[derive(Debug, Default)]
pub(crate) struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub(crate) fn state(&self) -> PointerState {
        self.state
    }

    pub(crate) fn on_move(&mut self, client_x: f32, client_y: f32, viewport: Viewport) {
        if !viewport.is_drawable() {
            self.state = PointerState::CENTER;
            return;
        }
        self.state = PointerState {
            x: (client_x / viewport.width).clamp(0.0, 1.0),
            y: (client_y / viewport.height).clamp(0.0, 1.0),
        };
    }

    pub(crate) fn on_leave(&mut self) {
        self.state = PointerState::CENTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_centred() {
        assert_eq!(PointerTracker::default().state(), PointerState { x: 0.5, y: 0.5 });
    }

    #[test]
    fn move_normalizes_by_viewport() {
        let mut p = PointerTracker::default();
        p.on_move(200.0, 450.0, Viewport::new(800.0, 600.0));
        assert_eq!(p.state(), PointerState { x: 0.25, y: 0.75 });
        assert_eq!(p.state().to_pixels(800.0, 600.0), (200.0, 450.0));
    }

    #[test]
    fn move_outside_is_clamped() {
        let mut p = PointerTracker::default();
        p.on_move(-10.0, 900.0, Viewport::new(800.0, 600.0));
        assert_eq!(p.state(), PointerState { x: 0.0, y: 1.0 });
    }

    #[test]
    fn leave_recentres() {
        let mut p = PointerTracker::default();
        p.on_move(10.0, 10.0, Viewport::new(800.0, 600.0));
        p.on_leave();
        assert_eq!(p.state(), PointerState::CENTER);
    }

    #[test]
    fn degenerate_viewport_recentres() {
        let mut p = PointerTracker::default();
        p.on_move(10.0, 10.0, Viewport::new(0.0, 0.0));
        assert_eq!(p.state(), PointerState::CENTER);
    }
}
