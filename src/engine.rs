use crate::canvas::{Canvas, DrawGlyph};
use crate::columns::{wraps, ColumnSet};
use crate::config::{Tuning, BASE_FILL_ALPHA, GLOW_BASE, GLOW_GAIN, VISIBILITY_THRESHOLD};
use crate::field::{roll_sparkle, score};
use crate::glyph::{pick_color, pick_glyph, Rgb, Rgba};
use crate::host::{EventKind, FrameRequest, Host, HostEvent, ListenerId};
use crate::overlay::Overlay;
use crate::pointer::{PointerState, PointerTracker};
use crate::surface::{Surface, Viewport};
use log::{debug, info, warn};
use rand::Rng;
use std::time::{Duration, Instant};

// rgba(0, 10, 14, 0.16)
pub(crate) const BASE_FILL: Rgba = Rgba::new(
    Rgb::new(0.0, 10.0 / 255.0, 14.0 / 255.0),
    BASE_FILL_ALPHA,
);

const LISTENS_TO: [EventKind; 4] = [
    EventKind::Resize,
    EventKind::PointerMove,
    EventKind::PointerLeave,
    EventKind::Scroll,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DriverState {
    Scheduled,
    Idle,
}

struct Mount {
    viewport: Viewport,
    surface: Surface,
    columns: ColumnSet,
    frame: Option<FrameRequest>,
    listeners: Vec<ListenerId>,
    last_frame: Option<Instant>,
}

pub(crate) struct MatrixRain<C, R> {
    tuning: Tuning,
    canvas: C,
    rng: R,
    pointer: PointerTracker,
    overlay: Overlay,
    mount: Option<Mount>,
}

impl<C: Canvas, R: Rng> MatrixRain<C, R> {
    pub(crate) fn new(tuning: Tuning, canvas: C, rng: R) -> Self {
        let overlay = Overlay::new(tuning.scroll_extent, tuning.overlay);
        Self {
            tuning,
            canvas,
            rng,
            pointer: PointerTracker::default(),
            overlay,
            mount: None,
        }
    }

    pub(crate) fn canvas(&self) -> &C {
        &self.canvas
    }

    pub(crate) fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub(crate) fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    #[cfg(test)]
    pub(crate) fn pointer(&self) -> PointerState {
        self.pointer.state()
    }

    #[cfg(test)]
    pub(crate) fn surface(&self) -> Option<&Surface> {
        self.mount.as_ref().map(|m| &m.surface)
    }

    pub(crate) fn viewport(&self) -> Option<Viewport> {
        self.mount.as_ref().map(|m| m.viewport)
    }

    #[cfg(test)]
    pub(crate) fn columns(&self) -> Option<&ColumnSet> {
        self.mount.as_ref().map(|m| &m.columns)
    }

    pub(crate) fn state(&self) -> DriverState {
        match self.mount.as_ref().and_then(|m| m.frame) {
            Some(_) => DriverState::Scheduled,
            None => DriverState::Idle,
        }
    }

    pub(crate) fn start(&mut self, host: &mut Host) -> bool {
        if self.mount.is_some() {
            warn!("start called on a mounted field; ignoring");
            return false;
        }
        if !self.canvas.available() {
            info!("no drawing context; field disabled");
            return false;
        }
        let Some(viewport) = host.viewport().filter(Viewport::is_drawable) else {
            info!("no drawable viewport; field disabled");
            return false;
        };

        let surface = Surface::measure(viewport, host.device_scale());
        let columns = ColumnSet::for_width(surface.css_width, self.tuning.glyph_size);
        self.canvas.resize(&surface);

        let listeners = LISTENS_TO.iter().map(|&k| host.listen(k)).collect();
        let frame = Some(host.request_frame());

        info!(
            "field started: {}x{} css px, scale {}, {} columns",
            surface.css_width,
            surface.css_height,
            surface.device_scale,
            columns.len()
        );
        self.pointer.on_leave();
        self.mount = Some(Mount {
            viewport,
            surface,
            columns,
            frame,
            listeners,
            last_frame: None,
        });
        true
    }

    pub(crate) fn stop(&mut self, host: &mut Host) {
        let Some(mount) = self.mount.take() else {
            return;
        };
        if let Some(req) = mount.frame {
            host.cancel_frame(req);
        }
        for id in mount.listeners {
            host.unlisten(id);
        }
        self.canvas.release();
        info!("field stopped");
    }

    pub(crate) fn handle_event(&mut self, event: HostEvent) {
        let Some(current) = self.viewport() else {
            return;
        };
        match event {
            HostEvent::Resize(viewport) => self.resize(viewport),
            HostEvent::PointerMove { x, y } => self.pointer.on_move(x, y, current),
            HostEvent::PointerLeave => self.pointer.on_leave(),
            HostEvent::Scroll { delta } => self.overlay.scroll_by(delta),
        }
    }

    pub(crate) fn resize(&mut self, viewport: Viewport) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        let surface = Surface::measure(viewport, mount.surface.device_scale);
        let columns = ColumnSet::for_width(surface.css_width, self.tuning.glyph_size);
        debug!(
            "resize to {}x{} -> {} columns",
            surface.css_width,
            surface.css_height,
            columns.len()
        );
        (mount.viewport, mount.surface, mount.columns) = (viewport, surface, columns);
        self.canvas.resize(&mount.surface);
    }

    pub(crate) fn on_frame(&mut self, host: &mut Host, req: FrameRequest, now: Instant) {
        let Some(mount) = self.mount.as_mut() else {
            return;
        };
        if mount.frame != Some(req) {
            debug!("ignoring stale frame {req:?}");
            return;
        }
        mount.frame = None;

        let dt = mount
            .last_frame
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(Duration::ZERO);
        mount.last_frame = Some(now);

        draw_frame(
            &self.tuning,
            &mount.surface,
            &mut mount.columns,
            self.pointer.state(),
            &mut self.canvas,
            &mut self.rng,
        );
        self.overlay.follow(self.pointer.state(), dt);

        mount.frame = Some(host.request_frame());
    }
}

fn draw_frame<C: Canvas, R: Rng>(
    tuning: &Tuning,
    surface: &Surface,
    columns: &mut ColumnSet,
    pointer: PointerState,
    canvas: &mut C,
    rng: &mut R,
) {
    canvas.fill(BASE_FILL);

    let size = tuning.glyph_size;
    let (pointer_x, pointer_y) = pointer.to_pixels(surface.css_width, surface.css_height);

    for column in 0..columns.len() {
        let x = column as f32 * size;
        let y = columns.row(column) as f32 * size;
        let ch = pick_glyph(rng);
        let color = pick_color(rng);
        let influence = score(x, y, pointer_x, pointer_y, tuning.radius, roll_sparkle(rng));

        let below_fold = y > surface.css_height;
        let wrap = below_fold && wraps(below_fold, rng.gen::<f64>());

        if influence.opacity >= VISIBILITY_THRESHOLD && (!below_fold || wrap) {
            canvas.draw_glyph(&DrawGlyph {
                ch,
                x,
                y,
                size,
                color,
                alpha: influence.opacity,
                glow: GLOW_BASE + influence.shaped * GLOW_GAIN,
            });
        }

        if wrap {
            columns.reset(column);
        } else {
            columns.advance(column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::tests::RecordingCanvas;
    use crate::config::CAP_OPACITY;
    use rand::{rngs::mock::StepRng, rngs::StdRng, SeedableRng};

    type Field<R> = MatrixRain<RecordingCanvas, R>;

    fn host(w: f32, h: f32) -> Host {
        Host::new(Some(Viewport::new(w, h)), 1.0, 60)
    }

    fn seeded(seed: u64) -> Field<StdRng> {
        MatrixRain::new(
            Tuning::default(),
            RecordingCanvas::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn pump<R: Rng>(field: &mut Field<R>, host: &mut Host, n: usize) {
        for _ in 0..n {
            let wait = host
                .time_until_frame(Instant::now())
                .expect("frame should be pending");
            let now = Instant::now() + wait;
            let req = host.due(now).expect("frame should be due");
            field.on_frame(host, req, now);
        }
    }

    #[test]
    fn start_builds_surface_and_columns() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(1);
        assert!(f.start(&mut h));
        assert_eq!(f.columns().unwrap().len(), 37);
        assert_eq!(f.canvas().surface, f.surface().copied());
        assert_eq!(f.state(), DriverState::Scheduled);
        assert_eq!(h.listener_count(), 4);
    }

    #[test]
    fn resize_rebuilds_columns_from_scratch() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(1);
        f.start(&mut h);
        pump(&mut f, &mut h, 5);
        assert!(f.columns().unwrap().rows().iter().all(|&r| r > 0));

        for w in [300.0, 1280.0, 22.0, 799.0] {
            f.handle_event(HostEvent::Resize(Viewport::new(w, 500.0)));
            let cols = f.columns().unwrap();
            assert_eq!(cols.len(), (w / 22.0).floor() as usize + 1);
            assert!(cols.rows().iter().all(|&r| r == 0));
            let s = f.surface().unwrap();
            assert_eq!((s.css_width, s.css_height), (w, 500.0));
            assert_eq!(f.canvas().surface, Some(*s));
        }
    }

    #[test]
    fn every_frame_fades_before_drawing() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(2);
        f.start(&mut h);
        pump(&mut f, &mut h, 10);
        assert_eq!(f.canvas().fills, vec![BASE_FILL; 10]);
    }

    #[test]
    fn each_frame_books_exactly_one_more() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(3);
        f.start(&mut h);
        pump(&mut f, &mut h, 3);
        assert!(h.has_pending_frame());
        assert_eq!(f.state(), DriverState::Scheduled);
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(4);
        f.start(&mut h);
        let later = Instant::now() + Duration::from_secs(1);
        let req = h.due(later).unwrap();
        f.on_frame(&mut h, req, later);
        f.on_frame(&mut h, req, later);
        assert_eq!(f.canvas().fills.len(), 1);
    }

    #[test]
    fn pointer_at_cell_draws_capped_and_full_glow() {
        // Pointer parked on column 0's first cell.
        let mut h = host(800.0, 600.0);
        let mut f = seeded(5);
        f.start(&mut h);
        f.handle_event(HostEvent::PointerMove { x: 0.0, y: 0.0 });
        pump(&mut f, &mut h, 1);
        let first = f
            .canvas()
            .glyphs
            .iter()
            .find(|g| g.x == 0.0 && g.y == 0.0)
            .copied()
            .expect("cell under the pointer is drawn");
        assert_eq!(first.alpha, CAP_OPACITY);
        assert_eq!(first.glow, GLOW_BASE + GLOW_GAIN);
    }

    #[test]
    fn cell_at_viewport_centre_hits_the_cap() {
        // 880x660: centre (440, 330) is column 20, row 15.
        let mut h = host(880.0, 660.0);
        let mut f = seeded(17);
        f.start(&mut h);
        pump(&mut f, &mut h, 15);
        let before = f.canvas().glyphs.len();
        pump(&mut f, &mut h, 1);
        let hit = f.canvas().glyphs[before..]
            .iter()
            .find(|g| g.x == 440.0 && g.y == 330.0)
            .copied()
            .expect("centre cell is drawn");
        assert_eq!(hit.alpha, CAP_OPACITY);
    }

    #[test]
    fn glow_follows_shaped_influence_not_opacity() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(6);
        f.start(&mut h);
        f.handle_event(HostEvent::PointerMove { x: 0.0, y: 0.0 });
        pump(&mut f, &mut h, 1);
        for g in &f.canvas().glyphs {
            let shaped = score(g.x, g.y, 0.0, 0.0, 260.0, 0.0).shaped;
            assert!((g.glow - (GLOW_BASE + shaped * GLOW_GAIN)).abs() < 1e-4);
            assert!(g.alpha >= VISIBILITY_THRESHOLD && g.alpha <= CAP_OPACITY);
        }
    }

    #[test]
    fn faint_cells_are_skipped_but_still_fall() {
        // Pointer far away and no sparkle reachable: nothing draws.
        let mut h = host(800.0, 600.0);
        let tuning = Tuning {
            radius: 0.0,
            ..Tuning::default()
        };
        let mut f = MatrixRain::new(tuning, RecordingCanvas::default(), StdRng::seed_from_u64(7));
        f.start(&mut h);
        pump(&mut f, &mut h, 3);
        assert!(f
            .canvas()
            .glyphs
            .iter()
            .all(|g| g.alpha == crate::config::SPARKLE_BOOST));
        assert!(f.columns().unwrap().rows().iter().all(|&r| r == 3));
    }

    #[test]
    fn always_sparkling_without_wrap_rolls() {
        // StepRng(0, 0): glyph 0, colour 0, sparkle every time, never wraps.
        let mut h = host(220.0, 44.0);
        let tuning = Tuning {
            radius: 0.0,
            ..Tuning::default()
        };
        let mut f = MatrixRain::new(tuning, RecordingCanvas::default(), StepRng::new(0, 0));
        f.start(&mut h);
        pump(&mut f, &mut h, 10);

        let cols = f.columns().unwrap();
        assert_eq!(cols.len(), 11);
        assert!(cols.rows().iter().all(|&r| r == 10));

        // Rows 0, 1 and 2 (y = 44 is not past the fold) draw; later rows do not.
        let glyphs = &f.canvas().glyphs;
        assert_eq!(glyphs.len(), 11 * 3);
        assert!(glyphs.iter().all(|g| g.ch == '0' && g.color == crate::glyph::PALETTE[0]));
        assert!(glyphs.iter().all(|g| g.y <= 44.0));
    }

    #[test]
    fn columns_only_grow_or_wrap_to_zero() {
        let mut h = host(400.0, 120.0);
        let mut f = seeded(8);
        f.start(&mut h);
        let mut prev = f.columns().unwrap().rows().to_vec();
        let mut wrapped = 0;
        let mut now = Instant::now();
        for _ in 0..2_000 {
            now += Duration::from_millis(17);
            let req = h.due(now).unwrap();
            f.on_frame(&mut h, req, now);
            let rows = f.columns().unwrap().rows().to_vec();
            for (before, after) in prev.iter().zip(&rows) {
                if *after == 0 {
                    // only past the bottom edge
                    assert!(*before as f32 * 22.0 > 120.0);
                    wrapped += 1;
                } else {
                    assert_eq!(*after, before + 1);
                }
            }
            prev = rows;
        }
        assert!(wrapped > 0, "no column ever wrapped");
    }

    #[test]
    fn leave_recentres_pointer() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(9);
        f.start(&mut h);
        f.handle_event(HostEvent::PointerMove { x: 80.0, y: 60.0 });
        assert_eq!(f.pointer(), PointerState { x: 0.1, y: 0.1 });
        f.handle_event(HostEvent::PointerLeave);
        assert_eq!(f.pointer(), PointerState::CENTER);
    }

    #[test]
    fn stop_twice_is_harmless_and_idle() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(10);
        f.start(&mut h);
        pump(&mut f, &mut h, 2);
        f.stop(&mut h);
        f.stop(&mut h);
        assert_eq!(f.state(), DriverState::Idle);
        assert!(!h.has_pending_frame());
        assert_eq!(h.listener_count(), 0);
        assert_eq!(f.canvas().released, 1);
        assert_eq!(h.due(Instant::now() + Duration::from_secs(60)), None);
    }

    #[test]
    fn events_after_stop_are_dropped() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(11);
        f.start(&mut h);
        f.stop(&mut h);
        f.handle_event(HostEvent::PointerMove { x: 0.0, y: 0.0 });
        f.handle_event(HostEvent::Resize(Viewport::new(100.0, 100.0)));
        assert_eq!(f.pointer(), PointerState::CENTER);
        assert!(f.columns().is_none());
    }

    #[test]
    fn restart_after_stop() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(12);
        assert!(f.start(&mut h));
        assert!(!f.start(&mut h));
        f.stop(&mut h);
        assert!(f.start(&mut h));
        assert_eq!(h.listener_count(), 4);
        assert!(f.columns().unwrap().rows().iter().all(|&r| r == 0));
    }

    #[test]
    fn unsupported_environment_is_a_no_op() {
        let mut h = host(800.0, 600.0);
        let canvas = RecordingCanvas {
            unavailable: true,
            ..Default::default()
        };
        let mut f = MatrixRain::new(Tuning::default(), canvas, StdRng::seed_from_u64(13));
        assert!(!f.start(&mut h));
        assert!(!h.has_pending_frame());
        assert_eq!(h.listener_count(), 0);

        let mut headless = Host::new(None, 1.0, 60);
        let mut g = seeded(14);
        assert!(!g.start(&mut headless));
        assert_eq!(g.state(), DriverState::Idle);

        let mut empty = host(0.0, 0.0);
        assert!(!g.start(&mut empty));
        g.stop(&mut empty);
    }

    #[test]
    fn scroll_events_reach_the_overlay() {
        let mut h = host(800.0, 600.0);
        let mut f = seeded(15);
        f.start(&mut h);
        f.handle_event(HostEvent::Scroll { delta: 600.0 });
        assert!((f.overlay().scroll_progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn device_scale_is_clamped_on_mount() {
        let mut h = Host::new(Some(Viewport::new(800.0, 600.0)), 3.0, 60);
        let mut f = seeded(16);
        f.start(&mut h);
        let s = f.surface().unwrap();
        assert_eq!(s.device_scale, 1.5);
        assert_eq!((s.pixel_width, s.pixel_height), (1200, 900));
    }
}
