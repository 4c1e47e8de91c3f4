use crate::glyph::{Rgb, Rgba};
use crate::surface::Surface;

const GLOW_TINT: f32 = 0.3; // glow colour left on surrounding paper
const INK_EPSILON: f32 = 1.0 / 64.0; // ink this close to paper reads as empty

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawGlyph {
    pub(crate) ch: char,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) size: f32,
    pub(crate) color: Rgb,
    pub(crate) alpha: f32,
    pub(crate) glow: f32, // blur radius
}

pub(crate) trait Canvas {
    fn available(&self) -> bool {
        true
    }
    fn resize(&mut self, surface: &Surface);
    fn release(&mut self);
    fn fill(&mut self, fill: Rgba);
    fn draw_glyph(&mut self, glyph: &DrawGlyph);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CellMetrics {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Layer {
    pub(crate) rgb: Rgb,
    pub(crate) a: f32,
}

impl Layer {
    pub(crate) const CLEAR: Layer = Layer {
        rgb: Rgb::BLACK,
        a: 0.0,
    };

    pub(crate) fn over(self, src: Rgb, a: f32) -> Layer {
        let a = a.clamp(0.0, 1.0);
        let out_a = a + self.a * (1.0 - a);
        if out_a <= 1e-6 {
            return Layer::CLEAR;
        }
        let ch = |s: f32, d: f32| (s * a + d * self.a * (1.0 - a)) / out_a;
        Layer {
            rgb: Rgb::new(
                ch(src.r, self.rgb.r),
                ch(src.g, self.rgb.g),
                ch(src.b, self.rgb.b),
            ),
            a: out_a,
        }
    }

    fn differs(self, o: Layer) -> bool {
        self.rgb.distance(o.rgb) > INK_EPSILON || (self.a - o.a).abs() > INK_EPSILON
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CanvasCell {
    pub(crate) ch: char,
    pub(crate) ink: Layer, // glyph pixels
    pub(crate) paper: Layer, // around the glyph
}

impl Default for CanvasCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            ink: Layer::CLEAR,
            paper: Layer::CLEAR,
        }
    }
}

impl CanvasCell {
    pub(crate) fn glyph(&self) -> Option<char> {
        if self.ch != ' ' && self.ink.differs(self.paper) {
            Some(self.ch)
        } else {
            None
        }
    }
}

// Content survives between frames and only fades under translucent fills.
pub(crate) struct GlyphCanvas {
    metrics: CellMetrics,
    cols: u16,
    rows: u16,
    cells: Vec<CanvasCell>,
}

impl GlyphCanvas {
    pub(crate) fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    pub(crate) fn cols(&self) -> u16 {
        self.cols
    }

    pub(crate) fn rows(&self) -> u16 {
        self.rows
    }

    pub(crate) fn cell(&self, x: u16, y: u16) -> &CanvasCell {
        &self.cells[self.idx(x, y)]
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.cols as usize) + (x as usize)
    }

    fn locate(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let cx = (x / self.metrics.width) as u32;
        let cy = (y / self.metrics.height) as u32;
        if cx >= self.cols as u32 || cy >= self.rows as u32 {
            return None;
        }
        Some((cx as u16, cy as u16))
    }
}

impl Canvas for GlyphCanvas {
    fn resize(&mut self, surface: &Surface) {
        // Grid is sized in device pixels so it tracks the surface exactly.
        let cw = surface.to_device(self.metrics.width);
        let ch = surface.to_device(self.metrics.height);
        self.cols = (surface.pixel_width as f32 / cw).round().min(u16::MAX as f32) as u16;
        self.rows = (surface.pixel_height as f32 / ch).round().min(u16::MAX as f32) as u16;
        self.cells = vec![CanvasCell::default(); self.cols as usize * self.rows as usize];
    }

    fn release(&mut self) {
        self.cols = 0;
        self.rows = 0;
        self.cells = Vec::new();
    }

    fn fill(&mut self, fill: Rgba) {
        for c in &mut self.cells {
            c.paper = c.paper.over(fill.rgb, fill.a);
            c.ink = c.ink.over(fill.rgb, fill.a);
        }
    }

    fn draw_glyph(&mut self, g: &DrawGlyph) {
        let centre_x = g.x + g.size * 0.5;
        let centre_y = g.y + g.size * 0.5;
        let Some((gx, gy)) = self.locate(centre_x, centre_y) else {
            return;
        };

        if g.glow > 0.0 {
            let reach_x = (g.glow / self.metrics.width).ceil() as i32;
            let reach_y = (g.glow / self.metrics.height).ceil() as i32;
            for dy in -reach_y..=reach_y {
                for dx in -reach_x..=reach_x {
                    let x = gx as i32 + dx;
                    let y = gy as i32 + dy;
                    if x < 0 || y < 0 || x >= self.cols as i32 || y >= self.rows as i32 {
                        continue;
                    }
                    let px = dx as f32 * self.metrics.width;
                    let py = dy as f32 * self.metrics.height;
                    let falloff = 1.0 - (px * px + py * py).sqrt() / g.glow;
                    if falloff <= 0.0 {
                        continue;
                    }
                    let i = self.idx(x as u16, y as u16);
                    self.cells[i].paper = self.cells[i]
                        .paper
                        .over(g.color, g.alpha * GLOW_TINT * falloff);
                }
            }
        }

        let i = self.idx(gx, gy);
        let cell = &mut self.cells[i];
        cell.ch = g.ch;
        cell.ink = cell.paper.over(g.color, g.alpha);
    }
}
