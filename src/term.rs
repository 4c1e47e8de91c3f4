use crate::canvas::{CellMetrics, GlyphCanvas, Layer};
use crate::host::HostEvent;
use crate::overlay::Overlay;
use crate::surface::Viewport;
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const WHEEL_LINES: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScreenCell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Default for ScreenCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::Black,
            bg: Color::Black,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Input {
    Host(HostEvent),
    Quit,
    ToggleOverlay,
    Ignored,
}

pub(crate) struct Terminal {
    out: io::Stdout,
    cols: u16,
    rows: u16,
    metrics: CellMetrics,
    prev: Vec<ScreenCell>,
    cur: Vec<ScreenCell>,
    dirty: bool, // repaint everything on next present
}

impl Terminal {
    pub(crate) fn begin(fallback: CellMetrics) -> Result<Self> {
        terminal::enable_raw_mode().context("enabling raw mode")?;
        unwind_on_error(|| Self::enter(fallback), restore)
    }

    fn enter(fallback: CellMetrics) -> Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            SetBackgroundColor(Color::Black),
            Clear(ClearType::All)
        )?;

        let (cols, rows) = terminal::size()?;
        // Measured once; the canvas keeps these metrics for its lifetime.
        let metrics = measure_cells(cols, rows, fallback);
        let mut term = Self {
            out,
            cols: 0,
            rows: 0,
            metrics,
            prev: Vec::new(),
            cur: Vec::new(),
            dirty: true,
        };
        term.resize(cols, rows);
        Ok(term)
    }

    pub(crate) fn end(&mut self) -> Result<()> {
        queue!(self.out, ResetColor, Clear(ClearType::All))?;
        self.out.flush()?;
        restore()
    }

    pub(crate) fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    pub(crate) fn viewport(&self) -> Viewport {
        Viewport::new(
            self.cols as f32 * self.metrics.width,
            self.rows as f32 * self.metrics.height,
        )
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let n = cols as usize * rows as usize;
        self.prev = vec![ScreenCell::default(); n];
        self.cur = vec![ScreenCell::default(); n];
        self.dirty = true;
    }

    pub(crate) fn translate(&mut self, event: Event) -> Input {
        match event {
            Event::Key(k) if k.kind != KeyEventKind::Release => match k.code {
                KeyCode::Char('q') | KeyCode::Esc => Input::Quit,
                KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Input::Quit,
                KeyCode::Char('o') => Input::ToggleOverlay,
                KeyCode::PageDown => Input::Host(HostEvent::Scroll {
                    delta: self.viewport().height,
                }),
                KeyCode::PageUp => Input::Host(HostEvent::Scroll {
                    delta: -self.viewport().height,
                }),
                _ => Input::Ignored,
            },
            Event::Mouse(m) => match m.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    Input::Host(HostEvent::PointerMove {
                        x: (m.column as f32 + 0.5) * self.metrics.width,
                        y: (m.row as f32 + 0.5) * self.metrics.height,
                    })
                }
                MouseEventKind::ScrollDown => Input::Host(HostEvent::Scroll {
                    delta: WHEEL_LINES * self.metrics.height,
                }),
                MouseEventKind::ScrollUp => Input::Host(HostEvent::Scroll {
                    delta: -WHEEL_LINES * self.metrics.height,
                }),
                _ => Input::Ignored,
            },
            Event::FocusLost => Input::Host(HostEvent::PointerLeave),
            Event::Resize(cols, rows) => {
                self.resize(cols, rows);
                Input::Host(HostEvent::Resize(self.viewport()))
            }
            _ => Input::Ignored,
        }
    }

    pub(crate) fn present(
        &mut self,
        canvas: &GlyphCanvas,
        overlay: &Overlay,
        viewport: Viewport,
    ) -> Result<()> {
        for y in 0..self.rows {
            for x in 0..self.cols {
                let px = (x as f32 + 0.5) * self.metrics.width;
                let py = (y as f32 + 0.5) * self.metrics.height;
                let (paper, ink, glyph) = if x < canvas.cols() && y < canvas.rows() {
                    let c = canvas.cell(x, y);
                    (c.paper, c.ink, c.glyph())
                } else {
                    (Layer::CLEAR, Layer::CLEAR, None)
                };

                let bg = overlay.shade(paper, px, py, viewport).to_color();
                let cell = match glyph {
                    Some(ch) => ScreenCell {
                        ch,
                        fg: overlay.shade(ink, px, py, viewport).to_color(),
                        bg,
                    },
                    None => ScreenCell { ch: ' ', fg: bg, bg },
                };
                let i = y as usize * self.cols as usize + x as usize;
                self.cur[i] = cell;
            }
        }
        self.flush_diff()
    }

    fn flush_diff(&mut self) -> Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.dirty {
            queue!(self.out, SetBackgroundColor(Color::Black), Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = y as usize * self.cols as usize + x as usize;
                let c = self.cur[i];
                if !self.dirty && c == self.prev[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.copy_from_slice(&self.cur);
        self.dirty = false;
        Ok(())
    }
}

fn restore() -> Result<()> {
    execute!(
        io::stdout(),
        DisableFocusChange,
        DisableMouseCapture,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;
    Ok(())
}

// A failed setup still hands the terminal back before reporting.
fn unwind_on_error<T>(
    setup: impl FnOnce() -> Result<T>,
    undo: impl FnOnce() -> Result<()>,
) -> Result<T> {
    match setup() {
        Ok(v) => Ok(v),
        Err(e) => {
            undo().context("restoring terminal after failed setup")?;
            Err(e)
        }
    }
}

fn measure_cells(cols: u16, rows: u16, fallback: CellMetrics) -> CellMetrics {
    match terminal::window_size() {
        Ok(ws) => metrics_from(cols, rows, ws.width, ws.height, fallback),
        Err(_) => fallback,
    }
}

fn metrics_from(
    cols: u16,
    rows: u16,
    width_px: u16,
    height_px: u16,
    fallback: CellMetrics,
) -> CellMetrics {
    if cols == 0 || rows == 0 || width_px == 0 || height_px == 0 {
        return fallback;
    }
    CellMetrics {
        width: width_px as f32 / cols as f32,
        height: height_px as f32 / rows as f32,
    }
}
