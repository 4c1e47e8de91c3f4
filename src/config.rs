use anyhow::{ensure, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

// Cosmetic tuning. These are visual taste, not derived values.
pub(crate) const CELL_SIZE: f32 = 22.0;
pub(crate) const HIGHLIGHT_RADIUS: f32 = 260.0;
pub(crate) const FALLOFF_EXPONENT: f32 = 2.4;
pub(crate) const CAP_OPACITY: f32 = 0.85;
pub(crate) const VISIBILITY_THRESHOLD: f32 = 0.08;
pub(crate) const SPARKLE_CHANCE: f64 = 0.02;
pub(crate) const SPARKLE_BOOST: f32 = 0.1;
pub(crate) const RESET_ROLL: f64 = 0.975;
pub(crate) const GLOW_BASE: f32 = 6.0;
pub(crate) const GLOW_GAIN: f32 = 14.0;
pub(crate) const BASE_FILL_ALPHA: f32 = 0.16;
pub(crate) const MAX_DEVICE_SCALE: f32 = 1.5;

#[derive(Parser, Debug, Clone)]
#[command(name = "matrixfield", version, about = "Pointer-reactive falling glyph field")]
pub(crate) struct Args {
    /// display refresh rate the frame clock runs at
    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    /// glyph cell size in logical pixels
    #[arg(long, default_value_t = CELL_SIZE)]
    pub(crate) glyph_size: f32,

    /// pointer highlight radius in logical pixels
    #[arg(long, default_value_t = HIGHLIGHT_RADIUS)]
    pub(crate) radius: f32,

    /// device pixel ratio (clamped to 1.5)
    #[arg(long, default_value_t = 1.0)]
    pub(crate) device_scale: f32,

    /// terminal cell width in pixels when the terminal does not report it
    #[arg(long, default_value_t = 10.0)]
    pub(crate) cell_width: f32,

    /// terminal cell height in pixels when the terminal does not report it
    #[arg(long, default_value_t = 20.0)]
    pub(crate) cell_height: f32,

    /// virtual page length in pixels that the wheel scrolls through
    #[arg(long, default_value_t = 1200.0)]
    pub(crate) scroll_extent: f32,

    /// start with the glare/dim overlay hidden
    #[arg(long)]
    pub(crate) no_overlay: bool,

    /// write log records to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub(crate) log_level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Tuning {
    pub(crate) glyph_size: f32,
    pub(crate) radius: f32,
    pub(crate) fps: u32,
    pub(crate) scroll_extent: f32,
    pub(crate) overlay: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            glyph_size: CELL_SIZE,
            radius: HIGHLIGHT_RADIUS,
            fps: 60,
            scroll_extent: 1200.0,
            overlay: true,
        }
    }
}

impl Tuning {
    pub(crate) fn from_args(args: &Args) -> Result<Self> {
        ensure!(
            args.glyph_size.is_finite() && args.glyph_size >= 1.0,
            "--glyph-size must be at least 1 (got {})",
            args.glyph_size
        );
        ensure!(
            (1..=240).contains(&args.fps),
            "--fps must be within 1..=240 (got {})",
            args.fps
        );
        ensure!(
            args.radius.is_finite() && args.radius >= 0.0,
            "--radius must be non-negative (got {})",
            args.radius
        );
        ensure!(
            args.cell_width > 0.0 && args.cell_height > 0.0,
            "--cell-width and --cell-height must be positive"
        );
        Ok(Self {
            glyph_size: args.glyph_size,
            radius: args.radius,
            fps: args.fps,
            scroll_extent: args.scroll_extent.max(1.0),
            overlay: !args.no_overlay,
        })
    }
}
