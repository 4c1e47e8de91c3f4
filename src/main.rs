mod app;
mod canvas;
mod columns;
mod config;
mod engine;
mod field;
mod glyph;
mod host;
mod logging;
mod overlay;
mod pointer;
mod surface;
mod term;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    logging::init(args.log_file.as_deref(), args.log_level)?;
    app::run(args)
}
