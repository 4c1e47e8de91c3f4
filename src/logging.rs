use anyhow::{Context, Result};
use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::{fs::OpenOptions, path::Path};

// stdout is the drawing surface, so records only go to a file.
pub(crate) fn init(path: Option<&Path>, level: LevelFilter) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    builder(level)
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("installing logger")?;
    Ok(())
}

fn builder(level: LevelFilter) -> Builder {
    let mut b = Builder::new();
    b.filter_level(level).write_style(WriteStyle::Never);
    b
}
