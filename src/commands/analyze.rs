use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{RegionArgs, VisionArgs};
use crate::pipeline::{analyze_frame, write_debug_frame};

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Board screenshot to analyze.
    pub image: PathBuf,

    #[command(flatten)]
    pub region: RegionArgs,

    #[command(flatten)]
    pub vision: VisionArgs,

    /// Write the board with the found Set outlined.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Dump the board, every cell and a text summary into this directory.
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Print every Set on the board, not just the first.
    #[arg(long)]
    pub all: bool,
}

/// One-shot analysis of a single screenshot. Prints the result as JSON.
pub fn analyze(args: &AnalyzeArgs) -> Result<()> {
    let extractor = args.vision.extractor()?;
    let frame = set_capture::source::load_rgb(&args.image)?;
    let rect = args.region.capture_rect(frame.dimensions())?;
    let board = set_capture::crop_rect(&frame, &rect)
        .context("Capture rectangle lies outside the image")?;

    let mut result = analyze_frame(&board, &extractor)?;
    if !args.all {
        result.all_sets.clear();
    }

    if let Some(out) = &args.out {
        set_vision::render(&board, &result.cells, result.set.as_ref())
            .save(out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Annotated board written to {}", out.display());
    }
    if let Some(dir) = &args.debug_dir {
        write_debug_frame(&board, &result, dir)?;
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
