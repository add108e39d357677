mod analyze;
mod watch;

pub use analyze::{analyze, AnalyzeArgs};
pub use watch::{watch, WatchArgs};

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use set_capture::{calibrate, CaptureRect, Corner, FixedCorners, LineCorners};
use set_data::ColorTable;
use set_vision::{CardExtractor, VisionConfig};

/// Options shared by every command that runs the card pipeline.
#[derive(Debug, Clone, Args)]
pub struct VisionArgs {
    /// Vision settings (JSON). Defaults are used when omitted or missing.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reference color table (JSON). The built-in table is used when omitted.
    #[arg(long)]
    pub colors: Option<PathBuf>,
}

impl VisionArgs {
    pub fn extractor(&self) -> Result<CardExtractor> {
        let config = match &self.config {
            Some(path) => VisionConfig::load(path)?,
            None => VisionConfig::default(),
        };
        let colors = match &self.colors {
            Some(path) => ColorTable::load(path)?,
            None => ColorTable::builtin(),
        };
        tracing::debug!("Color table: {} entries", colors.len());
        CardExtractor::new(config, colors).context("Invalid vision config")
    }
}

/// How the board rectangle inside each frame is chosen.
#[derive(Debug, Clone, Args)]
pub struct RegionArgs {
    /// Board rectangle as `x0,y0,x1,y1` (top-left and bottom-right corners).
    #[arg(long, value_parser = parse_corners, conflicts_with = "pick")]
    pub corners: Option<[Corner; 2]>,

    /// Read the two corners from stdin, one `x y` line each.
    #[arg(long)]
    pub pick: bool,

    /// Seconds to wait for each picked corner.
    #[arg(long, default_value = "30")]
    pub pick_timeout: u64,
}

impl RegionArgs {
    /// Resolve the capture rectangle; without corners the whole frame is used.
    pub fn capture_rect(&self, frame_size: (u32, u32)) -> Result<CaptureRect> {
        let timeout = Duration::from_secs(self.pick_timeout);
        let rect = if let Some(corners) = self.corners {
            calibrate(&mut FixedCorners::new(corners), timeout)?
        } else if self.pick {
            eprintln!("Enter the top-left and bottom-right board corners as 'x y':");
            calibrate(&mut LineCorners::stdin(), timeout)?
        } else {
            CaptureRect::full_frame(frame_size.0, frame_size.1)?
        };
        Ok(rect)
    }
}

fn parse_corners(text: &str) -> Result<[Corner; 2], String> {
    let values: Vec<u32> = text
        .split(',')
        .map(|v| v.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;
    match values.as_slice() {
        [x0, y0, x1, y1] => Ok([Corner::new(*x0, *y0), Corner::new(*x1, *y1)]),
        _ => Err(format!("expected x0,y0,x1,y1, got {} values", values.len())),
    }
}
