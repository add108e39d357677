use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{RegionArgs, VisionArgs};
use crate::pipeline::Pipeline;
use set_capture::ImageFileSource;

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Screenshot file, re-read on every capture cycle.
    pub image: PathBuf,

    #[command(flatten)]
    pub region: RegionArgs,

    #[command(flatten)]
    pub vision: VisionArgs,

    /// Milliseconds between captures.
    #[arg(long, default_value = "500")]
    pub interval_ms: u64,

    /// Stop after this many analyses. Runs until Ctrl-C when omitted.
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Save a debug dump of the last analyzed frame here on exit.
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,
}

/// Continuously analyze a screenshot file, printing one JSON line per cycle.
pub async fn watch(args: WatchArgs) -> Result<()> {
    let extractor = Arc::new(args.vision.extractor()?);

    // The first frame fixes the board rectangle for the whole session
    let first = set_capture::source::load_rgb(&args.image)?;
    let rect = args.region.capture_rect(first.dimensions())?;
    drop(first);

    let source = ImageFileSource::new(&args.image);
    let pipeline = Pipeline::start(
        source,
        rect,
        Duration::from_millis(args.interval_ms),
        extractor,
    );
    let mut results = pipeline.subscribe();
    let mut seen = 0u64;

    loop {
        tokio::select! {
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = results.borrow_and_update().clone();
                if let Some(analysis) = latest {
                    println!("{}", serde_json::to_string(&*analysis)?);
                    seen += 1;
                    if args.cycles.is_some_and(|n| seen >= n) {
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    pipeline.stop();
    let status = pipeline.capture_status();
    info!("Analyzed {} frames (last fps {:.1})", seen, status.fps);

    if let Some(dir) = &args.debug_dir {
        pipeline.save_debug_frame(dir);
    }
    Ok(())
}
