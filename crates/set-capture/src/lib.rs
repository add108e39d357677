pub mod calibration;
pub mod source;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

pub use calibration::{calibrate, CalibrationError, Corner, CornerSource, FixedCorners, LineCorners};
pub use source::{FrameSource, ImageFileSource, ImageSequenceSource};

/// Board area within a captured frame, in pixels. Always has positive area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl CaptureRect {
    pub fn from_corners(top_left: Corner, bottom_right: Corner) -> Result<Self, CalibrationError> {
        let width = bottom_right.x as i64 - top_left.x as i64;
        let height = bottom_right.y as i64 - top_left.y as i64;
        if width <= 0 || height <= 0 {
            return Err(CalibrationError::Degenerate { width, height });
        }
        Ok(Self {
            x: top_left.x,
            y: top_left.y,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Rectangle covering a whole `width x height` frame.
    pub fn full_frame(width: u32, height: u32) -> Result<Self, CalibrationError> {
        Self::from_corners(Corner::new(0, 0), Corner::new(width, height))
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Crop the capture rectangle out of a frame, clamped to the frame bounds.
/// Returns `None` when nothing of the rectangle lies inside the frame.
pub fn crop_rect(frame: &RgbImage, rect: &CaptureRect) -> Option<RgbImage> {
    let (w, h) = frame.dimensions();
    if rect.x >= w || rect.y >= h {
        return None;
    }
    let rw = rect.width.min(w - rect.x);
    let rh = rect.height.min(h - rect.y);
    Some(image::imageops::crop_imm(frame, rect.x, rect.y, rw, rh).to_image())
}

/// Status of the capture loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub source: Option<String>,
    pub fps: f64,
    pub last_capture_time: Option<u64>,
    pub resolution: Option<(u32, u32)>,
}

/// The capture loop that runs as a background task.
///
/// Grabs a frame from `source` every `capture_interval`, crops it to `rect`
/// and publishes it on `frame_tx`. Stops on the stop flag or when the source
/// runs out of frames.
pub async fn capture_loop<S: FrameSource + 'static>(
    mut source: S,
    rect: CaptureRect,
    frame_tx: watch::Sender<Option<Arc<RgbImage>>>,
    status_tx: watch::Sender<CaptureStatus>,
    capture_interval: Duration,
    stop: Arc<AtomicBool>,
) {
    let name = source.name();
    info!("Capture loop started on {}, interval: {:?}", name, capture_interval);

    let mut frame_count = 0u64;
    let mut fps_timer = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("Capture loop stopping (stop signal received)");
            break;
        }
        let tick_start = Instant::now();

        // Grab on a blocking thread; image decoding is sync
        let grabbed = tokio::task::spawn_blocking(move || {
            let result = source.grab();
            (source, result)
        })
        .await;

        let (returned, result) = match grabbed {
            Ok(v) => v,
            Err(e) => {
                warn!("Capture task panicked: {}", e);
                break;
            }
        };
        source = returned;

        match result {
            Ok(Some(frame)) => {
                let Some(board) = crop_rect(&frame, &rect) else {
                    warn!(
                        "Capture rectangle lies outside the {}x{} frame",
                        frame.width(),
                        frame.height()
                    );
                    break;
                };
                frame_count += 1;

                let elapsed = fps_timer.elapsed().as_secs_f64();
                let fps = if elapsed > 0.0 {
                    frame_count as f64 / elapsed
                } else {
                    0.0
                };

                // Reset FPS counter every 5 seconds
                if elapsed > 5.0 {
                    frame_count = 0;
                    fps_timer = Instant::now();
                }

                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;

                let _ = status_tx.send(CaptureStatus {
                    is_capturing: true,
                    source: Some(name.clone()),
                    fps,
                    last_capture_time: Some(now),
                    resolution: Some(board.dimensions()),
                });

                let _ = frame_tx.send(Some(Arc::new(board)));
            }
            Ok(None) => {
                info!("Source {} has no more frames", name);
                break;
            }
            Err(e) => {
                warn!("Capture failed: {:#}", e);
                let _ = status_tx.send(CaptureStatus {
                    is_capturing: false,
                    source: Some(name.clone()),
                    ..CaptureStatus::default()
                });
            }
        }

        // Sleep until next capture interval
        let elapsed = tick_start.elapsed();
        if elapsed < capture_interval {
            tokio::time::sleep(capture_interval - elapsed).await;
        }
    }

    let _ = status_tx.send(CaptureStatus::default());
    info!("Capture loop stopped");
}
