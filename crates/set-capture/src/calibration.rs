use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::CaptureRect;

/// A picked screen point, in pixels of the captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
}

impl Corner {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Parse `"x y"` or `"x,y"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("calibration cancelled before two corners were picked")]
    Cancelled,
    #[error("no corner picked within {0:?}")]
    Timeout(Duration),
    #[error("capture rectangle {width}x{height} has no area")]
    Degenerate { width: i64, height: i64 },
}

/// Something that can hand out corner points, one blocking call at a time.
pub trait CornerSource {
    fn next_corner(&mut self, timeout: Duration) -> Result<Corner, CalibrationError>;
}

/// Pick the top-left then the bottom-right corner of the capture rectangle.
pub fn calibrate<S: CornerSource + ?Sized>(
    source: &mut S,
    timeout: Duration,
) -> Result<CaptureRect, CalibrationError> {
    let top_left = source.next_corner(timeout)?;
    debug!("Top-left corner at ({}, {})", top_left.x, top_left.y);
    let bottom_right = source.next_corner(timeout)?;
    debug!("Bottom-right corner at ({}, {})", bottom_right.x, bottom_right.y);

    let rect = CaptureRect::from_corners(top_left, bottom_right)?;
    info!(
        "Capture rectangle x={} y={} w={} h={}",
        rect.x(),
        rect.y(),
        rect.width(),
        rect.height()
    );
    Ok(rect)
}

/// Corners known up front, e.g. from command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct FixedCorners {
    corners: VecDeque<Corner>,
}

impl FixedCorners {
    pub fn new(corners: impl IntoIterator<Item = Corner>) -> Self {
        Self {
            corners: corners.into_iter().collect(),
        }
    }
}

impl CornerSource for FixedCorners {
    fn next_corner(&mut self, _timeout: Duration) -> Result<Corner, CalibrationError> {
        self.corners.pop_front().ok_or(CalibrationError::Cancelled)
    }
}

/// Corners typed as text lines, read on a background thread.
///
/// End of input cancels calibration; lines that are not a point are skipped.
pub struct LineCorners {
    rx: mpsc::Receiver<Corner>,
}

impl LineCorners {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match Corner::parse(trimmed) {
                    Some(corner) => {
                        if tx.send(corner).is_err() {
                            break;
                        }
                    }
                    None => warn!("Ignoring corner input '{}', expected 'x y'", trimmed),
                }
            }
        });
        Self { rx }
    }

    pub fn stdin() -> Self {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }
}

impl CornerSource for LineCorners {
    fn next_corner(&mut self, timeout: Duration) -> Result<Corner, CalibrationError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => CalibrationError::Timeout(timeout),
            mpsc::RecvTimeoutError::Disconnected => CalibrationError::Cancelled,
        })
    }
}
