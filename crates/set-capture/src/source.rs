use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where board frames come from.
pub trait FrameSource: Send {
    fn name(&self) -> String;

    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn grab(&mut self) -> Result<Option<RgbImage>>;
}

/// Re-reads one screenshot file on every grab, so an external tool can keep
/// overwriting it.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for ImageFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn grab(&mut self) -> Result<Option<RgbImage>> {
        load_rgb(&self.path).map(Some)
    }
}

/// A finite sequence of frames: files decoded lazily, or images already in
/// memory.
pub struct ImageSequenceSource {
    name: String,
    pending: VecDeque<Pending>,
}

enum Pending {
    File(PathBuf),
    Frame(RgbImage),
}

impl ImageSequenceSource {
    pub fn from_paths(name: impl Into<String>, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            name: name.into(),
            pending: paths.into_iter().map(Pending::File).collect(),
        }
    }

    pub fn from_frames(name: impl Into<String>, frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            name: name.into(),
            pending: frames.into_iter().map(Pending::Frame).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> String {
        format!("[Sequence] {}", self.name)
    }

    fn grab(&mut self) -> Result<Option<RgbImage>> {
        match self.pending.pop_front() {
            Some(Pending::File(path)) => load_rgb(&path).map(Some),
            Some(Pending::Frame(frame)) => Ok(Some(frame)),
            None => Ok(None),
        }
    }
}

/// Decode an image file into an 8-bit RGB buffer.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .to_rgb8();
    debug!("Loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img)
}
