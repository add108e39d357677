use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Channel order of the pixel buffers handed to the extractor.
///
/// Buffers are normalized to RGB once per cell; every classifier downstream
/// works in RGB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Tunable constants of the card feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Intensities above this value are foreground.
    pub binary_threshold: u8,
    /// Polygon approximation tolerance as a fraction of the contour's arc length.
    pub polygon_epsilon: f64,
    /// Maximum area difference between contours of repeated symbols.
    pub area_tolerance: f64,
    /// Central window (fractions of cell width and height) that symbol
    /// centroids must fall into.
    pub center_window: (f64, f64),
    /// Polygons with at most this many vertices are diamonds.
    pub diamond_max_vertices: usize,
    /// Polygons with more than this many vertices are squiggles.
    pub squiggle_min_vertices: usize,
    pub channel_order: ChannelOrder,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 127,
            polygon_epsilon: 0.01,
            area_tolerance: 0.5,
            center_window: (0.6, 0.4),
            diamond_max_vertices: 5,
            squiggle_min_vertices: 11,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("polygon epsilon must be in (0, 1), got {0}")]
    PolygonEpsilon(f64),
    #[error("area tolerance must be finite and non-negative, got {0}")]
    AreaTolerance(f64),
    #[error("center window fractions must be in (0, 1], got ({0}, {1})")]
    CenterWindow(f64, f64),
    #[error("diamond vertex limit {diamond} must be below squiggle limit {squiggle}")]
    VertexLimits { diamond: usize, squiggle: usize },
}

impl VisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.polygon_epsilon > 0.0 && self.polygon_epsilon < 1.0) {
            return Err(ConfigError::PolygonEpsilon(self.polygon_epsilon));
        }
        if !(self.area_tolerance.is_finite() && self.area_tolerance >= 0.0) {
            return Err(ConfigError::AreaTolerance(self.area_tolerance));
        }
        let (fw, fh) = self.center_window;
        let in_range = |f: f64| f > 0.0 && f <= 1.0;
        if !(in_range(fw) && in_range(fh)) {
            return Err(ConfigError::CenterWindow(fw, fh));
        }
        if self.diamond_max_vertices >= self.squiggle_min_vertices {
            return Err(ConfigError::VertexLimits {
                diamond: self.diamond_max_vertices,
                squiggle: self.squiggle_min_vertices,
            });
        }
        Ok(())
    }

    /// Load and validate a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("No vision config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid vision config {}", path.display()))?;
        info!("Loaded vision config from {}", path.display());
        Ok(config)
    }
}
