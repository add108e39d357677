//! Card feature extraction for photographed Set boards.
//!
//! A board image is cut into 12 cells; each cell is reduced to a
//! [`set_state::Card`] by tracing its symbol contours and classifying shape,
//! color and filling.

pub mod card;
pub mod color;
pub mod config;
pub mod contours;
pub mod filling;
pub mod overlay;
pub mod segment;
pub mod shape;

pub use card::{BoardReading, CardExtractor};
pub use config::{ChannelOrder, ConfigError, VisionConfig};
pub use contours::{extract_contours, ContourSet, SymbolContour};
pub use overlay::{annotations, render, Annotation};
pub use segment::{crop_cell, segment_board, Cell};
