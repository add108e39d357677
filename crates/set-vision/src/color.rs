use image::RgbImage;
use set_data::{ColorTable, NamedColor};
use set_state::CardColor;
use std::collections::HashSet;
use tracing::debug;

use crate::config::ChannelOrder;

/// Sum of squared per-channel differences.
pub fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Resolve a color to its reference entry: exact match first, otherwise the
/// closest entry. Equal distances go to the lexicographically first name.
pub fn nearest_color(table: &ColorTable, rgb: [u8; 3]) -> Option<&NamedColor> {
    if let Some(exact) = table.exact(rgb) {
        return Some(exact);
    }
    // `min_by_key` keeps the first minimum; entries are sorted by name.
    table
        .entries()
        .iter()
        .min_by_key(|entry| squared_distance(entry.rgb, rgb))
}

/// Reorder a pixel to RGB.
pub fn to_rgb(pixel: [u8; 3], order: ChannelOrder) -> [u8; 3] {
    match order {
        ChannelOrder::Rgb => pixel,
        ChannelOrder::Bgr => [pixel[2], pixel[1], pixel[0]],
    }
}

/// Copy of `image` with its channels normalized to RGB.
pub fn normalize_channels(image: &RgbImage, order: ChannelOrder) -> RgbImage {
    match order {
        ChannelOrder::Rgb => image.clone(),
        ChannelOrder::Bgr => {
            let mut out = image.clone();
            for p in out.pixels_mut() {
                p.0 = to_rgb(p.0, order);
            }
            out
        }
    }
}

/// Number of distinct cell colors voting for each card color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyVotes {
    pub green: usize,
    pub red: usize,
    pub purple: usize,
}

impl FamilyVotes {
    /// Highest vote wins; ties go green, then red, then purple.
    pub fn winner(&self) -> CardColor {
        let ranked = [
            (self.green, CardColor::Green),
            (self.red, CardColor::Red),
            (self.purple, CardColor::Purple),
        ];
        let mut best = (0, CardColor::Unknown);
        for (votes, color) in ranked {
            if votes > best.0 {
                best = (votes, color);
            }
        }
        best.1
    }
}

pub fn count_families(cell: &RgbImage, table: &ColorTable) -> FamilyVotes {
    let distinct: HashSet<[u8; 3]> = cell.pixels().map(|p| p.0).collect();
    let mut votes = FamilyVotes::default();
    for rgb in &distinct {
        match nearest_color(table, *rgb).and_then(|entry| entry.family) {
            Some(CardColor::Green) => votes.green += 1,
            Some(CardColor::Red) => votes.red += 1,
            Some(CardColor::Purple) => votes.purple += 1,
            Some(CardColor::Unknown) | None => {}
        }
    }
    debug!(
        "{} distinct colors: green={} red={} purple={}",
        distinct.len(),
        votes.green,
        votes.red,
        votes.purple
    );
    votes
}

/// Card color of an RGB cell image.
pub fn classify_color(cell: &RgbImage, table: &ColorTable) -> CardColor {
    count_families(cell, table).winner()
}
