use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use set_state::{Board, SetTriple};

use crate::segment::Cell;

/// Outline color for matched cells.
pub const HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// Outline thickness in pixels.
const HIGHLIGHT_WIDTH: u32 = 3;

/// One text label to be drawn on the board by the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub cell_index: usize,
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Per-cell labels: color, count, shape and filling, stacked at fixed
/// fractions of the cell size from its top-left corner.
pub fn annotations(cells: &[Cell], board: &Board) -> Vec<Annotation> {
    let mut out = Vec::with_capacity(cells.len() * 4);
    for (cell, card) in cells.iter().zip(board.cards()) {
        let lines = [
            card.color.name().to_string(),
            card.count.to_string(),
            card.shape.map_or("-", |s| s.name()).to_string(),
            card.filling.map_or("-", |f| f.name()).to_string(),
        ];
        let x = (cell.x + cell.width / 10) as i32;
        for (i, text) in lines.into_iter().enumerate() {
            let y = (cell.y + cell.height * (2 * i as u32 + 1) / 10) as i32;
            out.push(Annotation {
                cell_index: cell.index,
                text,
                x,
                y,
            });
        }
    }
    out
}

/// Outline the three matched cells.
pub fn draw_set(image: &mut RgbImage, cells: &[Cell], set: &SetTriple) {
    for index in set.indices() {
        let Some(cell) = cells.get(index) else {
            continue;
        };
        for inset in 0..HIGHLIGHT_WIDTH {
            let (w, h) = (
                cell.width.saturating_sub(2 * inset),
                cell.height.saturating_sub(2 * inset),
            );
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((cell.x + inset) as i32, (cell.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(image, rect, HIGHLIGHT);
        }
    }
}

/// Annotated copy of the board image: the matched cells outlined.
///
/// Per-cell labels are not rasterized here. They come from [`annotations`]
/// and are drawn by the display layer, which owns fonts.
pub fn render(image: &RgbImage, cells: &[Cell], set: Option<&SetTriple>) -> RgbImage {
    let mut out = image.clone();
    if let Some(set) = set {
        draw_set(&mut out, cells, set);
    }
    out
}
