use image::RgbImage;
use serde::{Deserialize, Serialize};
use set_state::{grid_position, BOARD_COLUMNS, BOARD_ROWS, BOARD_SIZE};
use tracing::debug;

/// One card slot of the board grid, in pixel coordinates of the board image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub index: usize,
    pub column: u32,
    pub row: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Cell {
    /// Build the cell for a flat board index, given the common cell size.
    pub fn from_index(index: usize, width: u32, height: u32) -> Self {
        let (column, row) = grid_position(index);
        Self {
            index,
            column,
            row,
            x: column * width,
            y: row * height,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Split a `width x height` board into its 12 cells.
///
/// Cells are emitted column by column, top to bottom within a column, so
/// `cells[i].index == i == column * 4 + row`. Cell sizes are truncated; the
/// remainder at the right and bottom edges is left unassigned.
pub fn segment_board(width: u32, height: u32) -> Vec<Cell> {
    let cell_w = width / BOARD_COLUMNS;
    let cell_h = height / BOARD_ROWS;

    debug!(
        "Board {}x{} -> cells {}x{} (unused border {}x{})",
        width,
        height,
        cell_w,
        cell_h,
        width - cell_w * BOARD_COLUMNS,
        height - cell_h * BOARD_ROWS
    );

    let mut cells = Vec::with_capacity(BOARD_SIZE);
    for column in 0..BOARD_COLUMNS {
        for row in 0..BOARD_ROWS {
            let index = (column * BOARD_ROWS + row) as usize;
            cells.push(Cell::from_index(index, cell_w, cell_h));
        }
    }
    cells
}

/// Copy one cell out of the board image.
pub fn crop_cell(board: &RgbImage, cell: &Cell) -> RgbImage {
    image::imageops::crop_imm(board, cell.x, cell.y, cell.width, cell.height).to_image()
}
