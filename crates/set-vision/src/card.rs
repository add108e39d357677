use image::RgbImage;
use serde::{Deserialize, Serialize};
use set_data::ColorTable;
use set_state::{Board, BoardError, Card};
use tracing::debug;

use crate::color::{classify_color, normalize_channels};
use crate::config::{ConfigError, VisionConfig};
use crate::contours::extract_contours;
use crate::filling::classify_filling;
use crate::segment::{crop_cell, segment_board, Cell};
use crate::shape::classify_shape;

/// Highest symbol count a card can carry.
const MAX_SYMBOLS: usize = 3;

/// Cards read from one board image, with the cells they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardReading {
    pub cells: Vec<Cell>,
    pub board: Board,
}

/// Turns cell images into card records.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    config: VisionConfig,
    colors: ColorTable,
}

impl CardExtractor {
    pub fn new(config: VisionConfig, colors: ColorTable) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, colors })
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Classify one cell. A cell without a readable symbol yields a
    /// degraded card instead of an error.
    pub fn extract(&self, index: usize, cell: &RgbImage) -> Card {
        let cell = normalize_channels(cell, self.config.channel_order);
        let contours = extract_contours(&cell, &self.config);
        let count = contours.principal_len;

        let Some(first) = contours.first_principal() else {
            debug!("Cell {}: no symbol found", index);
            return Card::degraded(index);
        };
        if count > MAX_SYMBOLS {
            debug!("Cell {}: {} symbols is not a card", index, count);
            return Card::degraded(index);
        }

        let shape = classify_shape(first, &self.config);
        let color = classify_color(&cell, &self.colors);
        let Some(filling) = classify_filling(&cell, &contours, &self.colors) else {
            return Card::degraded(index);
        };

        let card = Card::new(index, color, shape, count as u8, filling);
        debug!("Cell {}: {}", index, card);
        card
    }

    /// Segment the board and classify all 12 cells.
    ///
    /// Cells are independent; with the `parallel` feature they are classified
    /// concurrently. The returned board is always in segmenter order.
    pub fn extract_board(&self, image: &RgbImage) -> Result<BoardReading, BoardError> {
        let cells = segment_board(image.width(), image.height());
        let crops: Vec<(usize, RgbImage)> = cells
            .iter()
            .map(|cell| (cell.index, crop_cell(image, cell)))
            .collect();

        #[cfg(feature = "parallel")]
        let cards: Vec<Card> = {
            use rayon::prelude::*;
            crops
                .par_iter()
                .map(|(index, crop)| self.extract(*index, crop))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let cards: Vec<Card> = crops
            .iter()
            .map(|(index, crop)| self.extract(*index, crop))
            .collect();

        let board = Board::new(cards)?;
        debug!(
            "Board {}x{}: {}/{} cards recognized",
            image.width(),
            image.height(),
            board.recognized_count(),
            cells.len()
        );
        Ok(BoardReading { cells, board })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelOrder;
    use image::Rgb;
    use set_state::{CardColor, Filling, Shape};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const GREEN: Rgb<u8> = Rgb([0, 128, 0]);

    fn extractor() -> CardExtractor {
        CardExtractor::new(VisionConfig::default(), ColorTable::builtin()).unwrap()
    }

    /// Draw a rhombus centered at (cx, cy). With `outline` only a band of
    /// `ring` pixels along the edge is inked.
    fn draw_diamond(img: &mut RgbImage, cx: i32, cy: i32, r: i32, ring: i32, color: Rgb<u8>) {
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                let d = (x - cx).abs() + (y - cy).abs();
                if d <= r && (ring == 0 || d > r - ring) {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    fn diamond_cell(count: usize, ring: i32) -> RgbImage {
        let mut img = RgbImage::from_pixel(200, 100, WHITE);
        let centers: &[i32] = match count {
            1 => &[100],
            2 => &[80, 120],
            _ => &[65, 100, 135],
        };
        for &cx in centers {
            draw_diamond(&mut img, cx, 50, 12, ring, GREEN);
        }
        img
    }

    /// Hatched rhombus: a `ring` pixel edge plus every `stripe`-th row.
    fn draw_striped_diamond(img: &mut RgbImage, cx: i32, cy: i32, r: i32, ring: i32, stripe: i32) {
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                let d = (x - cx).abs() + (y - cy).abs();
                if d <= r && (d > r - ring || (y - cy) % stripe == 0) {
                    img.put_pixel(x as u32, y as u32, GREEN);
                }
            }
        }
    }

    /// Solid upright stadium: a `2 * half_w` wide bar with round caps.
    fn draw_stadium(img: &mut RgbImage, cx: i32, cy: i32, half_w: i32, half_h: i32) {
        for y in (cy - half_h)..=(cy + half_h) {
            for x in (cx - half_w)..=(cx + half_w) {
                let dy = ((y - cy).abs() - (half_h - half_w)).max(0);
                let d = ((x - cx) as f64).hypot(dy as f64);
                if d <= half_w as f64 {
                    img.put_pixel(x as u32, y as u32, GREEN);
                }
            }
        }
    }

    /// Solid wavy bar: `1.5` sine periods over its height.
    fn draw_squiggle(img: &mut RgbImage, cx: i32, cy: i32, half_h: i32, half_w: i32, amp: i32) {
        for y in (cy - half_h)..=(cy + half_h) {
            let t = (y - cy) as f64 * std::f64::consts::PI * 1.5 / half_h as f64;
            let offset = amp as f64 * t.sin();
            for x in (cx - half_w - amp - 1)..=(cx + half_w + amp + 1) {
                if ((x - cx) as f64 - offset).abs() <= half_w as f64 {
                    img.put_pixel(x as u32, y as u32, GREEN);
                }
            }
        }
    }

    fn centers(count: usize) -> &'static [i32] {
        match count {
            1 => &[100],
            2 => &[80, 120],
            _ => &[65, 100, 135],
        }
    }

    #[test]
    fn test_solid_ovals() {
        let ex = extractor();
        for count in 1..=3 {
            let mut img = RgbImage::from_pixel(200, 100, WHITE);
            for &cx in centers(count) {
                draw_stadium(&mut img, cx, 50, 8, 18);
            }
            let card = ex.extract(0, &img);
            assert_eq!(
                card,
                Card::new(0, CardColor::Green, Shape::Oval, count as u8, Filling::Filled)
            );
        }
    }

    #[test]
    fn test_striped_diamonds() {
        let ex = extractor();
        for count in [1, 3] {
            let mut img = RgbImage::from_pixel(200, 100, WHITE);
            for &cx in centers(count) {
                draw_striped_diamond(&mut img, cx, 50, 12, 2, 4);
            }
            let card = ex.extract(4, &img);
            assert_eq!(
                card,
                Card::new(4, CardColor::Green, Shape::Diamond, count as u8, Filling::Striped)
            );
        }
    }

    #[test]
    fn test_solid_squiggle() {
        let mut img = RgbImage::from_pixel(200, 100, WHITE);
        draw_squiggle(&mut img, 100, 50, 18, 5, 6);
        let card = extractor().extract(7, &img);
        assert_eq!(
            card,
            Card::new(7, CardColor::Green, Shape::Squiggle, 1, Filling::Filled)
        );
    }

    #[test]
    fn test_blank_cell_degrades() {
        let card = extractor().extract(3, &RgbImage::from_pixel(200, 100, WHITE));
        assert_eq!(card, Card::degraded(3));
    }

    #[test]
    fn test_solid_diamonds() {
        let ex = extractor();
        for count in 1..=3 {
            let card = ex.extract(0, &diamond_cell(count, 0));
            assert_eq!(card.count as usize, count);
            assert_eq!(card.color, CardColor::Green);
            assert_eq!(card.shape, Some(Shape::Diamond));
            assert_eq!(card.filling, Some(Filling::Filled));
        }
    }

    #[test]
    fn test_outline_diamond() {
        let card = extractor().extract(0, &diamond_cell(1, 3));
        assert_eq!(card.count, 1);
        assert_eq!(card.color, CardColor::Green);
        assert_eq!(card.shape, Some(Shape::Diamond));
        assert_eq!(card.filling, Some(Filling::Outline));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VisionConfig {
            polygon_epsilon: -1.0,
            ..VisionConfig::default()
        };
        assert!(CardExtractor::new(config, ColorTable::builtin()).is_err());
    }

    #[test]
    fn test_bgr_buffers_are_normalized() {
        let config = VisionConfig {
            channel_order: ChannelOrder::Bgr,
            ..VisionConfig::default()
        };
        let ex = CardExtractor::new(config, ColorTable::builtin()).unwrap();
        let mut img = RgbImage::from_pixel(200, 100, WHITE);
        // Red ink, stored blue-first.
        draw_diamond(&mut img, 100, 50, 12, 0, Rgb([0, 0, 220]));
        let card = ex.extract(0, &img);
        assert_eq!(card.color, CardColor::Red);
    }

    #[test]
    fn test_board_keeps_slot_order() {
        let mut board = RgbImage::from_pixel(600, 400, WHITE);
        // Slot 5 is column 1, row 1.
        let cell = diamond_cell(2, 0);
        image::imageops::replace(&mut board, &cell, 200, 100);

        let reading = extractor().extract_board(&board).unwrap();
        assert_eq!(reading.cells.len(), 12);
        for (i, card) in reading.board.cards().iter().enumerate() {
            assert_eq!(card.index, i);
            if i == 5 {
                assert_eq!(card.count, 2);
                assert!(card.is_recognized());
            } else {
                assert_eq!(*card, Card::degraded(i));
            }
        }
    }
}
