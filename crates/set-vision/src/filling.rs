use image::RgbImage;
use set_data::ColorTable;
use set_state::Filling;
use tracing::trace;

use crate::color::nearest_color;
use crate::contours::ContourSet;

/// Name a blank symbol interior resolves to.
const OUTLINE_NAME: &str = "white";

/// Decide how the card's symbols are filled.
///
/// Hatching adds extra boundaries inside each symbol, so more than two
/// contours per principal shape means stripes. Otherwise the color at the
/// first symbol's centroid tells a blank (outline) interior from a solid one.
/// Returns `None` when there is no principal shape to sample.
pub fn classify_filling(cell: &RgbImage, contours: &ContourSet, table: &ColorTable) -> Option<Filling> {
    let first = contours.first_principal()?;
    if contours.contours.len() > 2 * contours.principal_len {
        return Some(Filling::Striped);
    }

    let (cx, cy) = first.centroid;
    let x = (cx.max(0.0) as u32).min(cell.width().saturating_sub(1));
    let y = (cy.max(0.0) as u32).min(cell.height().saturating_sub(1));
    let sample = cell.get_pixel_checked(x, y)?.0;
    let name = nearest_color(table, sample).map(|entry| entry.name.as_str());
    trace!("Centroid ({}, {}) color {:?} -> {:?}", x, y, sample, name);

    if name == Some(OUTLINE_NAME) {
        Some(Filling::Outline)
    } else {
        Some(Filling::Filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contours::SymbolContour;
    use image::Rgb;

    fn symbol(area: f64, centroid: (f64, f64)) -> SymbolContour {
        SymbolContour {
            points: Vec::new(),
            area,
            centroid,
            is_hole: true,
        }
    }

    fn cell_with_center(color: Rgb<u8>) -> RgbImage {
        let mut cell = RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]));
        for y in 8..12 {
            for x in 18..22 {
                cell.put_pixel(x, y, color);
            }
        }
        cell
    }

    #[test]
    fn test_many_contours_mean_stripes() {
        let set = ContourSet {
            contours: vec![
                symbol(100.0, (20.0, 10.0)),
                symbol(40.0, (20.0, 10.0)),
                symbol(10.0, (20.0, 10.0)),
            ],
            principal_len: 1,
        };
        let cell = cell_with_center(Rgb([0, 128, 0]));
        assert_eq!(
            classify_filling(&cell, &set, &ColorTable::builtin()),
            Some(Filling::Striped)
        );
    }

    #[test]
    fn test_center_color_decides_solid_or_outline() {
        let table = ColorTable::builtin();
        let set = ContourSet {
            contours: vec![symbol(100.0, (20.5, 10.5)), symbol(60.0, (20.5, 10.5))],
            principal_len: 1,
        };

        let solid = cell_with_center(Rgb([0, 128, 0]));
        assert_eq!(classify_filling(&solid, &set, &table), Some(Filling::Filled));

        let blank = cell_with_center(Rgb([252, 253, 251]));
        assert_eq!(classify_filling(&blank, &set, &table), Some(Filling::Outline));
    }

    #[test]
    fn test_no_principal_shape() {
        let cell = cell_with_center(Rgb([0, 0, 0]));
        assert_eq!(
            classify_filling(&cell, &ContourSet::default(), &ColorTable::builtin()),
            None
        );
    }
}
