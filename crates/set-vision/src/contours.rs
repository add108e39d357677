use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;
use tracing::debug;

use crate::config::VisionConfig;

/// Polygon moments of a closed contour: area and first-order moments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Green's theorem over the contour polygon. The result is signed
    /// according to the winding direction.
    pub fn of_polygon(points: &[Point<i32>]) -> Self {
        let n = points.len();
        let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let (x0, y0, x1, y1) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
            let cross = x0 * y1 - x1 * y0;
            m00 += cross;
            m10 += (x0 + x1) * cross;
            m01 += (y0 + y1) * cross;
        }
        Self {
            m00: m00 / 2.0,
            m10: m10 / 6.0,
            m01: m01 / 6.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.m00.abs()
    }

    /// `None` for degenerate (zero-area) polygons.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 == 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// A traced region boundary inside a cell.
#[derive(Debug, Clone)]
pub struct SymbolContour {
    pub points: Vec<Point<i32>>,
    pub area: f64,
    pub centroid: (f64, f64),
    pub is_hole: bool,
}

/// Contours of one cell that survived filtering, largest first.
///
/// The first `principal_len` entries are the repeated copies of the card's
/// printed symbol.
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    pub contours: Vec<SymbolContour>,
    pub principal_len: usize,
}

impl ContourSet {
    pub fn principal(&self) -> &[SymbolContour] {
        &self.contours[..self.principal_len]
    }

    pub fn first_principal(&self) -> Option<&SymbolContour> {
        self.principal().first()
    }
}

/// Grayscale and threshold: intensities above `threshold` become 255.
pub fn binarize(cell: &RgbImage, threshold: u8) -> GrayImage {
    let mut gray = image::imageops::grayscale(cell);
    for p in gray.pixels_mut() {
        p[0] = if p[0] > threshold { 255 } else { 0 };
    }
    gray
}

/// Trace the cell's region boundaries and pick out the symbol contours.
pub fn extract_contours(cell: &RgbImage, config: &VisionConfig) -> ContourSet {
    let (w, h) = (cell.width() as f64, cell.height() as f64);
    let binary = binarize(cell, config.binary_threshold);
    let traced = trace_padded(&binary);
    let traced_len = traced.len();

    let (fw, fh) = config.center_window;
    let (x_lo, x_hi) = (w * (0.5 - fw / 2.0), w * (0.5 + fw / 2.0));
    let (y_lo, y_hi) = (h * (0.5 - fh / 2.0), h * (0.5 + fh / 2.0));

    // The first traced border is the cell's own frame.
    let mut contours: Vec<SymbolContour> = traced
        .into_iter()
        .skip(1)
        .filter_map(|c| {
            let moments = Moments::of_polygon(&c.points);
            let (cx, cy) = moments.centroid()?;
            if !(cx > x_lo && cx < x_hi && cy > y_lo && cy < y_hi) {
                return None;
            }
            Some(SymbolContour {
                area: moments.area(),
                centroid: (cx, cy),
                is_hole: matches!(c.border_type, BorderType::Hole),
                points: c.points,
            })
        })
        .collect();

    contours.sort_by(|a, b| b.area.total_cmp(&a.area));
    let principal_len = principal_len(&contours, config.area_tolerance);

    debug!(
        "Cell {}x{}: {} traced, {} central ({} holes), {} principal",
        cell.width(),
        cell.height(),
        traced_len,
        contours.len(),
        contours.iter().filter(|c| c.is_hole).count(),
        principal_len
    );

    ContourSet {
        contours,
        principal_len,
    }
}

/// Trace `binary` inside a one pixel dark border, with points mapped back to
/// `binary` coordinates.
///
/// `find_contours` only opens an outer border next to a background pixel, so
/// a light cell touching the image edge would get no frame contour. The
/// border gives it one, and it always comes first in raster order.
fn trace_padded(binary: &GrayImage) -> Vec<Contour<i32>> {
    let mut padded = GrayImage::new(binary.width() + 2, binary.height() + 2);
    image::imageops::replace(&mut padded, binary, 1, 1);
    let mut traced = find_contours::<i32>(&padded);
    for contour in &mut traced {
        for p in &mut contour.points {
            p.x -= 1;
            p.y -= 1;
        }
    }
    traced
}

/// Length of the leading run of contours whose areas step down by at most
/// `tolerance` from one to the next.
fn principal_len(sorted: &[SymbolContour], tolerance: f64) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted
        .windows(2)
        .take_while(|pair| (pair[0].area - pair[1].area).abs() <= tolerance)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const INK: Rgb<u8> = Rgb([0, 128, 0]);

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, WHITE)
    }

    fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, color);
            }
        }
    }

    fn contour(area: f64) -> SymbolContour {
        SymbolContour {
            points: Vec::new(),
            area,
            centroid: (0.0, 0.0),
            is_hole: false,
        }
    }

    #[test]
    fn test_moments_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        let m = Moments::of_polygon(&square);
        assert_eq!(m.area(), 16.0);
        let (cx, cy) = m.centroid().unwrap();
        assert!((cx - 2.0).abs() < 1e-9 && (cy - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_polygon_has_no_centroid() {
        let line = [Point::new(0, 0), Point::new(5, 0)];
        assert_eq!(Moments::of_polygon(&line).centroid(), None);
        assert_eq!(Moments::of_polygon(&[]).centroid(), None);
    }

    #[test]
    fn test_binarize_threshold() {
        let mut img = blank(2, 1);
        img.put_pixel(1, 0, Rgb([127, 127, 127]));
        let bin = binarize(&img, 127);
        assert_eq!(bin.get_pixel(0, 0)[0], 255);
        assert_eq!(bin.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_principal_len_stops_at_first_gap() {
        let sorted: Vec<_> = [400.0, 400.0, 399.6, 120.0, 120.0]
            .into_iter()
            .map(contour)
            .collect();
        assert_eq!(principal_len(&sorted, 0.5), 3);
        assert_eq!(principal_len(&sorted[3..], 0.5), 2);
        assert_eq!(principal_len(&[], 0.5), 0);
    }

    #[test]
    fn test_uniform_cell_has_no_symbols() {
        let set = extract_contours(&blank(90, 60), &VisionConfig::default());
        assert!(set.contours.is_empty());
        assert!(set.first_principal().is_none());

        let dark = RgbImage::from_pixel(90, 60, Rgb([10, 10, 10]));
        let set = extract_contours(&dark, &VisionConfig::default());
        assert_eq!(set.principal_len, 0);
    }

    #[test]
    fn test_repeated_symbols_are_principal() {
        let mut img = blank(120, 60);
        fill_rect(&mut img, 30, 24, 40, 36, INK);
        fill_rect(&mut img, 55, 24, 65, 36, INK);
        fill_rect(&mut img, 80, 24, 90, 36, INK);

        let set = extract_contours(&img, &VisionConfig::default());
        assert_eq!(set.principal_len, 3);
        let area = set.contours[0].area;
        assert!(set.principal().iter().all(|c| c.area == area));
    }

    #[test]
    fn test_single_solid_symbol_is_kept() {
        let mut img = blank(200, 100);
        fill_rect(&mut img, 90, 40, 110, 60, INK);

        let set = extract_contours(&img, &VisionConfig::default());
        assert_eq!(set.principal_len, 1);
        let first = set.first_principal().unwrap();
        assert!(first.is_hole);
        let (cx, cy) = first.centroid;
        assert!((cx - 99.5).abs() < 1e-9 && (cy - 49.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_contour_is_traced_first() {
        let mut binary = GrayImage::from_pixel(40, 30, image::Luma([255]));
        for y in 10..20 {
            for x in 15..25 {
                binary.put_pixel(x, y, image::Luma([0]));
            }
        }
        let traced = trace_padded(&binary);
        assert_eq!(traced.len(), 2);
        assert!(matches!(traced[0].border_type, BorderType::Outer));
        assert!(traced[0].points.contains(&Point::new(0, 0)));
        assert!(matches!(traced[1].border_type, BorderType::Hole));
        assert!(traced.iter().flat_map(|c| &c.points).all(|p| p.x >= 0 && p.y >= 0));
    }

    #[test]
    fn test_ink_on_cell_edge_keeps_symbol() {
        let mut img = blank(200, 100);
        fill_rect(&mut img, 0, 0, 5, 100, INK);
        fill_rect(&mut img, 90, 40, 110, 60, INK);

        let set = extract_contours(&img, &VisionConfig::default());
        assert_eq!(set.principal_len, 1);
        assert_eq!(set.contours.len(), 1);
    }

    #[test]
    fn test_off_center_marks_are_ignored() {
        let mut img = blank(120, 60);
        fill_rect(&mut img, 55, 24, 65, 36, INK);
        // Corner mark, outside the central window.
        fill_rect(&mut img, 2, 2, 12, 12, INK);

        let set = extract_contours(&img, &VisionConfig::default());
        assert_eq!(set.contours.len(), 1);
        assert_eq!(set.principal_len, 1);
        let (cx, cy) = set.contours[0].centroid;
        assert!(cx > 50.0 && cx < 70.0 && cy > 25.0 && cy < 35.0);
    }
}
