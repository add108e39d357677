use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use set_state::Shape;

use crate::config::VisionConfig;
use crate::contours::SymbolContour;

/// Rounds of farthest-point search used to pick the closed curve's split.
const SPLIT_SEARCH_ROUNDS: usize = 3;

/// Vertex count of the closed contour after Douglas-Peucker simplification
/// with a tolerance of `epsilon_fraction` times its perimeter.
pub fn approximate_vertices(points: &[Point<i32>], epsilon_fraction: f64) -> usize {
    if points.len() < 3 {
        return points.len();
    }
    let epsilon = epsilon_fraction * arc_length(points, true);
    if epsilon <= 0.0 {
        return points.len();
    }
    let mut polygon = approximate_closed(points, epsilon);
    drop_seam_vertices(&mut polygon, epsilon);
    polygon.len()
}

/// Simplify a closed curve by splitting it between two far apart points and
/// running Douglas-Peucker on each half.
///
/// The split pair comes from repeated farthest-point searches: from the
/// first point to its farthest point, then from there to its own farthest,
/// and so on.
fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let mut from = 0;
    let mut to = 0;
    for _ in 0..SPLIT_SEARCH_ROUNDS {
        let Some((far, dist)) = farthest_from(points, to) else {
            return vec![points[0]];
        };
        if dist <= epsilon {
            return vec![points[to]];
        }
        from = to;
        to = far;
    }

    let (lo, hi) = (from.min(to), from.max(to));
    let mut wrapped = points[hi..].to_vec();
    wrapped.extend_from_slice(&points[..=lo]);

    let mut polygon = approximate_polygon_dp(&points[lo..=hi], epsilon, false);
    let second = approximate_polygon_dp(&wrapped, epsilon, false);
    // Both halves repeat the split points at their ends.
    if second.len() > 2 {
        polygon.extend_from_slice(&second[1..second.len() - 1]);
    }
    polygon
}

/// Index of the point farthest from `points[start]`, scanning forward from
/// `start` and keeping the first maximum.
fn farthest_from(points: &[Point<i32>], start: usize) -> Option<(usize, f64)> {
    let n = points.len();
    let origin = points[start];
    let mut best: Option<(usize, f64)> = None;
    for step in 1..n {
        let i = (start + step) % n;
        let (dx, dy) = ((points[i].x - origin.x) as f64, (points[i].y - origin.y) as f64);
        let d = dx.hypot(dy);
        if best.map_or(d > 0.0, |(_, b)| d > b) {
            best = Some((i, d));
        }
    }
    best
}

/// The split points always survive simplification even when they sit in the
/// middle of a straight edge. Remove them when they lie
/// within `epsilon` of the line through their neighbours.
fn drop_seam_vertices(polygon: &mut Vec<Point<i32>>, epsilon: f64) {
    while polygon.len() > 3 {
        let n = polygon.len();
        if distance_to_line(polygon[n - 1], polygon[n - 2], polygon[0]) <= epsilon {
            polygon.pop();
        } else if distance_to_line(polygon[0], polygon[n - 1], polygon[1]) <= epsilon {
            polygon.remove(0);
        } else {
            break;
        }
    }
}

fn distance_to_line(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (px, py) = ((p.x - a.x) as f64, (p.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return px.hypot(py);
    }
    (dx * py - dy * px).abs() / len
}

pub fn shape_from_vertices(vertices: usize, config: &VisionConfig) -> Shape {
    if vertices <= config.diamond_max_vertices {
        Shape::Diamond
    } else if vertices > config.squiggle_min_vertices {
        Shape::Squiggle
    } else {
        Shape::Oval
    }
}

pub fn classify_shape(contour: &SymbolContour, config: &VisionConfig) -> Shape {
    let vertices = approximate_vertices(&contour.points, config.polygon_epsilon);
    let shape = shape_from_vertices(vertices, config);
    tracing::trace!("{} vertices -> {}", vertices, shape.name());
    shape
}
