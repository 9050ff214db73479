//! Canvas-space geometry primitives
//!
//! Points, sizes, rectangles, rotation about a center, grid rounding, and the
//! polyline helpers used by the splice and tap engines to reason about an
//! edge's rendered path.

use serde::{Deserialize, Serialize};

/// Canvas grid pitch. All snapping rounds to multiples of this.
pub const GRID: f64 = 10.0;

/// Tolerance for segment containment and axis classification checks.
pub const SEGMENT_TOLERANCE: f64 = 5.0;

/// A point in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Rotate this point about `center` by `deg` degrees (clockwise-positive,
    /// matching canvas rotation conventions).
    pub fn rotate_about(&self, center: Point, deg: f64) -> Point {
        let rad = deg.to_radians();
        let (sin, cos) = rad.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point {
            x: dx * cos - dy * sin + center.x,
            y: dx * sin + dy * cos + center.y,
        }
    }

    /// Round both coordinates to the canvas grid
    pub fn snapped(&self) -> Point {
        Point {
            x: grid_round(self.x),
            y: grid_round(self.y),
        }
    }
}

/// A width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.w, size.h)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Smallest rectangle containing every point in `points`.
    /// Empty input yields a zero rect at the origin.
    pub fn bounding(points: &[Point]) -> Rect {
        let Some(first) = points.first() else {
            return Rect::default();
        };
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Round a coordinate to the canvas grid
pub fn grid_round(v: f64) -> f64 {
    (v / GRID).round() * GRID
}

/// Axis classification of a segment or a rotated component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Classify a segment by comparing endpoint y-coordinates within tolerance.
/// Anything not flat enough counts as vertical.
pub fn segment_orientation(a: Point, b: Point) -> Orientation {
    if (a.y - b.y).abs() < SEGMENT_TOLERANCE {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

/// Classify a component by its rotation angle normalized to [0, 360).
/// Horizontal within 10° of 0° or 180°; everything else is vertical.
pub fn rotation_orientation(deg: f64) -> Orientation {
    let a = ((deg % 360.0) + 360.0) % 360.0;
    if a < 10.0 || a > 350.0 || (a > 170.0 && a < 190.0) {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

/// Project `query` onto the segment `a`..`b`, returning the nearest point.
fn project_onto_segment(a: Point, b: Point, query: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = (((query.x - a.x) * dx + (query.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

/// The point on a polyline nearest to `query`, or `None` for an empty line.
pub fn closest_point_on_polyline(points: &[Point], query: Point) -> Option<Point> {
    let mut best: Option<(f64, Point)> = None;
    for pair in points.windows(2) {
        let candidate = project_onto_segment(pair[0], pair[1], query);
        let dist = candidate.distance_to(query);
        if best.map(|(d, _)| dist < d).unwrap_or(true) {
            best = Some((dist, candidate));
        }
    }
    best.map(|(_, p)| p).or_else(|| points.first().copied())
}

/// Scan a polyline segment-by-segment for the segment whose expanded
/// bounding box contains `p`. Returns the segment's endpoints.
pub fn containing_segment(points: &[Point], p: Point) -> Option<(Point, Point)> {
    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let min_x = p1.x.min(p2.x) - SEGMENT_TOLERANCE;
        let max_x = p1.x.max(p2.x) + SEGMENT_TOLERANCE;
        let min_y = p1.y.min(p2.y) - SEGMENT_TOLERANCE;
        let max_y = p1.y.max(p2.y) + SEGMENT_TOLERANCE;
        if p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y {
            return Some((p1, p2));
        }
    }
    None
}

/// True when `query` lies within `tolerance` of the polyline.
pub fn polyline_hit_test(points: &[Point], query: Point, tolerance: f64) -> bool {
    closest_point_on_polyline(points, query)
        .map(|p| p.distance_to(query) <= tolerance)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_about_quarter_turn() {
        let p = Point::new(0.0, 20.0).rotate_about(Point::new(20.0, 20.0), 90.0);
        assert!((p.x - 20.0).abs() < 1e-9);
        assert!((p.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_round() {
        assert_eq!(grid_round(14.9), 10.0);
        assert_eq!(grid_round(15.0), 20.0);
        assert_eq!(grid_round(-4.0), -0.0);
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_segment_orientation_tolerance() {
        let a = Point::new(0.0, 100.0);
        let b = Point::new(200.0, 103.0);
        assert_eq!(segment_orientation(a, b), Orientation::Horizontal);
        let c = Point::new(0.0, 200.0);
        assert_eq!(segment_orientation(a, c), Orientation::Vertical);
    }

    #[test]
    fn test_rotation_orientation_bands() {
        assert_eq!(rotation_orientation(0.0), Orientation::Horizontal);
        assert_eq!(rotation_orientation(355.0), Orientation::Horizontal);
        assert_eq!(rotation_orientation(180.0), Orientation::Horizontal);
        assert_eq!(rotation_orientation(90.0), Orientation::Vertical);
        assert_eq!(rotation_orientation(270.0), Orientation::Vertical);
        assert_eq!(rotation_orientation(-90.0), Orientation::Vertical);
        assert_eq!(rotation_orientation(450.0), Orientation::Vertical);
    }

    #[test]
    fn test_containing_segment_multi_bend() {
        // L-shaped run: horizontal then vertical
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        ];
        let (a, b) = containing_segment(&points, Point::new(50.0, 2.0)).unwrap();
        assert_eq!(a, points[0]);
        assert_eq!(b, points[1]);
        let (a, b) = containing_segment(&points, Point::new(98.0, 60.0)).unwrap();
        assert_eq!(a, points[1]);
        assert_eq!(b, points[2]);
        assert!(containing_segment(&points, Point::new(300.0, 300.0)).is_none());
    }

    #[test]
    fn test_closest_point_on_polyline() {
        let points = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let p = closest_point_on_polyline(&points, Point::new(40.0, 30.0)).unwrap();
        assert_eq!(p, Point::new(40.0, 0.0));
    }

    #[test]
    fn test_polyline_hit_test() {
        let points = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(polyline_hit_test(&points, Point::new(50.0, 4.0), 5.0));
        assert!(!polyline_hit_test(&points, Point::new(50.0, 12.0), 5.0));
    }
}
