use serde::{Deserialize, Serialize};

/// Slack allowed when testing whether a computed intersection lies on a
/// rectangle. Intersections are derived through a division and land a few
/// ulps off the exact boundary.
const BOUNDS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned box in some parent coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_corners(min: Point, max: Point) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    fn contains_loosely(&self, p: Point) -> bool {
        p.x >= self.min_x() - BOUNDS_EPSILON
            && p.x <= self.max_x() + BOUNDS_EPSILON
            && p.y >= self.min_y() - BOUNDS_EPSILON
            && p.y <= self.max_y() + BOUNDS_EPSILON
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let min = Point::new(self.min_x().min(other.min_x()), self.min_y().min(other.min_y()));
        let max = Point::new(self.max_x().max(other.max_x()), self.max_y().max(other.max_y()));
        Rect::from_corners(min, max)
    }

    /// Boundary segments in clockwise order starting at the top edge.
    pub fn sides(&self) -> [(Point, Point); 4] {
        let nw = Point::new(self.min_x(), self.min_y());
        let ne = Point::new(self.max_x(), self.min_y());
        let se = Point::new(self.max_x(), self.max_y());
        let sw = Point::new(self.min_x(), self.max_y());
        [(nw, ne), (ne, se), (se, sw), (sw, nw)]
    }
}

/// Intersection of the lines through `p1 p2` and `p3 p4`.
///
/// Returns `None` only when the determinant is exactly zero; nearly
/// parallel lines produce far-away points.
pub fn segment_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let x_diff1 = p1.x - p2.x;
    let y_diff1 = p2.y - p1.y;
    let mod1 = y_diff1 * p1.x + x_diff1 * p1.y;

    let x_diff2 = p3.x - p4.x;
    let y_diff2 = p4.y - p3.y;
    let mod2 = y_diff2 * p3.x + x_diff2 * p3.y;

    let delta = y_diff1 * x_diff2 - y_diff2 * x_diff1;
    if delta == 0.0 {
        return None;
    }
    Some(Point::new(
        (x_diff2 * mod1 - x_diff1 * mod2) / delta,
        (y_diff1 * mod2 - y_diff2 * mod1) / delta,
    ))
}

/// Where the line from `source` towards `target` crosses the boundary of
/// `rect`, picking the crossing nearest to `source`.
///
/// Crossings at the same distance keep the first side found (top, right,
/// bottom, left). Callers fall back to `target` on `None`.
pub fn rectangle_intercept(source: Point, target: Point, rect: &Rect) -> Option<Point> {
    let mut best: Option<(f64, Point)> = None;
    for (start, end) in rect.sides() {
        let Some(hit) = segment_intersection(source, target, start, end) else {
            continue;
        };
        if !rect.contains_loosely(hit) {
            continue;
        }
        let distance = hit.distance(source);
        match best {
            Some((nearest, _)) if nearest <= distance => {}
            _ => best = Some((distance, hit)),
        }
    }
    best.map(|(_, hit)| hit)
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    debug_assert!(min <= max, "clamp bounds inverted: {min} > {max}");
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Distance from `p` to the closed segment `a b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let v = b - a;
    let w = p - a;
    let vv = v.x * v.x + v.y * v.y;
    let t = if vv > 0.0 { ((w.x * v.x + w.y * v.y) / vv).clamp(0.0, 1.0) } else { 0.0 };
    p.distance(a + v * t)
}

/// The two barbs of an arrow drawn from `start` to `end`. Each barb is a
/// segment ending at `end`. A zero-length arrow collapses both barbs onto
/// `end`.
pub fn arrow_heads(start: Point, end: Point, length: f64, width: f64) -> [(Point, Point); 2] {
    if start == end {
        return [(end, end), (end, end)];
    }
    let hypot = start.distance(end);
    let factor = length / hypot;
    let factor_o = width / hypot;

    let d = (start - end) * factor;
    let o = (start - end) * factor_o;

    [
        (Point::new(end.x + d.x - o.y, end.y + d.y + o.x), end),
        (Point::new(end.x + d.x + o.y, end.y + d.y - o.x), end),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn crossing_lines_intersect() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(hit, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn intersection_extends_past_segment_ends() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(5.0, -1.0),
            Point::new(5.0, 1.0),
        );
        assert_eq!(hit, Some(Point::new(5.0, 0.0)));
    }

    #[test]
    fn intercept_hits_left_side_from_the_left() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        let hit = rectangle_intercept(Point::new(0.0, 20.0), rect.center(), &rect);
        assert_eq!(hit, Some(Point::new(10.0, 20.0)));
    }

    #[test]
    fn intercept_picks_side_nearest_source() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let hit = rectangle_intercept(Point::new(5.0, 50.0), Point::new(5.0, 5.0), &rect);
        assert_eq!(hit, Some(Point::new(5.0, 10.0)));
    }

    #[test]
    fn intercept_through_corner() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let hit = rectangle_intercept(Point::new(-5.0, -5.0), Point::new(5.0, 5.0), &rect);
        assert_eq!(hit, Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn intercept_misses_when_line_passes_by() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let hit = rectangle_intercept(Point::new(-5.0, 20.0), Point::new(20.0, 20.0), &rect);
        assert!(hit.is_none());
    }

    #[test]
    fn clamp_limits_both_ends() {
        assert_eq!(clamp(0.05, 0.1, 10.0), 0.1);
        assert_eq!(clamp(12.0, 0.1, 10.0), 10.0);
        assert_eq!(clamp(3.0, 0.1, 10.0), 3.0);
    }

    #[test]
    fn segment_distance_projects_onto_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(segment_distance(Point::new(2.0, 2.0), a, a), 8.0_f64.sqrt());
    }

    #[test]
    fn arrow_heads_flank_the_shaft() {
        let [left, right] = arrow_heads(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0, 5.0);
        assert_eq!(left, (Point::new(90.0, -5.0), Point::new(100.0, 0.0)));
        assert_eq!(right, (Point::new(90.0, 5.0), Point::new(100.0, 0.0)));
    }

    #[test]
    fn zero_length_arrow_collapses() {
        let p = Point::new(3.0, 4.0);
        let heads = arrow_heads(p, p, 10.0, 5.0);
        assert_eq!(heads, [(p, p), (p, p)]);
    }

    proptest! {
        #[test]
        fn intercept_lies_on_boundary_between_source_and_center(
            rx in -200.0f64..200.0,
            ry in -200.0f64..200.0,
            w in 1.0f64..100.0,
            h in 1.0f64..100.0,
            angle in 0.0f64..std::f64::consts::TAU,
            reach in 1.5f64..20.0,
        ) {
            let rect = Rect::new(rx, ry, w, h);
            let center = rect.center();
            let radius = w.max(h) * reach;
            let source = Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin());

            let hit = rectangle_intercept(source, center, &rect);
            prop_assert!(hit.is_some());
            let hit = hit.unwrap_or_default();

            let tol = 1e-6 * (1.0 + radius);
            let on_vertical = (hit.x - rect.min_x()).abs() <= tol || (hit.x - rect.max_x()).abs() <= tol;
            let on_horizontal = (hit.y - rect.min_y()).abs() <= tol || (hit.y - rect.max_y()).abs() <= tol;
            prop_assert!(on_vertical || on_horizontal);

            let total = source.distance(center);
            let split = source.distance(hit) + hit.distance(center);
            prop_assert!((split - total).abs() <= tol);
            prop_assert!(source.distance(hit) < total);
            prop_assert!(hit.distance(center) > 0.0);
        }
    }
}
