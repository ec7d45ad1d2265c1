use std::cmp::Ordering;

use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::point::Point;
use nalgebra::Point2;

use crate::config::DetectorConfig;
use crate::contours::Contour;

/// Semantic role of a card corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// Roles in output order
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }
}

/// Convex four-vertex polygon accepted as a possible card.
///
/// Vertices are kept in detection order, which may start anywhere and wind
/// either way. Only [`filter`] creates these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateQuad {
    points: [Point<i32>; 4],
}

impl CandidateQuad {
    pub fn points(&self) -> &[Point<i32>; 4] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        contour_area(&self.points)
    }
}

/// Four corners with fixed roles, stored as `[TopLeft, TopRight, BottomRight, BottomLeft]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedQuad {
    corners: [Point2<f64>; 4],
}

impl OrderedQuad {
    /// Build from corners whose roles the caller already knows
    pub fn new(
        top_left: Point2<f64>,
        top_right: Point2<f64>,
        bottom_right: Point2<f64>,
        bottom_left: Point2<f64>,
    ) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    pub fn corner(&self, role: Corner) -> Point2<f64> {
        self.corners[role.index()]
    }

    pub fn corners(&self) -> &[Point2<f64>; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> Point2<f64> {
        self.corner(Corner::TopLeft)
    }

    pub fn top_right(&self) -> Point2<f64> {
        self.corner(Corner::TopRight)
    }

    pub fn bottom_right(&self) -> Point2<f64> {
        self.corner(Corner::BottomRight)
    }

    pub fn bottom_left(&self) -> Point2<f64> {
        self.corner(Corner::BottomLeft)
    }
}

/// Approximate a closed contour with fewer vertices.
///
/// The ring is split at the vertex farthest from its first point and each half
/// is simplified as an open chain, so both anchors survive. `epsilon` must be
/// positive.
pub fn approximate_ring(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let mut far = 0;
    let mut far_dist = 0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = (p.x - first.x).pow(2) + (p.y - first.y).pow(2);
        if d > far_dist {
            far_dist = d;
            far = i;
        }
    }
    if far == 0 {
        return vec![first];
    }

    let mut closing: Vec<Point<i32>> = points[far..].to_vec();
    closing.push(first);

    // Each half drops its trailing anchor, which the other half starts with
    let mut result = approximate_polygon_dp(&points[..=far], epsilon, true);
    result.extend(approximate_polygon_dp(&closing, epsilon, true));
    result
}

/// True when every turn of the closed polygon goes the same way
pub fn is_convex(points: &[Point<i32>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut sign = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64
            - (b.y - a.y) as i64 * (c.x - b.x) as i64;

        if cross != 0 {
            if sign != 0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }

    sign != 0
}

/// Reduce a contour to a convex quadrilateral, or reject it.
///
/// The simplification tolerance scales with the contour perimeter. The area
/// test is strict: a quad of exactly `area_threshold` is rejected.
pub fn filter(contour: &Contour, config: &DetectorConfig) -> Option<CandidateQuad> {
    let epsilon = config.epsilon_factor * arc_length(contour.points(), true);
    // Also covers contours of coincident points, which have no length
    if epsilon.is_nan() || epsilon <= 0.0 {
        return None;
    }
    let approx = approximate_ring(contour.points(), epsilon);

    let points: [Point<i32>; 4] = approx.try_into().ok()?;
    if !is_convex(&points) {
        return None;
    }
    if contour_area(&points) <= config.area_threshold {
        return None;
    }

    Some(CandidateQuad { points })
}

/// Pick the vertex minimizing `key`, comparing floats totally
fn select(points: &[Point2<f64>; 4], key: impl Fn(&Point2<f64>) -> (f64, f64)) -> Point2<f64> {
    let mut best = points[0];
    for p in &points[1..] {
        let (k, b) = (key(p), key(&best));
        let ordering = k.0.total_cmp(&b.0).then(k.1.total_cmp(&b.1));
        if ordering == Ordering::Less {
            best = *p;
        }
    }
    best
}

/// Assign corner roles from geometry alone.
///
/// The coordinate sum `x + y` separates top-left (smallest) from
/// bottom-right (largest); the difference `y - x` separates top-right
/// (smallest) from bottom-left (largest). Ties go to the vertex further
/// clockwise: top-left prefers smaller y, top-right larger x, bottom-right
/// larger y, bottom-left smaller x.
pub fn order_points(points: &[Point2<f64>; 4]) -> OrderedQuad {
    let top_left = select(points, |p| (p.x + p.y, p.y));
    let top_right = select(points, |p| (p.y - p.x, -p.x));
    let bottom_right = select(points, |p| (-(p.x + p.y), -p.y));
    let bottom_left = select(points, |p| (-(p.y - p.x), p.x));

    OrderedQuad::new(top_left, top_right, bottom_right, bottom_left)
}

/// Assign corner roles to a candidate's vertices
pub fn order(quad: &CandidateQuad) -> OrderedQuad {
    let points = quad.points.map(|p| Point2::new(p.x as f64, p.y as f64));
    order_points(&points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn contour(coords: &[(i32, i32)]) -> Contour {
        Contour::new(pts(coords)).unwrap()
    }

    fn candidate(coords: [(i32, i32); 4]) -> CandidateQuad {
        CandidateQuad {
            points: coords.map(|(x, y)| Point::new(x, y)),
        }
    }

    fn config_with_area(area_threshold: f64) -> DetectorConfig {
        DetectorConfig {
            area_threshold,
            ..DetectorConfig::default()
        }
    }

    /// Every boundary pixel of an axis-aligned square, clockwise from the origin
    fn traced_square(side: i32) -> Vec<Point<i32>> {
        let mut ring = Vec::new();
        ring.extend((0..side).map(|x| Point::new(x, 0)));
        ring.extend((0..side).map(|y| Point::new(side, y)));
        ring.extend((1..=side).rev().map(|x| Point::new(x, side)));
        ring.extend((1..=side).rev().map(|y| Point::new(0, y)));
        ring
    }

    #[test]
    fn test_approximate_drops_near_collinear_points() {
        let noisy = pts(&[
            (0, 0),
            (50, 1),
            (100, 0),
            (101, 50),
            (100, 100),
            (50, 99),
            (0, 100),
            (1, 50),
        ]);
        let approx = approximate_ring(&noisy, 8.0);
        assert_eq!(approx, pts(&[(0, 0), (100, 0), (100, 100), (0, 100)]));
    }

    #[test]
    fn test_approximate_keeps_every_corner_of_a_bare_ring() {
        // The last vertex is a real corner and must not be dropped as a closing duplicate
        let square = pts(&[(0, 0), (100, 0), (100, 100), (0, 100)]);
        assert_eq!(approximate_ring(&square, 8.0), square);

        let quad = pts(&[(12, 152), (60, 20), (200, 71), (152, 203)]);
        assert_eq!(approximate_ring(&quad, 8.0).len(), 4);
    }

    #[test]
    fn test_traced_square_reduces_to_its_corners() {
        let traced = Contour::new(traced_square(40)).unwrap();
        assert_eq!(arc_length(traced.points(), true), 160.0);

        let quad = filter(&traced, &config_with_area(0.0)).unwrap();
        assert_eq!(
            quad.points(),
            &[
                Point::new(0, 0),
                Point::new(40, 0),
                Point::new(40, 40),
                Point::new(0, 40),
            ]
        );
        assert_eq!(quad.area(), 1600.0);
    }

    #[test]
    fn test_zero_length_contour_is_rejected() {
        let collapsed = contour(&[(7, 7), (7, 7), (7, 7)]);
        assert!(filter(&collapsed, &config_with_area(0.0)).is_none());
    }

    #[test]
    fn test_convexity() {
        assert!(is_convex(&pts(&[(0, 0), (10, 0), (10, 10), (0, 10)])));
        assert!(is_convex(&pts(&[(0, 10), (10, 10), (10, 0), (0, 0)])));
        assert!(!is_convex(&pts(&[(0, 0), (200, 100), (0, 200), (60, 100)])));
        assert!(!is_convex(&pts(&[(0, 0), (5, 0), (10, 0), (15, 0)])));
    }

    #[test]
    fn test_area_threshold_is_strict() {
        let square = contour(&[(0, 0), (100, 0), (100, 100), (0, 100)]);
        assert!(filter(&square, &config_with_area(10_000.0)).is_none());

        let accepted = filter(&square, &config_with_area(10_000.0 - 1e-6)).unwrap();
        assert_eq!(accepted.area(), 10_000.0);
    }

    #[test]
    fn test_reflex_quad_rejected() {
        let dart = contour(&[(0, 0), (200, 100), (0, 200), (60, 100)]);
        assert_eq!(approximate_ring(dart.points(), 13.0).len(), 4);
        assert!(filter(&dart, &config_with_area(0.0)).is_none());
    }

    #[test]
    fn test_non_quadrilaterals_rejected() {
        let triangle = contour(&[(0, 0), (200, 0), (100, 150)]);
        assert!(filter(&triangle, &config_with_area(0.0)).is_none());

        let pentagon = contour(&[(100, 0), (200, 70), (160, 190), (40, 190), (0, 70)]);
        assert!(filter(&pentagon, &config_with_area(0.0)).is_none());
    }

    #[test]
    fn test_order_axis_aligned_square() {
        let quad = candidate([(110, 110), (10, 10), (10, 110), (110, 10)]);
        let ordered = order(&quad);
        assert_eq!(ordered.top_left(), Point2::new(10.0, 10.0));
        assert_eq!(ordered.top_right(), Point2::new(110.0, 10.0));
        assert_eq!(ordered.bottom_right(), Point2::new(110.0, 110.0));
        assert_eq!(ordered.bottom_left(), Point2::new(10.0, 110.0));
    }

    #[test]
    fn test_order_ignores_input_order() {
        // Tilted card, roughly 20 degrees
        let ring = [(60, 20), (200, 71), (152, 203), (12, 152)];
        let expected = order(&candidate(ring));

        for start in 0..4 {
            let mut rotated = ring;
            rotated.rotate_left(start);
            assert_eq!(order(&candidate(rotated)), expected);

            let mut reflected = rotated;
            reflected.reverse();
            assert_eq!(order(&candidate(reflected)), expected);
        }

        assert_eq!(expected.top_left(), Point2::new(60.0, 20.0));
        assert_eq!(expected.top_right(), Point2::new(200.0, 71.0));
        assert_eq!(expected.bottom_right(), Point2::new(152.0, 203.0));
        assert_eq!(expected.bottom_left(), Point2::new(12.0, 152.0));
    }

    #[test]
    fn test_diamond_ties_go_clockwise() {
        let diamond = [(50, 0), (100, 50), (50, 100), (0, 50)];
        for start in 0..4 {
            let mut rotated = diamond;
            rotated.rotate_left(start);
            let ordered = order(&candidate(rotated));
            assert_eq!(ordered.top_left(), Point2::new(50.0, 0.0));
            assert_eq!(ordered.top_right(), Point2::new(100.0, 50.0));
            assert_eq!(ordered.bottom_right(), Point2::new(50.0, 100.0));
            assert_eq!(ordered.bottom_left(), Point2::new(0.0, 50.0));
        }
    }

    #[test]
    fn test_corner_roles_index_output_order() {
        let ordered = order(&candidate([(0, 0), (30, 0), (30, 40), (0, 40)]));
        for (i, role) in Corner::ALL.iter().enumerate() {
            assert_eq!(ordered.corners()[i], ordered.corner(*role));
        }
    }
}
