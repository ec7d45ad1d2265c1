use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::preprocess::BinaryMap;

/// Closed boundary of a connected foreground region.
///
/// Always holds at least three points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    /// Wrap a point sequence, refusing anything too short to enclose an area
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }
}

/// Drop every boundary pixel that continues in the same direction as its
/// predecessor, leaving only the vertices where the chain turns.
fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut kept = Vec::new();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];

        let incoming = (cur.x - prev.x, cur.y - prev.y);
        let outgoing = (next.x - cur.x, next.y - cur.y);
        if incoming != outgoing {
            kept.push(cur);
        }
    }

    kept
}

/// Trace the outermost boundaries in a binary map.
///
/// Holes and anything nested inside another border are skipped. Order follows
/// the raster scan of the tracer.
pub fn extract(binary: &BinaryMap) -> Vec<Contour> {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Contour::new(compress_chain(&c.points)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn fill(binary: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                binary.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_short_sequences_are_not_contours() {
        assert!(Contour::new(vec![Point::new(0, 0), Point::new(1, 1)]).is_none());
        let c = Contour::new(vec![Point::new(0, 0), Point::new(1, 0), Point::new(0, 1)]).unwrap();
        assert_eq!(c.points().len(), 3);
    }

    #[test]
    fn test_compress_straight_runs() {
        let mut square = Vec::new();
        for x in 0..4 {
            square.push(Point::new(x, 0));
        }
        for y in 0..4 {
            square.push(Point::new(4, y));
        }
        for x in (1..=4).rev() {
            square.push(Point::new(x, 4));
        }
        for y in (1..=4).rev() {
            square.push(Point::new(0, y));
        }

        let compressed = compress_chain(&square);
        assert_eq!(
            compressed,
            vec![
                Point::new(0, 0),
                Point::new(4, 0),
                Point::new(4, 4),
                Point::new(0, 4)
            ]
        );
    }

    #[test]
    fn test_empty_map_has_no_contours() {
        assert!(extract(&GrayImage::new(20, 20)).is_empty());
        assert!(extract(&GrayImage::new(0, 0)).is_empty());
    }

    #[test]
    fn test_filled_rectangle_reduces_to_corners() {
        let mut binary = GrayImage::new(40, 30);
        fill(&mut binary, 5, 4, 25, 20);

        let contours = extract(&binary);
        assert_eq!(contours.len(), 1);

        let mut corners = contours[0].points().to_vec();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![
                Point::new(5, 4),
                Point::new(25, 4),
                Point::new(5, 20),
                Point::new(25, 20)
            ]
        );
    }

    #[test]
    fn test_nested_regions_are_skipped() {
        let mut binary = GrayImage::new(60, 60);
        // Hollow frame with a solid block inside its hole
        fill(&mut binary, 5, 5, 54, 54);
        for y in 10..=49 {
            for x in 10..=49 {
                binary.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut binary, 20, 20, 39, 39);
        // Separate outer region
        fill(&mut binary, 56, 56, 58, 58);

        let contours = extract(&binary);
        assert_eq!(contours.len(), 2);
        assert!(contours
            .iter()
            .all(|c| c.points().iter().all(|p| p.x < 20 || p.x > 39 || p.y < 20 || p.y > 39)));
    }
}
