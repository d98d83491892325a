//! Polygon vertex reduction, self-intersection repair and count-driven
//! simplification.
//!
//! Rings are handled internally as open vertex lists (no closing coordinate);
//! the helpers here convert to and from `geo_types` rings.

pub mod reduction;
pub mod repair;
pub mod simplification;

use geo::Validation;
use geo_types::{Coord, LineString, Polygon};

pub use reduction::{PolygonReducer, ReductionOutcome};
pub use simplification::simplify_to_count;

/// Vertices of a ring without the closing duplicate.
pub(crate) fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

pub(crate) fn polygon_from_ring(ring: &[Coord<f64>], interiors: &[LineString<f64>]) -> Polygon<f64> {
    // Polygon::new closes the exterior.
    Polygon::new(LineString::from(ring.to_vec()), interiors.to_vec())
}

pub(crate) fn ring_is_valid(ring: &[Coord<f64>], interiors: &[LineString<f64>]) -> bool {
    ring.len() >= 3 && polygon_from_ring(ring, interiors).is_valid()
}

/// Number of vertices in a polygon's exterior, closing vertex excluded.
pub fn vertex_count(polygon: &Polygon<f64>) -> usize {
    open_ring(polygon.exterior()).len()
}

/// Z component of `(a - o) x (b - o)`.
pub(crate) fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub(crate) fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Distance from `point` to the infinite line through `a` and `b`.
pub(crate) fn line_deviation(point: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let length = planar_distance(a, b);
    if length == 0.0 {
        return planar_distance(point, a);
    }
    cross(a, b, point).abs() / length
}

#[cfg(test)]
mod tests {
    use geo_types::{LineString, coord};

    use super::*;

    #[test]
    fn test_open_ring_drops_closing_vertex() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(open_ring(&ring).len(), 3);
        assert_eq!(vertex_count(&Polygon::new(ring, vec![])), 3);
    }

    #[test]
    fn test_line_deviation() {
        let a = coord! { x: 0.0, y: 0.0 };
        let b = coord! { x: 4.0, y: 0.0 };
        assert_eq!(line_deviation(coord! { x: 2.0, y: 3.0 }, a, b), 3.0);
        assert_eq!(line_deviation(coord! { x: 9.0, y: -1.5 }, a, b), 1.5);
        assert_eq!(line_deviation(coord! { x: 3.0, y: 4.0 }, a, a), 5.0);
    }
}
