use geo::{BooleanOps, Buffer};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use tracing::{debug, warn};

use super::{cross, open_ring, polygon_from_ring, ring_is_valid};
use crate::config::ReductionConfig;

/// Reduce every polygon in `geometry` towards `config.max_vertices`
/// vertices.
///
/// Holes are filled first by unioning each polygon with its holes buffered
/// outward by `config.hole_buffer_distance`, for at most
/// `config.hole_fill_passes` rounds; holes still left after that are dropped.
/// Vertices are then removed smallest-triangle-first, skipping any removal
/// that would make the polygon invalid. Non-polygonal geometries come back
/// unchanged.
pub fn simplify_to_count(geometry: &Geometry<f64>, config: &ReductionConfig) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(polygon) => {
            let mut simplified = simplify_members(MultiPolygon::new(vec![polygon.clone()]), config);
            if simplified.0.len() == 1 {
                Geometry::Polygon(simplified.0.remove(0))
            } else {
                Geometry::MultiPolygon(simplified)
            }
        }
        Geometry::MultiPolygon(members) => Geometry::MultiPolygon(simplify_members(members.clone(), config)),
        other => other.clone(),
    }
}

fn simplify_members(members: MultiPolygon<f64>, config: &ReductionConfig) -> MultiPolygon<f64> {
    fill_holes(members, config)
        .into_iter()
        .map(|polygon| remove_least_significant(&polygon, config.max_vertices))
        .collect()
}

pub(crate) fn fill_holes(members: MultiPolygon<f64>, config: &ReductionConfig) -> MultiPolygon<f64> {
    let mut current = members;
    for pass in 1..=config.hole_fill_passes {
        let holes: Vec<Polygon<f64>> = current
            .iter()
            .flat_map(|polygon| polygon.interiors().iter().cloned())
            .map(|ring| Polygon::new(ring, vec![]))
            .collect();
        if holes.is_empty() {
            break;
        }
        debug!(pass, holes = holes.len(), "filling holes");
        for hole in holes {
            current = current.union(&hole.buffer(config.hole_buffer_distance));
        }
    }

    if current.iter().any(|polygon| !polygon.interiors().is_empty()) {
        warn!("holes survived filling, dropping them");
        current = current
            .into_iter()
            .map(|polygon| Polygon::new(polygon.exterior().clone(), vec![]))
            .collect();
    }
    current
}

fn remove_least_significant(polygon: &Polygon<f64>, target: usize) -> Polygon<f64> {
    let interiors: Vec<LineString<f64>> = polygon.interiors().to_vec();
    let mut ring = open_ring(polygon.exterior());
    let target = target.max(3);

    while ring.len() > target {
        let Some(index) = removable_vertex(&ring, &interiors) else {
            warn!(vertices = ring.len(), target, "no vertex can be removed without invalidating the polygon");
            break;
        };
        ring.remove(index);
    }
    polygon_from_ring(&ring, &interiors)
}

/// The vertex spanning the smallest triangle with its neighbours whose
/// removal keeps the ring valid.
fn removable_vertex(ring: &[Coord<f64>], interiors: &[LineString<f64>]) -> Option<usize> {
    let n = ring.len();
    let mut by_area: Vec<(f64, usize)> = (0..n)
        .map(|index| {
            let area = cross(ring[(index + n - 1) % n], ring[index], ring[(index + 1) % n]).abs() / 2.0;
            (area, index)
        })
        .collect();
    by_area.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    by_area.into_iter().map(|(_, index)| index).find(|&index| {
        let mut remaining = ring.to_vec();
        remaining.remove(index);
        ring_is_valid(&remaining, interiors)
    })
}
