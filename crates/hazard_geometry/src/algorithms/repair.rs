//! Self-intersection repair for reduced rings.
//!
//! Repair runs in three steps, each only as far as needed:
//!
//! 1. a zero-distance buffer, accepted when it yields exactly one valid polygon;
//! 2. an explicit untangling sweep that nudges one endpoint of each crossing
//!    edge pair onto a nearby grid point on the far side of the other edge;
//! 3. a clean-up that rounds coordinates, drops repeated vertices and merges
//!    nearly collinear edges.
//!
//! Nothing here returns an error; callers receive the best polygon found and
//! whether it validates.

use std::f64::consts::TAU;

use geo::{Buffer, Validation};
use geo::line_intersection::{LineIntersection, line_intersection};
use geo_types::{Coord, Line, LineString, Polygon, coord};
use tracing::{debug, warn};

use super::{cross, open_ring, planar_distance, polygon_from_ring, ring_is_valid};
use crate::config::ReductionConfig;

/// How many grid cells around a crossing are searched for a new vertex spot.
const SNAP_SEARCH_RADIUS: i32 = 3;

/// Repair `polygon` if it is invalid. Valid input is returned untouched.
pub fn repair_polygon(polygon: &Polygon<f64>, config: &ReductionConfig) -> (Polygon<f64>, bool) {
    if polygon.is_valid() {
        return (polygon.clone(), true);
    }

    let (mut ring, interiors, healed) = match heal_with_buffer(polygon) {
        Some(healed) => (open_ring(healed.exterior()), healed.interiors().to_vec(), true),
        None => {
            let interiors = polygon.interiors().to_vec();
            let mut ring = open_ring(polygon.exterior());
            if ring.len() < 3 {
                warn!(vertices = ring.len(), "ring too short to repair");
                return (polygon.clone(), false);
            }
            let untangled = untangle(&mut ring, &interiors, config);
            (ring, interiors, untangled)
        }
    };

    let cleaned = clean_ring(&ring, config);
    if ring_is_valid(&cleaned, &interiors) {
        return (polygon_from_ring(&cleaned, &interiors), true);
    }
    if healed {
        // Rounding broke a ring that was already valid.
        return (polygon_from_ring(&ring, &interiors), true);
    }

    warn!(vertices = cleaned.len(), "repair gave up, polygon remains invalid");
    if cleaned.len() >= 3 {
        ring = cleaned;
    }
    (polygon_from_ring(&ring, &interiors), false)
}

fn heal_with_buffer(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let healed = polygon.buffer(0.0);
    match healed.0.as_slice() {
        [single] if single.is_valid() && open_ring(single.exterior()).len() >= 3 => {
            debug!("zero-distance buffer repaired polygon");
            Some(single.clone())
        }
        parts => {
            debug!(parts = parts.len(), "zero-distance buffer did not yield one valid polygon");
            None
        }
    }
}

/// Walk non-adjacent edge pairs by increasing skip distance and move one
/// endpoint of every crossing. Returns `true` as soon as the ring validates.
pub(crate) fn untangle(ring: &mut Vec<Coord<f64>>, interiors: &[LineString<f64>], config: &ReductionConfig) -> bool {
    if ring_is_valid(ring, interiors) {
        return true;
    }
    let n = ring.len();
    if n < 4 {
        return false;
    }

    for sweep in 0..config.max_passes {
        let mut improved = false;
        for skip in 2..=n / 2 {
            for first in 0..n {
                let second = (first + skip) % n;
                // With an even ring the half-way pairs show up twice.
                if skip * 2 == n && second < first {
                    continue;
                }
                let Some(crossing) = edge_crossing(ring, first, second) else {
                    continue;
                };
                let Some(moved) = move_off_crossing(ring, first, second, crossing, config.repair_grid) else {
                    continue;
                };
                if ring_is_valid(&moved, interiors) {
                    debug!(sweep, skip, "untangled ring");
                    *ring = moved;
                    return true;
                }
                if crossing_count(&moved) < crossing_count(ring) {
                    *ring = moved;
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
    ring_is_valid(ring, interiors)
}

fn edge(ring: &[Coord<f64>], index: usize) -> Line<f64> {
    Line::new(ring[index], ring[(index + 1) % ring.len()])
}

fn edge_crossing(ring: &[Coord<f64>], first: usize, second: usize) -> Option<Coord<f64>> {
    match line_intersection(edge(ring, first), edge(ring, second))? {
        LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
        LineIntersection::Collinear { intersection } => Some(intersection.start),
    }
}

/// Number of crossing or touching non-adjacent edge pairs.
pub(crate) fn crossing_count(ring: &[Coord<f64>]) -> usize {
    let n = ring.len();
    if n < 4 {
        return 0;
    }
    (0..n)
        .flat_map(|first| (first + 2..n).map(move |second| (first, second)))
        .filter(|&(first, second)| !(first == 0 && second == n - 1))
        .filter(|&(first, second)| edge_crossing(ring, first, second).is_some())
        .count()
}

fn move_off_crossing(
    ring: &[Coord<f64>],
    first: usize,
    second: usize,
    crossing: Coord<f64>,
    grid: f64,
) -> Option<Vec<Coord<f64>>> {
    let n = ring.len();
    let endpoints = [
        (first, first),
        ((first + 1) % n, first),
        (second, second),
        ((second + 1) % n, second),
    ];
    let (vertex, own_edge) = endpoints.into_iter().min_by(|a, b| {
        planar_distance(ring[a.0], crossing).total_cmp(&planar_distance(ring[b.0], crossing))
    })?;
    let other_edge = if own_edge == first { second } else { first };
    let partner = if vertex == own_edge { (own_edge + 1) % n } else { own_edge };

    let other = edge(ring, other_edge);
    // The moved vertex belongs on its partner's side of the other edge.
    let partner_side = cross(other.start, other.end, ring[partner]);
    let vertex_side = cross(other.start, other.end, ring[vertex]);
    let side = if partner_side != 0.0 {
        partner_side.signum()
    } else if vertex_side != 0.0 {
        -vertex_side.signum()
    } else {
        return None;
    };
    let far_end = if planar_distance(ring[vertex], other.start) >= planar_distance(ring[vertex], other.end) {
        other.start
    } else {
        other.end
    };

    let target = snap_beside(crossing, other, side, ring[partner], far_end, grid)?;
    let mut moved = ring.to_vec();
    moved[vertex] = target;
    Some(moved)
}

/// Grid point near `crossing`, strictly on `side` of `line`, whose direction
/// from `anchor` deviates least from the direction towards `far_end`.
fn snap_beside(
    crossing: Coord<f64>,
    line: Line<f64>,
    side: f64,
    anchor: Coord<f64>,
    far_end: Coord<f64>,
    grid: f64,
) -> Option<Coord<f64>> {
    let base_x = (crossing.x / grid).round();
    let base_y = (crossing.y / grid).round();
    let heading = (far_end.y - anchor.y).atan2(far_end.x - anchor.x);
    let length = planar_distance(line.start, line.end).max(f64::MIN_POSITIVE);
    let clearance = grid * 0.01;

    for radius in 1..=SNAP_SEARCH_RADIUS {
        let best = (-radius..=radius)
            .flat_map(|dx| (-radius..=radius).map(move |dy| (dx, dy)))
            .map(|(dx, dy)| coord! { x: (base_x + dx as f64) * grid, y: (base_y + dy as f64) * grid })
            .filter(|candidate| *candidate != anchor)
            .filter(|candidate| side * cross(line.start, line.end, *candidate) / length > clearance)
            .min_by(|a, b| {
                angular_gap(anchor, *a, heading)
                    .total_cmp(&angular_gap(anchor, *b, heading))
                    .then(planar_distance(*a, crossing).total_cmp(&planar_distance(*b, crossing)))
            });
        if best.is_some() {
            return best;
        }
    }
    None
}

fn angular_gap(anchor: Coord<f64>, candidate: Coord<f64>, heading: f64) -> f64 {
    let angle = (candidate.y - anchor.y).atan2(candidate.x - anchor.x);
    let gap = (angle - heading).rem_euclid(TAU);
    gap.min(TAU - gap)
}

/// Round, drop repeated vertices and merge nearly collinear edges.
pub(crate) fn clean_ring(ring: &[Coord<f64>], config: &ReductionConfig) -> Vec<Coord<f64>> {
    let scale = 10f64.powi(config.round_decimals as i32);
    let mut cleaned: Vec<Coord<f64>> = ring
        .iter()
        .map(|c| coord! { x: (c.x * scale).round() / scale, y: (c.y * scale).round() / scale })
        .collect();
    drop_repeated(&mut cleaned);
    collapse_collinear(&mut cleaned, config.collinear_slope_epsilon);
    cleaned
}

/// Repeats are only dropped in bulk: at least two of them, with at least five
/// vertices left afterwards.
fn drop_repeated(ring: &mut Vec<Coord<f64>>) {
    let n = ring.len();
    let repeats = (0..n).filter(|&i| ring[i] == ring[(i + 1) % n]).count();
    if repeats < 2 || n - repeats < 5 {
        return;
    }
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
}

fn collapse_collinear(ring: &mut Vec<Coord<f64>>, epsilon: f64) {
    let mut index = 0;
    while ring.len() > 3 && index < ring.len() {
        let n = ring.len();
        let previous = ring[(index + n - 1) % n];
        let next = ring[(index + 1) % n];
        if same_slope(previous, ring[index], next, epsilon) {
            ring.remove(index);
            index = index.saturating_sub(1);
        } else {
            index += 1;
        }
    }
}

fn slope(a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    let dx = b.x - a.x;
    (dx != 0.0).then(|| (b.y - a.y) / dx)
}

fn same_slope(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, epsilon: f64) -> bool {
    if a == b || b == c {
        return false;
    }
    match (slope(a, b), slope(b, c)) {
        (None, None) => true,
        (Some(first), Some(second)) => (first - second).abs() < epsilon,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use geo_types::polygon;

    use super::*;

    fn bowtie() -> Vec<Coord<f64>> {
        vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 2.0, y: 0.0 },
            coord! { x: 0.0, y: 2.0 },
        ]
    }

    #[test]
    fn test_crossing_count() {
        assert_eq!(crossing_count(&bowtie()), 1);
        let square = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 2.0, y: 0.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 0.0, y: 2.0 },
        ];
        assert_eq!(crossing_count(&square), 0);
    }

    #[test]
    fn test_untangle_bowtie() {
        let mut ring = bowtie();
        let config = ReductionConfig::default();
        assert!(untangle(&mut ring, &[], &config));
        assert_eq!(ring.len(), 4);
        assert_eq!(crossing_count(&ring), 0);
        // The moved vertex sits on the grid.
        assert!(ring.iter().all(|c| ((c.x * 100.0).round() - c.x * 100.0).abs() < 1e-6));
    }

    #[test]
    fn test_repair_bowtie_reports_validity_honestly() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
        ];
        let (repaired, valid) = repair_polygon(&bowtie, &ReductionConfig::default());
        assert_eq!(valid, repaired.is_valid());
        assert!(valid);
    }

    #[test]
    fn test_valid_polygon_is_left_alone() {
        let square = polygon![
            (x: 0.123, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ];
        let (repaired, valid) = repair_polygon(&square, &ReductionConfig::default());
        assert!(valid);
        assert_eq!(repaired, square);
    }

    #[test]
    fn test_clean_ring_rounds_and_merges_collinear_edges() {
        let ring = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.004 },
            coord! { x: 2.0, y: 0.0 },
            coord! { x: 2.0, y: 1.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 0.123, y: 2.0 },
        ];
        let cleaned = clean_ring(&ring, &ReductionConfig::default());
        assert_eq!(
            cleaned,
            vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 2.0, y: 0.0 },
                coord! { x: 2.0, y: 2.0 },
                coord! { x: 0.12, y: 2.0 },
            ]
        );
    }

    #[test]
    fn test_repeated_vertices_only_dropped_in_bulk() {
        let base = [(0.0, 0.0), (1.0, 0.0), (2.0, 1.0), (2.0, 2.0), (1.0, 3.0), (0.0, 2.0)];
        let mut single: Vec<Coord<f64>> = base.iter().map(|&(x, y)| coord! { x: x, y: y }).collect();
        single.insert(1, single[0]);
        let mut once = single.clone();
        drop_repeated(&mut once);
        assert_eq!(once.len(), 7);

        let mut double = single.clone();
        double.push(double[6]);
        drop_repeated(&mut double);
        assert_eq!(double.len(), 6);
    }
}
