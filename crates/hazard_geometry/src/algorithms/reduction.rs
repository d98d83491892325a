use geo::Centroid;
use geo_types::{Coord, LineString, Polygon};
use tracing::{debug, warn};

use super::repair::repair_polygon;
use super::{cross, line_deviation, open_ring, planar_distance, polygon_from_ring, ring_is_valid, vertex_count};
use crate::config::ReductionConfig;
use crate::error::GeometryError;

/// Deviations at or below this share of the extent count as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Result of [`PolygonReducer::reduce`]. `valid` is `false` when repair could
/// not produce a valid polygon; the polygon is still the best one found.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionOutcome {
    pub polygon: Polygon<f64>,
    pub valid: bool,
}

impl ReductionOutcome {
    pub fn vertex_count(&self) -> usize {
        vertex_count(&self.polygon)
    }
}

/// Reduces a polygon's exterior ring to at most `max_vertices` vertices while
/// keeping its overall shape, then repairs any self-intersection introduced.
///
/// Interior rings are carried through unchanged. The reducer holds only its
/// configuration and can be shared freely between threads.
///
/// ```no_run
/// use geo_types::polygon;
/// use hazard_geometry::algorithms::PolygonReducer;
///
/// let reducer = PolygonReducer::with_max_vertices(20)?;
/// let outcome = reducer.reduce(&polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0)]);
/// assert!(outcome.valid);
/// # Ok::<(), hazard_geometry::GeometryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PolygonReducer {
    config: ReductionConfig,
}

struct Candidate {
    index: usize,
    deviation: f64,
    collinear: bool,
}

impl PolygonReducer {
    pub fn new(config: ReductionConfig) -> Result<Self, GeometryError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_max_vertices(max_vertices: usize) -> Result<Self, GeometryError> {
        Self::new(ReductionConfig::default().with_max_vertices(max_vertices))
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    pub fn reduce(&self, polygon: &Polygon<f64>) -> ReductionOutcome {
        let interiors = polygon.interiors();
        let mut ring = open_ring(polygon.exterior());
        if ring.len() < 3 {
            warn!(vertices = ring.len(), "polygon has too few vertices to reduce");
            return ReductionOutcome { polygon: polygon.clone(), valid: false };
        }

        let target = self.config.max_vertices;
        for round in 1..=self.config.max_passes {
            let before = ring.len();
            if ring.len() > target {
                ring = self.select_significant(&ring);
            }
            if let Some(index) = self.find_kink(&ring) {
                ring.remove(index);
            }
            debug!(round, before, after = ring.len(), target, "reduction round");
            if ring.len() == before || ring.len() <= target {
                break;
            }
        }

        self.finish(&ring, interiors)
    }

    /// Run only the validation and repair stage.
    pub fn repair(&self, polygon: &Polygon<f64>) -> ReductionOutcome {
        let (polygon, valid) = repair_polygon(polygon, &self.config);
        ReductionOutcome { polygon, valid }
    }

    fn finish(&self, ring: &[Coord<f64>], interiors: &[LineString<f64>]) -> ReductionOutcome {
        self.repair(&polygon_from_ring(ring, interiors))
    }

    /// Greedy selection of the points that carry the shape, seeded with the
    /// two points spanning the largest extent and the point farthest off the
    /// line between them. The result never exceeds `max_vertices`.
    fn select_significant(&self, ring: &[Coord<f64>]) -> Vec<Coord<f64>> {
        let center = polygon_from_ring(ring, &[])
            .centroid()
            .map(|point| point.0)
            .unwrap_or_else(|| vertex_mean(ring));
        let first = farthest_from(ring, center);
        let second = farthest_from(ring, ring[first]);
        let extent = planar_distance(ring[first], ring[second]);
        if first == second || extent == 0.0 {
            warn!(vertices = ring.len(), "ring has no extent, keeping its first vertices");
            return ring[..self.config.max_vertices.min(ring.len())].to_vec();
        }

        let mut kept = vec![first.min(second), first.max(second)];
        if let Some(third) = deviation_candidates(ring, &kept, extent).first() {
            let position = kept.partition_point(|&index| index < third.index);
            kept.insert(position, third.index);
        }

        let ratio = self.config.smooth_cutoff_ratio;
        while kept.len() < self.config.max_vertices {
            let candidates = deviation_candidates(ring, &kept, extent);
            let largest = candidates.iter().map(|candidate| candidate.deviation).fold(0.0, f64::max);
            if candidates.is_empty() || largest * ratio < extent {
                debug!(kept = kept.len(), "remaining deviation below smoothness cutoff");
                break;
            }

            let mut accepted = false;
            for candidate in candidates {
                if candidate.deviation * ratio < extent {
                    break;
                }
                let position = kept.partition_point(|&index| index < candidate.index);
                kept.insert(position, candidate.index);
                let coords: Vec<Coord<f64>> = kept.iter().map(|&index| ring[index]).collect();
                if ring_is_valid(&coords, &[]) {
                    accepted = true;
                    break;
                }
                kept.remove(position);
            }
            if !accepted {
                break;
            }
        }

        kept.into_iter().map(|index| ring[index]).collect()
    }

    /// Index of the smallest concave notch small enough to drop, if removing
    /// it leaves a valid ring.
    fn find_kink(&self, ring: &[Coord<f64>]) -> Option<usize> {
        let n = ring.len();
        if n <= 3 {
            return None;
        }
        let pivot = lowest_rightmost(ring);
        let orientation = cross(ring[(pivot + n - 1) % n], ring[pivot], ring[(pivot + 1) % n]);
        if orientation == 0.0 {
            return None;
        }

        let mut kinks: Vec<(f64, usize)> = (0..n)
            .filter_map(|index| {
                let a = ring[(index + n - 1) % n];
                let c = ring[(index + 1) % n];
                let turn = cross(a, ring[index], c);
                // Concave means turning against the ring's orientation.
                if turn * orientation >= 0.0 {
                    return None;
                }
                let area = turn.abs() / 2.0;
                let bound = self
                    .config
                    .kink_min_area
                    .max(self.config.kink_length_factor * planar_distance(a, c));
                (area <= bound).then_some((area, index))
            })
            .collect();
        kinks.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        kinks.into_iter().map(|(_, index)| index).find(|&index| {
            let mut remaining = ring.to_vec();
            remaining.remove(index);
            ring_is_valid(&remaining, &[])
        })
    }
}

/// Every unkept point with its deviation from the line between its kept
/// neighbours, best first: non-collinear before collinear, then by deviation.
fn deviation_candidates(ring: &[Coord<f64>], kept: &[usize], extent: f64) -> Vec<Candidate> {
    let n = ring.len();
    let mut candidates = Vec::new();
    for (position, &start) in kept.iter().enumerate() {
        let end = kept[(position + 1) % kept.len()];
        let mut index = (start + 1) % n;
        while index != end {
            let deviation = line_deviation(ring[index], ring[start], ring[end]);
            candidates.push(Candidate { index, deviation, collinear: deviation <= extent * COLLINEAR_TOLERANCE });
            index = (index + 1) % n;
        }
    }
    candidates.sort_by(|a, b| {
        a.collinear
            .cmp(&b.collinear)
            .then(b.deviation.total_cmp(&a.deviation))
            .then(a.index.cmp(&b.index))
    });
    candidates
}

fn farthest_from(ring: &[Coord<f64>], origin: Coord<f64>) -> usize {
    ring.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (index, coord)| {
            let distance = planar_distance(*coord, origin);
            if distance > best.1 { (index, distance) } else { best }
        })
        .0
}

fn lowest_rightmost(ring: &[Coord<f64>]) -> usize {
    ring.iter()
        .enumerate()
        .fold(0, |best, (index, coord)| {
            let current = ring[best];
            if coord.y < current.y || (coord.y == current.y && coord.x > current.x) { index } else { best }
        })
}

fn vertex_mean(ring: &[Coord<f64>]) -> Coord<f64> {
    let count = ring.len().max(1) as f64;
    let (x, y) = ring.iter().fold((0.0, 0.0), |(x, y), coord| (x + coord.x, y + coord.y));
    Coord { x: x / count, y: y / count }
}
