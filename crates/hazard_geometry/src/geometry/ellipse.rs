use std::f64::consts::TAU;

use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, Point, Polygon, Rect};

use super::wrapped::check_multiplier;
use super::{AdvancedGeometry, AdvancedShape, Rotatable, Scaleable};
use crate::config::{FlatteningParams, MAX_FLATTENING_LIMIT, MIN_FLATTENING_LIMIT};
use crate::error::GeometryError;
use crate::geodesy;
use crate::units::LinearUnit;

/// Fewest segments an ellipse is ever flattened into.
const MIN_SEGMENTS: usize = 4;

/// An ellipse on the earth's surface.
///
/// The center is longitude/latitude in degrees. `width` and `height` are the
/// full axis lengths in `unit`, before rotation. `rotation` is in degrees,
/// counterclockwise, normalized to `[0, 360)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    center_x: f64,
    center_y: f64,
    width: f64,
    height: f64,
    unit: LinearUnit,
    rotation: f64,
}

impl Ellipse {
    pub fn new(
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
        unit: LinearUnit,
        rotation: f64,
    ) -> Result<Self, GeometryError> {
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(GeometryError::invalid(format!(
                "ellipse center must be finite, got ({center_x}, {center_y})"
            )));
        }
        for (name, value) in [("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::invalid(format!(
                    "ellipse {name} must be positive and finite, got {value}"
                )));
            }
        }
        if !rotation.is_finite() {
            return Err(GeometryError::invalid(format!(
                "ellipse rotation must be finite, got {rotation}"
            )));
        }
        Ok(Self {
            center_x,
            center_y,
            width,
            height,
            unit,
            rotation: normalize_degrees(rotation),
        })
    }

    pub fn center_x(&self) -> f64 {
        self.center_x
    }

    pub fn center_y(&self) -> f64 {
        self.center_y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn unit(&self) -> LinearUnit {
        self.unit
    }

    /// Rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Point on the ellipse at parameter `t`, in the local tangent plane
    /// (east, north) measured in `unit` from the center.
    fn local_point(&self, t: f64) -> Coord<f64> {
        let (sin_rot, cos_rot) = self.rotation.to_radians().sin_cos();
        let x = 0.5 * self.width * t.cos();
        let y = 0.5 * self.height * t.sin();
        Coord {
            x: x * cos_rot - y * sin_rot,
            y: x * sin_rot + y * cos_rot,
        }
    }

    /// Number of segments needed to stay within `flatness`, doubling from
    /// [`MIN_SEGMENTS`] but never beyond `2^limit`. `limit` is clamped to
    /// `MIN_FLATTENING_LIMIT..=MAX_FLATTENING_LIMIT`.
    fn segment_count(&self, flatness: f64, limit: u32) -> usize {
        let max_segments = 1usize << limit.clamp(MIN_FLATTENING_LIMIT, MAX_FLATTENING_LIMIT);
        let mut segments = MIN_SEGMENTS;
        while segments < max_segments && self.max_deviation(segments) > flatness {
            segments *= 2;
        }
        segments
    }

    /// Largest distance between the curve and a chord, sampled at each
    /// segment's parameter midpoint.
    fn max_deviation(&self, segments: usize) -> f64 {
        let step = TAU / segments as f64;
        (0..segments)
            .map(|index| {
                let t0 = index as f64 * step;
                let start = self.local_point(t0);
                let end = self.local_point(t0 + step);
                let mid = self.local_point(t0 + 0.5 * step);
                distance_to_chord(mid, start, end)
            })
            .fold(0.0, f64::max)
    }

    fn flattened_polygon(&self, flatness: f64, limit: u32) -> Polygon<f64> {
        let segments = self.segment_count(flatness, limit);
        let step = TAU / segments as f64;
        let center = Point::new(self.center_x, self.center_y);
        let mut ring: Vec<Coord<f64>> = (0..segments)
            .map(|index| {
                let local = self.local_point(index as f64 * step);
                let magnitude = local.x.hypot(local.y);
                let direction = local.y.atan2(local.x);
                geodesy::offset(self.unit, center, magnitude, direction).0
            })
            .collect();
        ring.push(ring[0]);
        Polygon::new(LineString::new(ring), vec![])
    }
}

impl AdvancedShape for Ellipse {
    fn center_point(&self) -> Point<f64> {
        Point::new(self.center_x, self.center_y)
    }

    fn is_point_like(&self) -> bool {
        false
    }

    fn is_line_like(&self) -> bool {
        false
    }

    fn is_area_like(&self) -> bool {
        true
    }

    fn is_potentially_curved(&self) -> bool {
        true
    }

    fn validity_problem(&self) -> Option<String> {
        if !(-90.0..=90.0).contains(&self.center_y) {
            return Some(format!("ellipse center latitude {} is out of range", self.center_y));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Some(format!(
                "ellipse axes must be positive, got {} x {}",
                self.width, self.height
            ));
        }
        None
    }

    fn as_flattened_geometry(&self, flatness: f64, limit: u32) -> Geometry<f64> {
        Geometry::Polygon(self.flattened_polygon(flatness, limit))
    }

    /// The center, which is the centroid of the true curve.
    fn approximate_centroid(&self, _flatness: f64, _limit: u32) -> Point<f64> {
        self.center_point()
    }

    fn envelope(&self) -> Rect<f64> {
        let params = FlatteningParams::default();
        let center = Coord { x: self.center_x, y: self.center_y };
        self.flattened_polygon(params.flatness, params.limit)
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(center, center))
    }
}

impl Rotatable for Ellipse {
    fn rotated_copy(&self, delta_radians: f64) -> Result<AdvancedGeometry, GeometryError> {
        if delta_radians == 0.0 {
            return Ok(AdvancedGeometry::Ellipse(self.clone()));
        }
        Self::new(
            self.center_x,
            self.center_y,
            self.width,
            self.height,
            self.unit,
            self.rotation + delta_radians.to_degrees(),
        )
        .map(AdvancedGeometry::Ellipse)
    }
}

impl Scaleable for Ellipse {
    /// A flip leaves an ellipse unchanged, so only magnitudes matter.
    fn scaled_copy(
        &self,
        horizontal_multiplier: f64,
        vertical_multiplier: f64,
    ) -> Result<AdvancedGeometry, GeometryError> {
        check_multiplier("horizontal", horizontal_multiplier)?;
        check_multiplier("vertical", vertical_multiplier)?;
        Self::new(
            self.center_x,
            self.center_y,
            self.width * horizontal_multiplier.abs(),
            self.height * vertical_multiplier.abs(),
            self.unit,
            self.rotation,
        )
        .map(AdvancedGeometry::Ellipse)
    }
}

fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 { 0.0 } else { normalized }
}

fn distance_to_chord(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return (point.x - start.x).hypot(point.y - start.y);
    }
    ((point.x - start.x) * dy - (point.y - start.y) * dx).abs() / length
}
