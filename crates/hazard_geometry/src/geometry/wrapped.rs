use std::f64::consts::TAU;

use geo::{AffineOps, AffineTransform, BoundingRect, Centroid, CoordsIter, Rotate, Validation};
use geo_types::{Geometry, LineString, Point, Rect};

use super::{AdvancedGeometry, AdvancedShape, Rotatable, Scaleable};
use crate::error::GeometryError;

/// A plain geometry plus the rotation it has been given.
///
/// The cached center is the center of the bounding box aligned with the
/// shape's rotation, which is what rotation and scaling pivot around.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedGeometry {
    geometry: Geometry<f64>,
    rotation: f64,
    center: Point<f64>,
}

impl WrappedGeometry {
    /// Wrap `geometry`, which has already been rotated by `rotation` radians.
    ///
    /// `Line`, `Rect` and `Triangle` are stored as their `LineString` /
    /// `Polygon` equivalents. Empty geometries are rejected.
    pub fn new(geometry: Geometry<f64>, rotation: f64) -> Result<Self, GeometryError> {
        if !rotation.is_finite() {
            return Err(GeometryError::invalid(format!("rotation must be finite, got {rotation}")));
        }
        let geometry = normalize_kind(geometry);
        let anchor = geometry
            .coords_iter()
            .next()
            .ok_or_else(|| GeometryError::invalid("cannot wrap an empty geometry"))?;
        let rotation = normalize_radians(rotation);
        let center = rotated_center(&geometry, rotation, anchor.into())
            .ok_or_else(|| GeometryError::invalid("geometry has no bounding box"))?;
        Ok(Self { geometry, rotation, center })
    }

    pub fn unrotated(geometry: Geometry<f64>) -> Result<Self, GeometryError> {
        Self::new(geometry, 0.0)
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Rotation in radians, in `[0, 2π)`.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn into_geometry(self) -> Geometry<f64> {
        self.geometry
    }
}

impl AdvancedShape for WrappedGeometry {
    fn center_point(&self) -> Point<f64> {
        self.center
    }

    fn is_point_like(&self) -> bool {
        any_part(&self.geometry, &|part| {
            matches!(part, Geometry::Point(_) | Geometry::MultiPoint(_))
        })
    }

    fn is_line_like(&self) -> bool {
        any_part(&self.geometry, &|part| {
            matches!(
                part,
                Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_)
            )
        })
    }

    fn is_area_like(&self) -> bool {
        any_part(&self.geometry, &|part| {
            matches!(
                part,
                Geometry::Polygon(_)
                    | Geometry::MultiPolygon(_)
                    | Geometry::Rect(_)
                    | Geometry::Triangle(_)
            )
        })
    }

    fn is_potentially_curved(&self) -> bool {
        false
    }

    fn validity_problem(&self) -> Option<String> {
        self.geometry.check_validation().err().map(|problem| problem.to_string())
    }

    /// There are no curves to flatten, so the base geometry comes back as is.
    fn as_flattened_geometry(&self, _flatness: f64, _limit: u32) -> Geometry<f64> {
        self.geometry.clone()
    }

    fn approximate_centroid(&self, _flatness: f64, _limit: u32) -> Point<f64> {
        self.geometry.centroid().unwrap_or(self.center)
    }

    fn envelope(&self) -> Rect<f64> {
        self.geometry
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(self.center.0, self.center.0))
    }
}

impl Rotatable for WrappedGeometry {
    fn rotated_copy(&self, delta_radians: f64) -> Result<AdvancedGeometry, GeometryError> {
        if !delta_radians.is_finite() {
            return Err(GeometryError::invalid(format!(
                "rotation delta must be finite, got {delta_radians}"
            )));
        }
        if delta_radians == 0.0 {
            return Ok(AdvancedGeometry::Wrapped(self.clone()));
        }
        let geometry = self
            .geometry
            .rotate_around_point(delta_radians.to_degrees(), self.center);
        Self::new(geometry, self.rotation + delta_radians).map(AdvancedGeometry::Wrapped)
    }
}

impl Scaleable for WrappedGeometry {
    fn scaled_copy(
        &self,
        horizontal_multiplier: f64,
        vertical_multiplier: f64,
    ) -> Result<AdvancedGeometry, GeometryError> {
        check_multiplier("horizontal", horizontal_multiplier)?;
        check_multiplier("vertical", vertical_multiplier)?;

        let center = self.center.0;
        let degrees = self.rotation.to_degrees();
        let transform = AffineTransform::rotate(-degrees, center)
            .scaled(horizontal_multiplier, vertical_multiplier, center)
            .rotated(degrees, center);

        let geometry = self.geometry.affine_transform(&transform);
        Self::new(geometry, self.rotation).map(AdvancedGeometry::Wrapped)
    }
}

pub(crate) fn check_multiplier(axis: &str, multiplier: f64) -> Result<(), GeometryError> {
    if multiplier == 0.0 || !multiplier.is_finite() {
        return Err(GeometryError::invalid(format!(
            "{axis} scale multiplier must be non-zero and finite, got {multiplier}"
        )));
    }
    Ok(())
}

fn normalize_radians(radians: f64) -> f64 {
    let normalized = radians.rem_euclid(TAU);
    // rem_euclid can round up to TAU itself for tiny negative inputs.
    if normalized >= TAU { 0.0 } else { normalized }
}

/// Un-rotate about `anchor`, take the bounding-box center, rotate it back.
fn rotated_center(geometry: &Geometry<f64>, rotation: f64, anchor: Point<f64>) -> Option<Point<f64>> {
    if rotation == 0.0 {
        return geometry.bounding_rect().map(|rect| rect.center().into());
    }
    let degrees = rotation.to_degrees();
    let unrotated = geometry.rotate_around_point(-degrees, anchor);
    let center: Point<f64> = unrotated.bounding_rect()?.center().into();
    Some(center.rotate_around_point(degrees, anchor))
}

fn normalize_kind(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Line(line) => Geometry::LineString(LineString::from(vec![line.start, line.end])),
        Geometry::Rect(rect) => Geometry::Polygon(rect.to_polygon()),
        Geometry::Triangle(triangle) => Geometry::Polygon(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => Geometry::GeometryCollection(
            collection.into_iter().map(normalize_kind).collect(),
        ),
        other => other,
    }
}

fn any_part(geometry: &Geometry<f64>, predicate: &dyn Fn(&Geometry<f64>) -> bool) -> bool {
    match geometry {
        Geometry::GeometryCollection(collection) => {
            collection.iter().any(|part| any_part(part, predicate))
        }
        other => predicate(other),
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use geo::Area;
    use geo_types::{Polygon, polygon};

    use super::*;
    use crate::geometry::test_shapes::square;

    fn rectangle(width: f64, height: f64) -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: width, y: 0.0),
            (x: width, y: height),
            (x: 0.0, y: height),
            (x: 0.0, y: 0.0),
        ]
    }

    fn assert_point_close(actual: Point<f64>, expected: Point<f64>) {
        assert!(
            (actual.x() - expected.x()).abs() < 1e-9 && (actual.y() - expected.y()).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn unwrap_wrapped(geometry: AdvancedGeometry) -> WrappedGeometry {
        match geometry {
            AdvancedGeometry::Wrapped(wrapped) => wrapped,
            other => panic!("expected wrapped geometry, got {}", other.kind()),
        }
    }

    #[test]
    fn test_rotation_is_normalized() {
        let shape = Geometry::Polygon(square(0.0, 0.0, 1.0));
        let wrapped = WrappedGeometry::new(shape.clone(), -FRAC_PI_2).expect("Should wrap");
        assert!((wrapped.rotation() - 3.0 * FRAC_PI_2).abs() < 1e-12);

        let wrapped = WrappedGeometry::new(shape, 5.0 * PI).expect("Should wrap");
        assert!((wrapped.rotation() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_center_of_rotated_rectangle_is_its_true_center() {
        let original = Geometry::Polygon(rectangle(4.0, 2.0));
        let rotated = original.rotate_around_point(30.0, Point::new(2.0, 1.0));
        let wrapped = WrappedGeometry::new(rotated, 30f64.to_radians()).expect("Should wrap");
        assert_point_close(wrapped.center_point(), Point::new(2.0, 1.0));
    }

    #[test]
    fn test_center_differs_from_naive_bounding_box_for_asymmetric_shape() {
        let triangle: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let pivot = Point::new(0.0, 0.0);
        let rotated = Geometry::Polygon(triangle).rotate_around_point(45.0, pivot);
        let wrapped = WrappedGeometry::new(rotated.clone(), 45f64.to_radians()).expect("Should wrap");

        let expected = Point::new(2.0, 1.0).rotate_around_point(45.0, pivot);
        assert_point_close(wrapped.center_point(), expected);

        let naive: Point<f64> = rotated.bounding_rect().expect("Has bounds").center().into();
        assert!((naive.x() - expected.x()).abs() > 1e-3 || (naive.y() - expected.y()).abs() > 1e-3);
    }

    #[test]
    fn test_rotation_inverse_restores_center_and_shape() {
        let wrapped = WrappedGeometry::new(Geometry::Polygon(rectangle(6.0, 2.0)), 0.3)
            .expect("Should wrap");
        let there = unwrap_wrapped(wrapped.rotated_copy(1.1).expect("Should rotate"));
        let back = unwrap_wrapped(there.rotated_copy(-1.1).expect("Should rotate"));

        assert_point_close(back.center_point(), wrapped.center_point());
        assert!((back.rotation() - wrapped.rotation()).abs() < 1e-12);

        let original: Vec<_> = wrapped.geometry().coords_iter().collect();
        let restored: Vec<_> = back.geometry().coords_iter().collect();
        assert_eq!(original.len(), restored.len());
        for (a, b) in original.iter().zip(&restored) {
            assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_scale_happens_along_rotated_axes() {
        let rectangle = Geometry::Polygon(rectangle(4.0, 2.0));
        let rotated = rectangle.rotate_around_point(90.0, Point::new(2.0, 1.0));
        let wrapped = WrappedGeometry::new(rotated, FRAC_PI_2).expect("Should wrap");

        let scaled = unwrap_wrapped(wrapped.scaled_copy(2.0, 1.0).expect("Should scale"));
        let bounds = scaled.envelope();
        // The shape's own horizontal axis points north after a 90° rotation.
        assert!((bounds.width() - 2.0).abs() < 1e-9);
        assert!((bounds.height() - 8.0).abs() < 1e-9);
        assert_point_close(scaled.center_point(), wrapped.center_point());
        assert!((scaled.geometry().unsigned_area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_at_oblique_rotation_matches_scaled_then_rotated() {
        let pivot = Point::new(2.0, 1.0);
        let rotated = Geometry::Polygon(rectangle(4.0, 2.0)).rotate_around_point(30.0, pivot);
        let wrapped = WrappedGeometry::new(rotated, 30f64.to_radians()).expect("Should wrap");
        let scaled = unwrap_wrapped(wrapped.scaled_copy(0.5, 3.0).expect("Should scale"));

        let expected = Geometry::Polygon(polygon![
            (x: 1.0, y: -2.0),
            (x: 3.0, y: -2.0),
            (x: 3.0, y: 4.0),
            (x: 1.0, y: 4.0),
        ])
        .rotate_around_point(30.0, pivot);
        let actual: Vec<_> = scaled.geometry().coords_iter().collect();
        let expected: Vec<_> = expected.coords_iter().collect();
        assert_eq!(actual.len(), expected.len());
        for (a, b) in actual.iter().zip(&expected) {
            assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
        }
        assert_point_close(scaled.center_point(), pivot);
    }

    #[test]
    fn test_negative_scale_flips_about_center() {
        let shape = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]);
        let wrapped = WrappedGeometry::unrotated(shape).expect("Should wrap");
        let flipped = unwrap_wrapped(wrapped.scaled_copy(-1.0, 1.0).expect("Should flip"));
        let first = flipped.geometry().coords_iter().next().expect("Has coords");
        assert!((first.x - 2.0).abs() < 1e-12);
        assert_point_close(flipped.center_point(), Point::new(1.0, 1.0));
        assert!(flipped.is_valid());
    }

    #[test]
    fn test_empty_geometry_is_rejected() {
        let empty = Geometry::LineString(LineString::<f64>::new(vec![]));
        assert!(matches!(WrappedGeometry::unrotated(empty), Err(GeometryError::InvalidInput(_))));
        let shape = Geometry::Polygon(square(0.0, 0.0, 1.0));
        assert!(WrappedGeometry::new(shape, f64::NAN).is_err());
    }

    #[test]
    fn test_rect_is_stored_as_polygon() {
        let rect = Geometry::Rect(Rect::new((0.0, 0.0), (2.0, 1.0)));
        let wrapped = WrappedGeometry::unrotated(rect).expect("Should wrap");
        assert!(matches!(wrapped.geometry(), Geometry::Polygon(_)));
        assert!(wrapped.is_area_like());
    }

    #[test]
    fn test_self_intersecting_polygon_reports_problem() {
        let bowtie = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]);
        let wrapped = WrappedGeometry::unrotated(bowtie).expect("Should wrap");
        assert!(!wrapped.is_valid());
        assert!(wrapped.validity_problem().is_some());
    }
}
