//! Advanced geometries: the closed set of shapes a hazard area can take.
//!
//! Every shape is an immutable value. Transforms such as
//! [`Rotatable::rotated_copy`] return a new [`AdvancedGeometry`] and leave the
//! receiver untouched.

pub mod collection;
pub mod ellipse;
pub mod factory;
pub mod wrapped;

use geo_types::{Geometry, GeometryCollection, Point, Rect};

use crate::error::GeometryError;

pub use collection::ShapeCollection;
pub use ellipse::Ellipse;
pub use factory::from_shape;
pub use wrapped::WrappedGeometry;

/// Capabilities shared by every advanced geometry.
pub trait AdvancedShape {
    /// Pivot for rotation and scaling.
    fn center_point(&self) -> Point<f64>;

    fn is_point_like(&self) -> bool;

    fn is_line_like(&self) -> bool;

    fn is_area_like(&self) -> bool;

    /// Whether flattening may approximate curves rather than copy vertices.
    fn is_potentially_curved(&self) -> bool;

    /// Human-readable reason the shape is invalid, or `None` when it is valid.
    fn validity_problem(&self) -> Option<String>;

    fn is_valid(&self) -> bool {
        self.validity_problem().is_none()
    }

    /// Straight-segment geometry for this shape. Curves use at most
    /// `2^limit` segments per curve, each within `flatness` of the curve.
    ///
    /// `limit` is clamped to `2..=20`, so a curve never has fewer than 4
    /// segments. [`crate::config::FlatteningParams::validate`] rejects limits
    /// outside that range up front.
    fn as_flattened_geometry(&self, flatness: f64, limit: u32) -> Geometry<f64>;

    fn approximate_centroid(&self, flatness: f64, limit: u32) -> Point<f64>;

    /// Bounding rectangle of the shape.
    fn envelope(&self) -> Rect<f64>;
}

/// Shapes that can produce a copy rotated about their center point.
pub trait Rotatable {
    fn rotated_copy(&self, delta_radians: f64) -> Result<AdvancedGeometry, GeometryError>;
}

/// Shapes that can produce a copy scaled about their center point.
///
/// Scaling happens along the shape's own (rotated) axes. A negative
/// multiplier flips the shape across the perpendicular axis; zero is rejected.
pub trait Scaleable {
    fn scaled_copy(
        &self,
        horizontal_multiplier: f64,
        vertical_multiplier: f64,
    ) -> Result<AdvancedGeometry, GeometryError>;
}

/// A hazard area shape.
///
/// Wire ordinals for each variant live in [`crate::codec::GeometryTypeTag`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdvancedGeometry {
    Collection(ShapeCollection),
    Ellipse(Ellipse),
    Wrapped(WrappedGeometry),
}

impl AdvancedGeometry {
    /// Independent deep copy.
    pub fn copy_of(&self) -> AdvancedGeometry {
        self.clone()
    }

    /// Build a collection, inlining the children of any nested collections.
    pub fn collection(members: Vec<AdvancedGeometry>) -> Result<Self, GeometryError> {
        ShapeCollection::new(members).map(Self::Collection)
    }

    pub fn as_rotatable(&self) -> Option<&dyn Rotatable> {
        match self {
            Self::Collection(_) => None,
            Self::Ellipse(ellipse) => Some(ellipse),
            Self::Wrapped(wrapped) => Some(wrapped),
        }
    }

    pub fn as_scaleable(&self) -> Option<&dyn Scaleable> {
        match self {
            Self::Collection(_) => None,
            Self::Ellipse(ellipse) => Some(ellipse),
            Self::Wrapped(wrapped) => Some(wrapped),
        }
    }

    /// Short name of the variant, used in log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Collection(_) => "collection",
            Self::Ellipse(_) => "ellipse",
            Self::Wrapped(_) => "wrapped",
        }
    }

    fn shape(&self) -> &dyn AdvancedShape {
        match self {
            Self::Collection(collection) => collection,
            Self::Ellipse(ellipse) => ellipse,
            Self::Wrapped(wrapped) => wrapped,
        }
    }
}

impl AdvancedShape for AdvancedGeometry {
    fn center_point(&self) -> Point<f64> {
        self.shape().center_point()
    }

    fn is_point_like(&self) -> bool {
        self.shape().is_point_like()
    }

    fn is_line_like(&self) -> bool {
        self.shape().is_line_like()
    }

    fn is_area_like(&self) -> bool {
        self.shape().is_area_like()
    }

    fn is_potentially_curved(&self) -> bool {
        self.shape().is_potentially_curved()
    }

    fn validity_problem(&self) -> Option<String> {
        self.shape().validity_problem()
    }

    fn as_flattened_geometry(&self, flatness: f64, limit: u32) -> Geometry<f64> {
        self.shape().as_flattened_geometry(flatness, limit)
    }

    fn approximate_centroid(&self, flatness: f64, limit: u32) -> Point<f64> {
        self.shape().approximate_centroid(flatness, limit)
    }

    fn envelope(&self) -> Rect<f64> {
        self.shape().envelope()
    }
}

impl From<WrappedGeometry> for AdvancedGeometry {
    fn from(wrapped: WrappedGeometry) -> Self {
        Self::Wrapped(wrapped)
    }
}

impl From<Ellipse> for AdvancedGeometry {
    fn from(ellipse: Ellipse) -> Self {
        Self::Ellipse(ellipse)
    }
}

impl From<ShapeCollection> for AdvancedGeometry {
    fn from(collection: ShapeCollection) -> Self {
        Self::Collection(collection)
    }
}

/// Present any geometry as a collection.
///
/// A single geometry becomes a one-element collection and nested collections
/// are inlined, so callers always see a flat list of parts.
pub fn as_collection(geometry: Geometry<f64>) -> GeometryCollection<f64> {
    let mut parts = Vec::new();
    push_parts(geometry, &mut parts);
    GeometryCollection::new_from(parts)
}

fn push_parts(geometry: Geometry<f64>, parts: &mut Vec<Geometry<f64>>) {
    match geometry {
        Geometry::GeometryCollection(collection) => {
            for part in collection {
                push_parts(part, parts);
            }
        }
        other => parts.push(other),
    }
}


#[cfg(test)]
mod tests {
    use geo_types::Point;

    use super::test_shapes::*;
    use super::*;

    #[test]
    fn test_capabilities_by_variant() {
        assert!(wrapped_square(0.0, 0.0, 1.0).as_rotatable().is_some());
        assert!(ellipse().as_scaleable().is_some());

        let collection = AdvancedGeometry::collection(vec![wrapped_square(0.0, 0.0, 1.0), ellipse()])
            .expect("Collection should build");
        assert!(collection.as_rotatable().is_none());
        assert!(collection.as_scaleable().is_none());
    }

    #[test]
    fn test_classification_predicates() {
        let square = wrapped_square(0.0, 0.0, 1.0);
        assert!(square.is_area_like());
        assert!(!square.is_line_like());
        assert!(!square.is_potentially_curved());

        let line = wrapped_line();
        assert!(line.is_line_like());
        assert!(!line.is_area_like());

        let collection = AdvancedGeometry::collection(vec![line, ellipse()])
            .expect("Collection should build");
        assert!(collection.is_line_like());
        assert!(collection.is_area_like());
        assert!(!collection.is_point_like());
        assert!(collection.is_potentially_curved());
    }

    #[test]
    fn test_copy_of_is_equal_and_independent() {
        let original = wrapped_square(0.0, 0.0, 2.0);
        let copy = original.copy_of();
        assert_eq!(original, copy);

        let rotated = copy
            .as_rotatable()
            .expect("Wrapped geometry rotates")
            .rotated_copy(0.5)
            .expect("Rotation should succeed");
        assert_ne!(original, rotated);
        assert_eq!(original, wrapped_square(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_rotated_copy_by_zero_equals_copy() {
        for shape in [wrapped_square(3.0, 4.0, 2.0), ellipse(), wrapped_line()] {
            let rotated = shape
                .as_rotatable()
                .expect("Shape rotates")
                .rotated_copy(0.0)
                .expect("Rotation should succeed");
            assert_eq!(rotated, shape.copy_of());
        }
    }

    #[test]
    fn test_scale_rejects_zero_multipliers() {
        for shape in [wrapped_square(0.0, 0.0, 1.0), ellipse()] {
            let scaleable = shape.as_scaleable().expect("Shape scales");
            assert!(matches!(scaleable.scaled_copy(0.0, 1.0), Err(GeometryError::InvalidInput(_))));
            assert!(matches!(scaleable.scaled_copy(1.0, 0.0), Err(GeometryError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_as_collection_wraps_single_geometry() {
        let single = as_collection(Geometry::Point(Point::new(1.0, 2.0)));
        assert_eq!(single.0.len(), 1);

        let nested = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::GeometryCollection(GeometryCollection::new_from(vec![
                Geometry::Point(Point::new(1.0, 1.0)),
                Geometry::Polygon(square(0.0, 0.0, 1.0)),
            ])),
        ]));
        let flat = as_collection(nested);
        assert_eq!(flat.0.len(), 3);
        assert!(flat.iter().all(|part| !matches!(part, Geometry::GeometryCollection(_))));
    }
}
