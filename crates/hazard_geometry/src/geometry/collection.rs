use geo::{BooleanOps, Centroid};
use geo_types::{Coord, Geometry, GeometryCollection, MultiPolygon, Point, Rect};

use super::{AdvancedGeometry, AdvancedShape, as_collection};
use crate::error::GeometryError;

/// A non-empty group of advanced geometries treated as one shape.
///
/// Children are never collections themselves; nested input is inlined at
/// construction. Child order carries no meaning, including for equality.
#[derive(Debug, Clone)]
pub struct ShapeCollection {
    children: Vec<AdvancedGeometry>,
    center: Point<f64>,
}

impl ShapeCollection {
    pub fn new(members: Vec<AdvancedGeometry>) -> Result<Self, GeometryError> {
        let mut children = Vec::with_capacity(members.len());
        for member in members {
            push_flattened(member, &mut children);
        }
        if children.is_empty() {
            return Err(GeometryError::invalid("a collection needs at least one member"));
        }
        let center = enclosing_envelope(&children).center().into();
        Ok(Self { children, center })
    }

    pub fn children(&self) -> &[AdvancedGeometry] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn into_children(self) -> Vec<AdvancedGeometry> {
        self.children
    }
}

fn push_flattened(member: AdvancedGeometry, children: &mut Vec<AdvancedGeometry>) {
    match member {
        AdvancedGeometry::Collection(collection) => {
            for child in collection.children {
                push_flattened(child, children);
            }
        }
        other => children.push(other),
    }
}

fn enclosing_envelope(children: &[AdvancedGeometry]) -> Rect<f64> {
    let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
    let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };
    for child in children {
        let envelope = child.envelope();
        min.x = min.x.min(envelope.min().x);
        min.y = min.y.min(envelope.min().y);
        max.x = max.x.max(envelope.max().x);
        max.y = max.y.max(envelope.max().y);
    }
    Rect::new(min, max)
}

impl PartialEq for ShapeCollection {
    fn eq(&self, other: &Self) -> bool {
        if self.children.len() != other.children.len() {
            return false;
        }
        let mut matched = vec![false; other.children.len()];
        self.children.iter().all(|child| {
            let found = other
                .children
                .iter()
                .enumerate()
                .find(|(index, candidate)| !matched[*index] && *candidate == child)
                .map(|(index, _)| index);
            match found {
                Some(index) => {
                    matched[index] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl AdvancedShape for ShapeCollection {
    fn center_point(&self) -> Point<f64> {
        self.center
    }

    fn is_point_like(&self) -> bool {
        self.children.iter().any(AdvancedShape::is_point_like)
    }

    fn is_line_like(&self) -> bool {
        self.children.iter().any(AdvancedShape::is_line_like)
    }

    fn is_area_like(&self) -> bool {
        self.children.iter().any(AdvancedShape::is_area_like)
    }

    fn is_potentially_curved(&self) -> bool {
        self.children.iter().any(AdvancedShape::is_potentially_curved)
    }

    fn validity_problem(&self) -> Option<String> {
        let problems: Vec<String> = self
            .children
            .iter()
            .filter_map(AdvancedShape::validity_problem)
            .collect();
        if problems.is_empty() { None } else { Some(problems.join(", ")) }
    }

    fn as_flattened_geometry(&self, flatness: f64, limit: u32) -> Geometry<f64> {
        let parts: Vec<Geometry<f64>> = self
            .children
            .iter()
            .map(|child| child.as_flattened_geometry(flatness, limit))
            .collect();
        Geometry::GeometryCollection(as_collection(Geometry::GeometryCollection(
            GeometryCollection::new_from(parts),
        )))
    }

    /// Centroid of the union of the flattened children, so overlapping areas
    /// count once.
    fn approximate_centroid(&self, flatness: f64, limit: u32) -> Point<f64> {
        let flattened = as_collection(self.as_flattened_geometry(flatness, limit));
        let mut areas: Option<MultiPolygon<f64>> = None;
        let mut parts = Vec::new();
        for part in flattened {
            let polygons = match part {
                Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
                Geometry::MultiPolygon(polygons) => polygons,
                other => {
                    parts.push(other);
                    continue;
                }
            };
            areas = Some(match areas {
                Some(union) => union.union(&polygons),
                None => polygons,
            });
        }
        if let Some(union) = areas {
            parts.push(Geometry::MultiPolygon(union));
        }
        GeometryCollection::new_from(parts)
            .centroid()
            .unwrap_or(self.center)
    }

    fn envelope(&self) -> Rect<f64> {
        enclosing_envelope(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use geo_types::{Geometry, Point, polygon};

    use super::*;
    use crate::geometry::WrappedGeometry;
    use crate::geometry::test_shapes::{ellipse, wrapped_line, wrapped_square};

    const FLATNESS: f64 = 0.01;
    const LIMIT: u32 = 8;

    #[test]
    fn test_empty_collection_is_rejected() {
        assert!(matches!(ShapeCollection::new(vec![]), Err(GeometryError::InvalidInput(_))));
    }

    #[test]
    fn test_nested_collections_are_inlined() {
        let inner = AdvancedGeometry::collection(vec![wrapped_square(0.0, 0.0, 1.0), wrapped_line()])
            .expect("Inner collection should build");
        let deeper = AdvancedGeometry::collection(vec![inner.clone(), ellipse()])
            .expect("Deeper collection should build");
        let outer = ShapeCollection::new(vec![deeper, inner, wrapped_square(5.0, 5.0, 1.0)])
            .expect("Outer collection should build");

        assert_eq!(outer.len(), 6);
        assert!(
            outer
                .children()
                .iter()
                .all(|child| !matches!(child, AdvancedGeometry::Collection(_)))
        );
    }

    #[test]
    fn test_center_is_center_of_enclosing_envelope() {
        let collection = ShapeCollection::new(vec![
            wrapped_square(0.0, 0.0, 2.0),
            wrapped_square(8.0, 4.0, 2.0),
        ])
        .expect("Should build");
        assert_eq!(collection.center_point(), Point::new(5.0, 3.0));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = ShapeCollection::new(vec![wrapped_square(0.0, 0.0, 1.0), wrapped_line()])
            .expect("Should build");
        let b = ShapeCollection::new(vec![wrapped_line(), wrapped_square(0.0, 0.0, 1.0)])
            .expect("Should build");
        let c = ShapeCollection::new(vec![wrapped_line(), wrapped_line()]).expect("Should build");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_centroid_is_weighted_by_area() {
        let big = wrapped_square(0.0, 0.0, 10.0);
        let small = wrapped_square(20.0, 0.0, 1.0);
        let collection = ShapeCollection::new(vec![big, small]).expect("Should build");

        let centroid = collection.approximate_centroid(FLATNESS, LIMIT);
        let naive_average_x = (5.0 + 20.5) / 2.0;
        assert!(centroid.x() < 6.0, "centroid {centroid:?} should sit near the big square");
        assert!((centroid.x() - naive_average_x).abs() > 5.0);
    }

    #[test]
    fn test_centroid_does_not_double_count_overlap() {
        let a = wrapped_square(0.0, 0.0, 2.0);
        let b = wrapped_square(0.0, 0.0, 2.0);
        let c = wrapped_square(2.0, 0.0, 2.0);
        let collection = ShapeCollection::new(vec![a, b, c]).expect("Should build");
        let centroid = collection.approximate_centroid(FLATNESS, LIMIT);
        assert!((centroid.x() - 2.0).abs() < 1e-6, "got {centroid:?}");
        assert!((centroid.y() - 1.0).abs() < 1e-6, "got {centroid:?}");
    }

    #[test]
    fn test_flattened_geometry_is_always_a_collection() {
        let single = ShapeCollection::new(vec![wrapped_square(0.0, 0.0, 1.0)]).expect("Should build");
        match single.as_flattened_geometry(FLATNESS, LIMIT) {
            Geometry::GeometryCollection(parts) => assert_eq!(parts.0.len(), 1),
            other => panic!("expected a collection, got {other:?}"),
        }
    }

    #[test]
    fn test_validity_problems_are_joined() {
        let bowtie = || {
            AdvancedGeometry::from(
                WrappedGeometry::unrotated(Geometry::Polygon(polygon![
                    (x: 0.0, y: 0.0),
                    (x: 2.0, y: 2.0),
                    (x: 2.0, y: 0.0),
                    (x: 0.0, y: 2.0),
                    (x: 0.0, y: 0.0),
                ]))
                .expect("Should wrap"),
            )
        };
        let valid = ShapeCollection::new(vec![wrapped_square(0.0, 0.0, 1.0)]).expect("Should build");
        assert!(valid.is_valid());

        let invalid = ShapeCollection::new(vec![bowtie(), wrapped_square(0.0, 0.0, 1.0), bowtie()])
            .expect("Should build");
        assert!(!invalid.is_valid());
        let single = bowtie().validity_problem().expect("Bowtie is invalid");
        let problem = invalid.validity_problem().expect("Should describe the problem");
        assert_eq!(problem, format!("{single}, {single}"));
    }
}
