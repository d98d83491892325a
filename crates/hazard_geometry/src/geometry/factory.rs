use geo_types::Geometry;
use tracing::debug;

use super::{AdvancedGeometry, ShapeCollection, WrappedGeometry};
use crate::error::GeometryError;

/// Build an advanced geometry from a plain shape.
///
/// Multi-part input is broken into its single parts: a collection that holds
/// only single parts or flat multi-parts is merged one level, and anything
/// nested deeper is replaced by its leaves. One part becomes a single
/// [`WrappedGeometry`]; several parts become a [`ShapeCollection`] of wrapped
/// parts.
pub fn from_shape(geometry: Geometry<f64>) -> Result<AdvancedGeometry, GeometryError> {
    let mut parts = single_parts(geometry);
    debug!(parts = parts.len(), "building advanced geometry from shape");
    match parts.len() {
        0 => Err(GeometryError::invalid("shape has no parts")),
        1 => {
            let part = parts.remove(0);
            WrappedGeometry::unrotated(part).map(AdvancedGeometry::Wrapped)
        }
        _ => {
            let members = parts
                .into_iter()
                .map(|part| WrappedGeometry::unrotated(part).map(AdvancedGeometry::Wrapped))
                .collect::<Result<Vec<_>, _>>()?;
            ShapeCollection::new(members).map(AdvancedGeometry::Collection)
        }
    }
}

fn single_parts(geometry: Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::GeometryCollection(collection) => {
            let nested_deeper = collection.iter().any(|part| match part {
                Geometry::GeometryCollection(inner) => inner.iter().any(is_multi_part),
                _ => false,
            });
            if nested_deeper {
                collection.into_iter().flat_map(single_parts).collect()
            } else {
                collection.into_iter().flat_map(merge_one_level).collect()
            }
        }
        other => merge_one_level(other),
    }
}

/// Split one level of multi-part structure.
fn merge_one_level(geometry: Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::MultiPoint(points) => points.into_iter().map(Geometry::Point).collect(),
        Geometry::MultiLineString(lines) => lines.into_iter().map(Geometry::LineString).collect(),
        Geometry::MultiPolygon(polygons) => polygons.into_iter().map(Geometry::Polygon).collect(),
        Geometry::GeometryCollection(collection) => collection.into_iter().collect(),
        single => vec![single],
    }
}

fn is_multi_part(geometry: &Geometry<f64>) -> bool {
    matches!(
        geometry,
        Geometry::MultiPoint(_)
            | Geometry::MultiLineString(_)
            | Geometry::MultiPolygon(_)
            | Geometry::GeometryCollection(_)
    )
}
