//! Big-endian OGC well-known binary for the base geometry of a wrapped shape.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};

use crate::error::{DecodeError, EncodeError};

const BIG_ENDIAN_FLAG: u8 = 0;

const WKB_POINT: u32 = 1;
const WKB_LINE_STRING: u32 = 2;
const WKB_POLYGON: u32 = 3;
const WKB_MULTI_POINT: u32 = 4;
const WKB_MULTI_LINE_STRING: u32 = 5;
const WKB_MULTI_POLYGON: u32 = 6;
const WKB_GEOMETRY_COLLECTION: u32 = 7;

/// Deepest geometry-collection nesting accepted when reading.
const MAX_DEPTH: usize = 32;

/// Cap on pre-allocation from a length prefix that has not been verified yet.
const MAX_PREALLOCATION: usize = 1024;

pub(crate) fn write_geometry<W: Write>(writer: &mut W, geometry: &Geometry<f64>) -> Result<(), EncodeError> {
    match geometry {
        Geometry::Point(point) => {
            write_header(writer, WKB_POINT)?;
            write_coord(writer, point.0)?;
        }
        Geometry::LineString(line) => {
            write_header(writer, WKB_LINE_STRING)?;
            write_coords(writer, line)?;
        }
        Geometry::Polygon(polygon) => {
            write_header(writer, WKB_POLYGON)?;
            write_polygon_rings(writer, polygon)?;
        }
        Geometry::MultiPoint(points) => {
            write_header(writer, WKB_MULTI_POINT)?;
            write_count(writer, points.0.len())?;
            for point in points {
                write_geometry(writer, &Geometry::Point(*point))?;
            }
        }
        Geometry::MultiLineString(lines) => {
            write_header(writer, WKB_MULTI_LINE_STRING)?;
            write_count(writer, lines.0.len())?;
            for line in lines {
                write_header(writer, WKB_LINE_STRING)?;
                write_coords(writer, line)?;
            }
        }
        Geometry::MultiPolygon(polygons) => {
            write_header(writer, WKB_MULTI_POLYGON)?;
            write_count(writer, polygons.0.len())?;
            for polygon in polygons {
                write_header(writer, WKB_POLYGON)?;
                write_polygon_rings(writer, polygon)?;
            }
        }
        Geometry::GeometryCollection(collection) => {
            write_header(writer, WKB_GEOMETRY_COLLECTION)?;
            write_count(writer, collection.0.len())?;
            for part in collection {
                write_geometry(writer, part)?;
            }
        }
        Geometry::Line(_) => return Err(EncodeError::UnsupportedVariant { kind: "line" }),
        Geometry::Rect(_) => return Err(EncodeError::UnsupportedVariant { kind: "rect" }),
        Geometry::Triangle(_) => return Err(EncodeError::UnsupportedVariant { kind: "triangle" }),
    }
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, type_code: u32) -> std::io::Result<()> {
    writer.write_u8(BIG_ENDIAN_FLAG)?;
    writer.write_u32::<BigEndian>(type_code)
}

fn write_count<W: Write>(writer: &mut W, count: usize) -> Result<(), EncodeError> {
    let count = u32::try_from(count).map_err(|_| EncodeError::UnsupportedVariant {
        kind: "geometry with more than u32::MAX parts",
    })?;
    writer.write_u32::<BigEndian>(count)?;
    Ok(())
}

fn write_coord<W: Write>(writer: &mut W, coord: Coord<f64>) -> std::io::Result<()> {
    writer.write_f64::<BigEndian>(coord.x)?;
    writer.write_f64::<BigEndian>(coord.y)
}

fn write_coords<W: Write>(writer: &mut W, line: &LineString<f64>) -> Result<(), EncodeError> {
    write_count(writer, line.0.len())?;
    for coord in line.coords() {
        write_coord(writer, *coord)?;
    }
    Ok(())
}

fn write_polygon_rings<W: Write>(writer: &mut W, polygon: &Polygon<f64>) -> Result<(), EncodeError> {
    if polygon.exterior().0.is_empty() {
        return write_count(writer, 0);
    }
    write_count(writer, 1 + polygon.interiors().len())?;
    write_coords(writer, polygon.exterior())?;
    for interior in polygon.interiors() {
        write_coords(writer, interior)?;
    }
    Ok(())
}

pub(crate) fn read_geometry<R: Read>(reader: &mut R) -> Result<Geometry<f64>, DecodeError> {
    read_geometry_at_depth(reader, 0)
}

fn read_geometry_at_depth<R: Read>(reader: &mut R, depth: usize) -> Result<Geometry<f64>, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::Malformed(format!(
            "geometry collections nested deeper than {MAX_DEPTH}"
        )));
    }
    let type_code = read_header(reader)?;
    let geometry = match type_code {
        WKB_POINT => Geometry::Point(Point(read_coord(reader)?)),
        WKB_LINE_STRING => Geometry::LineString(read_coords(reader)?),
        WKB_POLYGON => Geometry::Polygon(read_polygon_rings(reader)?),
        WKB_MULTI_POINT => {
            let count = read_count(reader)?;
            let mut points = Vec::with_capacity(count.min(MAX_PREALLOCATION));
            for _ in 0..count {
                expect_header(reader, WKB_POINT)?;
                points.push(Point(read_coord(reader)?));
            }
            Geometry::MultiPoint(MultiPoint::new(points))
        }
        WKB_MULTI_LINE_STRING => {
            let count = read_count(reader)?;
            let mut lines = Vec::with_capacity(count.min(MAX_PREALLOCATION));
            for _ in 0..count {
                expect_header(reader, WKB_LINE_STRING)?;
                lines.push(read_coords(reader)?);
            }
            Geometry::MultiLineString(MultiLineString::new(lines))
        }
        WKB_MULTI_POLYGON => {
            let count = read_count(reader)?;
            let mut polygons = Vec::with_capacity(count.min(MAX_PREALLOCATION));
            for _ in 0..count {
                expect_header(reader, WKB_POLYGON)?;
                polygons.push(read_polygon_rings(reader)?);
            }
            Geometry::MultiPolygon(MultiPolygon::new(polygons))
        }
        WKB_GEOMETRY_COLLECTION => {
            let count = read_count(reader)?;
            let mut parts = Vec::with_capacity(count.min(MAX_PREALLOCATION));
            for _ in 0..count {
                parts.push(read_geometry_at_depth(reader, depth + 1)?);
            }
            Geometry::GeometryCollection(GeometryCollection::new_from(parts))
        }
        other => {
            return Err(DecodeError::Malformed(format!("unknown WKB geometry type {other}")));
        }
    };
    Ok(geometry)
}

fn read_header<R: Read>(reader: &mut R) -> Result<u32, DecodeError> {
    let byte_order = reader.read_u8()?;
    if byte_order != BIG_ENDIAN_FLAG {
        return Err(DecodeError::Malformed(format!(
            "expected big-endian WKB, found byte order flag {byte_order}"
        )));
    }
    Ok(reader.read_u32::<BigEndian>()?)
}

fn expect_header<R: Read>(reader: &mut R, expected: u32) -> Result<(), DecodeError> {
    let found = read_header(reader)?;
    if found != expected {
        return Err(DecodeError::Malformed(format!(
            "expected WKB type {expected} inside multi-part geometry, found {found}"
        )));
    }
    Ok(())
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize, DecodeError> {
    Ok(reader.read_u32::<BigEndian>()? as usize)
}

fn read_coord<R: Read>(reader: &mut R) -> Result<Coord<f64>, DecodeError> {
    let x = reader.read_f64::<BigEndian>()?;
    let y = reader.read_f64::<BigEndian>()?;
    Ok(Coord { x, y })
}

fn read_coords<R: Read>(reader: &mut R) -> Result<LineString<f64>, DecodeError> {
    let count = read_count(reader)?;
    let mut coords = Vec::with_capacity(count.min(MAX_PREALLOCATION));
    for _ in 0..count {
        coords.push(read_coord(reader)?);
    }
    Ok(LineString::new(coords))
}

fn read_polygon_rings<R: Read>(reader: &mut R) -> Result<Polygon<f64>, DecodeError> {
    let ring_count = read_count(reader)?;
    if ring_count == 0 {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }
    let exterior = read_coords(reader)?;
    let mut interiors = Vec::with_capacity((ring_count - 1).min(MAX_PREALLOCATION));
    for _ in 1..ring_count {
        interiors.push(read_coords(reader)?);
    }
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use geo_types::{Rect, polygon};

    use super::*;

    fn round_trip(geometry: &Geometry<f64>) -> Geometry<f64> {
        let mut bytes = Vec::new();
        write_geometry(&mut bytes, geometry).expect("Should write");
        read_geometry(&mut Cursor::new(bytes)).expect("Should read")
    }

    #[test]
    fn test_point_layout_is_big_endian_wkb() {
        let mut bytes = Vec::new();
        write_geometry(&mut bytes, &Geometry::Point(Point::new(1.0, 2.0))).expect("Should write");
        assert_eq!(bytes.len(), 1 + 4 + 16);
        assert_eq!(&bytes[..5], &[0, 0, 0, 0, 1]);
        assert_eq!(&bytes[5..13], &1.0f64.to_be_bytes());
    }

    #[test]
    fn test_polygon_with_hole_and_collection_survive() {
        let with_hole = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 2.0)])],
        );
        let collection = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            Geometry::Polygon(with_hole),
            Geometry::MultiPoint(MultiPoint::new(vec![Point::new(1.0, 1.0), Point::new(-3.5, 7.25)])),
            Geometry::MultiLineString(MultiLineString::new(vec![LineString::from(vec![
                (0.0, 0.0),
                (1.0, 1.0),
            ])])),
            Geometry::MultiPolygon(MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]])),
        ]));
        assert_eq!(round_trip(&collection), collection);
    }

    #[test]
    fn test_non_wkb_kinds_are_unsupported() {
        let mut bytes = Vec::new();
        let rect = Geometry::Rect(Rect::new((0.0, 0.0), (1.0, 1.0)));
        assert!(matches!(
            write_geometry(&mut bytes, &rect),
            Err(EncodeError::UnsupportedVariant { kind: "rect" })
        ));
    }

    #[test]
    fn test_truncated_and_malformed_input() {
        let mut bytes = Vec::new();
        write_geometry(&mut bytes, &Geometry::Point(Point::new(1.0, 2.0))).expect("Should write");
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(read_geometry(&mut Cursor::new(bytes)), Err(DecodeError::Truncated)));

        let little_endian = vec![1u8, 1, 0, 0, 0];
        assert!(matches!(
            read_geometry(&mut Cursor::new(little_endian)),
            Err(DecodeError::Malformed(_))
        ));

        let unknown_type = vec![0u8, 0, 0, 0, 99];
        assert!(matches!(
            read_geometry(&mut Cursor::new(unknown_type)),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_runaway_nesting_is_rejected() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_DEPTH + 1 {
            bytes.extend_from_slice(&[0, 0, 0, 0, 7, 0, 0, 0, 1]);
        }
        assert!(matches!(read_geometry(&mut Cursor::new(bytes)), Err(DecodeError::Malformed(_))));
    }
}
