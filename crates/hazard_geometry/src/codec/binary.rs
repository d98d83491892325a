use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::trace;

use super::{GeometryTypeTag, wkb};
use crate::error::{DecodeError, EncodeError};
use crate::geometry::{AdvancedGeometry, Ellipse, ShapeCollection, WrappedGeometry};
use crate::units::LinearUnit;

/// Encode a geometry as `[u16 BE ordinal][payload]`.
pub fn encode(geometry: &AdvancedGeometry) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    write_geometry(&mut bytes, geometry)?;
    trace!(kind = geometry.kind(), bytes = bytes.len(), "encoded geometry");
    Ok(bytes)
}

/// Decode a geometry, rejecting trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<AdvancedGeometry, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let geometry = read_geometry(&mut cursor)?;
    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(DecodeError::Malformed(format!(
            "{} trailing bytes after geometry",
            bytes.len() - consumed
        )));
    }
    Ok(geometry)
}

pub fn write_geometry<W: Write>(writer: &mut W, geometry: &AdvancedGeometry) -> Result<(), EncodeError> {
    writer.write_u16::<BigEndian>(GeometryTypeTag::of(geometry).ordinal())?;
    match geometry {
        AdvancedGeometry::Collection(collection) => write_collection(writer, collection),
        AdvancedGeometry::Ellipse(ellipse) => write_ellipse(writer, ellipse),
        AdvancedGeometry::Wrapped(wrapped) => write_wrapped(writer, wrapped),
    }
}

pub fn read_geometry<R: Read>(reader: &mut R) -> Result<AdvancedGeometry, DecodeError> {
    let tag = read_tag(reader)?;
    read_payload(reader, tag)
}

fn read_tag<R: Read>(reader: &mut R) -> Result<GeometryTypeTag, DecodeError> {
    let ordinal = reader.read_u16::<BigEndian>()?;
    GeometryTypeTag::from_ordinal(ordinal).ok_or(DecodeError::UnknownType(ordinal))
}

fn read_payload<R: Read>(reader: &mut R, tag: GeometryTypeTag) -> Result<AdvancedGeometry, DecodeError> {
    match tag {
        GeometryTypeTag::Collection => read_collection(reader).map(AdvancedGeometry::Collection),
        GeometryTypeTag::Ellipse => read_ellipse(reader).map(AdvancedGeometry::Ellipse),
        GeometryTypeTag::Wrapped => read_wrapped(reader).map(AdvancedGeometry::Wrapped),
    }
}

fn write_collection<W: Write>(writer: &mut W, collection: &ShapeCollection) -> Result<(), EncodeError> {
    let count = u32::try_from(collection.len()).map_err(|_| EncodeError::UnsupportedVariant {
        kind: "collection with more than u32::MAX children",
    })?;
    writer.write_u32::<BigEndian>(count)?;
    for child in collection.children() {
        write_geometry(writer, child)?;
    }
    Ok(())
}

fn read_collection<R: Read>(reader: &mut R) -> Result<ShapeCollection, DecodeError> {
    let count = reader.read_u32::<BigEndian>()? as usize;
    let mut children = Vec::new();
    for index in 0..count {
        // Collections are flat, so a nested one can only come from a corrupt stream.
        let tag = read_tag(reader)?;
        if tag == GeometryTypeTag::Collection {
            return Err(DecodeError::Malformed(format!("collection nested inside collection at child {index}")));
        }
        children.push(read_payload(reader, tag)?);
    }
    Ok(ShapeCollection::new(children)?)
}

fn write_ellipse<W: Write>(writer: &mut W, ellipse: &Ellipse) -> Result<(), EncodeError> {
    writer.write_f64::<BigEndian>(ellipse.center_x())?;
    writer.write_f64::<BigEndian>(ellipse.center_y())?;
    writer.write_f64::<BigEndian>(ellipse.width())?;
    writer.write_f64::<BigEndian>(ellipse.height())?;
    let unit = ellipse.unit().identifier().as_bytes();
    // Unit identifiers are short static strings, always below u16::MAX.
    writer.write_u16::<BigEndian>(unit.len() as u16)?;
    writer.write_all(unit)?;
    writer.write_f64::<BigEndian>(ellipse.rotation())?;
    Ok(())
}

fn read_ellipse<R: Read>(reader: &mut R) -> Result<Ellipse, DecodeError> {
    let center_x = reader.read_f64::<BigEndian>()?;
    let center_y = reader.read_f64::<BigEndian>()?;
    let width = reader.read_f64::<BigEndian>()?;
    let height = reader.read_f64::<BigEndian>()?;
    let unit_length = reader.read_u16::<BigEndian>()? as usize;
    let mut unit_bytes = vec![0u8; unit_length];
    reader.read_exact(&mut unit_bytes)?;
    let identifier = std::str::from_utf8(&unit_bytes)
        .map_err(|error| DecodeError::Malformed(format!("unit identifier is not UTF-8: {error}")))?;
    let unit = LinearUnit::from_identifier(identifier)
        .ok_or_else(|| DecodeError::Malformed(format!("unknown linear unit '{identifier}'")))?;
    let rotation = reader.read_f64::<BigEndian>()?;
    Ok(Ellipse::new(center_x, center_y, width, height, unit, rotation)?)
}

fn write_wrapped<W: Write>(writer: &mut W, wrapped: &WrappedGeometry) -> Result<(), EncodeError> {
    writer.write_f64::<BigEndian>(wrapped.rotation())?;
    wkb::write_geometry(writer, wrapped.geometry())
}

fn read_wrapped<R: Read>(reader: &mut R) -> Result<WrappedGeometry, DecodeError> {
    let rotation = reader.read_f64::<BigEndian>()?;
    let geometry = wkb::read_geometry(reader)?;
    Ok(WrappedGeometry::new(geometry, rotation)?)
}
