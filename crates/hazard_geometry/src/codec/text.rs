use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::compressed::{decode_compressed, encode_compressed};
use crate::error::{DecodeError, EncodeError};
use crate::geometry::AdvancedGeometry;

/// Printable form: standard base64 (padded, unwrapped) of the compressed bytes.
pub fn encode_text(geometry: &AdvancedGeometry) -> Result<String, EncodeError> {
    Ok(bytes_to_text(&encode_compressed(geometry)?))
}

pub fn decode_text(text: &str) -> Result<AdvancedGeometry, DecodeError> {
    decode_compressed(&text_to_bytes(text)?)
}

pub fn bytes_to_text(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn text_to_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(text)?)
}
