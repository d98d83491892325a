use std::io::{ErrorKind, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::trace;

use super::binary;
use crate::error::{DecodeError, EncodeError};
use crate::geometry::AdvancedGeometry;

/// Size of the transfer buffer used while inflating.
const TRANSFER_BUFFER_SIZE: usize = 4096;

/// Binary encoding, gzip-compressed as a single stream.
pub fn encode_compressed(geometry: &AdvancedGeometry) -> Result<Vec<u8>, EncodeError> {
    let raw = binary::encode(geometry)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    trace!(raw = raw.len(), compressed = compressed.len(), "compressed geometry");
    Ok(compressed)
}

pub fn decode_compressed(bytes: &[u8]) -> Result<AdvancedGeometry, DecodeError> {
    binary::decode(&inflate(bytes)?)
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut inflated = Vec::new();
    let mut buffer = [0u8; TRANSFER_BUFFER_SIZE];
    loop {
        match decoder.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => inflated.extend_from_slice(&buffer[..read]),
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => {
                return Err(DecodeError::Truncated);
            }
            Err(error) => {
                return Err(DecodeError::Malformed(format!("gzip stream: {error}")));
            }
        }
    }
    Ok(inflated)
}
