use thiserror::Error;

/// Failures constructing or transforming an advanced geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GeometryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[derive(Error, Debug)]
pub enum EncodeError {
    /// The model holds something the codec has no tag or layout for. This
    /// means the model and codec versions disagree.
    #[error("No wire representation for geometry kind '{kind}'")]
    UnsupportedVariant { kind: &'static str },

    #[error("IO error while encoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC payload error: {0}")]
    Rpc(String),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unknown geometry type ordinal {0}")]
    UnknownType(u16),

    #[error("Geometry stream ended unexpectedly")]
    Truncated,

    #[error("Malformed geometry stream: {0}")]
    Malformed(String),

    #[error("Invalid base64 text: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error while decoding: {0}")]
    Io(std::io::Error),

    #[error("RPC payload error: {0}")]
    Rpc(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
            _ => DecodeError::Io(error),
        }
    }
}

impl From<GeometryError> for DecodeError {
    fn from(error: GeometryError) -> Self {
        DecodeError::Malformed(error.to_string())
    }
}

#[derive(Error, Debug)]
pub enum HazardGeometryError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HazardGeometryError>;
