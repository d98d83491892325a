//! Wire formats for [`AdvancedGeometry`].
//!
//! Three layers stack on top of each other:
//!
//! - [`binary`]: `[u16 big-endian type ordinal][payload]`
//! - [`compressed`]: gzip over the binary form
//! - [`text`]: standard base64 over the compressed form
//!
//! [`adapters`] bridges the text form into serde and the compressed form into
//! a bincode RPC record. Every function here keeps its buffers local to the
//! call, so concurrent callers never share state.

pub mod adapters;
pub mod binary;
pub mod compressed;
pub mod text;
mod wkb;

use strum::{Display, EnumIter, FromRepr};

use crate::geometry::AdvancedGeometry;

pub use adapters::RpcGeometry;
pub use binary::{decode, encode};
pub use compressed::{decode_compressed, encode_compressed};
pub use text::{decode_text, encode_text};

/// Wire ordinal of each geometry variant.
///
/// This table is append-only: existing values must never change, and new
/// variants take the next free ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr)]
#[repr(u16)]
#[strum(serialize_all = "snake_case")]
pub enum GeometryTypeTag {
    Collection = 0,
    Ellipse = 1,
    Wrapped = 2,
}

impl GeometryTypeTag {
    pub fn of(geometry: &AdvancedGeometry) -> Self {
        match geometry {
            AdvancedGeometry::Collection(_) => Self::Collection,
            AdvancedGeometry::Ellipse(_) => Self::Ellipse,
            AdvancedGeometry::Wrapped(_) => Self::Wrapped,
        }
    }

    pub fn ordinal(self) -> u16 {
        self as u16
    }

    pub fn from_ordinal(ordinal: u16) -> Option<Self> {
        Self::from_repr(ordinal)
    }
}
