//! Bridges from the codec into serde and into the bincode RPC layer.
//!
//! Both adapters carry exactly the bytes the direct API produces: serde sees
//! the [`encode_text`] string, RPC sees the [`encode_compressed`] bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::compressed::{decode_compressed, encode_compressed};
use super::text::{decode_text, encode_text};
use crate::error::{DecodeError, EncodeError};
use crate::geometry::AdvancedGeometry;

/// Object form seen by serde: one string property holding the text encoding.
#[derive(Serialize, Deserialize)]
struct GeometryText {
    geometry: String,
}

impl Serialize for AdvancedGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let geometry = encode_text(self).map_err(serde::ser::Error::custom)?;
        GeometryText { geometry }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AdvancedGeometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = GeometryText::deserialize(deserializer)?;
        decode_text(&text.geometry).map_err(serde::de::Error::custom)
    }
}

/// serde bridge usable as `#[serde(with = "hazard_geometry::codec::adapters::json")]`
/// to store a geometry as a bare text property.
pub mod json {
    use super::*;

    pub fn serialize<S: Serializer>(geometry: &AdvancedGeometry, serializer: S) -> Result<S::Ok, S::Error> {
        let text = encode_text(geometry).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AdvancedGeometry, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_text(&text).map_err(serde::de::Error::custom)
    }

    pub fn to_json_string(geometry: &AdvancedGeometry) -> crate::Result<String> {
        Ok(serde_json::to_string(geometry)?)
    }

    pub fn from_json_str(content: &str) -> crate::Result<AdvancedGeometry> {
        Ok(serde_json::from_str(content)?)
    }
}

/// RPC record carrying the compressed encoding as an opaque byte field.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RpcGeometry {
    pub payload: Vec<u8>,
}

impl RpcGeometry {
    pub fn from_geometry(geometry: &AdvancedGeometry) -> Result<Self, EncodeError> {
        Ok(Self { payload: encode_compressed(geometry)? })
    }

    pub fn to_geometry(&self) -> Result<AdvancedGeometry, DecodeError> {
        decode_compressed(&self.payload)
    }
}

pub mod rpc {
    use super::*;

    pub fn serialize(geometry: &AdvancedGeometry) -> Result<Vec<u8>, EncodeError> {
        let record = RpcGeometry::from_geometry(geometry)?;
        bincode::encode_to_vec(record, bincode::config::standard())
            .map_err(|error| EncodeError::Rpc(error.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<AdvancedGeometry, DecodeError> {
        let (record, _read): (RpcGeometry, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|error| DecodeError::Rpc(error.to_string()))?;
        record.to_geometry()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::geometry::test_shapes::{ellipse, wrapped_square};

    #[derive(Serialize, Deserialize)]
    struct HazardRecord {
        id: u32,
        #[serde(with = "json")]
        area: AdvancedGeometry,
    }

    #[test]
    fn test_serde_object_holds_the_text_form() {
        let shape = wrapped_square(-100.0, 40.0, 1.0);
        let value = serde_json::to_value(&shape).expect("Should serialize");
        let text = encode_text(&shape).expect("Should encode");
        assert_eq!(value, serde_json::json!({ "geometry": text }));

        let back: AdvancedGeometry = serde_json::from_value(value).expect("Should deserialize");
        assert_eq!(back, shape);
    }

    #[test]
    fn test_serde_with_field() {
        let record = HazardRecord { id: 7, area: ellipse() };
        let content = serde_json::to_string(&record).expect("Should serialize");
        let expected = encode_text(&record.area).expect("Should encode");
        assert!(content.contains(&expected));

        let back: HazardRecord = serde_json::from_str(&content).expect("Should deserialize");
        assert_eq!(back.id, 7);
        assert_eq!(back.area, ellipse());
    }

    #[test]
    fn test_json_helpers_report_bad_text() {
        let round = json::from_json_str(&json::to_json_string(&ellipse()).expect("Should serialize"))
            .expect("Should deserialize");
        assert_eq!(round, ellipse());
        assert!(json::from_json_str(r#"{ "geometry": "@@@" }"#).is_err());
    }

    #[test]
    fn test_rpc_payload_matches_direct_api() {
        let shape = AdvancedGeometry::collection(vec![wrapped_square(0.0, 0.0, 1.0), ellipse()])
            .expect("Should build");
        let record = RpcGeometry::from_geometry(&shape).expect("Should encode");
        assert_eq!(record.payload, encode_compressed(&shape).expect("Should compress"));

        let bytes = rpc::serialize(&shape).expect("Should serialize");
        assert_eq!(rpc::deserialize(&bytes).expect("Should deserialize"), shape);
    }

    #[test]
    fn test_rpc_rejects_garbage() {
        assert!(rpc::deserialize(&[]).is_err());
        let record = RpcGeometry { payload: vec![1, 2, 3] };
        assert!(record.to_geometry().is_err());
    }
}
