use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Mean earth radius in kilometers; every other unit's radius derives from it.
const EARTH_RADIUS_KM: f64 = 6371.0;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Linear unit in which distances, ellipse axes and offsets are expressed.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinearUnit {
    Feet,
    Miles,
    NauticalMiles,
    Kilometers,
    Meters,
}

impl LinearUnit {
    /// Look a unit up by its identifier; `None` for anything unrecognized.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        identifier.parse().ok()
    }

    /// Stable identifier, also used on the wire.
    pub fn identifier(&self) -> &'static str {
        self.into()
    }

    /// Earth radius expressed in this unit.
    pub fn earth_radius(&self) -> f64 {
        let radius_meters = EARTH_RADIUS_KM * METERS_PER_KILOMETER;
        match self {
            Self::Feet => radius_meters / METERS_PER_FOOT,
            Self::Miles => radius_meters / METERS_PER_MILE,
            Self::NauticalMiles => radius_meters / METERS_PER_NAUTICAL_MILE,
            Self::Kilometers => EARTH_RADIUS_KM,
            Self::Meters => radius_meters,
        }
    }
}
