use geo_types::{Geometry, GeometryCollection, Point};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, Value};
use hazard_geometry::{FlatteningParams, HazardGeometryError, LinearUnit, ReductionConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HazardCliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    GeoJsonError(#[from] geojson::Error),
    #[error(transparent)]
    GeometryError(#[from] HazardGeometryError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Input contains no geometry")]
    NoGeometry,
    #[error("Expected 'lon,lat', got '{0}'")]
    BadCoordinate(String),
    #[error("Unknown linear unit '{0}'")]
    UnknownUnit(String),
}

/// Tuning loaded from a `.toml` or `.json` file. Both sections are optional.
///
/// ```toml
/// [reduction]
/// max_vertices = 12
///
/// [flattening]
/// flatness = 0.05
/// limit = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct HazardProfile {
    #[serde(default)]
    pub reduction: ReductionConfig,
    #[serde(default)]
    pub flattening: FlatteningParams,
}

impl HazardProfile {
    /// Load a profile from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, HazardCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, HazardCliError> {
        let profile: HazardProfile = toml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HazardCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, HazardCliError> {
        let profile: HazardProfile = serde_json::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Auto-detect file format and load the profile
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HazardCliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(HazardCliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, HazardCliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    fn validate(&self) -> Result<(), HazardCliError> {
        self.reduction.validate().map_err(HazardGeometryError::from)?;
        self.flattening.validate().map_err(HazardGeometryError::from)?;
        Ok(())
    }
}

/// Parse `lon,lat` into a point.
pub fn parse_lon_lat(text: &str) -> Result<Point<f64>, HazardCliError> {
    let bad = || HazardCliError::BadCoordinate(text.to_string());
    let (lon, lat) = text.split_once(',').ok_or_else(bad)?;
    let lon: f64 = lon.trim().parse().map_err(|_| bad())?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(bad());
    }
    Ok(Point::new(lon, lat))
}

pub fn parse_unit(text: &str) -> Result<LinearUnit, HazardCliError> {
    LinearUnit::from_identifier(text).ok_or_else(|| HazardCliError::UnknownUnit(text.to_string()))
}

/// Read every geometry in a GeoJSON document. A single geometry is returned as
/// is; several are gathered into a collection.
pub fn geometry_from_geojson_str(content: &str) -> Result<Geometry<f64>, HazardCliError> {
    let geojson: GeoJson = content.parse()?;
    let mut collection: GeometryCollection<f64> = geojson::quick_collection(&geojson)?;
    match collection.0.len() {
        0 => Err(HazardCliError::NoGeometry),
        1 => Ok(collection.0.remove(0)),
        _ => Ok(Geometry::GeometryCollection(collection)),
    }
}

pub fn geometry_from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Geometry<f64>, HazardCliError> {
    let content = fs::read_to_string(path)?;
    geometry_from_geojson_str(&content)
}

/// Wrap a geometry in a feature carrying `properties`.
pub fn feature(geometry: &Geometry<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn feature_collection_string(features: Vec<Feature>) -> Result<String, HazardCliError> {
    let collection = FeatureCollection { bbox: None, features, foreign_members: None };
    Ok(serde_json::to_string_pretty(&collection)?)
}
