//! # Hazard Geometry
//!
//! Geometry model, wire codec and polygon clean-up for hazard areas.
//!
//! ## Core Features
//!
//! - **Advanced geometries**: wrapped planar shapes with a rotation, geodesic
//!   ellipses, and flat collections of both
//! - **Binary codec**: `[u16 type ordinal][payload]`, optionally gzipped and
//!   base64-encoded, with serde and RPC adapters
//! - **Polygon reduction**: vertex budgets with self-intersection repair
//! - **Geodesy**: great-circle distance and offset on a spherical earth
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hazard_geometry::{AdvancedShape, Ellipse, LinearUnit, codec};
//!
//! let ellipse = Ellipse::new(-100.0, 40.0, 10.0, 5.0, LinearUnit::Miles, 0.0)?;
//! let text = codec::encode_text(&ellipse.clone().into())?;
//! let back = codec::decode_text(&text)?;
//! assert!(back.is_valid());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Reducing a polygon
//!
//! ```rust,no_run
//! use geo_types::polygon;
//! use hazard_geometry::{PolygonReducer, ReductionConfig};
//!
//! let reducer = PolygonReducer::new(ReductionConfig::default().with_max_vertices(20))?;
//! let outcome = reducer.reduce(&polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0)]);
//! println!("valid: {}", outcome.valid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod codec;
pub mod config;
pub mod error;
pub mod geodesy;
pub mod geometry;
pub mod units;

pub use algorithms::{PolygonReducer, ReductionOutcome, simplify_to_count};
pub use config::{FlatteningParams, ReductionConfig};
pub use error::{DecodeError, EncodeError, GeometryError, HazardGeometryError, Result};
pub use geometry::{
    AdvancedGeometry, AdvancedShape, Ellipse, Rotatable, Scaleable, ShapeCollection, WrappedGeometry, from_shape,
};
pub use units::LinearUnit;
