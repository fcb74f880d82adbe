//! Spatial proximity queries against Mapbox Vector Tiles.
//!
//! Given a geographic query point, a radius in meters, and one or more tile
//! buffers, [`query`] returns the K nearest features across all tiles — each
//! re-projected to the closest point on its geometry, with its attributes,
//! layer, and original geometry type — as a GeoJSON `FeatureCollection`.
//!
//! Tile buffers may be gzip-compressed; inflation is transparent. Tiles may
//! sit at different zoom levels. Results can be restricted by layer name,
//! geometry class, and attribute filters, and features painted into several
//! tile buffers collapse to their best-distance occurrence by default.
//!
//! ```
//! use geo::Point;
//! use tilequery::wire::{self, Message};
//! use tilequery::{query, QueryOptions, TileRef};
//!
//! // a z0 tile with one point feature in the middle of the world
//! let layer = wire::Layer {
//!     version: 2,
//!     name: "poi".to_string(),
//!     features: vec![wire::Feature {
//!         id: Some(17),
//!         tags: vec![0, 0],
//!         geom_type: Some(wire::GeomType::Point as i32),
//!         geometry: vec![(1 << 3) | 1, 4096, 4096], // MoveTo (2048, 2048)
//!     }],
//!     keys: vec!["name".to_string()],
//!     values: vec![wire::Value {
//!         string_value: Some("null island".to_string()),
//!         ..Default::default()
//!     }],
//!     extent: Some(4096),
//! };
//! let bytes = wire::Tile { layers: vec![layer] }.encode_to_vec();
//!
//! let tiles = [TileRef::new(0, 0, 0, &bytes)];
//! let result = query(&tiles, &Point::new(0.0, 0.0), &QueryOptions::default())?;
//!
//! assert_eq!(result.features.len(), 1);
//! let properties = result.features[0].properties.as_ref().unwrap();
//! assert_eq!(properties["name"], "null island");
//! assert_eq!(properties["tilequery"]["distance"], 0.0);
//! assert_eq!(properties["tilequery"]["geometry"], "point");
//! assert_eq!(properties["tilequery"]["layer"], "poi");
//! # Ok::<(), tilequery::TileQueryError>(())
//! ```

pub mod error;
pub mod filter;
pub mod options;
pub mod project;
pub mod tile;
pub mod wire;

mod closest;
mod geometry;
mod query;
mod rank;

pub use error::{Result, TileQueryError};
pub use filter::{FilterClause, FilterCombinator, FilterOp, FilterOperand, PropertyFilter};
pub use options::{GeometryKind, QueryOptions};
pub use query::query;
pub use tile::TileRef;

pub use geo::Point;
pub use geojson;
pub use geojson::FeatureCollection;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
