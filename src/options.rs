//! Query options with builder-style configuration and validation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileQueryError};
use crate::filter::PropertyFilter;
use crate::wire;

/// Geometry classes a feature can carry.
///
/// `Unknown` appears in results for features whose type tag the tile did not
/// set to a recognised value; it is not accepted as a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Linestring,
    Polygon,
    Unknown,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Linestring => "linestring",
            GeometryKind::Polygon => "polygon",
            GeometryKind::Unknown => "unknown",
        }
    }
}

impl From<wire::GeomType> for GeometryKind {
    fn from(kind: wire::GeomType) -> Self {
        match kind {
            wire::GeomType::Point => GeometryKind::Point,
            wire::GeomType::Linestring => GeometryKind::Linestring,
            wire::GeomType::Polygon => GeometryKind::Polygon,
            wire::GeomType::Unknown => GeometryKind::Unknown,
        }
    }
}

impl std::str::FromStr for GeometryKind {
    type Err = TileQueryError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "point" => Ok(GeometryKind::Point),
            "linestring" => Ok(GeometryKind::Linestring),
            "polygon" => Ok(GeometryKind::Polygon),
            _ => Err(TileQueryError::InvalidArgument(
                "'geometry' must be 'point', 'linestring', or 'polygon'".to_string(),
            )),
        }
    }
}

/// Options controlling a tile query.
///
/// Loadable from JSON the way the original service options looked, and
/// buildable fluently:
///
/// ```
/// use tilequery::{GeometryKind, QueryOptions};
///
/// let options = QueryOptions::default()
///     .with_radius(250.0)
///     .with_limit(20)
///     .with_layers(["building", "parks"])
///     .with_geometry(GeometryKind::Polygon);
///
/// assert!(options.validate().is_ok());
///
/// let from_json: QueryOptions = serde_json::from_str(
///     r#"{ "radius": 250.0, "limit": 20, "dedupe": false }"#,
/// ).unwrap();
/// assert_eq!(from_json.radius, 250.0);
/// assert!(!from_json.dedupe);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Search radius in meters. Only features whose closest point lies
    /// within it are returned; `0.0` keeps direct hits only.
    #[serde(default)]
    pub radius: f64,

    /// Maximum number of results, 1 to 1000.
    #[serde(default = "QueryOptions::default_limit")]
    pub limit: usize,

    /// Layer names to query. Empty means all layers.
    #[serde(default)]
    pub layers: Vec<String>,

    /// Restrict results to one geometry class.
    #[serde(default)]
    pub geometry: Option<GeometryKind>,

    /// Collapse features that appear in several tiles (same layer, geometry,
    /// id and tag pairs) into their best-distance occurrence.
    #[serde(default = "QueryOptions::default_dedupe")]
    pub dedupe: bool,

    /// Keep polygons only when the query point is on or inside them.
    #[serde(default)]
    pub direct_hit_polygon: bool,

    /// Optional attribute filter, `["all"|"any", [[key, op, operand], ...]]`
    /// in its JSON form.
    #[serde(default, rename = "basic-filters")]
    pub filter: Option<PropertyFilter>,
}

pub const MAX_LIMIT: usize = 1000;

impl QueryOptions {
    const fn default_limit() -> usize {
        5
    }

    const fn default_dedupe() -> bool {
        true
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryKind) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn with_direct_hit_polygon(mut self, direct_hit_polygon: bool) -> Self {
        self.direct_hit_polygon = direct_hit_polygon;
        self
    }

    pub fn with_filter(mut self, filter: PropertyFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Check option ranges. Runs before any tile is touched.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() {
            return Err(TileQueryError::InvalidArgument(
                "'radius' must be a finite number".to_string(),
            ));
        }
        if self.radius < 0.0 {
            return Err(TileQueryError::InvalidArgument(
                "'radius' must be a positive number".to_string(),
            ));
        }
        if self.limit < 1 {
            return Err(TileQueryError::InvalidArgument(
                "'limit' must be 1 or greater".to_string(),
            ));
        }
        if self.limit > MAX_LIMIT {
            return Err(TileQueryError::InvalidArgument(
                "'limit' must be less than 1000".to_string(),
            ));
        }
        if self.layers.iter().any(String::is_empty) {
            return Err(TileQueryError::InvalidArgument(
                "'layers' values must be non-empty strings".to_string(),
            ));
        }
        if self.geometry == Some(GeometryKind::Unknown) {
            return Err(TileQueryError::InvalidArgument(
                "'geometry' must be 'point', 'linestring', or 'polygon'".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            radius: 0.0,
            limit: Self::default_limit(),
            layers: Vec::new(),
            geometry: None,
            dedupe: Self::default_dedupe(),
            direct_hit_polygon: false,
            filter: None,
        }
    }
}
