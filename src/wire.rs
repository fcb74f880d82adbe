//! Mapbox Vector Tile v2 wire format.
//!
//! Hand-annotated prost messages for the vector-tile protobuf schema,
//! consumed read-only. Geometry command streams and tag index pairs are kept
//! raw; the geometry decoder and the query driver interpret them.

pub use prost::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum GeomType {
    Unknown = 0,
    Point = 1,
    Linestring = 2,
    Polygon = 3,
}

#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}

impl Value {
    /// Materialise into the richest JSON scalar this value supports.
    ///
    /// Float and double both widen to a JSON double; sint narrows into a
    /// signed integer. A value with no field set (not produced by valid
    /// writers) yields `None` and the property is dropped.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        if let Some(s) = &self.string_value {
            return Some(serde_json::Value::String(s.clone()));
        }
        if let Some(f) = self.float_value {
            return serde_json::Number::from_f64(f64::from(f)).map(serde_json::Value::Number);
        }
        if let Some(d) = self.double_value {
            return serde_json::Number::from_f64(d).map(serde_json::Value::Number);
        }
        if let Some(i) = self.int_value {
            return Some(serde_json::Value::Number(serde_json::Number::from(i)));
        }
        if let Some(u) = self.uint_value {
            return Some(serde_json::Value::Number(serde_json::Number::from(u)));
        }
        if let Some(s) = self.sint_value {
            return Some(serde_json::Value::Number(serde_json::Number::from(s)));
        }
        self.bool_value.map(serde_json::Value::Bool)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    /// Alternating key/value indices into the layer dictionaries.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub tags: Vec<u32>,
    #[prost(enumeration = "GeomType", optional, tag = "3")]
    pub geom_type: Option<i32>,
    /// Raw geometry command stream.
    #[prost(uint32, repeated, packed = "true", tag = "4")]
    pub geometry: Vec<u32>,
}

impl Feature {
    /// The geometry type tag; unrecognised values map to `Unknown`.
    pub fn kind(&self) -> GeomType {
        self.geom_type
            .and_then(|raw| GeomType::try_from(raw).ok())
            .unwrap_or(GeomType::Unknown)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    #[prost(uint32, required, tag = "15", default = "1")]
    pub version: u32,
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    #[prost(uint32, optional, tag = "5", default = "4096")]
    pub extent: Option<u32>,
}

impl Layer {
    /// Look up the value for `key` among a feature's tag pairs.
    ///
    /// First matching pair wins. Pairs with out-of-range indices are
    /// ignored.
    pub fn tag_value(&self, tags: &[u32], key: &str) -> Option<&Value> {
        for pair in tags.chunks_exact(2) {
            if self.keys.get(pair[0] as usize).is_some_and(|k| k == key) {
                return self.values.get(pair[1] as usize);
            }
        }
        None
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}
