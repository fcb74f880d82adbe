//! Error types for tile queries.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TileQueryError>;

/// Errors surfaced by [`query`](crate::query).
///
/// Per-feature problems (unknown geometry type, malformed command stream)
/// never surface here; the affected feature is silently skipped. Anything
/// that makes a whole tile or layer unreadable fails the query and discards
/// partial results.
#[derive(Debug, Error)]
pub enum TileQueryError {
    /// The request shape is invalid: empty tile set, non-finite
    /// coordinates, out-of-range options, or a malformed filter expression.
    #[error("{0}")]
    InvalidArgument(String),

    /// A tile buffer could not be decoded: protobuf parse failure, gzip
    /// inflation failure, or an unusable layer header.
    #[error("failed to decode tile: {0}")]
    Decode(String),

    /// Unexpected engine failure. Not produced by the query path itself;
    /// reserved for host bindings that must map panics or foreign errors
    /// into this crate's error surface.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<prost::DecodeError> for TileQueryError {
    fn from(err: prost::DecodeError) -> Self {
        TileQueryError::Decode(err.to_string())
    }
}
