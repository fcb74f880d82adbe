//! The query driver.
//!
//! Walks tiles in caller order, layers and features in stream order, feeds
//! surviving candidates through the ranking accumulator, and materialises
//! properties only for the candidates still ranked once every tile has been
//! visited. Decoded tiles stay alive until then, so tag indices captured
//! during the loop always resolve.

use geo::Point;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry};
use tracing::debug;

use crate::closest;
use crate::error::{Result, TileQueryError};
use crate::geometry;
use crate::options::{GeometryKind, QueryOptions};
use crate::project::{self, CheapRuler};
use crate::rank::{Candidate, Ranking};
use crate::tile::{maybe_inflate, TileRef};
use crate::wire::{self, Message};

/// Query the K nearest features across a set of vector tiles.
///
/// Returns a GeoJSON `FeatureCollection` whose features are ordered by
/// ascending distance from `lnglat`. Each feature carries its materialised
/// properties plus a `tilequery` member with the distance in meters, the
/// original geometry class, and the layer name; a feature property that is
/// itself named `tilequery` is overwritten by that member.
///
/// Invalid requests fail before any tile is read; an unreadable tile or
/// layer fails the whole query and discards partial results. Features with
/// unknown geometry types or malformed command streams are skipped
/// silently.
pub fn query(
    tiles: &[TileRef<'_>],
    lnglat: &Point<f64>,
    options: &QueryOptions,
) -> Result<FeatureCollection> {
    validate(tiles, lnglat, options)?;

    debug!(
        tiles = tiles.len(),
        radius = options.radius,
        limit = options.limit,
        "running tile query"
    );

    let ruler = CheapRuler::new(lnglat.y());
    let mut ranking = Ranking::new(options.limit, options.dedupe);
    let mut decoded: Vec<wire::Tile> = Vec::with_capacity(tiles.len());

    for (tile_idx, tile) in tiles.iter().enumerate() {
        let bytes = maybe_inflate(tile.buffer)?;
        let decoded_tile = wire::Tile::decode(bytes.as_ref())?;

        for (layer_idx, layer) in decoded_tile.layers.iter().enumerate() {
            if !options.layers.is_empty() && !options.layers.iter().any(|name| name == &layer.name)
            {
                continue;
            }

            let extent = layer.extent();
            if extent == 0 {
                return Err(TileQueryError::Decode(format!(
                    "layer '{}' declares a zero extent",
                    layer.name
                )));
            }

            // extent can differ per layer, so the tile-local query point does too
            let query_point = project::lnglat_to_tile_local(
                lnglat.x(),
                lnglat.y(),
                extent,
                tile.z,
                tile.x,
                tile.y,
            );

            for feature in &layer.features {
                let kind = GeometryKind::from(feature.kind());
                if kind == GeometryKind::Unknown {
                    continue;
                }
                if options.geometry.is_some_and(|want| want != kind) {
                    continue;
                }

                let Some(geom) = geometry::decode(feature.kind(), &feature.geometry) else {
                    continue;
                };

                let cp = closest::closest_point(&geom, query_point);
                if cp.distance < 0.0 {
                    continue;
                }

                let (position, meters) = if cp.distance == 0.0 {
                    (*lnglat, 0.0)
                } else {
                    let position =
                        project::tile_local_to_lnglat(extent, tile.z, tile.x, tile.y, cp.x, cp.y);
                    let meters = ruler.distance(lnglat, &position);
                    (position, meters)
                };

                if meters > options.radius {
                    continue;
                }
                if options.direct_hit_polygon && kind == GeometryKind::Polygon && meters > 0.0 {
                    continue;
                }
                if let Some(filter) = &options.filter {
                    if !filter.evaluate(|key| layer.tag_value(&feature.tags, key)) {
                        continue;
                    }
                }

                ranking.consider(Candidate {
                    layer_name: layer.name.clone(),
                    kind,
                    id: feature.id,
                    tags: feature.tags.clone(),
                    lng: position.x(),
                    lat: position.y(),
                    meters,
                    tile_idx,
                    layer_idx,
                });
            }
        }

        decoded.push(decoded_tile);
    }

    let results = ranking.into_results();
    debug!(features = results.len(), "tile query finished");

    let features = results
        .into_iter()
        .map(|candidate| materialise(candidate, &decoded))
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn validate(tiles: &[TileRef<'_>], lnglat: &Point<f64>, options: &QueryOptions) -> Result<()> {
    if tiles.is_empty() {
        return Err(TileQueryError::InvalidArgument(
            "'tiles' must contain at least one tile".to_string(),
        ));
    }
    if !lnglat.x().is_finite() || !lnglat.y().is_finite() {
        return Err(TileQueryError::InvalidArgument(
            "lnglat values must be finite numbers".to_string(),
        ));
    }
    options.validate()
}

/// Resolve a ranked candidate's raw tag pairs against the layer dictionaries
/// and build its result feature.
fn materialise(candidate: Candidate, tiles: &[wire::Tile]) -> Feature {
    let mut properties = serde_json::Map::new();

    if let Some(layer) = tiles
        .get(candidate.tile_idx)
        .and_then(|tile| tile.layers.get(candidate.layer_idx))
    {
        for pair in candidate.tags.chunks_exact(2) {
            if let (Some(key), Some(value)) = (
                layer.keys.get(pair[0] as usize),
                layer.values.get(pair[1] as usize),
            ) {
                if let Some(json) = value.to_json() {
                    properties.insert(key.clone(), json);
                }
            }
        }
    }

    // inserted last, so the engine's metadata wins over a feature property
    // of the same name
    let mut tilequery = serde_json::Map::new();
    tilequery.insert("distance".to_string(), json_number(candidate.meters));
    tilequery.insert(
        "geometry".to_string(),
        serde_json::Value::String(candidate.kind.as_str().to_string()),
    );
    tilequery.insert(
        "layer".to_string(),
        serde_json::Value::String(candidate.layer_name),
    );
    properties.insert(
        "tilequery".to_string(),
        serde_json::Value::Object(tilequery),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            candidate.lng,
            candidate.lat,
        ]))),
        id: Some(Id::Number(candidate.id.unwrap_or(0).into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn json_number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
