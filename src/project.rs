//! Tile ↔ geographic reprojection and metric distance.
//!
//! Tile-local coordinates are integer pixels in `[0, extent)` with Y growing
//! downward. A query point projected into a tile it does not intersect comes
//! out negative or beyond the extent; the closest-point kernel handles that
//! without special cases, so nothing here clamps to the tile.

use std::f64::consts::PI;

use geo::{Coord, Point};

/// Project a geographic position into the local pixel space of one tile.
///
/// The longitude is normalised into `[0, 360)` and the latitude clamped to
/// `[-89.9, 89.9]` before the Web-Mercator world-pixel computation at
/// `extent * 2^z`. Integer division and remainder follow truncating
/// semantics, so positions west or north of the active tile yield negative
/// local coordinates.
///
/// # Examples
///
/// ```
/// use tilequery::project::lnglat_to_tile_local;
///
/// // null island lands in the middle of the single z0 tile
/// let q = lnglat_to_tile_local(0.0, 0.0, 4096, 0, 0, 0);
/// assert_eq!((q.x, q.y), (2048, 2048));
/// ```
pub fn lnglat_to_tile_local(
    lng: f64,
    lat: f64,
    extent: u32,
    z: u32,
    tile_x: u32,
    tile_y: u32,
) -> Coord<i64> {
    let lng = (lng + 180.0) % 360.0;
    let lat = lat.clamp(-89.9, 89.9);

    let world = f64::from(extent) * 2f64.powi(z as i32);
    let lat_rad = lat.to_radians();
    let zl_x = (lng / (360.0 / world)).floor() as i64;
    let zl_y = ((world / 2.0) * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI)).floor()
        as i64;

    let extent = i64::from(extent);
    let origin_tile_x = zl_x / extent;
    let origin_tile_y = zl_y / extent;
    let origin_x = zl_x % extent;
    let origin_y = zl_y % extent;

    Coord {
        x: origin_x - (i64::from(tile_x) - origin_tile_x) * extent,
        y: origin_y - (i64::from(tile_y) - origin_tile_y) * extent,
    }
}

/// Convert a tile-local point back to longitude/latitude.
pub fn tile_local_to_lnglat(
    extent: u32,
    z: u32,
    tile_x: u32,
    tile_y: u32,
    cx: i64,
    cy: i64,
) -> Point<f64> {
    let size = f64::from(extent) * 2f64.powi(z as i32);
    let x0 = f64::from(extent) * f64::from(tile_x);
    let y0 = f64::from(extent) * f64::from(tile_y);

    let lng = (cx as f64 + x0) * 360.0 / size - 180.0;
    let merc_y = 180.0 - (cy as f64 + y0) * 360.0 / size;
    let lat = 360.0 / PI * (merc_y * PI / 180.0).exp().atan() - 90.0;

    Point::new(lng, lat)
}

/// Equirectangular distance ruler in meters.
///
/// A local-linear approximation of geographic distance on the WGS-84
/// ellipsoid, accurate near the latitude it was initialised with. Query
/// point and feature are never more than one tile buffer apart, which keeps
/// the approximation error negligible while avoiding the trig of haversine
/// on every candidate.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use tilequery::project::CheapRuler;
///
/// let ruler = CheapRuler::new(0.0);
/// let d = ruler.distance(&Point::new(0.0, 0.0), &Point::new(0.0, 1.0));
/// assert!((d - 110_574.0).abs() < 50.0); // one degree of latitude
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CheapRuler {
    kx: f64,
    ky: f64,
}

impl CheapRuler {
    /// Build a ruler for distances near `latitude`.
    pub fn new(latitude: f64) -> Self {
        // WGS84 ellipsoid
        const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
        const FLATTENING: f64 = 1.0 / 298.257223563;

        let e2 = FLATTENING * (2.0 - FLATTENING);
        let mul = PI / 180.0 * EQUATORIAL_RADIUS_KM * 1000.0;

        let coslat = latitude.to_radians().cos();
        let w2 = 1.0 / (1.0 - e2 * (1.0 - coslat * coslat));
        let w = w2.sqrt();

        Self {
            kx: mul * w * coslat,
            ky: mul * w * w2 * (1.0 - e2),
        }
    }

    /// Approximate ground distance between two positions, in meters.
    pub fn distance(&self, a: &Point<f64>, b: &Point<f64>) -> f64 {
        let dx = wrap_degrees(a.x() - b.x()) * self.kx;
        let dy = (a.y() - b.y()) * self.ky;
        dx.hypot(dy)
    }
}

/// Wrap a longitude difference into [-180, 180].
fn wrap_degrees(delta: f64) -> f64 {
    delta - 360.0 * (delta / 360.0).round()
}
