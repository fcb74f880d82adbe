//! Closest-point-on-geometry in tile coordinates.

use geo::{Coord, Geometry, LineString, Polygon};

/// The nearest point of a geometry to a query point, in tile units.
///
/// `distance` is zero when the query point lies on or inside the geometry.
/// A negative distance never comes out of a well-formed geometry; the
/// variants this kernel does not handle produce one, and the driver skips
/// the feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClosestPoint {
    pub x: i64,
    pub y: i64,
    pub distance: f64,
}

const NOT_FOUND: ClosestPoint = ClosestPoint {
    x: 0,
    y: 0,
    distance: -1.0,
};

pub(crate) fn closest_point(geometry: &Geometry<i64>, query: Coord<i64>) -> ClosestPoint {
    match geometry {
        Geometry::Point(p) => to_point(p.0, query),
        Geometry::MultiPoint(mp) => mp
            .0
            .iter()
            .map(|p| to_point(p.0, query))
            .fold(NOT_FOUND, nearer),
        Geometry::LineString(ls) => to_line_string(ls, query),
        Geometry::MultiLineString(mls) => mls
            .0
            .iter()
            .map(|ls| to_line_string(ls, query))
            .fold(NOT_FOUND, nearer),
        Geometry::Polygon(poly) => to_polygon(poly, query),
        Geometry::MultiPolygon(mp) => {
            let mut best = NOT_FOUND;
            for poly in &mp.0 {
                let cp = to_polygon(poly, query);
                if cp.distance == 0.0 {
                    return cp;
                }
                best = nearer(best, cp);
            }
            best
        }
        // never produced by the decoder
        _ => NOT_FOUND,
    }
}

/// Pick the nearer of two candidates, treating negatives as "no result".
fn nearer(best: ClosestPoint, candidate: ClosestPoint) -> ClosestPoint {
    if candidate.distance < 0.0 {
        return best;
    }
    if best.distance < 0.0 || candidate.distance < best.distance {
        candidate
    } else {
        best
    }
}

fn to_point(p: Coord<i64>, query: Coord<i64>) -> ClosestPoint {
    let dx = (query.x - p.x) as f64;
    let dy = (query.y - p.y) as f64;
    ClosestPoint {
        x: p.x,
        y: p.y,
        distance: dx.hypot(dy),
    }
}

fn to_line_string(line: &LineString<i64>, query: Coord<i64>) -> ClosestPoint {
    let mut best = NOT_FOUND;
    for segment in line.lines() {
        best = nearer(best, to_segment(segment.start, segment.end, query));
    }
    if best.distance < 0.0 {
        // degenerate single-point line
        if let Some(p) = line.0.first() {
            best = to_point(*p, query);
        }
    }
    best
}

/// Project the query onto a segment, clamped to its endpoints.
fn to_segment(a: Coord<i64>, b: Coord<i64>, query: Coord<i64>) -> ClosestPoint {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (qx, qy) = (query.x as f64, query.y as f64);

    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((qx - ax) * dx + (qy - ay) * dy) / len2).clamp(0.0, 1.0)
    };

    let px = ax + t * dx;
    let py = ay + t * dy;
    ClosestPoint {
        x: px.round() as i64,
        y: py.round() as i64,
        distance: (qx - px).hypot(qy - py),
    }
}

/// Inside (even-odd over every ring) means the query itself with distance
/// zero; outside means the nearest point on any ring boundary.
fn to_polygon(polygon: &Polygon<i64>, query: Coord<i64>) -> ClosestPoint {
    let mut best = NOT_FOUND;
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        best = nearer(best, to_line_string(ring, query));
    }

    if best.distance != 0.0 && contains(polygon, query) {
        return ClosestPoint {
            x: query.x,
            y: query.y,
            distance: 0.0,
        };
    }
    best
}

/// Even-odd ray cast across all rings; hole parity falls out of counting
/// crossings against inner rings too.
fn contains(polygon: &Polygon<i64>, query: Coord<i64>) -> bool {
    let (qx, qy) = (query.x as f64, query.y as f64);
    let mut inside = false;

    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        for segment in ring.lines() {
            let (x1, y1) = (segment.start.x as f64, segment.start.y as f64);
            let (x2, y2) = (segment.end.x as f64, segment.end.y as f64);
            if (y1 > qy) != (y2 > qy) && qx < (x2 - x1) * (qy - y1) / (y2 - y1) + x1 {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiLineString, MultiPoint, MultiPolygon, Point};

    fn square(x0: i64, y0: i64, size: i64) -> Polygon<i64> {
        // clockwise in Y-down coordinates, closed
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_point() {
        let geom = Geometry::Point(Point::new(3, 4));
        let cp = closest_point(&geom, Coord { x: 0, y: 0 });
        assert_eq!((cp.x, cp.y), (3, 4));
        assert!((cp.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_multi_point_takes_minimum() {
        let geom = Geometry::MultiPoint(MultiPoint::new(vec![
            Point::new(100, 100),
            Point::new(3, 4),
            Point::new(-50, 0),
        ]));
        let cp = closest_point(&geom, Coord { x: 0, y: 0 });
        assert_eq!((cp.x, cp.y), (3, 4));
        assert!((cp.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_projection_is_clamped() {
        let geom = Geometry::LineString(LineString::from(vec![(0, 0), (10, 0)]));

        // perpendicular foot inside the segment
        let cp = closest_point(&geom, Coord { x: 5, y: 7 });
        assert_eq!((cp.x, cp.y), (5, 0));
        assert!((cp.distance - 7.0).abs() < 1e-12);

        // beyond the end clamps to the endpoint
        let cp = closest_point(&geom, Coord { x: 14, y: 3 });
        assert_eq!((cp.x, cp.y), (10, 0));
        assert!((cp.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_query_on_line_is_a_direct_hit() {
        let geom = Geometry::LineString(LineString::from(vec![(0, 0), (10, 0)]));
        let cp = closest_point(&geom, Coord { x: 4, y: 0 });
        assert_eq!(cp.distance, 0.0);
    }

    #[test]
    fn test_multi_line_string() {
        let geom = Geometry::MultiLineString(MultiLineString::new(vec![
            LineString::from(vec![(0, 100), (10, 100)]),
            LineString::from(vec![(0, 2), (10, 2)]),
        ]));
        let cp = closest_point(&geom, Coord { x: 5, y: 0 });
        assert_eq!((cp.x, cp.y), (5, 2));
        assert!((cp.distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_inside_polygon_returns_query_at_zero() {
        let geom = Geometry::Polygon(square(0, 0, 10));
        let cp = closest_point(&geom, Coord { x: 4, y: 6 });
        assert_eq!((cp.x, cp.y), (4, 6));
        assert_eq!(cp.distance, 0.0);
    }

    #[test]
    fn test_on_polygon_edge_is_zero() {
        let geom = Geometry::Polygon(square(0, 0, 10));
        let cp = closest_point(&geom, Coord { x: 10, y: 5 });
        assert_eq!(cp.distance, 0.0);
    }

    #[test]
    fn test_outside_polygon_hits_boundary() {
        let geom = Geometry::Polygon(square(0, 0, 10));
        let cp = closest_point(&geom, Coord { x: 15, y: 5 });
        assert_eq!((cp.x, cp.y), (10, 5));
        assert!((cp.distance - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_query_in_hole_is_outside() {
        let outer = LineString::from(vec![(0, 0), (20, 0), (20, 20), (0, 20), (0, 0)]);
        // counter-clockwise hole
        let hole = LineString::from(vec![(5, 5), (5, 15), (15, 15), (15, 5), (5, 5)]);
        let geom = Geometry::Polygon(Polygon::new(outer, vec![hole]));

        let cp = closest_point(&geom, Coord { x: 10, y: 10 });
        assert!(cp.distance > 0.0, "hole interior is not inside");
        assert_eq!(cp.distance, 5.0);

        // between outer and hole is inside
        let cp = closest_point(&geom, Coord { x: 2, y: 10 });
        assert_eq!(cp.distance, 0.0);
    }

    #[test]
    fn test_multi_polygon_short_circuits_on_hit() {
        let geom = Geometry::MultiPolygon(MultiPolygon::new(vec![
            square(100, 100, 10),
            square(0, 0, 10),
        ]));
        let cp = closest_point(&geom, Coord { x: 5, y: 5 });
        assert_eq!(cp.distance, 0.0);
        assert_eq!((cp.x, cp.y), (5, 5));
    }

    #[test]
    fn test_multi_polygon_minimum_when_outside_all() {
        let geom = Geometry::MultiPolygon(MultiPolygon::new(vec![
            square(100, 0, 10),
            square(20, 0, 10),
        ]));
        let cp = closest_point(&geom, Coord { x: 0, y: 5 });
        assert_eq!((cp.x, cp.y), (20, 5));
        assert_eq!(cp.distance, 20.0);
    }

    #[test]
    fn test_unsupported_variant_is_negative() {
        let geom = Geometry::Rect(geo::Rect::new(
            Coord { x: 0i64, y: 0 },
            Coord { x: 1, y: 1 },
        ));
        let cp = closest_point(&geom, Coord { x: 0, y: 0 });
        assert!(cp.distance < 0.0);
    }
}
