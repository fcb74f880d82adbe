//! MVT geometry command stream decoding.
//!
//! Materialises a feature's encoded commands into a planar
//! `geo::Geometry<i64>` in the tile's local pixel space. Y stays downward
//! end-to-end; no axis flip happens here or anywhere else in the crate.

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};

use crate::wire::GeomType;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

/// Decode a feature's command stream according to its geometry type tag.
///
/// Returns `None` for empty or malformed streams — truncated parameters,
/// unexpected commands, rings that never classify. The caller skips such
/// features; nothing at this level is an error for the whole query.
pub(crate) fn decode(kind: GeomType, commands: &[u32]) -> Option<Geometry<i64>> {
    match kind {
        GeomType::Point => decode_points(commands),
        GeomType::Linestring => decode_linestrings(commands),
        GeomType::Polygon => decode_polygons(commands),
        GeomType::Unknown => None,
    }
}

/// Walks a command stream, accumulating the implicit cursor.
struct Cursor<'a> {
    commands: &'a [u32],
    pos: usize,
    x: i64,
    y: i64,
}

impl<'a> Cursor<'a> {
    fn new(commands: &'a [u32]) -> Self {
        Self {
            commands,
            pos: 0,
            x: 0,
            y: 0,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.commands.len()
    }

    /// Whether `count` coordinate pairs can still be read. Checked before
    /// reserving capacity, so a forged count cannot trigger a huge
    /// allocation.
    fn has_points(&self, count: u32) -> bool {
        self.commands.len() - self.pos >= 2 * count as usize
    }

    fn next_command(&mut self) -> Option<(u32, u32)> {
        let raw = *self.commands.get(self.pos)?;
        self.pos += 1;
        Some((raw & 0x7, raw >> 3))
    }

    fn next_point(&mut self) -> Option<Coord<i64>> {
        let dx = zigzag(*self.commands.get(self.pos)?);
        let dy = zigzag(*self.commands.get(self.pos + 1)?);
        self.pos += 2;
        self.x += dx;
        self.y += dy;
        Some(Coord {
            x: self.x,
            y: self.y,
        })
    }
}

fn zigzag(param: u32) -> i64 {
    i64::from((param >> 1) as i32 ^ -((param & 1) as i32))
}

/// POINT: a single MoveTo carrying every point.
fn decode_points(commands: &[u32]) -> Option<Geometry<i64>> {
    let mut cursor = Cursor::new(commands);

    let (cmd, count) = cursor.next_command()?;
    if cmd != CMD_MOVE_TO || count == 0 || !cursor.has_points(count) {
        return None;
    }

    let mut points = Vec::with_capacity(count as usize);
    for _ in 0..count {
        points.push(Point::from(cursor.next_point()?));
    }
    if !cursor.done() {
        return None;
    }

    if points.len() == 1 {
        Some(Geometry::Point(points.remove(0)))
    } else {
        Some(Geometry::MultiPoint(MultiPoint::new(points)))
    }
}

/// LINESTRING: repeated MoveTo(1) + LineTo(n) pairs, one per sub-line.
fn decode_linestrings(commands: &[u32]) -> Option<Geometry<i64>> {
    let mut cursor = Cursor::new(commands);
    let mut lines: Vec<LineString<i64>> = Vec::new();

    while !cursor.done() {
        let (cmd, count) = cursor.next_command()?;
        if cmd != CMD_MOVE_TO || count != 1 {
            return None;
        }
        let start = cursor.next_point()?;

        let (cmd, count) = cursor.next_command()?;
        if cmd != CMD_LINE_TO || count == 0 || !cursor.has_points(count) {
            return None;
        }
        let mut points = Vec::with_capacity(count as usize + 1);
        points.push(start);
        for _ in 0..count {
            points.push(cursor.next_point()?);
        }
        lines.push(LineString::from(points));
    }

    match lines.len() {
        0 => None,
        1 => Some(Geometry::LineString(lines.remove(0))),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
    }
}

/// POLYGON: repeated MoveTo(1) + LineTo(n) + ClosePath rings, classified by
/// signed area. In the Y-down tile axis a positive shoelace sum marks an
/// outer ring, which starts a new polygon; a negative sum marks an inner
/// ring, appended to the most recent polygon. Zero-area rings and inner
/// rings with no polygon open are dropped.
fn decode_polygons(commands: &[u32]) -> Option<Geometry<i64>> {
    let mut cursor = Cursor::new(commands);
    let mut polygons: Vec<(LineString<i64>, Vec<LineString<i64>>)> = Vec::new();

    while !cursor.done() {
        let (cmd, count) = cursor.next_command()?;
        if cmd != CMD_MOVE_TO || count != 1 {
            return None;
        }
        let start = cursor.next_point()?;

        let (cmd, count) = cursor.next_command()?;
        if cmd != CMD_LINE_TO || count == 0 || !cursor.has_points(count) {
            return None;
        }
        let mut ring = Vec::with_capacity(count as usize + 2);
        ring.push(start);
        for _ in 0..count {
            ring.push(cursor.next_point()?);
        }

        let (cmd, count) = cursor.next_command()?;
        if cmd != CMD_CLOSE_PATH || count != 1 {
            return None;
        }

        let area2 = signed_area2(&ring);
        ring.push(ring[0]);
        if area2 > 0 {
            polygons.push((LineString::from(ring), Vec::new()));
        } else if area2 < 0 {
            if let Some((_, inners)) = polygons.last_mut() {
                inners.push(LineString::from(ring));
            }
        }
    }

    let mut polygons: Vec<Polygon<i64>> = polygons
        .into_iter()
        .map(|(outer, inners)| Polygon::new(outer, inners))
        .collect();

    match polygons.len() {
        0 => None,
        1 => Some(Geometry::Polygon(polygons.remove(0))),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

/// Twice the shoelace sum of an unclosed ring, wrapping around to the first
/// point.
fn signed_area2(ring: &[Coord<i64>]) -> i64 {
    let mut sum = 0i64;
    for i in 0..ring.len() {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % ring.len()];
        sum += p1.x * p2.y - p2.x * p1.y;
    }
    sum
}
