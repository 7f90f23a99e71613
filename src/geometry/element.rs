use serde::{Deserialize, Serialize};

use crate::error::{InputError, Result};
use crate::math::polygon_2d::{segment_direction, signed_area_2d};
use crate::math::{Point2, Vector2};

/// A straight edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit direction from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::ZeroVector` for a zero-length segment.
    pub fn direction(&self) -> Result<Vector2> {
        segment_direction(&self.start, &self.end)
    }
}

/// A vertex sequence in one of its two variants.
///
/// A polyline is open: its first and last vertex are not connected. A polygon
/// is closed: an implicit edge runs from the last vertex back to the first.
///
/// Serializes as `{"type": "polyline" | "polygon", "vertices": [[x, y], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "vertices", rename_all = "lowercase")]
pub enum Element {
    Polyline(Vec<Point2>),
    Polygon(Vec<Point2>),
}

impl Element {
    /// Minimum vertex count of a valid polyline.
    pub const MIN_POLYLINE_VERTICES: usize = 1;

    /// Minimum vertex count of a valid polygon.
    pub const MIN_POLYGON_VERTICES: usize = 3;

    /// Creates an open or closed element from `vertices`.
    #[must_use]
    pub fn new(vertices: Vec<Point2>, closed: bool) -> Self {
        if closed {
            Self::Polygon(vertices)
        } else {
            Self::Polyline(vertices)
        }
    }

    /// Returns the vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        match self {
            Self::Polyline(v) | Self::Polygon(v) => v,
        }
    }

    /// Returns the vertices for in-place editing.
    pub fn vertices_mut(&mut self) -> &mut Vec<Point2> {
        match self {
            Self::Polyline(v) | Self::Polygon(v) => v,
        }
    }

    /// Consumes the element and returns its vertices.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Point2> {
        match self {
            Self::Polyline(v) | Self::Polygon(v) => v,
        }
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Returns `true` for a polygon.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Polygon(_))
    }

    /// Whether the element has enough vertices for its variant.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let min = if self.is_closed() {
            Self::MIN_POLYGON_VERTICES
        } else {
            Self::MIN_POLYLINE_VERTICES
        };
        self.vertex_count() >= min
    }

    /// Returns the number of edges: `n - 1` for a polyline, `n` for a polygon.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let n = self.vertex_count();
        if n < 2 {
            return 0;
        }
        if self.is_closed() {
            n
        } else {
            n - 1
        }
    }

    /// Returns edge `i`, wrapping to the first vertex for a polygon's last edge.
    #[must_use]
    pub fn segment(&self, i: usize) -> Option<Segment> {
        if i >= self.segment_count() {
            return None;
        }
        let v = self.vertices();
        Some(Segment::new(v[i], v[(i + 1) % v.len()]))
    }

    /// Returns every edge in order.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        (0..self.segment_count())
            .filter_map(|i| self.segment(i))
            .collect()
    }

    /// Returns the length of every edge in order.
    #[must_use]
    pub fn edge_lengths(&self) -> Vec<f64> {
        self.segments().iter().map(Segment::length).collect()
    }

    /// Total edge length (perimeter for a polygon).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.edge_lengths().iter().sum()
    }

    /// Signed shoelace area; zero for polylines.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        if self.is_closed() {
            signed_area_2d(self.vertices())
        } else {
            0.0
        }
    }

    /// Removes vertex `i` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `InputError::IndexOutOfRange` if `i` is not a vertex index.
    pub fn remove_vertex(&mut self, i: usize) -> Result<Point2> {
        let len = self.vertex_count();
        if i >= len {
            return Err(InputError::IndexOutOfRange {
                what: "vertex",
                index: i,
                len,
            }
            .into());
        }
        Ok(self.vertices_mut().remove(i))
    }

    /// Returns a copy with vertices in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices().to_vec();
        vertices.reverse();
        Self::new(vertices, self.is_closed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pts() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 4.0),
        ]
    }

    #[test]
    fn polyline_segments_are_consecutive_pairs() {
        let e = Element::Polyline(pts());
        assert_eq!(e.segment_count(), 2);
        let segs = e.segments();
        assert_eq!(segs.len(), 2);
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.start, e.vertices()[i]);
            assert_eq!(s.end, e.vertices()[i + 1]);
        }
    }

    #[test]
    fn polygon_segments_wrap() {
        let e = Element::Polygon(pts());
        assert_eq!(e.segment_count(), 3); // 3 sides of triangle
        let last = e.segment(2).unwrap();
        assert_eq!(last.start, Point2::new(3.0, 4.0));
        assert_eq!(last.end, Point2::new(0.0, 0.0));
        assert!((e.length() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn segment_count_small() {
        assert_eq!(Element::Polyline(vec![]).segment_count(), 0);
        assert_eq!(Element::Polyline(vec![Point2::origin()]).segment_count(), 0);
        assert_eq!(Element::Polygon(vec![Point2::origin()]).segment_count(), 0);
    }

    #[test]
    fn validity_by_variant() {
        assert!(Element::Polyline(vec![Point2::origin()]).is_valid());
        assert!(!Element::Polyline(vec![]).is_valid());
        assert!(!Element::Polygon(pts()[..2].to_vec()).is_valid());
        assert!(Element::Polygon(pts()).is_valid());
    }

    #[test]
    fn edge_lengths_and_area() {
        let e = Element::Polygon(pts());
        let lengths = e.edge_lengths();
        assert!((lengths[0] - 3.0).abs() < 1e-12);
        assert!((lengths[1] - 4.0).abs() < 1e-12);
        assert!((lengths[2] - 5.0).abs() < 1e-12);
        assert!((e.signed_area() - 6.0).abs() < 1e-12);
        assert!(Element::Polyline(pts()).signed_area().abs() < 1e-12);
    }

    #[test]
    fn remove_vertex_bounds() {
        let mut e = Element::Polyline(pts());
        let removed = e.remove_vertex(1).unwrap();
        assert_eq!(removed, Point2::new(3.0, 0.0));
        assert_eq!(e.vertex_count(), 2);
        assert!(e.remove_vertex(5).is_err());
    }

    #[test]
    fn reversed_keeps_variant() {
        let e = Element::Polygon(pts()).reversed();
        assert!(e.is_closed());
        assert_eq!(e.vertices()[0], Point2::new(3.0, 4.0));
        assert!(e.signed_area() < 0.0);
    }

    #[test]
    fn segment_direction_of_zero_length_fails() {
        let s = Segment::new(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0));
        assert!(s.direction().is_err());
        let s = Segment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 2.0));
        let d = s.direction().unwrap();
        assert!((d.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_with_type_tag() {
        let e = Element::Polyline(vec![Point2::new(1.0, 2.0)]);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "polyline");
        assert_eq!(json["vertices"][0][0], 1.0);
        assert_eq!(json["vertices"][0][1], 2.0);
    }
}
