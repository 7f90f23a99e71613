use crate::geometry::LineMap;

/// Computes the total area enclosed by the polygons of a map.
///
/// Each polygon contributes the absolute value of its shoelace area, so
/// winding direction does not matter. Polylines enclose nothing.
#[derive(Debug)]
pub struct MapArea<'a> {
    map: &'a LineMap,
}

impl<'a> MapArea<'a> {
    /// Creates a new `MapArea` query.
    #[must_use]
    pub fn new(map: &'a LineMap) -> Self {
        Self { map }
    }

    /// Executes the query, returning the enclosed area.
    #[must_use]
    pub fn execute(&self) -> f64 {
        self.map.iter().map(|e| e.signed_area().abs()).sum()
    }
}
