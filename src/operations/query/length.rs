use crate::geometry::LineMap;

/// Computes the total edge length of a map.
///
/// Polygons include their closing edge.
#[derive(Debug)]
pub struct MapLength<'a> {
    map: &'a LineMap,
}

impl<'a> MapLength<'a> {
    /// Creates a new `MapLength` query.
    #[must_use]
    pub fn new(map: &'a LineMap) -> Self {
        Self { map }
    }

    /// Executes the query, returning the summed edge length.
    #[must_use]
    pub fn execute(&self) -> f64 {
        self.map.iter().map(crate::geometry::Element::length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Element;
    use crate::math::Point2;

    #[test]
    fn line_length_3_4_5() {
        let map = LineMap::from(Element::Polyline(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
        ]));
        assert!((MapLength::new(&map).execute() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn polygon_includes_closing_edge() {
        let map = LineMap::from_elements(vec![
            Element::Polygon(vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ]),
            Element::Polyline(vec![Point2::new(5.0, 5.0)]),
        ]);
        assert!((MapLength::new(&map).execute() - 4.0).abs() < 1e-10);
    }
}
