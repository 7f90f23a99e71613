use serde::{Deserialize, Serialize};

use super::element::{Element, Segment};
use crate::math::Point2;

/// An ordered collection of polylines and polygons.
///
/// Aggregate vertex and segment views concatenate each element's view in
/// collection order. The map owns its vertex storage outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineMap {
    elements: Vec<Element>,
}

impl LineMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map from `elements`, keeping their order.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Appends an element.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Returns the elements in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Returns the elements for in-place editing.
    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    /// Consumes the map and returns its elements.
    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the map has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of vertices over all elements.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.elements.iter().map(Element::vertex_count).sum()
    }

    /// Total number of edges over all elements.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.elements.iter().map(Element::segment_count).sum()
    }

    /// Returns every vertex, element by element.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point2> {
        self.elements
            .iter()
            .flat_map(|e| e.vertices().iter().copied())
            .collect()
    }

    /// Returns every edge, element by element.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.elements.iter().flat_map(Element::segments).collect()
    }

    /// Drops elements with too few vertices for their variant.
    ///
    /// Returns the number of elements removed.
    pub fn retain_valid(&mut self) -> usize {
        let before = self.elements.len();
        self.elements.retain(Element::is_valid);
        before - self.elements.len()
    }
}

impl From<Element> for LineMap {
    fn from(element: Element) -> Self {
        Self {
            elements: vec![element],
        }
    }
}

impl FromIterator<Element> for LineMap {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LineMap {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
