use slotmap::{new_key_type, SlotMap};

use crate::math::Point2;

new_key_type! {
    /// Key of a line record in a [`LineStore`].
    pub struct LineId;
}

/// One fitted line covering the closed point-index range `first..=last`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineRecord {
    pub first: usize,
    pub last: usize,
    /// Line geometry: the fitted line's points nearest to `first` and `last`.
    pub start: Point2,
    pub end: Point2,
}

impl LineRecord {
    /// Number of points covered, boundaries included.
    #[must_use]
    pub fn span(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Arena of line records plus their order along the scan.
///
/// Adjacent records share their boundary index, so records always tile the
/// covered index range without gaps.
#[derive(Debug, Default)]
pub struct LineStore {
    lines: SlotMap<LineId, LineRecord>,
    order: Vec<LineId>,
}

impl LineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record after the current last one.
    pub fn push(&mut self, record: LineRecord) -> LineId {
        let id = self.lines.insert(record);
        self.order.push(id);
        id
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Vertex count of the chain formed by the records.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if self.order.is_empty() {
            0
        } else {
            self.order.len() + 1
        }
    }

    /// Record at position `pos` in scan order.
    #[must_use]
    pub fn at(&self, pos: usize) -> Option<&LineRecord> {
        self.order.get(pos).and_then(|id| self.lines.get(*id))
    }

    /// Records in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &LineRecord> + '_ {
        self.order.iter().filter_map(|id| self.lines.get(*id))
    }

    /// Replaces the record at `pos` with `left` and `right`.
    pub fn split(&mut self, pos: usize, left: LineRecord, right: LineRecord) {
        let old = self.order[pos];
        self.lines.remove(old);
        let l = self.lines.insert(left);
        let r = self.lines.insert(right);
        self.order.splice(pos..=pos, [l, r]);
    }

    /// Replaces the records at `pos` and `pos + 1` with `merged`.
    pub fn merge(&mut self, pos: usize, merged: LineRecord) {
        for id in self.order.drain(pos..=pos + 1) {
            self.lines.remove(id);
        }
        let id = self.lines.insert(merged);
        self.order.insert(pos, id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rec(first: usize, last: usize) -> LineRecord {
        LineRecord {
            first,
            last,
            start: Point2::new(0.0, 0.0),
            end: Point2::new(1.0, 0.0),
        }
    }

    #[test]
    fn split_then_merge_restores_single_record() {
        let mut store = LineStore::new();
        store.push(rec(0, 10));
        store.split(0, rec(0, 4), rec(4, 10));
        assert_eq!(store.len(), 2);
        assert_eq!(store.vertex_count(), 3);
        assert_eq!(store.at(1).unwrap().first, 4);

        store.split(1, rec(4, 7), rec(7, 10));
        let ranges: Vec<(usize, usize)> = store.iter().map(|r| (r.first, r.last)).collect();
        assert_eq!(ranges, vec![(0, 4), (4, 7), (7, 10)]);

        store.merge(0, rec(0, 7));
        store.merge(0, rec(0, 10));
        assert_eq!(store.len(), 1);
        assert_eq!(store.at(0).unwrap().span(), 11);
    }

    #[test]
    fn empty_store() {
        let store = LineStore::new();
        assert!(store.is_empty());
        assert_eq!(store.vertex_count(), 0);
        assert!(store.at(0).is_none());
    }
}
