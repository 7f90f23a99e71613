//! Greedy vertex pruning by least residual increase.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use super::topology::{Chain, RayTable};
use crate::geometry::Segment;
use crate::math::Point2;
use crate::operations::intersect::IntersectOptions;

new_key_type! {
    struct NodeId;
}

#[derive(Debug, Clone, Copy)]
struct Node {
    pos: usize,
    chain: usize,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    stamp: u32,
}

#[derive(Debug)]
struct ChainState {
    head: NodeId,
    len: usize,
    closed: bool,
    alive: bool,
}

impl ChainState {
    /// Below this many vertices the chain reflects nothing useful.
    fn min_len(&self) -> usize {
        if self.closed {
            3
        } else {
            2
        }
    }
}

/// Outcome of [`Pruner::run`].
#[derive(Debug)]
pub(crate) struct Pruned {
    pub chains: Vec<Chain>,
    pub removed: usize,
}

/// Linked vertex chains over a ray table, with a lazily invalidated queue of
/// removal costs.
///
/// The cost of removing a vertex is the change in summed squared residual of
/// the rays between its neighbours. A chain at its minimum size is removed
/// whole, which charges every ray it accounted for as unreflected.
pub(crate) struct Pruner<'a> {
    rays: &'a RayTable,
    penalty: f64,
    intersect: IntersectOptions,
    nodes: SlotMap<NodeId, Node>,
    chains: Vec<ChainState>,
    heap: BinaryHeap<Candidate>,
    vertex_count: usize,
}

impl<'a> Pruner<'a> {
    /// Links `chains` and queues the removal cost of every vertex.
    pub fn new(
        rays: &'a RayTable,
        chains: &[Chain],
        penalty: f64,
        intersect: IntersectOptions,
    ) -> Self {
        let mut pruner = Self {
            rays,
            penalty,
            intersect,
            nodes: SlotMap::with_key(),
            chains: Vec::with_capacity(chains.len()),
            heap: BinaryHeap::new(),
            vertex_count: 0,
        };
        for chain in chains.iter().filter(|c| !c.positions.is_empty()) {
            pruner.link(chain);
        }
        let ids: Vec<NodeId> = pruner.nodes.keys().collect();
        for id in ids {
            pruner.enqueue(id);
        }
        pruner
    }

    fn link(&mut self, chain: &Chain) {
        let index = self.chains.len();
        let ids: Vec<NodeId> = chain
            .positions
            .iter()
            .map(|&pos| {
                self.nodes.insert(Node {
                    pos,
                    chain: index,
                    prev: None,
                    next: None,
                    stamp: 0,
                })
            })
            .collect();
        let m = ids.len();
        for (k, &id) in ids.iter().enumerate() {
            let node = &mut self.nodes[id];
            if k > 0 {
                node.prev = Some(ids[k - 1]);
            } else if chain.closed {
                node.prev = Some(ids[m - 1]);
            }
            if k + 1 < m {
                node.next = Some(ids[k + 1]);
            } else if chain.closed {
                node.next = Some(ids[0]);
            }
        }
        self.chains.push(ChainState {
            head: ids[0],
            len: m,
            closed: chain.closed,
            alive: true,
        });
        self.vertex_count += m;
    }

    /// Number of vertices still linked.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Removes the cheapest vertex until at most `target` vertices remain or
    /// the cheapest removal costs more than `max_error`.
    pub fn run(mut self, target: usize, max_error: f64) -> Pruned {
        let mut removed = 0;
        while self.vertex_count > target {
            let Some(candidate) = self.pop_current() else {
                break;
            };
            if candidate.cost.is_nan() || candidate.cost > max_error {
                break;
            }
            let count = self.remove(candidate.node);
            removed += count;
            trace!(
                position = candidate.pos,
                cost = candidate.cost,
                count,
                "pruned vertex"
            );
        }
        Pruned {
            chains: self.chains_out(),
            removed,
        }
    }

    fn point(&self, id: NodeId) -> Point2 {
        self.rays.endpoint[self.nodes[id].pos]
    }

    fn segment(&self, a: NodeId, b: NodeId) -> Segment {
        Segment::new(self.point(a), self.point(b))
    }

    /// Node ids of a chain, starting at its head.
    fn walk(&self, chain: usize) -> Vec<NodeId> {
        let state = &self.chains[chain];
        let mut ids = Vec::with_capacity(state.len);
        let mut cursor = Some(state.head);
        while let Some(id) = cursor {
            if ids.len() == state.len {
                break;
            }
            ids.push(id);
            cursor = self.nodes.get(id).and_then(|n| n.next);
        }
        ids
    }

    /// Residual change over `positions` when `before` is replaced by `after`.
    fn delta(
        &self,
        positions: impl Iterator<Item = usize>,
        before: &[Segment],
        after: &[Segment],
    ) -> f64 {
        positions
            .map(|pos| {
                let old = self.rays.cast(pos, before, &self.intersect);
                let new = self.rays.cast(pos, after, &self.intersect);
                self.rays.residual(pos, new, self.penalty)
                    - self.rays.residual(pos, old, self.penalty)
            })
            .sum()
    }

    fn cost(&self, id: NodeId) -> f64 {
        let node = self.nodes[id];
        let state = &self.chains[node.chain];
        if state.len <= state.min_len() {
            return self.drop_cost(node.chain);
        }
        match (node.prev, node.next) {
            (Some(p), Some(q)) => {
                let (pp, qp) = (self.nodes[p].pos, self.nodes[q].pos);
                let before = [self.segment(p, id), self.segment(id, q)];
                let after = [self.segment(p, q)];
                self.delta(self.rays.between(pp, qp), &before, &after)
            }
            (None, Some(q)) => {
                let window = std::iter::once(node.pos)
                    .chain(self.rays.between(node.pos, self.nodes[q].pos));
                self.delta(window, &[self.segment(id, q)], &[])
            }
            (Some(p), None) => {
                let window = self
                    .rays
                    .between(self.nodes[p].pos, node.pos)
                    .chain(std::iter::once(node.pos));
                self.delta(window, &[self.segment(p, id)], &[])
            }
            (None, None) => 0.0,
        }
    }

    /// Cost of removing a chain outright.
    fn drop_cost(&self, chain: usize) -> f64 {
        let ids = self.walk(chain);
        let closed = self.chains[chain].closed;
        let mut segments: Vec<Segment> =
            ids.windows(2).map(|w| self.segment(w[0], w[1])).collect();
        if closed && ids.len() >= 3 {
            segments.push(self.segment(ids[ids.len() - 1], ids[0]));
        }
        let owned = Chain {
            positions: ids.iter().map(|&id| self.nodes[id].pos).collect(),
            closed,
        }
        .owned_positions(self.rays);
        self.delta(owned.into_iter(), &segments, &[])
    }

    fn enqueue(&mut self, id: NodeId) {
        let cost = self.cost(id);
        let node = &mut self.nodes[id];
        node.stamp += 1;
        self.heap.push(Candidate {
            cost,
            pos: node.pos,
            node: id,
            stamp: node.stamp,
        });
    }

    fn pop_current(&mut self) -> Option<Candidate> {
        while let Some(c) = self.heap.pop() {
            if self.nodes.get(c.node).is_some_and(|n| n.stamp == c.stamp) {
                return Some(c);
            }
        }
        None
    }

    /// Removes a vertex, or its whole chain at minimum size. Returns the
    /// number of vertices removed.
    fn remove(&mut self, id: NodeId) -> usize {
        let node = self.nodes[id];
        let chain = node.chain;
        let state = &self.chains[chain];
        if state.len <= state.min_len() {
            let ids = self.walk(chain);
            for &v in &ids {
                self.nodes.remove(v);
            }
            self.chains[chain].alive = false;
            self.vertex_count -= ids.len();
            return ids.len();
        }

        if let Some(p) = node.prev {
            self.nodes[p].next = node.next;
        }
        if let Some(q) = node.next {
            self.nodes[q].prev = node.prev;
        }
        self.nodes.remove(id);
        let state = &mut self.chains[chain];
        if state.head == id {
            if let Some(q) = node.next {
                state.head = q;
            }
        }
        state.len -= 1;
        self.vertex_count -= 1;

        // Small chains are one removal away from being dropped, which
        // changes every vertex's cost.
        let requeue = if state.len <= 4 {
            self.walk(chain)
        } else {
            node.prev.into_iter().chain(node.next).collect()
        };
        for v in requeue {
            self.enqueue(v);
        }
        1
    }

    fn chains_out(&self) -> Vec<Chain> {
        (0..self.chains.len())
            .filter(|&c| self.chains[c].alive)
            .map(|c| Chain {
                positions: self.walk(c).iter().map(|&id| self.nodes[id].pos).collect(),
                closed: self.chains[c].closed,
            })
            .collect()
    }
}

/// Heap entry; stale once `stamp` falls behind the node's current stamp.
struct Candidate {
    cost: f64,
    pos: usize,
    node: NodeId,
    stamp: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so the max-heap yields the lowest cost, then lowest position.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scan::{Pose2, RangeInterval, Scan};

    /// Rays from the origin to the wall `x = 4`, at evenly spaced angles.
    fn wall_rays(n: u32) -> RayTable {
        let azimuth: Vec<f64> = (0..n)
            .map(|k| -0.6 + 1.2 * f64::from(k) / f64::from(n - 1))
            .collect();
        let radius = azimuth.iter().map(|a| 4.0 / a.cos()).collect();
        let scan = Scan::new(
            azimuth,
            radius,
            Pose2::identity(),
            RangeInterval::unbounded(),
        )
        .unwrap();
        RayTable::new(&scan)
    }

    fn open(n: usize) -> Chain {
        Chain {
            positions: (0..n).collect(),
            closed: false,
        }
    }

    #[test]
    fn collinear_vertices_cost_nothing() {
        let rays = wall_rays(9);
        let pruned = Pruner::new(&rays, &[open(9)], 1.0, IntersectOptions::default())
            .run(2, 1e-9);
        assert_eq!(pruned.removed, 7);
        assert_eq!(
            pruned.chains,
            vec![Chain {
                positions: vec![0, 8],
                closed: false,
            }]
        );
    }

    #[test]
    fn max_error_stops_pruning() {
        let rays = wall_rays(9);
        // Every interior vertex is free, but removing an endpoint leaves
        // rays unreflected.
        let pruned = Pruner::new(&rays, &[open(9)], 1.0, IntersectOptions::default())
            .run(0, 0.5);
        assert_eq!(pruned.removed, 7);
        assert_eq!(pruned.chains[0].positions.len(), 2);
    }

    #[test]
    fn dropping_a_chain_counts_all_its_vertices() {
        let rays = wall_rays(9);
        let pruner = Pruner::new(&rays, &[open(9)], 1.0, IntersectOptions::default());
        assert_eq!(pruner.vertex_count(), 9);
        let pruned = pruner.run(0, f64::INFINITY);
        assert_eq!(pruned.removed, 9);
        assert!(pruned.chains.is_empty());
    }

    #[test]
    fn single_vertex_chains_go_first() {
        let rays = wall_rays(9);
        let chains = [
            Chain {
                positions: vec![0],
                closed: false,
            },
            Chain {
                positions: vec![2, 8],
                closed: false,
            },
        ];
        let pruned = Pruner::new(&rays, &chains, 1.0, IntersectOptions::default())
            .run(2, f64::INFINITY);
        assert_eq!(pruned.removed, 1);
        assert_eq!(pruned.chains, vec![chains[1].clone()]);
    }
}
