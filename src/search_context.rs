//! A best-first search in the style of
//! [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html),
//! split into single expansions so that callers can observe the frontier as it evolves.
//! Entries with equal priority leave the frontier in insertion order, which makes every
//! search fully reproducible.
use fxhash::FxBuildHasher;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

struct SmallestCostHolder<K> {
    estimated_cost: K,
    sequence: u64,
    cost: K,
    index: usize,
}

impl<K: PartialEq> Eq for SmallestCostHolder<K> {}

impl<K: PartialEq> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.sequence == other.sequence
    }
}

impl<K: Ord> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest estimate first, then the entry that was pushed first
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            s => s,
        }
    }
}

/// Per-node bookkeeping of one search.
#[derive(Clone, Debug)]
pub struct SearchNode<C> {
    /// Index of the predecessor in the parents map, `usize::MAX` for the start.
    pub parent: usize,
    /// Best known cost from the start.
    pub cost: C,
    /// Heuristic estimate towards the goal, computed once when the node is discovered.
    pub estimate: C,
    /// Set once the node has been expanded; its cost is final from then on.
    pub closed: bool,
}

/// Frontier changes reported while stepping.
#[derive(Clone, Debug, PartialEq)]
pub enum Progress<'n, N, C> {
    /// The node entered the frontier, or re-entered it with a lower cost.
    Discovered { node: &'n N, cost: C },
    /// The node left the frontier and its cost is final.
    Expanded { node: &'n N, cost: C },
}

/// Result of a single call to [SearchContext::step].
#[derive(Clone, Debug, PartialEq)]
pub enum Step<N, C> {
    /// A node was expanded, the search goes on.
    Expanded,
    /// The goal was expanded; the path runs from start to goal inclusive.
    Found { path: Vec<N>, cost: C },
    /// The frontier ran empty.
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct SearchContext<N, C> {
    to_see: BinaryHeap<SmallestCostHolder<C>>,
    pub parents: FxIndexMap<N, SearchNode<C>>,
    sequence: u64,
    expanded: usize,
}

impl<C: Clone> Clone for SmallestCostHolder<C> {
    fn clone(&self) -> Self {
        SmallestCostHolder {
            estimated_cost: self.estimated_cost.clone(),
            sequence: self.sequence,
            cost: self.cost.clone(),
            index: self.index,
        }
    }
}

impl<C> core::fmt::Debug for SmallestCostHolder<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}@{}", self.index, self.sequence)
    }
}

impl<N, C> Default for SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

fn reverse_path<N, C>(parents: &FxIndexMap<N, SearchNode<C>>, start: usize) -> Vec<N>
where
    N: Eq + Hash + Clone,
{
    let mut i = start;
    let mut path: Vec<N> = std::iter::from_fn(|| {
        parents.get_index(i).map(|(node, value)| {
            i = value.parent;
            node.clone()
        })
    })
    .collect();
    path.reverse();
    path
}

impl<N, C> SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
{
    pub fn new() -> Self {
        SearchContext {
            to_see: BinaryHeap::new(),
            parents: FxIndexMap::default(),
            sequence: 0,
            expanded: 0,
        }
    }

    /// Forgets any previous search and seeds the frontier with `start` at zero cost.
    pub fn reset(&mut self, start: &N, start_estimate: C) {
        self.to_see.clear();
        self.parents.clear();
        self.sequence = 0;
        self.expanded = 0;
        self.parents.insert(
            start.clone(),
            SearchNode {
                parent: usize::MAX,
                cost: Zero::zero(),
                estimate: start_estimate,
                closed: false,
            },
        );
        self.push(start_estimate, Zero::zero(), 0);
    }

    /// Number of nodes expanded so far, i.e. the size of the explored set.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Number of entries on the frontier, stale ones included.
    pub fn frontier_len(&self) -> usize {
        self.to_see.len()
    }

    fn push(&mut self, estimated_cost: C, cost: C, index: usize) {
        self.to_see.push(SmallestCostHolder {
            estimated_cost,
            sequence: self.sequence,
            cost,
            index,
        });
        self.sequence += 1;
    }

    /// Expands the next node of the frontier. Stale entries, left behind when a cheaper way to
    /// a node was found, are skipped, so each node is expanded at most once.
    pub fn step<FN, IN, FH, FS, FP>(
        &mut self,
        mut successors: FN,
        mut heuristic: FH,
        mut success: FS,
        mut progress: FP,
    ) -> Step<N, C>
    where
        FN: FnMut(&N) -> IN,
        IN: IntoIterator<Item = (N, C)>,
        FH: FnMut(&N) -> C,
        FS: FnMut(&N) -> bool,
        FP: FnMut(Progress<'_, N, C>),
    {
        while let Some(SmallestCostHolder { cost, index, .. }) = self.to_see.pop() {
            let node = {
                let Some((node, entry)) = self.parents.get_index_mut(index) else {
                    continue;
                };
                // We may have inserted a node several times into the binary heap if we found
                // a better way to access it. Ensure that we are currently dealing with the
                // best path and discard the others.
                if entry.closed || cost > entry.cost {
                    continue;
                }
                entry.closed = true;
                node.clone()
            };
            self.expanded += 1;
            progress(Progress::Expanded { node: &node, cost });
            if success(&node) {
                let path = reverse_path(&self.parents, index);
                return Step::Found { path, cost };
            }
            for (successor, move_cost) in successors(&node) {
                let new_cost = cost + move_cost;
                let h; // heuristic(&successor)
                let n; // index for successor
                match self.parents.entry(successor) {
                    Vacant(e) => {
                        h = heuristic(e.key());
                        n = e.index();
                        e.insert(SearchNode {
                            parent: index,
                            cost: new_cost,
                            estimate: h,
                            closed: false,
                        });
                    }
                    Occupied(mut e) => {
                        n = e.index();
                        let entry = e.get_mut();
                        if entry.closed || entry.cost <= new_cost {
                            continue;
                        }
                        h = entry.estimate;
                        entry.parent = index;
                        entry.cost = new_cost;
                    }
                }
                if let Some((discovered, _)) = self.parents.get_index(n) {
                    progress(Progress::Discovered {
                        node: discovered,
                        cost: new_cost,
                    });
                }
                self.push(new_cost + h, new_cost, n);
            }
            return Step::Expanded;
        }
        Step::Exhausted
    }
}
