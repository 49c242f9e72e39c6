use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::{BuildHasherDefault, Hash};

use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::{FxHashSet, FxHasher};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

type Cost = f64;

/// Sentinel parent of the starting node.
const NO_PARENT: usize = usize::MAX;

#[derive(Debug)]
struct SmallestHolder {
    cost: Cost,
    /// Order of insertion into the frontier, equal costs
    /// are popped in the order they were pushed.
    sequence: usize,
    index: usize,
}

impl PartialEq for SmallestHolder {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SmallestHolder {}

impl PartialOrd for SmallestHolder {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestHolder {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct Parent<S> {
    parent: usize,
    cost: Cost,
    state: S,
}

/// Struct returned by [`Dijkstra::reach`].
pub struct DijkstraReachable<N, S, FN> {
    to_see: BinaryHeap<SmallestHolder>,
    seen: FxHashSet<usize>,
    parents: FxIndexMap<N, Parent<S>>,
    sequence: usize,
    successors: FN,
}

/// Information about a node reached by [`Dijkstra::reach`].
#[derive(Debug, PartialEq, Clone)]
pub struct DijkstraReachableItem<N, S> {
    /// The node that was reached.
    pub node: N,
    /// The previous node that the current node came from.
    /// If the node is the first node, there will be no parent.
    pub parent: Option<N>,
    /// The total cost from the starting node.
    pub total_cost: Cost,
    /// The state the node was reached with.
    pub state: S,
    index: usize,
}

impl<N, S, FN, IN> Iterator for DijkstraReachable<N, S, FN>
where
    N: Copy + Eq + Hash,
    S: Clone,
    FN: FnMut(&N, &S) -> IN,
    IN: IntoIterator<Item = (N, Cost, S)>,
{
    type Item = DijkstraReachableItem<N, S>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(SmallestHolder { cost, index, .. }) = self.to_see.pop() {
            if !self.seen.insert(index) {
                continue;
            }

            let (item, successors) = {
                let (node, entry) = self.parents.get_index(index)?;
                let item = DijkstraReachableItem {
                    node: *node,
                    parent: self.parents.get_index(entry.parent).map(|(node, _)| *node),
                    total_cost: entry.cost,
                    state: entry.state.clone(),
                    index,
                };

                let successors = (self.successors)(node, &entry.state);
                (item, successors)
            };

            for (successor, move_cost, state) in successors {
                let new_cost = cost + move_cost;

                let index = match self.parents.entry(successor) {
                    Entry::Vacant(e) => {
                        let n = e.index();
                        e.insert(Parent {
                            parent: index,
                            cost: new_cost,
                            state,
                        });
                        n
                    }
                    Entry::Occupied(mut e) => {
                        if e.get().cost > new_cost && !self.seen.contains(&e.index()) {
                            e.insert(Parent {
                                parent: index,
                                cost: new_cost,
                                state,
                            });
                            e.index()
                        } else {
                            continue;
                        }
                    }
                };

                self.sequence += 1;
                self.to_see.push(SmallestHolder {
                    cost: new_cost,
                    sequence: self.sequence,
                    index,
                });
            }

            return Some(item);
        }

        None
    }
}

impl<N, S, FN> DijkstraReachable<N, S, FN>
where
    N: Copy + Eq + Hash,
    S: Clone,
{
    /// Reconstructs the path from the starting node to the reached
    /// item, as the sequence of nodes and the state each was reached with.
    pub fn path_to(&self, item: &DijkstraReachableItem<N, S>) -> Vec<(N, S)> {
        let mut path = vec![];
        let mut index = item.index;

        while let Some((node, entry)) = self.parents.get_index(index) {
            path.push((*node, entry.state.clone()));
            index = entry.parent;
        }

        path.reverse();
        path
    }
}

pub struct Dijkstra;

impl Dijkstra {
    /// Visit all nodes that are reachable from a start node. The node
    /// will be visited in order of cost, with the closest nodes first.
    ///
    /// Every node carries a state, assigned by the edge it was reached
    /// through, which is supplied alongside the node to `successors`.
    /// This allows the cost of leaving a node to depend on how it was entered.
    ///
    /// The `successors` function receives the current node and its state,
    /// and returns an iterator of successors associated with their move
    /// cost and the state they are entered with.
    pub fn reach<N, S, FN, IN>(
        &self,
        start: N,
        state: S,
        successors: FN,
    ) -> DijkstraReachable<N, S, FN>
    where
        N: Copy + Eq + Hash,
        S: Clone,
        FN: FnMut(&N, &S) -> IN,
        IN: IntoIterator<Item = (N, Cost, S)>,
    {
        let mut to_see: BinaryHeap<SmallestHolder> = BinaryHeap::with_capacity(256);
        to_see.push(SmallestHolder {
            cost: 0.0,
            sequence: 0,
            index: 0,
        });

        let mut parents: FxIndexMap<N, Parent<S>> =
            FxIndexMap::with_capacity_and_hasher(64, BuildHasherDefault::<FxHasher>::default());

        parents.insert(
            start,
            Parent {
                parent: NO_PARENT,
                cost: 0.0,
                state,
            },
        );

        DijkstraReachable {
            to_see,
            seen: FxHashSet::default(),
            parents,
            sequence: 0,
            successors,
        }
    }
}
