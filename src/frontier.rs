use std::collections::VecDeque;

use fnv::{FnvHashMap, FnvHashSet};

use crate::data::Cost;
use crate::solver::SearchNode;
use crate::state::StateId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontierKind {
    /// Binary min-heap with an id index for O(log n) decrease-key.
    Priority,
    /// Plain queue for uniform-cost/BFS mode; `update_if_better` is a no-op.
    Fifo,
}

/// Open set of the search, keyed by canonical state id.
#[derive(Debug)]
pub(crate) enum Frontier {
    Priority(PriorityFrontier),
    Fifo(FifoFrontier),
}

impl Frontier {
    pub(crate) fn new(kind: FrontierKind) -> Self {
        match kind {
            FrontierKind::Priority => Frontier::Priority(PriorityFrontier::default()),
            FrontierKind::Fifo => Frontier::Fifo(FifoFrontier::default()),
        }
    }

    pub(crate) fn push(&mut self, node: SearchNode, score: Cost) {
        match self {
            Frontier::Priority(heap) => heap.push(node, score),
            Frontier::Fifo(queue) => queue.push(node, score),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<(SearchNode, Cost)> {
        match self {
            Frontier::Priority(heap) => heap.pop(),
            Frontier::Fifo(queue) => queue.pop(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Frontier::Priority(heap) => heap.entries.len(),
            Frontier::Fifo(queue) => queue.queue.len(),
        }
    }

    pub(crate) fn exists(&self, id: &StateId) -> bool {
        match self {
            Frontier::Priority(heap) => heap.index.contains_key(id),
            Frontier::Fifo(queue) => queue.ids.contains(id),
        }
    }

    /// Decrease-key: replaces the stored entry for the node's id only if the
    /// new score improves on it. First-discovered order stands in FIFO mode.
    pub(crate) fn update_if_better(&mut self, node: SearchNode, score: Cost) {
        match self {
            Frontier::Priority(heap) => heap.update_if_better(node, score),
            Frontier::Fifo(_) => {}
        }
    }
}

#[derive(Debug)]
struct Entry {
    score: Cost,
    node: SearchNode,
}

/// The id→index map is kept consistent on every swap so entries can be
/// looked up and re-scored in place.
#[derive(Debug, Default)]
pub(crate) struct PriorityFrontier {
    entries: Vec<Entry>,
    index: FnvHashMap<StateId, usize>,
}

impl PriorityFrontier {
    fn push(&mut self, node: SearchNode, score: Cost) {
        debug_assert!(!self.index.contains_key(&node.id));

        let i = self.entries.len();
        self.index.insert(node.id.clone(), i);
        self.entries.push(Entry { score, node });
        self.sift_up(i);
    }

    fn pop(&mut self) -> Option<(SearchNode, Cost)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(0, last);
        let entry = self.entries.pop().unwrap();
        self.index.remove(&entry.node.id);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((entry.node, entry.score))
    }

    fn update_if_better(&mut self, node: SearchNode, score: Cost) {
        if let Some(&i) = self.index.get(&node.id) {
            if score < self.entries[i].score {
                self.entries[i] = Entry { score, node };
                self.sift_up(i);
            }
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[parent].score <= self.entries[i].score {
                break;
            }
            self.swap(parent, i);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            if left >= self.entries.len() {
                break;
            }
            let mut child = left;
            if right < self.entries.len() && self.entries[right].score < self.entries[left].score {
                child = right;
            }
            if self.entries[i].score <= self.entries[child].score {
                break;
            }
            self.swap(i, child);
            i = child;
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.entries.swap(i, j);
        self.index.insert(self.entries[i].node.id.clone(), i);
        self.index.insert(self.entries[j].node.id.clone(), j);
    }
}

#[derive(Debug, Default)]
pub(crate) struct FifoFrontier {
    queue: VecDeque<(SearchNode, Cost)>,
    ids: FnvHashSet<StateId>,
}

impl FifoFrontier {
    fn push(&mut self, node: SearchNode, score: Cost) {
        self.ids.insert(node.id.clone());
        self.queue.push_back((node, score));
    }

    fn pop(&mut self) -> Option<(SearchNode, Cost)> {
        let (node, score) = self.queue.pop_front()?;
        self.ids.remove(&node.id);
        Some((node, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Pos;
    use crate::state::PuzzleState;

    fn node(r: i16, c: i16) -> SearchNode {
        let state = PuzzleState::new(Pos::new(r, c), vec![Pos::new(0, 0)]);
        let id = state.id();
        SearchNode {
            state,
            id,
            dist: 0,
            h: 0,
            prev: None,
            pusher_at_push: None,
        }
    }

    #[test]
    fn heap_pops_minimum() {
        let mut frontier = Frontier::new(FrontierKind::Priority);
        frontier.push(node(1, 1), 7);
        frontier.push(node(2, 2), 3);
        frontier.push(node(3, 3), 5);
        frontier.push(node(4, 4), 1);

        let scores: Vec<_> = std::iter::from_fn(|| frontier.pop())
            .map(|(_, score)| score)
            .collect();
        assert_eq!(scores, vec![1, 3, 5, 7]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn heap_exists_tracks_contents() {
        let mut frontier = Frontier::new(FrontierKind::Priority);
        let a = node(1, 1);
        let a_id = a.id.clone();
        let absent = node(9, 9).id;

        frontier.push(a, 2);
        assert!(frontier.exists(&a_id));
        assert!(!frontier.exists(&absent));

        frontier.pop().unwrap();
        assert!(!frontier.exists(&a_id));
    }

    #[test]
    fn heap_decrease_key() {
        let mut frontier = Frontier::new(FrontierKind::Priority);
        frontier.push(node(1, 1), 10);
        frontier.push(node(2, 2), 5);

        // improving the score reorders, worsening is ignored
        frontier.update_if_better(node(1, 1), 2);
        frontier.update_if_better(node(2, 2), 50);

        let (first, score) = frontier.pop().unwrap();
        assert_eq!(first.state.pusher(), Pos::new(1, 1));
        assert_eq!(score, 2);
        let (second, score) = frontier.pop().unwrap();
        assert_eq!(second.state.pusher(), Pos::new(2, 2));
        assert_eq!(score, 5);
    }

    #[test]
    fn fifo_keeps_insertion_order() {
        let mut frontier = Frontier::new(FrontierKind::Fifo);
        frontier.push(node(1, 1), 7);
        frontier.push(node(2, 2), 3);
        frontier.update_if_better(node(1, 1), 0);

        let (first, _) = frontier.pop().unwrap();
        assert_eq!(first.state.pusher(), Pos::new(1, 1));
        let (second, _) = frontier.pop().unwrap();
        assert_eq!(second.state.pusher(), Pos::new(2, 2));
        assert!(frontier.is_empty());
    }
}
