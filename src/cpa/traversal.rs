//! Systematic traversal of a cumulative probability array.
//!
//! The order depends only on the number of entries: visit the midpoint of
//! the current range, then the whole upper sub-range, then the lower one.
//! It is the pre-order, right-first walk of the tree that
//! [`Cpa::binary_draw`] descends, so the frames consumed to reach a node are
//! exactly its search path and removals reuse the same compensation.

use super::{midpoint, Cpa};

/// One pending index range `[low, high]` at `depth` (the root has depth 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frame {
    low: usize,
    high: usize,
    depth: usize,
}

/// Resumable traversal state, owned by the caller.
///
/// One iterator follows one array. A fresh pass over the same array (after
/// [`Cpa::reset`]) needs [`CpaIterator::restart`].
#[derive(Clone, Debug, Default)]
pub struct CpaIterator {
    started: bool,
    stack: Vec<Frame>,
    path: Vec<usize>,
}

impl CpaIterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True once a started pass has consumed the whole order.
    pub fn is_exhausted(&self) -> bool {
        self.started && self.stack.is_empty()
    }

    /// Forget all progress; the next call starts a new pass.
    pub fn restart(&mut self) {
        self.started = false;
        self.stack.clear();
        self.path.clear();
    }

    fn begin(&mut self, len: usize) {
        self.started = true;
        self.stack.clear();
        self.path.clear();
        if len > 0 {
            self.stack.push(Frame {
                low: 0,
                high: len - 1,
                depth: 1,
            });
        }
    }
}

impl<T: Clone> Cpa<T> {
    /// Draw every remaining entry in traversal order, calling `visit` on each
    /// payload just before it is marked drawn. Returns the number visited.
    pub fn traverse<F: FnMut(&T)>(&mut self, mut visit: F) -> usize {
        let mut iterator = CpaIterator::new();
        let mut visited = 0;
        while let Some(index) = self.advance(&mut iterator) {
            visit(&self.entries[index].payload);
            self.remove_at(index, &iterator.path);
            visited += 1;
        }
        visited
    }

    /// [`Cpa::traverse`] without a visitor.
    pub fn draw_all(&mut self) -> usize {
        self.traverse(|_| {})
    }

    /// Draw the next remaining entry in traversal order.
    ///
    /// Entries already drawn by other means are skipped. Returns `None` once
    /// the order is exhausted; that is not an error.
    pub fn iterate(&mut self, iterator: &mut CpaIterator) -> Option<T> {
        let index = self.advance(iterator)?;
        self.remove_at(index, &iterator.path);
        Some(self.entries[index].payload.clone())
    }

    /// Move `iterator` to the next entry that is not drawn yet, leaving that
    /// entry's search path in `iterator.path`.
    fn advance(&self, iterator: &mut CpaIterator) -> Option<usize> {
        if iterator.stack.is_empty() {
            if iterator.started {
                return None;
            }
            iterator.begin(self.entries.len());
        }

        while let Some(frame) = iterator.stack.pop() {
            debug_assert!(frame.high < self.entries.len(), "iterator belongs to a larger cpa");
            let index = midpoint(frame.low, frame.high + 1);
            iterator.path.truncate(frame.depth - 1);
            iterator.path.push(index);

            if index > frame.low {
                iterator.stack.push(Frame {
                    low: frame.low,
                    high: index - 1,
                    depth: frame.depth + 1,
                });
            }
            if index < frame.high {
                iterator.stack.push(Frame {
                    low: index + 1,
                    high: frame.high,
                    depth: frame.depth + 1,
                });
            }

            if !self.entries[index].removed {
                return Some(index);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> Cpa<usize> {
        let mut cpa = Cpa::new(n.max(1));
        for i in 0..n {
            cpa.append(i, 1.0);
        }
        cpa
    }

    fn traversal_order(n: usize) -> Vec<usize> {
        let mut order = Vec::new();
        uniform(n).traverse(|&i| order.push(i));
        order
    }

    #[test]
    fn test_right_first_midpoint_order() {
        assert_eq!(traversal_order(1), vec![0]);
        assert_eq!(traversal_order(4), vec![2, 3, 1, 0]);
        assert_eq!(traversal_order(7), vec![3, 5, 6, 4, 1, 2, 0]);
    }

    #[test]
    fn test_traverse_draws_everything() {
        let mut cpa = uniform(9);
        assert_eq!(cpa.draw_all(), 9);
        assert!(cpa.all_drawn());
        assert_eq!(cpa.remaining_weight(), 0.0);
        assert_eq!(cpa.draw_all(), 0);
    }

    #[test]
    fn test_iterate_matches_traverse() {
        for n in 0..40 {
            let mut cpa = uniform(n);
            let mut iterator = CpaIterator::new();
            let mut order = Vec::new();
            while let Some(i) = cpa.iterate(&mut iterator) {
                order.push(i);
            }
            assert_eq!(order, traversal_order(n), "size {n}");
            assert!(iterator.is_exhausted());
            assert!(cpa.all_drawn());
        }
    }

    #[test]
    fn test_exhausted_iterator_stays_exhausted() {
        let mut cpa = uniform(2);
        let mut iterator = CpaIterator::new();
        assert!(!iterator.is_started());
        assert_eq!(cpa.iterate(&mut iterator), Some(1));
        assert_eq!(cpa.iterate(&mut iterator), Some(0));
        assert_eq!(cpa.iterate(&mut iterator), None);
        assert_eq!(cpa.iterate(&mut iterator), None);
    }

    #[test]
    fn test_iterate_skips_entries_drawn_by_key() {
        let mut cpa = uniform(7);
        // Bracket [5,6) belongs to index 5, the second entry in order.
        assert_eq!(cpa.binary_draw(5.0), Some(5));
        let mut iterator = CpaIterator::new();
        let mut order = Vec::new();
        while let Some(i) = cpa.iterate(&mut iterator) {
            order.push(i);
        }
        assert_eq!(order, vec![3, 6, 4, 1, 2, 0]);
    }

    #[test]
    fn test_traverse_skips_drawn_entries() {
        let mut cpa = uniform(4);
        assert_eq!(cpa.linear_draw(0.5), Some(0));
        let mut order = Vec::new();
        assert_eq!(cpa.traverse(|&i| order.push(i)), 3);
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_restart_after_reset() {
        let mut cpa = uniform(5);
        let mut iterator = CpaIterator::new();
        while cpa.iterate(&mut iterator).is_some() {}
        cpa.reset();
        assert_eq!(cpa.iterate(&mut iterator), None);

        iterator.restart();
        let mut order = Vec::new();
        while let Some(i) = cpa.iterate(&mut iterator) {
            order.push(i);
        }
        assert_eq!(order, traversal_order(5));
    }

    #[test]
    fn test_traversal_keeps_binary_draws_consistent() {
        let mut cpa = Cpa::new(6);
        for (i, w) in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0].into_iter().enumerate() {
            cpa.append(i, w);
        }
        let mut iterator = CpaIterator::new();
        assert_eq!(cpa.iterate(&mut iterator), Some(3));
        assert_eq!(cpa.iterate(&mut iterator), Some(5));
        // Remaining brackets: [0,3) [3,4) [4,8) [8,13)
        assert_eq!(cpa.binary_draw(3.5), Some(1));
        assert_eq!(cpa.binary_draw(9.0), Some(4));
        assert_eq!(cpa.remaining_weight(), 7.0);
        assert_eq!(cpa.iterate(&mut iterator), Some(2));
        assert_eq!(cpa.binary_draw(2.0), Some(0));
        assert!(cpa.all_drawn());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn drained_iterate_equals_traverse(
            weights in proptest::collection::vec(1_u32..20, 0..96),
        ) {
            let mut a = Cpa::new(weights.len().max(1));
            for (i, &w) in weights.iter().enumerate() {
                a.append(i, f64::from(w));
            }
            let mut b = a.clone();

            let mut traversed = Vec::new();
            a.traverse(|&i| traversed.push(i));

            let mut iterator = CpaIterator::new();
            let mut iterated = Vec::new();
            while let Some(i) = b.iterate(&mut iterator) {
                iterated.push(i);
            }

            prop_assert_eq!(&traversed, &iterated);
            prop_assert_eq!(traversed.len(), weights.len());
            prop_assert!(a.all_drawn() && b.all_drawn());
        }
    }
}
