use std::fmt;
use std::sync::Arc;

/// Provides the ordering key of an entry stored in an [`OrderedIndex`].
pub trait IndexKey {
    /// A totally ordered key
    type Key: Ord;

    /// Returns the key this entry is ordered by.
    fn index_key(&self) -> &Self::Key;
}

type Link<T> = Option<Box<Node<T>>>;

struct Node<T> {
    entry: Arc<T>,
    left: Link<T>,
    right: Link<T>,
}

/// An unbalanced binary search tree of shared entries.
///
/// Entries whose key is strictly less than a node's key descend to its left,
/// every other entry (including equal keys) descends to its right. No
/// rebalancing happens, so the tree shape depends entirely on insertion order:
/// random insertions give an average depth of $O(\log{N})$, already-sorted
/// insertions degenerate into a chain of depth $N$.
///
/// Since equal keys always descend to the right of one another, entries with
/// equal keys are traversed in insertion order.
///
/// Both insertion and traversal are iterative, so a degenerate tree cannot
/// overflow the stack.
pub struct OrderedIndex<T> {
    root: Link<T>,
    len: usize,
}

impl<T> OrderedIndex<T> {
    /// Creates an empty index.
    pub fn new() -> Self {
        OrderedIndex { root: None, len: 0 }
    }

    /// Returns the number of entries in the index.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns an iterator over the entries in key order (left, root, right).
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(&self.root);
        iter
    }

    /// Collects the entries in key order.
    ///
    /// ## Returns
    ///
    /// A vector of shared entries, non-decreasing by key. Empty if the index is
    /// empty.
    pub fn in_order(&self) -> Vec<Arc<T>> {
        self.iter().cloned().collect()
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut pending: Vec<(&Node<T>, usize)> = Vec::new();
        if let Some(root) = &self.root {
            pending.push((&**root, 1));
        }

        while let Some((node, depth)) = pending.pop() {
            height = height.max(depth);
            for child in [&node.left, &node.right].into_iter().flatten() {
                pending.push((&**child, depth + 1));
            }
        }

        height
    }
}

impl<T: IndexKey> OrderedIndex<T> {
    /// Inserts an entry as a new leaf.
    ///
    /// The cost is proportional to the depth of the tree: $O(\log{N})$ on
    /// average, $O(N)$ for sorted input.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cinema_booking::{IndexKey, OrderedIndex};
    /// use std::sync::Arc;
    ///
    /// struct Slot(u32);
    ///
    /// impl IndexKey for Slot {
    ///     type Key = u32;
    ///     fn index_key(&self) -> &u32 {
    ///         &self.0
    ///     }
    /// }
    ///
    /// let mut index = OrderedIndex::new();
    /// for key in [10, 8, 12] {
    ///     index.insert(Arc::new(Slot(key)));
    /// }
    ///
    /// let keys: Vec<u32> = index.iter().map(|slot| slot.0).collect();
    /// assert_eq!(keys, vec![8, 10, 12]);
    /// ```
    pub fn insert(&mut self, entry: Arc<T>) {
        let mut link = &mut self.root;
        while let Some(node) = link {
            link = if entry.index_key() < node.entry.index_key() {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        *link = Some(Box::new(Node {
            entry,
            left: None,
            right: None,
        }));
        self.len += 1;
    }
}

impl<T> Default for OrderedIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for OrderedIndex<T> {
    fn drop(&mut self) {
        // Unlink nodes one at a time so a deep chain is not dropped recursively
        let mut pending: Vec<Box<Node<T>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a OrderedIndex<T> {
    type Item = &'a Arc<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`OrderedIndex`].
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    fn push_left_spine(&mut self, mut link: &'a Link<T>) {
        while let Some(node) = link {
            self.stack.push(&**node);
            link = &node.left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(&node.right);
        Some(&node.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Entry ordered by its first field; the second one tracks insertion order.
    #[derive(Debug)]
    struct Tagged(u32, usize);

    impl IndexKey for Tagged {
        type Key = u32;

        fn index_key(&self) -> &u32 {
            &self.0
        }
    }

    fn build(keys: &[u32]) -> OrderedIndex<Tagged> {
        let mut index = OrderedIndex::new();
        for (position, key) in keys.iter().enumerate() {
            index.insert(Arc::new(Tagged(*key, position)));
        }
        index
    }

    #[test]
    fn test_empty_index() {
        let index: OrderedIndex<Tagged> = OrderedIndex::new();
        assert!(index.is_empty());
        assert!(index.in_order().is_empty());
        assert_eq!(index.height(), 0);
    }

    #[test]
    fn test_in_order_sorts_keys() {
        let index = build(&[10, 8, 12]);
        let keys: Vec<u32> = index.iter().map(|entry| entry.0).collect();
        assert_eq!(keys, vec![8, 10, 12]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.height(), 2);
    }

    #[test]
    fn test_equal_keys_descend_right() {
        let index = build(&[5, 3, 5, 7, 5]);
        let tags: Vec<(u32, usize)> = index.iter().map(|entry| (entry.0, entry.1)).collect();
        assert_eq!(tags, vec![(3, 1), (5, 0), (5, 2), (5, 4), (7, 3)]);
    }

    #[test]
    fn test_sorted_input_degenerates_without_overflow() {
        let keys: Vec<u32> = (0..10_000).collect();
        let index = build(&keys);
        assert_eq!(index.height(), 10_000);
        assert_eq!(index.iter().count(), 10_000);
        // Dropping the chain must not recurse
        drop(index);
    }

    proptest! {
        #[test]
        fn prop_in_order_is_non_decreasing(keys in proptest::collection::vec(0_u32..50, 0..200)) {
            let index = build(&keys);
            let ordered: Vec<&Arc<Tagged>> = index.iter().collect();

            prop_assert_eq!(ordered.len(), keys.len());
            for pair in ordered.windows(2) {
                prop_assert!(pair[0].0 <= pair[1].0);
                if pair[0].0 == pair[1].0 {
                    prop_assert!(pair[0].1 < pair[1].1);
                }
            }
        }
    }
}
