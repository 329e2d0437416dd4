use core::borrow::Borrow;
use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::Handle;

/// Read-only navigation over a size-augmented search tree.
///
/// Both balancing strategies expose this view, and the rank/range algorithms
/// below are written once against it; they never look at balance data.
pub(crate) trait RankedTree {
    type Key;

    fn root_handle(&self) -> Option<Handle>;
    fn left_of(&self, node: Handle) -> Option<Handle>;
    fn right_of(&self, node: Handle) -> Option<Handle>;
    fn key_of(&self, node: Handle) -> &Self::Key;
    /// Number of keys in the subtree rooted at `node`, the node included.
    fn subtree_size(&self, node: Handle) -> usize;
}

/// Selects the `k`-th largest key, 1-indexed from the maximum.
///
/// Within its subtree a node's rank from the top is `size(right) + 1`, so each
/// step either answers or discards one side. Out-of-range `k` (including 0) is
/// a normal negative result.
pub(crate) fn kth_largest<T: RankedTree>(tree: &T, k: usize) -> Option<&T::Key> {
    let root = tree.root_handle()?;
    if k == 0 || k > tree.subtree_size(root) {
        return None;
    }

    let mut node = root;
    let mut k = k;
    loop {
        let right = tree.right_of(node);
        let right_size = right.map_or(0, |r| tree.subtree_size(r));
        if k == right_size + 1 {
            return Some(tree.key_of(node));
        }
        if k <= right_size {
            node = right.expect("`kth_largest()` - size augmentation out of sync!");
        } else {
            k -= right_size + 1;
            node = tree.left_of(node).expect("`kth_largest()` - size augmentation out of sync!");
        }
    }
}

/// Counts the keys equal to `key`.
///
/// Duplicates can end up on either side of an equal node once rotations have
/// run, so both subtrees of a match are inspected; unequal nodes still prune
/// the side that cannot hold a match.
pub(crate) fn count_matching<T, Q>(tree: &T, key: &Q) -> usize
where
    T: RankedTree,
    T::Key: Borrow<Q>,
    Q: ?Sized + Ord,
{
    let mut total = 0;
    let mut pending: SmallVec<[Handle; 16]> = SmallVec::new();
    pending.extend(tree.root_handle());
    while let Some(node) = pending.pop() {
        match key.cmp(tree.key_of(node).borrow()) {
            Ordering::Less => pending.extend(tree.left_of(node)),
            Ordering::Greater => pending.extend(tree.right_of(node)),
            Ordering::Equal => {
                total += 1;
                pending.extend(tree.left_of(node));
                pending.extend(tree.right_of(node));
            }
        }
    }
    total
}

/// Lazy ascending traversal, optionally clamped to an inclusive key range.
///
/// The stack holds the left spine of the unvisited region; subtrees that
/// cannot intersect the bounds are never pushed, so a bounded scan touches
/// O(log n) nodes outside the result.
pub(crate) struct RangeIter<'a, T: RankedTree> {
    tree: &'a T,
    stack: SmallVec<[Handle; 16]>,
    lower: Option<T::Key>,
    upper: Option<T::Key>,
}

impl<'a, T: RankedTree> RangeIter<'a, T>
where
    T::Key: Ord,
{
    /// Full in-order traversal.
    pub(crate) fn full(tree: &'a T) -> Self {
        let mut iter = Self {
            tree,
            stack: SmallVec::new(),
            lower: None,
            upper: None,
        };
        iter.push_left_edge(tree.root_handle());
        iter
    }

    /// Traversal of the inclusive range `[lower, upper]`.
    ///
    /// An inverted range yields nothing; the contract stays total.
    pub(crate) fn bounded(tree: &'a T, lower: T::Key, upper: T::Key) -> Self {
        let inverted = lower > upper;
        let mut iter = Self {
            tree,
            stack: SmallVec::new(),
            lower: Some(lower),
            upper: Some(upper),
        };
        if !inverted {
            iter.push_left_edge(tree.root_handle());
        }
        iter
    }

    fn push_left_edge(&mut self, mut node: Option<Handle>) {
        while let Some(h) = node {
            if self.lower.as_ref().is_some_and(|lo| self.tree.key_of(h) < lo) {
                // This key and its whole left subtree sit below the range.
                node = self.tree.right_of(h);
            } else {
                self.stack.push(h);
                node = self.tree.left_of(h);
            }
        }
    }
}

impl<'a, T: RankedTree> Iterator for RangeIter<'a, T>
where
    T::Key: Ord,
{
    type Item = &'a T::Key;

    fn next(&mut self) -> Option<&'a T::Key> {
        let node = self.stack.pop()?;
        let tree = self.tree;
        let key = tree.key_of(node);
        if self.upper.as_ref().is_some_and(|hi| key > hi) {
            // In-order: every remaining key is at least this large.
            self.stack.clear();
            return None;
        }
        self.push_left_edge(tree.right_of(node));
        Some(key)
    }
}

impl<T: RankedTree> core::iter::FusedIterator for RangeIter<'_, T> where T::Key: Ord {}
