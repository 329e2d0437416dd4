use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::mem;

use super::arena::Arena;
use super::handle::Handle;
use super::order_statistic::RankedTree;
use super::size::Size;

#[derive(Clone)]
struct Node<K> {
    key: K,
    left: Option<Handle>,
    right: Option<Handle>,
    /// Height of the subtree rooted here; a leaf has height 1.
    height: u8,
    size: Size,
}

impl<K> Node<K> {
    fn leaf(key: K) -> Self {
        Self {
            key,
            left: None,
            right: None,
            height: 1,
            size: Size::ONE,
        }
    }
}

/// The height-balanced core backing `AvlMultiset`.
///
/// Mutations descend recursively and repair on the return path: recompute
/// height and size, then rotate if the balance factor leaves `[-1, 1]`. No
/// parent links are kept; the call stack is the path, and its depth is bounded
/// by the balance invariant itself.
pub(crate) struct RawAvlTree<K> {
    nodes: Arena<Node<K>>,
    root: Option<Handle>,
}

impl<K> Clone for RawAvlTree<K>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }
}

impl<K> RawAvlTree<K> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of stored keys, read from the root's size augmentation.
    pub(crate) fn len(&self) -> usize {
        self.root.map_or(0, |root| self.node(root).size.to_usize())
    }

    /// Height of the tree; 0 when empty. O(1), the root stores it.
    pub(crate) fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.nodes.get_mut(handle)
    }

    fn height_of(&self, node: Option<Handle>) -> u8 {
        node.map_or(0, |h| self.node(h).height)
    }

    fn size_of(&self, node: Option<Handle>) -> usize {
        node.map_or(0, |h| self.node(h).size.to_usize())
    }

    /// `height(left) - height(right)`; the tree is repaired whenever this
    /// leaves `[-1, 1]` at any node.
    fn balance_factor(&self, handle: Handle) -> i16 {
        let node = self.node(handle);
        i16::from(self.height_of(node.left)) - i16::from(self.height_of(node.right))
    }

    /// Recomputes the height and size of `handle` from its children.
    fn update(&mut self, handle: Handle) {
        let node = self.node(handle);
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        let size = 1 + self.size_of(node.left) + self.size_of(node.right);
        let node = self.node_mut(handle);
        node.height = height;
        node.size = Size::from_usize(size);
    }

    /// Rotates `handle` left around its right child. Returns the new subtree
    /// root.
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self.node(handle).right.expect("`RawAvlTree::rotate_left()` - no right child to rotate through!");
        let moved = self.node(pivot).left;
        self.node_mut(handle).right = moved;
        self.node_mut(pivot).left = Some(handle);
        self.update(handle);
        self.update(pivot);
        pivot
    }

    /// Rotates `handle` right around its left child. Returns the new subtree
    /// root.
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self.node(handle).left.expect("`RawAvlTree::rotate_right()` - no left child to rotate through!");
        let moved = self.node(pivot).right;
        self.node_mut(handle).left = moved;
        self.node_mut(pivot).right = Some(handle);
        self.update(handle);
        self.update(pivot);
        pivot
    }

    /// Refreshes `handle` and applies the minimal rotation restoring
    /// `|balance| <= 1`. The taller child's own balance factor decides between
    /// a single and a double rotation, which serves insertion and deletion
    /// alike. Returns the subtree's (possibly new) root.
    fn rebalance(&mut self, handle: Handle) -> Handle {
        self.update(handle);
        let balance = self.balance_factor(handle);
        if balance > 1 {
            let left = self.node(handle).left.expect("`RawAvlTree::rebalance()` - left-heavy node without a left child!");
            if self.balance_factor(left) < 0 {
                let new_left = self.rotate_left(left);
                self.node_mut(handle).left = Some(new_left);
            }
            self.rotate_right(handle)
        } else if balance < -1 {
            let right = self.node(handle).right.expect("`RawAvlTree::rebalance()` - right-heavy node without a right child!");
            if self.balance_factor(right) > 0 {
                let new_right = self.rotate_right(right);
                self.node_mut(handle).right = Some(new_right);
            }
            self.rotate_left(handle)
        } else {
            handle
        }
    }
}

impl<K: Ord> RawAvlTree<K> {
    /// Inserts `key`; duplicates are kept and route right of equal keys.
    pub(crate) fn insert(&mut self, key: K) {
        let root = self.root;
        let new_root = self.insert_at(root, key);
        self.root = Some(new_root);
    }

    fn insert_at(&mut self, node: Option<Handle>, key: K) -> Handle {
        let Some(handle) = node else {
            return self.nodes.alloc(Node::leaf(key));
        };
        if key < self.node(handle).key {
            let left = self.node(handle).left;
            let new_left = self.insert_at(left, key);
            self.node_mut(handle).left = Some(new_left);
        } else {
            // Ties route right of the equal key.
            let right = self.node(handle).right;
            let new_right = self.insert_at(right, key);
            self.node_mut(handle).right = Some(new_right);
        }
        self.rebalance(handle)
    }

    /// Removes one occurrence of `key`, returning it; `None` when absent.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root?;
        let (new_root, removed) = self.remove_at(root, key);
        self.root = new_root;
        removed
    }

    fn remove_at<Q>(&mut self, handle: Handle, key: &Q) -> (Option<Handle>, Option<K>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match key.cmp(self.node(handle).key.borrow()) {
            Ordering::Less => {
                let Some(left) = self.node(handle).left else {
                    return (Some(handle), None);
                };
                let (new_left, removed) = self.remove_at(left, key);
                self.node_mut(handle).left = new_left;
                if removed.is_some() {
                    (Some(self.rebalance(handle)), removed)
                } else {
                    (Some(handle), None)
                }
            }
            Ordering::Greater => {
                let Some(right) = self.node(handle).right else {
                    return (Some(handle), None);
                };
                let (new_right, removed) = self.remove_at(right, key);
                self.node_mut(handle).right = new_right;
                if removed.is_some() {
                    (Some(self.rebalance(handle)), removed)
                } else {
                    (Some(handle), None)
                }
            }
            Ordering::Equal => {
                let node = self.node(handle);
                match (node.left, node.right) {
                    // At most one child: splice the node out directly.
                    (None, child) | (child @ Some(_), None) => {
                        let taken = self.nodes.take(handle);
                        (child, Some(taken.key))
                    }
                    // Two children: pull the in-order successor out of the
                    // right subtree (rebalancing that path) and move its key
                    // into this node. External references to "the node for
                    // this key" are invalidated by the move.
                    (Some(_), Some(right)) => {
                        let (new_right, successor) = self.detach_min(right);
                        self.node_mut(handle).right = new_right;
                        let successor = self.nodes.take(successor);
                        let removed = mem::replace(&mut self.node_mut(handle).key, successor.key);
                        (Some(self.rebalance(handle)), Some(removed))
                    }
                }
            }
        }
    }

    /// Unlinks the minimum node of the subtree at `handle` without freeing it.
    /// Returns the rebalanced subtree and the detached node's handle.
    fn detach_min(&mut self, handle: Handle) -> (Option<Handle>, Handle) {
        match self.node(handle).left {
            Some(left) => {
                let (new_left, min) = self.detach_min(left);
                self.node_mut(handle).left = new_left;
                (Some(self.rebalance(handle)), min)
            }
            None => (self.node(handle).right, handle),
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut node = self.root;
        while let Some(handle) = node {
            let current = self.node(handle);
            node = match key.cmp(current.key.borrow()) {
                Ordering::Less => current.left,
                Ordering::Greater => current.right,
                Ordering::Equal => return Some(&current.key),
            };
        }
        None
    }

    /// Minimum key; `None` when empty.
    pub(crate) fn first(&self) -> Option<&K> {
        let mut handle = self.root?;
        while let Some(left) = self.node(handle).left {
            handle = left;
        }
        Some(&self.node(handle).key)
    }

    /// Maximum key; `None` when empty.
    pub(crate) fn last(&self) -> Option<&K> {
        let mut handle = self.root?;
        while let Some(right) = self.node(handle).right {
            handle = right;
        }
        Some(&self.node(handle).key)
    }

    /// Consumes the tree, draining every key in ascending order.
    pub(crate) fn into_keys(mut self) -> Vec<K> {
        let mut order: Vec<Handle> = Vec::with_capacity(self.len());
        let mut spine: Vec<Handle> = Vec::new();
        let mut node = self.root;
        loop {
            while let Some(handle) = node {
                spine.push(handle);
                node = self.node(handle).left;
            }
            let Some(handle) = spine.pop() else { break };
            node = self.node(handle).right;
            order.push(handle);
        }
        order.into_iter().map(|handle| self.nodes.take(handle).key).collect()
    }
}

impl<K> RankedTree for RawAvlTree<K> {
    type Key = K;

    fn root_handle(&self) -> Option<Handle> {
        self.root
    }

    fn left_of(&self, node: Handle) -> Option<Handle> {
        self.node(node).left
    }

    fn right_of(&self, node: Handle) -> Option<Handle> {
        self.node(node).right
    }

    fn key_of(&self, node: Handle) -> &K {
        &self.node(node).key
    }

    fn subtree_size(&self, node: Handle) -> usize {
        self.node(node).size.to_usize()
    }
}

#[cfg(test)]
impl<K: Ord> RawAvlTree<K> {
    /// Checks ordering, balance, height, and size augmentation everywhere.
    /// Duplicates make the ordering bound weak on both sides.
    pub(crate) fn assert_invariants(&self) {
        if let Some(root) = self.root {
            self.audit(root, None, None);
        }
    }

    fn audit(&self, handle: Handle, min: Option<&K>, max: Option<&K>) -> (u8, usize) {
        let node = self.node(handle);
        if let Some(min) = min {
            assert!(node.key >= *min, "BST ordering violated");
        }
        if let Some(max) = max {
            assert!(node.key <= *max, "BST ordering violated");
        }
        let (left_height, left_size) = node.left.map_or((0, 0), |left| self.audit(left, min, Some(&node.key)));
        let (right_height, right_size) = node.right.map_or((0, 0), |right| self.audit(right, Some(&node.key), max));
        assert!(
            (i16::from(left_height) - i16::from(right_height)).abs() <= 1,
            "balance factor out of range"
        );
        assert_eq!(node.height, 1 + left_height.max(right_height), "stale height");
        let size = 1 + left_size + right_size;
        assert_eq!(node.size.to_usize(), size, "stale size");
        (node.height, size)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use super::*;
    use crate::raw::order_statistic::{self, RangeIter};

    fn inorder(tree: &RawAvlTree<i64>) -> Vec<i64> {
        RangeIter::full(tree).copied().collect()
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut tree = RawAvlTree::new();
        for key in 0..1_000 {
            tree.insert(key);
            tree.assert_invariants();
        }
        assert_eq!(tree.len(), 1_000);
        // Far below the linear height a plain BST would reach.
        assert!(tree.height() <= 14, "height {} exceeds the AVL bound", tree.height());
    }

    #[test]
    fn remove_missing_key_is_a_noop() {
        let mut tree = RawAvlTree::new();
        tree.insert(5);
        assert_eq!(tree.remove(&42), None);
        assert_eq!(tree.len(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn duplicates_are_kept_and_removed_one_at_a_time() {
        let mut tree = RawAvlTree::new();
        for _ in 0..3 {
            tree.insert(7);
        }
        tree.insert(1);
        tree.assert_invariants();
        assert_eq!(tree.len(), 4);
        assert_eq!(order_statistic::count_matching(&tree, &7), 3);

        assert_eq!(tree.remove(&7), Some(7));
        tree.assert_invariants();
        assert_eq!(order_statistic::count_matching(&tree, &7), 2);
        assert_eq!(inorder(&tree), [1, 7, 7]);
    }

    #[test]
    fn two_child_removal_pulls_the_successor() {
        let mut tree = RawAvlTree::new();
        for key in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(key);
        }
        assert_eq!(tree.remove(&50), Some(50));
        tree.assert_invariants();
        assert_eq!(inorder(&tree), [20, 30, 40, 60, 70, 80]);
    }

    proptest! {
        #[test]
        fn random_ops_match_a_sorted_model(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree: RawAvlTree<i64> = RawAvlTree::new();
            let mut model: Vec<i64> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        tree.insert(key);
                        let at = model.partition_point(|&k| k <= key);
                        model.insert(at, key);
                    }
                    Op::Remove(key) => {
                        let expected = model.iter().position(|&k| k == key);
                        if let Some(at) = expected {
                            prop_assert_eq!(tree.remove(&key), Some(key));
                            model.remove(at);
                        } else {
                            prop_assert_eq!(tree.remove(&key), None);
                        }
                    }
                }
                tree.assert_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(inorder(&tree), model);
        }
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i64),
        Remove(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        // A narrow key range forces collisions and duplicate handling.
        prop_oneof![
            3 => (-50i64..50).prop_map(Op::Insert),
            2 => (-50i64..50).prop_map(Op::Remove),
        ]
    }
}
