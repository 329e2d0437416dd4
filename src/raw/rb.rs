use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use super::arena::Arena;
use super::handle::Handle;
use super::order_statistic::RankedTree;
use super::size::Size;

/// The nil sentinel: the one index the arena never hands out. Every empty
/// child and the root's parent point here. Reads of its color, size, and
/// parent go through accessors that answer with the canonical sentinel state
/// (black, size 0), so no keyless node is ever stored.
const NIL: Handle = Handle::from_index(Handle::MAX);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone)]
struct Node<K> {
    key: K,
    color: Color,
    left: Handle,
    right: Handle,
    parent: Handle,
    size: Size,
}

/// The red-black core backing `RbMultiset`.
///
/// Everything is iterative: insert and remove descend from the root, and the
/// fix-up loops climb back through parent handles. Rotations carry the size
/// augmentation with them, and insertion bumps sizes on the way down so no
/// second pass is needed.
pub(crate) struct RawRbTree<K> {
    nodes: Arena<Node<K>>,
    root: Handle,
    /// Scratch parent slot for the sentinel. Delete parks the replacement's
    /// parent here when the replacement is nil and resets it before
    /// returning, which keeps the sentinel canonical between operations.
    nil_parent: Handle,
}

impl<K> Clone for RawRbTree<K>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            nil_parent: NIL,
        }
    }
}

impl<K> RawRbTree<K> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: NIL,
            nil_parent: NIL,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: NIL,
            nil_parent: NIL,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of stored keys, read from the root's size augmentation.
    pub(crate) fn len(&self) -> usize {
        self.size_at(self.root)
    }

    /// Height of the tree; 0 when empty. A diagnostic walk, O(n).
    pub(crate) fn height(&self) -> usize {
        self.height_below(self.root)
    }

    fn height_below(&self, handle: Handle) -> usize {
        if handle == NIL {
            0
        } else {
            let node = self.node(handle);
            1 + self.height_below(node.left).max(self.height_below(node.right))
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
        self.nil_parent = NIL;
    }

    #[inline]
    fn node(&self, handle: Handle) -> &Node<K> {
        debug_assert!(handle != NIL, "`RawRbTree::node()` - tried to dereference the sentinel!");
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        debug_assert!(handle != NIL, "`RawRbTree::node_mut()` - tried to dereference the sentinel!");
        self.nodes.get_mut(handle)
    }

    fn color_of(&self, handle: Handle) -> Color {
        if handle == NIL {
            Color::Black
        } else {
            self.node(handle).color
        }
    }

    fn size_at(&self, handle: Handle) -> usize {
        if handle == NIL {
            0
        } else {
            self.node(handle).size.to_usize()
        }
    }

    fn parent_of(&self, handle: Handle) -> Handle {
        if handle == NIL {
            self.nil_parent
        } else {
            self.node(handle).parent
        }
    }

    fn set_parent(&mut self, handle: Handle, parent: Handle) {
        if handle == NIL {
            self.nil_parent = parent;
        } else {
            self.node_mut(handle).parent = parent;
        }
    }

    fn recompute_size(&mut self, handle: Handle) {
        let node = self.node(handle);
        let size = 1 + self.size_at(node.left) + self.size_at(node.right);
        self.node_mut(handle).size = Size::from_usize(size);
    }

    fn minimum(&self, mut handle: Handle) -> Handle {
        while self.node(handle).left != NIL {
            handle = self.node(handle).left;
        }
        handle
    }

    /// Rotates `x` left around its right child, re-linking the parent and
    /// transferring the size augmentation: the pivot inherits `x`'s old
    /// subtree size and `x` is recomputed from its new children.
    fn left_rotate(&mut self, x: Handle) {
        let y = self.node(x).right;
        let moved = self.node(y).left;
        self.node_mut(x).right = moved;
        if moved != NIL {
            self.node_mut(moved).parent = x;
        }
        let x_parent = self.node(x).parent;
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.node(x_parent).left == x {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;

        let old_size = self.node(x).size;
        self.node_mut(y).size = old_size;
        self.recompute_size(x);
    }

    /// Mirror image of [`Self::left_rotate`].
    fn right_rotate(&mut self, x: Handle) {
        let y = self.node(x).left;
        let moved = self.node(y).right;
        self.node_mut(x).left = moved;
        if moved != NIL {
            self.node_mut(moved).parent = x;
        }
        let x_parent = self.node(x).parent;
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.node(x_parent).right == x {
            self.node_mut(x_parent).right = y;
        } else {
            self.node_mut(x_parent).left = y;
        }
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;

        let old_size = self.node(x).size;
        self.node_mut(y).size = old_size;
        self.recompute_size(x);
    }

    /// Replaces the subtree at `u` with the subtree at `v` in `u`'s parent.
    /// `v` may be nil; its parent write then lands in the scratch slot.
    fn transplant(&mut self, u: Handle, v: Handle) {
        let u_parent = self.node(u).parent;
        if u_parent == NIL {
            self.root = v;
        } else if self.node(u_parent).left == u {
            self.node_mut(u_parent).left = v;
        } else {
            self.node_mut(u_parent).right = v;
        }
        self.set_parent(v, u_parent);
    }
}

impl<K: Ord> RawRbTree<K> {
    /// Inserts `key`; duplicates are kept and route right of equal keys.
    ///
    /// Sizes are bumped during the descent, so only the fix-up rotations have
    /// to touch them afterwards.
    pub(crate) fn insert(&mut self, key: K) {
        let mut parent = NIL;
        let mut cursor = self.root;
        while cursor != NIL {
            parent = cursor;
            let node = self.node_mut(cursor);
            let grown = node.size.to_usize() + 1;
            node.size = Size::from_usize(grown);
            cursor = if key < node.key { node.left } else { node.right };
        }

        let goes_left = parent != NIL && key < self.node(parent).key;
        let z = self.nodes.alloc(Node {
            key,
            color: Color::Red,
            left: NIL,
            right: NIL,
            parent,
            size: Size::ONE,
        });
        if parent == NIL {
            self.root = z;
        } else if goes_left {
            self.node_mut(parent).left = z;
        } else {
            self.node_mut(parent).right = z;
        }

        self.insert_fixup(z);
    }

    /// Restores the red-black properties after attaching the red leaf `z`.
    /// The only possible violation is a red parent; each round recolors or
    /// rotates it away, or pushes it two levels up.
    fn insert_fixup(&mut self, mut z: Handle) {
        while self.color_of(self.node(z).parent) == Color::Red {
            let parent = self.node(z).parent;
            // A red parent is never the root, so the grandparent is real.
            let grandparent = self.node(parent).parent;
            if parent == self.node(grandparent).left {
                let uncle = self.node(grandparent).right;
                if self.color_of(uncle) == Color::Red {
                    // Red uncle: recolor and push the violation up.
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    z = grandparent;
                } else {
                    if z == self.node(parent).right {
                        // Inner child: rotate into the outer case first.
                        z = parent;
                        self.left_rotate(z);
                    }
                    let parent = self.node(z).parent;
                    let grandparent = self.node(parent).parent;
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    self.right_rotate(grandparent);
                }
            } else {
                let uncle = self.node(grandparent).left;
                if self.color_of(uncle) == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    z = grandparent;
                } else {
                    if z == self.node(parent).left {
                        z = parent;
                        self.right_rotate(z);
                    }
                    let parent = self.node(z).parent;
                    let grandparent = self.node(parent).parent;
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grandparent).color = Color::Red;
                    self.left_rotate(grandparent);
                }
            }
        }
        let root = self.root;
        self.node_mut(root).color = Color::Black;
    }

    fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cursor = self.root;
        while cursor != NIL {
            let node = self.node(cursor);
            cursor = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(cursor),
            };
        }
        None
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|handle| &self.node(handle).key)
    }

    /// Minimum key; `None` when empty.
    pub(crate) fn first(&self) -> Option<&K> {
        if self.root == NIL {
            None
        } else {
            Some(&self.node(self.minimum(self.root)).key)
        }
    }

    /// Maximum key; `None` when empty.
    pub(crate) fn last(&self) -> Option<&K> {
        let mut handle = self.root;
        if handle == NIL {
            return None;
        }
        while self.node(handle).right != NIL {
            handle = self.node(handle).right;
        }
        Some(&self.node(handle).key)
    }

    /// Removes one occurrence of `key`, returning it; `None` when absent.
    ///
    /// Standard iterative delete: splice the node (or its in-order successor)
    /// out, rebuild the stale sizes on the path to the root, then run the
    /// fix-up if the spliced-out node was black.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let z = self.find(key)?;

        let z_left = self.node(z).left;
        let z_right = self.node(z).right;
        let mut removed_color = self.node(z).color;
        let x;
        if z_left == NIL {
            x = z_right;
            self.transplant(z, z_right);
        } else if z_right == NIL {
            x = z_left;
            self.transplant(z, z_left);
        } else {
            // Two children: the successor y (minimum of the right subtree,
            // itself with no left child) takes z's place and color, so the
            // color that actually leaves the tree is y's.
            let y = self.minimum(z_right);
            removed_color = self.node(y).color;
            x = self.node(y).right;
            if self.node(y).parent == z {
                self.set_parent(x, y);
            } else {
                self.transplant(y, self.node(y).right);
                self.node_mut(y).right = z_right;
                self.node_mut(z_right).parent = y;
            }
            self.transplant(z, y);
            self.node_mut(y).left = z_left;
            self.node_mut(z_left).parent = y;
            let z_color = self.node(z).color;
            self.node_mut(y).color = z_color;
            self.recompute_size(y);
        }

        // Sizes above the splice point are stale; rebuild up to the root.
        let mut cursor = self.parent_of(x);
        while cursor != NIL {
            self.recompute_size(cursor);
            cursor = self.node(cursor).parent;
        }

        if removed_color == Color::Black {
            self.delete_fixup(x);
        }

        // Restore the sentinel's canonical state.
        self.nil_parent = NIL;
        Some(self.nodes.take(z).key)
    }

    /// Rebalances after removing a black node, with `x` carrying the missing
    /// blackness. Sibling case analysis per CLRS; terminates at the root or
    /// as soon as the extra black can be absorbed.
    fn delete_fixup(&mut self, mut x: Handle) {
        while x != self.root && self.color_of(x) == Color::Black {
            let parent = self.parent_of(x);
            if x == self.node(parent).left {
                let mut w = self.node(parent).right;
                if self.color_of(w) == Color::Red {
                    // Red sibling: rotate it above, exposing a black one.
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(parent).color = Color::Red;
                    self.left_rotate(parent);
                    w = self.node(parent).right;
                }
                if self.color_of(self.node(w).left) == Color::Black
                    && self.color_of(self.node(w).right) == Color::Black
                {
                    // Both nephews black: recolor and move the debt up.
                    self.node_mut(w).color = Color::Red;
                    x = parent;
                } else {
                    if self.color_of(self.node(w).right) == Color::Black {
                        // Near nephew red, far black: convert to the far case.
                        let near = self.node(w).left;
                        self.node_mut(near).color = Color::Black;
                        self.node_mut(w).color = Color::Red;
                        self.right_rotate(w);
                        w = self.node(parent).right;
                    }
                    let parent_color = self.node(parent).color;
                    self.node_mut(w).color = parent_color;
                    self.node_mut(parent).color = Color::Black;
                    let far = self.node(w).right;
                    self.node_mut(far).color = Color::Black;
                    self.left_rotate(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.node(parent).left;
                if self.color_of(w) == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(parent).color = Color::Red;
                    self.right_rotate(parent);
                    w = self.node(parent).left;
                }
                if self.color_of(self.node(w).right) == Color::Black
                    && self.color_of(self.node(w).left) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = parent;
                } else {
                    if self.color_of(self.node(w).left) == Color::Black {
                        let near = self.node(w).right;
                        self.node_mut(near).color = Color::Black;
                        self.node_mut(w).color = Color::Red;
                        self.left_rotate(w);
                        w = self.node(parent).left;
                    }
                    let parent_color = self.node(parent).color;
                    self.node_mut(w).color = parent_color;
                    self.node_mut(parent).color = Color::Black;
                    let far = self.node(w).left;
                    self.node_mut(far).color = Color::Black;
                    self.right_rotate(parent);
                    x = self.root;
                }
            }
        }
        if x != NIL {
            self.node_mut(x).color = Color::Black;
        }
    }

    /// Consumes the tree, draining every key in ascending order.
    pub(crate) fn into_keys(mut self) -> Vec<K> {
        let mut order: Vec<Handle> = Vec::with_capacity(self.len());
        let mut spine: Vec<Handle> = Vec::new();
        let mut cursor = self.root;
        loop {
            while cursor != NIL {
                spine.push(cursor);
                cursor = self.node(cursor).left;
            }
            let Some(handle) = spine.pop() else { break };
            cursor = self.node(handle).right;
            order.push(handle);
        }
        order.into_iter().map(|handle| self.nodes.take(handle).key).collect()
    }
}

impl<K> RankedTree for RawRbTree<K> {
    type Key = K;

    fn root_handle(&self) -> Option<Handle> {
        (self.root != NIL).then_some(self.root)
    }

    fn left_of(&self, node: Handle) -> Option<Handle> {
        let left = self.node(node).left;
        (left != NIL).then_some(left)
    }

    fn right_of(&self, node: Handle) -> Option<Handle> {
        let right = self.node(node).right;
        (right != NIL).then_some(right)
    }

    fn key_of(&self, node: Handle) -> &K {
        &self.node(node).key
    }

    fn subtree_size(&self, node: Handle) -> usize {
        self.size_at(node)
    }
}

#[cfg(test)]
impl<K: Ord> RawRbTree<K> {
    /// Checks ordering, the color rules, equal black-height on every path,
    /// parent links, size augmentation, and the sentinel's canonical state.
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.nil_parent, NIL, "sentinel parent not restored");
        if self.root == NIL {
            return;
        }
        assert_eq!(self.node(self.root).color, Color::Black, "red root");
        assert_eq!(self.node(self.root).parent, NIL, "root has a parent");
        self.audit(self.root, None, None);
    }

    fn audit(&self, handle: Handle, min: Option<&K>, max: Option<&K>) -> (usize, usize) {
        if handle == NIL {
            return (0, 0);
        }
        let node = self.node(handle);
        if let Some(min) = min {
            assert!(node.key >= *min, "BST ordering violated");
        }
        if let Some(max) = max {
            assert!(node.key <= *max, "BST ordering violated");
        }
        if node.color == Color::Red {
            assert_eq!(self.color_of(node.left), Color::Black, "red node with red child");
            assert_eq!(self.color_of(node.right), Color::Black, "red node with red child");
        }
        if node.left != NIL {
            assert_eq!(self.node(node.left).parent, handle, "broken parent link");
        }
        if node.right != NIL {
            assert_eq!(self.node(node.right).parent, handle, "broken parent link");
        }
        let (left_black, left_size) = self.audit(node.left, min, Some(&node.key));
        let (right_black, right_size) = self.audit(node.right, Some(&node.key), max);
        assert_eq!(left_black, right_black, "unequal black-heights");
        let size = 1 + left_size + right_size;
        assert_eq!(node.size.to_usize(), size, "stale size");
        (left_black + usize::from(node.color == Color::Black), size)
    }
}
