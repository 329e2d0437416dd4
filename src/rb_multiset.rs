use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use crate::multiset::OrderedMultiset;
use crate::raw::order_statistic::{self, RangeIter};
use crate::raw::rb::RawRbTree;

/// An ordered multiset balanced by node color (a red-black tree).
///
/// Keys are kept in sorted order under the red-black rules: the root is
/// black, a red node never has a red child, and every path from the root to
/// an empty leaf crosses the same number of black nodes. Together these bound
/// the height by `2 * log2(n + 1)`, making insertion, removal, and lookup
/// logarithmic. Every node also carries the size of its subtree, so rank
/// queries ([`kth_largest`](Self::kth_largest)) never traverse more than one
/// path.
///
/// Duplicate keys are stored as often as they are inserted and removed one
/// occurrence at a time. The observable behavior matches
/// [`AvlMultiset`](crate::AvlMultiset); only the rebalancing discipline (and
/// hence the exact tree shape) differs.
///
/// # Examples
///
/// ```
/// use rank_tree::RbMultiset;
///
/// let mut scores = RbMultiset::new();
/// scores.insert(70);
/// scores.insert(50);
/// scores.insert(100);
/// scores.insert(50);
///
/// assert_eq!(scores.len(), 4);
/// assert_eq!(scores.count(&50), 2);
/// assert_eq!(scores.kth_largest(1), Some(&100));
/// assert_eq!(scores.iter().copied().collect::<Vec<_>>(), [50, 50, 70, 100]);
/// ```
pub struct RbMultiset<K> {
    raw: RawRbTree<K>,
}

/// An ascending iterator over the keys of an [`RbMultiset`].
///
/// Created by [`RbMultiset::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K> {
    inner: RangeIter<'a, RawRbTree<K>>,
}

/// An ascending iterator over the keys of an [`RbMultiset`] that fall in an
/// inclusive range.
///
/// Created by [`RbMultiset::range_query`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K> {
    inner: RangeIter<'a, RawRbTree<K>>,
}

/// An owning ascending iterator over the keys of an [`RbMultiset`].
///
/// Created by [`RbMultiset::into_iter`].
pub struct IntoIter<K> {
    inner: alloc::vec::IntoIter<K>,
}

impl<K> RbMultiset<K> {
    /// Creates an empty multiset.
    #[must_use]
    pub const fn new() -> Self {
        Self { raw: RawRbTree::new() }
    }

    /// Creates an empty multiset with room for `capacity` keys before the
    /// backing storage reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: RawRbTree::with_capacity(capacity),
        }
    }

    /// Returns the number of keys the backing storage can hold without
    /// reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of stored keys, duplicates included. O(1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the multiset holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the height of the tree (0 when empty). Diagnostic; this walks
    /// the whole tree, unlike the AVL variant where the height is stored.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Removes all keys.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

impl<K: Ord> RbMultiset<K> {
    /// Inserts `key`. Duplicates are always accepted and sort next to their
    /// equals.
    pub fn insert(&mut self, key: K) {
        self.raw.insert(key);
    }

    /// Removes one occurrence of `key`. Returns `false`, changing nothing,
    /// when the key is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key).is_some()
    }

    /// Returns a reference to a stored key equal to `key`, or `None`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns `true` if at least one occurrence of `key` is stored.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).is_some()
    }

    /// Counts the stored occurrences of `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_tree::RbMultiset;
    ///
    /// let set: RbMultiset<i32> = [5, 5, 5, 9].into_iter().collect();
    /// assert_eq!(set.count(&5), 3);
    /// assert_eq!(set.count(&7), 0);
    /// ```
    #[must_use]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        order_statistic::count_matching(&self.raw, key)
    }

    /// Returns the minimum key, or `None` when empty.
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.raw.first()
    }

    /// Returns the maximum key, or `None` when empty.
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.raw.last()
    }

    /// Returns the `k`-th largest key, 1-indexed from the maximum, in
    /// O(log n) via the subtree-size augmentation. `None` when `k` is outside
    /// `[1, len]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_tree::RbMultiset;
    ///
    /// let set: RbMultiset<i32> = [20, 4, 70, 50].into_iter().collect();
    /// assert_eq!(set.kth_largest(2), Some(&50));
    /// assert_eq!(set.kth_largest(4), Some(&4));
    /// assert_eq!(set.kth_largest(5), None);
    /// ```
    #[must_use]
    pub fn kth_largest(&self, k: usize) -> Option<&K> {
        order_statistic::kth_largest(&self.raw, k)
    }

    /// Returns a lazy ascending iterator over the keys in the inclusive range
    /// `[lower, upper]`. An inverted range yields nothing. Subtrees that
    /// cannot intersect the range are never visited.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_tree::RbMultiset;
    ///
    /// let set: RbMultiset<i32> = [3, 10, 20, 50, 70, 100].into_iter().collect();
    /// let hits: Vec<i32> = set.range_query(10, 70).copied().collect();
    /// assert_eq!(hits, [10, 20, 50, 70]);
    /// ```
    pub fn range_query(&self, lower: K, upper: K) -> Range<'_, K> {
        Range {
            inner: RangeIter::bounded(&self.raw, lower, upper),
        }
    }

    /// Returns an ascending iterator over all stored keys.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: RangeIter::full(&self.raw),
        }
    }
}

impl<K: Ord> OrderedMultiset<K> for RbMultiset<K> {
    type Iter<'a>
        = Iter<'a, K>
    where
        K: 'a;
    type Range<'a>
        = Range<'a, K>
    where
        K: 'a;

    fn insert(&mut self, key: K) {
        RbMultiset::insert(self, key);
    }

    fn remove(&mut self, key: &K) -> bool {
        RbMultiset::remove(self, key)
    }

    fn get(&self, key: &K) -> Option<&K> {
        RbMultiset::get(self, key)
    }

    fn len(&self) -> usize {
        RbMultiset::len(self)
    }

    fn kth_largest(&self, k: usize) -> Option<&K> {
        RbMultiset::kth_largest(self, k)
    }

    fn range_query(&self, lower: K, upper: K) -> Range<'_, K> {
        RbMultiset::range_query(self, lower, upper)
    }

    fn inorder(&self) -> Iter<'_, K> {
        self.iter()
    }
}

impl<K> Default for RbMultiset<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Clone for RbMultiset<K> {
    fn clone(&self) -> Self {
        Self { raw: self.raw.clone() }
    }
}

impl<K: Ord + fmt::Debug> fmt::Debug for RbMultiset<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> FromIterator<K> for RbMultiset<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for RbMultiset<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for RbMultiset<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K: Ord> IntoIterator for &'a RbMultiset<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Ord> IntoIterator for RbMultiset<K> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            inner: self.raw.into_keys().into_iter(),
        }
    }
}

impl<'a, K: Ord> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next()
    }
}

impl<K: Ord> FusedIterator for Iter<'_, K> {}

impl<'a, K: Ord> Iterator for Range<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next()
    }
}

impl<K: Ord> FusedIterator for Range<'_, K> {}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K> FusedIterator for IntoIter<K> {}
