/// The contract shared by both balanced-multiset implementations.
///
/// [`AvlMultiset`](crate::AvlMultiset) rebalances by height, and
/// [`RbMultiset`](crate::RbMultiset) by node color; behind this trait they are
/// interchangeable. All operations are total: an absent key, an out-of-range
/// rank, or an inverted range is a normal negative result, never an error.
///
/// # Examples
///
/// ```
/// use rank_tree::{AvlMultiset, OrderedMultiset, RbMultiset};
///
/// fn median<S: OrderedMultiset<i32>>(set: &S) -> Option<i32> {
///     set.kth_largest(set.len().div_ceil(2)).copied()
/// }
///
/// let avl: AvlMultiset<i32> = [3, 1, 4, 1, 5].into_iter().collect();
/// let rb: RbMultiset<i32> = [3, 1, 4, 1, 5].into_iter().collect();
/// assert_eq!(median(&avl), Some(3));
/// assert_eq!(median(&avl), median(&rb));
/// ```
pub trait OrderedMultiset<K: Ord> {
    /// Ascending iterator over all stored keys.
    type Iter<'a>: Iterator<Item = &'a K>
    where
        Self: 'a,
        K: 'a;

    /// Ascending iterator over the keys of an inclusive range.
    type Range<'a>: Iterator<Item = &'a K>
    where
        Self: 'a,
        K: 'a;

    /// Inserts `key`. Duplicates are always accepted.
    fn insert(&mut self, key: K);

    /// Removes one occurrence of `key`; `false` (and no change) when absent.
    fn remove(&mut self, key: &K) -> bool;

    /// Returns a reference to a stored key equal to `key`.
    fn get(&self, key: &K) -> Option<&K>;

    /// Returns `true` if at least one occurrence of `key` is stored.
    fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of stored keys, duplicates included. O(1).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k`-th largest key, 1-indexed from the maximum; `None` when `k`
    /// is outside `[1, len]`.
    fn kth_largest(&self, k: usize) -> Option<&K>;

    /// Lazy ascending traversal of the keys in the inclusive range
    /// `[lower, upper]`; empty when `lower > upper`.
    fn range_query(&self, lower: K, upper: K) -> Self::Range<'_>;

    /// Full ascending traversal of all stored keys.
    fn inorder(&self) -> Self::Iter<'_>;
}
