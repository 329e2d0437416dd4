//! Order-statistic balanced search trees for Rust.
//!
//! This crate provides [`AvlMultiset`] and [`RbMultiset`]: key-ordered
//! multisets with O(log n) insertion, removal, and lookup, augmented with
//! per-subtree sizes so that rank queries are O(log n) too:
//!
//! - [`kth_largest`](AvlMultiset::kth_largest) - the k-th largest key,
//!   without traversing the tree
//! - [`range_query`](AvlMultiset::range_query) - a lazy ascending scan of an
//!   inclusive key range, pruned to the subtrees that can contain a match
//!
//! The two collections share one contract, [`OrderedMultiset`], and differ
//! only in how they rebalance: `AvlMultiset` keeps sibling subtree heights
//! within one of each other, `RbMultiset` maintains the red-black coloring
//! rules. Pick by workload (AVL trees end up shallower, red-black trees
//! rotate less on mutation); behavior is identical.
//!
//! # Example
//!
//! ```
//! use rank_tree::AvlMultiset;
//!
//! let mut tree = AvlMultiset::new();
//! for key in [20, 4, 15, 70, 50, 100, 3, 10] {
//!     tree.insert(key);
//! }
//!
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [3, 4, 10, 15, 20, 50, 70, 100]);
//! assert_eq!(tree.kth_largest(3), Some(&50));
//! assert_eq!(tree.range_query(10, 70).copied().collect::<Vec<_>>(), [10, 15, 20, 50, 70]);
//!
//! tree.remove(&15);
//! assert_eq!(tree.len(), 7);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`
//! - **Duplicate keys** - these are multisets; equal keys are kept and
//!   removed one occurrence at a time
//! - **Total APIs** - absent keys, out-of-range ranks, and inverted ranges
//!   are normal negative results, never panics
//!
//! # Implementation
//!
//! Nodes live in an arena and reference each other through niche-optimized
//! index handles, so neither variant needs `unsafe` or reference-counted
//! back-links. The AVL tree rebalances recursively on the way out of a
//! mutation; the red-black tree keeps parent handles and repairs iteratively,
//! with a reserved sentinel handle standing in for every empty leaf.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod multiset;
mod raw;

pub mod avl_multiset;
pub mod rb_multiset;

pub use avl_multiset::AvlMultiset;
pub use multiset::OrderedMultiset;
pub use rb_multiset::RbMultiset;
