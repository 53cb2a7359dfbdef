//! # celltrie
//!
//! A memory-efficient ordered index keyed by `u64` "cells".
//!
//! The tree is a 128-way radix trie over the key bits whose leaves hold
//! sorted runs of items. Compared to a classical B-tree it trades a little
//! lookup generality (keys are always `u64`) for cheaper inserts/deletes and
//! fewer bytes per entry, while keeping ordered iteration.
//!
//! ## Features
//!
//! - **Duplicate cells**: every insert adds an item; payloads for one cell
//!   form a multiset.
//! - **Ordered visitation**: `scan`, `range` and `iter` emit cells in
//!   non-decreasing order.
//! - **Bulk removal**: `remove_range` drops fully-covered subtrees without
//!   visiting their items.
//! - **Self-shrinking**: leaf backing stores shrink as occupancy falls, and
//!   sparse branches flatten back into leaves.
//!
//! ## Example
//!
//! ```rust
//! use celltrie::CellTrie;
//!
//! let mut tree: CellTrie<u64> = CellTrie::new();
//! tree.insert(51, 1);
//! tree.insert(9, 2);
//! tree.insert(51, 3);
//!
//! let mut cells = Vec::new();
//! tree.scan(|cell, _| {
//!     cells.push(cell);
//!     true
//! });
//! assert_eq!(cells, vec![9, 51, 51]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod debug;
mod node;

use node::{Item, Node, ROOT_SHIFT};

/// Tells [`CellTrie::remove_range_when`] what to do with a visited item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveDecision {
    /// Remove this item and keep visiting.
    Remove,
    /// Keep this item and keep visiting.
    Keep,
    /// Keep this item and stop visiting. Nothing after it is visited or
    /// removed.
    Stop,
}

/// An ordered index of `(u64, T)` items keyed by cell.
///
/// Not synchronized; wrap it in a lock for shared use. Callbacks receive the
/// cell by value and the payload by shared reference, so they cannot mutate
/// the tree re-entrantly.
pub struct CellTrie<T> {
    pub(crate) root: Option<Box<Node<T>>>,
    pub(crate) count: usize,
}

impl<T> CellTrie<T> {
    /// Creates an empty tree. Allocates nothing until the first insert.
    pub const fn new() -> Self {
        Self {
            root: None,
            count: 0,
        }
    }

    /// Number of items in the tree. O(1).
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when the tree holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Inserts an item. Duplicates (same cell, even same payload) are
    /// allowed; every call adds one item.
    pub fn insert(&mut self, cell: u64, data: T) {
        let root = self.root.get_or_insert_with(|| Box::new(Node::empty()));
        if root.insert(cell, data, ROOT_SHIFT, None) {
            self.count += 1;
        }
    }

    /// Inserts an item unless `cond` claims an existing duplicate.
    ///
    /// `cond` is invoked for each pre-existing item with the same cell, in
    /// reverse sorted order. Returning `Some(new_data)` overwrites that
    /// item's payload and ends the operation without inserting; the first
    /// acceptance wins. If `cond` returns `None` for every duplicate (or
    /// there are none), a new item is inserted.
    pub fn insert_or_replace(&mut self, cell: u64, data: T, mut cond: impl FnMut(&T) -> Option<T>) {
        let root = self.root.get_or_insert_with(|| Box::new(Node::empty()));
        if root.insert(cell, data, ROOT_SHIFT, Some(&mut cond)) {
            self.count += 1;
        }
    }

    /// Removes at most one item whose cell matches and whose payload equals
    /// `data`. A no-op when nothing matches.
    pub fn remove(&mut self, cell: u64, data: &T)
    where
        T: PartialEq,
    {
        self.remove_when(cell, |existing| existing == data);
    }

    /// Removes at most one item whose cell matches and for which `cond`
    /// returns true. Candidates are offered in reverse sorted order within
    /// the target leaf.
    pub fn remove_when(&mut self, cell: u64, mut cond: impl FnMut(&T) -> bool) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        if root.remove(cell, ROOT_SHIFT, &mut cond) {
            self.count -= 1;
        }
    }

    /// Visits every item in ascending cell order. Return false from `iter`
    /// to stop early.
    pub fn scan(&self, mut iter: impl FnMut(u64, &T) -> bool) {
        if let Some(root) = self.root.as_deref() {
            root.scan(&mut iter);
        }
    }

    /// Visits every item whose cell is >= `pivot`, in ascending order.
    /// Return false from `iter` to stop early.
    pub fn range(&self, pivot: u64, mut iter: impl FnMut(u64, &T) -> bool) {
        if let Some(root) = self.root.as_deref() {
            root.range(pivot, ROOT_SHIFT, false, &mut iter);
        }
    }

    /// Removes every item whose cell lies in `[start, end]`. Subtrees fully
    /// covered by the window are dropped without visiting their items.
    pub fn remove_range(&mut self, start: u64, end: u64) {
        self.remove_range_inner(start, end, None);
    }

    /// Visits every item whose cell lies in `[start, end]`, in ascending
    /// order, removing each one `iter` marks [`RemoveDecision::Remove`].
    /// [`RemoveDecision::Stop`] halts the traversal, keeping the current
    /// item and everything after it.
    pub fn remove_range_when(
        &mut self,
        start: u64,
        end: u64,
        mut iter: impl FnMut(u64, &T) -> RemoveDecision,
    ) {
        self.remove_range_inner(start, end, Some(&mut iter));
    }

    fn remove_range_inner(
        &mut self,
        start: u64,
        end: u64,
        iter: Option<&mut dyn FnMut(u64, &T) -> RemoveDecision>,
    ) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        let (_, deleted, _) = root.range_remove(start, end, ROOT_SHIFT, 0, false, iter);
        self.count -= deleted;
    }

    /// Returns an iterator over `(cell, &payload)` in ascending cell order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut stack = Vec::new();
        if let Some(root) = self.root.as_deref() {
            if root.count() > 0 {
                stack.push(root);
            }
        }
        Iter {
            stack,
            run: [].iter(),
        }
    }

    /// Approximate heap usage of the tree's nodes and leaf runs, in bytes.
    pub fn memory_usage(&self) -> usize {
        match self.root.as_deref() {
            Some(root) => root.memory_usage(),
            None => 0,
        }
    }
}

impl<T> Default for CellTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CellTrie<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            count: self.count,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CellTrie<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Ordered iterator over a [`CellTrie`], returned by [`CellTrie::iter`].
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
    run: std::slice::Iter<'a, Item<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (u64, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.run.next() {
                return Some((item.cell, &item.data));
            }
            match self.stack.pop()? {
                Node::Leaf(items) => self.run = items.iter(),
                Node::Branch { children, .. } => {
                    for child in children.iter().rev() {
                        if child.count() > 0 {
                            self.stack.push(child);
                        }
                    }
                }
            }
        }
    }
}
