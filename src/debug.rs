//! Integrity auditing and debug printing.
//!
//! `verify_integrity` is the whole-tree invariant audit the tests lean on:
//! it re-derives every subtree count, checks global cell ordering, and
//! checks the split/compact/shrink bookkeeping. It is cheap enough to run
//! after every mutation in small tests.

use crate::node::{at_max_depth, Node, BITS, MAX_ITEMS, MIN_ITEMS, ROOT_SHIFT};
use crate::CellTrie;

impl<T> CellTrie<T> {
    /// Walks the whole tree and reports every violated structural invariant
    /// as a human-readable issue. An empty list means the tree is healthy.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self.root.as_deref() {
            None => {
                if self.count != 0 {
                    issues.push(format!("tree has no root but a count of {}", self.count));
                }
            }
            Some(root) => {
                let mut last_cell = 0u64;
                let total = Self::verify_node(root, ROOT_SHIFT, &mut last_cell, &mut issues);
                if total != self.count {
                    issues.push(format!(
                        "tree count {} does not match {} reachable items",
                        self.count, total
                    ));
                }
            }
        }
        issues
    }

    fn verify_node(
        node: &Node<T>,
        shift: u32,
        last_cell: &mut u64,
        issues: &mut Vec<String>,
    ) -> usize {
        match node {
            Node::Leaf(items) => {
                if items.len() > MAX_ITEMS && !at_max_depth(shift) {
                    issues.push(format!(
                        "leaf holds {} items, over the split limit of {}",
                        items.len(),
                        MAX_ITEMS
                    ));
                }
                if items.is_empty() && items.capacity() != 0 {
                    issues.push(format!(
                        "empty leaf still owns a {}-slot allocation",
                        items.capacity()
                    ));
                }
                // Vec's smallest growth step reserves 4 slots; a short run
                // inside that floor allocation is not a shrink-policy bug.
                if !items.is_empty()
                    && items.capacity() > 4
                    && items.len() <= items.capacity() * 40 / 100
                {
                    issues.push(format!(
                        "leaf underfilled: {} live of {} capacity",
                        items.len(),
                        items.capacity()
                    ));
                }
                for item in items {
                    if item.cell < *last_cell {
                        issues.push(format!(
                            "cell {} out of order after {}",
                            item.cell, last_cell
                        ));
                    }
                    *last_cell = item.cell;
                }
                items.len()
            }
            Node::Branch { count, children } => {
                if *count <= MIN_ITEMS {
                    issues.push(format!(
                        "branch count {} at or below the compaction floor of {}",
                        count, MIN_ITEMS
                    ));
                }
                let mut total = 0;
                for child in children.iter() {
                    total += Self::verify_node(child, shift - BITS, last_cell, issues);
                }
                if total != *count {
                    issues.push(format!(
                        "branch count {} does not match {} reachable items",
                        count, total
                    ));
                }
                total
            }
        }
    }
}

impl<T: std::fmt::Debug> CellTrie<T> {
    /// Prints the tree structure to stdout. Debugging helper.
    pub fn debug_print(&self) {
        println!("=== CellTrie ({} items) ===", self.count);
        match self.root.as_deref() {
            Some(root) => Self::debug_node(root, 0),
            None => println!("(empty)"),
        }
        println!("===========================");
    }

    fn debug_node(node: &Node<T>, depth: usize) {
        let indent = "  ".repeat(depth);
        match node {
            Node::Leaf(items) => {
                println!(
                    "{}leaf: {} items ({} capacity)",
                    indent,
                    items.len(),
                    items.capacity()
                );
                for item in items {
                    println!("{}  {} -> {:?}", indent, item.cell, item.data);
                }
            }
            Node::Branch { count, children } => {
                println!("{}branch: {} items", indent, count);
                for (index, child) in children.iter().enumerate() {
                    if child.count() > 0 {
                        println!("{}  [{}] ->", indent, index);
                        Self::debug_node(child, depth + 2);
                    }
                }
            }
        }
    }
}
