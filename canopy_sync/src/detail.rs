// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Detail-view projections and the pinned/favorites book.
//!
//! These serve the out-of-scope tree window and favorites panel: the core
//! never reads them back, and nothing here touches partition or filter state.

use canopy_model::{RawTreeNode, TreeId, TreeNode, TreeTable};
use log::warn;
use serde::Serialize;

/// Everything the detail window shows for one tree.
#[derive(Clone, Debug)]
pub struct TreeDetail {
    /// The tree being inspected.
    pub tree: TreeId,
    /// The tree's own branching structure.
    pub root: TreeNode,
    /// Objective value from the model search.
    pub objective: f64,
    /// Accuracy on the reference dataset.
    pub accuracy: f64,
}

/// UI state for one pinned tree window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinnedTree {
    /// The pinned tree.
    pub tree: TreeId,
    /// Free-form user annotation.
    pub note: String,
    /// Marked as a favorite.
    pub is_fav: bool,
    /// Window currently open.
    pub is_pinned: bool,
}

/// All pinned trees, in pin order.
#[derive(Clone, Debug, Default)]
pub struct FavoritesBook {
    pinned: Vec<PinnedTree>,
}

#[derive(Serialize)]
struct FavoriteRecord<'a> {
    #[serde(rename = "treeId")]
    tree_id: u32,
    tree: RawTreeNode,
    accuracy: f64,
    note: &'a str,
}

impl FavoritesBook {
    /// An empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or re-opens) a pin for a tree, keeping any earlier note.
    pub fn pin(&mut self, tree: TreeId) -> &mut PinnedTree {
        let at = match self.pinned.iter().position(|p| p.tree == tree) {
            Some(at) => at,
            None => {
                self.pinned.push(PinnedTree {
                    tree,
                    note: String::new(),
                    is_fav: false,
                    is_pinned: false,
                });
                self.pinned.len() - 1
            }
        };
        let entry = &mut self.pinned[at];
        entry.is_pinned = true;
        entry
    }

    /// Closes a tree's pin; note and favorite flag survive.
    pub fn unpin(&mut self, tree: TreeId) {
        if let Some(entry) = self.pinned.iter_mut().find(|p| p.tree == tree) {
            entry.is_pinned = false;
        }
    }

    /// Flips the favorite flag; returns the new value.
    pub fn toggle_favorite(&mut self, tree: TreeId) -> bool {
        let entry = self.pin(tree);
        entry.is_fav = !entry.is_fav;
        entry.is_fav
    }

    /// Replaces the note on a tree's pin.
    pub fn set_note(&mut self, tree: TreeId, note: impl Into<String>) {
        self.pin(tree).note = note.into();
    }

    /// Looks up one pin.
    #[must_use]
    pub fn get(&self, tree: TreeId) -> Option<&PinnedTree> {
        self.pinned.iter().find(|p| p.tree == tree)
    }

    /// Favorited trees, in pin order.
    pub fn favorites(&self) -> impl Iterator<Item = &PinnedTree> {
        self.pinned.iter().filter(|p| p.is_fav)
    }

    /// Serializes the favorites into the download payload: tree structure in
    /// wire form, accuracy, and the user's note. Favorites whose tree is
    /// missing from the table are reported and skipped.
    pub fn export_json(&self, trees: &TreeTable) -> Result<String, serde_json::Error> {
        let records: Vec<FavoriteRecord<'_>> = self
            .favorites()
            .filter_map(|pin| match trees.get(pin.tree) {
                Some(info) => Some(FavoriteRecord {
                    tree_id: pin.tree.0,
                    tree: RawTreeNode::from_tree(&info.root),
                    accuracy: info.accuracy,
                    note: &pin.note,
                }),
                None => {
                    warn!("favorite {} has no tree table entry, skipping", pin.tree);
                    None
                }
            })
            .collect();
        serde_json::to_string(&records)
    }
}

#[cfg(test)]
mod tests {
    use canopy_model::TreeInfo;

    use super::*;

    fn table() -> TreeTable {
        [(
            TreeId(4),
            TreeInfo {
                root: TreeNode::Verdict {
                    positive: true,
                    samples: 50,
                    correct: 44,
                },
                objective: 0.02,
                accuracy: 0.88,
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn pinning_keeps_notes_across_reopen() {
        let mut book = FavoritesBook::new();
        book.pin(TreeId(4));
        book.set_note(TreeId(4), "splits cleanly on age");
        book.unpin(TreeId(4));
        assert!(!book.get(TreeId(4)).unwrap().is_pinned);
        book.pin(TreeId(4));
        assert_eq!(book.get(TreeId(4)).unwrap().note, "splits cleanly on age");
    }

    #[test]
    fn export_serializes_only_favorites() {
        let mut book = FavoritesBook::new();
        book.pin(TreeId(4));
        book.set_note(TreeId(4), "keeper");
        let empty = book.export_json(&table()).unwrap();
        assert_eq!(empty, "[]");

        book.toggle_favorite(TreeId(4));
        let json = book.export_json(&table()).unwrap();
        assert!(json.contains("\"treeId\":4"));
        assert!(json.contains("\"accuracy\":0.88"));
        assert!(json.contains("\"note\":\"keeper\""));
        assert!(json.contains("[\"+\",50,44]"));
    }

    #[test]
    fn favorites_missing_from_the_table_are_skipped() {
        let mut book = FavoritesBook::new();
        book.toggle_favorite(TreeId(9));
        assert_eq!(book.export_json(&table()).unwrap(), "[]");
    }
}
