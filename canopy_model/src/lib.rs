// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Model: the shared data representation for Rashomon-set exploration.
//!
//! A Rashomon set is the collection of near-optimal decision trees returned by
//! a model search. The search process encodes the whole set as a *trie* of
//! decision rules: every root-to-leaf path is one tree's decision prefix, and
//! shared prefixes are shared trie nodes. Alongside the trie, the payload
//! carries each tree's own branching structure and metrics, plus a table
//! describing every (feature, value) split pair.
//!
//! This crate owns:
//!
//! - [`Trie`] / [`RuleNode`]: the prefix trie. Leaves carry a [`TreeId`];
//!   internal nodes carry the [`FeatureId`] they split on. The wire format's
//!   optional fields are resolved into a two-variant enum at load time.
//! - [`TreeNode`] / [`TreeInfo`] / [`TreeTable`]: per-tree structure (for the
//!   detail view) with objective value and accuracy.
//! - [`FeatureDef`] / [`FeatureTable`]: feature ID → (name, value, short name).
//! - [`HierarchyData`]: the complete, immutable session payload, produced
//!   atomically by [`HierarchyData::from_json`].
//! - [`TreeStats`]: derived per-tree metadata (height, minimum leaf sample
//!   count, features used per depth) that the filter engine evaluates against.
//!
//! Loading is all-or-nothing: a malformed payload yields a [`LoadError`] and
//! no partially initialized state. Referential gaps between the trie and the
//! tables (a feature or tree ID with no table entry) are *data integrity
//! issues*: [`HierarchyData::from_json`] logs them and continues with blank
//! labels, while [`HierarchyData::from_json_strict`] rejects the payload.
//!
//! Downstream crates build the radial partition, filters, and navigation on
//! top of this model; nothing here is mutated after load.

mod stats;
mod types;
mod wire;

pub use stats::TreeStats;
pub use types::{
    FeatureDef, FeatureId, FeatureTable, HierarchyData, RuleNode, TreeId, TreeInfo, TreeNode,
    TreeTable, Trie,
};
pub use wire::{IntegrityIssue, LoadError, RawTreeNode};
