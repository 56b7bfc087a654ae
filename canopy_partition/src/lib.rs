// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Partition: a radial partition layout over the rule trie.
//!
//! The trie from [`canopy_model`] is flattened into an arena of
//! [`PartitionNode`]s, each assigned:
//!
//! - a stable [`NodeId`] in pre-order (parent before children, children in
//!   trie order) — IDs never change after the build, so navigation state and
//!   back-stack entries stay valid across re-filtering;
//! - an angular extent `x0..x1` and a radial extent `y0..y1`, both normalized
//!   to `[0, 1]`: rings are uniform per depth, sectors are proportional to
//!   the subtree's *value* (count of used leaves below the node);
//! - two rollups: `value` (used-leaf path count, sums across children) and
//!   `tree_num` (count of *distinct* tree IDs among used descendant leaves —
//!   deduplicated, not summed).
//!
//! Filtering never rebuilds the arena. The filter engine funnels every change
//! through [`Partition::apply_used`], which re-marks leaves from ground truth
//! and re-runs aggregation and angular layout in place. Nodes whose value
//! drops to zero keep their identity and get a zero-width sector
//! (`x1 == x0`, never negative), so zoom targets and stacked domains survive.
//!
//! The arena is singly-owned: readers get `&PartitionNode` and cannot mutate
//! layout or rollups; all mutation goes through the two methods above.

mod node;
mod partition;

pub use node::{NodeId, PartitionNode, SectorKind};
pub use partition::Partition;
