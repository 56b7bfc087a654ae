// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena node types for the partition.

use core::fmt;

use canopy_model::{FeatureId, TreeId};
use smallvec::SmallVec;

/// Identifier for a node in the partition arena.
///
/// Assigned once, in pre-order, during [`crate::Partition::build`]; children
/// always carry larger IDs than their parent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// The raw pre-order index.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Reconstructs an ID from a raw index previously obtained via
    /// [`NodeId::get`]. IDs made up out of thin air simply miss on lookup.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// What a partition node represents in the trie.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SectorKind {
    /// The synthetic root (the full circle's hub; depth 0).
    Root,
    /// A split on a feature-value pair.
    Split(FeatureId),
    /// A path terminator carrying a tree ID.
    Leaf(TreeId),
}

impl SectorKind {
    /// Returns `true` for path-terminating leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }
}

/// One node of the radial partition.
///
/// Fields are readable everywhere but only mutated by
/// [`crate::Partition::build`] and [`crate::Partition::apply_used`].
#[derive(Clone, Debug)]
pub struct PartitionNode {
    /// Parent node; `None` only for the root.
    pub parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    /// What this node represents.
    pub kind: SectorKind,
    /// Depth in the trie; root = 0, first splits = 1.
    pub depth: u32,
    /// Angular extent start, normalized to `[0, 1]`.
    pub x0: f64,
    /// Angular extent end; always `>= x0`.
    pub x1: f64,
    /// Radial extent start, `depth / (depth_max + 1)`.
    pub y0: f64,
    /// Radial extent end, `(depth + 1) / (depth_max + 1)`.
    pub y1: f64,
    /// Count of used descendant leaves (path count). Leaves: `1` if used.
    pub value: u64,
    /// Count of distinct tree IDs among used descendant leaves.
    pub tree_num: u32,
    /// Leaves only: whether the tree this path encodes passes all filters.
    /// `true` and meaningless on internal nodes.
    pub used: bool,
}

impl PartitionNode {
    /// Angular width of the sector.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Returns `true` for path-terminating leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }
}
