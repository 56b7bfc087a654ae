// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed model: IDs, the rule trie, per-tree structures, and lookup tables.

use core::fmt;

use hashbrown::HashMap;

/// Identifier of one decision tree in the Rashomon set.
///
/// Tree IDs come from the model-search output. They are unique but not
/// assumed dense or contiguous.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(pub u32);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// Identifier of one (feature, value) split pair.
///
/// Two different IDs may share a feature *name*: each admissible value of an
/// underlying feature gets its own ID.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u32);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// A node in the rule trie.
///
/// Exactly the leaves carry a [`TreeId`]; every internal node splits on a
/// feature-value pair and has at least one child. The synthetic root is not a
/// variant here: [`Trie`] owns the first level directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleNode {
    /// A split on a feature-value pair somewhere along one or more trees'
    /// decision paths.
    Internal {
        /// The feature-value pair this node splits on.
        feature: FeatureId,
        /// Child rules; never empty.
        children: Vec<RuleNode>,
    },
    /// Terminates one tree's decision path.
    Leaf {
        /// The tree this root-to-leaf path encodes.
        tree: TreeId,
    },
}

impl RuleNode {
    /// Returns `true` for path-terminating leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

/// The prefix trie over all trees' decision paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trie {
    /// First-level rules (the children of the synthetic root).
    pub children: Vec<RuleNode>,
}

impl Trie {
    /// Visits every node depth-first, pre-order, with its depth
    /// (first level = depth 1).
    pub fn walk(&self, mut visit: impl FnMut(&RuleNode, u32)) {
        fn go(node: &RuleNode, depth: u32, visit: &mut impl FnMut(&RuleNode, u32)) {
            visit(node, depth);
            if let RuleNode::Internal { children, .. } = node {
                for child in children {
                    go(child, depth + 1, visit);
                }
            }
        }
        for child in &self.children {
            go(child, 1, &mut visit);
        }
    }
}

/// A node in one tree's own branching structure (detail-view shape).
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    /// An internal decision node splitting on a feature-value pair.
    Split {
        /// The feature-value pair tested here.
        feature: FeatureId,
        /// Samples reaching this node.
        samples: u32,
        /// Subtrees for the split outcomes.
        children: Vec<TreeNode>,
    },
    /// A classification leaf.
    Verdict {
        /// `true` for the positive ("yes") class, `false` for negative.
        positive: bool,
        /// Samples reaching this leaf.
        samples: u32,
        /// Correctly classified samples at this leaf.
        correct: u32,
    },
}

impl TreeNode {
    /// Visits every node depth-first, pre-order, with its depth
    /// (root split = depth 1).
    pub fn walk(&self, mut visit: impl FnMut(&Self, u32)) {
        fn go(node: &TreeNode, depth: u32, visit: &mut impl FnMut(&TreeNode, u32)) {
            visit(node, depth);
            if let TreeNode::Split { children, .. } = node {
                for child in children {
                    go(child, depth + 1, visit);
                }
            }
        }
        go(self, 1, &mut visit);
    }
}

/// One tree's structure and metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeInfo {
    /// The tree's own branching structure.
    pub root: TreeNode,
    /// Objective value reported by the model search (lower is better).
    pub objective: f64,
    /// Accuracy on the reference dataset, in `[0, 1]`.
    pub accuracy: f64,
}

/// Lookup table from [`TreeId`] to [`TreeInfo`]. Immutable after load.
#[derive(Clone, Debug, Default)]
pub struct TreeTable {
    pub(crate) map: HashMap<TreeId, TreeInfo>,
}

impl TreeTable {
    /// Looks up one tree.
    #[must_use]
    pub fn get(&self, id: TreeId) -> Option<&TreeInfo> {
        self.map.get(&id)
    }

    /// The tree's accuracy, if the ID is known.
    #[must_use]
    pub fn accuracy(&self, id: TreeId) -> Option<f64> {
        self.map.get(&id).map(|t| t.accuracy)
    }

    /// Number of trees in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the table holds no trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over all `(id, info)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (TreeId, &TreeInfo)> {
        self.map.iter().map(|(id, info)| (*id, info))
    }
}

impl FromIterator<(TreeId, TreeInfo)> for TreeTable {
    fn from_iter<I: IntoIterator<Item = (TreeId, TreeInfo)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Human-readable description of one feature-value pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureDef {
    /// Feature name, shared across all values of the feature.
    pub name: String,
    /// The specific admissible value.
    pub value: String,
    /// Abbreviated name for dense labels.
    pub short: String,
}

impl FeatureDef {
    /// `name:value`, the long label form.
    #[must_use]
    pub fn name_value(&self) -> String {
        format!("{}:{}", self.name, self.value)
    }

    /// `short:value`, the compact label form.
    #[must_use]
    pub fn short_value(&self) -> String {
        format!("{}:{}", self.short, self.value)
    }
}

/// Lookup table from [`FeatureId`] to [`FeatureDef`]. Immutable after load.
#[derive(Clone, Debug, Default)]
pub struct FeatureTable {
    pub(crate) map: HashMap<FeatureId, FeatureDef>,
}

impl FeatureTable {
    /// Looks up one feature-value pair.
    #[must_use]
    pub fn get(&self, id: FeatureId) -> Option<&FeatureDef> {
        self.map.get(&id)
    }

    /// The feature *name* for an ID, if known.
    #[must_use]
    pub fn name_of(&self, id: FeatureId) -> Option<&str> {
        self.map.get(&id).map(|d| d.name.as_str())
    }

    /// Number of known feature-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the table holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over all `(id, def)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &FeatureDef)> {
        self.map.iter().map(|(id, def)| (*id, def))
    }
}

impl FromIterator<(FeatureId, FeatureDef)> for FeatureTable {
    fn from_iter<I: IntoIterator<Item = (FeatureId, FeatureDef)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// The complete session payload: trie, feature table, tree table.
///
/// Produced atomically by [`HierarchyData::from_json`]; immutable for the
/// rest of the session.
#[derive(Clone, Debug)]
pub struct HierarchyData {
    /// The rule trie.
    pub trie: Trie,
    /// Feature-value pair descriptions.
    pub features: FeatureTable,
    /// Per-tree structures and metrics.
    pub trees: TreeTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(t: u32) -> RuleNode {
        RuleNode::Leaf { tree: TreeId(t) }
    }

    #[test]
    fn trie_walk_is_preorder_with_depths() {
        // f1 ── f2 ── _t0
        //    └─ _t1
        let trie = Trie {
            children: vec![RuleNode::Internal {
                feature: FeatureId(1),
                children: vec![
                    RuleNode::Internal {
                        feature: FeatureId(2),
                        children: vec![leaf(0)],
                    },
                    leaf(1),
                ],
            }],
        };
        let mut seen = Vec::new();
        trie.walk(|node, depth| {
            let tag = match node {
                RuleNode::Internal { feature, .. } => feature.0,
                RuleNode::Leaf { tree } => 100 + tree.0,
            };
            seen.push((tag, depth));
        });
        assert_eq!(seen, vec![(1, 1), (2, 2), (100, 3), (101, 2)]);
    }

    #[test]
    fn feature_def_label_forms() {
        let def = FeatureDef {
            name: "income".into(),
            value: "<50k".into(),
            short: "inc".into(),
        };
        assert_eq!(def.name_value(), "income:<50k");
        assert_eq!(def.short_value(), "inc:<50k");
    }
}
