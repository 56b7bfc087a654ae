// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived per-tree metadata, computed once per load.
//!
//! The filter engine never walks the trie or the tree structures while a
//! slider moves; it evaluates predicates against these precomputed maps.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};

use crate::types::{FeatureId, HierarchyData, RuleNode, TreeId, TreeNode};

/// Per-tree metadata derived from one full pass over the payload.
///
/// - *Height*: the number of splits along the deepest root-to-leaf path,
///   taken as the maximum over every trie leaf carrying the tree's ID.
/// - *Minimum leaf samples*: the smallest sample count on any classification
///   leaf of the tree's own structure.
/// - *Depth features*: for each depth (root split = 1), the set of
///   feature-value pairs the tree splits on anywhere at that depth.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    heights: HashMap<TreeId, u32>,
    min_samples: HashMap<TreeId, u32>,
    depth_features: HashMap<TreeId, BTreeMap<u32, HashSet<FeatureId>>>,
}

impl TreeStats {
    /// Runs the full derivation pass.
    #[must_use]
    pub fn compute(data: &HierarchyData) -> Self {
        let mut heights: HashMap<TreeId, u32> = HashMap::with_capacity(data.trees.len());
        data.trie.walk(|node, depth| {
            if let RuleNode::Leaf { tree } = *node {
                // The `_` terminator sits one level below the last split.
                let splits = depth.saturating_sub(1);
                let entry = heights.entry(tree).or_insert(0);
                *entry = (*entry).max(splits);
            }
        });

        let mut min_samples = HashMap::with_capacity(data.trees.len());
        let mut depth_features = HashMap::with_capacity(data.trees.len());
        for (id, info) in data.trees.iter() {
            let mut min: Option<u32> = None;
            let mut per_depth: BTreeMap<u32, HashSet<FeatureId>> = BTreeMap::new();
            info.root.walk(|node, depth| match *node {
                TreeNode::Split { feature, .. } => {
                    per_depth.entry(depth).or_default().insert(feature);
                }
                TreeNode::Verdict { samples, .. } => {
                    min = Some(min.map_or(samples, |m| m.min(samples)));
                }
            });
            min_samples.insert(id, min.unwrap_or(0));
            depth_features.insert(id, per_depth);
        }

        Self {
            heights,
            min_samples,
            depth_features,
        }
    }

    /// Height of a tree (splits on its deepest path), if the ID appears in
    /// the trie.
    #[must_use]
    pub fn height(&self, id: TreeId) -> Option<u32> {
        self.heights.get(&id).copied()
    }

    /// The largest height over all trees; `0` for an empty set.
    #[must_use]
    pub fn max_height(&self) -> u32 {
        self.heights.values().copied().max().unwrap_or(0)
    }

    /// Minimum leaf sample count of a tree, if the ID is in the tree table.
    #[must_use]
    pub fn min_samples(&self, id: TreeId) -> Option<u32> {
        self.min_samples.get(&id).copied()
    }

    /// The largest minimum-leaf-sample value over all trees.
    #[must_use]
    pub fn max_min_samples(&self) -> u32 {
        self.min_samples.values().copied().max().unwrap_or(0)
    }

    /// Features a tree splits on, keyed by depth (root split = 1).
    ///
    /// Depths the tree never reaches are absent from the map.
    #[must_use]
    pub fn features_at(&self, id: TreeId) -> Option<&BTreeMap<u32, HashSet<FeatureId>>> {
        self.depth_features.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureTable, TreeInfo, TreeTable, Trie};

    fn verdict(positive: bool, samples: u32, correct: u32) -> TreeNode {
        TreeNode::Verdict {
            positive,
            samples,
            correct,
        }
    }

    fn data() -> HierarchyData {
        // Trie:
        //   f1 ── f2 ── _t0        (tree 0: two splits)
        //      └─ _t1               (tree 1: one split)
        //   f2 ── _t0               (tree 0 again, shallower path)
        let trie = Trie {
            children: vec![
                RuleNode::Internal {
                    feature: FeatureId(1),
                    children: vec![
                        RuleNode::Internal {
                            feature: FeatureId(2),
                            children: vec![RuleNode::Leaf { tree: TreeId(0) }],
                        },
                        RuleNode::Leaf { tree: TreeId(1) },
                    ],
                },
                RuleNode::Internal {
                    feature: FeatureId(2),
                    children: vec![RuleNode::Leaf { tree: TreeId(0) }],
                },
            ],
        };

        let tree0 = TreeNode::Split {
            feature: FeatureId(1),
            samples: 100,
            children: vec![
                TreeNode::Split {
                    feature: FeatureId(2),
                    samples: 60,
                    children: vec![verdict(true, 40, 35), verdict(false, 20, 12)],
                },
                verdict(false, 40, 30),
            ],
        };
        let tree1 = TreeNode::Split {
            feature: FeatureId(1),
            samples: 100,
            children: vec![verdict(true, 55, 44), verdict(false, 45, 33)],
        };

        let mut trees = TreeTable::default();
        trees.map.insert(
            TreeId(0),
            TreeInfo {
                root: tree0,
                objective: 0.012,
                accuracy: 0.85,
            },
        );
        trees.map.insert(
            TreeId(1),
            TreeInfo {
                root: tree1,
                objective: 0.013,
                accuracy: 0.8,
            },
        );

        HierarchyData {
            trie,
            features: FeatureTable::default(),
            trees,
        }
    }

    #[test]
    fn heights_track_the_deepest_trie_leaf() {
        let stats = TreeStats::compute(&data());
        // Tree 0 appears at depths 3 and 2; deepest path has 2 splits.
        assert_eq!(stats.height(TreeId(0)), Some(2));
        assert_eq!(stats.height(TreeId(1)), Some(1));
        assert_eq!(stats.max_height(), 2);
        assert_eq!(stats.height(TreeId(99)), None);
    }

    #[test]
    fn min_samples_is_the_smallest_leaf() {
        let stats = TreeStats::compute(&data());
        assert_eq!(stats.min_samples(TreeId(0)), Some(20));
        assert_eq!(stats.min_samples(TreeId(1)), Some(45));
        assert_eq!(stats.max_min_samples(), 45);
    }

    #[test]
    fn depth_features_index_splits_by_level() {
        let stats = TreeStats::compute(&data());
        let map = stats.features_at(TreeId(0)).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map[&1].contains(&FeatureId(1)));
        assert!(map[&2].contains(&FeatureId(2)));
        // Tree 1 only splits at the root.
        let map = stats.features_at(TreeId(1)).unwrap();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1]);
    }
}
