// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire format: the compact JSON shapes produced by the model search, and the
//! validated conversion into the typed model.
//!
//! The payload is one JSON document with three required top-level keys:
//!
//! ```json
//! {
//!   "trie":       { "f": "root", "c": [ { "f": "7", "c": [ { "f": "_", "t": 0 } ] } ] },
//!   "featureMap": { "7": ["sex", "female", "sex"] },
//!   "treeMap":    { "0": [ { "f": ["7", 100, -1], "c": [ ... ] }, 0.012, 0.83 ] }
//! }
//! ```
//!
//! Rule codes (`f` on trie nodes): a numeric string names a feature-value
//! pair, `"_"` terminates one tree's path (and carries `t`, the tree ID),
//! `"root"` marks the synthetic root, and `";"` is renderer padding with no
//! content — it is dropped here. Tree-structure labels are
//! `[code, samples, correct]` with `"+"`/`"-"` leaf codes and `correct == -1`
//! on internal nodes.
//!
//! Loading is atomic: conversion either yields a complete [`HierarchyData`]
//! or a [`LoadError`], never partial state.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::types::{
    FeatureDef, FeatureId, FeatureTable, HierarchyData, RuleNode, TreeId, TreeInfo, TreeNode,
    TreeTable, Trie,
};

/// Rejection of a load payload. The previous session state, if any, is
/// unaffected: these are returned before anything is replaced.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document is not valid JSON or is missing a required key.
    #[error("malformed hierarchy JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A trie node carries a code that is not numeric, `"_"`, `"root"`, or `";"`.
    #[error("unrecognized rule code {code:?} in the trie")]
    BadRuleCode {
        /// The offending code.
        code: String,
    },
    /// The top-level trie node is not the synthetic root.
    #[error("trie root has code {code:?}, expected \"root\"")]
    BadRoot {
        /// The offending code.
        code: String,
    },
    /// A `"_"` leaf has no tree ID.
    #[error("leaf rule node is missing a tree id")]
    LeafWithoutTree,
    /// An internal trie node ended up with no children.
    #[error("internal rule node on {feature} has no children")]
    ChildlessInternal {
        /// The feature the childless node splits on.
        feature: FeatureId,
    },
    /// A `featureMap` key is not an integer feature ID.
    #[error("feature table key {key:?} is not an integer id")]
    BadFeatureKey {
        /// The offending key.
        key: String,
    },
    /// A `featureMap` entry has fewer than the two required fields.
    #[error("feature table entry for {id} has fewer than two fields")]
    ShortFeatureEntry {
        /// The underspecified feature.
        id: FeatureId,
    },
    /// A `treeMap` key is not an integer tree ID.
    #[error("tree table key {key:?} is not an integer id")]
    BadTreeKey {
        /// The offending key.
        key: String,
    },
    /// A tree-structure label carries a code that is not numeric, `"+"`, or `"-"`.
    #[error("unrecognized split code {code:?} in {tree}")]
    BadSplitCode {
        /// The offending code.
        code: String,
        /// The tree whose structure carried it.
        tree: TreeId,
    },
    /// Strict mode only: the payload parsed but references unknown IDs.
    #[error("data integrity: {0}")]
    Integrity(IntegrityIssue),
}

/// A referential gap between the trie and the lookup tables.
///
/// These indicate the model-search output and this payload's tables went out
/// of sync. The default loader reports them and continues (affected sectors
/// get blank labels and a fallback color); the strict loader rejects instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum IntegrityIssue {
    /// A feature ID is referenced but has no `featureMap` entry.
    #[error("{0} is referenced but missing from the feature table")]
    UnknownFeature(FeatureId),
    /// A trie leaf references a tree ID with no `treeMap` entry.
    #[error("{0} is referenced by a trie leaf but missing from the tree table")]
    UnknownTree(TreeId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRuleNode {
    f: String,
    #[serde(default)]
    c: Vec<RawRuleNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<u32>,
}

/// One tree-structure node in wire form: `f = [code, samples, correct]`.
///
/// Public so the favorites export can serialize trees back into the same
/// compact shape they were loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTreeNode {
    /// `[code, samples, correct]`; `correct` is `-1` on internal nodes.
    pub f: (String, i64, i64),
    /// Child subtrees, outermost split first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub c: Vec<RawTreeNode>,
}

impl RawTreeNode {
    /// Re-encodes a typed tree into wire form.
    #[must_use]
    pub fn from_tree(node: &TreeNode) -> Self {
        match node {
            TreeNode::Split {
                feature,
                samples,
                children,
            } => Self {
                f: (feature.0.to_string(), i64::from(*samples), -1),
                c: children.iter().map(Self::from_tree).collect(),
            },
            TreeNode::Verdict {
                positive,
                samples,
                correct,
            } => Self {
                f: (
                    if *positive { "+" } else { "-" }.to_string(),
                    i64::from(*samples),
                    i64::from(*correct),
                ),
                c: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHierarchy {
    trie: RawRuleNode,
    #[serde(rename = "featureMap")]
    feature_map: BTreeMap<String, Vec<String>>,
    #[serde(rename = "treeMap")]
    tree_map: BTreeMap<String, (RawTreeNode, f64, f64)>,
}

/// Converts one raw trie node. `Ok(None)` means the node was `";"` padding.
fn convert_rule(raw: &RawRuleNode) -> Result<Option<RuleNode>, LoadError> {
    match raw.f.as_str() {
        "_" => {
            let tree = raw.t.ok_or(LoadError::LeafWithoutTree)?;
            Ok(Some(RuleNode::Leaf {
                tree: TreeId(tree),
            }))
        }
        ";" => {
            debug!("dropping padding rule node");
            Ok(None)
        }
        code => {
            let feature = code
                .parse::<u32>()
                .map(FeatureId)
                .map_err(|_| LoadError::BadRuleCode {
                    code: code.to_string(),
                })?;
            let mut children = Vec::with_capacity(raw.c.len());
            for child in &raw.c {
                if let Some(node) = convert_rule(child)? {
                    children.push(node);
                }
            }
            if children.is_empty() {
                return Err(LoadError::ChildlessInternal { feature });
            }
            Ok(Some(RuleNode::Internal { feature, children }))
        }
    }
}

fn convert_trie(raw: &RawRuleNode) -> Result<Trie, LoadError> {
    if raw.f != "root" {
        return Err(LoadError::BadRoot {
            code: raw.f.clone(),
        });
    }
    let mut children = Vec::with_capacity(raw.c.len());
    for child in &raw.c {
        if let Some(node) = convert_rule(child)? {
            children.push(node);
        }
    }
    Ok(Trie { children })
}

fn convert_tree(raw: &RawTreeNode, tree: TreeId) -> Result<TreeNode, LoadError> {
    let (code, samples, correct) = (&raw.f.0, raw.f.1, raw.f.2);
    let samples = u32::try_from(samples.max(0)).unwrap_or(u32::MAX);
    match code.as_str() {
        "+" | "-" => Ok(TreeNode::Verdict {
            positive: code == "+",
            samples,
            correct: u32::try_from(correct.max(0)).unwrap_or(u32::MAX),
        }),
        _ => {
            let feature =
                code.parse::<u32>()
                    .map(FeatureId)
                    .map_err(|_| LoadError::BadSplitCode {
                        code: code.clone(),
                        tree,
                    })?;
            let children = raw
                .c
                .iter()
                .map(|child| convert_tree(child, tree))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TreeNode::Split {
                feature,
                samples,
                children,
            })
        }
    }
}

fn convert_features(raw: &BTreeMap<String, Vec<String>>) -> Result<FeatureTable, LoadError> {
    let mut map = HashMap::with_capacity(raw.len());
    for (key, entry) in raw {
        let id = key
            .parse::<u32>()
            .map(FeatureId)
            .map_err(|_| LoadError::BadFeatureKey { key: key.clone() })?;
        if entry.len() < 2 {
            return Err(LoadError::ShortFeatureEntry { id });
        }
        let name = entry[0].clone();
        let short = entry.get(2).cloned().unwrap_or_else(|| name.clone());
        map.insert(
            id,
            FeatureDef {
                name,
                value: entry[1].clone(),
                short,
            },
        );
    }
    Ok(FeatureTable { map })
}

fn convert_trees(
    raw: &BTreeMap<String, (RawTreeNode, f64, f64)>,
) -> Result<TreeTable, LoadError> {
    let mut map = HashMap::with_capacity(raw.len());
    for (key, (root, objective, accuracy)) in raw {
        let id = key
            .parse::<u32>()
            .map(TreeId)
            .map_err(|_| LoadError::BadTreeKey { key: key.clone() })?;
        map.insert(
            id,
            TreeInfo {
                root: convert_tree(root, id)?,
                objective: *objective,
                accuracy: *accuracy,
            },
        );
    }
    Ok(TreeTable { map })
}

impl HierarchyData {
    /// Parses and validates a complete payload.
    ///
    /// Structural problems reject the load; referential gaps are logged as
    /// warnings and tolerated (blank-label degradation downstream).
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let data = Self::parse(json)?;
        for issue in data.integrity_issues() {
            warn!("data integrity: {issue}");
        }
        Ok(data)
    }

    /// Like [`from_json`](Self::from_json), but rejects payloads with any
    /// referential gap instead of degrading.
    pub fn from_json_strict(json: &str) -> Result<Self, LoadError> {
        let data = Self::parse(json)?;
        if let Some(issue) = data.integrity_issues().into_iter().next() {
            return Err(LoadError::Integrity(issue));
        }
        Ok(data)
    }

    fn parse(json: &str) -> Result<Self, LoadError> {
        let raw: RawHierarchy = serde_json::from_str(json)?;
        Ok(Self {
            trie: convert_trie(&raw.trie)?,
            features: convert_features(&raw.feature_map)?,
            trees: convert_trees(&raw.tree_map)?,
        })
    }

    /// Scans for referential gaps between the trie, the tree structures, and
    /// the lookup tables. Order is deterministic (trie first, then trees by
    /// ID); each issue is reported once.
    #[must_use]
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut seen = HashSet::new();
        let mut issues = Vec::new();
        let mut push = |issue: IntegrityIssue, issues: &mut Vec<IntegrityIssue>| {
            if seen.insert(issue) {
                issues.push(issue);
            }
        };

        self.trie.walk(|node, _| match *node {
            RuleNode::Internal { feature, .. } => {
                if self.features.get(feature).is_none() {
                    push(IntegrityIssue::UnknownFeature(feature), &mut issues);
                }
            }
            RuleNode::Leaf { tree } => {
                if self.trees.get(tree).is_none() {
                    push(IntegrityIssue::UnknownTree(tree), &mut issues);
                }
            }
        });

        let mut ids: Vec<TreeId> = self.trees.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(info) = self.trees.get(id) {
                info.root.walk(|node, _| {
                    if let TreeNode::Split { feature, .. } = *node {
                        if self.features.get(feature).is_none() {
                            push(IntegrityIssue::UnknownFeature(feature), &mut issues);
                        }
                    }
                });
            }
        }
        issues
    }
}
