// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The partition arena: build, aggregation, and angular layout.

use canopy_model::{RuleNode, TreeId, Trie};
use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::node::{NodeId, PartitionNode, SectorKind};

/// The radial partition over one loaded trie.
///
/// Built once per dataset by [`Partition::build`]; re-aggregated in place by
/// [`Partition::apply_used`] on every filter change. Node identities
/// ([`NodeId`]s) are stable for the lifetime of the partition.
#[derive(Clone, Debug)]
pub struct Partition {
    nodes: Vec<PartitionNode>,
    depth_max: u32,
}

impl Partition {
    /// Flattens the trie into an arena and computes the initial (unfiltered)
    /// rollups and layout. Every leaf starts `used`.
    #[must_use]
    pub fn build(trie: &Trie) -> Self {
        fn push_rule(nodes: &mut Vec<PartitionNode>, rule: &RuleNode, parent: NodeId, depth: u32) {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            let id = NodeId(nodes.len() as u32);
            nodes[parent.idx()].children.push(id);
            let kind = match rule {
                RuleNode::Internal { feature, .. } => SectorKind::Split(*feature),
                RuleNode::Leaf { tree } => SectorKind::Leaf(*tree),
            };
            nodes.push(PartitionNode {
                parent: Some(parent),
                children: SmallVec::new(),
                kind,
                depth,
                x0: 0.0,
                x1: 0.0,
                y0: 0.0,
                y1: 0.0,
                value: 0,
                tree_num: 0,
                used: true,
            });
            if let RuleNode::Internal { children, .. } = rule {
                for child in children {
                    push_rule(nodes, child, id, depth + 1);
                }
            }
        }

        let mut nodes = vec![PartitionNode {
            parent: None,
            children: SmallVec::new(),
            kind: SectorKind::Root,
            depth: 0,
            x0: 0.0,
            x1: 1.0,
            y0: 0.0,
            y1: 0.0,
            value: 0,
            tree_num: 0,
            used: true,
        }];
        for child in &trie.children {
            push_rule(&mut nodes, child, NodeId(0), 1);
        }

        let depth_max = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let mut partition = Self { nodes, depth_max };
        partition.aggregate();
        partition.freeze_draw_order();
        partition.relayout();
        partition
    }

    /// Orders every sibling list by descending initial subtree value (ties
    /// keep trie order), once. Later re-filters shrink and grow widths but
    /// never move a sector past a sibling.
    fn freeze_draw_order(&mut self) {
        for i in 0..self.nodes.len() {
            let mut order = core::mem::take(&mut self.nodes[i].children);
            order.sort_by(|a, b| self.nodes[b.idx()].value.cmp(&self.nodes[a.idx()].value));
            self.nodes[i].children = order;
        }
    }

    /// Re-marks every leaf from ground truth and recomputes rollups and
    /// angular layout in place. This is the single mutation funnel used by
    /// the filter engine; O(arena) per call.
    pub fn apply_used(&mut self, keep: impl Fn(TreeId) -> bool) {
        for node in &mut self.nodes {
            if let SectorKind::Leaf(tree) = node.kind {
                node.used = keep(tree);
            }
        }
        self.aggregate();
        self.relayout();
    }

    /// Recomputes `value` (used-leaf path counts) and `tree_num`
    /// (deduplicated tree IDs) bottom-up.
    ///
    /// Pre-order IDs put children after their parent, so a reverse index scan
    /// is a post-order traversal. The per-node tree-ID sets are scratch: each
    /// child's set is consumed by its parent and everything is dropped before
    /// returning, keeping memory bounded by the arena's breadth.
    fn aggregate(&mut self) {
        let n = self.nodes.len();
        let mut sets: Vec<Option<HashSet<TreeId>>> = Vec::with_capacity(n);
        sets.resize_with(n, || None);

        for i in (0..n).rev() {
            match self.nodes[i].kind {
                SectorKind::Leaf(tree) => {
                    let used = self.nodes[i].used;
                    self.nodes[i].value = u64::from(used);
                    let mut set = HashSet::new();
                    if used {
                        set.insert(tree);
                    }
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "tree IDs are 32-bit, so a set of them fits in u32."
                    )]
                    {
                        self.nodes[i].tree_num = set.len() as u32;
                    }
                    sets[i] = Some(set);
                }
                SectorKind::Root | SectorKind::Split(_) => {
                    let children = self.nodes[i].children.clone();
                    let mut value = 0;
                    let mut acc: HashSet<TreeId> = HashSet::new();
                    for child in &children {
                        value += self.nodes[child.idx()].value;
                        if let Some(child_set) = sets[child.idx()].take() {
                            if child_set.len() > acc.len() {
                                // Union into the larger side.
                                let smaller = core::mem::replace(&mut acc, child_set);
                                acc.extend(smaller);
                            } else {
                                acc.extend(child_set);
                            }
                        }
                    }
                    self.nodes[i].value = value;
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "tree IDs are 32-bit, so a set of them fits in u32."
                    )]
                    {
                        self.nodes[i].tree_num = acc.len() as u32;
                    }
                    sets[i] = Some(acc);
                }
            }
        }
    }

    /// Recomputes every node's `x0..x1` and `y0..y1` from the current
    /// `value`s. Rings are uniform per depth; each node's angular span is
    /// divided among its children proportional to value, walked in the
    /// frozen draw order, cumulative across siblings. Zero-value children
    /// collapse to `x1 == x0` at the cursor — widths are never negative.
    fn relayout(&mut self) {
        let ring = 1.0 / f64::from(self.depth_max + 1);
        for node in &mut self.nodes {
            node.y0 = f64::from(node.depth) * ring;
            node.y1 = f64::from(node.depth + 1) * ring;
        }

        self.nodes[0].x0 = 0.0;
        self.nodes[0].x1 = 1.0;
        let mut stack = vec![NodeId(0)];
        while let Some(id) = stack.pop() {
            let i = id.idx();
            let (x0, x1, total) = (self.nodes[i].x0, self.nodes[i].x1, self.nodes[i].value);
            let span = x1 - x0;

            let mut cursor = x0;
            for child in self.nodes[i].children.clone() {
                let ci = child.idx();
                let width = if total == 0 {
                    0.0
                } else {
                    span * (self.nodes[ci].value as f64) / (total as f64)
                };
                self.nodes[ci].x0 = cursor;
                self.nodes[ci].x1 = cursor + width;
                cursor += width;
                stack.push(child);
            }
        }
    }

    /// The synthetic root (always ID 0).
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Looks up a node; `None` for IDs from another partition generation.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&PartitionNode> {
        self.nodes.get(id.idx())
    }

    /// Number of nodes in the arena (including the root).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds only the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Deepest node depth; rings span `0..=depth_max`.
    #[must_use]
    pub const fn depth_max(&self) -> u32 {
        self.depth_max
    }

    /// Child IDs of a node, in frozen draw order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.idx())
            .map_or(&[], |node| node.children.as_slice())
    }

    /// Walks from a node to the root, starting with the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.get(id).map(|_| id);
        core::iter::from_fn(move || {
            let id = cur?;
            cur = self.nodes[id.idx()].parent;
            Some(id)
        })
    }

    /// Distinct tree IDs among the *used* leaves under a node, sorted.
    ///
    /// This feeds the detail view when a sector is inspected.
    #[must_use]
    pub fn descendant_tree_ids(&self, id: NodeId) -> Vec<TreeId> {
        let mut out = HashSet::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else { continue };
            if let SectorKind::Leaf(tree) = node.kind {
                if node.used {
                    out.insert(tree);
                }
            }
            stack.extend(node.children.iter().copied());
        }
        let mut ids: Vec<TreeId> = out.into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterates the arena in pre-order (trie order, stable across filters).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PartitionNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            let id = NodeId(i as u32);
            (id, node)
        })
    }
}

#[cfg(test)]
mod tests {
    use canopy_model::FeatureId;

    use super::*;

    const TOL: f64 = 1e-9;

    fn leaf(t: u32) -> RuleNode {
        RuleNode::Leaf { tree: TreeId(t) }
    }

    fn split(f: u32, children: Vec<RuleNode>) -> RuleNode {
        RuleNode::Internal {
            feature: FeatureId(f),
            children,
        }
    }

    /// Five paths over four trees; tree 0 reaches two different leaves.
    ///
    ///   f1 ── f2 ── { _t0, _t1, _t2 }
    ///      └─ _t3
    ///   f3 ── _t0
    fn fixture() -> Trie {
        Trie {
            children: vec![
                split(1, vec![split(2, vec![leaf(0), leaf(1), leaf(2)]), leaf(3)]),
                split(3, vec![leaf(0)]),
            ],
        }
    }

    /// Brute-force oracle for `tree_num`: distinct used leaf trees below `id`.
    fn brute_tree_num(p: &Partition, id: NodeId) -> u32 {
        u32::try_from(p.descendant_tree_ids(id).len()).unwrap()
    }

    fn assert_tiling(p: &Partition) {
        for (id, node) in p.iter() {
            assert!(node.x1 >= node.x0 - TOL, "{id} has negative width");
            let kids = p.children(id);
            if kids.is_empty() {
                continue;
            }
            let child_sum: f64 = kids.iter().map(|c| p.get(*c).unwrap().width()).sum();
            assert!(
                (child_sum - node.width()).abs() < TOL,
                "{id}: children tile {child_sum}, parent spans {}",
                node.width()
            );
            // Contiguity: sorted by x0, each child starts where another ends.
            let mut ranges: Vec<(f64, f64)> =
                kids.iter().map(|c| p.get(*c).map(|n| (n.x0, n.x1)).unwrap()).collect();
            ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut cursor = node.x0;
            for (x0, x1) in ranges {
                assert!((x0 - cursor).abs() < TOL, "{id}: gap or overlap at {x0}");
                cursor = x1;
            }
            assert!((cursor - node.x1).abs() < TOL, "{id}: children end at {cursor}");
        }
    }

    #[test]
    fn node_ids_are_preorder() {
        let p = Partition::build(&fixture());
        // root, f1, f2, _t0, _t1, _t2, _t3, f3, _t0
        assert_eq!(p.len(), 9);
        let kinds: Vec<SectorKind> = p.iter().map(|(_, n)| n.kind).collect();
        assert_eq!(kinds[0], SectorKind::Root);
        assert_eq!(kinds[1], SectorKind::Split(FeatureId(1)));
        assert_eq!(kinds[2], SectorKind::Split(FeatureId(2)));
        assert_eq!(kinds[3], SectorKind::Leaf(TreeId(0)));
        assert_eq!(kinds[6], SectorKind::Leaf(TreeId(3)));
        assert_eq!(kinds[7], SectorKind::Split(FeatureId(3)));
        assert_eq!(kinds[8], SectorKind::Leaf(TreeId(0)));
    }

    #[test]
    fn values_count_paths_and_tree_num_deduplicates() {
        let p = Partition::build(&fixture());
        let root = p.get(p.root()).unwrap();
        // Five root-to-leaf paths, four distinct trees.
        assert_eq!(root.value, 5);
        assert_eq!(root.tree_num, 4);
        // The shared f2 prefix holds three trees, one per leaf.
        let f2 = p.get(NodeId(2)).unwrap();
        assert_eq!(f2.value, 3);
        assert_eq!(f2.tree_num, 3);
        for leaf_id in [3, 4, 5] {
            assert_eq!(p.get(NodeId(leaf_id)).unwrap().tree_num, 1);
        }
    }

    #[test]
    fn tree_num_matches_brute_force_everywhere() {
        let p = Partition::build(&fixture());
        for (id, node) in p.iter() {
            assert_eq!(node.tree_num, brute_tree_num(&p, id), "at {id}");
        }
    }

    #[test]
    fn children_tile_their_parent_exactly() {
        let p = Partition::build(&fixture());
        assert_tiling(&p);
        // Root spans the full circle; rings are uniform.
        let root = p.get(p.root()).unwrap();
        assert_eq!((root.x0, root.x1), (0.0, 1.0));
        assert_eq!(p.depth_max(), 3);
        let f1 = p.get(NodeId(1)).unwrap();
        assert!((f1.y0 - 0.25).abs() < TOL);
        assert!((f1.y1 - 0.5).abs() < TOL);
    }

    #[test]
    fn larger_subtrees_are_laid_out_first() {
        let p = Partition::build(&fixture());
        // f1 (4 paths) should start at 0.0; f3 (1 path) after it.
        let f1 = p.get(NodeId(1)).unwrap();
        let f3 = p.get(NodeId(7)).unwrap();
        assert!((f1.x0 - 0.0).abs() < TOL);
        assert!((f1.x1 - 0.8).abs() < TOL);
        assert!((f3.x0 - 0.8).abs() < TOL);
        assert!((f3.x1 - 1.0).abs() < TOL);
    }

    #[test]
    fn filtering_reaggregates_in_place() {
        let mut p = Partition::build(&fixture());
        p.apply_used(|tree| tree == TreeId(0));
        let root = p.get(p.root()).unwrap();
        // Two paths survive, one distinct tree.
        assert_eq!(root.value, 2);
        assert_eq!(root.tree_num, 1);
        // The f2 subtree keeps only the _t0 path.
        assert_eq!(p.get(NodeId(2)).unwrap().value, 1);
        assert_eq!(p.get(NodeId(2)).unwrap().tree_num, 1);
        // Unused leaves collapse to zero width but keep their identity.
        let t1 = p.get(NodeId(4)).unwrap();
        assert_eq!(t1.kind, SectorKind::Leaf(TreeId(1)));
        assert!(!t1.used);
        assert!(t1.width().abs() < TOL);
        assert_tiling(&p);
        for (id, node) in p.iter() {
            assert_eq!(node.tree_num, brute_tree_num(&p, id), "at {id}");
        }
    }

    #[test]
    fn refiltering_resizes_but_never_reorders_siblings() {
        // fA (3 paths) draws before fB (2 paths) at build time.
        let trie = Trie {
            children: vec![
                split(1, vec![leaf(0), leaf(1), leaf(2)]),
                split(2, vec![leaf(3), leaf(4)]),
            ],
        };
        let mut p = Partition::build(&trie);
        let (fa, fb) = (NodeId(1), NodeId(5));
        assert!(p.get(fa).unwrap().x0.abs() < TOL);

        // fB overtakes fA in value but keeps its angular position: sectors
        // shrink and grow across a session, they never trade places.
        p.apply_used(|tree| tree.0 >= 2);
        let fa = p.get(fa).unwrap();
        let fb = p.get(fb).unwrap();
        assert!(fa.value < fb.value);
        assert!(fa.x0.abs() < TOL && (fa.x1 - 1.0 / 3.0).abs() < TOL);
        assert!((fb.x0 - 1.0 / 3.0).abs() < TOL && (fb.x1 - 1.0).abs() < TOL);
        assert_tiling(&p);
    }

    #[test]
    fn filtering_everything_out_keeps_widths_non_negative() {
        let mut p = Partition::build(&fixture());
        p.apply_used(|_| false);
        let root = p.get(p.root()).unwrap();
        assert_eq!(root.value, 0);
        assert_eq!(root.tree_num, 0);
        for (id, node) in p.iter() {
            assert!(node.x1 >= node.x0, "{id} went negative");
            if node.parent.is_some() {
                assert!(node.width().abs() < TOL);
            }
        }
        // Radial structure is untouched by filtering.
        assert_eq!(p.depth_max(), 3);
    }

    #[test]
    fn unfilter_restores_the_initial_layout() {
        let mut p = Partition::build(&fixture());
        let before: Vec<(f64, f64)> = p.iter().map(|(_, n)| (n.x0, n.x1)).collect();
        p.apply_used(|tree| tree == TreeId(2));
        p.apply_used(|_| true);
        let after: Vec<(f64, f64)> = p.iter().map(|(_, n)| (n.x0, n.x1)).collect();
        for (b, a) in before.iter().zip(&after) {
            assert!((b.0 - a.0).abs() < TOL && (b.1 - a.1).abs() < TOL);
        }
    }

    #[test]
    fn ancestors_walk_to_the_root() {
        let p = Partition::build(&fixture());
        let chain: Vec<NodeId> = p.ancestors(NodeId(3)).collect();
        assert_eq!(chain, vec![NodeId(3), NodeId(2), NodeId(1), NodeId(0)]);
    }

    #[test]
    fn descendant_tree_ids_respect_used_flags() {
        let mut p = Partition::build(&fixture());
        assert_eq!(
            p.descendant_tree_ids(p.root()),
            vec![TreeId(0), TreeId(1), TreeId(2), TreeId(3)]
        );
        p.apply_used(|tree| tree.0 % 2 == 0);
        assert_eq!(
            p.descendant_tree_ids(p.root()),
            vec![TreeId(0), TreeId(2)]
        );
    }
}
