// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The explorer: one owner for the whole session state.

use canopy_filter::{FilterContext, FilterEngine, FilterState};
use canopy_model::{FeatureId, HierarchyData, LoadError, TreeId, TreeStats};
use canopy_palette::ColorAllocator;
use canopy_partition::{NodeId, Partition};
use canopy_zoom::{ZoomError, ZoomState, ZoomTransition};
use hashbrown::HashSet;
use log::info;

use crate::debounce::LabelDebouncer;
use crate::detail::TreeDetail;
use crate::render::{RenderRequest, visible_sectors};

/// Owns the loaded dataset and every piece of derived and interactive state.
///
/// All mutation funnels through the methods below; each one performs at most
/// one re-aggregation and returns exactly one [`RenderRequest`]. External
/// code reads state through the accessors and never mutates it directly.
#[derive(Clone, Debug)]
pub struct Explorer {
    data: HierarchyData,
    stats: TreeStats,
    partition: Partition,
    colors: ColorAllocator,
    filters: FilterEngine,
    zoom: ZoomState,
    labels: LabelDebouncer,
}

impl Explorer {
    /// Builds a full session from one hierarchy payload.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let data = HierarchyData::from_json(json)?;
        let stats = TreeStats::compute(&data);
        let partition = Partition::build(&data.trie);
        let colors = ColorAllocator::allocate(&data.features, &partition);
        let zoom = ZoomState::new(&partition);
        info!(
            "loaded {} trees, {} features, {} partition nodes",
            data.trees.len(),
            data.features.len(),
            partition.len()
        );
        Ok(Self {
            data,
            stats,
            partition,
            colors,
            filters: FilterEngine::new(),
            zoom,
            labels: LabelDebouncer::default(),
        })
    }

    /// Replaces the session with a new payload, atomically.
    ///
    /// The fresh state is built completely before anything is swapped; a
    /// failed load returns the error and leaves the current session exactly
    /// as it was.
    pub fn load_json(&mut self, json: &str, now_ms: u64) -> Result<RenderRequest, LoadError> {
        let fresh = Self::from_json(json)?;
        *self = fresh;
        self.labels.touch(now_ms);
        Ok(self.request(None))
    }

    /// Narrows the accepted accuracy range.
    pub fn set_accuracy_range(&mut self, low: f64, high: f64, now_ms: u64) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .set_accuracy_range(low, high, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Narrows the accepted minimum-leaf-sample range.
    pub fn set_min_sample_range(&mut self, low: u32, high: u32, now_ms: u64) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .set_min_sample_range(low, high, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Replaces the accepted height set; `None` accepts every height.
    pub fn set_heights(&mut self, heights: Option<HashSet<u32>>, now_ms: u64) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .set_heights(heights, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Replaces the accepted feature set at one depth.
    pub fn set_depth_features(
        &mut self,
        depth: u32,
        accepted: HashSet<FeatureId>,
        now_ms: u64,
    ) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .set_depth_features(depth, accepted, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Drops the restriction at one depth.
    pub fn clear_depth_features(&mut self, depth: u32, now_ms: u64) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .clear_depth_features(depth, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Replaces the all-depths feature set; `None` accepts every feature.
    pub fn set_all_features(
        &mut self,
        accepted: Option<HashSet<FeatureId>>,
        now_ms: u64,
    ) -> RenderRequest {
        let ctx = FilterContext {
            trees: &self.data.trees,
            stats: &self.stats,
        };
        self.filters
            .set_all_features(accepted, &ctx, &mut self.partition);
        self.after_refilter(now_ms)
    }

    /// Handles a sector click: zoom in, zoom out on the full-span sector, or
    /// an error for leaves (open the detail view instead).
    pub fn click(&mut self, target: NodeId, now_ms: u64) -> Result<RenderRequest, ZoomError> {
        let transition = self.zoom.click(&self.partition, target)?;
        self.labels.touch(now_ms);
        Ok(self.request(Some(transition)))
    }

    /// Explicit "back" affordance.
    pub fn zoom_out(&mut self, now_ms: u64) -> Result<RenderRequest, ZoomError> {
        let transition = self.zoom.zoom_out(&self.partition)?;
        self.labels.touch(now_ms);
        Ok(self.request(Some(transition)))
    }

    /// Changes the visible ring window; `new_high` clamps to the deepest ring.
    pub fn set_depth_window(&mut self, new_low: u32, new_high: u32, now_ms: u64) -> RenderRequest {
        let transition = self.zoom.set_depth_window(&self.partition, new_low, new_high);
        self.labels.touch(now_ms);
        self.request(Some(transition))
    }

    /// Drives the debounced label clock; `true` means lay labels out now.
    pub fn poll_labels(&mut self, now_ms: u64) -> bool {
        self.labels.poll(now_ms)
    }

    /// Projection for the detail window.
    #[must_use]
    pub fn tree_detail(&self, tree: TreeId) -> Option<TreeDetail> {
        self.data.trees.get(tree).map(|info| TreeDetail {
            tree,
            root: info.root.clone(),
            objective: info.objective,
            accuracy: info.accuracy,
        })
    }

    /// Distinct active trees under a sector, for the sector's hover summary.
    #[must_use]
    pub fn sector_trees(&self, node: NodeId) -> Vec<TreeId> {
        self.partition.descendant_tree_ids(node)
    }

    /// The loaded dataset.
    #[must_use]
    pub fn data(&self) -> &HierarchyData {
        &self.data
    }

    /// Derived per-tree stats.
    #[must_use]
    pub fn stats(&self) -> &TreeStats {
        &self.stats
    }

    /// The radial partition.
    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// The color scale and feature orders.
    #[must_use]
    pub fn colors(&self) -> &ColorAllocator {
        &self.colors
    }

    /// The navigation state.
    #[must_use]
    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    /// The current filter values.
    #[must_use]
    pub fn filter_state(&self) -> &FilterState {
        self.filters.state()
    }

    /// After a re-filter: keep the head view glued to its (moved) node, then
    /// emit geometry synchronously with labels deferred.
    fn after_refilter(&mut self, now_ms: u64) -> RenderRequest {
        let transition = self.zoom.refresh_domains(&self.partition);
        self.labels.touch(now_ms);
        let animated = (transition.from != transition.to).then_some(transition);
        self.request(animated)
    }

    fn request(&self, transition: Option<ZoomTransition>) -> RenderRequest {
        RenderRequest {
            sectors: visible_sectors(&self.partition, &self.colors, &self.zoom),
            transition,
            labels_at: self.labels.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use canopy_partition::SectorKind;

    use super::*;

    /// Three trees over two features, one shared prefix; depth_max = 3.
    const SMALL: &str = r#"{
        "trie": {
            "f": "root",
            "c": [
                { "f": "1", "c": [
                    { "f": "2", "c": [ { "f": "_", "t": 0 } ] },
                    { "f": "_", "t": 1 }
                ] },
                { "f": "2", "c": [ { "f": "_", "t": 2 } ] }
            ]
        },
        "featureMap": {
            "1": ["age", ">30", "age"],
            "2": ["income", "<50k", "inc"]
        },
        "treeMap": {
            "0": [
                { "f": ["1", 100, -1], "c": [
                    { "f": ["2", 60, -1], "c": [
                        { "f": ["+", 40, 35], "c": [] },
                        { "f": ["-", 20, 12], "c": [] }
                    ] },
                    { "f": ["-", 40, 30], "c": [] }
                ] },
                0.012, 0.85
            ],
            "1": [
                { "f": ["1", 100, -1], "c": [
                    { "f": ["+", 55, 44], "c": [] },
                    { "f": ["-", 45, 33], "c": [] }
                ] },
                0.013, 0.8
            ],
            "2": [
                { "f": ["2", 100, -1], "c": [
                    { "f": ["+", 70, 60], "c": [] },
                    { "f": ["-", 30, 22], "c": [] }
                ] },
                0.011, 0.9
            ]
        }
    }"#;

    const MISSING_TREE_MAP: &str = r#"{
        "trie": { "f": "root", "c": [ { "f": "1", "c": [ { "f": "_", "t": 0 } ] } ] },
        "featureMap": { "1": ["age", ">30", "age"] }
    }"#;

    #[test]
    fn initial_request_shows_every_active_sector() {
        let explorer = Explorer::from_json(SMALL).unwrap();
        let request = explorer.request(None);
        // Six non-root nodes, all active.
        assert_eq!(request.sectors.len(), 6);
        assert!(request.sectors.iter().all(|s| s.value > 0));
        // Split sectors carry colors, leaves do not.
        for sector in &request.sectors {
            assert_eq!(sector.color.is_some(), !sector.is_leaf());
        }
    }

    #[test]
    fn failed_load_leaves_the_previous_session_untouched() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        let nodes_before = explorer.partition().len();
        explorer.set_accuracy_range(0.85, 1.0, 0);

        let err = explorer.load_json(MISSING_TREE_MAP, 100).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));

        // Dataset A still loaded, filter state still applied.
        assert_eq!(explorer.data().trees.len(), 3);
        assert_eq!(explorer.partition().len(), nodes_before);
        assert_eq!(explorer.filter_state().accuracy, (0.85, 1.0));
        assert_eq!(
            explorer.partition().get(explorer.partition().root()).unwrap().tree_num,
            2
        );
    }

    #[test]
    fn filter_changes_drop_inactive_sectors_synchronously() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        // Tree 1 (accuracy 0.8) goes; its leaf disappears from the request.
        let request = explorer.set_accuracy_range(0.85, 1.0, 0);
        assert_eq!(request.sectors.len(), 5);
        assert!(
            request
                .sectors
                .iter()
                .all(|s| s.tree() != Some(TreeId(1)))
        );
    }

    #[test]
    fn leaf_clicks_report_instead_of_zooming() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        let leaf = explorer
            .partition()
            .iter()
            .find(|(_, node)| node.kind == SectorKind::Leaf(TreeId(1)))
            .map(|(id, _)| id)
            .unwrap();
        assert!(matches!(
            explorer.click(leaf, 0),
            Err(ZoomError::LeafTarget(_))
        ));
        // The detail view has what the panel needs instead.
        let detail = explorer.tree_detail(TreeId(1)).unwrap();
        assert_eq!(detail.accuracy, 0.8);
    }

    #[test]
    fn zooming_narrows_the_visible_sector_set() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        let f1 = NodeId::from_raw(1);
        let request = explorer.click(f1, 0).unwrap();
        let transition = request.transition.unwrap();
        assert_eq!(transition.head, f1);
        // The sibling subtree (feature 2 at depth 1) is out of the domain.
        assert_eq!(request.sectors.len(), 4);
        assert!(request.sectors.iter().all(|s| s.x0 < transition.to.x1));
    }

    #[test]
    fn depth_window_limits_visible_rings() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        let request = explorer.set_depth_window(1, 1, 0);
        assert_eq!(request.sectors.len(), 2);
        assert!(request.sectors.iter().all(|s| s.depth == 1));
        // Clamp: far too deep a window snaps to depth_max.
        let request = explorer.set_depth_window(1, 99, 10);
        assert_eq!(request.transition.unwrap().depth_high, 3);
        assert_eq!(request.sectors.len(), 6);
    }

    #[test]
    fn label_relayout_waits_for_the_end_of_a_burst() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        explorer.set_accuracy_range(0.0, 0.9, 0);
        let request = explorer.set_accuracy_range(0.0, 0.95, 100);
        assert_eq!(request.labels_at, Some(600));
        assert!(!explorer.poll_labels(599));
        assert!(explorer.poll_labels(600));
        assert!(!explorer.poll_labels(601));
    }

    #[test]
    fn sector_trees_reflect_active_filters() {
        let mut explorer = Explorer::from_json(SMALL).unwrap();
        let root = explorer.partition().root();
        assert_eq!(
            explorer.sector_trees(root),
            vec![TreeId(0), TreeId(1), TreeId(2)]
        );
        explorer.set_accuracy_range(0.85, 1.0, 0);
        assert_eq!(explorer.sector_trees(root), vec![TreeId(0), TreeId(2)]);
    }
}
