// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The filter engine: one setter per dimension, one re-aggregation per call.

use canopy_model::{FeatureId, TreeId, TreeStats, TreeTable};
use canopy_partition::Partition;
use hashbrown::HashSet;
use log::debug;

use crate::state::FilterState;

/// Ground truth the predicates evaluate against.
///
/// Borrowed from the loaded dataset for the duration of one filter change;
/// the engine itself never stores references into the dataset.
#[derive(Copy, Clone, Debug)]
pub struct FilterContext<'a> {
    /// Per-tree metrics from the load payload.
    pub trees: &'a TreeTable,
    /// Derived per-tree stats (heights, minimum samples, depth features).
    pub stats: &'a TreeStats,
}

/// Owns the [`FilterState`] and funnels every change through
/// [`Partition::apply_used`].
///
/// Setters replace one dimension and then re-evaluate *all five* against
/// ground truth, so the result never depends on the order dimensions were
/// narrowed in.
#[derive(Clone, Debug, Default)]
pub struct FilterEngine {
    state: FilterState,
}

impl FilterEngine {
    /// An engine with every dimension unrestricted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the current state.
    #[must_use]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Replaces the accepted accuracy range (inclusive).
    pub fn set_accuracy_range(
        &mut self,
        low: f64,
        high: f64,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.accuracy = (low, high);
        self.refresh(ctx, partition);
    }

    /// Replaces the accepted minimum-leaf-sample range (inclusive).
    pub fn set_min_sample_range(
        &mut self,
        low: u32,
        high: u32,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.min_samples = (low, high);
        self.refresh(ctx, partition);
    }

    /// Replaces the accepted height set; `None` accepts every height.
    pub fn set_heights(
        &mut self,
        heights: Option<HashSet<u32>>,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.heights = heights;
        self.refresh(ctx, partition);
    }

    /// Replaces the accepted feature set at one depth (root split = 1).
    pub fn set_depth_features(
        &mut self,
        depth: u32,
        accepted: HashSet<FeatureId>,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.depth_features.insert(depth, accepted);
        self.refresh(ctx, partition);
    }

    /// Removes the restriction at one depth.
    pub fn clear_depth_features(
        &mut self,
        depth: u32,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.depth_features.remove(&depth);
        self.refresh(ctx, partition);
    }

    /// Replaces the all-depths feature set; `None` accepts every feature.
    pub fn set_all_features(
        &mut self,
        accepted: Option<HashSet<FeatureId>>,
        ctx: &FilterContext<'_>,
        partition: &mut Partition,
    ) {
        self.state.all_features = accepted;
        self.refresh(ctx, partition);
    }

    /// Re-marks every leaf from the current state and re-aggregates.
    ///
    /// Also the entry point after a reload, when the state should survive a
    /// fresh partition.
    pub fn refresh(&self, ctx: &FilterContext<'_>, partition: &mut Partition) {
        debug!("re-filtering, restricted dimensions: {:?}", self.state.restricted());
        partition.apply_used(|tree| self.state.passes(tree, ctx));
    }

    /// Evaluates the current predicates for one tree without touching the
    /// partition.
    #[must_use]
    pub fn passes(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        self.state.passes(tree, ctx)
    }

    /// Drops every restriction without re-aggregating; call
    /// [`FilterEngine::refresh`] afterwards.
    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }
}
