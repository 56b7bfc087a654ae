// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter state and the per-tree predicates.

use bitflags::bitflags;
use canopy_model::{FeatureId, TreeId};
use hashbrown::{HashMap, HashSet};

use crate::engine::FilterContext;

bitflags! {
    /// The five filter dimensions.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FilterDimensions: u8 {
        /// Accuracy range over the reference dataset.
        const ACCURACY = 1 << 0;
        /// Range over each tree's minimum leaf sample count.
        const MIN_SAMPLE = 1 << 1;
        /// Set of accepted tree heights.
        const HEIGHT = 1 << 2;
        /// Per-depth accepted feature sets.
        const DEPTH_FEATURES = 1 << 3;
        /// One accepted feature set applied at every depth.
        const ALL_FEATURES = 1 << 4;
    }
}

/// The current value of all five filter dimensions.
///
/// Ranges are inclusive. `None` sets and absent depth entries mean
/// "unrestricted"; an empty accepted set is a real restriction that rejects
/// every tree splitting at that depth.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    /// Accepted accuracy range.
    pub accuracy: (f64, f64),
    /// Accepted range for the minimum leaf sample count.
    pub min_samples: (u32, u32),
    /// Accepted tree heights; `None` accepts all.
    pub heights: Option<HashSet<u32>>,
    /// Accepted features per depth (root split = depth 1); absent depths are
    /// unrestricted.
    pub depth_features: HashMap<u32, HashSet<FeatureId>>,
    /// Features accepted at every depth; `None` accepts all.
    pub all_features: Option<HashSet<FeatureId>>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            accuracy: (0.0, 1.0),
            min_samples: (0, u32::MAX),
            heights: None,
            depth_features: HashMap::new(),
            all_features: None,
        }
    }
}

impl FilterState {
    /// Dimensions currently narrower than "accept everything".
    #[must_use]
    pub fn restricted(&self) -> FilterDimensions {
        let mut dims = FilterDimensions::empty();
        if self.accuracy != (0.0, 1.0) {
            dims |= FilterDimensions::ACCURACY;
        }
        if self.min_samples != (0, u32::MAX) {
            dims |= FilterDimensions::MIN_SAMPLE;
        }
        if self.heights.is_some() {
            dims |= FilterDimensions::HEIGHT;
        }
        if !self.depth_features.is_empty() {
            dims |= FilterDimensions::DEPTH_FEATURES;
        }
        if self.all_features.is_some() {
            dims |= FilterDimensions::ALL_FEATURES;
        }
        dims
    }

    /// Evaluates all five predicates against ground truth.
    ///
    /// Trees absent from the tree table (tolerated integrity gaps) pass a
    /// dimension only while it is unrestricted: there is nothing to verify
    /// them against once the user narrows it.
    #[must_use]
    pub fn passes(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        self.passes_accuracy(tree, ctx)
            && self.passes_min_samples(tree, ctx)
            && self.passes_height(tree, ctx)
            && self.passes_depth_features(tree, ctx)
            && self.passes_all_features(tree, ctx)
    }

    fn passes_accuracy(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        let (low, high) = self.accuracy;
        match ctx.trees.accuracy(tree) {
            Some(acc) => low <= acc && acc <= high,
            None => (low, high) == (0.0, 1.0),
        }
    }

    fn passes_min_samples(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        let (low, high) = self.min_samples;
        match ctx.stats.min_samples(tree) {
            Some(min) => low <= min && min <= high,
            None => (low, high) == (0, u32::MAX),
        }
    }

    fn passes_height(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        match &self.heights {
            None => true,
            Some(accepted) => ctx
                .stats
                .height(tree)
                .is_some_and(|h| accepted.contains(&h)),
        }
    }

    fn passes_depth_features(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        if self.depth_features.is_empty() {
            return true;
        }
        let Some(by_depth) = ctx.stats.features_at(tree) else {
            return false;
        };
        self.depth_features.iter().all(|(depth, accepted)| {
            // A tree that never splits at this depth passes trivially.
            by_depth
                .get(depth)
                .is_none_or(|used| used.iter().all(|f| accepted.contains(f)))
        })
    }

    fn passes_all_features(&self, tree: TreeId, ctx: &FilterContext<'_>) -> bool {
        match &self.all_features {
            None => true,
            Some(accepted) => ctx.stats.features_at(tree).is_some_and(|by_depth| {
                by_depth
                    .values()
                    .all(|used| used.iter().all(|f| accepted.contains(f)))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_restricts_nothing() {
        let state = FilterState::default();
        assert_eq!(state.restricted(), FilterDimensions::empty());
    }

    #[test]
    fn restricted_reports_each_dimension() {
        let state = FilterState {
            accuracy: (0.8, 1.0),
            heights: Some(HashSet::new()),
            ..FilterState::default()
        };
        assert_eq!(
            state.restricted(),
            FilterDimensions::ACCURACY | FilterDimensions::HEIGHT
        );
    }
}
