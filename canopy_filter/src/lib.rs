// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Filter: the five-dimensional tree filter engine.
//!
//! A tree is *active* iff it passes all five predicates at once: accuracy
//! range, minimum-leaf-sample range, height set, per-depth feature sets, and
//! the all-depths feature set. Every predicate is evaluated against ground
//! truth (the tree table and the precomputed [`canopy_model::TreeStats`]),
//! never against previously-filtered visual state, so filters commute and
//! re-applying one is a no-op.
//!
//! Each setter funnels into one [`canopy_partition::Partition::apply_used`]
//! call: one filter change, one O(arena) re-aggregation.

mod engine;
mod state;

pub use engine::{FilterContext, FilterEngine};
pub use state::{FilterDimensions, FilterState};
