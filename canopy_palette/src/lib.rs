// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Palette: feature ordering and color allocation.
//!
//! Every feature *name* gets a base hue from a fixed 8-hue palette; every
//! feature-value pair of that name gets a lightness step above the base, so
//! sectors of one feature read as one family while staying distinguishable.
//! Usage (subtree value at the first ring) drives both the hue assignment
//! order and the canonical feature order shown in legends and filter panels.
//!
//! The allocator is built once per dataset from the unfiltered partition and
//! is a pure lookup afterwards; it holds no closures and no mutable shared
//! state.

mod allocator;
mod hsl;

pub use allocator::{ColorAllocator, FALLBACK_COLOR};
pub use hsl::Hsl;
