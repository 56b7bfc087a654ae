// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Sync: the layer between the core state and an external renderer.
//!
//! [`Explorer`] owns one of everything (data, stats, partition, colors,
//! filters, zoom) and funnels every user action through a single method that
//! returns one [`RenderRequest`]: the exact visible sector set, an optional
//! animated domain transition, and the deadline at which debounced label
//! relayout should run. Geometry and visibility are always synchronous; only
//! label work is debounced, so slider drags redraw arcs on every event but
//! lay text out once per burst.
//!
//! The detail-view and favorites types live here too: they are projections
//! of core state for the out-of-scope panels, not state the core depends on.

mod debounce;
mod detail;
mod explorer;
mod render;

pub use debounce::{LABEL_DEBOUNCE_MS, LabelDebouncer};
pub use detail::{FavoritesBook, PinnedTree, TreeDetail};
pub use explorer::Explorer;
pub use render::{ArcSector, DRAW_EPSILON, RenderRequest};
