// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Zoom: the navigation state machine over a radial partition.
//!
//! The state is `(head, domain stack, depth window)`: the *head* node's
//! subtree fills the view, the stack remembers where "back" goes, and the
//! depth window picks which rings are visible. Clicking a sector zooms in;
//! clicking the sector that already spans the whole view (or an explicit
//! back affordance) zooms out; leaves never zoom — the caller opens the
//! detail view instead.
//!
//! View domains are [`kurbo::Rect`]s in the partition's unit coordinates
//! (`x` angular, `y` radial). Every transition yields a [`ZoomTransition`]
//! for the renderer to animate; [`DomainTween`] interpolates domains with
//! last-write-wins retargeting, matching the single-threaded event model —
//! there is no animation queue to cancel.

mod state;
mod tween;

pub use state::{DomainFrame, ZoomError, ZoomState, ZoomTransition};
pub use tween::DomainTween;
