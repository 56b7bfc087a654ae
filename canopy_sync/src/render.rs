// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Core → Renderer records.

use canopy_model::TreeId;
use canopy_palette::{ColorAllocator, FALLBACK_COLOR, Hsl};
use canopy_partition::{NodeId, Partition, SectorKind};
use canopy_zoom::{ZoomState, ZoomTransition};

/// Minimum angular width emitted for a visible sector.
///
/// Proportional allocation can underflow to a degenerate `x1 == x0` span for
/// a sector that still holds trees; arc path generation cannot handle that,
/// so emitted geometry is nudged open. Stored layout is never touched.
pub const DRAW_EPSILON: f64 = 1e-5;

/// One visible sector, ready to draw.
///
/// Geometry is in unit coordinates; the renderer owns the projection into
/// screen arcs and any label text.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcSector {
    /// Stable node identity, usable as a DOM/display-list key.
    pub node: NodeId,
    /// Angular extent start.
    pub x0: f64,
    /// Angular extent end; at least [`DRAW_EPSILON`] above `x0`.
    pub x1: f64,
    /// Radial extent start.
    pub y0: f64,
    /// Radial extent end.
    pub y1: f64,
    /// Ring index.
    pub depth: u32,
    /// What the sector represents.
    pub kind: SectorKind,
    /// Distinct trees below this sector.
    pub tree_num: u32,
    /// Used root-to-leaf paths below this sector.
    pub value: u64,
    /// Fill color; `None` for leaves (the renderer styles those uniformly).
    pub color: Option<Hsl>,
}

impl ArcSector {
    /// The tree ID, for leaf sectors.
    #[must_use]
    pub const fn tree(&self) -> Option<TreeId> {
        match self.kind {
            SectorKind::Leaf(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns `true` for path-terminating leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }
}

/// Everything the renderer needs after one user action.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Exactly the sectors to draw, in stable pre-order.
    pub sectors: Vec<ArcSector>,
    /// Animated domain change, when the view moved.
    pub transition: Option<ZoomTransition>,
    /// Deadline (host milliseconds) at which debounced label relayout is due.
    pub labels_at: Option<u64>,
}

/// Collects the sectors visible under the current zoom state.
///
/// A node is visible iff its depth is inside the ring window, it still holds
/// at least one used path, and its angular span overlaps the head domain.
pub(crate) fn visible_sectors(
    partition: &Partition,
    colors: &ColorAllocator,
    zoom: &ZoomState,
) -> Vec<ArcSector> {
    let domain = zoom.domain();
    let (low, high) = (zoom.depth_low(), zoom.depth_high());
    partition
        .iter()
        .filter(|(_, node)| {
            node.depth >= low
                && node.depth <= high
                && node.value > 0
                && node.x0 < domain.x1
                && node.x1 > domain.x0
        })
        .map(|(id, node)| {
            let color = match node.kind {
                SectorKind::Split(feature) => {
                    Some(colors.color_of(feature).unwrap_or(FALLBACK_COLOR))
                }
                SectorKind::Root | SectorKind::Leaf(_) => None,
            };
            let x1 = if node.x1 - node.x0 < DRAW_EPSILON {
                node.x0 + DRAW_EPSILON
            } else {
                node.x1
            };
            ArcSector {
                node: id,
                x0: node.x0,
                x1,
                y0: node.y0,
                y1: node.y1,
                depth: node.depth,
                kind: node.kind,
                tree_num: node.tree_num,
                value: node.value,
                color,
            }
        })
        .collect()
}
