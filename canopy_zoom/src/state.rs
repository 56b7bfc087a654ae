// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Head node, domain stack, and depth window.

use canopy_model::FeatureId;
use canopy_partition::{NodeId, Partition, SectorKind};
use kurbo::Rect;
use log::error;
use thiserror::Error;

/// The whole visible unit square.
const FULL_DOMAIN: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// Navigation failures.
///
/// All of these leave the state untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ZoomError {
    /// The clicked sector is a leaf; leaves open the detail view instead of
    /// zooming.
    #[error("zoom target {0} is a leaf sector")]
    LeafTarget(NodeId),
    /// Zoom-out was requested at the root. Normal UI flow cannot reach this;
    /// it indicates a caller bug.
    #[error("zoom-out requested with an empty domain stack")]
    EmptyStack,
    /// The target ID does not exist in the partition.
    #[error("unknown zoom target {0}")]
    UnknownTarget(NodeId),
}

/// One back-stack entry: the view to restore and the node it centered on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DomainFrame {
    /// The view domain that was visible before zooming away.
    pub domain: Rect,
    /// The head node of that view.
    pub node: NodeId,
    /// `depth_high - depth_low` of that view.
    pub depth_gap: u32,
}

/// One animated view change, handed to the renderer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomTransition {
    /// Domain the view is leaving.
    pub from: Rect,
    /// Domain the view is moving to.
    pub to: Rect,
    /// Head node after the transition.
    pub head: NodeId,
    /// First visible ring after the transition.
    pub depth_low: u32,
    /// Last visible ring after the transition.
    pub depth_high: u32,
}

/// The zoom/navigation state machine.
///
/// Invariant: `depth_low <= depth_high <= depth_max`, and the stack is empty
/// iff the head is the root.
#[derive(Clone, Debug)]
pub struct ZoomState {
    head: NodeId,
    stack: Vec<DomainFrame>,
    domain: Rect,
    depth_low: u32,
    depth_high: u32,
    depth_max: u32,
}

impl ZoomState {
    /// Initial state: head at the root, full domain, every ring visible.
    #[must_use]
    pub fn new(partition: &Partition) -> Self {
        let depth_max = partition.depth_max();
        Self {
            head: partition.root(),
            stack: Vec::new(),
            domain: FULL_DOMAIN,
            depth_low: depth_max.min(1),
            depth_high: depth_max,
            depth_max,
        }
    }

    /// The node whose subtree fills the view.
    #[must_use]
    pub const fn head(&self) -> NodeId {
        self.head
    }

    /// The current view domain.
    #[must_use]
    pub const fn domain(&self) -> Rect {
        self.domain
    }

    /// First visible ring.
    #[must_use]
    pub const fn depth_low(&self) -> u32 {
        self.depth_low
    }

    /// Last visible ring.
    #[must_use]
    pub const fn depth_high(&self) -> u32 {
        self.depth_high
    }

    /// Deepest ring in the partition.
    #[must_use]
    pub const fn depth_max(&self) -> u32 {
        self.depth_max
    }

    /// Number of views "back" can restore.
    #[must_use]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` at the root view.
    #[must_use]
    pub fn is_at_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// Classifies a sector click.
    ///
    /// Clicking the sector whose angular span already equals the view is a
    /// zoom-out: with single-child chains the zoom-in would make no visual
    /// progress, and this keeps "click the center to go back" uniform.
    pub fn click(
        &mut self,
        partition: &Partition,
        target: NodeId,
    ) -> Result<ZoomTransition, ZoomError> {
        let node = partition
            .get(target)
            .ok_or(ZoomError::UnknownTarget(target))?;
        if node.is_leaf() {
            return Err(ZoomError::LeafTarget(target));
        }
        if node.x0 == self.domain.x0 && node.x1 == self.domain.x1 {
            self.zoom_out(partition)
        } else {
            self.zoom_in(partition, target)
        }
    }

    /// Zooms into an internal sector, pushing the current view on the stack.
    pub fn zoom_in(
        &mut self,
        partition: &Partition,
        target: NodeId,
    ) -> Result<ZoomTransition, ZoomError> {
        let node = partition
            .get(target)
            .ok_or(ZoomError::UnknownTarget(target))?;
        if node.is_leaf() {
            return Err(ZoomError::LeafTarget(target));
        }

        let gap = self.depth_high - self.depth_low;
        let new_low = node.depth;
        let new_high = (new_low + gap).min(self.depth_max);
        let ring = 1.0 / f64::from(self.depth_max + 1);
        let to = Rect::new(
            node.x0,
            node.y0,
            node.x1,
            node.y0 + ring * f64::from(new_high - new_low + 1),
        );

        self.stack.push(DomainFrame {
            domain: self.domain,
            node: self.head,
            depth_gap: gap,
        });
        let from = self.domain;
        self.head = target;
        self.domain = to;
        self.depth_low = new_low;
        self.depth_high = new_high;
        Ok(self.transition(from))
    }

    /// Pops the stack and restores the previous view.
    ///
    /// An empty stack is reported and leaves the state untouched.
    pub fn zoom_out(&mut self, partition: &Partition) -> Result<ZoomTransition, ZoomError> {
        let Some(frame) = self.stack.pop() else {
            error!("zoom-out with an empty domain stack");
            return Err(ZoomError::EmptyStack);
        };

        let head_depth = partition.get(frame.node).map_or(0, |n| n.depth);
        let new_low = if head_depth == 0 {
            self.depth_max.min(1)
        } else {
            head_depth
        };
        let from = self.domain;
        self.head = frame.node;
        self.domain = frame.domain;
        self.depth_low = new_low;
        self.depth_high = (new_low + frame.depth_gap).min(self.depth_max);
        Ok(self.transition(from))
    }

    /// Changes how many rings are visible; head and stack are unchanged.
    ///
    /// `new_high` is clamped to `depth_max`, `new_low` to `new_high`.
    pub fn set_depth_window(
        &mut self,
        partition: &Partition,
        new_low: u32,
        new_high: u32,
    ) -> ZoomTransition {
        let high = new_high.min(self.depth_max);
        let low = new_low.min(high);
        let ring = 1.0 / f64::from(self.depth_max + 1);
        let head_y0 = partition.get(self.head).map_or(0.0, |n| n.y0);

        let from = self.domain;
        self.depth_low = low;
        self.depth_high = high;
        self.domain = Rect::new(
            self.domain.x0,
            head_y0,
            self.domain.x1,
            head_y0 + ring * f64::from(high - low + 1),
        );
        self.transition(from)
    }

    /// Rewrites the current and stacked domains from the nodes' (possibly
    /// moved) geometry after a re-filter, so the head view follows its node.
    pub fn refresh_domains(&mut self, partition: &Partition) -> ZoomTransition {
        let ring = 1.0 / f64::from(self.depth_max + 1);
        for frame in &mut self.stack {
            frame.domain = Self::domain_of(partition, frame.node, frame.depth_gap, ring);
        }
        let from = self.domain;
        self.domain = Self::domain_of(
            partition,
            self.head,
            self.depth_high - self.depth_low,
            ring,
        );
        self.transition(from)
    }

    /// One feature per visible ring along the head's ancestor chain, for the
    /// persistent color trail next to the depth controls. Index `d - 1`
    /// holds ring `d`'s entry; rings below the head's depth stay `None`.
    #[must_use]
    pub fn ancestor_trail(&self, partition: &Partition) -> Vec<Option<FeatureId>> {
        let mut trail = vec![None; self.depth_max as usize];
        for id in partition.ancestors(self.head) {
            if let Some(node) = partition.get(id) {
                if let SectorKind::Split(feature) = node.kind {
                    trail[(node.depth - 1) as usize] = Some(feature);
                }
            }
        }
        trail
    }

    fn domain_of(partition: &Partition, node: NodeId, depth_gap: u32, ring: f64) -> Rect {
        match partition.get(node) {
            Some(n) if n.parent.is_some() => Rect::new(
                n.x0,
                n.y0,
                n.x1,
                n.y0 + ring * f64::from(depth_gap + 1),
            ),
            _ => FULL_DOMAIN,
        }
    }

    const fn transition(&self, from: Rect) -> ZoomTransition {
        ZoomTransition {
            from,
            to: self.domain,
            head: self.head,
            depth_low: self.depth_low,
            depth_high: self.depth_high,
        }
    }
}
