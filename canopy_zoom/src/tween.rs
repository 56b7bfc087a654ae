// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear domain interpolation with last-write-wins retargeting.

use kurbo::Rect;

/// Interpolates a view domain over a fixed duration.
///
/// Clocks are host-supplied millisecond timestamps; the tween never reads
/// time itself. There is no cancellation: a zoom requested mid-flight calls
/// [`DomainTween::retarget`], which restarts from the current in-flight
/// domain toward the new target. The latest request always wins.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DomainTween {
    from: Rect,
    to: Rect,
    start_ms: u64,
    duration_ms: u64,
}

impl DomainTween {
    /// Duration used by the view layer for zoom transitions.
    pub const DEFAULT_DURATION_MS: u64 = 500;

    /// Starts a tween at `now_ms`.
    #[must_use]
    pub const fn new(from: Rect, to: Rect, now_ms: u64, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            start_ms: now_ms,
            duration_ms,
        }
    }

    /// Redirects the tween toward a new target, starting from wherever the
    /// current interpolation is at `now_ms`.
    pub fn retarget(&mut self, to: Rect, now_ms: u64) {
        self.from = self.sample(now_ms);
        self.to = to;
        self.start_ms = now_ms;
    }

    /// The interpolated domain at `now_ms`, clamped to the endpoints.
    #[must_use]
    pub fn sample(&self, now_ms: u64) -> Rect {
        let t = self.progress(now_ms);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        Rect::new(
            lerp(self.from.x0, self.to.x0),
            lerp(self.from.y0, self.to.y0),
            lerp(self.from.x1, self.to.x1),
            lerp(self.from.y1, self.to.y1),
        )
    }

    /// The domain the tween is heading to.
    #[must_use]
    pub const fn target(&self) -> Rect {
        self.to
    }

    /// Returns `true` once the duration has elapsed.
    #[must_use]
    pub const fn is_done(&self, now_ms: u64) -> bool {
        now_ms >= self.start_ms + self.duration_ms
    }

    fn progress(&self, now_ms: u64) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f64;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}
