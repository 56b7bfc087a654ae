// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounce clock for label relayout.

/// Delay between the last geometry change and label relayout.
pub const LABEL_DEBOUNCE_MS: u64 = 500;

/// Tracks when debounced label work is due.
///
/// Host-driven: the embedder supplies millisecond timestamps and calls
/// [`LabelDebouncer::poll`] from its timer. Every geometry change calls
/// [`LabelDebouncer::touch`], pushing the deadline out; only the last event
/// in a burst reaches it.
#[derive(Clone, Debug)]
pub struct LabelDebouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Default for LabelDebouncer {
    fn default() -> Self {
        Self::new(LABEL_DEBOUNCE_MS)
    }
}

impl LabelDebouncer {
    /// A debouncer with a custom delay.
    #[must_use]
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    /// Records a change at `now_ms` and returns the new deadline.
    pub fn touch(&mut self, now_ms: u64) -> u64 {
        let deadline = now_ms + self.delay_ms;
        self.deadline = Some(deadline);
        deadline
    }

    /// Returns `true` exactly once, when the deadline has passed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// The pending deadline, if label work is scheduled.
    #[must_use]
    pub const fn pending(&self) -> Option<u64> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_burst_fires_once_after_the_last_event() {
        let mut debouncer = LabelDebouncer::new(500);
        debouncer.touch(0);
        debouncer.touch(120);
        debouncer.touch(300);
        assert!(!debouncer.poll(500));
        assert!(!debouncer.poll(799));
        assert!(debouncer.poll(800));
        // Nothing left scheduled.
        assert!(!debouncer.poll(10_000));
        assert_eq!(debouncer.pending(), None);
    }

    #[test]
    fn idle_debouncer_never_fires() {
        let mut debouncer = LabelDebouncer::default();
        assert!(!debouncer.poll(u64::MAX));
    }
}
