//! Choice of the one visible video that plays a muted preview.
//!
//! The rotation is driven entirely by explicit inputs: the visible ids and the
//! current [`Instant`]. The host polls [`PreviewRotation::tick`] whenever
//! [`PreviewRotation::next_deadline`] passes.

use std::collections::HashSet;
use std::time::{Duration, Instant};

pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct PreviewRotation {
    interval: Duration,
    visible: Vec<u64>,
    index: usize,
    deadline: Option<Instant>,
}

impl Default for PreviewRotation {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION_INTERVAL)
    }
}

impl PreviewRotation {
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_ROTATION_INTERVAL
        } else {
            interval
        };
        Self {
            interval,
            visible: Vec::new(),
            index: 0,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn visible(&self) -> &[u64] {
        &self.visible
    }

    pub fn active(&self) -> Option<u64> {
        self.visible.get(self.index).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Replace the visible candidates.
    ///
    /// Ids keep the order given (duplicates dropped). When membership is the
    /// same as before nothing changes, not even the timer. Otherwise the first
    /// candidate becomes active at once and the interval restarts. Returns
    /// whether membership changed.
    pub fn set_visible<I>(&mut self, ids: I, now: Instant) -> bool
    where
        I: IntoIterator<Item = u64>,
    {
        let mut seen = HashSet::new();
        let ordered: Vec<u64> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let current: HashSet<u64> = self.visible.iter().copied().collect();
        if seen == current {
            return false;
        }

        self.visible = ordered;
        self.index = 0;
        self.deadline = self.schedule(now);
        true
    }

    /// Advance to the next candidate once the interval has elapsed. Returns
    /// whether the active id changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline || self.visible.len() < 2 {
            return false;
        }
        self.index = (self.index + 1) % self.visible.len();
        self.deadline = self.schedule(now);
        true
    }

    pub fn is_active(&self, id: u64) -> bool {
        self.active() == Some(id)
    }

    pub fn clear(&mut self) {
        self.visible.clear();
        self.index = 0;
        self.deadline = None;
    }

    fn schedule(&self, now: Instant) -> Option<Instant> {
        if self.visible.len() > 1 {
            Some(now + self.interval)
        } else {
            None
        }
    }
}
