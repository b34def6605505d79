// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sweep scheduling.
//!
//! The sweep is due at fixed intervals of clock time. Whoever owns the
//! session polls the schedule; nothing here sleeps or spawns.

use crate::timing::Millis;

/// Fixed-interval schedule measured against the session clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSchedule {
    interval_ms: Millis,
    next_due: Millis,
}

impl SweepSchedule {
    /// Create a schedule whose first sweep is one interval after `now`
    pub fn new(interval_ms: Millis, now: Millis) -> Self {
        let interval_ms = interval_ms.max(1.0);
        Self {
            interval_ms,
            next_due: now + interval_ms,
        }
    }

    /// Interval between sweeps
    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    /// Time of the next sweep
    pub fn next_due(&self) -> Millis {
        self.next_due
    }

    /// Returns true if a sweep is due at `now` and schedules the next one.
    /// Missed intervals collapse into a single sweep.
    pub fn poll(&mut self, now: Millis) -> bool {
        if now < self.next_due {
            return false;
        }
        let missed = ((now - self.next_due) / self.interval_ms).floor();
        self.next_due += (missed + 1.0) * self.interval_ms;
        true
    }

    /// Change the interval; the next sweep moves to one interval after `now`
    pub fn set_interval(&mut self, interval_ms: Millis, now: Millis) {
        *self = Self::new(interval_ms, now);
    }
}
