// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rolling event log.
//!
//! Events are appended in arrival order and evicted from the front by a
//! periodic sweep once they fall outside the retention window.

use std::collections::VecDeque;

use tracing::debug;

use super::event::RawEvent;
use crate::timing::Millis;

/// Milliseconds per minute of retention
pub const MS_PER_MINUTE: Millis = 60_000.0;

/// Append-only, time-ordered event log
#[derive(Debug, Clone, Default)]
pub struct RollingBuffer {
    events: VecDeque<RawEvent>,
}

impl RollingBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Timestamps older than the last event are raised to
    /// it so the log stays non-decreasing.
    pub fn append(&mut self, mut event: RawEvent) {
        if let Some(last) = self.events.back() {
            if event.t < last.t {
                debug!(t = event.t, last = last.t, "clamping out-of-order timestamp");
                event.t = last.t;
            }
        }
        self.events.push_back(event);
    }

    /// Evict every event older than `now - retention_minutes`.
    /// Returns the number of evicted events.
    pub fn sweep(&mut self, now: Millis, retention_minutes: f64) -> usize {
        let cutoff = now - retention_minutes * MS_PER_MINUTE;
        let keep_from = self.events.partition_point(|e| e.t < cutoff);
        self.events.drain(..keep_from);
        keep_from
    }

    /// Copy of every event with `start <= t <= end`, in log order
    pub fn slice(&self, start: Millis, end: Millis) -> Vec<RawEvent> {
        let from = self.events.partition_point(|e| e.t < start);
        let to = self.events.partition_point(|e| e.t <= end);
        if from >= to {
            return Vec::new();
        }
        self.events.range(from..to).cloned().collect()
    }

    /// Iterate over the whole log
    pub fn iter(&self) -> impl Iterator<Item = &RawEvent> {
        self.events.iter()
    }

    /// Timestamp of the oldest retained event
    pub fn first_time(&self) -> Option<Millis> {
        self.events.front().map(|e| e.t)
    }

    /// Timestamp of the newest event
    pub fn last_time(&self) -> Option<Millis> {
        self.events.back().map(|e| e.t)
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::event::{EventKind, Source};

    fn event(t: Millis) -> RawEvent {
        RawEvent::new(
            t,
            1,
            EventKind::NoteOn {
                note: 60,
                velocity: 100,
            },
            Source::new("p", "Keys"),
        )
    }

    #[test]
    fn test_append_keeps_order() {
        let mut buffer = RollingBuffer::new();
        buffer.append(event(0.0));
        buffer.append(event(10.0));
        buffer.append(event(10.0));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.first_time(), Some(0.0));
        assert_eq!(buffer.last_time(), Some(10.0));
    }

    #[test]
    fn test_append_clamps_out_of_order() {
        let mut buffer = RollingBuffer::new();
        buffer.append(event(100.0));
        buffer.append(event(50.0));
        assert_eq!(buffer.last_time(), Some(100.0));
    }

    #[test]
    fn test_sweep_evicts_old_events() {
        let mut buffer = RollingBuffer::new();
        for i in 0..10 {
            buffer.append(event(i as f64 * 30_000.0)); // every 30s
        }

        // now = 4.5 minutes, retention 2 minutes -> cutoff 150s
        let removed = buffer.sweep(270_000.0, 2.0);
        assert_eq!(removed, 5);
        assert!(buffer.iter().all(|e| e.t >= 150_000.0));
        assert_eq!(buffer.first_time(), Some(150_000.0));
    }

    #[test]
    fn test_sweep_keeps_event_at_cutoff() {
        let mut buffer = RollingBuffer::new();
        buffer.append(event(60_000.0));
        assert_eq!(buffer.sweep(120_000.0, 1.0), 0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_slice_is_inclusive() {
        let mut buffer = RollingBuffer::new();
        for t in [0.0, 100.0, 200.0, 300.0, 400.0] {
            buffer.append(event(t));
        }

        let slice = buffer.slice(100.0, 300.0);
        let times: Vec<Millis> = slice.iter().map(|e| e.t).collect();
        assert_eq!(times, vec![100.0, 200.0, 300.0]);

        assert!(buffer.slice(500.0, 600.0).is_empty());
        assert!(buffer.slice(300.0, 100.0).is_empty());
    }
}
