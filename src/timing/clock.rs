// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session clocks.
//!
//! Every timestamp in the capture log is a millisecond offset from the
//! instant the session started. The clock is injected into the session so
//! tests can move time forward explicitly.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Milliseconds since session start
pub type Millis = f64;

/// Monotonic millisecond time source
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the session started
    fn now_ms(&self) -> Millis;
}

/// Wall clock anchored at construction time
#[derive(Debug, Clone)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    /// Create a clock whose zero is now
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SessionClock {
    fn now_ms(&self) -> Millis {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the session.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Millis>>,
}

impl ManualClock {
    /// Create a manual clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manual clock at the given time
    pub fn at(ms: Millis) -> Self {
        Self {
            now: Arc::new(Mutex::new(ms)),
        }
    }

    /// Jump to an absolute time. Moving backwards is ignored.
    pub fn set(&self, ms: Millis) {
        if let Ok(mut now) = self.now.lock() {
            if ms > *now {
                *now = ms;
            }
        }
    }

    /// Move time forward
    pub fn advance(&self, ms: Millis) {
        if let Ok(mut now) = self.now.lock() {
            *now += ms.max(0.0);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.lock().map(|now| *now).unwrap_or(0.0)
    }
}
