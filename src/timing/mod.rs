// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the session clock and the conversion from
//! milliseconds to MIDI ticks.

pub mod clock;
pub mod ticks;

pub use clock::{Clock, ManualClock, Millis, SessionClock};
pub use ticks::{offset_ticks, ticks, PPQ};
