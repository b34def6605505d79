// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Millisecond to tick conversion.

use super::clock::Millis;

/// Ticks per quarter note for every export. Fixed so that the same
/// millisecond span always maps to the same tick span at a given tempo.
pub const PPQ: u16 = 128;

/// Tick length of a millisecond span at `bpm`. Never less than one tick.
///
/// Only durations go through here. Positions use [`offset_ticks`], which
/// has no floor so a note at the window start lands on tick zero.
pub fn ticks(ms: Millis, bpm: f64) -> u32 {
    let raw = (ms / 60_000.0 * bpm * PPQ as f64).round();
    if raw.is_finite() && raw >= 1.0 {
        raw.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Tick position of a millisecond offset at `bpm`. An offset of zero is
/// tick zero; lengths use [`ticks`] instead.
pub fn offset_ticks(ms: Millis, bpm: f64) -> u32 {
    let raw = (ms / 60_000.0 * bpm * PPQ as f64).round();
    if raw.is_finite() && raw > 0.0 {
        raw.min(u32::MAX as f64) as u32
    } else {
        0
    }
}
