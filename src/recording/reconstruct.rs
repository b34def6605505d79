// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note reconstruction.
//!
//! Replays a time-ordered slice of the capture log from empty state and
//! derives discrete notes, keeping released keys sounding while the
//! channel's sustain pedal is down. Each call starts from a fresh table, so
//! results depend only on the slice.

use crate::capture::{EventKind, NoteTable, RawEvent, Release};
use crate::midi::messages;
use crate::timing::Millis;

/// A note with resolved start and end times
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedNote {
    /// MIDI channel (1-16)
    pub channel: u8,
    /// Note number (0-127)
    pub note: u8,
    /// Onset in session milliseconds
    pub start_ms: Millis,
    /// Release in session milliseconds
    pub end_ms: Millis,
    /// Strike velocity (1-127)
    pub velocity: u8,
}

impl ReconstructedNote {
    /// Duration in milliseconds
    pub fn duration_ms(&self) -> Millis {
        self.end_ms - self.start_ms
    }

    /// Clamp start and end into `[start, end]`. Returns `None` when nothing
    /// of the note is left.
    pub fn clamped(&self, start: Millis, end: Millis) -> Option<Self> {
        let start_ms = self.start_ms.max(start);
        let end_ms = self.end_ms.min(end);
        (end_ms - start_ms > 0.0).then(|| Self {
            start_ms,
            end_ms,
            ..self.clone()
        })
    }
}

/// Replays event slices into notes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteReconstructor;

impl NoteReconstructor {
    /// Create a reconstructor
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the notes of a time-ordered slice. Keys still sounding
    /// when the slice ends are closed at `window_end`.
    pub fn reconstruct(&self, events: &[RawEvent], window_end: Millis) -> Vec<ReconstructedNote> {
        let mut table = NoteTable::new();
        let mut notes = Vec::new();

        for event in events {
            let channel = event.channel;
            match &event.kind {
                EventKind::NoteOn { note, velocity } => {
                    table.press(channel, *note, event.t, *velocity);
                }
                EventKind::NoteOff { note, .. } | EventKind::DeferredNoteOff { note, .. } => {
                    if let Release::Closed(slot) = table.release(channel, *note) {
                        notes.push(ReconstructedNote {
                            channel,
                            note: *note,
                            start_ms: slot.onset,
                            end_ms: event.t,
                            velocity: slot.velocity,
                        });
                    }
                }
                EventKind::ControlChange { controller, value }
                    if *controller == messages::CC_SUSTAIN =>
                {
                    for released in table.set_sustain(channel, *value) {
                        notes.push(ReconstructedNote {
                            channel,
                            note: released.note,
                            start_ms: released.slot.onset,
                            end_ms: event.t,
                            velocity: released.slot.velocity,
                        });
                    }
                }
                _ => {}
            }
        }

        for open in table.drain_sounding() {
            notes.push(ReconstructedNote {
                channel: open.channel,
                note: open.note,
                start_ms: open.slot.onset,
                end_ms: window_end,
                velocity: open.slot.velocity,
            });
        }

        notes
    }
}
