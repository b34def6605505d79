// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event ingestion.
//!
//! Decodes device messages, appends one event per non-empty message to the
//! log and keeps live note bookkeeping for status display. The live table
//! is never consulted by export.

use tracing::{debug, trace};

use super::buffer::RollingBuffer;
use super::event::{EventKind, RawEvent, Source};
use super::notes::{NoteTable, Release};
use crate::midi::{messages, MidiMessage};
use crate::timing::Millis;

/// Live counters derived from ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStats {
    /// Messages appended to the log
    pub events: u64,
    /// Notes closed by a pedal release
    pub pedal_closes: u64,
    /// Notes overwritten by a repeated strike
    pub overwritten: u64,
}

/// Normalizes raw messages into the log
#[derive(Debug, Default)]
pub struct EventIngestor {
    live: NoteTable,
    stats: LiveStats,
}

impl EventIngestor {
    /// Create an ingestor with empty live state
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one raw message received at `t`. Empty payloads are dropped.
    pub fn ingest(&mut self, buffer: &mut RollingBuffer, t: Millis, data: &[u8], source: &Source) {
        let Some(message) = MidiMessage::parse(data) else {
            return;
        };

        let channel = message.channel() + 1;
        let sustained = self.live.is_sustained(channel);
        let event = RawEvent::from_message(t, message, sustained, source.clone());

        match &event.kind {
            EventKind::NoteOn { note, velocity } => {
                if self.live.press(channel, *note, t, *velocity).is_some() {
                    self.stats.overwritten += 1;
                    debug!(channel, note, "note struck again while sounding");
                }
            }
            EventKind::NoteOff { note, .. } | EventKind::DeferredNoteOff { note, .. } => {
                if let Release::Ignored = self.live.release(channel, *note) {
                    trace!(channel, note, "note off without matching note on");
                }
            }
            EventKind::ControlChange { controller, value }
                if *controller == messages::CC_SUSTAIN =>
            {
                for closed in self.live.set_sustain(channel, *value) {
                    self.stats.pedal_closes += 1;
                    debug!(
                        channel,
                        note = closed.note,
                        held_ms = t - closed.slot.onset,
                        "pedal released note"
                    );
                }
            }
            EventKind::ControlChange { controller, value } => {
                trace!(channel, controller, value, "control change logged");
            }
            EventKind::PitchBend { value } => {
                trace!(channel, value, "pitch bend logged");
            }
            EventKind::Raw(bytes) => {
                trace!(len = bytes.len(), status = bytes[0], "raw message logged");
            }
        }

        buffer.append(event);
        self.stats.events += 1;
    }

    /// Number of notes currently sounding
    pub fn sounding(&self) -> usize {
        self.live.sounding_count()
    }

    /// Number of notes held only by the pedal
    pub fn sustained(&self) -> usize {
        self.live.pending_count()
    }

    /// True when the channel's pedal is held
    pub fn is_sustained(&self, channel: u8) -> bool {
        self.live.is_sustained(channel)
    }

    /// Live counters
    pub fn stats(&self) -> LiveStats {
        self.stats
    }

    /// Forget live state (e.g. after inputs were torn down)
    pub fn reset(&mut self) {
        self.live = NoteTable::new();
    }
}
