// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Typed, timestamped events stored in the capture log.

use std::fmt;
use std::sync::Arc;

use crate::midi::MidiMessage;
use crate::timing::Millis;

/// Identity of the input a message arrived on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    /// Backend identifier, stable while the device stays connected
    pub id: Arc<str>,
    /// Human-readable port name
    pub name: Arc<str>,
}

impl Source {
    /// Create a source identity
    pub fn new(id: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// What happened, with the payload each kind needs
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Key pressed
    NoteOn { note: u8, velocity: u8 },
    /// Key released with the pedal up
    NoteOff { note: u8, velocity: u8 },
    /// Key released while the pedal was held
    DeferredNoteOff { note: u8, velocity: u8 },
    /// Controller moved
    ControlChange { controller: u8, value: u8 },
    /// Pitch wheel moved (-8192 to 8191)
    PitchBend { value: i16 },
    /// Any other message, kept verbatim
    Raw(Vec<u8>),
}

/// A normalized message in the capture log. Never modified after append.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Milliseconds since session start
    pub t: Millis,
    /// MIDI channel (1-16); system messages are logged on channel 1
    pub channel: u8,
    /// Event kind and payload
    pub kind: EventKind,
    /// Input the message arrived on
    pub source: Source,
}

impl RawEvent {
    /// Create an event
    pub fn new(t: Millis, channel: u8, kind: EventKind, source: Source) -> Self {
        Self {
            t,
            channel: channel.clamp(1, 16),
            kind,
            source,
        }
    }

    /// Build an event from a decoded message. Releases become
    /// `DeferredNoteOff` when `sustained` is true.
    pub fn from_message(t: Millis, message: MidiMessage, sustained: bool, source: Source) -> Self {
        let channel = message.channel() + 1;
        let kind = match message {
            MidiMessage::NoteOn { note, velocity, .. } => EventKind::NoteOn { note, velocity },
            MidiMessage::NoteOff { note, velocity, .. } if sustained => {
                EventKind::DeferredNoteOff { note, velocity }
            }
            MidiMessage::NoteOff { note, velocity, .. } => EventKind::NoteOff { note, velocity },
            MidiMessage::ControlChange {
                controller, value, ..
            } => EventKind::ControlChange { controller, value },
            MidiMessage::PitchBend { value, .. } => EventKind::PitchBend { value },
            MidiMessage::Other(bytes) => EventKind::Raw(bytes),
        };
        Self::new(t, channel, kind, source)
    }
}
