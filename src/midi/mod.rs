// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input abstraction layer.
//!
//! This module provides a trait-based abstraction over the device side of
//! capture, so the session never depends on a particular backend. The
//! `midir` backend lives in [`input`].

pub mod input;

use std::sync::Arc;

use crate::capture::Source;
use crate::error::CaptureError;

pub use input::{list_sources, print_sources, MidiMessage, MidirInputs};

/// Callback receiving every inbound message with the identity of its input
pub type InputHandler = Arc<dyn Fn(&[u8], &Source) + Send + Sync>;

/// Result of reconciling open connections against the available ports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortChanges {
    /// Inputs connected by this refresh
    pub connected: Vec<Source>,
    /// Inputs that disappeared and were dropped
    pub disconnected: Vec<Source>,
}

impl PortChanges {
    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.connected.is_empty() && self.disconnected.is_empty()
    }
}

/// Trait for MIDI input implementations.
///
/// An input source subscribes to every available device, delivers raw
/// messages to its handler, and tracks devices coming and going.
pub trait InputSource {
    /// Connect to inputs that appeared and drop inputs that vanished.
    ///
    /// # Returns
    /// * `Ok(PortChanges)` describing what changed
    /// * `Err(CaptureError::Capability)` if the platform has no MIDI access
    fn refresh(&mut self) -> Result<PortChanges, CaptureError>;

    /// Unsubscribe from every input
    fn disconnect_all(&mut self);

    /// Inputs currently subscribed
    fn sources(&self) -> Vec<Source>;
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;

    // Controllers
    pub const CC_SUSTAIN: u8 = 64;

    /// Sustain values at or above this mean the pedal is held
    pub const SUSTAIN_THRESHOLD: u8 = 64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock input source for testing
    struct MockInputSource {
        available: Vec<Source>,
        open: Vec<Source>,
        handler: InputHandler,
    }

    impl MockInputSource {
        fn new(handler: InputHandler) -> Self {
            Self {
                available: Vec::new(),
                open: Vec::new(),
                handler,
            }
        }

        fn deliver(&self, index: usize, bytes: &[u8]) {
            (self.handler)(bytes, &self.open[index]);
        }
    }

    impl InputSource for MockInputSource {
        fn refresh(&mut self) -> Result<PortChanges, CaptureError> {
            let mut changes = PortChanges::default();
            for source in &self.available {
                if !self.open.contains(source) {
                    changes.connected.push(source.clone());
                }
            }
            for source in &self.open {
                if !self.available.contains(source) {
                    changes.disconnected.push(source.clone());
                }
            }
            self.open = self.available.clone();
            Ok(changes)
        }

        fn disconnect_all(&mut self) {
            self.open.clear();
        }

        fn sources(&self) -> Vec<Source> {
            self.open.clone()
        }
    }

    #[test]
    fn test_mock_input_refresh_tracks_devices() {
        let handler: InputHandler = Arc::new(|_, _| {});
        let mut input = MockInputSource::new(handler);

        input.available.push(Source::new("a", "Keys"));
        let changes = input.refresh().unwrap();
        assert_eq!(changes.connected.len(), 1);
        assert!(changes.disconnected.is_empty());

        let changes = input.refresh().unwrap();
        assert!(changes.is_empty());

        input.available.clear();
        let changes = input.refresh().unwrap();
        assert_eq!(changes.disconnected, vec![Source::new("a", "Keys")]);
        assert!(input.sources().is_empty());
    }

    #[test]
    fn test_mock_input_delivers_with_source() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: InputHandler = Arc::new(move |bytes, source| {
            sink.lock()
                .unwrap()
                .push((bytes.to_vec(), source.name.to_string()));
        });

        let mut input = MockInputSource::new(handler);
        input.available.push(Source::new("a", "Keys"));
        input.refresh().unwrap();
        input.deliver(0, &[messages::NOTE_ON, 60, 100]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (vec![0x90, 60, 100], "Keys".to_string()));
    }

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
        assert_eq!(messages::CONTROL_CHANGE, 0xB0);
        assert_eq!(messages::CC_SUSTAIN, 64);
    }
}
