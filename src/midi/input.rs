// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input decoding and the `midir` input backend.
//!
//! This module provides status-byte decoding of raw device messages and a
//! backend that subscribes to every available MIDI input port.

use std::collections::HashMap;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{info, warn};

use super::{messages, InputHandler, InputSource, PortChanges};
use crate::capture::Source;
use crate::error::CaptureError;

const CLIENT_NAME: &str = "Catchonika";

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Pitch Bend: channel (0-15), value (-8192 to 8191)
    PitchBend { channel: u8, value: i16 },
    /// Anything else, including undersized channel messages
    Other(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let status = data[0];
        let msg_type = status & 0xF0;
        let channel = status & 0x0F;

        match msg_type {
            messages::NOTE_OFF if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            messages::NOTE_ON if data.len() >= 3 => {
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data[1] & 0x7F,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data[1] & 0x7F,
                        velocity,
                    })
                }
            }
            messages::CONTROL_CHANGE if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            messages::PITCH_BEND if data.len() >= 3 => {
                let lsb = (data[1] & 0x7F) as i16;
                let msb = (data[2] & 0x7F) as i16;
                let value = ((msb << 7) | lsb) - 8192;
                Some(MidiMessage::PitchBend { channel, value })
            }
            _ => Some(MidiMessage::Other(data.to_vec())),
        }
    }

    /// Channel the message was addressed to (0-15). System messages carry
    /// no channel and report 0.
    pub fn channel(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => *channel,
            MidiMessage::Other(data) => match data.first() {
                Some(&status) if status < 0xF0 => status & 0x0F,
                _ => 0,
            },
        }
    }
}

/// An open subscription to one input port
struct OpenInput {
    source: Source,
    _connection: MidiInputConnection<()>,
}

/// MIDI input backend subscribing to every port through `midir`.
///
/// Each port gets its own connection. Dropping the value, or calling
/// [`InputSource::disconnect_all`], closes every connection.
pub struct MidirInputs {
    handler: InputHandler,
    open: HashMap<String, OpenInput>,
}

impl MidirInputs {
    /// Create the backend. Fails with a capability error when the platform
    /// cannot provide a MIDI client.
    pub fn new(handler: InputHandler) -> Result<Self, CaptureError> {
        // Probe once so a missing backend surfaces here rather than on the
        // first refresh.
        MidiInput::new(CLIENT_NAME).map_err(|e| CaptureError::Capability(e.to_string()))?;

        Ok(Self {
            handler,
            open: HashMap::new(),
        })
    }

    fn connect(&self, port: &MidiInputPort, source: Source) -> Result<OpenInput, CaptureError> {
        let mut midi_in =
            MidiInput::new(CLIENT_NAME).map_err(|e| CaptureError::Capability(e.to_string()))?;
        midi_in.ignore(Ignore::None);

        let handler = self.handler.clone();
        let callback_source = source.clone();
        let connection = midi_in
            .connect(
                port,
                "catchonika-input",
                move |_stamp, message, _| handler(message, &callback_source),
                (),
            )
            .map_err(|e| CaptureError::Capability(format!("connect {}: {}", source.name, e)))?;

        Ok(OpenInput {
            source,
            _connection: connection,
        })
    }
}

impl InputSource for MidirInputs {
    fn refresh(&mut self) -> Result<PortChanges, CaptureError> {
        let probe =
            MidiInput::new(CLIENT_NAME).map_err(|e| CaptureError::Capability(e.to_string()))?;

        let mut changes = PortChanges::default();
        let mut present = Vec::new();

        for (i, port) in probe.ports().iter().enumerate() {
            let id = port.id();
            present.push(id.clone());
            if self.open.contains_key(&id) {
                continue;
            }

            let name = probe
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            let source = Source::new(id.clone(), name);

            match self.connect(port, source.clone()) {
                Ok(open) => {
                    info!(source = %source.name, "connected MIDI input");
                    self.open.insert(id, open);
                    changes.connected.push(source);
                }
                Err(e) => warn!(source = %source.name, error = %e, "could not connect MIDI input"),
            }
        }

        let vanished: Vec<String> = self
            .open
            .keys()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        for id in vanished {
            if let Some(open) = self.open.remove(&id) {
                info!(source = %open.source.name, "MIDI input disconnected");
                changes.disconnected.push(open.source);
            }
        }

        Ok(changes)
    }

    fn disconnect_all(&mut self) {
        for (_, open) in self.open.drain() {
            info!(source = %open.source.name, "closing MIDI input");
        }
    }

    fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.open.values().map(|o| o.source.clone()).collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));
        sources
    }
}

/// List all available MIDI sources
pub fn list_sources() -> Result<Vec<(usize, String)>, CaptureError> {
    let midi_in =
        MidiInput::new(CLIENT_NAME).map_err(|e| CaptureError::Capability(e.to_string()))?;

    let mut result = Vec::new();
    for (i, port) in midi_in.ports().iter().enumerate() {
        let name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", i));
        result.push((i, name));
    }

    Ok(result)
}

/// Print all available MIDI sources to stdout
pub fn print_sources() -> Result<(), CaptureError> {
    let sources = list_sources()?;
    if sources.is_empty() {
        println!("No MIDI sources found.");
    } else {
        println!("Available MIDI sources (inputs):");
        for (i, name) in sources {
            println!("  {}: {}", i, name);
        }
    }
    Ok(())
}
