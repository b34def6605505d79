// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Encoder interface and the Standard MIDI File encoder.
//!
//! The capture core only produces note placements. Turning them into file
//! bytes is the encoder's job; [`SmfEncoder`] does it with `midly`.

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use super::pitch::{parse_pitch, velocity_midi};
use crate::error::EncodeError;
use crate::timing::PPQ;

/// Largest delta time a track event can carry
const MAX_DELTA: u64 = 0x0FFF_FFFF;

/// A note ready for the encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePlacement {
    /// Scientific pitch name, e.g. "C#4"
    pub pitch_name: String,
    /// Start position in ticks from the start of the export
    pub absolute_tick: u32,
    /// Length in ticks (at least 1)
    pub tick_duration: u32,
    /// Velocity on a 1-100 scale
    pub velocity: u8,
    /// MIDI channel (1-16)
    pub channel: u8,
}

impl NotePlacement {
    /// End position in ticks
    pub fn end_tick(&self) -> u64 {
        self.absolute_tick as u64 + self.tick_duration as u64
    }
}

/// One output track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPlacement {
    /// Track name
    pub name: String,
    /// Notes in start order
    pub notes: Vec<NotePlacement>,
}

/// Settings shared by every track of one export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeSettings {
    /// Tempo in BPM
    pub bpm: f64,
    /// Time signature (numerator, denominator)
    pub time_signature: (u8, u8),
    /// Ticks per quarter note
    pub ppq: u16,
}

impl EncodeSettings {
    /// Settings at `bpm` in 4/4 with the system PPQ
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            time_signature: (4, 4),
            ppq: PPQ,
        }
    }

    /// Microseconds per quarter note
    pub fn micros_per_beat(&self) -> u32 {
        (60_000_000.0 / self.bpm.max(1.0)).round().min(0x00FF_FFFF as f64) as u32
    }
}

/// Turns track placements into file bytes
pub trait Encoder: Send + Sync {
    /// Encode every track at the given tempo and time signature
    fn encode(
        &self,
        tracks: &[TrackPlacement],
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Standard MIDI File encoder (format 1, one track per placement group)
#[derive(Debug, Clone, Copy, Default)]
pub struct SmfEncoder;

impl SmfEncoder {
    /// Create an encoder
    pub fn new() -> Self {
        Self
    }

    fn build_track<'a>(
        track: &'a TrackPlacement,
        settings: &EncodeSettings,
    ) -> Result<Vec<TrackEvent<'a>>, EncodeError> {
        let (numerator, denominator) = settings.time_signature;
        // Denominator is expressed as power of 2
        let denom_power = denominator.max(1).trailing_zeros() as u8;

        let mut events = vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
                    settings.micros_per_beat(),
                ))),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
                    numerator.max(1),
                    denom_power,
                    24, // MIDI clocks per metronome click
                    8,  // 32nd notes per MIDI quarter note
                )),
            },
        ];

        // (tick, is_note_on, channel, message); offs sort before ons on the
        // same tick so a repeated pitch is released before it restarts
        let mut timed: Vec<(u64, bool, u8, MidiMessage)> = Vec::with_capacity(track.notes.len() * 2);
        for placement in &track.notes {
            let key = parse_pitch(&placement.pitch_name)
                .ok_or_else(|| EncodeError::InvalidPitch(placement.pitch_name.clone()))?;
            let channel = placement.channel.clamp(1, 16) - 1;
            let end = placement.end_tick();
            if end > MAX_DELTA {
                return Err(EncodeError::TickOverflow(end));
            }

            timed.push((
                placement.absolute_tick as u64,
                true,
                channel,
                MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(velocity_midi(placement.velocity)),
                },
            ));
            timed.push((
                end,
                false,
                channel,
                MidiMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                },
            ));
        }
        timed.sort_by_key(|(tick, is_on, _, _)| (*tick, *is_on));

        let mut last_tick = 0u64;
        for (tick, _, channel, message) in timed {
            events.push(TrackEvent {
                delta: u28::new((tick - last_tick) as u32),
                kind: TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message,
                },
            });
            last_tick = tick;
        }

        events.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        Ok(events)
    }
}

impl Encoder for SmfEncoder {
    fn encode(
        &self,
        tracks: &[TrackPlacement],
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, EncodeError> {
        if tracks.is_empty() {
            return Err(EncodeError::NoTracks);
        }

        let header = Header::new(Format::Parallel, Timing::Metrical(u15::new(settings.ppq)));
        let mut smf = Smf::new(header);
        for track in tracks {
            smf.tracks.push(Self::build_track(track, settings)?);
        }

        let mut buffer = Vec::new();
        smf.write_std(&mut buffer)?;
        Ok(buffer)
    }
}
