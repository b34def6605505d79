// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Fixed-size note state table.
//!
//! One slot per `(channel, note)` pair plus one sustain flag per channel.
//! Both the live bookkeeping and export-time reconstruction run the same
//! transitions through this table.

use crate::timing::Millis;

const CHANNELS: usize = 16;
const NOTES: usize = 128;

/// Lifecycle of a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// Not sounding
    #[default]
    Inactive,
    /// Key is down
    Active,
    /// Key released while the pedal was held; still sounding
    PendingRelease,
}

/// State and onset record for one key
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeySlot {
    /// Current state
    pub state: KeyState,
    /// Time the key was struck
    pub onset: Millis,
    /// Strike velocity (1-127)
    pub velocity: u8,
}

impl KeySlot {
    /// True while the note is audible
    pub fn is_sounding(&self) -> bool {
        self.state != KeyState::Inactive
    }
}

/// Outcome of a key release
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// The note ended; carries the slot as it was before closing
    Closed(KeySlot),
    /// The pedal is held, so the note keeps sounding
    Deferred,
    /// Nothing was sounding on that key
    Ignored,
}

/// A note closed by a pedal release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedalRelease {
    /// MIDI channel (1-16)
    pub channel: u8,
    /// Note number
    pub note: u8,
    /// Slot as it was before closing
    pub slot: KeySlot,
}

/// Per-key state for all sixteen channels
#[derive(Debug, Clone)]
pub struct NoteTable {
    slots: Vec<KeySlot>,
    sustain: [bool; CHANNELS],
}

impl NoteTable {
    /// Create a table with every key inactive and every pedal up
    pub fn new() -> Self {
        Self {
            slots: vec![KeySlot::default(); CHANNELS * NOTES],
            sustain: [false; CHANNELS],
        }
    }

    fn index(channel: u8, note: u8) -> usize {
        let channel = channel.clamp(1, CHANNELS as u8) as usize - 1;
        channel * NOTES + (note as usize & 0x7F)
    }

    fn channel_slot(channel: u8) -> usize {
        channel.clamp(1, CHANNELS as u8) as usize - 1
    }

    /// Current slot for a key
    pub fn slot(&self, channel: u8, note: u8) -> KeySlot {
        self.slots[Self::index(channel, note)]
    }

    /// Strike a key. A key that is already sounding is overwritten in place
    /// and the previous slot is returned; that earlier note is never closed.
    pub fn press(&mut self, channel: u8, note: u8, t: Millis, velocity: u8) -> Option<KeySlot> {
        let slot = &mut self.slots[Self::index(channel, note)];
        let previous = slot.is_sounding().then_some(*slot);
        *slot = KeySlot {
            state: KeyState::Active,
            onset: t,
            velocity,
        };
        previous
    }

    /// Release a key, honoring the channel's pedal
    pub fn release(&mut self, channel: u8, note: u8) -> Release {
        let held = self.is_sustained(channel);
        let slot = &mut self.slots[Self::index(channel, note)];

        match (slot.state, held) {
            (KeyState::Inactive, _) => Release::Ignored,
            (_, true) => {
                slot.state = KeyState::PendingRelease;
                Release::Deferred
            }
            (_, false) => {
                let closed = *slot;
                *slot = KeySlot::default();
                Release::Closed(closed)
            }
        }
    }

    /// Apply a sustain pedal value. On a held to released transition every
    /// pending key of the channel closes and is returned in note order.
    pub fn set_sustain(&mut self, channel: u8, value: u8) -> Vec<PedalRelease> {
        let ch = Self::channel_slot(channel);
        let was_held = self.sustain[ch];
        let held = value >= crate::midi::messages::SUSTAIN_THRESHOLD;
        self.sustain[ch] = held;

        if !was_held || held {
            return Vec::new();
        }

        let mut released = Vec::new();
        for note in 0..NOTES as u8 {
            let slot = &mut self.slots[Self::index(channel, note)];
            if slot.state == KeyState::PendingRelease {
                released.push(PedalRelease {
                    channel,
                    note,
                    slot: *slot,
                });
                *slot = KeySlot::default();
            }
        }
        released
    }

    /// True when the channel's pedal is held
    pub fn is_sustained(&self, channel: u8) -> bool {
        self.sustain[Self::channel_slot(channel)]
    }

    /// Number of keys sounding (active or pending)
    pub fn sounding_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_sounding()).count()
    }

    /// Number of keys kept alive only by the pedal
    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == KeyState::PendingRelease)
            .count()
    }

    /// Close every sounding key, returning them in channel then note order
    pub fn drain_sounding(&mut self) -> Vec<PedalRelease> {
        let mut drained = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_sounding() {
                drained.push(PedalRelease {
                    channel: (i / NOTES) as u8 + 1,
                    note: (i % NOTES) as u8,
                    slot: *slot,
                });
                *slot = KeySlot::default();
            }
        }
        drained
    }
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut table = NoteTable::new();
        assert_eq!(table.press(1, 60, 0.0, 100), None);
        assert_eq!(table.slot(1, 60).state, KeyState::Active);

        match table.release(1, 60) {
            Release::Closed(slot) => {
                assert_eq!(slot.onset, 0.0);
                assert_eq!(slot.velocity, 100);
            }
            other => panic!("expected close, got {:?}", other),
        }
        assert_eq!(table.slot(1, 60).state, KeyState::Inactive);
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut table = NoteTable::new();
        assert_eq!(table.release(3, 64), Release::Ignored);
    }

    #[test]
    fn test_repeated_press_overwrites() {
        let mut table = NoteTable::new();
        table.press(1, 60, 0.0, 80);
        let previous = table.press(1, 60, 50.0, 90).unwrap();
        assert_eq!(previous.onset, 0.0);

        let slot = table.slot(1, 60);
        assert_eq!(slot.onset, 50.0);
        assert_eq!(slot.velocity, 90);
        assert_eq!(table.sounding_count(), 1);
    }

    #[test]
    fn test_press_on_pending_key_reactivates() {
        let mut table = NoteTable::new();
        table.set_sustain(1, 127);
        table.press(1, 60, 0.0, 80);
        assert_eq!(table.release(1, 60), Release::Deferred);

        let previous = table.press(1, 60, 300.0, 90).unwrap();
        assert_eq!(previous.state, KeyState::PendingRelease);
        assert_eq!(previous.onset, 0.0);
        assert_eq!(table.slot(1, 60).state, KeyState::Active);
        assert_eq!(table.pending_count(), 0);

        // Pedal up leaves the re-struck key sounding
        assert!(table.set_sustain(1, 0).is_empty());
        assert_eq!(table.slot(1, 60).state, KeyState::Active);

        match table.release(1, 60) {
            Release::Closed(slot) => assert_eq!(slot.onset, 300.0),
            other => panic!("expected close, got {:?}", other),
        }
    }

    #[test]
    fn test_sustain_defers_release() {
        let mut table = NoteTable::new();
        table.press(1, 60, 0.0, 100);
        assert!(table.set_sustain(1, 127).is_empty());
        assert!(table.is_sustained(1));

        assert_eq!(table.release(1, 60), Release::Deferred);
        assert_eq!(table.slot(1, 60).state, KeyState::PendingRelease);
        assert_eq!(table.pending_count(), 1);

        let released = table.set_sustain(1, 0);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].note, 60);
        assert_eq!(released[0].slot.onset, 0.0);
        assert_eq!(table.sounding_count(), 0);
    }

    #[test]
    fn test_sustain_is_per_channel() {
        let mut table = NoteTable::new();
        table.set_sustain(1, 100);
        table.press(2, 60, 0.0, 100);
        assert!(matches!(table.release(2, 60), Release::Closed(_)));
    }

    #[test]
    fn test_sustain_threshold() {
        let mut table = NoteTable::new();
        table.set_sustain(1, 63);
        assert!(!table.is_sustained(1));
        table.set_sustain(1, 64);
        assert!(table.is_sustained(1));
    }

    #[test]
    fn test_pedal_still_down_keeps_pending() {
        let mut table = NoteTable::new();
        table.set_sustain(1, 127);
        table.press(1, 60, 0.0, 100);
        table.release(1, 60);

        // Pedal moves but stays held
        assert!(table.set_sustain(1, 90).is_empty());
        assert_eq!(table.pending_count(), 1);
    }

    #[test]
    fn test_drain_sounding() {
        let mut table = NoteTable::new();
        table.press(2, 64, 10.0, 70);
        table.press(1, 60, 0.0, 100);
        table.set_sustain(1, 127);
        table.release(1, 60);

        let drained = table.drain_sounding();
        assert_eq!(drained.len(), 2);
        assert_eq!((drained[0].channel, drained[0].note), (1, 60));
        assert_eq!((drained[1].channel, drained[1].note), (2, 64));
        assert_eq!(table.sounding_count(), 0);
    }
}
