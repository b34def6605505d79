// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Range export.
//!
//! Selects a window of the capture log, reconstructs its notes, groups them
//! into tracks and converts them to tick placements for the encoder.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use super::encoder::{NotePlacement, TrackPlacement};
use super::pitch::{pitch_name, velocity_percent};
use super::reconstruct::{NoteReconstructor, ReconstructedNote};
use crate::capture::RollingBuffer;
use crate::error::CaptureError;
use crate::timing::{offset_ticks, ticks, Millis};

/// How reconstructed notes are bucketed into tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grouping {
    /// One track per MIDI channel
    #[default]
    ByChannel,
    /// Everything in a single track
    Merged,
}

impl Grouping {
    /// Grouping from the `group_by_channel` flag
    pub fn from_flag(group_by_channel: bool) -> Self {
        if group_by_channel {
            Grouping::ByChannel
        } else {
            Grouping::Merged
        }
    }
}

/// Which part of the log to export
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportRange {
    /// The last N seconds up to now
    Last(f64),
    /// Everything still retained
    All,
    /// An explicit window in session milliseconds (inclusive)
    Between(Millis, Millis),
}

impl ExportRange {
    /// Resolve the window against the buffer at `now`
    pub fn window(&self, buffer: &RollingBuffer, now: Millis) -> (Millis, Millis) {
        match *self {
            ExportRange::Last(seconds) => ((now - seconds * 1000.0).max(0.0), now),
            ExportRange::All => (buffer.first_time().unwrap_or(0.0).min(now), now),
            ExportRange::Between(start, end) => (start, end),
        }
    }

    /// Label used in the exported filename
    pub fn label(&self) -> String {
        match *self {
            ExportRange::Last(seconds) => format!("last-{}s", seconds.round() as i64),
            ExportRange::All => "all".to_string(),
            ExportRange::Between(..) => "range".to_string(),
        }
    }
}

impl fmt::Display for ExportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportRange::Between(start, end) => write!(f, "{:.0}ms..{:.0}ms", start, end),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// An export request; unset fields fall back to the session settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest {
    /// Window to export
    pub range: ExportRange,
    /// Tempo override
    pub bpm: Option<f64>,
    /// Grouping override
    pub grouping: Option<Grouping>,
}

impl ExportRequest {
    /// Request a range with session defaults
    pub fn new(range: ExportRange) -> Self {
        Self {
            range,
            bpm: None,
            grouping: None,
        }
    }

    /// Override the tempo
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = Some(bpm);
        self
    }

    /// Override the grouping
    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }
}

/// Notes bound for one output track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGroup {
    /// Track name
    pub name: String,
    /// Channel for per-channel groups, `None` when merged
    pub channel: Option<u8>,
    /// Notes sorted by start time
    pub notes: Vec<ReconstructedNote>,
}

/// Everything an export decided, before encoding
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Window start (session ms)
    pub start_ms: Millis,
    /// Window end (session ms)
    pub end_ms: Millis,
    /// Tempo for the whole export
    pub bpm: f64,
    /// Output tracks
    pub groups: Vec<TrackGroup>,
}

impl ExportPlan {
    /// Total notes across all groups
    pub fn note_count(&self) -> usize {
        self.groups.iter().map(|g| g.notes.len()).sum()
    }

    /// All notes in group order
    pub fn notes(&self) -> impl Iterator<Item = &ReconstructedNote> {
        self.groups.iter().flat_map(|g| g.notes.iter())
    }

    /// Convert every group to encoder placements
    pub fn placements(&self) -> Vec<TrackPlacement> {
        self.groups
            .iter()
            .map(|group| TrackPlacement {
                name: group.name.clone(),
                notes: group
                    .notes
                    .iter()
                    .map(|note| self.placement(note))
                    .collect(),
            })
            .collect()
    }

    fn placement(&self, note: &ReconstructedNote) -> NotePlacement {
        NotePlacement {
            pitch_name: pitch_name(note.note),
            absolute_tick: offset_ticks(note.start_ms - self.start_ms, self.bpm),
            tick_duration: ticks(note.duration_ms(), self.bpm),
            velocity: velocity_percent(note.velocity),
            channel: note.channel,
        }
    }
}

/// Window selection, reconstruction and grouping
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeExporter {
    reconstructor: NoteReconstructor,
}

impl RangeExporter {
    /// Create an exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan an export of `[start_ms, end_ms]`. Reads the buffer only.
    pub fn plan(
        &self,
        buffer: &RollingBuffer,
        start_ms: Millis,
        end_ms: Millis,
        bpm: f64,
        grouping: Grouping,
    ) -> Result<ExportPlan, CaptureError> {
        if !start_ms.is_finite() || !end_ms.is_finite() || start_ms > end_ms {
            return Err(CaptureError::InvalidRange { start_ms, end_ms });
        }
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(CaptureError::Configuration(format!("invalid tempo {}", bpm)));
        }

        let mut events = buffer.slice(start_ms, end_ms);
        events.sort_by(|a, b| a.t.total_cmp(&b.t));

        let notes: Vec<ReconstructedNote> = self
            .reconstructor
            .reconstruct(&events, end_ms)
            .iter()
            .filter_map(|note| note.clamped(start_ms, end_ms))
            .collect();

        let groups = group_notes(notes, grouping);

        Ok(ExportPlan {
            start_ms,
            end_ms,
            bpm,
            groups,
        })
    }
}

/// Bucket notes into tracks and sort each track by start time
pub fn group_notes(notes: Vec<ReconstructedNote>, grouping: Grouping) -> Vec<TrackGroup> {
    let mut groups = match grouping {
        Grouping::Merged => {
            if notes.is_empty() {
                Vec::new()
            } else {
                vec![TrackGroup {
                    name: "Catchonika".to_string(),
                    channel: None,
                    notes,
                }]
            }
        }
        Grouping::ByChannel => {
            let mut by_channel: BTreeMap<u8, Vec<ReconstructedNote>> = BTreeMap::new();
            for note in notes {
                by_channel.entry(note.channel).or_default().push(note);
            }
            by_channel
                .into_iter()
                .map(|(channel, notes)| TrackGroup {
                    name: format!("Channel {}", channel),
                    channel: Some(channel),
                    notes,
                })
                .collect()
        }
    };

    for group in &mut groups {
        group.notes.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));
    }
    groups
}

/// Filename for an exported range:
/// `catchonika-<label>-<bpm>bpm-<timestamp>.mid`
pub fn export_filename(label: &str, bpm: f64, timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("catchonika-{}-{}bpm-{}.mid", label, bpm.round() as i64, stamp)
}
