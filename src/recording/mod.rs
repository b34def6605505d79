// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Reconstruction and export.
//!
//! This module provides:
//! - Note reconstruction under sustain-pedal semantics
//! - Range export into tick placements
//! - Standard MIDI file encoding
//! - File delivery

pub mod delivery;
pub mod encoder;
pub mod export;
pub mod pitch;
pub mod reconstruct;

pub use delivery::{DirectorySink, FileSink};
pub use encoder::{EncodeSettings, Encoder, NotePlacement, SmfEncoder, TrackPlacement};
pub use export::{
    export_filename, ExportPlan, ExportRange, ExportRequest, Grouping, RangeExporter, TrackGroup,
};
pub use pitch::{pitch_name, velocity_percent};
pub use reconstruct::{NoteReconstructor, ReconstructedNote};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_creation() {
        let exporter = RangeExporter::new();
        let plan = exporter
            .plan(
                &crate::capture::RollingBuffer::new(),
                0.0,
                1000.0,
                120.0,
                Grouping::ByChannel,
            )
            .unwrap();
        assert_eq!(plan.note_count(), 0);
    }

    #[test]
    fn test_encoder_settings_default_meter() {
        let settings = EncodeSettings::new(120.0);
        assert_eq!(settings.time_signature, (4, 4));
        assert_eq!(settings.ppq, crate::timing::PPQ);
    }
}
