// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for capture and export.

use std::io;

use thiserror::Error;

use crate::timing::Millis;

/// Failure reported by an encoder implementation
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A placement carried a pitch name that does not parse
    #[error("invalid pitch name: {0:?}")]
    InvalidPitch(String),
    /// A tick value does not fit the output format
    #[error("tick value {0} out of range")]
    TickOverflow(u64),
    /// Nothing to encode
    #[error("no tracks to encode")]
    NoTracks,
    /// Writing the encoded bytes failed
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
}

/// Errors surfaced by the capture session
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The platform cannot provide MIDI input (unsupported or denied)
    #[error("MIDI input unavailable: {0}")]
    Capability(String),
    /// A required collaborator or setting is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The export window is empty or inverted
    #[error("invalid export range {start_ms}..{end_ms}")]
    InvalidRange { start_ms: Millis, end_ms: Millis },
    /// The export window contains no complete notes
    #[error("no notes between {start_ms:.0}ms and {end_ms:.0}ms")]
    NothingToExport { start_ms: Millis, end_ms: Millis },
    /// The encoder rejected the placements
    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),
    /// Delivering the encoded file failed
    #[error("file delivery failed: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CaptureError::Capability("no backend".to_string());
        assert_eq!(err.to_string(), "MIDI input unavailable: no backend");

        let err = CaptureError::NothingToExport {
            start_ms: 0.0,
            end_ms: 1500.4,
        };
        assert_eq!(err.to_string(), "no notes between 0ms and 1500ms");
    }

    #[test]
    fn test_encode_error_converts() {
        let err: CaptureError = EncodeError::InvalidPitch("H2".to_string()).into();
        assert!(matches!(err, CaptureError::Encode(EncodeError::InvalidPitch(_))));
        assert_eq!(err.to_string(), "encoding failed: invalid pitch name: \"H2\"");
    }
}
