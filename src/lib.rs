// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Catchonika: always-on MIDI capture.
//!
//! Keeps a rolling history of everything played on connected MIDI inputs
//! and exports any slice of it as a Standard MIDI File, with note lengths
//! reconstructed under sustain-pedal semantics.

pub mod capture;
pub mod config;
pub mod error;
pub mod midi;
pub mod recording;
pub mod timing;

pub use capture::{CaptureSession, CaptureStatus, Source};
pub use error::{CaptureError, EncodeError};
pub use recording::{ExportRange, ExportRequest, Grouping};
