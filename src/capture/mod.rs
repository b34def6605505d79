// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live capture.
//!
//! This module provides:
//! - Typed, timestamped capture events
//! - Ingestion with live sustain bookkeeping
//! - The rolling event log and its sweep schedule
//! - The capture session tying them together

pub mod buffer;
pub mod event;
pub mod ingest;
pub mod notes;
pub mod session;
pub mod sweep;

pub use buffer::RollingBuffer;
pub use event::{EventKind, RawEvent, Source};
pub use ingest::{EventIngestor, LiveStats};
pub use notes::{KeySlot, KeyState, NoteTable, Release};
pub use session::{CaptureSession, CaptureSessionBuilder, CaptureStatus, ExportedFile, SessionSettings};
pub use sweep::SweepSchedule;
