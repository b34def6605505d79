// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Capture session.
//!
//! Owns the rolling log, live bookkeeping and sweep schedule, with the
//! clock and encoder injected at construction. All operations take the
//! session by reference, so a single owner processes messages, sweeps and
//! exports one at a time.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::buffer::RollingBuffer;
use super::event::Source;
use super::ingest::EventIngestor;
use super::sweep::SweepSchedule;
use crate::error::CaptureError;
use crate::recording::{
    export_filename, EncodeSettings, Encoder, ExportPlan, ExportRequest, Grouping, RangeExporter,
};
use crate::timing::{Clock, Millis, SessionClock};

/// Runtime settings of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Retention window in minutes
    pub retention_minutes: f64,
    /// Milliseconds between sweeps
    pub sweep_interval_ms: Millis,
    /// Tempo used when an export does not override it
    pub default_bpm: f64,
    /// Grouping used when an export does not override it
    pub grouping: Grouping,
    /// Time signature handed to the encoder
    pub time_signature: (u8, u8),
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            retention_minutes: 10.0,
            sweep_interval_ms: 5000.0,
            default_bpm: 120.0,
            grouping: Grouping::ByChannel,
            time_signature: (4, 4),
        }
    }
}

/// Human-readable capture state
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStatus {
    /// The platform could not provide MIDI input
    Unavailable(String),
    /// MIDI is available but no input is connected
    Idle,
    /// Capturing from at least one input
    Listening {
        inputs: usize,
        events: usize,
        sounding: usize,
        sustained: usize,
    },
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStatus::Unavailable(reason) => write!(f, "MIDI unavailable: {}", reason),
            CaptureStatus::Idle => write!(f, "Waiting for MIDI inputs"),
            CaptureStatus::Listening {
                inputs,
                events,
                sounding,
                sustained,
            } => {
                write!(
                    f,
                    "Listening to {} input{} | {} events buffered | {} sounding",
                    inputs,
                    if *inputs == 1 { "" } else { "s" },
                    events,
                    sounding
                )?;
                if *sustained > 0 {
                    write!(f, " ({} held by pedal)", sustained)?;
                }
                Ok(())
            }
        }
    }
}

/// An encoded export ready for delivery
#[derive(Debug, Clone)]
pub struct ExportedFile {
    /// Suggested filename
    pub filename: String,
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// What was exported
    pub plan: ExportPlan,
}

/// Builder for [`CaptureSession`]
#[derive(Default)]
pub struct CaptureSessionBuilder {
    clock: Option<Arc<dyn Clock>>,
    encoder: Option<Arc<dyn Encoder>>,
    settings: SessionSettings,
}

impl CaptureSessionBuilder {
    /// Use this clock instead of a wall clock started at build time
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Encoder used by exports (required)
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Session settings
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the session. Fails when no encoder was supplied.
    pub fn build(self) -> Result<CaptureSession, CaptureError> {
        let encoder = self.encoder.ok_or_else(|| {
            CaptureError::Configuration("no MIDI file encoder available".to_string())
        })?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SessionClock::new()) as Arc<dyn Clock>);
        let schedule = SweepSchedule::new(self.settings.sweep_interval_ms, clock.now_ms());

        Ok(CaptureSession {
            clock,
            encoder,
            settings: self.settings,
            buffer: RollingBuffer::new(),
            ingestor: EventIngestor::new(),
            exporter: RangeExporter::new(),
            schedule,
            inputs: 0,
            unavailable: None,
        })
    }
}

/// A capture session with injected clock and encoder
pub struct CaptureSession {
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn Encoder>,
    settings: SessionSettings,
    buffer: RollingBuffer,
    ingestor: EventIngestor,
    exporter: RangeExporter,
    schedule: SweepSchedule,
    inputs: usize,
    unavailable: Option<String>,
}

impl CaptureSession {
    /// Start building a session
    pub fn builder() -> CaptureSessionBuilder {
        CaptureSessionBuilder::default()
    }

    /// Current session time
    pub fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Session settings
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Replace the settings. A new sweep interval restarts the schedule;
    /// a new retention window applies from the next sweep.
    pub fn apply_settings(&mut self, settings: SessionSettings) {
        if settings.sweep_interval_ms != self.settings.sweep_interval_ms {
            self.schedule
                .set_interval(settings.sweep_interval_ms, self.clock.now_ms());
        }
        info!(
            retention_minutes = settings.retention_minutes,
            default_bpm = settings.default_bpm,
            "applied capture settings"
        );
        self.settings = settings;
    }

    /// Shared handle to the session clock, for stamping messages where
    /// they arrive
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Ingest one raw message from `source`, timestamped now
    pub fn ingest(&mut self, data: &[u8], source: &Source) {
        let t = self.clock.now_ms();
        self.ingest_at(t, data, source);
    }

    /// Ingest one raw message stamped `t` when it was received
    pub fn ingest_at(&mut self, t: Millis, data: &[u8], source: &Source) {
        self.ingestor.ingest(&mut self.buffer, t, data, source);
    }

    /// Run the sweep if it is due. Returns the number of evicted events
    /// when a sweep ran.
    pub fn tick(&mut self) -> Option<usize> {
        let now = self.clock.now_ms();
        if !self.schedule.poll(now) {
            return None;
        }
        Some(self.sweep_at(now))
    }

    /// Sweep immediately regardless of the schedule
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.sweep_at(now)
    }

    fn sweep_at(&mut self, now: Millis) -> usize {
        let removed = self.buffer.sweep(now, self.settings.retention_minutes);
        if removed > 0 {
            debug!(removed, retained = self.buffer.len(), "swept rolling buffer");
        }
        removed
    }

    /// Plan an export without encoding it
    pub fn plan(&self, request: &ExportRequest) -> Result<ExportPlan, CaptureError> {
        let (start, end) = request.range.window(&self.buffer, self.clock.now_ms());
        let bpm = request.bpm.unwrap_or(self.settings.default_bpm);
        let grouping = request.grouping.unwrap_or(self.settings.grouping);
        self.exporter.plan(&self.buffer, start, end, bpm, grouping)
    }

    /// Export a range, naming the file after the current UTC time
    pub fn export(&self, request: &ExportRequest) -> Result<ExportedFile, CaptureError> {
        self.export_at(request, Utc::now())
    }

    /// Export a range, naming the file after `timestamp`
    pub fn export_at(
        &self,
        request: &ExportRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<ExportedFile, CaptureError> {
        let plan = self.plan(request)?;
        if plan.note_count() == 0 {
            return Err(CaptureError::NothingToExport {
                start_ms: plan.start_ms,
                end_ms: plan.end_ms,
            });
        }

        let settings = EncodeSettings {
            time_signature: self.settings.time_signature,
            ..EncodeSettings::new(plan.bpm)
        };
        let bytes = self.encoder.encode(&plan.placements(), &settings)?;
        let filename = export_filename(&request.range.label(), plan.bpm, timestamp);

        info!(
            range = %request.range,
            notes = plan.note_count(),
            tracks = plan.groups.len(),
            bpm = plan.bpm,
            "exported range"
        );

        Ok(ExportedFile {
            filename,
            bytes,
            plan,
        })
    }

    /// Record how many inputs are connected
    pub fn set_inputs(&mut self, inputs: usize) {
        self.unavailable = None;
        self.inputs = inputs;
        if inputs == 0 {
            self.ingestor.reset();
        }
    }

    /// Mark MIDI as unavailable; the session stays idle
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.unavailable = Some(reason.into());
        self.inputs = 0;
    }

    /// Current status
    pub fn status(&self) -> CaptureStatus {
        if let Some(reason) = &self.unavailable {
            return CaptureStatus::Unavailable(reason.clone());
        }
        if self.inputs == 0 {
            return CaptureStatus::Idle;
        }
        CaptureStatus::Listening {
            inputs: self.inputs,
            events: self.buffer.len(),
            sounding: self.ingestor.sounding(),
            sustained: self.ingestor.sustained(),
        }
    }

    /// The rolling log
    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    /// Live ingestion state
    pub fn ingestor(&self) -> &EventIngestor {
        &self.ingestor
    }
}
