// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for Catchonika.
//!
//! This module provides data structures for loading and validating the
//! capture configuration: retention window, sweep period and export
//! defaults.

pub mod watcher;

pub use watcher::{ConfigEvent, ConfigWatcher};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::SessionSettings;
use crate::recording::Grouping;

/// Root configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConfigFile {
    /// Capture and retention settings
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,
}

impl ConfigFile {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.capture.buffer_minutes > 0.0) {
            bail!("capture.buffer_minutes must be positive");
        }
        if !(self.capture.sweep_interval_secs > 0.0) {
            bail!("capture.sweep_interval_secs must be positive");
        }
        if !(self.capture.rescan_interval_secs > 0.0) {
            bail!("capture.rescan_interval_secs must be positive");
        }
        if !(20.0..=300.0).contains(&self.export.default_bpm) {
            bail!(
                "export.default_bpm must be between 20 and 300, got {}",
                self.export.default_bpm
            );
        }
        let [numerator, denominator] = self.export.time_signature;
        if numerator == 0 || !denominator.is_power_of_two() {
            bail!(
                "export.time_signature {}/{} is not a valid meter",
                numerator,
                denominator
            );
        }
        Ok(())
    }

    /// Settings the capture session runs with
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            retention_minutes: self.capture.buffer_minutes,
            sweep_interval_ms: self.capture.sweep_interval_secs * 1000.0,
            default_bpm: self.export.default_bpm,
            grouping: Grouping::from_flag(self.export.group_by_channel),
            time_signature: (self.export.time_signature[0], self.export.time_signature[1]),
        }
    }
}

/// Capture-side configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Retention window in minutes
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: f64,
    /// Seconds between sweeps of the rolling buffer
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: f64,
    /// Seconds between scans for connected/disconnected inputs
    #[serde(default = "default_rescan_interval")]
    pub rescan_interval_secs: f64,
}

fn default_buffer_minutes() -> f64 {
    10.0
}
fn default_sweep_interval() -> f64 {
    5.0
}
fn default_rescan_interval() -> f64 {
    2.0
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_buffer_minutes(),
            sweep_interval_secs: default_sweep_interval(),
            rescan_interval_secs: default_rescan_interval(),
        }
    }
}

/// Export defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Tempo used when an export does not override it
    #[serde(default = "default_bpm")]
    pub default_bpm: f64,
    /// One track per channel instead of a single merged track
    #[serde(default = "default_group_by_channel")]
    pub group_by_channel: bool,
    /// Time signature written to every track
    #[serde(default = "default_time_signature")]
    pub time_signature: [u8; 2],
    /// Directory exported files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_bpm() -> f64 {
    120.0
}
fn default_group_by_channel() -> bool {
    true
}
fn default_time_signature() -> [u8; 2] {
    [4, 4]
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_bpm: default_bpm(),
            group_by_channel: default_group_by_channel(),
            time_signature: default_time_signature(),
            output_dir: default_output_dir(),
        }
    }
}
