// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reload configuration.
//!
//! Watches the configuration file and reloads it when it changes, so the
//! retention window and export defaults can be adjusted without stopping
//! capture.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use super::ConfigFile;

/// Events emitted by the config watcher
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// Configuration file was modified and successfully reloaded
    Reloaded(Box<ConfigFile>),
    /// Configuration file was modified but failed to parse or validate
    Error(String),
}

/// Configuration file watcher with debouncing and validation
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<ConfigEvent>,
    watched_path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new watcher for the configuration file at `path`
    ///
    /// # Arguments
    /// * `path` - Configuration file to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 500)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let (event_tx, event_rx): (Sender<ConfigEvent>, Receiver<ConfigEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        // Watch the parent directory: editors often replace the file
        // instead of writing it in place.
        let watch_dir = watched_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watch_dir, e))?;

        let target = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => {
                        let touches_target = event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == target.file_name());
                        if touches_target
                            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                        {
                            last_event_time = Some(Instant::now());
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        // Check if debounce period has passed
                        if let Some(last_time) = last_event_time {
                            if last_time.elapsed() >= debounce_duration {
                                last_event_time = None;
                                debug!(path = ?target, "reloading configuration");
                                let event = match ConfigFile::load(&target) {
                                    Ok(config) => ConfigEvent::Reloaded(Box::new(config)),
                                    Err(e) => ConfigEvent::Error(format!(
                                        "Failed to load {:?}: {:#}",
                                        target, e
                                    )),
                                };
                                if event_tx.send(event).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped, exit thread
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next config event (non-blocking)
    pub fn try_recv(&self) -> Option<ConfigEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending config events
    pub fn recv_all(&self) -> Vec<ConfigEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_valid_config() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catchonika.yaml");

        fs::write(&file_path, "capture:\n  buffer_minutes: 3\n").unwrap();

        let config = ConfigFile::load(&file_path).unwrap();
        assert_eq!(config.capture.buffer_minutes, 3.0);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.yaml");

        fs::write(&file_path, "this is not valid yaml: [").unwrap();
        assert!(ConfigFile::load(&file_path).is_err());

        fs::write(&file_path, "export:\n  default_bpm: 1000\n").unwrap();
        assert!(ConfigFile::load(&file_path).is_err());
    }

    #[test]
    fn test_watcher_creation() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catchonika.yaml");
        fs::write(&file_path, "{}").unwrap();

        let watcher = ConfigWatcher::new(&file_path, Some(100)).unwrap();
        assert_eq!(watcher.watched_path(), file_path.as_path());
        assert!(watcher.recv_all().is_empty());
    }

    #[test]
    fn test_watcher_detects_changes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("catchonika.yaml");
        fs::write(&file_path, "capture:\n  buffer_minutes: 10\n").unwrap();

        let watcher = ConfigWatcher::new(&file_path, Some(100)).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        fs::write(&file_path, "capture:\n  buffer_minutes: 4\n").unwrap();

        // Wait for debounce + processing
        std::thread::sleep(Duration::from_millis(400));

        let events = watcher.recv_all();
        if let Some(ConfigEvent::Reloaded(config)) = events
            .iter()
            .find(|e| matches!(e, ConfigEvent::Reloaded(_)))
        {
            assert_eq!(config.capture.buffer_minutes, 4.0);
        }
        // File events may not fire in every CI environment, so the event
        // itself is not asserted.
    }
}
