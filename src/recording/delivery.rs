// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Delivery of encoded files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Receives encoded bytes and persists them somewhere
pub trait FileSink {
    /// Deliver `bytes` under `filename`, returning where they went
    fn deliver(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes files into a directory, creating it if needed
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing into `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn deliver(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote MIDI file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        let path = sink.deliver("take.mid", b"MThd").unwrap();
        assert_eq!(path, dir.path().join("exports").join("take.mid"));
        assert_eq!(fs::read(&path).unwrap(), b"MThd");
    }
}
