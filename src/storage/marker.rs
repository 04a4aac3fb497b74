//! Completion markers for cached task results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Marker file written beside a task's persisted results.
const MARKER_FILE: &str = ".completed.json";

/// Version for marker format compatibility.
pub const MARKER_VERSION: u32 = 1;

/// Proof that a task ran to completion in some earlier invocation.
///
/// A marker with `completed_at` unset never satisfies a reuse check; the
/// engine deletes any stale marker before work begins, so a crash mid-run
/// cannot be mistaken for a valid cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    /// Identifier of the run that wrote this marker.
    pub run_id: Uuid,
    /// When the task entered its running state.
    pub started_at: DateTime<Utc>,
    /// When the task finished, absent while it is still running.
    pub completed_at: Option<DateTime<Utc>>,
    /// Marker format version.
    pub version: u32,
}

impl Marker {
    /// Start a fresh marker for a new run.
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            version: MARKER_VERSION,
        }
    }

    /// Stamp the completion time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// True when the marker proves a clean completion.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    fn path(dir: &Path) -> PathBuf {
        dir.join(MARKER_FILE)
    }

    /// Write this marker into `dir` atomically.
    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let tmp = dir.join(format!("{MARKER_FILE}.tmp"));
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, Self::path(dir))?;
        debug!(dir = %dir.display(), complete = self.is_complete(), "wrote marker");
        Ok(())
    }

    /// Read the marker in `dir`, `None` when absent or unreadable.
    pub fn read(dir: &Path) -> Option<Marker> {
        let bytes = std::fs::read(Self::path(dir)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Remove any marker in `dir`. Missing markers are not an error.
    pub fn remove(dir: &Path) -> Result<()> {
        match std::fs::remove_file(Self::path(dir)) {
            Ok(()) => {
                debug!(dir = %dir.display(), "removed stale marker");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut marker = Marker::start();
        assert!(!marker.is_complete());
        marker.complete();
        marker.write(dir.path()).unwrap();

        let read = Marker::read(dir.path()).unwrap();
        assert!(read.is_complete());
        assert_eq!(read.run_id, marker.run_id);
        assert_eq!(read.version, MARKER_VERSION);
    }

    #[test]
    fn test_missing_marker_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Marker::read(dir.path()).is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        Marker::remove(dir.path()).unwrap();
        Marker::start().write(dir.path()).unwrap();
        Marker::remove(dir.path()).unwrap();
        assert!(Marker::read(dir.path()).is_none());
    }
}
