//! Recording session owning the cassette recorder for one run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::recorder::CassetteRecorder;

/// Owns the single `CassetteRecorder` of one recorded run.
///
/// Every recording adapter shares the same recorder, so all ports land in
/// one `<dir>/<run_id>.cassette.yaml` in call order. That file is what
/// `TRACKLINK_REPLAY` consumes.
pub struct RecordingSession {
    /// Recorder shared by every recording adapter of the run.
    pub recorder: Arc<Mutex<CassetteRecorder>>,
    path: PathBuf,
}

impl RecordingSession {
    /// Create a recording session for `run_id` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cassette file already exists
    /// - The directory cannot be created
    pub fn at(dir: &Path, run_id: &str) -> Result<Self, String> {
        let path = dir.join(format!("{run_id}.cassette.yaml"));

        if path.exists() {
            return Err(format!("Cassette already exists: {}", path.display()));
        }

        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, run_id, run_id)));
        Ok(Self { recorder, path })
    }

    /// Finish the recorder and write the cassette file to disk.
    ///
    /// Returns the path of the written cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if a recording adapter is still alive or the
    /// cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapters still hold the recorder".to_owned())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}
