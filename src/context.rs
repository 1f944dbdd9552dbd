//! Service context that bundles the port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::transport::ReqwestTransport;
use crate::adapters::recording::http_transport::{RecordingHttpTransport, PORT};
use crate::adapters::replaying::http_transport::ReplayingHttpTransport;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::ImageError;
use crate::ports::HttpTransport;

/// Root directory for recorded sessions.
const CASSETTE_ROOT: &str = ".imagecast/cassettes";

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Outbound HTTP port.
    pub transport: Box<dyn HttpTransport>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Context that talks to the network.
    #[must_use]
    pub fn live() -> Self {
        Self::with_transport(Box::new(ReqwestTransport::new()))
    }

    /// Context wrapping any transport, e.g. a test double.
    #[must_use]
    pub fn with_transport(transport: Box<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Live context whose exchanges are recorded under `.imagecast/cassettes/<timestamp>/`.
    #[must_use]
    pub fn recording() -> (Self, RecordingSession) {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(CASSETTE_ROOT).join(&timestamp).join(format!("{PORT}.cassette.yaml"));
        let recorder = CassetteRecorder::new(path, format!("{timestamp}-{PORT}"), get_commit_hash());
        tracing::debug!(path = %recorder.path().display(), "recording transport exchanges");
        let recorder = Arc::new(Mutex::new(recorder));

        let transport = RecordingHttpTransport::new(Box::new(ReqwestTransport::new()), Arc::clone(&recorder));
        (Self { transport: Box::new(transport) }, RecordingSession { recorder })
    }

    /// Context that serves every exchange from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, ImageError> {
        let replayer = load_cassette(path).map_err(ImageError::Config)?;
        let transport = ReplayingHttpTransport::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { transport: Box::new(transport) })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
