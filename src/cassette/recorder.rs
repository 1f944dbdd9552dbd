//! Collects interactions and writes them out as a YAML cassette.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// In-memory recording session, written to disk by [`CassetteRecorder::finish`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Start a session that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), commit: commit.into(), interactions: Vec::new() }
    }

    /// Where the cassette will be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an interaction; sequence numbers follow call order.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction { seq, port: port.into(), method: method.into(), input, output });
    }

    /// Write the cassette, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            commit: self.commit,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn writes_interactions_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/http_transport.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "2026-01-01T00-00-00-http_transport", "deadbeef");
        recorder.record(
            "http_transport",
            "send",
            json!({"url": "https://api.example.com/v1/images/generations"}),
            json!({"Ok": {"status": 200, "body": {"data": []}}}),
        );
        recorder.record(
            "http_transport",
            "download",
            json!({"url": "https://cdn.example.com/a.png"}),
            json!({"Err": "Decode error: downloaded image is empty"}),
        );
        assert_eq!(recorder.path(), path.as_path());

        let written = recorder.finish().unwrap();
        assert_eq!(written, path);

        let cassette: Cassette = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.commit, "deadbeef");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].method, "send");
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].output["Err"], "Decode error: downloaded image is empty");
    }
}
