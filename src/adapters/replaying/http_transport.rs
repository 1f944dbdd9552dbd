//! Replaying adapter for the `HttpTransport` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::https_image_url;
use crate::adapters::recording::http_transport::PORT;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::ImageError;
use crate::ports::http_transport::{Download, TransportFuture};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};

/// Serves recorded responses and downloads without touching the network.
pub struct ReplayingHttpTransport {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingHttpTransport {
    /// Create a replaying transport backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }

    fn replay<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T, ImageError> {
        let output = next_output(&self.replayer, PORT, method).map_err(ImageError::Config)?;
        replay_result(output).map_err(ImageError::Network)
    }
}

impl HttpTransport for ReplayingHttpTransport {
    fn send<'a>(&'a self, request: &'a HttpRequest) -> TransportFuture<'a, HttpResponse> {
        tracing::debug!(method = %request.method, "replaying request");
        let result = self.replay("send");
        Box::pin(async move { result })
    }

    fn download<'a>(&'a self, url: &'a str) -> TransportFuture<'a, Download> {
        let result = https_image_url(url).and_then(|_| self.replay("download"));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::cassette::format::{Cassette, Interaction};

    fn transport(interactions: Vec<Interaction>) -> ReplayingHttpTransport {
        let cassette = Cassette { name: "t".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions };
        ReplayingHttpTransport::new(Arc::new(Mutex::new(CassetteReplayer::new(&cassette))))
    }

    fn interaction(seq: u64, method: &str, output: serde_json::Value) -> Interaction {
        Interaction { seq, port: PORT.into(), method: method.into(), input: serde_json::json!({}), output }
    }

    #[tokio::test]
    async fn serves_recorded_response_and_download() {
        let replaying = transport(vec![
            interaction(0, "send", serde_json::json!({"Ok": {"status": 200, "body": {"data": []}}})),
            interaction(1, "download", serde_json::json!({"Ok": {"data": "/9j/4A=="}})),
        ]);

        let request = HttpRequest::post_json("https://api.example.com/v1/images/generations", serde_json::json!({}));
        let response = replaying.send(&request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, serde_json::json!({"data": []}));

        let download = replaying.download("https://cdn.example.com/a.jpg").await.unwrap();
        assert_eq!(download.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn plain_http_links_are_refused_like_live() {
        let replaying = transport(vec![interaction(0, "download", serde_json::json!({"Ok": {"data": "/9j/4A=="}}))]);

        let err = replaying.download("http://cdn.example.com/a.jpg").await.unwrap_err();
        assert!(matches!(err, ImageError::Decode(ref m) if m.contains("only https")));

        // The refused link did not consume the recorded download.
        assert!(replaying.download("https://cdn.example.com/a.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn recorded_errors_and_exhaustion_surface_as_errors() {
        let replaying = transport(vec![interaction(0, "send", serde_json::json!({"Err": "Network error: refused"}))]);
        let request = HttpRequest::post_json("https://api.example.com", serde_json::json!({}));

        let err = replaying.send(&request).await.unwrap_err();
        assert!(err.to_string().contains("refused"));

        let err = replaying.send(&request).await.unwrap_err();
        assert!(err.to_string().contains("Cassette exhausted"));
    }
}
