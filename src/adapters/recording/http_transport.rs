//! Recording adapter for the `HttpTransport` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::http_transport::{Download, TransportFuture};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};
use crate::redact::{redact_api_key, redact_headers};

/// Port name under which transport calls are recorded.
pub const PORT: &str = "http_transport";

/// Records every exchange while delegating to an inner transport.
///
/// Credentials are scrubbed from recorded requests: secret headers are
/// masked and `key=` query parameters are replaced.
pub struct RecordingHttpTransport {
    inner: Box<dyn HttpTransport>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingHttpTransport {
    /// Wrap `inner`, appending to `recorder`.
    pub fn new(inner: Box<dyn HttpTransport>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

fn scrubbed(request: &HttpRequest) -> HttpRequest {
    HttpRequest {
        url: redact_api_key(&request.url),
        headers: redact_headers(&request.headers),
        ..request.clone()
    }
}

impl HttpTransport for RecordingHttpTransport {
    fn send<'a>(&'a self, request: &'a HttpRequest) -> TransportFuture<'a, HttpResponse> {
        Box::pin(async move {
            let result = self.inner.send(request).await;
            record_result(&self.recorder, PORT, "send", &scrubbed(request), &result);
            result
        })
    }

    fn download<'a>(&'a self, url: &'a str) -> TransportFuture<'a, Download> {
        Box::pin(async move {
            let result = self.inner.download(url).await;
            let input = serde_json::json!({ "url": redact_api_key(url) });
            record_result(&self.recorder, PORT, "download", &input, &result);
            result
        })
    }
}
