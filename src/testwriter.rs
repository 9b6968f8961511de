//! Response recorder for handler tests
//!
//! [`TestWriter`] captures the status, headers and body of a handler's
//! response and checks them against expectations set up front.
//!
//! ```rust,ignore
//! let mut writer = TestWriter::new(TestWriterOptions {
//!     expected_status: Some(StatusCode::OK),
//!     ..Default::default()
//! });
//! writer.record(my_handler().await).await?;
//! writer.assert_expectations();
//! ```

use crate::error::{Error, Result};
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde::de::DeserializeOwned;

/// Expectations checked by [`TestWriter::assert_expectations`]
#[derive(Debug, Clone, Default)]
pub struct TestWriterOptions {
    pub expected_status: Option<StatusCode>,
    /// Every listed header must be present with the listed value
    pub expected_headers: HeaderMap,
}

/// Records one HTTP response for assertions
#[derive(Debug, Default)]
pub struct TestWriter {
    expected_status: Option<StatusCode>,
    expected_headers: HeaderMap,
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
}

impl TestWriter {
    pub fn new(options: TestWriterOptions) -> Self {
        Self {
            expected_status: options.expected_status,
            expected_headers: options.expected_headers,
            ..Default::default()
        }
    }

    /// Capture a response, buffering its whole body
    pub async fn record(&mut self, response: Response) -> Result<()> {
        let (parts, body) = response.into_parts();
        self.status = Some(parts.status);
        self.headers = parts.headers;
        self.body = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| Error::body(format!("failed to read response body: {e}")))?;
        Ok(())
    }

    /// Recorded status; `None` until a response is recorded
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First recorded value of a header, if it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Recorded body; empty until a response is recorded
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Recorded body as lossy UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the recorded body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn expected_status(&self) -> Option<StatusCode> {
        self.expected_status
    }

    pub fn expected_headers(&self) -> &HeaderMap {
        &self.expected_headers
    }

    /// Assert the recorded response matches the expectations
    ///
    /// # Panics
    ///
    /// Panics on a status mismatch or a missing/different expected header.
    pub fn assert_expectations(&self) {
        if let Some(expected) = self.expected_status {
            assert_eq!(
                self.status,
                Some(expected),
                "unexpected status code, body: {}",
                self.text()
            );
        }

        for (name, value) in &self.expected_headers {
            let actual: Vec<_> = self.headers.get_all(name).iter().collect();
            assert!(
                actual.contains(&value),
                "header '{name}': expected {value:?}, got {actual:?}"
            );
        }
    }
}
