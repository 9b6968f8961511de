//! Request body JSON decoding
//!
//! Thin wrappers over serde_json that turn decode failures into
//! [`Error::Body`], which handlers answer with `400 Bad Request`.

use crate::error::{Error, Result};
use axum::body::Body;
use serde::de::DeserializeOwned;

/// Default upper bound on a buffered request body (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Decode a JSON request body into `T`
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::body("request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| Error::body(format!("invalid JSON: {e}")))
}

/// Buffer at most `limit` bytes of `body` and decode it as JSON
pub async fn read_json<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| Error::body(format!("failed to read request body: {e}")))?;
    parse_json(&bytes)
}
