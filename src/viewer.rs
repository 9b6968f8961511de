//! JSON response envelopes
//!
//! Successful payloads go out as `{"data": ...}`, paginated ones as
//! `{"data": [...], "next": "<token>"}` and failures as
//! `{"error": {"status": ..., "message": ...}}`.

use crate::error::Error;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Standard envelope for JSON payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEnvelope<T> {
    pub data: T,
}

impl<T> JsonEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Envelope for one page of results
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope<'a, T> {
    pub data: &'a [T],
    /// Continuation token; omitted on the last page
    #[serde(skip_serializing_if = "is_last_page")]
    pub next: &'a str,
}

fn is_last_page(next: &&str) -> bool {
    next.is_empty()
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail<'a> {
    status: u16,
    message: &'a str,
}

const INTERNAL_ERROR_BODY: &str =
    r#"{"error":{"status":500,"message":"Internal Server Error"}}"#;

/// Serialize `value` as the response body
///
/// `status` defaults to `200 OK`. If serialization fails the response is a
/// `500` with a generic error body.
pub fn send_json<T: Serialize + ?Sized>(value: &T, status: Option<StatusCode>) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => json_response(status.unwrap_or(StatusCode::OK), body),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response body");
            internal_error()
        }
    }
}

/// Wrap `value` in a [`JsonEnvelope`] and send it
pub fn send_data<T: Serialize + ?Sized>(value: &T, status: Option<StatusCode>) -> Response {
    send_json(&JsonEnvelope::new(value), status)
}

/// Send one page of results with its continuation token
pub fn send_page<T: Serialize>(data: &[T], next: &str) -> Response {
    send_json(&PageEnvelope { data, next }, None)
}

/// Send an error with the status it maps to
///
/// Client errors carry the error's message. Server errors carry only the
/// status reason; the detail goes to the log.
pub fn send_error(err: &Error) -> Response {
    let status = err.status_code();
    let message = if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        status
            .canonical_reason()
            .unwrap_or("Internal Server Error")
            .to_string()
    } else {
        tracing::debug!(error = %err, "request rejected");
        err.to_string()
    };
    send_json(
        &ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                message: &message,
            },
        },
        Some(status),
    )
}

/// A bare `500` with the generic error body
pub fn internal_error() -> Response {
    json_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY.as_bytes().to_vec())
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        send_error(&self)
    }
}
