//! Health-check endpoint
//!
//! | Route | Handler | Answers |
//! |---|---|---|
//! | `/health` | [`handler`] | Probe result, uptime, time in current state. 200 or 500. |
//! | `/healthz` | [`liveness`] | Always 200 while the process can serve HTTP. |
//!
//! ```rust,ignore
//! let check = HealthCheck::new(move || pool.is_connected());
//! let app = Router::new()
//!     .route("/health", get(healthcheck::handler))
//!     .with_state(check);
//! ```

use crate::viewer;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Current health of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Map a probe result to a status
    pub fn from_probe(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }

    /// HTTP status a health response carries
    pub fn status_code(self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "Healthy"),
            Self::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

// Wire format is the numeric code: 0 healthy, 1 unhealthy.
impl Serialize for HealthStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            Self::Healthy => 0,
            Self::Unhealthy => 1,
        })
    }
}

/// Body of a health response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub health: HealthStatus,
    pub current_time: DateTime<Utc>,
    /// Time since the check was created, in nanoseconds on the wire
    #[serde(serialize_with = "as_nanos")]
    pub uptime: Duration,
    /// Time since health last changed, in nanoseconds on the wire
    #[serde(serialize_with = "as_nanos")]
    pub time_in_current_state: Duration,
}

fn as_nanos<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
}

#[derive(Debug)]
struct HealthState {
    health: HealthStatus,
    started_at: Instant,
    last_change_at: Instant,
}

type Probe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Health check with uptime and state-change tracking
///
/// Cloning shares the underlying state, so a clone per handler is fine.
#[derive(Clone)]
pub struct HealthCheck {
    probe: Probe,
    state: Arc<Mutex<HealthState>>,
}

impl HealthCheck {
    /// Create a check that asks `probe` on every request
    pub fn new<F>(probe: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let now = Instant::now();
        Self {
            probe: Arc::new(probe),
            state: Arc::new(Mutex::new(HealthState {
                health: HealthStatus::Healthy,
                started_at: now,
                last_change_at: now,
            })),
        }
    }

    /// Create a check whose probe always passes
    pub fn always_healthy() -> Self {
        Self::new(|| true)
    }

    /// Run the probe and update the state-change clock
    pub fn check(&self) -> HealthReport {
        let health = HealthStatus::from_probe((self.probe)());
        let now = Instant::now();

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.health != health {
            if health.is_healthy() {
                tracing::info!(from = %state.health, to = %health, "health changed");
            } else {
                tracing::warn!(from = %state.health, to = %health, "health changed");
            }
            state.health = health;
            state.last_change_at = now;
        }

        HealthReport {
            health,
            current_time: Utc::now(),
            uptime: now.saturating_duration_since(state.started_at),
            time_in_current_state: now.saturating_duration_since(state.last_change_at),
        }
    }

    /// Run the check and render it as an HTTP response
    pub fn response(&self) -> Response {
        let report = self.check();
        match serde_json::to_vec(&report) {
            Ok(body) => (
                report.health.status_code(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode health report");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                )
                    .into_response()
            }
        }
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::always_healthy()
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// axum handler for the full health check
pub async fn handler(State(check): State<HealthCheck>) -> Response {
    check.response()
}

/// Liveness probe: answers 200 whenever the process can serve HTTP
pub async fn liveness() -> Response {
    viewer::send_data(&serde_json::json!({ "status": "ok" }), None)
}
