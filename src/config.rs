//! Settings for the bundled demo server
//!
//! Settings come from an optional YAML file; command-line flags and
//! environment variables override individual fields afterwards.
//!
//! ```yaml
//! port: 8080
//! log:
//!   level: debug
//!   format: json
//! pagination:
//!   page_size: 0
//!   query_timeout_secs: 60
//! seed:
//!   collection: events
//!   count: 500
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::logger::LoggerOptions;
use crate::pagemaster::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Server Settings
// ============================================================================

/// Complete demo server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Logging configuration
    pub log: LoggerOptions,

    /// Pagination defaults applied to every listing request
    pub pagination: PaginationSettings,

    /// Demo data inserted at startup
    pub seed: SeedSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log: LoggerOptions::default(),
            pagination: PaginationSettings::default(),
            seed: SeedSettings::default(),
        }
    }
}

/// Pagination defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// Fixed page size; 0 lets each request choose with `?pageSize=`
    pub page_size: i64,

    /// Limit for each query phase, in seconds
    pub query_timeout_secs: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: 0,
            query_timeout_secs: 60,
        }
    }
}

impl PaginationSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Demo data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    pub collection: String,
    /// Number of generated documents; 0 disables seeding
    pub count: usize,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            collection: "events".to_string(),
            count: 0,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl ServerSettings {
    /// Parse settings from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is valid and means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pagination.page_size < 0 {
            return Err(Error::invalid_value(
                "pagination.page_size",
                "must be zero or positive",
            ));
        }
        if self.pagination.page_size > i64::from(MAX_PAGE_SIZE) {
            tracing::warn!(
                page_size = self.pagination.page_size,
                max = MAX_PAGE_SIZE,
                "configured page size exceeds the maximum and will be clamped"
            );
        }
        if self.pagination.query_timeout_secs == 0 {
            return Err(Error::invalid_value(
                "pagination.query_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.seed.count > 0 && self.seed.collection.trim().is_empty() {
            return Err(Error::missing_field("seed.collection"));
        }
        Ok(())
    }

    /// Render the settings as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render settings")
    }
}
