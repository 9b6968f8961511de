//! Logging setup
//!
//! A [`Logger`] is an explicit handle around a configured `tracing`
//! subscriber. Pass it to whatever needs it; install it as the process-wide
//! default at most once with [`Logger::install`], or run code under it with
//! [`Logger::scope`].

use crate::error::{Error, Result};
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};
use tracing_subscriber::EnvFilter;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one event per line
    #[default]
    Full,
    /// Shorter human-readable lines
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Logger configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Default minimum level
    pub level: LogLevel,
    pub format: LogFormat,
    /// Emit ANSI colour codes
    pub ansi: bool,
    /// Extra `EnvFilter` directives, e.g. `tower_http=debug`
    pub directives: Option<String>,
}

/// A configured logging handle
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    options: LoggerOptions,
}

impl Logger {
    /// Build a logger that writes to stderr
    pub fn new(options: &LoggerOptions) -> Result<Self> {
        Self::with_writer(options, std::io::stderr)
    }

    /// Build a logger that writes through `writer`
    pub fn with_writer<W>(options: &LoggerOptions, writer: W) -> Result<Self>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(build_filter(options)?)
            .with_ansi(options.ansi)
            .with_writer(BoxMakeWriter::new(writer));

        let dispatch = match options.format {
            LogFormat::Full => Dispatch::new(builder.finish()),
            LogFormat::Compact => Dispatch::new(builder.compact().finish()),
            LogFormat::Json => Dispatch::new(builder.json().finish()),
        };

        Ok(Self {
            dispatch,
            options: options.clone(),
        })
    }

    /// Make this logger the process-wide default
    ///
    /// Succeeds once per process; later calls fail with
    /// [`Error::LoggerAlreadyInstalled`].
    pub fn install(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| Error::LoggerAlreadyInstalled)
    }

    /// Run `f` with this logger as the current thread's default
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }
}

fn build_filter(options: &LoggerOptions) -> Result<EnvFilter> {
    let mut directives = options.level.as_str().to_string();
    if let Some(extra) = options.directives.as_deref().filter(|d| !d.trim().is_empty()) {
        directives.push(',');
        directives.push_str(extra);
    }

    EnvFilter::try_new(&directives).map_err(|e| Error::invalid_value("directives", e.to_string()))
}
