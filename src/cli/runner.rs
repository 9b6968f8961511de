//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::server;
use crate::config::ServerSettings;
use crate::error::Result;
use crate::logger::Logger;
use crate::types::LogLevel;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let settings = self.settings()?;
        match &self.cli.command {
            Commands::Config => {
                print!("{}", settings.to_yaml()?);
                Ok(())
            }
            Commands::Serve { .. } => {
                Logger::new(&settings.log)?.install()?;
                server::serve(settings).await
            }
        }
    }

    /// Resolve settings: file first, then environment, then flags
    pub fn settings(&self) -> Result<ServerSettings> {
        let mut settings = ServerSettings::load_or_default(self.cli.config.as_deref())?;

        if settings.log.directives.is_none() {
            settings.log.directives = std::env::var("RUST_LOG").ok();
        }
        if let Some(level) = self.cli.log_level {
            settings.log.level = level;
        }
        if self.cli.verbose {
            settings.log.level = LogLevel::Debug;
        }
        if let Some(format) = self.cli.log_format {
            settings.log.format = format;
        }

        if let Commands::Serve {
            port,
            host,
            seed,
            page_size,
        } = &self.cli.command
        {
            if let Some(port) = port {
                settings.port = *port;
            }
            if let Some(host) = host {
                settings.host.clone_from(host);
            }
            if let Some(seed) = seed {
                settings.seed.count = *seed;
            }
            if let Some(page_size) = page_size {
                settings.pagination.page_size = *page_size;
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}
