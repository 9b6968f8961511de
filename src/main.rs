//! api-util CLI
//!
//! Runs the paginated document demo server

use api_util::cli::{Cli, Runner};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
