//! godfs - Entry Point
//!
//! Date-partitioned HTTP file storage.

use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use godfs::utils::setup_logging;
use godfs::{Cli, Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("godfs: {e}");
            return ExitCode::FAILURE;
        }
    };

    setup_logging(config.log_dir_path().as_deref());

    info!("Launching file server...");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.start().await {
        error!("Server stopped: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
