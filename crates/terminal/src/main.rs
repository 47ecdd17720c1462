//! Serial Terminal - Main Entry Point
//!
//! Usage: `serial-term [config.toml]`

use anyhow::Context;
use serial_link::SerialConnector;
use session::Session;
use std::path::PathBuf;
use terminal::{init_logging, run_console, TerminalConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = TerminalConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_logging(&config.log_level)?;

    info!("=== Serial Terminal v{} ===", env!("CARGO_PKG_VERSION"));

    let session = Session::start(
        config.session.clone(),
        Box::new(SerialConnector),
        Box::new(std::io::stdout()),
    )
    .context("starting session")?;

    if let Some(port) = &config.port {
        match session.open(port, config.baud_rate) {
            Ok(()) => println!("Opened {} @ {} 8N1", port, config.baud_rate),
            Err(e) => warn!("Could not open configured port {}: {}", port, e),
        }
    }

    println!("Serial terminal ready. Type `help` for commands.");
    let result = run_console(&session, &config).await;

    session.stop();
    println!("bye.");
    result
}
