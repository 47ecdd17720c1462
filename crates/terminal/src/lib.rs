//! Serial Terminal
//!
//! Line-oriented command surface over a [`session::Session`]: open and close
//! ports, send text or hex, toggle the live view, inspect and search the
//! capture buffer, and log received bytes to a file.

pub mod command;
pub mod config;
pub mod console;
pub mod hex;

pub use command::{Command, CommandError};
pub use config::TerminalConfig;
pub use console::{execute, run_console, Flow};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging on stderr so it never mixes into the live view on stdout
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
