//! Interactive console loop and command execution

use crate::command::{Command, HELP};
use crate::config::TerminalConfig;
use session::{render, Session, ViewMode};
use std::io::{self, BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Whether the console keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Read commands from stdin until `exit`, EOF or ctrl-c
pub async fn run_console(session: &Session, config: &TerminalConfig) -> anyhow::Result<()> {
    let mut lines = spawn_stdin_reader()?;
    let mut stdout = io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        write!(stdout, "\nser> ")?;
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };

        match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => {
                if execute(session, config, command, &mut stdout)? == Flow::Exit {
                    break;
                }
            }
            Err(e) => writeln!(stdout, "{}", e)?,
        }
    }
    Ok(())
}

/// Forward stdin lines from a plain OS thread.
///
/// The thread is never joined: a read still blocked on stdin at exit must
/// not hold up runtime shutdown.
fn spawn_stdin_reader() -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Reading stdin failed: {}", e);
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Run one command against the session, printing results to `out`.
///
/// Session errors are reported to the user, not returned; only failures to
/// write to `out` propagate.
pub fn execute(
    session: &Session,
    config: &TerminalConfig,
    command: Command,
    out: &mut dyn Write,
) -> io::Result<Flow> {
    match command {
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(Flow::Exit),
        Command::Open { port, baud } => {
            let baud = baud.unwrap_or(config.baud_rate);
            match session.open(&port, baud) {
                Ok(()) => writeln!(out, "Opened {} @ {} 8N1", port, baud)?,
                Err(e) => writeln!(out, "Open failed: {}", e)?,
            }
        }
        Command::Close => {
            if session.close() {
                writeln!(out, "Closed.")?;
            } else {
                writeln!(out, "Not open.")?;
            }
        }
        Command::SendText(text) => send(session, text.as_bytes(), out)?,
        Command::SendHex(bytes) => send(session, &bytes, out)?,
        Command::Live(None) => writeln!(out, "live = {}", on_off(session.is_live()))?,
        Command::Live(Some(live)) => session.set_live(live),
        Command::Mode(None) => writeln!(out, "mode = {}", session.view())?,
        Command::Mode(Some(view)) => session.set_view(view),
        Command::LogOn(path) => {
            let path = path.unwrap_or_else(|| config.log_path.clone());
            match session.start_logging(&path) {
                Ok(()) => writeln!(out, "Logging -> {}", path.display())?,
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
        Command::LogOff => {
            if session.stop_logging() {
                writeln!(out, "Logging off.")?;
            } else {
                writeln!(out, "Logging was not on.")?;
            }
        }
        Command::Dump(count) => {
            let count = count.unwrap_or(config.dump_default);
            if count == 0 {
                writeln!(out, "(N=0)")?;
            } else {
                let bytes = session.dump(count);
                writeln!(out, "{}", render(&bytes, session.view()))?;
            }
        }
        Command::Size => writeln!(out, "size = {}", session.size())?,
        Command::Free => writeln!(out, "free = {}", session.free_space())?,
        Command::Stat => writeln!(out, "{}", session.stats())?,
        Command::Find(pattern) => match session.search(&pattern) {
            Some(offset) => writeln!(
                out,
                "Found {} at offset {}",
                render(&pattern, ViewMode::Hex).trim_end(),
                offset
            )?,
            None => writeln!(out, "Not found.")?,
        },
        Command::Clear => {
            session.clear();
            writeln!(out, "Buffer cleared.")?;
        }
        Command::RtsCts(None) => writeln!(out, "rtscts = {}", on_off(session.flow_control()))?,
        Command::RtsCts(Some(enabled)) => match session.set_flow_control(enabled) {
            Ok(()) => writeln!(out, "RTS/CTS -> {}", on_off(enabled))?,
            Err(e) => writeln!(out, "Setting RTS/CTS failed: {}", e)?,
        },
        Command::Ports => match serial_link::available_ports() {
            Ok(ports) if ports.is_empty() => writeln!(out, "No serial ports found.")?,
            Ok(ports) => {
                for port in ports {
                    writeln!(out, "  {}", port)?;
                }
            }
            Err(e) => writeln!(out, "Listing ports failed: {}", e)?,
        },
    }
    Ok(Flow::Continue)
}

fn send(session: &Session, data: &[u8], out: &mut dyn Write) -> io::Result<()> {
    match session.send(data) {
        Ok(written) => writeln!(out, "Sent {}/{} bytes", written, data.len()),
        Err(e) => writeln!(out, "Send failed: {}", e),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
