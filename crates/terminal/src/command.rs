//! Command line parsing

use crate::hex::{parse_hex, HexError};
use session::ViewMode;
use std::path::PathBuf;
use thiserror::Error;

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  open <port> [baud]    open a serial port (Win: COM3, Linux/mac: /dev/ttyUSB0)
  close                 close the serial port
  txs <text>            send text as raw bytes
  txx <hex...>          send hex, e.g. txx 55 AA 01 02 0x0D 0A
  live [on|off]         live display on/off (default on)
  mode [ascii|hex]      display mode
  log on [file]         log received bytes to a file (default from config)
  log off               stop logging
  dump [N]              peek up to N buffered bytes without consuming (default 256)
  size | free           ring buffer usage
  stat                  totals: received/sent/shown/dropped, buffer and link state
  find <text>           search the buffer for text
  findx <hex...>        search the buffer for hex bytes
  clear                 discard buffered bytes
  rtscts [on|off]       hardware flow control
  ports                 list serial ports
  exit | quit           leave";

/// A parsed terminal command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Open { port: String, baud: Option<u32> },
    Close,
    SendText(String),
    SendHex(Vec<u8>),
    /// `None` queries the current state
    Live(Option<bool>),
    Mode(Option<ViewMode>),
    LogOn(Option<PathBuf>),
    LogOff,
    Dump(Option<usize>),
    Size,
    Free,
    Stat,
    Find(Vec<u8>),
    Clear,
    RtsCts(Option<bool>),
    Ports,
}

/// Errors parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}  (type `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("bad hex input: {0}")]
    Hex(#[from] HexError),
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "exit" | "quit" => Command::Quit,
            "open" => parse_open(args)?,
            "close" => Command::Close,
            "txs" if !args.is_empty() => Command::SendText(args.to_string()),
            "txs" => return Err(CommandError::Usage("txs <text>")),
            "txx" => Command::SendHex(parse_hex(args)?),
            "live" => Command::Live(parse_switch(args, "live [on|off]")?),
            "mode" => Command::Mode(parse_mode(args)?),
            "log" => parse_log(args)?,
            "dump" => Command::Dump(parse_count(args)?),
            "size" => Command::Size,
            "free" => Command::Free,
            "stat" | "stats" => Command::Stat,
            "find" if !args.is_empty() => Command::Find(args.as_bytes().to_vec()),
            "find" => return Err(CommandError::Usage("find <text>")),
            "findx" => Command::Find(parse_hex(args)?),
            "clear" => Command::Clear,
            "rtscts" => Command::RtsCts(parse_switch(args, "rtscts [on|off]")?),
            "ports" => Command::Ports,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_open(args: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "open <port> [baud]";
    let mut parts = args.split_whitespace();
    let port = parts.next().ok_or(CommandError::Usage(USAGE))?;
    let baud = parts
        .next()
        .map(|b| b.parse::<u32>().map_err(|_| CommandError::Usage(USAGE)))
        .transpose()?;
    Ok(Command::Open {
        port: port.to_string(),
        baud,
    })
}

fn parse_switch(args: &str, usage: &'static str) -> Result<Option<bool>, CommandError> {
    match args.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "on" => Ok(Some(true)),
        "off" => Ok(Some(false)),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn parse_mode(args: &str) -> Result<Option<ViewMode>, CommandError> {
    if args.is_empty() {
        return Ok(None);
    }
    args.parse::<ViewMode>()
        .map(Some)
        .map_err(|_| CommandError::Usage("mode [ascii|hex]"))
}

fn parse_log(args: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "log on [file] | log off";
    let mut parts = args.split_whitespace();
    match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("on") => Ok(Command::LogOn(parts.next().map(PathBuf::from))),
        Some("off") => Ok(Command::LogOff),
        _ => Err(CommandError::Usage(USAGE)),
    }
}

fn parse_count(args: &str) -> Result<Option<usize>, CommandError> {
    const USAGE: &str = "dump [N]  (decimal or 0x hex)";
    if args.is_empty() {
        return Ok(None);
    }
    let parsed = match args.strip_prefix("0x").or_else(|| args.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => args.parse::<usize>(),
    };
    parsed.map(Some).map_err(|_| CommandError::Usage(USAGE))
}
