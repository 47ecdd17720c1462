//! Display rendering for ASCII and hex views

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Stand-in for bytes outside printable ASCII
pub const PLACEHOLDER: char = '.';

/// How received bytes are shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Printable ASCII passes through, everything else becomes [`PLACEHOLDER`]
    #[default]
    Ascii,
    /// Two uppercase hex digits per byte, each followed by a space
    Hex,
}

impl ViewMode {
    fn as_u8(self) -> u8 {
        match self {
            ViewMode::Ascii => 0,
            ViewMode::Hex => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ViewMode::Hex,
            _ => ViewMode::Ascii,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Ascii => write!(f, "ascii"),
            ViewMode::Hex => write!(f, "hex"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(ViewMode::Ascii),
            "hex" => Ok(ViewMode::Hex),
            other => Err(format!("unknown view mode: {}", other)),
        }
    }
}

/// View mode readable from the display thread while the controller changes it
#[derive(Debug, Default)]
pub(crate) struct AtomicViewMode(AtomicU8);

impl AtomicViewMode {
    pub(crate) fn new(mode: ViewMode) -> Self {
        Self(AtomicU8::new(mode.as_u8()))
    }

    pub(crate) fn load(&self) -> ViewMode {
        ViewMode::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, mode: ViewMode) {
        self.0.store(mode.as_u8(), Ordering::Relaxed);
    }
}

/// Render `data` for display in the given mode
pub fn render(data: &[u8], mode: ViewMode) -> String {
    match mode {
        ViewMode::Ascii => data
            .iter()
            .map(|&b| if is_printable(b) { b as char } else { PLACEHOLDER })
            .collect(),
        ViewMode::Hex => {
            let mut out = String::with_capacity(data.len() * 3);
            for b in data {
                // writing to a String cannot fail
                let _ = write!(out, "{:02X} ", b);
            }
            out
        }
    }
}

fn is_printable(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_replaces_non_printable() {
        assert_eq!(render(b"OK\r\n", ViewMode::Ascii), "OK..");
        assert_eq!(render(&[0x00, b' ', b'~', 0x7F, 0xFF], ViewMode::Ascii), ". ~..");
    }

    #[test]
    fn test_hex_is_uppercase_and_spaced() {
        assert_eq!(render(&[0x55, 0xAA, 0x0d], ViewMode::Hex), "55 AA 0D ");
        assert_eq!(render(&[], ViewMode::Hex), "");
    }

    #[test]
    fn test_hex_covers_every_byte_value() {
        let all: Vec<u8> = (0..=255).collect();
        let text = render(&all, ViewMode::Hex);
        assert_eq!(text.len(), 256 * 3);
        assert!(text.starts_with("00 01 02 "));
        assert!(text.ends_with("FE FF "));
    }

    #[test]
    fn test_view_mode_parse_and_display() {
        assert_eq!("HEX".parse::<ViewMode>().unwrap(), ViewMode::Hex);
        assert_eq!("ascii".parse::<ViewMode>().unwrap(), ViewMode::Ascii);
        assert!("binary".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Hex.to_string(), "hex");
    }

    #[test]
    fn test_atomic_view_mode() {
        let mode = AtomicViewMode::new(ViewMode::Ascii);
        mode.store(ViewMode::Hex);
        assert_eq!(mode.load(), ViewMode::Hex);
    }
}
