//! Hex input parsing

use thiserror::Error;

/// Errors parsing user-typed hex
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("no hex digits given")]
    Empty,

    #[error("invalid hex character '{0}'")]
    InvalidChar(char),
}

/// Parse hex such as `55 AA 0x0D 0A` or `55aa0d0a` into bytes.
///
/// Whitespace is ignored, `0x`/`0X` prefixes are skipped, and an odd digit
/// count gets a leading `0` (so `123` is `01 23`).
pub fn parse_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut nibbles = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let is_prefix = c == '0'
            && matches!(chars.get(i + 1), Some('x' | 'X'))
            && chars.get(i + 2).map_or(false, |d| d.is_ascii_hexdigit());
        if is_prefix {
            i += 2;
            continue;
        }
        let nibble = c.to_digit(16).ok_or(HexError::InvalidChar(c))?;
        nibbles.push(nibble as u8);
        i += 1;
    }

    if nibbles.is_empty() {
        return Err(HexError::Empty);
    }
    if nibbles.len() % 2 == 1 {
        nibbles.insert(0, 0);
    }

    Ok(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaced_and_prefixed() {
        assert_eq!(
            parse_hex("55 AA 01 02 0x0D 0A").unwrap(),
            vec![0x55, 0xAA, 0x01, 0x02, 0x0D, 0x0A]
        );
    }

    #[test]
    fn test_contiguous_mixed_case() {
        assert_eq!(parse_hex("deadBEEF").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_odd_digit_count_is_left_padded() {
        assert_eq!(parse_hex("123").unwrap(), vec![0x01, 0x23]);
        assert_eq!(parse_hex("A").unwrap(), vec![0x0A]);
    }

    #[test]
    fn test_zero_without_prefix() {
        assert_eq!(parse_hex("0 0").unwrap(), vec![0x00]);
        assert_eq!(parse_hex("0x").unwrap_err(), HexError::InvalidChar('x'));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_hex("12 zz").unwrap_err(), HexError::InvalidChar('z'));
        assert_eq!(parse_hex("   ").unwrap_err(), HexError::Empty);
    }
}
