//! Integer literal parsing for option arguments.

/// Parses a base-prefixed unsigned literal: `0x`/`0X` hex, leading `0` octal, otherwise decimal.
///
/// The whole string must be consumed; signs, whitespace, and empty digit runs are rejected.
pub fn parse_unsigned(text: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
