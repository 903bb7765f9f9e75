//! Hex rendering of byte runs for diagnostics.

use std::fmt::Write;

/// Formats up to `max` bytes as space-separated lowercase hex.
///
/// When the input is longer than `max`, a `... (N more)` suffix reports how
/// many bytes were left out.
///
/// # Example
///
/// ```
/// use bsonkit_buffers::print_octets;
///
/// assert_eq!(print_octets(&[0x05, 0x00, 0x00, 0x00, 0x00], 16), "05 00 00 00 00");
/// assert_eq!(print_octets(&[1, 2, 3], 2), "01 02... (1 more)");
/// assert_eq!(print_octets(&[], 16), "");
/// ```
pub fn print_octets(octets: &[u8], max: usize) -> String {
    let mut result = String::with_capacity(octets.len().min(max) * 3);
    for (i, byte) in octets.iter().take(max).enumerate() {
        if i > 0 {
            result.push(' ');
        }
        let _ = write!(result, "{byte:02x}");
    }
    if octets.len() > max {
        let _ = write!(result, "... ({} more)", octets.len() - max);
    }
    result
}

/// Formats a byte slice as hex with a default limit of 16 bytes.
pub fn print_octets_default(octets: &[u8]) -> String {
    print_octets(octets, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_octets_single() {
        assert_eq!(print_octets(&[0x0b], 16), "0b");
    }

    #[test]
    fn test_print_octets_truncated() {
        let data: Vec<u8> = (0..20).collect();
        let result = print_octets(&data, 10);
        assert!(result.starts_with("00 01 02"));
        assert!(result.ends_with("09... (10 more)"));
    }

    #[test]
    fn test_print_octets_default_limit() {
        let data = [0xffu8; 17];
        assert!(print_octets_default(&data).ends_with("... (1 more)"));
    }
}
