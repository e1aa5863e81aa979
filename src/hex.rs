use std::fmt;

/// Formats a byte slice as contiguous lowercase hex, for trace logs of raw packets.
pub(crate) struct Hex<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Hex<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Parses a hex dump (as printed by [`Hex`]) back into bytes. Whitespace is ignored, so captured
/// packets can be split across lines.
#[cfg(test)]
pub(crate) fn parse(s: &str) -> Vec<u8> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(digits.is_ascii() && digits.len() % 2 == 0);

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).unwrap())
        .collect()
}
