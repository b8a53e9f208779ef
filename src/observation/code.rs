//! Signal (tracking) codes
use std::collections::HashMap;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::Framing;

/// Known signal codes, index is the [Code] value.
/// Index 0 is reserved for "no code".
const CODES: [&str; Framing::MAX_CODE + 1] = [
    "", "1C", "1P", "1W", "1Y", "1M", "1N", "1S", "1L", "1E", // 0-9
    "1A", "1B", "1X", "1Z", "2C", "2D", "2S", "2L", "2X", "2P", // 10-19
    "2W", "2Y", "2M", "2N", "5I", "5Q", "5X", "7I", "7Q", "7X", // 20-29
    "6A", "6B", "6C", "6X", "6Z", "6S", "6L", "8I", "8Q", "8X", // 30-39
    "2I", "2Q", "6I", "6Q", "3I", "3Q", "3X", "1I", "1Q", "5A", // 40-49
    "5B", "5C", "9A", "9B", "9C", "9X", "1D", "5D", "5P", "5Z", // 50-59
    "6E", "7D", "7P", "7Z", "8D", "8P", "4A", "4B", "4X", "6D", // 60-69
    "6P", // 70
];

lazy_static! {
    static ref CODES_LUT: HashMap<&'static str, u8> = CODES
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, code)| (*code, i as u8))
        .collect();
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodeError {
    #[error("unknown signal code \"{0}\"")]
    Unknown(String),
}

/// [Code] identifies one tracked signal (frequency band + tracking mode),
/// for example "1C" for L1 C/A. Absent codes are represented by [Code::NONE].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Code(u8);

impl Code {
    /// Absent code, never counted.
    pub const NONE: Self = Self(0);

    /// Builds a [Code] from its index, returns None for out of range values.
    pub fn from_index(index: u8) -> Option<Self> {
        if (index as usize) <= Framing::MAX_CODE {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Index of this code in the library table (1..=MAX_CODE).
    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Two character RINEX representation
    pub fn as_str(&self) -> &'static str {
        CODES[self.0 as usize]
    }

    /// Frequency band number (1, 2, 5, 6, 7, 8, ...)
    pub fn band(&self) -> Option<u8> {
        self.as_str()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8)
    }
}

impl std::str::FromStr for Code {
    type Err = CodeError;
    /// Parses either the two character code ("1C")
    /// or a complete RINEX observable ("C1C", "L5Q", ..).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let code = if s.len() == 3 { s.get(1..).unwrap_or(s) } else { s };
        CODES_LUT
            .get(code)
            .map(|index| Self(*index))
            .ok_or_else(|| CodeError::Unknown(s.to_string()))
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn code_parsing() {
        assert_eq!(Code::from_str("1C").unwrap().index(), 1);
        assert_eq!(Code::from_str("C1C").unwrap().index(), 1);
        assert_eq!(Code::from_str("L5Q").unwrap(), Code::from_str("5Q").unwrap());
        assert_eq!(Code::from_str("4X").unwrap().index(), 68);
        assert!(Code::from_str("0Z").is_err());
        assert!(Code::from_str("").is_err());
    }

    #[test]
    fn code_band() {
        assert_eq!(Code::from_str("2W").unwrap().band(), Some(2));
        assert_eq!(Code::from_str("7Q").unwrap().band(), Some(7));
        assert_eq!(Code::NONE.band(), None);
        assert!(Code::from_index(71).is_none());
        assert_eq!(Code::from_index(8).unwrap().to_string(), "1L");
    }
}
