//! Message types and their framing category
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{constants::Framing, prelude::Constellation};

/// Framing category of a [MessageType]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Category {
    /// Placeholder: not transmitted
    Disabled,
    /// Legacy message: the complete epoch fits in a single message
    Legacy,
    /// Multiple Signal Message (MSM): paged per constellation
    Msm {
        /// Targeted constellation
        constellation: Constellation,
        /// MSM level (1..=7)
        level: u8,
    },
    /// Any other type, not supported by the framing core
    Unsupported,
}

impl Category {
    /// Returns true for message categories that take part in an epoch
    pub fn is_framed(&self) -> bool {
        matches!(self, Self::Legacy | Self::Msm { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageTypeError {
    #[error("invalid message type \"{0}\"")]
    Invalid(String),
}

/// Message type number, as configured by the user.
/// Zero is a disabled placeholder.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MessageType(pub u16);

impl MessageType {
    pub const fn new(number: u16) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u16 {
        self.0
    }

    /// Determines the framing [Category] of this type
    pub fn category(&self) -> Category {
        let number = self.0;
        if number == 0 {
            return Category::Disabled;
        }
        if number <= Framing::LEGACY_MAX {
            return Category::Legacy;
        }
        if !(Framing::MSM_FIRST..=Framing::MSM_LAST).contains(&number) {
            return Category::Unsupported;
        }

        let level = (number % 10) as u8;
        if !(1..=7).contains(&level) {
            return Category::Unsupported;
        }

        let constellation = match number / 10 {
            107 => Constellation::GPS,
            108 => Constellation::Glonass,
            109 => Constellation::Galileo,
            110 => Constellation::SBAS,
            111 => Constellation::QZSS,
            112 => Constellation::BeiDou,
            113 => Constellation::IRNSS,
            _ => return Category::Unsupported,
        };

        Category::Msm {
            constellation,
            level,
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = MessageTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .map(Self)
            .map_err(|_| MessageTypeError::Invalid(s.to_string()))
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl From<u16> for MessageType {
    fn from(number: u16) -> Self {
        Self(number)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn categories() {
        assert_eq!(MessageType(0).category(), Category::Disabled);
        assert_eq!(MessageType(1006).category(), Category::Legacy);
        assert_eq!(MessageType(1012).category(), Category::Legacy);
        assert_eq!(MessageType(1033).category(), Category::Unsupported);
        assert_eq!(MessageType(1080).category(), Category::Unsupported);
        assert_eq!(MessageType(1230).category(), Category::Unsupported);
        assert_eq!(
            MessageType(1077).category(),
            Category::Msm {
                constellation: Constellation::GPS,
                level: 7
            }
        );
        assert_eq!(
            MessageType(1124).category(),
            Category::Msm {
                constellation: Constellation::BeiDou,
                level: 4
            }
        );
        assert_eq!(
            MessageType(1107).category(),
            Category::Msm {
                constellation: Constellation::SBAS,
                level: 7
            }
        );
        assert!(MessageType(1097).category().is_framed());
        assert!(!MessageType(1033).category().is_framed());
    }

    #[test]
    fn parsing() {
        assert_eq!(MessageType::from_str(" 1087").unwrap(), MessageType(1087));
        assert!(MessageType::from_str("msm7").is_err());
        assert_eq!(MessageType(1006).to_string(), "1006");
    }
}
