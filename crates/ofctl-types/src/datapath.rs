//! Datapath identifier of a managed switch.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 64-bit datapath id, the identity a switch reports at handshake.
///
/// Displayed as 16 zero-padded hex digits, the form controllers
/// conventionally print in logs.
///
/// # Examples
///
/// ```
/// use ofctl_types::DatapathId;
///
/// let dpid = DatapathId::new(0x1a);
/// assert_eq!(dpid.to_string(), "000000000000001a");
///
/// assert_eq!("0x1a".parse::<DatapathId>().unwrap(), dpid);
/// assert_eq!("26".parse::<DatapathId>().unwrap(), dpid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatapathId(u64);

impl DatapathId {
    pub const fn new(raw: u64) -> Self {
        DatapathId(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for DatapathId {
    type Err = ParseError;

    /// Accepts `0x`-prefixed hex, the 16-digit display form, or decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidDatapathId(s.to_string());

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16).map(DatapathId).map_err(|_| invalid());
        }
        if s.len() == 16 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return u64::from_str_radix(s, 16).map(DatapathId).map_err(|_| invalid());
        }
        s.parse::<u64>().map(DatapathId).map_err(|_| invalid())
    }
}

impl From<u64> for DatapathId {
    fn from(raw: u64) -> Self {
        DatapathId(raw)
    }
}

impl From<DatapathId> for u64 {
    fn from(dpid: DatapathId) -> u64 {
        dpid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_is_padded_hex() {
        assert_eq!(DatapathId::new(1).to_string(), "0000000000000001");
        assert_eq!(DatapathId::new(u64::MAX).to_string(), "ffffffffffffffff");
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("0x10".parse::<DatapathId>().unwrap(), DatapathId::new(16));
        assert_eq!("10".parse::<DatapathId>().unwrap(), DatapathId::new(10));
        assert_eq!(
            "000000000000000a".parse::<DatapathId>().unwrap(),
            DatapathId::new(10)
        );
    }

    #[test]
    fn test_display_round_trips() {
        let dpid = DatapathId::new(0xdead_beef);
        assert_eq!(dpid.to_string().parse::<DatapathId>().unwrap(), dpid);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<DatapathId>().is_err());
        assert!("0x".parse::<DatapathId>().is_err());
        assert!("switch-1".parse::<DatapathId>().is_err());
        assert!("-1".parse::<DatapathId>().is_err());
    }
}
