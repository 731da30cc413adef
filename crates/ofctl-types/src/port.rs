//! Switch port numbers and reserved pseudo-ports.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A switch port number.
///
/// Values above [`PortNo::MAX`] are reserved pseudo-ports with the meanings
/// OpenFlow 1.3 assigns them (flood, controller, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNo(u32);

impl PortNo {
    /// Highest number a physical or logical port can have.
    pub const MAX: PortNo = PortNo(0xffff_ff00);
    /// Send the packet back out its ingress port.
    pub const IN_PORT: PortNo = PortNo(0xffff_fff8);
    /// Submit the packet to the first flow table.
    pub const TABLE: PortNo = PortNo(0xffff_fff9);
    /// Forward using the switch's non-OpenFlow pipeline.
    pub const NORMAL: PortNo = PortNo(0xffff_fffa);
    /// All ports except the ingress port (and blocked ports).
    pub const FLOOD: PortNo = PortNo(0xffff_fffb);
    /// All ports except the ingress port.
    pub const ALL: PortNo = PortNo(0xffff_fffc);
    /// Punt to the controller.
    pub const CONTROLLER: PortNo = PortNo(0xffff_fffd);
    /// The switch's local networking stack.
    pub const LOCAL: PortNo = PortNo(0xffff_fffe);
    /// Wildcard port, used only in requests that accept one.
    pub const ANY: PortNo = PortNo(0xffff_ffff);

    pub const fn new(raw: u32) -> Self {
        PortNo(raw)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    fn reserved_name(&self) -> Option<&'static str> {
        match *self {
            Self::IN_PORT => Some("IN_PORT"),
            Self::TABLE => Some("TABLE"),
            Self::NORMAL => Some("NORMAL"),
            Self::FLOOD => Some("FLOOD"),
            Self::ALL => Some("ALL"),
            Self::CONTROLLER => Some("CONTROLLER"),
            Self::LOCAL => Some("LOCAL"),
            Self::ANY => Some("ANY"),
            _ => None,
        }
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reserved_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for PortNo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IN_PORT" => Ok(Self::IN_PORT),
            "TABLE" => Ok(Self::TABLE),
            "NORMAL" => Ok(Self::NORMAL),
            "FLOOD" => Ok(Self::FLOOD),
            "ALL" => Ok(Self::ALL),
            "CONTROLLER" => Ok(Self::CONTROLLER),
            "LOCAL" => Ok(Self::LOCAL),
            "ANY" => Ok(Self::ANY),
            _ => s
                .parse::<u32>()
                .map(PortNo)
                .map_err(|_| ParseError::InvalidPortNo(s.to_string())),
        }
    }
}

impl From<u32> for PortNo {
    fn from(raw: u32) -> Self {
        PortNo(raw)
    }
}
