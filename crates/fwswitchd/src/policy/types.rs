//! Firewall policy enums.

use std::fmt;
use std::str::FromStr;

/// What a matching rule does with traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Let the packet continue to forwarding.
    Permit,
    /// Drop the packet.
    Deny,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permit => write!(f, "permit"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permit" => Ok(Self::Permit),
            "deny" => Ok(Self::Deny),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

/// Protocol a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Any IPv4 traffic between two addresses.
    Ip,
    Tcp,
    Udp,
    /// A protocol the compiler has no match template for.
    ///
    /// Never produced by the rule-file parser; only reachable through
    /// programmatically built policies.
    Other(String),
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip => write!(f, "IP"),
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IP" => Ok(Self::Ip),
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

/// Which L4 endpoint a port-scoped rule constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortLocation {
    Source,
    Destination,
}

impl fmt::Display for PortLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "src"),
            Self::Destination => write!(f, "dst"),
        }
    }
}

impl FromStr for PortLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "src" => Ok(Self::Source),
            "dst" => Ok(Self::Destination),
            _ => Err(format!("Unknown port location: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_parse() {
        assert_eq!("permit".parse::<Permission>().unwrap(), Permission::Permit);
        assert_eq!("DENY".parse::<Permission>().unwrap(), Permission::Deny);
        assert!("allow".parse::<Permission>().is_err());
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("IP".parse::<Protocol>().unwrap(), Protocol::Ip);
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("Udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("ICMP".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(PortLocation::Source.to_string(), "src");
        assert_eq!(PortLocation::Destination.to_string(), "dst");
        assert_eq!("DST".parse::<PortLocation>().unwrap(), PortLocation::Destination);
    }
}
