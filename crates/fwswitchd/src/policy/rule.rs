//! A single firewall rule.

use super::types::{Permission, PortLocation, Protocol};
use std::fmt;
use std::net::Ipv4Addr;

/// What traffic a rule selects, beyond its protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    /// Traffic from one IPv4 host to another.
    AddressPair {
        source_ip: Ipv4Addr,
        dest_ip: Ipv4Addr,
    },
    /// Traffic to or from one L4 port.
    PortScoped { location: PortLocation, port: u16 },
}

/// An immutable firewall rule.
///
/// The scope always agrees with the protocol: IP rules carry an address
/// pair and every other protocol carries a port scope. The constructors
/// are the only way to build a rule, so the pairing cannot be broken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    permission: Permission,
    protocol: Protocol,
    scope: RuleScope,
}

impl Rule {
    /// Creates an IP rule between two hosts.
    pub fn ip(permission: Permission, source_ip: Ipv4Addr, dest_ip: Ipv4Addr) -> Self {
        Self {
            permission,
            protocol: Protocol::Ip,
            scope: RuleScope::AddressPair { source_ip, dest_ip },
        }
    }

    /// Creates a port-scoped rule. Fails for [`Protocol::Ip`].
    pub fn port(
        permission: Permission,
        protocol: Protocol,
        location: PortLocation,
        port: u16,
    ) -> Result<Self, String> {
        Self::new(permission, protocol, RuleScope::PortScoped { location, port })
    }

    /// Creates a rule from parts, checking that scope and protocol agree.
    pub fn new(permission: Permission, protocol: Protocol, scope: RuleScope) -> Result<Self, String> {
        match (&protocol, &scope) {
            (Protocol::Ip, RuleScope::PortScoped { .. }) => {
                Err("IP rules are scoped by address pair, not by port".to_string())
            }
            (p, RuleScope::AddressPair { .. }) if *p != Protocol::Ip => Err(format!(
                "address-pair scope requires protocol IP, found {}",
                p
            )),
            _ => Ok(Self {
                permission,
                protocol,
                scope,
            }),
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn scope(&self) -> &RuleScope {
        &self.scope
    }
}

impl fmt::Display for Rule {
    /// Renders the rule in rule-file syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            RuleScope::AddressPair { source_ip, dest_ip } => write!(
                f,
                "{} {} ip src {} dst {}",
                self.permission, self.protocol, source_ip, dest_ip
            ),
            RuleScope::PortScoped { location, port } => {
                write!(f, "{} {} {} {}", self.permission, self.protocol, location, port)
            }
        }
    }
}
