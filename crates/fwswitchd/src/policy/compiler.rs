//! Policy compilation into classifier entries.
//!
//! Each rule becomes one entry for the policy table. Permitted traffic
//! continues to the forwarding table, denied traffic is dropped. The
//! compiler is pure: the same policy always yields the same entries in the
//! same order.

use super::loader::Policy;
use super::rule::{Rule, RuleScope};
use super::types::{Permission, PortLocation, Protocol};
use ofctl_common::{FlowMatch, ETH_TYPE_IPV4, IP_PROTO_TCP, IP_PROTO_UDP};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Default priority of policy entries, above the table-miss priority.
pub const DEFAULT_POLICY_PRIORITY: u16 = 2;

/// What the policy table does with matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    ForwardToNextTable,
    Drop,
}

impl From<Permission> for Outcome {
    fn from(permission: Permission) -> Self {
        match permission {
            Permission::Permit => Outcome::ForwardToNextTable,
            Permission::Deny => Outcome::Drop,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardToNextTable => write!(f, "FORWARD_TO_NEXT_TABLE"),
            Self::Drop => write!(f, "DROP"),
        }
    }
}

/// One classifier entry derived from one rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledEntry {
    pub flow_match: FlowMatch,
    pub outcome: Outcome,
    pub priority: u16,
    /// Position of the source rule in the policy.
    pub rule_index: usize,
}

/// A rule the compiler skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileWarning {
    #[error("rule {rule_index}: no match template for protocol {protocol}, rule skipped")]
    UnsupportedProtocol { rule_index: usize, protocol: String },
}

/// Result of compiling a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    pub entries: Vec<CompiledEntry>,
    pub warnings: Vec<CompileWarning>,
}

/// Compiles policies into classifier entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCompiler {
    priority: u16,
    ordered_priorities: bool,
}

impl Default for PolicyCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_PRIORITY)
    }
}

impl PolicyCompiler {
    /// Creates a compiler that puts every entry at `priority`.
    pub fn new(priority: u16) -> Self {
        Self {
            priority,
            ordered_priorities: false,
        }
    }

    /// Gives earlier rules strictly higher priorities.
    ///
    /// The last compiled rule sits at the base priority and each earlier
    /// one a step above it, so precedence no longer depends on how a switch
    /// breaks ties between equal-priority entries.
    pub fn with_ordered_priorities(mut self, ordered: bool) -> Self {
        self.ordered_priorities = ordered;
        self
    }

    /// Highest priority `compile` assigns to a policy of `rule_count` rules.
    ///
    /// Returns `None` when ordered priorities for that many rules would run
    /// past `u16::MAX`; such a policy must be rejected before compiling.
    pub fn top_priority(&self, rule_count: usize) -> Option<u16> {
        if !self.ordered_priorities || rule_count == 0 {
            return Some(self.priority);
        }
        u16::try_from(rule_count - 1)
            .ok()
            .and_then(|steps| self.priority.checked_add(steps))
    }

    pub fn compile(&self, policy: &Policy) -> Compilation {
        let mut compilation = Compilation::default();

        for (rule_index, rule) in policy.iter().enumerate() {
            match match_for(rule) {
                Some(flow_match) => compilation.entries.push(CompiledEntry {
                    flow_match,
                    outcome: rule.permission().into(),
                    priority: self.priority,
                    rule_index,
                }),
                None => {
                    let warning = CompileWarning::UnsupportedProtocol {
                        rule_index,
                        protocol: rule.protocol().to_string(),
                    };
                    warn!(%rule, "{}", warning);
                    compilation.warnings.push(warning);
                }
            }
        }

        if self.ordered_priorities {
            let count = compilation.entries.len();
            for (position, entry) in compilation.entries.iter_mut().enumerate() {
                let steps = u16::try_from(count - 1 - position).unwrap_or(u16::MAX);
                entry.priority = self.priority.saturating_add(steps);
            }
        }

        compilation
    }
}

fn match_for(rule: &Rule) -> Option<FlowMatch> {
    let ipv4 = FlowMatch::any().with_eth_type(ETH_TYPE_IPV4);

    match (rule.protocol(), *rule.scope()) {
        (Protocol::Ip, RuleScope::AddressPair { source_ip, dest_ip }) => {
            Some(ipv4.with_ipv4_src(source_ip).with_ipv4_dst(dest_ip))
        }
        (Protocol::Tcp, RuleScope::PortScoped { location, port }) => {
            let tcp = ipv4.with_ip_proto(IP_PROTO_TCP);
            Some(match location {
                PortLocation::Source => tcp.with_tcp_src(port),
                PortLocation::Destination => tcp.with_tcp_dst(port),
            })
        }
        (Protocol::Udp, RuleScope::PortScoped { location, port }) => {
            let udp = ipv4.with_ip_proto(IP_PROTO_UDP);
            Some(match location {
                PortLocation::Source => udp.with_udp_src(port),
                PortLocation::Destination => udp.with_udp_dst(port),
            })
        }
        _ => None,
    }
}
