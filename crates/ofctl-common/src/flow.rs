//! Wire-neutral flow-table programming model.
//!
//! These types describe what a controller asks a switch to do without
//! committing to any wire encoding. Wildcards are always explicit: a
//! `None` field in [`FlowMatch`] matches every value, and there are no
//! sentinel values standing in for "don't care".

use ofctl_types::{MacAddress, PortNo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Flow table identifier within a switch pipeline.
pub type TableId = u8;

/// Ethertype of IPv4 frames.
pub const ETH_TYPE_IPV4: u16 = 0x0800;
/// IP protocol number of TCP.
pub const IP_PROTO_TCP: u8 = 6;
/// IP protocol number of UDP.
pub const IP_PROTO_UDP: u8 = 17;
/// Priority of the catch-all entry of a table.
pub const PRIORITY_TABLE_MISS: u16 = 0;

/// A predicate over packet header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowMatch {
    pub in_port: Option<PortNo>,
    pub eth_dst: Option<MacAddress>,
    pub eth_type: Option<u16>,
    pub ip_proto: Option<u8>,
    pub ipv4_src: Option<Ipv4Addr>,
    pub ipv4_dst: Option<Ipv4Addr>,
    pub tcp_src: Option<u16>,
    pub tcp_dst: Option<u16>,
    pub udp_src: Option<u16>,
    pub udp_dst: Option<u16>,
}

impl FlowMatch {
    /// Creates a match that selects every packet.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_in_port(mut self, port: PortNo) -> Self {
        self.in_port = Some(port);
        self
    }

    pub fn with_eth_dst(mut self, mac: MacAddress) -> Self {
        self.eth_dst = Some(mac);
        self
    }

    pub fn with_eth_type(mut self, eth_type: u16) -> Self {
        self.eth_type = Some(eth_type);
        self
    }

    pub fn with_ip_proto(mut self, proto: u8) -> Self {
        self.ip_proto = Some(proto);
        self
    }

    pub fn with_ipv4_src(mut self, addr: Ipv4Addr) -> Self {
        self.ipv4_src = Some(addr);
        self
    }

    pub fn with_ipv4_dst(mut self, addr: Ipv4Addr) -> Self {
        self.ipv4_dst = Some(addr);
        self
    }

    pub fn with_tcp_src(mut self, port: u16) -> Self {
        self.tcp_src = Some(port);
        self
    }

    pub fn with_tcp_dst(mut self, port: u16) -> Self {
        self.tcp_dst = Some(port);
        self
    }

    pub fn with_udp_src(mut self, port: u16) -> Self {
        self.udp_src = Some(port);
        self
    }

    pub fn with_udp_dst(mut self, port: u16) -> Self {
        self.udp_dst = Some(port);
        self
    }

    /// Returns true if no field is constrained.
    pub fn is_match_all(&self) -> bool {
        self.field_count() == 0
    }

    /// Returns the number of constrained fields.
    pub fn field_count(&self) -> usize {
        [
            self.in_port.is_some(),
            self.eth_dst.is_some(),
            self.eth_type.is_some(),
            self.ip_proto.is_some(),
            self.ipv4_src.is_some(),
            self.ipv4_dst.is_some(),
            self.tcp_src.is_some(),
            self.tcp_dst.is_some(),
            self.udp_src.is_some(),
            self.udp_dst.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Returns true if any L4 port field is constrained.
    pub fn has_l4_ports(&self) -> bool {
        self.tcp_src.is_some()
            || self.tcp_dst.is_some()
            || self.udp_src.is_some()
            || self.udp_dst.is_some()
    }
}

impl fmt::Display for FlowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match_all() {
            return f.write_str("*");
        }

        let mut fields: Vec<String> = Vec::with_capacity(self.field_count());
        if let Some(v) = self.in_port {
            fields.push(format!("in_port={}", v));
        }
        if let Some(v) = self.eth_dst {
            fields.push(format!("eth_dst={}", v));
        }
        if let Some(v) = self.eth_type {
            fields.push(format!("eth_type=0x{:04x}", v));
        }
        if let Some(v) = self.ip_proto {
            fields.push(format!("ip_proto={}", v));
        }
        if let Some(v) = self.ipv4_src {
            fields.push(format!("ipv4_src={}", v));
        }
        if let Some(v) = self.ipv4_dst {
            fields.push(format!("ipv4_dst={}", v));
        }
        if let Some(v) = self.tcp_src {
            fields.push(format!("tcp_src={}", v));
        }
        if let Some(v) = self.tcp_dst {
            fields.push(format!("tcp_dst={}", v));
        }
        if let Some(v) = self.udp_src {
            fields.push(format!("udp_src={}", v));
        }
        if let Some(v) = self.udp_dst {
            fields.push(format!("udp_dst={}", v));
        }
        f.write_str(&fields.join(","))
    }
}

/// An action applied to a packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Send the packet out a port (possibly a reserved pseudo-port).
    Output(PortNo),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(port) => write!(f, "output:{}", port),
        }
    }
}

/// A flow entry instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// Continue matching in a later table.
    GotoTable(TableId),
    /// Apply actions immediately. An empty list drops the packet.
    ApplyActions(Vec<Action>),
}

impl Instruction {
    /// The instruction that drops matching packets.
    pub fn drop_packet() -> Self {
        Self::ApplyActions(Vec::new())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GotoTable(table) => write!(f, "goto_table:{}", table),
            Self::ApplyActions(actions) if actions.is_empty() => f.write_str("drop"),
            Self::ApplyActions(actions) => {
                let rendered: Vec<String> = actions.iter().map(ToString::to_string).collect();
                write!(f, "apply({})", rendered.join(","))
            }
        }
    }
}

/// A complete flow-table programming request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowEntry {
    pub table_id: TableId,
    pub priority: u16,
    pub flow_match: FlowMatch,
    pub instructions: Vec<Instruction>,
    /// Seconds of inactivity before the switch expires the entry; 0 = never.
    pub idle_timeout: u16,
}

impl FlowEntry {
    pub fn new(
        table_id: TableId,
        priority: u16,
        flow_match: FlowMatch,
        instructions: Vec<Instruction>,
    ) -> Self {
        Self {
            table_id,
            priority,
            flow_match,
            instructions,
            idle_timeout: 0,
        }
    }

    pub fn with_idle_timeout(mut self, secs: u16) -> Self {
        self.idle_timeout = secs;
        self
    }

    /// Returns true if this entry drops what it matches.
    pub fn is_drop(&self) -> bool {
        self.instructions
            .iter()
            .all(|i| matches!(i, Instruction::ApplyActions(actions) if actions.is_empty()))
    }

    /// Returns the table this entry sends matches to, if any.
    pub fn goto_table(&self) -> Option<TableId> {
        self.instructions.iter().find_map(|i| match i {
            Instruction::GotoTable(table) => Some(*table),
            _ => None,
        })
    }
}

impl fmt::Display for FlowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.instructions.iter().map(ToString::to_string).collect();
        write!(
            f,
            "table={} priority={} match={} => {}",
            self.table_id,
            self.priority,
            self.flow_match,
            rendered.join(";")
        )
    }
}

/// A packet the controller asks a switch to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOut {
    pub in_port: PortNo,
    pub actions: Vec<Action>,
    pub payload: Vec<u8>,
}

impl PacketOut {
    pub fn new(in_port: PortNo, actions: Vec<Action>, payload: Vec<u8>) -> Self {
        Self {
            in_port,
            actions,
            payload,
        }
    }

    /// Returns the ports this packet is sent to.
    pub fn output_ports(&self) -> impl Iterator<Item = PortNo> + '_ {
        self.actions.iter().map(|a| match a {
            Action::Output(port) => *port,
        })
    }
}
