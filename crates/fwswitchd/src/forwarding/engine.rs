//! Learning-switch forwarding decisions.

use super::ethernet::EthernetHeader;
use crate::installer::FlowInstaller;
use crate::learning::LearningTable;
use ofctl_common::{Action, ControlError, ControlResult, PacketIn, PacketOut, SwitchSession};
use ofctl_types::{DatapathId, MacAddress, PortNo};
use std::sync::Arc;
use tracing::debug;

/// Where a packet is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputPort {
    Port(PortNo),
    Broadcast,
}

impl OutputPort {
    /// The port number used on the wire.
    pub fn port_no(&self) -> PortNo {
        match self {
            OutputPort::Port(port) => *port,
            OutputPort::Broadcast => PortNo::FLOOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingDecision {
    pub output: OutputPort,
    /// Only true for concrete ports.
    pub install_flow: bool,
}

/// Result of handling one packet-in.
///
/// The packet is always emitted, so installation and emission fail
/// independently and are reported separately.
#[derive(Debug)]
pub struct PacketInOutcome {
    pub decision: ForwardingDecision,
    /// `None` when no flow was due.
    pub install: Option<ControlResult<()>>,
    pub emit: ControlResult<()>,
}

impl PacketInOutcome {
    /// Returns true if a reactive flow was installed.
    pub fn flow_installed(&self) -> bool {
        matches!(self.install, Some(Ok(())))
    }

    /// Collapses the outcome, preferring the emission error.
    pub fn into_result(self) -> ControlResult<ForwardingDecision> {
        self.emit?;
        if let Some(install) = self.install {
            install?;
        }
        Ok(self.decision)
    }
}

/// Decides output ports from learned state and programs reactive flows.
#[derive(Debug, Clone)]
pub struct ForwardingEngine {
    table: Arc<LearningTable>,
}

impl ForwardingEngine {
    pub fn new(table: Arc<LearningTable>) -> Self {
        Self { table }
    }

    pub fn learning_table(&self) -> &Arc<LearningTable> {
        &self.table
    }

    /// Learns `src` on `in_port`, then picks the output for `dst`.
    ///
    /// A destination learned on the ingress port is treated as unknown:
    /// sending a frame back where it came from never helps.
    pub fn decide(
        &self,
        dpid: DatapathId,
        src: MacAddress,
        dst: MacAddress,
        in_port: PortNo,
    ) -> ForwardingDecision {
        self.table.observe(dpid, src, in_port);

        match self.table.lookup(dpid, dst) {
            Some(port) if port != in_port => ForwardingDecision {
                output: OutputPort::Port(port),
                install_flow: true,
            },
            _ => ForwardingDecision {
                output: OutputPort::Broadcast,
                install_flow: false,
            },
        }
    }

    /// Handles one punted frame: decide, install a flow if due, emit.
    ///
    /// Fails only if the frame has no readable Ethernet header; session
    /// failures are reported in the outcome.
    pub async fn handle_packet_in(
        &self,
        installer: &FlowInstaller,
        session: &dyn SwitchSession,
        packet: PacketIn,
    ) -> ControlResult<PacketInOutcome> {
        let PacketIn {
            dpid,
            in_port,
            payload,
        } = packet;

        let header = EthernetHeader::parse(&payload)
            .map_err(|e| ControlError::malformed_frame(dpid, in_port, e.to_string()))?;

        let decision = self.decide(dpid, header.src, header.dst, in_port);
        debug!(
            %dpid,
            %in_port,
            src = %header.src,
            dst = %header.dst,
            output = %decision.output.port_no(),
            "Packet in"
        );

        let install = if decision.install_flow {
            let entry = installer.forwarding_entry(in_port, header.dst, decision.output.port_no());
            Some(installer.install(session, &entry).await)
        } else {
            None
        };

        let out = PacketOut::new(
            in_port,
            vec![Action::Output(decision.output.port_no())],
            payload,
        );
        let emit = installer.emit(session, &out).await;

        Ok(PacketInOutcome {
            decision,
            install,
            emit,
        })
    }
}
