//! Turns compiler and forwarding decisions into switch programming calls.

use crate::config::PipelineConfig;
use crate::policy::{CompiledEntry, Outcome};
use ofctl_common::{
    Action, ControlError, ControlResult, FlowEntry, FlowMatch, Instruction, PacketOut,
    RetryPolicy, SwitchSession, PRIORITY_TABLE_MISS,
};
use ofctl_types::{MacAddress, PortNo};
use tracing::{debug, error, warn};

/// Builds flow entries for the two-table pipeline and pushes them to
/// switches, retrying transient session failures.
#[derive(Debug, Clone)]
pub struct FlowInstaller {
    pipeline: PipelineConfig,
    retry: RetryPolicy,
}

impl FlowInstaller {
    pub fn new(pipeline: PipelineConfig, retry: RetryPolicy) -> Self {
        Self { pipeline, retry }
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Policy-table entry for one compiled rule.
    pub fn policy_entry(&self, compiled: &CompiledEntry) -> FlowEntry {
        let instruction = match compiled.outcome {
            Outcome::ForwardToNextTable => Instruction::GotoTable(self.pipeline.forwarding_table),
            Outcome::Drop => Instruction::drop_packet(),
        };
        FlowEntry::new(
            self.pipeline.policy_table,
            compiled.priority,
            compiled.flow_match.clone(),
            vec![instruction],
        )
    }

    /// Catch-all of the policy table: unmatched traffic goes on to forwarding.
    pub fn policy_table_miss(&self) -> FlowEntry {
        FlowEntry::new(
            self.pipeline.policy_table,
            PRIORITY_TABLE_MISS,
            FlowMatch::any(),
            vec![Instruction::GotoTable(self.pipeline.forwarding_table)],
        )
    }

    /// Catch-all of the forwarding table: unknown traffic is punted to the controller.
    pub fn forwarding_table_miss(&self) -> FlowEntry {
        FlowEntry::new(
            self.pipeline.forwarding_table,
            PRIORITY_TABLE_MISS,
            FlowMatch::any(),
            vec![Instruction::ApplyActions(vec![Action::Output(
                PortNo::CONTROLLER,
            )])],
        )
    }

    /// Reactive flow sending `eth_dst` traffic arriving on `in_port` to `out_port`.
    pub fn forwarding_entry(&self, in_port: PortNo, eth_dst: MacAddress, out_port: PortNo) -> FlowEntry {
        FlowEntry::new(
            self.pipeline.forwarding_table,
            self.pipeline.forwarding_priority,
            FlowMatch::any().with_in_port(in_port).with_eth_dst(eth_dst),
            vec![Instruction::ApplyActions(vec![Action::Output(out_port)])],
        )
        .with_idle_timeout(self.pipeline.flow_idle_timeout_secs)
    }

    /// Installs `entry`, retrying transient failures.
    pub async fn install(&self, session: &dyn SwitchSession, entry: &FlowEntry) -> ControlResult<()> {
        let dpid = session.dpid();

        match self.retry.run(|| session.install_table_entry(entry)).await {
            Ok(()) => {
                debug!(%dpid, table_id = entry.table_id, flow = %entry, "Installed flow entry");
                Ok(())
            }
            Err((source, attempts)) => {
                let err = ControlError::installation(
                    dpid,
                    format!("install entry in table {}", entry.table_id),
                    attempts,
                    source,
                );
                error!(%dpid, table_id = entry.table_id, flow = %entry, error = %err, "Flow installation failed");
                Err(err)
            }
        }
    }

    /// Sends a packet out of the switch. Not retried.
    pub async fn emit(&self, session: &dyn SwitchSession, packet: &PacketOut) -> ControlResult<()> {
        let dpid = session.dpid();
        session.emit_packet(packet).await.map_err(|source| {
            let err = ControlError::emission(dpid, source);
            warn!(%dpid, in_port = %packet.in_port, error = %err, "Packet emission failed");
            err
        })
    }
}
