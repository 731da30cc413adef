//! The firewall learning switch application.

use crate::config::ControllerConfig;
use crate::controller::ControllerStats;
use crate::forwarding::{ForwardingEngine, OutputPort};
use crate::installer::FlowInstaller;
use crate::learning::LearningTable;
use crate::policy::{Policy, PolicyCompiler};
use async_trait::async_trait;
use ofctl_common::{ControlError, ControlResult, FlowEntry, PacketIn, SwitchApp, SwitchSession};
use ofctl_types::DatapathId;
use std::sync::Arc;
use tracing::{info, warn};

/// Firewall in table 0, MAC learning switch in table 1.
///
/// On connect the compiled policy and the table-miss entries are pushed;
/// on every packet-in the forwarding engine learns, decides and emits.
pub struct FirewallSwitch {
    policy: Policy,
    compiler: PolicyCompiler,
    installer: FlowInstaller,
    engine: ForwardingEngine,
    stats: Arc<ControllerStats>,
}

impl FirewallSwitch {
    pub fn new(policy: Policy, config: &ControllerConfig) -> Self {
        let compiler = config.policy_compiler();
        let installer = FlowInstaller::new(config.pipeline.clone(), config.install.retry_policy());
        let table = Arc::new(LearningTable::with_capacity(
            config.learning.max_entries_per_device,
        ));

        Self {
            policy,
            compiler,
            installer,
            engine: ForwardingEngine::new(table),
            stats: Arc::new(ControllerStats::new()),
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn learning_table(&self) -> &Arc<LearningTable> {
        self.engine.learning_table()
    }

    pub fn stats(&self) -> &Arc<ControllerStats> {
        &self.stats
    }

    /// Every entry pushed on connect, in install order.
    pub fn connect_entries(&self) -> Vec<FlowEntry> {
        let compilation = self.compiler.compile(&self.policy);

        let mut entries: Vec<FlowEntry> = compilation
            .entries
            .iter()
            .map(|compiled| self.installer.policy_entry(compiled))
            .collect();
        entries.push(self.installer.policy_table_miss());
        if self.installer.pipeline().install_forwarding_table_miss {
            entries.push(self.installer.forwarding_table_miss());
        }
        entries
    }
}

#[async_trait]
impl SwitchApp for FirewallSwitch {
    fn name(&self) -> &str {
        "firewall-switch"
    }

    async fn on_device_connected(
        &self,
        dpid: DatapathId,
        session: &dyn SwitchSession,
    ) -> ControlResult<()> {
        self.stats.record_connect();

        let forgotten = self.learning_table().forget_device(dpid);
        if forgotten > 0 {
            info!(%dpid, forgotten, "Reset learned addresses on reconnect");
        }

        let entries = self.connect_entries();
        let total = entries.len();
        let mut failed = 0;
        for entry in &entries {
            if self.installer.install(session, entry).await.is_err() {
                failed += 1;
            }
        }

        self.stats.record_policy_entries((total - failed) as u64);
        self.stats.record_install_failures(failed as u64);

        if failed > 0 {
            return Err(ControlError::policy_push(dpid, failed, total));
        }
        info!(%dpid, entries = total, rules = self.policy.len(), "Pushed firewall policy");
        Ok(())
    }

    async fn on_packet_in(
        &self,
        session: &dyn SwitchSession,
        packet: PacketIn,
    ) -> ControlResult<()> {
        self.stats.record_packet_in();

        let outcome = match self
            .engine
            .handle_packet_in(&self.installer, session, packet)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.record_malformed_frame();
                return Err(e);
            }
        };

        if outcome.decision.output == OutputPort::Broadcast {
            self.stats.record_broadcast();
        }
        match &outcome.install {
            Some(Ok(())) => self.stats.record_flow_installed(),
            Some(Err(_)) => self.stats.record_install_failures(1),
            None => {}
        }
        if outcome.emit.is_err() {
            self.stats.record_emit_failure();
        }

        outcome.into_result().map(|_| ())
    }

    async fn on_device_disconnected(&self, dpid: DatapathId) -> ControlResult<()> {
        self.stats.record_disconnect();
        let forgotten = self.learning_table().forget_device(dpid);
        warn!(%dpid, forgotten, "Device disconnected");
        Ok(())
    }
}
