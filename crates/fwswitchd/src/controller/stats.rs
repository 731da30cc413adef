//! Controller counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals across all devices.
#[derive(Debug, Default)]
pub struct ControllerStats {
    devices_connected: AtomicU64,
    devices_disconnected: AtomicU64,
    packet_ins: AtomicU64,
    malformed_frames: AtomicU64,
    broadcasts: AtomicU64,
    policy_entries_installed: AtomicU64,
    flows_installed: AtomicU64,
    install_failures: AtomicU64,
    emit_failures: AtomicU64,
}

/// Point-in-time copy of [`ControllerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub devices_connected: u64,
    pub devices_disconnected: u64,
    pub packet_ins: u64,
    pub malformed_frames: u64,
    pub broadcasts: u64,
    pub policy_entries_installed: u64,
    pub flows_installed: u64,
    pub install_failures: u64,
    pub emit_failures: u64,
}

impl ControllerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.devices_connected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.devices_disconnected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_packet_in(&self) {
        self.packet_ins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_policy_entries(&self, count: u64) {
        self.policy_entries_installed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_flow_installed(&self) {
        self.flows_installed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_install_failures(&self, count: u64) {
        self.install_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_emit_failure(&self) {
        self.emit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            devices_connected: self.devices_connected.load(Ordering::Relaxed),
            devices_disconnected: self.devices_disconnected.load(Ordering::Relaxed),
            packet_ins: self.packet_ins.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            policy_entries_installed: self.policy_entries_installed.load(Ordering::Relaxed),
            flows_installed: self.flows_installed.load(Ordering::Relaxed),
            install_failures: self.install_failures.load(Ordering::Relaxed),
            emit_failures: self.emit_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = ControllerStats::new();
        stats.record_connect();
        stats.record_packet_in();
        stats.record_packet_in();
        stats.record_policy_entries(3);
        stats.record_install_failures(2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.devices_connected, 1);
        assert_eq!(snapshot.packet_ins, 2);
        assert_eq!(snapshot.policy_entries_installed, 3);
        assert_eq!(snapshot.install_failures, 2);
        assert_eq!(snapshot.flows_installed, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(ControllerStats::new().snapshot()).unwrap();
        assert_eq!(json["packet_ins"], 0);
        assert_eq!(json["broadcasts"], 0);
    }
}
