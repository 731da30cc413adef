//! Base trait for controller applications.

use crate::error::ControlResult;
use crate::event::PacketIn;
use crate::session::SwitchSession;
use async_trait::async_trait;
use ofctl_types::DatapathId;

/// Base trait for applications driven by switch events.
///
/// The controller delivers events for one switch strictly in arrival
/// order, never running two handlers for the same switch at once. Handlers
/// for different switches may run concurrently, so implementations must
/// keep any shared state safe for concurrent access.
///
/// # Lifecycle
///
/// 1. `on_device_connected()` once per session establishment
/// 2. `on_packet_in()` for every frame the switch punts
/// 3. `on_device_disconnected()` when the session ends
///
/// A switch may reconnect, in which case the cycle starts over.
#[async_trait]
pub trait SwitchApp: Send + Sync {
    /// Returns the name of this application (for logging and debugging).
    fn name(&self) -> &str;

    /// Called when a switch completes its handshake.
    async fn on_device_connected(
        &self,
        dpid: DatapathId,
        session: &dyn SwitchSession,
    ) -> ControlResult<()>;

    /// Called for every frame a switch punts to the controller.
    async fn on_packet_in(&self, session: &dyn SwitchSession, packet: PacketIn)
        -> ControlResult<()>;

    /// Called when a switch session ends.
    async fn on_device_disconnected(&self, _dpid: DatapathId) -> ControlResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::flow::{FlowEntry, PacketOut};
    use ofctl_types::PortNo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullSession;

    #[async_trait]
    impl SwitchSession for NullSession {
        fn dpid(&self) -> DatapathId {
            DatapathId::new(1)
        }

        async fn install_table_entry(&self, _entry: &FlowEntry) -> Result<(), SessionError> {
            Ok(())
        }

        async fn emit_packet(&self, _packet: &PacketOut) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestApp {
        connects: AtomicUsize,
        packets: AtomicUsize,
    }

    #[async_trait]
    impl SwitchApp for TestApp {
        fn name(&self) -> &str {
            "test"
        }

        async fn on_device_connected(
            &self,
            _dpid: DatapathId,
            _session: &dyn SwitchSession,
        ) -> ControlResult<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_packet_in(
            &self,
            _session: &dyn SwitchSession,
            _packet: PacketIn,
        ) -> ControlResult<()> {
            self.packets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_switch_app_trait() {
        let app = TestApp::default();
        let session = NullSession;
        let dpid = session.dpid();

        assert_eq!(app.name(), "test");
        app.on_device_connected(dpid, &session).await.unwrap();
        app.on_packet_in(&session, PacketIn::new(dpid, PortNo::new(1), vec![]))
            .await
            .unwrap();
        app.on_device_disconnected(dpid).await.unwrap();

        assert_eq!(app.connects.load(Ordering::SeqCst), 1);
        assert_eq!(app.packets.load(Ordering::SeqCst), 1);
    }
}
