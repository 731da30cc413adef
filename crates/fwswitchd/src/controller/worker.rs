//! Per-device event worker.

use ofctl_common::{ControlError, SwitchApp, SwitchEvent, SwitchSession};
use ofctl_types::DatapathId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Processes one device's events strictly in arrival order.
///
/// A worker serves one connection of a device. The controller closes its
/// queue on disconnect, and a reconnect starts a new worker.
pub(crate) struct DeviceWorker {
    dpid: DatapathId,
    app: Arc<dyn SwitchApp>,
    session: Option<Arc<dyn SwitchSession>>,
}

impl DeviceWorker {
    pub(crate) fn new(dpid: DatapathId, app: Arc<dyn SwitchApp>) -> Self {
        Self {
            dpid,
            app,
            session: None,
        }
    }

    /// Handles events until the queue is closed and empty.
    ///
    /// With a `predecessor`, nothing is handled until that worker (the
    /// device's previous one) has finished.
    pub(crate) async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SwitchEvent>,
        predecessor: Option<JoinHandle<()>>,
    ) {
        if let Some(previous) = predecessor {
            if let Err(e) = previous.await {
                warn!(dpid = %self.dpid, error = %e, "Previous device worker ended abnormally");
            }
        }
        debug!(dpid = %self.dpid, app = self.app.name(), "Device worker started");
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!(dpid = %self.dpid, "Device worker stopped");
    }

    async fn handle(&mut self, event: SwitchEvent) {
        let result = match event {
            SwitchEvent::DeviceConnected { dpid, session } => {
                self.session = Some(Arc::clone(&session));
                self.app.on_device_connected(dpid, session.as_ref()).await
            }
            SwitchEvent::PacketObserved(packet) => match &self.session {
                Some(session) => self.app.on_packet_in(session.as_ref(), packet).await,
                None => {
                    warn!(
                        dpid = %self.dpid,
                        in_port = %packet.in_port,
                        "Packet-in from a device without a session, dropped"
                    );
                    Ok(())
                }
            },
            SwitchEvent::DeviceDisconnected { dpid } => {
                self.session = None;
                self.app.on_device_disconnected(dpid).await
            }
        };

        match result {
            Ok(()) => {}
            Err(e @ ControlError::MalformedFrame { .. }) => {
                warn!(dpid = %self.dpid, error = %e, "Ignoring malformed frame");
            }
            Err(e) => {
                error!(dpid = %self.dpid, error = %e, "Event handling failed");
            }
        }
    }
}
