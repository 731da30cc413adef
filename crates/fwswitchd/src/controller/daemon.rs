//! Controller implementation.
//!
//! The Controller is the central dispatcher for switch events. It manages:
//! - One worker task per connected device, created on the device's first event
//! - In-order delivery of each device's events to its worker
//! - Retiring a worker once the device disconnects
//! - Shutdown, letting workers drain what was already queued

use super::worker::DeviceWorker;
use ofctl_common::{SwitchApp, SwitchEvent};
use ofctl_types::DatapathId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct DeviceHandle {
    events: mpsc::UnboundedSender<SwitchEvent>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Devices {
    active: HashMap<DatapathId, DeviceHandle>,
    /// Workers of disconnected devices, still draining their queues.
    retiring: HashMap<DatapathId, JoinHandle<()>>,
}

impl Devices {
    /// Closes the device's queue. Its worker exits once the queue is empty.
    fn retire(&mut self, dpid: DatapathId) {
        self.retiring.retain(|_, task| !task.is_finished());
        if let Some(handle) = self.active.remove(&dpid) {
            self.retiring.insert(dpid, handle.task);
        }
    }
}

/// Serializes events per device and runs devices concurrently.
///
/// Each device gets its own unbounded queue, so a device whose session is
/// slow never holds up dispatch to the others. A disconnect closes the
/// queue; a later reconnect gets a new worker that starts only after the
/// old one has finished.
pub struct Controller {
    app: Arc<dyn SwitchApp>,
    devices: Mutex<Devices>,
}

impl Controller {
    /// Creates a controller driving `app`.
    pub fn new(app: Arc<dyn SwitchApp>) -> Self {
        info!(app = app.name(), "Creating controller");
        Self {
            app,
            devices: Mutex::new(Devices::default()),
        }
    }

    /// Queues `event` on its device's worker, starting the worker if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: SwitchEvent) {
        let dpid = event.dpid();
        let disconnect = matches!(event, SwitchEvent::DeviceDisconnected { .. });
        let mut devices = self.devices.lock();

        let sent = match devices.active.get(&dpid) {
            Some(handle) => handle.events.send(event).map_err(|mpsc::error::SendError(event)| {
                // The worker is gone (it panicked); replace it.
                warn!(%dpid, "Device worker exited unexpectedly, restarting");
                event
            }),
            None => Err(event),
        };
        let event = match sent {
            Ok(()) => {
                if disconnect {
                    devices.retire(dpid);
                }
                return;
            }
            Err(event) => event,
        };

        debug!(%dpid, kind = event.kind(), "Starting device worker");
        let (tx, rx) = mpsc::unbounded_channel();
        // A fresh receiver cannot be closed.
        let _ = tx.send(event);
        let predecessor = devices.retiring.remove(&dpid);
        let worker = DeviceWorker::new(dpid, Arc::clone(&self.app));
        let task = tokio::spawn(worker.run(rx, predecessor));

        if disconnect {
            drop(tx);
            devices.active.remove(&dpid);
            devices.retiring.insert(dpid, task);
        } else {
            devices.active.insert(dpid, DeviceHandle { events: tx, task });
        }
    }

    /// Dispatches every event from `events` until the sender side closes.
    pub async fn run(&self, mut events: mpsc::Receiver<SwitchEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        debug!("Event source closed");
    }

    /// Number of devices with a live worker, i.e. connected and not yet
    /// disconnected.
    pub fn device_count(&self) -> usize {
        self.devices.lock().active.len()
    }

    /// Stops accepting events and waits for every worker to drain its queue.
    pub async fn shutdown(&self) {
        let (active, retiring) = {
            let mut devices = self.devices.lock();
            (
                devices.active.drain().collect::<Vec<_>>(),
                devices.retiring.drain().collect::<Vec<_>>(),
            )
        };
        info!(devices = active.len(), "Shutting down controller");

        let tasks = active
            .into_iter()
            .map(|(dpid, handle)| {
                drop(handle.events);
                (dpid, handle.task)
            })
            .chain(retiring);

        for (dpid, task) in tasks.collect::<Vec<_>>() {
            if let Err(e) = task.await {
                warn!(%dpid, error = %e, "Device worker ended abnormally");
            }
        }
    }
}
