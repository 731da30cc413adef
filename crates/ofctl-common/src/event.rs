//! Notifications delivered by managed switches.

use crate::session::SwitchSession;
use ofctl_types::{DatapathId, PortNo};
use std::fmt;
use std::sync::Arc;

/// A frame a switch punted to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: DatapathId,
    pub in_port: PortNo,
    /// The full Ethernet frame as received.
    pub payload: Vec<u8>,
}

impl PacketIn {
    pub fn new(dpid: DatapathId, in_port: PortNo, payload: Vec<u8>) -> Self {
        Self {
            dpid,
            in_port,
            payload,
        }
    }
}

/// An event concerning one switch.
#[derive(Clone)]
pub enum SwitchEvent {
    /// A switch finished its handshake
    DeviceConnected {
        dpid: DatapathId,
        session: Arc<dyn SwitchSession>,
    },
    /// A switch punted a frame
    PacketObserved(PacketIn),
    /// A switch session ended
    DeviceDisconnected { dpid: DatapathId },
}

impl SwitchEvent {
    /// Returns the switch this event concerns.
    pub fn dpid(&self) -> DatapathId {
        match self {
            SwitchEvent::DeviceConnected { dpid, .. } => *dpid,
            SwitchEvent::PacketObserved(packet) => packet.dpid,
            SwitchEvent::DeviceDisconnected { dpid } => *dpid,
        }
    }

    /// Short name of the event kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchEvent::DeviceConnected { .. } => "connected",
            SwitchEvent::PacketObserved(_) => "packet_in",
            SwitchEvent::DeviceDisconnected { .. } => "disconnected",
        }
    }
}

impl fmt::Debug for SwitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchEvent::DeviceConnected { dpid, .. } => f
                .debug_struct("DeviceConnected")
                .field("dpid", dpid)
                .finish_non_exhaustive(),
            SwitchEvent::PacketObserved(packet) => {
                f.debug_tuple("PacketObserved").field(packet).finish()
            }
            SwitchEvent::DeviceDisconnected { dpid } => f
                .debug_struct("DeviceDisconnected")
                .field("dpid", dpid)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_dpid() {
        let dpid = DatapathId::new(7);
        let packet = SwitchEvent::PacketObserved(PacketIn::new(dpid, PortNo::new(1), vec![]));
        assert_eq!(packet.dpid(), dpid);
        assert_eq!(packet.kind(), "packet_in");

        let gone = SwitchEvent::DeviceDisconnected { dpid };
        assert_eq!(gone.dpid(), dpid);
        assert_eq!(format!("{:?}", gone), "DeviceDisconnected { dpid: DatapathId(7) }");
    }
}
