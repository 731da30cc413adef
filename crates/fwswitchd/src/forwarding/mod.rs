//! Reactive L2 forwarding.

mod engine;
mod ethernet;

pub use engine::{ForwardingDecision, ForwardingEngine, OutputPort, PacketInOutcome};
pub use ethernet::{EthernetHeader, FrameError, ETHERNET_HEADER_LEN};
