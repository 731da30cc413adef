//! Common controller abstractions for OpenFlow-style switch control.
//!
//! This crate provides the traits and types shared by controller
//! applications:
//!
//! - [`SwitchApp`]: Base trait for applications driven by switch events
//! - [`SwitchSession`]: The seam against the per-switch protocol session
//! - [`FlowEntry`] / [`FlowMatch`]: Wire-neutral flow-table programming model
//! - [`SwitchEvent`]: Notifications delivered by managed switches
//! - [`RetryPolicy`]: Bounded retry for session operations
//!
//! # Architecture
//!
//! The controller follows an event-driven model:
//!
//! 1. A session layer (outside this workspace) speaks the wire protocol
//! 2. It turns switch messages into [`SwitchEvent`]s
//! 3. The controller serializes events per switch and hands them to a [`SwitchApp`]
//! 4. The app programs the switch back through its [`SwitchSession`]
//!
//! # Example
//!
//! ```ignore
//! use ofctl_common::{ControlResult, PacketIn, SwitchApp, SwitchSession};
//! use ofctl_types::DatapathId;
//!
//! struct Hub;
//!
//! #[async_trait]
//! impl SwitchApp for Hub {
//!     fn name(&self) -> &str { "hub" }
//!
//!     async fn on_device_connected(&self, _: DatapathId, _: &dyn SwitchSession) -> ControlResult<()> {
//!         Ok(())
//!     }
//!
//!     async fn on_packet_in(&self, session: &dyn SwitchSession, packet: PacketIn) -> ControlResult<()> {
//!         let out = PacketOut::new(packet.in_port, vec![Action::Output(PortNo::FLOOD)], packet.payload);
//!         session.emit_packet(&out).await.map_err(|e| ControlError::emission(packet.dpid, e))
//!     }
//! }
//! ```

mod app;
mod error;
mod event;
mod flow;
mod retry;
mod session;

pub use app::SwitchApp;
pub use error::{ControlError, ControlResult, SessionError};
pub use event::{PacketIn, SwitchEvent};
pub use flow::{
    Action, FlowEntry, FlowMatch, Instruction, PacketOut, TableId, ETH_TYPE_IPV4, IP_PROTO_TCP,
    IP_PROTO_UDP, PRIORITY_TABLE_MISS,
};
pub use retry::RetryPolicy;
pub use session::SwitchSession;
