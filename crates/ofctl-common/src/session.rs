//! The seam against a per-switch protocol session.

use crate::error::SessionError;
use crate::flow::{FlowEntry, PacketOut};
use async_trait::async_trait;
use ofctl_types::DatapathId;

/// An established control session with one switch.
///
/// Implementations own the wire encoding. Both operations are
/// fire-and-complete: success means the request was handed to the switch,
/// not that the switch has acted on it.
#[async_trait]
pub trait SwitchSession: Send + Sync {
    /// Returns the datapath id of the switch behind this session.
    fn dpid(&self) -> DatapathId;

    /// Adds a flow entry to one of the switch's tables.
    async fn install_table_entry(&self, entry: &FlowEntry) -> Result<(), SessionError>;

    /// Sends a packet out of the switch.
    async fn emit_packet(&self, packet: &PacketOut) -> Result<(), SessionError>;
}
