//! JSON-lines event replay.
//!
//! Stands in for the wire-protocol session layer: each line describes one
//! switch event, and switch programming requests are logged instead of
//! sent.
//!
//! ```text
//! {"event":"connected","dpid":1}
//! {"event":"packet_in","dpid":1,"in_port":1,"eth_src":"00:00:00:00:00:01","eth_dst":"ff:ff:ff:ff:ff:ff"}
//! {"event":"disconnected","dpid":1}
//! ```

use crate::controller::Controller;
use crate::error::{ReplayError, ReplayResult};
use crate::forwarding::EthernetHeader;
use async_trait::async_trait;
use ofctl_common::{
    FlowEntry, PacketIn, PacketOut, SessionError, SwitchEvent, SwitchSession, ETH_TYPE_IPV4,
};
use ofctl_types::{DatapathId, MacAddress, PortNo};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Minimum Ethernet payload, so replayed frames look like real ones.
const MIN_PAYLOAD_LEN: usize = 46;

/// Depth of the queue between the reader and the dispatcher.
const EVENT_QUEUE_DEPTH: usize = 1024;

fn default_ethertype() -> u16 {
    ETH_TYPE_IPV4
}

/// One line of a replay file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Connected {
        dpid: DatapathId,
    },
    PacketIn {
        dpid: DatapathId,
        in_port: PortNo,
        eth_src: MacAddress,
        eth_dst: MacAddress,
        #[serde(default = "default_ethertype")]
        ethertype: u16,
    },
    Disconnected {
        dpid: DatapathId,
    },
}

impl ReplayEvent {
    /// Parses one line. Blank lines and `#` comments yield `None`.
    pub fn from_line(line_no: usize, line: &str) -> ReplayResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(line)
            .map(Some)
            .map_err(|e| ReplayError::Parse {
                line: line_no,
                message: e.to_string(),
            })
    }

    /// Converts into a switch event. Connects get a fresh [`LoggingSession`].
    pub fn into_switch_event(self) -> SwitchEvent {
        match self {
            ReplayEvent::Connected { dpid } => SwitchEvent::DeviceConnected {
                dpid,
                session: Arc::new(LoggingSession::new(dpid)),
            },
            ReplayEvent::PacketIn {
                dpid,
                in_port,
                eth_src,
                eth_dst,
                ethertype,
            } => {
                let frame = EthernetHeader::new(eth_dst, eth_src, ethertype)
                    .to_frame(&[0u8; MIN_PAYLOAD_LEN]);
                SwitchEvent::PacketObserved(PacketIn::new(dpid, in_port, frame))
            }
            ReplayEvent::Disconnected { dpid } => SwitchEvent::DeviceDisconnected { dpid },
        }
    }
}

/// Counts of a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub dispatched: usize,
    pub skipped: usize,
}

/// Reads events from `reader` and sends them to `events` until EOF.
///
/// Unparsable lines are logged and skipped. Stops early if the receiver
/// is dropped.
pub async fn replay<R>(reader: R, events: mpsc::Sender<SwitchEvent>) -> ReplayResult<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let event = match ReplayEvent::from_line(line_no, &line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping replay line");
                summary.skipped += 1;
                continue;
            }
        };

        if events.send(event.into_switch_event()).await.is_err() {
            warn!(line = line_no, "Controller stopped, ending replay");
            break;
        }
        summary.dispatched += 1;
    }

    Ok(summary)
}

/// Runs `controller` on the events read from `reader`.
///
/// Reading ends at EOF, on a read error, or when `stop` completes. In every
/// case the events already read are handled and the device workers are
/// shut down before this returns.
pub async fn drive<R, S>(
    controller: Arc<Controller>,
    reader: R,
    stop: S,
) -> ReplayResult<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let dispatcher = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.run(rx).await })
    };

    let replayed = tokio::select! {
        result = replay(reader, tx) => result,
        () = stop => {
            info!("Replay stopped");
            Ok(ReplaySummary::default())
        }
    };

    if let Err(e) = dispatcher.await {
        warn!(error = %e, "Dispatcher ended abnormally");
    }
    controller.shutdown().await;
    replayed
}

/// A session that logs programming requests instead of sending them.
#[derive(Debug)]
pub struct LoggingSession {
    dpid: DatapathId,
    flow_mods: AtomicU64,
    packet_outs: AtomicU64,
}

impl LoggingSession {
    pub fn new(dpid: DatapathId) -> Self {
        Self {
            dpid,
            flow_mods: AtomicU64::new(0),
            packet_outs: AtomicU64::new(0),
        }
    }

    pub fn flow_mods(&self) -> u64 {
        self.flow_mods.load(Ordering::Relaxed)
    }

    pub fn packet_outs(&self) -> u64 {
        self.packet_outs.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SwitchSession for LoggingSession {
    fn dpid(&self) -> DatapathId {
        self.dpid
    }

    async fn install_table_entry(&self, entry: &FlowEntry) -> Result<(), SessionError> {
        self.flow_mods.fetch_add(1, Ordering::Relaxed);
        info!(
            dpid = %self.dpid,
            table_id = entry.table_id,
            priority = entry.priority,
            idle_timeout = entry.idle_timeout,
            "flow_mod {}",
            entry
        );
        Ok(())
    }

    async fn emit_packet(&self, packet: &PacketOut) -> Result<(), SessionError> {
        self.packet_outs.fetch_add(1, Ordering::Relaxed);
        let ports: Vec<String> = packet.output_ports().map(|p| p.to_string()).collect();
        info!(
            dpid = %self.dpid,
            in_port = %packet.in_port,
            len = packet.payload.len(),
            "packet_out to {}",
            ports.join(",")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FirewallSwitch;
    use crate::config::ControllerConfig;
    use crate::policy::Policy;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_events() {
        let connected = ReplayEvent::from_line(1, r#"{"event":"connected","dpid":1}"#).unwrap();
        assert_eq!(
            connected,
            Some(ReplayEvent::Connected {
                dpid: DatapathId::new(1)
            })
        );

        let packet = ReplayEvent::from_line(
            2,
            r#"{"event":"packet_in","dpid":1,"in_port":3,"eth_src":"00:00:00:00:00:01","eth_dst":"ff:ff:ff:ff:ff:ff"}"#,
        )
        .unwrap()
        .unwrap();
        match packet {
            ReplayEvent::PacketIn {
                in_port, ethertype, ..
            } => {
                assert_eq!(in_port, PortNo::new(3));
                assert_eq!(ethertype, ETH_TYPE_IPV4);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_skip_blank_and_comment() {
        assert_eq!(ReplayEvent::from_line(1, "   ").unwrap(), None);
        assert_eq!(ReplayEvent::from_line(2, "# setup").unwrap(), None);
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = ReplayEvent::from_line(9, r#"{"event":"reboot","dpid":1}"#).unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 9, .. }));
    }

    #[test]
    fn test_packet_in_builds_frame() {
        let event = ReplayEvent::PacketIn {
            dpid: DatapathId::new(1),
            in_port: PortNo::new(2),
            eth_src: MacAddress::new([0, 0, 0, 0, 0, 1]),
            eth_dst: MacAddress::BROADCAST,
            ethertype: 0x0806,
        };
        match event.into_switch_event() {
            SwitchEvent::PacketObserved(packet) => {
                let header = EthernetHeader::parse(&packet.payload).unwrap();
                assert_eq!(header.src, MacAddress::new([0, 0, 0, 0, 0, 1]));
                assert_eq!(header.dst, MacAddress::BROADCAST);
                assert_eq!(header.ethertype, 0x0806);
                assert_eq!(packet.in_port, PortNo::new(2));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replay_skips_bad_lines() {
        let input = b"{\"event\":\"connected\",\"dpid\":5}\nnot json\n\n{\"event\":\"disconnected\",\"dpid\":5}\n";
        let (tx, mut rx) = mpsc::channel(8);

        let summary = replay(&input[..], tx).await.unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                dispatched: 2,
                skipped: 1
            }
        );
        assert_eq!(rx.recv().await.unwrap().kind(), "connected");
        assert_eq!(rx.recv().await.unwrap().kind(), "disconnected");
    }

    #[tokio::test]
    async fn test_drive_drains_queued_events_on_read_error() {
        let app = Arc::new(FirewallSwitch::new(
            Policy::default(),
            &ControllerConfig::default(),
        ));
        let controller = Arc::new(Controller::new(app.clone()));
        // The second line is not UTF-8, which fails the read.
        let mut input = b"{\"event\":\"connected\",\"dpid\":1}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe\n");

        let err = drive(Arc::clone(&controller), &input[..], std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, ReplayError::Io(_)));
        assert_eq!(app.stats().snapshot().devices_connected, 1);
        assert_eq!(controller.device_count(), 0);
    }

    #[tokio::test]
    async fn test_drive_until_eof() {
        let app = Arc::new(FirewallSwitch::new(
            Policy::default(),
            &ControllerConfig::default(),
        ));
        let controller = Arc::new(Controller::new(app.clone()));
        let input = b"{\"event\":\"connected\",\"dpid\":1}\n{\"event\":\"packet_in\",\"dpid\":1,\"in_port\":1,\"eth_src\":\"00:00:00:00:00:01\",\"eth_dst\":\"ff:ff:ff:ff:ff:ff\"}\n";

        let summary = drive(controller, &input[..], std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.dispatched, 2);
        let stats = app.stats().snapshot();
        assert_eq!(stats.packet_ins, 1);
        assert_eq!(stats.broadcasts, 1);
    }

    #[tokio::test]
    async fn test_logging_session_counts() {
        let session = LoggingSession::new(DatapathId::new(1));
        session
            .install_table_entry(&FlowEntry::new(0, 0, Default::default(), vec![]))
            .await
            .unwrap();
        session
            .emit_packet(&PacketOut::new(PortNo::new(1), vec![], vec![]))
            .await
            .unwrap();
        assert_eq!(session.flow_mods(), 1);
        assert_eq!(session.packet_outs(), 1);
    }
}
