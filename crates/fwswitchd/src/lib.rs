//! fwswitchd - Firewall Learning Switch Controller
//!
//! An OpenFlow-style controller that runs a stateless firewall in front of
//! a MAC learning switch on every connected device.
//!
//! # Architecture
//!
//! Each device is programmed as a two-table pipeline:
//!
//! ```text
//! packet ──> [table 0: firewall] ──goto──> [table 1: forwarding] ──> port
//!                   │                             │
//!                 drop                      miss: controller
//! ```
//!
//! # Key Components
//!
//! - [`policy`]: Rule loading and compilation into table-0 entries
//! - [`learning`]: Per-device MAC address to port table
//! - [`forwarding`]: Packet-in handling (learn, decide, install, emit)
//! - [`installer`]: Builds table entries and sends them with retry
//! - [`controller::Controller`]: Per-device event serialization
//! - [`app::FirewallSwitch`]: Ties the pieces together as a [`SwitchApp`]
//! - [`replay`]: JSON-lines event source used by the daemon binary
//!
//! [`SwitchApp`]: ofctl_common::SwitchApp

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod forwarding;
pub mod installer;
pub mod learning;
pub mod policy;
pub mod replay;

pub use app::FirewallSwitch;
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerStats, StatsSnapshot};
pub use error::{ConfigError, PolicyError, ReplayError};
pub use forwarding::{ForwardingDecision, ForwardingEngine, OutputPort};
pub use installer::FlowInstaller;
pub use learning::{LearningTable, Observation};
pub use policy::{Policy, PolicyCompiler, Rule};
pub use replay::{drive, replay, LoggingSession, ReplayEvent, ReplaySummary};
