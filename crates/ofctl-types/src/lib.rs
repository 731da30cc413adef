//! Common types for OpenFlow-style switch control.
//!
//! This crate provides type-safe representations of the identifiers that
//! flow through the controller:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`DatapathId`]: 64-bit identity of a managed switch
//! - [`PortNo`]: switch port numbers, including the reserved pseudo-ports

mod datapath;
mod mac;
mod port;

pub use datapath::DatapathId;
pub use mac::MacAddress;
pub use port::PortNo;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid datapath id: {0}")]
    InvalidDatapathId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNo(String),
}
