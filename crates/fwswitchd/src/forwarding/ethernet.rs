//! Ethernet II header access.

use ofctl_types::MacAddress;
use thiserror::Error;

/// Length of an Ethernet II header without VLAN tags.
pub const ETHERNET_HEADER_LEN: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short for an Ethernet header: {len} bytes")]
    Truncated { len: usize },
}

/// The addressing part of an Ethernet frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: u16,
}

impl EthernetHeader {
    pub fn new(dst: MacAddress, src: MacAddress, ethertype: u16) -> Self {
        Self {
            dst,
            src,
            ethertype,
        }
    }

    /// Reads the header at the start of `frame`.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        let truncated = || FrameError::Truncated { len: frame.len() };
        let header = frame.get(..ETHERNET_HEADER_LEN).ok_or_else(truncated)?;

        let dst = MacAddress::from_slice(&header[0..6]).ok_or_else(truncated)?;
        let src = MacAddress::from_slice(&header[6..12]).ok_or_else(truncated)?;
        let ethertype = u16::from_be_bytes([header[12], header[13]]);

        Ok(Self {
            dst,
            src,
            ethertype,
        })
    }

    /// Builds a frame of this header followed by `payload`.
    pub fn to_frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
        frame.extend_from_slice(self.dst.as_bytes());
        frame.extend_from_slice(self.src.as_bytes());
        frame.extend_from_slice(&self.ethertype.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        let frame = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
            0x08, 0x06, // ARP
            0xde, 0xad,
        ];
        let header = EthernetHeader::parse(&frame).unwrap();
        assert_eq!(header.dst, MacAddress::BROADCAST);
        assert_eq!(header.src.to_string(), "00:11:22:33:44:55");
        assert_eq!(header.ethertype, 0x0806);
    }

    #[test]
    fn test_parse_truncated() {
        assert_eq!(
            EthernetHeader::parse(&[0u8; 13]),
            Err(FrameError::Truncated { len: 13 })
        );
    }

    #[test]
    fn test_to_frame() {
        let header = EthernetHeader::new(
            MacAddress::new([0, 0, 0, 0, 0, 2]),
            MacAddress::new([0, 0, 0, 0, 0, 1]),
            0x0800,
        );
        let frame = header.to_frame(&[1, 2, 3]);
        assert_eq!(frame.len(), ETHERNET_HEADER_LEN + 3);
        assert_eq!(EthernetHeader::parse(&frame).unwrap(), header);
    }
}
