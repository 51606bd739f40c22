//! Zero-copy UDP header decoding (RFC 768)

use crate::error::PacketError;

/// UDP header size
pub const UDP_HEADER_LEN: usize = 8;

/// Decoded UDP datagram
///
/// The payload borrows the input slice; the length and checksum fields
/// are carried as transmitted and not verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Length field: header plus payload as claimed by the sender
    pub length: u16,
    /// Checksum as transmitted
    pub checksum: u16,
    /// Payload bytes following the header
    pub payload: &'a [u8],
}

impl<'a> UdpDatagram<'a> {
    /// Decode a UDP datagram from the transport payload of an IP packet
    pub fn parse(data: &'a [u8]) -> Result<Self, PacketError> {
        if data.len() < UDP_HEADER_LEN {
            return Err(PacketError::TruncatedPayload {
                expected: UDP_HEADER_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
            payload: &data[UDP_HEADER_LEN..],
        })
    }
}

#[cfg(test)]
#[path = "udp_test.rs"]
mod udp_test;
