//! Zero-copy IPv4/IPv6 datagram decoding
//!
//! A raw socket delivers whole IP datagrams; [`IpPacket::parse`]
//! discriminates on the version nibble and decodes the strict RFC 791 /
//! RFC 8200 header layouts, walking the IPv6 extension-header chain to
//! find the transport payload.
//!
//! The decoders borrow the input: option, extension, and payload slices
//! reference the receive buffer. Fragmented IPv4 datagrams and IPv6
//! datagrams carrying extension headers are decoded but their payloads
//! are opaque to the rest of the pipeline - reassembly is out of scope.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};

use crate::error::PacketError;
use crate::protocol;

/// Minimum (and option-free) IPv4 header size
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Fixed IPv6 header size
pub const IPV6_HEADER_LEN: usize = 40;

// =============================================================================
// Headers
// =============================================================================

/// Decoded IPv4 header (RFC 791)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Internet Header Length in 32-bit words (5..=15)
    pub ihl: u8,
    /// Differentiated services code point (top 6 bits of the ToS byte)
    pub dscp: u8,
    /// Explicit congestion notification (bottom 2 bits of the ToS byte)
    pub ecn: u8,
    /// Total datagram length, header included
    pub total_length: u16,
    /// Fragment identification
    pub identification: u16,
    /// Don't-fragment flag
    pub dont_fragment: bool,
    /// More-fragments flag
    pub more_fragments: bool,
    /// Fragment offset in 8-byte units (13 bits)
    pub fragment_offset: u16,
    /// Time to live
    pub ttl: u8,
    /// Transport protocol number
    pub protocol: u8,
    /// Header checksum as transmitted (not verified)
    pub checksum: u16,
    /// Source address
    pub source: Ipv4Addr,
    /// Destination address
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Header size in bytes (`ihl * 4`)
    #[inline]
    pub fn header_len(&self) -> usize {
        self.ihl as usize * 4
    }
}

/// Decoded fixed IPv6 header (RFC 8200)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Header {
    /// Traffic class
    pub traffic_class: u8,
    /// Flow label (20 bits)
    pub flow_label: u32,
    /// Length of everything after the fixed header
    pub payload_length: u16,
    /// First next-header value (start of the extension chain)
    pub next_header: u8,
    /// Hop limit
    pub hop_limit: u8,
    /// Source address
    pub source: Ipv6Addr,
    /// Destination address
    pub destination: Ipv6Addr,
}

/// One step of an IPv6 extension-header chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionHeader {
    /// Extension type (Hop-by-Hop, Routing, Fragment, ...)
    pub kind: u8,
    /// Total size of this extension in bytes
    pub length: usize,
}

// =============================================================================
// Packets
// =============================================================================

/// Decoded IPv4 datagram
#[derive(Debug, Clone)]
pub struct Ipv4Packet<'a> {
    /// Header fields
    pub header: Ipv4Header,
    /// Option bytes (`20..ihl*4`), possibly empty
    pub options: &'a [u8],
    /// Transport payload, clamped to the input
    pub payload: &'a [u8],
}

/// Decoded IPv6 datagram
#[derive(Debug, Clone)]
pub struct Ipv6Packet<'a> {
    /// Fixed header fields
    pub header: Ipv6Header,
    /// Walked extension headers, in wire order
    pub extensions: Vec<ExtensionHeader>,
    /// Raw bytes of the walked extension headers
    pub extension_bytes: &'a [u8],
    /// Protocol that terminated the chain
    pub terminal_protocol: u8,
    /// Transport payload following the chain, clamped to the input
    pub payload: &'a [u8],
}

/// A decoded IP datagram of either version
///
/// Borrows the receive buffer it was parsed from; owned copies are made
/// when an event is handed off downstream.
#[derive(Debug, Clone)]
pub struct IpPacket<'a> {
    /// Wall-clock instant the datagram was received
    pub received_at: DateTime<Utc>,
    /// Version-specific contents
    pub inner: IpPacketInner<'a>,
}

/// Version discrimination for [`IpPacket`]
#[derive(Debug, Clone)]
pub enum IpPacketInner<'a> {
    V4(Ipv4Packet<'a>),
    V6(Ipv6Packet<'a>),
}

impl<'a> IpPacket<'a> {
    /// Decode one IP datagram
    ///
    /// The version nibble of byte 0 selects the decoder; anything other
    /// than 4 or 6 fails with [`PacketError::UnsupportedVersion`].
    pub fn parse(data: &'a [u8], received_at: DateTime<Utc>) -> Result<Self, PacketError> {
        let first = *data.first().ok_or(PacketError::MalformedHeader {
            layer: "ip",
            reason: "empty datagram",
        })?;

        let inner = match first >> 4 {
            4 => IpPacketInner::V4(parse_v4(data)?),
            6 => IpPacketInner::V6(parse_v6(data)?),
            version => return Err(PacketError::UnsupportedVersion { version }),
        };

        Ok(Self { received_at, inner })
    }

    /// IP version (4 or 6)
    #[inline]
    pub fn version(&self) -> u8 {
        match &self.inner {
            IpPacketInner::V4(_) => 4,
            IpPacketInner::V6(_) => 6,
        }
    }

    /// Final transport protocol
    ///
    /// For V4 this is the header's protocol field; for V6 it is the
    /// protocol that terminated the extension chain.
    #[inline]
    pub fn protocol(&self) -> u8 {
        match &self.inner {
            IpPacketInner::V4(p) => p.header.protocol,
            IpPacketInner::V6(p) => p.terminal_protocol,
        }
    }

    /// Transport payload slice
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        match &self.inner {
            IpPacketInner::V4(p) => p.payload,
            IpPacketInner::V6(p) => p.payload,
        }
    }

    /// Source address
    #[inline]
    pub fn source(&self) -> IpAddr {
        match &self.inner {
            IpPacketInner::V4(p) => IpAddr::V4(p.header.source),
            IpPacketInner::V6(p) => IpAddr::V6(p.header.source),
        }
    }

    /// Destination address
    #[inline]
    pub fn destination(&self) -> IpAddr {
        match &self.inner {
            IpPacketInner::V4(p) => IpAddr::V4(p.header.destination),
            IpPacketInner::V6(p) => IpAddr::V6(p.header.destination),
        }
    }

    /// Whether this is a non-leading IPv4 fragment
    ///
    /// Such payloads do not start with a transport header and are
    /// surfaced as opaque.
    #[inline]
    pub fn is_fragment(&self) -> bool {
        match &self.inner {
            IpPacketInner::V4(p) => p.header.fragment_offset > 0,
            IpPacketInner::V6(_) => false,
        }
    }

    /// Whether the IPv6 extension chain is non-empty
    #[inline]
    pub fn has_extensions(&self) -> bool {
        match &self.inner {
            IpPacketInner::V4(_) => false,
            IpPacketInner::V6(p) => !p.extensions.is_empty(),
        }
    }
}

// =============================================================================
// IPv4 decode
// =============================================================================

fn parse_v4(data: &[u8]) -> Result<Ipv4Packet<'_>, PacketError> {
    if data.len() < IPV4_MIN_HEADER_LEN {
        return Err(PacketError::MalformedHeader {
            layer: "ipv4",
            reason: "shorter than minimum header",
        });
    }

    let ihl = data[0] & 0x0F;
    let header_len = ihl as usize * 4;
    if header_len < IPV4_MIN_HEADER_LEN {
        return Err(PacketError::MalformedHeader {
            layer: "ipv4",
            reason: "IHL below 5",
        });
    }
    if data.len() < header_len {
        return Err(PacketError::MalformedHeader {
            layer: "ipv4",
            reason: "input shorter than IHL claims",
        });
    }

    let total_length = u16::from_be_bytes([data[2], data[3]]);
    if (total_length as usize) < header_len {
        return Err(PacketError::MalformedHeader {
            layer: "ipv4",
            reason: "total length below header length",
        });
    }

    let flags_frag = u16::from_be_bytes([data[6], data[7]]);

    let header = Ipv4Header {
        ihl,
        dscp: data[1] >> 2,
        ecn: data[1] & 0x03,
        total_length,
        identification: u16::from_be_bytes([data[4], data[5]]),
        dont_fragment: flags_frag & 0x4000 != 0,
        more_fragments: flags_frag & 0x2000 != 0,
        fragment_offset: flags_frag & 0x1FFF,
        ttl: data[8],
        protocol: data[9],
        checksum: u16::from_be_bytes([data[10], data[11]]),
        source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
        destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
    };

    // Payload runs to the stated total length, clamped to the input
    let payload_end = (total_length as usize).min(data.len());

    Ok(Ipv4Packet {
        options: &data[IPV4_MIN_HEADER_LEN..header_len],
        payload: &data[header_len..payload_end],
        header,
    })
}

// =============================================================================
// IPv6 decode
// =============================================================================

fn parse_v6(data: &[u8]) -> Result<Ipv6Packet<'_>, PacketError> {
    if data.len() < IPV6_HEADER_LEN {
        return Err(PacketError::MalformedHeader {
            layer: "ipv6",
            reason: "shorter than fixed header",
        });
    }

    let mut source = [0u8; 16];
    source.copy_from_slice(&data[8..24]);
    let mut destination = [0u8; 16];
    destination.copy_from_slice(&data[24..40]);

    let header = Ipv6Header {
        traffic_class: (data[0] & 0x0F) << 4 | data[1] >> 4,
        flow_label: u32::from(data[1] & 0x0F) << 16
            | u32::from(data[2]) << 8
            | u32::from(data[3]),
        payload_length: u16::from_be_bytes([data[4], data[5]]),
        next_header: data[6],
        hop_limit: data[7],
        source: Ipv6Addr::from(source),
        destination: Ipv6Addr::from(destination),
    };

    let (extensions, terminal_protocol, payload_start) = walk_extensions(data, header.next_header);

    // Payload runs to the stated payload length, clamped to the input and
    // never before its own start
    let payload_end = (IPV6_HEADER_LEN + header.payload_length as usize)
        .min(data.len())
        .max(payload_start);
    let payload = if terminal_protocol == protocol::NO_NEXT_HEADER {
        // NoNxt: nothing follows by definition
        &data[payload_start..payload_start]
    } else {
        &data[payload_start..payload_end]
    };

    Ok(Ipv6Packet {
        header,
        extensions,
        extension_bytes: &data[IPV6_HEADER_LEN..payload_start],
        terminal_protocol,
        payload,
    })
}

/// Walk the extension-header chain starting at offset 40
///
/// Returns the walked steps, the protocol that terminated the chain, and
/// the offset where the transport payload begins. The chain ends at the
/// first non-extension type, at the NoNxt sentinel, or where the next
/// extension would run past the input (the remainder stays opaque).
fn walk_extensions(data: &[u8], first: u8) -> (Vec<ExtensionHeader>, u8, usize) {
    let mut extensions = Vec::new();
    let mut next = first;
    let mut offset = IPV6_HEADER_LEN;

    loop {
        if !protocol::is_extension(next) {
            // Includes NoNxt: the caller decides what that means
            return (extensions, next, offset);
        }

        // Need the next-header and length octets of this extension
        let (next_type, len_field) = match (data.get(offset), data.get(offset + 1)) {
            (Some(&t), Some(&l)) => (t, l),
            _ => return (extensions, next, offset),
        };

        let length = match next {
            protocol::FRAGMENT => 8,
            protocol::AUTH => (len_field as usize + 2) * 4,
            _ => (len_field as usize + 1) * 8,
        };

        if offset + length > data.len() {
            return (extensions, next, offset);
        }

        extensions.push(ExtensionHeader { kind: next, length });
        offset += length;
        next = next_type;
    }
}

#[cfg(test)]
#[path = "ip_test.rs"]
mod ip_test;
