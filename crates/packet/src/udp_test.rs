//! Tests for the UDP decoder

use crate::udp::{UdpDatagram, UDP_HEADER_LEN};
use crate::PacketError;

/// UDP datagram image with the given ports around `payload`
fn datagram(src: u16, dst: u16, payload: &[u8]) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(UDP_HEADER_LEN + payload.len());
    pkt.extend_from_slice(&src.to_be_bytes());
    pkt.extend_from_slice(&dst.to_be_bytes());
    pkt.extend_from_slice(&((UDP_HEADER_LEN + payload.len()) as u16).to_be_bytes());
    pkt.extend_from_slice(&0xCAFEu16.to_be_bytes());
    pkt.extend_from_slice(payload);
    pkt
}

#[test]
fn test_parse_fields() {
    let pkt = datagram(40000, 514, b"<13>Hello");
    let udp = UdpDatagram::parse(&pkt).unwrap();

    assert_eq!(udp.source_port, 40000);
    assert_eq!(udp.destination_port, 514);
    assert_eq!(udp.length, 17);
    assert_eq!(udp.checksum, 0xCAFE);
    assert_eq!(udp.payload, b"<13>Hello");
}

#[test]
fn test_empty_payload() {
    let pkt = datagram(1, 2, b"");
    let udp = UdpDatagram::parse(&pkt).unwrap();
    assert!(udp.payload.is_empty());
    assert_eq!(udp.length, 8);
}

#[test]
fn test_truncated() {
    let pkt = datagram(1, 2, b"");
    for len in 0..UDP_HEADER_LEN {
        let err = UdpDatagram::parse(&pkt[..len]).unwrap_err();
        assert_eq!(
            err,
            PacketError::TruncatedPayload {
                expected: UDP_HEADER_LEN,
                actual: len,
            }
        );
    }
}
