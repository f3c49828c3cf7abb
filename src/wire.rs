//! On-the-wire layouts of the IPv4 and ICMP headers used by ping.
//!
//! ```text
//! IPv4 (20 bytes, no options)          ICMP echo (8 bytes)
//!  0  version | header length           0  type
//!  1  differentiated services           1  code
//!  2  total length (BE)                 2  checksum (BE)
//!  4  identification (BE)               4  identifier (BE)
//!  6  flags | fragment offset (BE)      6  sequence number (BE)
//!  8  time to live                      8  payload...
//!  9  protocol
//! 10  header checksum (BE)
//! 12  source address
//! 16  destination address
//! ```

/// Size of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

/// Header length field value (in 32-bit words) of an option-less header.
pub const IPV4_MIN_IHL: u8 = 5;

pub const IPV4_VERSION: u8 = 4;

/// IP protocol number of ICMP.
pub const IPPROTO_ICMP: u8 = 1;

pub const IPV4_VERSION_IHL: usize = 0;
pub const IPV4_DSCP: usize = 1;
pub const IPV4_TOTAL_LEN: usize = 2;
pub const IPV4_IDENTIFICATION: usize = 4;
pub const IPV4_FLAGS_FRAGMENT: usize = 6;
pub const IPV4_TTL: usize = 8;
pub const IPV4_PROTOCOL: usize = 9;
pub const IPV4_CHECKSUM: usize = 10;
pub const IPV4_SOURCE: usize = 12;
pub const IPV4_DESTINATION: usize = 16;

/// Size of the ICMP echo header.
pub const ICMP_HEADER_LEN: usize = 8;

pub const ICMP_TYPE: usize = 0;
pub const ICMP_CODE: usize = 1;
pub const ICMP_CHECKSUM: usize = 2;
pub const ICMP_IDENTIFIER: usize = 4;
pub const ICMP_SEQUENCE: usize = 6;

/// Payload length used when the caller supplies none: 8 + 56 = 64 bytes.
pub const DEFAULT_PAYLOAD_LEN: usize = 56;

/// Largest IPv4 datagram the total length field can describe.
pub const MAX_IPV4_DATAGRAM: usize = u16::MAX as usize;

/// Largest echo payload that still fits in one IPv4 datagram.
pub const MAX_ECHO_PAYLOAD: usize = MAX_IPV4_DATAGRAM - IPV4_HEADER_LEN - ICMP_HEADER_LEN;

/// ICMP message types seen by a pinger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    Redirect = 5,
    EchoRequest = 8,
    TimeExceeded = 11,
}

impl IcmpType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::EchoReply),
            3 => Some(Self::DestinationUnreachable),
            5 => Some(Self::Redirect),
            8 => Some(Self::EchoRequest),
            11 => Some(Self::TimeExceeded),
            _ => None,
        }
    }
}

/// Echo request and reply always carry code 0.
pub const ECHO_CODE: u8 = 0;

/// Reads a big-endian `u16` at `offset`. Callers check bounds first.
pub(crate) fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(IPV4_DESTINATION + 4, IPV4_HEADER_LEN);
        assert_eq!(ICMP_SEQUENCE + 2, ICMP_HEADER_LEN);
        assert_eq!(ICMP_HEADER_LEN + DEFAULT_PAYLOAD_LEN, 64);
        assert_eq!(IPV4_MIN_IHL as usize * 4, IPV4_HEADER_LEN);
    }

    #[test]
    fn test_icmp_type_from_u8() {
        assert_eq!(IcmpType::from_u8(0), Some(IcmpType::EchoReply));
        assert_eq!(IcmpType::from_u8(8), Some(IcmpType::EchoRequest));
        assert_eq!(IcmpType::from_u8(42), None);
    }

    #[test]
    fn test_u16_helpers_are_big_endian() {
        let mut buf = [0u8; 4];
        write_u16(&mut buf, 1, 0x1234);
        assert_eq!(buf, [0x00, 0x12, 0x34, 0x00]);
        assert_eq!(read_u16(&buf, 1), 0x1234);
    }
}
