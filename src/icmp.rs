//! ICMP echo packet codec.

use std::net::Ipv4Addr;

use crate::checksum;
use crate::error::{DecodeError, PingError};
use crate::wire::{self, IcmpType};

/// A fully built Echo Request, ready for the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPacket {
    bytes: Vec<u8>,
}

impl OutgoingPacket {
    /// Builds an ICMPv4 Echo Request (type=8, code=0).
    ///
    /// `None` as payload selects the conventional 56 zero bytes, giving a
    /// 64-byte ICMP message.
    pub fn echo_request(
        identifier: u16,
        sequence: u16,
        payload: Option<&[u8]>,
    ) -> Result<Self, PingError> {
        let default_payload = [0u8; wire::DEFAULT_PAYLOAD_LEN];
        let payload = payload.unwrap_or(&default_payload);
        if payload.len() > wire::MAX_ECHO_PAYLOAD {
            return Err(PingError::PayloadTooLarge {
                len: payload.len(),
                max: wire::MAX_ECHO_PAYLOAD,
            });
        }

        let mut bytes = Vec::with_capacity(wire::ICMP_HEADER_LEN + payload.len());
        // Checksum stays zero until the whole message is in place.
        bytes.extend_from_slice(&[IcmpType::EchoRequest as u8, wire::ECHO_CODE, 0, 0]);
        bytes.extend_from_slice(&identifier.to_be_bytes());
        bytes.extend_from_slice(&sequence.to_be_bytes());
        bytes.extend_from_slice(payload);

        let csum = checksum::checksum(&bytes);
        wire::write_u16(&mut bytes, wire::ICMP_CHECKSUM, csum);

        Ok(OutgoingPacket { bytes })
    }

    pub fn identifier(&self) -> u16 {
        wire::read_u16(&self.bytes, wire::ICMP_IDENTIFIER)
    }

    pub fn sequence(&self) -> u16 {
        wire::read_u16(&self.bytes, wire::ICMP_SEQUENCE)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for OutgoingPacket {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// How inbound datagrams are framed by the socket they arrive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Every datagram starts with an IPv4 header (raw sockets).
    Ipv4,
    /// The IPv4 header may or may not be present; decided per datagram
    /// from its length and version nibble (datagram ICMP sockets).
    Detect,
}

/// Fixed part of a received IPv4 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub differentiated_services: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_fragment_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub header_checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < wire::IPV4_HEADER_LEN {
            return Err(DecodeError::TooShort);
        }
        let version = raw[wire::IPV4_VERSION_IHL] >> 4;
        if version != wire::IPV4_VERSION {
            return Err(DecodeError::UnsupportedIpVersion(version));
        }
        let ihl = raw[wire::IPV4_VERSION_IHL] & 0x0F;
        if ihl != wire::IPV4_MIN_IHL {
            return Err(DecodeError::UnsupportedHeaderLength(ihl));
        }
        let protocol = raw[wire::IPV4_PROTOCOL];
        if protocol != wire::IPPROTO_ICMP {
            return Err(DecodeError::UnsupportedProtocol(protocol));
        }

        let addr = |at: usize| Ipv4Addr::new(raw[at], raw[at + 1], raw[at + 2], raw[at + 3]);
        Ok(Ipv4Header {
            differentiated_services: raw[wire::IPV4_DSCP],
            total_length: wire::read_u16(raw, wire::IPV4_TOTAL_LEN),
            identification: wire::read_u16(raw, wire::IPV4_IDENTIFICATION),
            flags_fragment_offset: wire::read_u16(raw, wire::IPV4_FLAGS_FRAGMENT),
            ttl: raw[wire::IPV4_TTL],
            protocol,
            header_checksum: wire::read_u16(raw, wire::IPV4_CHECKSUM),
            source: addr(wire::IPV4_SOURCE),
            destination: addr(wire::IPV4_DESTINATION),
        })
    }
}

/// Decoded view over a received datagram.
///
/// Checksums are not validated while decoding; `checksum_is_valid` is
/// there for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingPacket<'a> {
    raw: &'a [u8],
    ip: Option<Ipv4Header>,
    icmp_offset: usize,
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl<'a> IncomingPacket<'a> {
    /// Decodes a full IPv4 datagram carrying ICMP.
    pub fn decode(raw: &'a [u8]) -> Result<Self, DecodeError> {
        let ip = Ipv4Header::parse(raw)?;
        Self::decode_icmp_at(raw, Some(ip), wire::IPV4_HEADER_LEN)
    }

    /// Decodes `raw` according to the socket's framing.
    pub fn decode_framed(raw: &'a [u8], framing: Framing) -> Result<Self, DecodeError> {
        match framing {
            Framing::Ipv4 => Self::decode(raw),
            Framing::Detect => {
                let has_ip_header = raw.len() >= wire::IPV4_HEADER_LEN
                    && raw[wire::IPV4_VERSION_IHL] >> 4 == wire::IPV4_VERSION;
                if has_ip_header {
                    Self::decode(raw)
                } else if raw.len() < wire::ICMP_HEADER_LEN {
                    Err(DecodeError::TooShort)
                } else {
                    Self::decode_icmp_at(raw, None, 0)
                }
            }
        }
    }

    fn decode_icmp_at(
        raw: &'a [u8],
        ip: Option<Ipv4Header>,
        offset: usize,
    ) -> Result<Self, DecodeError> {
        if raw.len() < offset + wire::ICMP_HEADER_LEN {
            return Err(DecodeError::TruncatedIcmp);
        }
        let icmp = &raw[offset..];
        Ok(IncomingPacket {
            raw,
            ip,
            icmp_offset: offset,
            icmp_type: icmp[wire::ICMP_TYPE],
            code: icmp[wire::ICMP_CODE],
            checksum: wire::read_u16(icmp, wire::ICMP_CHECKSUM),
            identifier: wire::read_u16(icmp, wire::ICMP_IDENTIFIER),
            sequence: wire::read_u16(icmp, wire::ICMP_SEQUENCE),
        })
    }

    /// The datagram exactly as received.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// IPv4 header, when the datagram carried one.
    pub fn ip_header(&self) -> Option<&Ipv4Header> {
        self.ip.as_ref()
    }

    /// ICMP header and payload.
    pub fn icmp(&self) -> &'a [u8] {
        &self.raw[self.icmp_offset..]
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.raw[self.icmp_offset + wire::ICMP_HEADER_LEN..]
    }

    pub fn kind(&self) -> Option<IcmpType> {
        IcmpType::from_u8(self.icmp_type)
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == IcmpType::EchoReply as u8
    }

    pub fn checksum_is_valid(&self) -> bool {
        checksum::verify(self.icmp())
    }
}

/// Byte offset of the ICMP header inside a raw IPv4 datagram.
///
/// Only the header length arithmetic is done: no version, protocol or
/// checksum checks. `None` if the buffer cannot hold the IPv4 header plus
/// an ICMP header.
pub fn icmp_offset(raw: &[u8]) -> Option<usize> {
    let first = *raw.first()?;
    let offset = (first & 0x0F) as usize * 4;
    if raw.len() >= offset + wire::ICMP_HEADER_LEN {
        Some(offset)
    } else {
        None
    }
}

/// The ICMP message embedded in a raw IPv4 datagram, see `icmp_offset`.
pub fn icmp_in_packet(raw: &[u8]) -> Option<&[u8]> {
    icmp_offset(raw).map(|offset| &raw[offset..])
}
