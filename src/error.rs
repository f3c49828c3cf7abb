use std::error::Error;
use std::fmt;
use std::io;
use std::net::IpAddr;

/// Reasons an inbound datagram could not be framed as IPv4 + ICMP.
///
/// None of these abort a session; the datagram is simply dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer is smaller than the headers it must contain.
    TooShort,
    /// Version nibble is not 4.
    UnsupportedIpVersion(u8),
    /// IPv4 header carries options (header length field other than 5).
    UnsupportedHeaderLength(u8),
    /// IPv4 protocol field is not ICMP.
    UnsupportedProtocol(u8),
    /// Fewer than 8 bytes follow the IPv4 header.
    TruncatedIcmp,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "packet too short"),
            Self::UnsupportedIpVersion(v) => write!(f, "unsupported IP version {}", v),
            Self::UnsupportedHeaderLength(ihl) => {
                write!(f, "unsupported IPv4 header length {} bytes", *ihl as usize * 4)
            }
            Self::UnsupportedProtocol(p) => write!(f, "unsupported IP protocol {}", p),
            Self::TruncatedIcmp => write!(f, "truncated ICMP header"),
        }
    }
}

impl Error for DecodeError {}

/// Errors reported to a session's observer.
#[derive(Debug)]
pub enum PingError {
    /// Socket creation, write or read failed.
    Io(io::Error),
    /// The echo payload does not fit in a single IPv4 datagram.
    PayloadTooLarge { len: usize, max: usize },
    /// The socket accepted only part of the packet.
    ShortWrite { sent: usize, expected: usize },
    /// The target address family is not handled by the engine.
    UnsupportedAddress(IpAddr),
    /// Host name resolution failed or produced no IPv4 address.
    Resolve(String),
}

impl From<io::Error> for PingError {
    fn from(e: io::Error) -> Self {
        PingError::Io(e)
    }
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::PayloadTooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds maximum of {}", len, max)
            }
            Self::ShortWrite { sent, expected } => {
                write!(f, "short write: sent {} of {} bytes", sent, expected)
            }
            Self::UnsupportedAddress(addr) => write!(f, "unsupported address {}", addr),
            Self::Resolve(host) => write!(f, "unable to resolve {}", host),
        }
    }
}

impl Error for PingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
