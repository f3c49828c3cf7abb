//! Sockets underneath a `PingSession`.

use std::fmt;
use std::io::{self, Read};
use std::mem::MaybeUninit;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::icmp::Framing;
use crate::wire;

/// SOCK_RAW. The value is 3 on unix and Windows alike, and `libc` does not
/// export it on Windows.
const SOCK_RAW: i32 = 3;

/// Shorter waits round down to zero in the socket timeout, which would
/// mean "block forever", so they become a non-blocking check instead.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// A non-blocking ICMP endpoint.
pub trait Transport {
    /// Writes one datagram, returning how many bytes were accepted.
    fn send_to(&mut self, packet: &[u8], target: IpAddr) -> io::Result<usize>;

    /// Reads one datagram. `WouldBlock` when nothing is queued.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Blocks until a datagram is readable or `timeout` elapses.
    /// `None` waits indefinitely.
    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;

    fn framing(&self) -> Framing;
}

/// Opens the transport for a session when it starts.
pub trait Connector {
    type Transport: Transport;

    fn connect(&mut self, target: IpAddr, identifier: u16) -> io::Result<Self::Transport>;
}

/// Opens real ICMPv4 sockets.
///
/// A raw socket is tried first. Without the privilege for that, an
/// unprivileged datagram ICMP socket is used instead, bound so that the
/// kernel keeps the session identifier on outgoing requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcmpConnector;

impl Connector for IcmpConnector {
    type Transport = IcmpSocket;

    fn connect(&mut self, target: IpAddr, identifier: u16) -> io::Result<IcmpSocket> {
        if !target.is_ipv4() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "only IPv4 targets are supported",
            ));
        }
        match IcmpSocket::raw() {
            Ok(socket) => Ok(socket),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("Raw ICMP socket refused ({}), using datagram socket", e);
                IcmpSocket::datagram(identifier)
            }
            Err(e) => Err(e),
        }
    }
}

/// socket2-backed ICMPv4 socket in non-blocking mode.
///
/// Readiness is detected by peeking with a read timeout, so no platform
/// specific polling API is needed.
pub struct IcmpSocket {
    socket: Socket,
    framing: Framing,
    peek_buf: Vec<MaybeUninit<u8>>,
}

impl IcmpSocket {
    /// Raw ICMP socket. Needs root on unix and Administrator on Windows.
    pub fn raw() -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::from(SOCK_RAW), Some(Protocol::ICMPV4))?;
        Self::wrap(socket, Framing::Ipv4)
    }

    /// Unprivileged datagram ICMP socket.
    ///
    /// Linux uses the bound port as the echo identifier, and binding port 0
    /// would let the kernel pick one the session does not know about. So
    /// a zero identifier is refused.
    pub fn datagram(identifier: u16) -> io::Result<Self> {
        if identifier == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "identifier 0 cannot be bound on a datagram ICMP socket",
            ));
        }
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4))?;
        if cfg!(target_os = "linux") {
            let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), identifier);
            socket.bind(&SockAddr::from(local))?;
        }
        Self::wrap(socket, Framing::Detect)
    }

    fn wrap(socket: Socket, framing: Framing) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(IcmpSocket {
            socket,
            framing,
            peek_buf: vec![MaybeUninit::uninit(); wire::MAX_IPV4_DATAGRAM],
        })
    }

    fn peek(&mut self) -> io::Result<bool> {
        match self.socket.peek(&mut self.peek_buf) {
            Ok(_) => Ok(true),
            Err(e) if nothing_queued(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for IcmpSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IcmpSocket")
            .field("socket", &self.socket)
            .field("framing", &self.framing)
            .finish()
    }
}

/// Errors that only mean the wait ended without a datagram.
fn nothing_queued(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

impl Transport for IcmpSocket {
    fn send_to(&mut self, packet: &[u8], target: IpAddr) -> io::Result<usize> {
        // Port is ignored for ICMP.
        let addr = SockAddr::from(SocketAddr::new(target, 0));
        self.socket.send_to(packet, &addr)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.socket).read(buf)
    }

    fn wait_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        if timeout.is_some_and(|t| t < MIN_WAIT) {
            return self.peek();
        }
        // Blocking only for the duration of the peek.
        self.socket.set_nonblocking(false)?;
        self.socket.set_read_timeout(timeout)?;
        let ready = self.peek();
        self.socket.set_nonblocking(true)?;
        ready
    }

    fn framing(&self) -> Framing {
        self.framing
    }
}
