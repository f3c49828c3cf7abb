//! Lifecycle of one ping session: `Idle` -> `Started` -> `Stopped`.

use std::fmt;
use std::io;
use std::net::IpAddr;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, trace, warn};
use rand::Rng;

use crate::correlate::{Classification, Correlator};
use crate::error::PingError;
use crate::icmp::{Framing, IncomingPacket, OutgoingPacket};
use crate::observer::PingObserver;
use crate::resolve;
use crate::transport::{Connector, IcmpConnector, Transport};
use crate::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Target known, no socket yet.
    Idle,
    /// Socket open and listening.
    Started,
    /// Terminal. Socket released, no more events.
    Stopped,
}

/// Pings a single target.
///
/// All calls, including readiness handling, happen on the caller's thread;
/// outcomes are reported to the observer rather than returned.
pub struct PingSession<C: Connector = IcmpConnector> {
    target: IpAddr,
    host_name: Option<String>,
    correlator: Correlator,
    connector: C,
    // Some exactly while `state == Started`.
    transport: Option<C::Transport>,
    state: SessionState,
    observer: Option<Weak<dyn PingObserver>>,
    recv_buf: Vec<u8>,
}

impl PingSession<IcmpConnector> {
    /// Session for a numeric address, using real ICMP sockets.
    pub fn new(target: IpAddr) -> Self {
        Self::with_connector(target, IcmpConnector)
    }

    /// Resolves `host` to its first IPv4 address.
    pub fn with_host_name(host: &str) -> Result<Self, PingError> {
        let target = resolve::resolve_host(host)?;
        let mut session = Self::new(target);
        session.host_name = Some(host.to_owned());
        Ok(session)
    }
}

impl<C: Connector> PingSession<C> {
    /// Session over a custom connector. The identifier is picked at random
    /// and is never zero.
    pub fn with_connector(target: IpAddr, connector: C) -> Self {
        let identifier = rand::thread_rng().gen_range(1..=u16::MAX);
        PingSession {
            target,
            host_name: None,
            correlator: Correlator::new(identifier),
            connector,
            transport: None,
            state: SessionState::Idle,
            observer: None,
            recv_buf: vec![0; wire::MAX_IPV4_DATAGRAM],
        }
    }

    /// Overrides the identifier, for callers coordinating several sessions.
    /// Ignored once the session has started, and for zero: a datagram
    /// socket bound to port 0 gets a kernel-chosen identifier instead.
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        if identifier == 0 {
            warn!("Identifier 0 rejected, keeping {:#06x}", self.identifier());
        } else if self.state == SessionState::Idle {
            self.correlator = Correlator::new(identifier);
        } else {
            warn!("Identifier can only be set before start");
        }
        self
    }

    /// Registers `observer` without taking ownership of it. Once the last
    /// strong reference is gone events are silently dropped.
    pub fn set_observer<O: PingObserver + 'static>(&mut self, observer: &Rc<O>) {
        let observer: Weak<O> = Rc::downgrade(observer);
        self.observer = Some(observer);
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }

    pub fn host_name(&self) -> Option<&str> {
        self.host_name.as_deref()
    }

    pub fn identifier(&self) -> u16 {
        self.correlator.identifier()
    }

    pub fn next_sequence_number(&self) -> u16 {
        self.correlator.next_sequence()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    fn notify(&self, event: impl FnOnce(&dyn PingObserver)) {
        if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
            event(&*observer);
        }
    }

    /// Opens the socket and reports `started`, or `failed` if it cannot.
    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            warn!("start() called on a {:?} session", self.state);
            return;
        }
        if !self.target.is_ipv4() {
            self.fail(PingError::UnsupportedAddress(self.target));
            return;
        }
        match self.connector.connect(self.target, self.identifier()) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state = SessionState::Started;
                debug!(
                    "Session started for {} with identifier {:#06x}",
                    self.target,
                    self.identifier()
                );
                let (target, identifier) = (self.target, self.identifier());
                self.notify(|o| o.started(target, identifier));
            }
            Err(e) => self.fail(PingError::Io(e)),
        }
    }

    /// Sends one Echo Request. `None` sends the default 56-byte payload.
    ///
    /// The sequence number only advances when the whole packet was written.
    pub fn send(&mut self, payload: Option<&[u8]>) {
        let Some(transport) = self.transport.as_mut() else {
            warn!("send() called on a {:?} session", self.state);
            return;
        };
        let sequence = self.correlator.next_sequence();
        let packet =
            match OutgoingPacket::echo_request(self.correlator.identifier(), sequence, payload) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Unable to build echo request: {}", e);
                    self.notify(|o| o.send_failed(payload.unwrap_or_default(), e));
                    return;
                }
            };

        match transport.send_to(packet.as_bytes(), self.target) {
            Ok(sent) if sent == packet.len() => {
                self.correlator.advance();
                trace!("Sent {} bytes to {} seq={}", sent, self.target, sequence);
                self.notify(|o| o.packet_sent(packet.as_bytes(), sequence));
            }
            Ok(sent) => {
                warn!("Short write to {}: {} of {} bytes", self.target, sent, packet.len());
                let error = PingError::ShortWrite {
                    sent,
                    expected: packet.len(),
                };
                self.notify(|o| o.send_failed(packet.as_bytes(), error));
            }
            Err(e) => {
                warn!("Send to {} failed: {}", self.target, e);
                self.notify(|o| o.send_failed(packet.as_bytes(), PingError::Io(e)));
            }
        }
    }

    /// Reads and dispatches one datagram. Call when the socket is readable.
    ///
    /// Returns whether a datagram was read, even one that was then dropped
    /// as undecodable.
    pub fn handle_readable(&mut self) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        let framing = transport.framing();
        match transport.recv(&mut self.recv_buf) {
            Ok(len) => {
                self.dispatch(len, framing);
                true
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                false
            }
            Err(e) => {
                self.fail(PingError::Io(e));
                false
            }
        }
    }

    fn dispatch(&self, len: usize, framing: Framing) {
        let raw = &self.recv_buf[..len];
        let packet = match IncomingPacket::decode_framed(raw, framing) {
            Ok(packet) => packet,
            Err(e) => {
                trace!("Dropping {} byte datagram: {}", len, e);
                return;
            }
        };
        match self.correlator.classify(&packet) {
            Classification::Reply => {
                trace!("Reply seq={} ({} bytes)", packet.sequence, len);
                self.notify(|o| o.reply_received(raw));
            }
            Classification::Unexpected => {
                trace!(
                    "Unexpected ICMP type={} id={:#06x}",
                    packet.icmp_type,
                    packet.identifier
                );
                self.notify(|o| o.unexpected_packet_received(raw));
            }
        }
    }

    /// Waits up to `timeout` for the socket to become readable and handles
    /// one datagram if it does. Returns whether a datagram was handled.
    pub fn poll(&mut self, timeout: Option<Duration>) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        match transport.wait_readable(timeout) {
            Ok(true) => self.handle_readable(),
            Ok(false) => false,
            Err(e) => {
                self.fail(PingError::Io(e));
                false
            }
        }
    }

    /// Closes the socket. Does nothing unless the session is started.
    pub fn stop(&mut self) {
        if self.state == SessionState::Started {
            self.transport = None;
            self.state = SessionState::Stopped;
            debug!("Session for {} stopped", self.target);
        }
    }

    fn fail(&mut self, error: PingError) {
        warn!("Session for {} failed: {}", self.target, error);
        self.transport = None;
        self.state = SessionState::Stopped;
        self.notify(|o| o.failed(error));
    }
}

impl<C: Connector> fmt::Debug for PingSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingSession")
            .field("target", &self.target)
            .field("host_name", &self.host_name)
            .field("identifier", &self.identifier())
            .field("next_sequence", &self.next_sequence_number())
            .field("state", &self.state)
            .finish()
    }
}
