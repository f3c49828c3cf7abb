//! Notifications emitted by a `PingSession`.

use std::net::IpAddr;
use std::sync::mpsc::Sender;

use crate::error::PingError;

/// Receives session events. Every method defaults to doing nothing.
///
/// Methods take `&self`: the session holds only a weak reference and the
/// observer manages its own interior state.
pub trait PingObserver {
    /// The socket is open and the session is listening.
    fn started(&self, _target: IpAddr, _identifier: u16) {}

    /// Terminal. Nothing else is reported after this.
    fn failed(&self, _error: PingError) {}

    fn packet_sent(&self, _packet: &[u8], _sequence: u16) {}

    /// The sequence number was not consumed; the next send reuses it.
    fn send_failed(&self, _packet: &[u8], _error: PingError) {}

    /// `packet` is the inbound datagram, unmodified.
    fn reply_received(&self, _packet: &[u8]) {}

    /// A well-framed ICMP packet that is not a reply to this session.
    fn unexpected_packet_received(&self, _packet: &[u8]) {}
}

/// Owned form of the observer callbacks.
#[derive(Debug)]
pub enum PingEvent {
    Started { target: IpAddr, identifier: u16 },
    Failed(PingError),
    PacketSent { packet: Vec<u8>, sequence: u16 },
    SendFailed { packet: Vec<u8>, error: PingError },
    ReplyReceived(Vec<u8>),
    UnexpectedPacketReceived(Vec<u8>),
}

/// Forwards every callback as a `PingEvent`. A dropped receiver is ignored.
impl PingObserver for Sender<PingEvent> {
    fn started(&self, target: IpAddr, identifier: u16) {
        let _ = self.send(PingEvent::Started { target, identifier });
    }

    fn failed(&self, error: PingError) {
        let _ = self.send(PingEvent::Failed(error));
    }

    fn packet_sent(&self, packet: &[u8], sequence: u16) {
        let _ = self.send(PingEvent::PacketSent {
            packet: packet.to_vec(),
            sequence,
        });
    }

    fn send_failed(&self, packet: &[u8], error: PingError) {
        let _ = self.send(PingEvent::SendFailed {
            packet: packet.to_vec(),
            error,
        });
    }

    fn reply_received(&self, packet: &[u8]) {
        let _ = self.send(PingEvent::ReplyReceived(packet.to_vec()));
    }

    fn unexpected_packet_received(&self, packet: &[u8]) {
        let _ = self.send(PingEvent::UnexpectedPacketReceived(packet.to_vec()));
    }
}
