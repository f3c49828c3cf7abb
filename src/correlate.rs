//! Identifier and sequence bookkeeping for one ping session.

use crate::icmp::IncomingPacket;

/// What an inbound, well-framed ICMP packet means to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Echo Reply carrying this session's identifier.
    Reply,
    /// Anything else: other pingers' replies, requests, errors.
    Unexpected,
}

#[derive(Debug, Clone)]
pub struct Correlator {
    identifier: u16,
    next_sequence: u16,
}

impl Correlator {
    pub fn new(identifier: u16) -> Self {
        Correlator {
            identifier,
            next_sequence: 0,
        }
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// Sequence number the next request will carry.
    pub fn next_sequence(&self) -> u16 {
        self.next_sequence
    }

    /// Records a successful send; wraps after 65535.
    pub fn advance(&mut self) {
        self.next_sequence = self.next_sequence.wrapping_add(1);
    }

    /// Matching is on type and identifier only. Replies for stale or
    /// duplicate sequence numbers are still reported as replies.
    pub fn classify(&self, packet: &IncomingPacket<'_>) -> Classification {
        if packet.is_echo_reply() && packet.identifier == self.identifier {
            Classification::Reply
        } else {
            Classification::Unexpected
        }
    }
}
