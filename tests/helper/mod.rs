use pingrs::checksum::checksum;
use pingrs::{Connector, Framing, Transport};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;

/// What the scripted network does and what it has seen.
#[derive(Default)]
pub struct Script {
    pub connect_error: Option<io::ErrorKind>,
    pub connects: Vec<(IpAddr, u16)>,
    /// Outcome of upcoming sends; an empty queue means full success.
    pub send_results: VecDeque<io::Result<usize>>,
    pub sent: Vec<Vec<u8>>,
    pub inbound: VecDeque<io::Result<Vec<u8>>>,
    /// Report readable even with nothing queued.
    pub spurious_ready: bool,
    pub transport_dropped: bool,
}

pub type Shared = Rc<RefCell<Script>>;

pub struct ScriptedConnector {
    pub script: Shared,
    pub framing: Framing,
}

pub fn connector() -> (ScriptedConnector, Shared) {
    let script = Shared::default();
    let connector = ScriptedConnector {
        script: script.clone(),
        framing: Framing::Ipv4,
    };
    (connector, script)
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    fn connect(&mut self, target: IpAddr, identifier: u16) -> io::Result<ScriptedTransport> {
        let mut script = self.script.borrow_mut();
        script.connects.push((target, identifier));
        if let Some(kind) = script.connect_error {
            return Err(io::Error::new(kind, "scripted connect failure"));
        }
        Ok(ScriptedTransport {
            script: self.script.clone(),
            framing: self.framing,
        })
    }
}

pub struct ScriptedTransport {
    script: Shared,
    framing: Framing,
}

impl Transport for ScriptedTransport {
    fn send_to(&mut self, packet: &[u8], _target: IpAddr) -> io::Result<usize> {
        let mut script = self.script.borrow_mut();
        let result = script.send_results.pop_front().unwrap_or(Ok(packet.len()));
        if result.is_ok() {
            script.sent.push(packet.to_vec());
        }
        result
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.script.borrow_mut().inbound.pop_front() {
            Some(Ok(datagram)) => {
                buf[..datagram.len()].copy_from_slice(&datagram);
                Ok(datagram.len())
            }
            Some(Err(e)) => Err(e),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn wait_readable(&mut self, _timeout: Option<Duration>) -> io::Result<bool> {
        let script = self.script.borrow();
        Ok(script.spurious_ready || !script.inbound.is_empty())
    }

    fn framing(&self) -> Framing {
        self.framing
    }
}

impl Drop for ScriptedTransport {
    fn drop(&mut self) {
        self.script.borrow_mut().transport_dropped = true;
    }
}

/// ICMP echo message with a valid checksum.
pub fn echo(icmp_type: u8, identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    let mut msg = vec![icmp_type, 0, 0, 0];
    msg.extend_from_slice(&identifier.to_be_bytes());
    msg.extend_from_slice(&sequence.to_be_bytes());
    msg.extend_from_slice(payload);
    let csum = checksum(&msg);
    msg[2..4].copy_from_slice(&csum.to_be_bytes());
    msg
}

/// `icmp` behind an option-less IPv4 header with protocol `proto`.
pub fn ipv4(proto: u8, icmp: &[u8]) -> Vec<u8> {
    let mut pkt = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, proto, 0, 0, 192, 0, 2, 1, 10, 0, 0, 2];
    let total = (pkt.len() + icmp.len()) as u16;
    pkt[2..4].copy_from_slice(&total.to_be_bytes());
    let csum = checksum(&pkt);
    pkt[10..12].copy_from_slice(&csum.to_be_bytes());
    pkt.extend_from_slice(icmp);
    pkt
}
