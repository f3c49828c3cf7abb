//! Asynchronous ICMP echo ("ping") engine.
//!
//! A [`PingSession`] owns one ICMP socket aimed at one target. The caller
//! drives it from a single thread: `start`, `send`, readiness via
//! `handle_readable` (or `poll`), and `stop`. Everything that happens is
//! reported to a [`PingObserver`].
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::rc::Rc;
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! use pingrs::{PingEvent, PingSession};
//!
//! let (tx, rx) = mpsc::channel::<PingEvent>();
//! let observer = Rc::new(tx);
//!
//! let mut session = PingSession::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)));
//! session.set_observer(&observer);
//! session.start();
//! session.send(None);
//! session.poll(Some(Duration::from_secs(1)));
//! for event in rx.try_iter() {
//!     println!("{:?}", event);
//! }
//! session.stop();
//! ```

pub mod checksum;
pub mod correlate;
pub mod error;
pub mod icmp;
pub mod observer;
pub mod resolve;
pub mod session;
pub mod transport;
pub mod wire;

pub use correlate::{Classification, Correlator};
pub use error::{DecodeError, PingError};
pub use icmp::{icmp_in_packet, icmp_offset, Framing, IncomingPacket, Ipv4Header, OutgoingPacket};
pub use observer::{PingEvent, PingObserver};
pub use session::{PingSession, SessionState};
pub use transport::{Connector, IcmpConnector, IcmpSocket, Transport};
pub use wire::IcmpType;
