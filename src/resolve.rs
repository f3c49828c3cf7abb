use std::net::{IpAddr, ToSocketAddrs};

use log::debug;

use crate::error::PingError;

/// Resolves `host` with the system resolver and picks its first IPv4
/// address. Numeric addresses come back unchanged.
pub fn resolve_host(host: &str) -> Result<IpAddr, PingError> {
    if let Ok(addr) = host.parse::<IpAddr>() {
        return Ok(addr);
    }
    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|e| PingError::Resolve(format!("{}: {}", host, e)))?;
    let addr = addrs
        .map(|sa| sa.ip())
        .find(IpAddr::is_ipv4)
        .ok_or_else(|| PingError::Resolve(format!("{}: no IPv4 address", host)))?;
    debug!("Resolved {} to {}", host, addr);
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_numeric_address() {
        assert_eq!(
            resolve_host("192.0.2.7").unwrap(),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7))
        );
    }

    #[test]
    fn test_unresolvable() {
        assert!(matches!(
            resolve_host("no-such-host.invalid"),
            Err(PingError::Resolve(_))
        ));
    }
}
