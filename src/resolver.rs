use std::net::{IpAddr, ToSocketAddrs};

use url::Host;

use crate::error::ResolutionError;

/// IPv4 is preferred when a domain maps to both families.
pub fn lookup(target: &str) -> Result<IpAddr, ResolutionError> {
    let literal = target
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(target);
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(ip);
    }

    let ip = match Host::parse(target).map_err(ResolutionError::HostParseFailed)? {
        Host::Domain(dmn) => {
            let addrs = (dmn.as_str(), 0 /* dummy port */)
                .to_socket_addrs()
                .map_err(ResolutionError::LookupFailed)?
                .map(|saddr| saddr.ip())
                .collect::<Vec<_>>();

            let ip = addrs
                .iter()
                .find(|ip| ip.is_ipv4())
                .or_else(|| addrs.first())
                .copied()
                .ok_or(ResolutionError::NoAddress(target.into()))?;

            log::debug!("Found address `{}` mapped by target `{}`", ip, target);

            ip
        }
        Host::Ipv4(ip) => IpAddr::V4(ip),
        Host::Ipv6(ip) => IpAddr::V6(ip),
    };

    Ok(ip)
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    #[test]
    fn literal_addresses_skip_the_resolver() {
        assert_eq!(
            lookup("127.0.0.1").unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(lookup("::1").unwrap(), IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(lookup("[::1]").unwrap(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn malformed_target_is_a_parse_failure() {
        assert!(matches!(
            lookup("bad host name"),
            Err(ResolutionError::HostParseFailed(_))
        ));
        assert!(matches!(lookup(""), Err(ResolutionError::HostParseFailed(_))));
    }

    #[test]
    fn unbalanced_brackets_are_not_stripped() {
        assert!(lookup("[127.0.0.1").is_err());
        assert!(lookup("::1]").is_err());
        assert!(lookup("[::1").is_err());
    }

    #[test]
    fn unknown_domain_fails_to_resolve() {
        // `.invalid` is reserved and never resolves.
        assert!(lookup("no.such.host.invalid").is_err());
    }
}
