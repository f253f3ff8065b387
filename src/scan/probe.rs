use std::{
    fmt::{Debug, Display},
    io,
    net::{SocketAddr, TcpStream},
    time::Duration,
};

/// Why a probe did not end with an established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeCause {
    Timeout,
    Refused,
    Unreachable,
    Other,
}

impl Display for ProbeCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProbeCause::Timeout => "timeout",
                ProbeCause::Refused => "refused",
                ProbeCause::Unreachable => "unreachable",
                ProbeCause::Other => "other",
            }
        )
    }
}

impl From<&io::Error> for ProbeCause {
    fn from(e: &io::Error) -> Self {
        match e.kind() {
            // Some platforms report an expired connect as `WouldBlock`.
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeCause::Timeout,
            io::ErrorKind::ConnectionRefused => ProbeCause::Refused,
            _ => match e.raw_os_error() {
                Some(libc::ENETUNREACH) | Some(libc::EHOSTUNREACH) => ProbeCause::Unreachable,
                _ => ProbeCause::Other,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub port: u16,
    pub open: bool,
    pub cause: Option<ProbeCause>,
}

impl ProbeResult {
    #[inline]
    pub fn open(port: u16) -> Self {
        Self {
            port,
            open: true,
            cause: None,
        }
    }

    #[inline]
    pub fn closed(port: u16, cause: ProbeCause) -> Self {
        Self {
            port,
            open: false,
            cause: Some(cause),
        }
    }
}

/// Called concurrently from every worker without locking.
pub trait Executor: Debug + Sync {
    fn probe(&self, addr: &SocketAddr, timeout: Duration) -> ProbeResult;
}

#[derive(Debug)]
pub struct TcpProbe;

impl Executor for TcpProbe {
    fn probe(&self, addr: &SocketAddr, timeout: Duration) -> ProbeResult {
        match TcpStream::connect_timeout(addr, timeout) {
            // The stream is dropped right away, closing the connection.
            Ok(_) => ProbeResult::open(addr.port()),
            Err(e) => {
                let cause = ProbeCause::from(&e);
                log::trace!("Probe to `{}` failed ({}): {}", addr, cause, e);
                ProbeResult::closed(addr.port(), cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, TcpListener};

    use super::*;

    #[test]
    fn error_kinds_map_to_causes() {
        let timeout = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(ProbeCause::from(&timeout), ProbeCause::Timeout);

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ProbeCause::from(&refused), ProbeCause::Refused);

        let unreachable = io::Error::from_raw_os_error(libc::EHOSTUNREACH);
        assert_eq!(ProbeCause::from(&unreachable), ProbeCause::Unreachable);

        let net_unreachable = io::Error::from_raw_os_error(libc::ENETUNREACH);
        assert_eq!(ProbeCause::from(&net_unreachable), ProbeCause::Unreachable);

        let exhausted = io::Error::from_raw_os_error(libc::EMFILE);
        assert_eq!(ProbeCause::from(&exhausted), ProbeCause::Other);
    }

    #[test]
    fn listening_port_is_open() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = listener.local_addr().unwrap();

        let result = TcpProbe.probe(&addr, Duration::from_millis(500));
        assert_eq!(result, ProbeResult::open(addr.port()));
    }

    #[test]
    fn released_port_is_not_open() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap();

        let result = TcpProbe.probe(&addr, Duration::from_millis(500));
        assert!(!result.open);
        assert_eq!(result.port, addr.port());
        assert!(result.cause.is_some());
    }
}
