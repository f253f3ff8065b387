use thiserror::Error;

/// Failure to turn a target string into an address. Raised before any
/// probe is attempted.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to check target kind (ensure it's a domain or an IP address)")]
    HostParseFailed(#[source] url::ParseError),
    #[error("failed to resolve the given target: {0}")]
    LookupFailed(#[source] std::io::Error),
    #[error("resolver didn't find any address mapped by `{0}`")]
    NoAddress(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("port `{0}` is invalid")]
    InvalidPort(String),
    #[error("port range `{0}-{1}` is invalid")]
    InvalidRange(u16, u16),
    #[error("concurrency `{0}` is out of bounds")]
    InvalidConcurrency(usize),
    #[error("probe timeout must be greater than zero")]
    InvalidTimeout,
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("failed to start worker pool: {0}")]
    PoolBuildFailed(#[source] rayon::ThreadPoolBuildError),
    #[error("worker crashed: {0}")]
    WorkerFault(String),
}
