use std::time::Duration;

use crate::{error::ScanError, port::PortRange};

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const MAX_CONCURRENCY: usize = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub ports: PortRange,
    pub concurrency: usize,
    pub timeout: Duration,
    /// Optional scan-wide limit; once passed no new port is claimed.
    pub deadline: Option<Duration>,
    pub randomize: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: PortRange::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            deadline: None,
            randomize: false,
        }
    }
}

impl ScanConfig {
    pub fn new(ports: PortRange) -> Self {
        Self {
            ports,
            ..Default::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ScanError::InvalidConcurrency(self.concurrency));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidTimeout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.ports, PortRange::default());
    }

    #[test]
    fn concurrency_is_bounded() {
        let zero = ScanConfig::default().with_concurrency(0);
        assert!(matches!(
            zero.validate(),
            Err(ScanError::InvalidConcurrency(0))
        ));

        let huge = ScanConfig::default().with_concurrency(MAX_CONCURRENCY + 1);
        assert!(huge.validate().is_err());

        let max = ScanConfig::default().with_concurrency(MAX_CONCURRENCY);
        assert!(max.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = ScanConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ScanError::InvalidTimeout)));
    }
}
