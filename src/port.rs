use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use crate::error::ScanError;

/// Inclusive range of TCP ports, never containing port 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        if start == 0 || start > end {
            return Err(ScanError::InvalidRange(start, end));
        }

        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> u16 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u16 {
        self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// Always false, a range holds at least one port.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self { start: 1, end: 1024 }
    }
}

impl Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

fn parse_port(raw: &str) -> Result<u16, ScanError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ScanError::InvalidPort(raw.trim().into())),
        Ok(p) => Ok(p),
    }
}

impl FromStr for PortRange {
    type Err = ScanError;

    /// Accepts either a single port (`"80"`) or a span (`"1-1024"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((start, end)) => PortRange::new(parse_port(start)?, parse_port(end)?),
            None => {
                let port = parse_port(s)?;
                PortRange::new(port, port)
            }
        }
    }
}
