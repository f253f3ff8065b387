use std::sync::{Mutex, PoisonError};

use super::probe::{ProbeCause, ProbeResult};

/// Per cause counters over every probe that returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeTally {
    pub open: usize,
    pub refused: usize,
    pub timeout: usize,
    pub unreachable: usize,
    pub other: usize,
}

impl ProbeTally {
    fn count(&mut self, result: &ProbeResult) {
        match result.cause {
            None => self.open += 1,
            Some(ProbeCause::Refused) => self.refused += 1,
            Some(ProbeCause::Timeout) => self.timeout += 1,
            Some(ProbeCause::Unreachable) => self.unreachable += 1,
            Some(ProbeCause::Other) => self.other += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.open + self.refused + self.timeout + self.unreachable + self.other
    }
}

#[derive(Debug, Default)]
struct Inner {
    open_ports: Vec<u16>,
    tally: ProbeTally,
}

#[derive(Debug, Default)]
pub struct ResultSet {
    inner: Mutex<Inner>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: ProbeResult) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.tally.count(&result);
        if result.open {
            inner.open_ports.push(result.port);
        }
    }

    pub fn into_sorted(self) -> (Vec<u16>, ProbeTally) {
        let Inner {
            mut open_ports,
            tally,
        } = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        open_ports.sort_unstable();

        (open_ports, tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_open_ports_sorted() {
        let set = ResultSet::new();
        set.record(ProbeResult::open(443));
        set.record(ProbeResult::closed(21, ProbeCause::Refused));
        set.record(ProbeResult::open(22));
        set.record(ProbeResult::closed(8080, ProbeCause::Timeout));
        set.record(ProbeResult::closed(9, ProbeCause::Unreachable));

        let (ports, tally) = set.into_sorted();
        assert_eq!(ports, vec![22, 443]);
        assert_eq!(
            tally,
            ProbeTally {
                open: 2,
                refused: 1,
                timeout: 1,
                unreachable: 1,
                other: 0,
            }
        );
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let set = ResultSet::new();

        rayon::scope(|s| {
            for worker in 0..16u16 {
                let set = &set;
                s.spawn(move |_| {
                    for i in 0..1000u16 {
                        set.record(ProbeResult::open(worker * 1000 + i + 1));
                    }
                });
            }
        });

        let (ports, tally) = set.into_sorted();
        assert_eq!(ports.len(), 16_000);
        assert_eq!(tally.open, 16_000);
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
    }
}
