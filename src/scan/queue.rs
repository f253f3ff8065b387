use std::sync::atomic::{AtomicUsize, Ordering};

use rand::seq::SliceRandom;

use crate::port::PortRange;

/// Pending ports. Each one is handed out at most once.
#[derive(Debug)]
pub struct WorkQueue {
    ports: Vec<u16>,
    cursor: AtomicUsize,
}

impl WorkQueue {
    pub fn new(range: PortRange, randomize: bool) -> Self {
        let mut ports: Vec<u16> = range.iter().collect();
        if randomize {
            ports.shuffle(&mut rand::thread_rng());
        }

        Self {
            ports,
            cursor: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn claim(&self) -> Option<u16> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.ports.get(idx).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn remaining(&self) -> usize {
        self.ports
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Mutex};

    use super::*;

    #[test]
    fn drains_every_port_once() {
        let queue = WorkQueue::new(PortRange::new(10, 14).unwrap(), false);
        let claimed: Vec<_> = std::iter::from_fn(|| queue.claim()).collect();

        assert_eq!(claimed, vec![10, 11, 12, 13, 14]);
        assert_eq!(queue.claim(), None);
        assert_eq!(queue.remaining(), 0);
    }

    #[test]
    fn shuffled_queue_holds_same_ports() {
        let range = PortRange::new(1, 500).unwrap();
        let queue = WorkQueue::new(range, true);
        assert_eq!(queue.len(), 500);

        let mut claimed: Vec<_> = std::iter::from_fn(|| queue.claim()).collect();
        claimed.sort_unstable();
        assert_eq!(claimed, range.iter().collect::<Vec<_>>());
    }

    #[test]
    fn concurrent_claims_never_overlap() {
        let queue = WorkQueue::new(PortRange::new(1, 10_000).unwrap(), false);
        let seen = Mutex::new(Vec::new());

        rayon::scope(|s| {
            for _ in 0..8 {
                s.spawn(|_| {
                    let mut local = Vec::new();
                    while let Some(port) = queue.claim() {
                        local.push(port);
                    }
                    seen.lock().unwrap().extend(local);
                });
            }
        });

        let seen = seen.into_inner().unwrap();
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(seen.len(), 10_000);
        assert_eq!(unique.len(), 10_000);
    }
}
