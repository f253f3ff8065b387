use std::{
    any::Any,
    fmt::Display,
    net::{IpAddr, SocketAddr},
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use rayon::ThreadPoolBuilder;

use crate::{config::ScanConfig, error::ScanError, port::PortRange, resolver};

use self::{collector::ResultSet, queue::WorkQueue};

pub use self::{
    cancel::CancelSignal,
    collector::ProbeTally,
    probe::{Executor, ProbeCause, ProbeResult, TcpProbe},
};

mod cancel;
mod collector;
mod probe;
mod queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Every enqueued port was probed.
    Complete,
    /// Cancelled or out of time before the queue drained.
    Partial,
}

impl Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ScanStatus::Complete => "complete",
                ScanStatus::Partial => "partial",
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub target: IpAddr,
    pub ports: PortRange,
    pub open_ports: Vec<u16>,
    pub enqueued: usize,
    pub probed: usize,
    pub status: ScanStatus,
    pub tally: ProbeTally,
    pub elapsed: Duration,
}

impl ScanOutcome {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.status == ScanStatus::Complete
    }
}

struct Shared<'a> {
    queue: WorkQueue,
    results: ResultSet,
    probed: AtomicUsize,
    cancel: &'a CancelSignal,
    deadline: Option<Instant>,
    aborted: AtomicBool,
    fault: Mutex<Option<String>>,
}

impl Shared<'_> {
    fn should_stop(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
            || self.cancel.is_raised()
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn fail(&self, worker: usize, payload: Box<dyn Any + Send>) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".into());

        log::error!("Worker {} crashed: {}", worker, reason);

        self.aborted.store(true, Ordering::Release);
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(format!("worker {}: {}", worker, reason));
    }
}

pub struct Scanner<'e> {
    ip: IpAddr,
    config: ScanConfig,
    executor: &'e dyn Executor,
}

impl Scanner<'static> {
    pub fn new(ip: IpAddr, config: ScanConfig) -> Result<Self, ScanError> {
        Scanner::with_executor(ip, config, &TcpProbe)
    }
}

impl<'e> Scanner<'e> {
    pub fn with_executor(
        ip: IpAddr,
        config: ScanConfig,
        executor: &'e dyn Executor,
    ) -> Result<Self, ScanError> {
        config.validate()?;

        Ok(Self {
            ip,
            config,
            executor,
        })
    }

    pub fn run(&self) -> Result<ScanOutcome, ScanError> {
        self.run_with_cancel(&CancelSignal::new())
    }

    pub fn run_with_cancel(&self, cancel: &CancelSignal) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        let workers = self.config.concurrency;

        let shared = Shared {
            queue: WorkQueue::new(self.config.ports, self.config.randomize),
            results: ResultSet::new(),
            probed: AtomicUsize::new(0),
            cancel,
            deadline: self.config.deadline.map(|d| started + d),
            aborted: AtomicBool::new(false),
            fault: Mutex::new(None),
        };

        log::debug!(
            "Starting {} workers for {} ports on `{}`",
            workers,
            shared.queue.len(),
            self.ip
        );

        // The pool threads are joined before `build_scoped` returns.
        ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("probe-worker-{}", i))
            .build_scoped(
                |thread| thread.run(),
                |pool| {
                    pool.scope(|s| {
                        for id in 0..workers {
                            let shared = &shared;
                            s.spawn(move |_| {
                                if let Err(payload) =
                                    panic::catch_unwind(AssertUnwindSafe(|| self.drain(shared)))
                                {
                                    shared.fail(id, payload);
                                }
                            });
                        }
                    })
                },
            )
            .map_err(ScanError::PoolBuildFailed)?;

        let Shared {
            queue,
            results,
            probed,
            fault,
            ..
        } = shared;

        if let Some(reason) = fault.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(ScanError::WorkerFault(reason));
        }

        let probed = probed.into_inner();
        let enqueued = queue.len();
        let (open_ports, tally) = results.into_sorted();
        debug_assert_eq!(tally.total(), probed);

        let status = if probed == enqueued {
            ScanStatus::Complete
        } else {
            log::debug!(
                "Scan stopped early, {} ports left unclaimed",
                queue.remaining()
            );
            ScanStatus::Partial
        };

        log::debug!(
            "Drained {}/{} ports on `{}` ({} open)",
            probed,
            enqueued,
            self.ip,
            open_ports.len()
        );

        Ok(ScanOutcome {
            target: self.ip,
            ports: self.config.ports,
            open_ports,
            enqueued,
            probed,
            status,
            tally,
            elapsed: started.elapsed(),
        })
    }

    fn drain(&self, shared: &Shared) {
        while !shared.should_stop() {
            let Some(port) = shared.queue.claim() else {
                break;
            };

            let result = self
                .executor
                .probe(&SocketAddr::new(self.ip, port), self.config.timeout);
            if result.open {
                log::info!("Port {} is open", port);
            }

            shared.results.record(result);
            shared.probed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

pub fn scan_host_with(
    target: &str,
    config: ScanConfig,
    executor: &dyn Executor,
    cancel: &CancelSignal,
) -> Result<ScanOutcome, ScanError> {
    let ip = resolver::lookup(target)?;

    Scanner::with_executor(ip, config, executor)?.run_with_cancel(cancel)
}

pub fn scan_host(
    target: &str,
    config: ScanConfig,
    cancel: &CancelSignal,
) -> Result<ScanOutcome, ScanError> {
    scan_host_with(target, config, &TcpProbe, cancel)
}

pub fn scan(ip: IpAddr, start: u16, end: u16, concurrency: usize) -> Result<Vec<u16>, ScanError> {
    let config = ScanConfig::new(PortRange::new(start, end)?).with_concurrency(concurrency);

    Scanner::new(ip, config)?
        .run()
        .map(|outcome| outcome.open_ports)
}
