use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Stops workers from claiming new ports once raised.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    raised: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
