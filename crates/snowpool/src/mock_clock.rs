use crate::{layout::Layout, time::TimeSource};
use core::time::Duration;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

/// A layout with a zero epoch so small mock readings stay encodable.
pub(crate) fn test_layout() -> Layout {
    Layout::new(Duration::ZERO, 10, 12).unwrap()
}

/// A clock whose reading only changes when a test says so.
#[derive(Clone, Default)]
pub(crate) struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub(crate) fn new(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    pub(crate) fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// A clock that replays a fixed list of readings, one per call, and keeps
/// returning the last one once the list is exhausted.
#[derive(Clone)]
pub(crate) struct ScriptedClock {
    readings: Arc<Mutex<Vec<u64>>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedClock {
    pub(crate) fn new(readings: Vec<u64>) -> Self {
        assert!(!readings.is_empty(), "script needs at least one reading");
        Self {
            readings: Arc::new(Mutex::new(readings)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the clock has been sampled.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TimeSource for ScriptedClock {
    fn current_millis(&self) -> u64 {
        let idx = self.reads.fetch_add(1, Ordering::SeqCst);
        let readings = self.readings.lock();
        readings[idx.min(readings.len() - 1)]
    }
}
