//! A single Snowflake generation lane.
//!
//! A [`Worker`] owns the mutable state behind one worker id: the timestamp of
//! the last issued identifier and the sequence counter within that
//! millisecond. It takes `&mut self` and has no internal locking; exclusive
//! access is provided by the [`WorkerPool`](crate::WorkerPool).


use crate::{
    error::{Error, Result},
    id::SnowflakeId,
    layout::Layout,
    time::TimeSource,
};
use core::{cmp::Ordering, fmt, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How long a worker sleeps between clock samples while waiting for the next
/// millisecond after exhausting its sequence.
pub const SPIN_INTERVAL: Duration = Duration::from_micros(100);

/// A stateful Snowflake ID generator for one worker id.
///
/// Identifiers from one worker are strictly increasing as long as the clock
/// does not move backwards: either the timestamp advances, or it holds and the
/// sequence advances. When the sequence is exhausted within a millisecond the
/// worker blocks until the clock reaches the next one.
///
/// ## Features
/// - ❌ Not thread-safe on its own, check it out of a pool to share it
/// - ✅ Detects clock regression without altering its state
/// - ✅ Runtime-configurable [`Layout`]
///
/// # Example
///
/// ```
/// use snowpool::{Layout, SystemClock, Worker};
///
/// let mut worker = Worker::new(7, Layout::default(), SystemClock).unwrap();
/// let a = worker.next_id().unwrap();
/// let b = worker.next_id().unwrap();
/// assert!(b > a);
/// assert_eq!(Layout::default().decode(a).worker_id, 7);
/// ```
pub struct Worker<T>
where
    T: TimeSource,
{
    worker_id: u64,
    last_timestamp: u64,
    sequence: u64,
    layout: Layout,
    time: T,
    spin_interval: Duration,
}

impl<T> Worker<T>
where
    T: TimeSource,
{
    /// Creates a worker with a fresh state (`last_timestamp` and `sequence`
    /// at zero).
    ///
    /// State is not persisted, so a restarted process begins again from zero
    /// and relies on the wall clock having moved past every identifier issued
    /// before the restart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `worker_id` does not fit in
    /// the layout's worker field.
    pub fn new(worker_id: u64, layout: Layout, time: T) -> Result<Self> {
        Self::from_components(worker_id, 0, 0, layout, time)
    }

    /// Creates a worker from explicit state.
    ///
    /// `last_timestamp` is in milliseconds since the UNIX epoch, the same unit
    /// [`TimeSource::current_millis`] returns. The sequence is masked to the
    /// layout's sequence width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `worker_id` does not fit in
    /// the layout's worker field.
    pub fn from_components(
        worker_id: u64,
        last_timestamp: u64,
        sequence: u64,
        layout: Layout,
        time: T,
    ) -> Result<Self> {
        layout.validate_worker_id(worker_id)?;
        Ok(Self {
            worker_id,
            last_timestamp,
            sequence: sequence & layout.max_sequence(),
            layout,
            time,
            spin_interval: SPIN_INTERVAL,
        })
    }

    /// Replaces the sleep between clock samples used while waiting out an
    /// exhausted sequence. Zero turns the wait into a pure spin.
    #[must_use]
    pub fn with_spin_interval(mut self, spin_interval: Duration) -> Self {
        self.spin_interval = spin_interval;
        self
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// Wall-clock milliseconds of the last issued identifier, or the value
    /// the worker was constructed with.
    pub const fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Produces the next identifier for this worker.
    ///
    /// Blocks only when more than `2^S` identifiers are requested within a
    /// single millisecond, until the clock moves to the next one.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued timestamp. Never retried here.
    /// - [`Error::TimestampOutOfRange`] if the reading is before the epoch or
    ///   beyond the timestamp field.
    ///
    /// On error the worker's state is unchanged.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(worker_id = self.worker_id)))]
    pub fn next_id(&mut self) -> Result<SnowflakeId> {
        let now = self.time.current_millis();

        let (timestamp, sequence) = match now.cmp(&self.last_timestamp) {
            Ordering::Less => return Err(Self::cold_clock_behind(self.last_timestamp, now)),
            Ordering::Equal => {
                let sequence = (self.sequence + 1) & self.layout.max_sequence();
                if sequence == 0 {
                    (self.wait_next_millis(), sequence)
                } else {
                    (now, sequence)
                }
            }
            Ordering::Greater => (now, 0),
        };

        let elapsed = self.elapsed_since_epoch(timestamp)?;
        self.last_timestamp = timestamp;
        self.sequence = sequence;
        Ok(self.layout.encode(elapsed, self.worker_id, sequence))
    }

    /// Samples the clock until it is strictly past `last_timestamp`.
    #[cold]
    fn wait_next_millis(&self) -> u64 {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            worker_id = self.worker_id,
            last = self.last_timestamp,
            "sequence exhausted, waiting for next millisecond"
        );

        let mut now = self.time.current_millis();
        while now <= self.last_timestamp {
            if self.spin_interval.is_zero() {
                std::hint::spin_loop();
            } else {
                std::thread::sleep(self.spin_interval);
            }
            now = self.time.current_millis();
        }
        now
    }

    fn elapsed_since_epoch(&self, millis: u64) -> Result<u64> {
        millis
            .checked_sub(self.layout.epoch_millis())
            .filter(|elapsed| *elapsed <= self.layout.max_timestamp())
            .ok_or(Error::TimestampOutOfRange { millis })
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(last: u64, now: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(last, now, behind_ms = last - now, "clock moved backwards");
        Error::ClockRegression { last, now }
    }
}

impl<T> fmt::Debug for Worker<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("worker_id", &self.worker_id)
            .field("last_timestamp", &self.last_timestamp)
            .field("sequence", &self.sequence)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
