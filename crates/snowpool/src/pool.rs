//! Exclusive checkout of [`Worker`]s.
//!
//! The [`WorkerPool`] owns every worker of the process. A worker leaves the
//! pool on [`WorkerPool::checkout`] and comes back when the returned
//! [`PooledWorker`] guard is dropped, so at most one caller can touch a given
//! worker's state at any instant and a failed caller cannot leak a worker.
//!
//! Idle workers are handed out in FIFO order, which spreads consecutive
//! requests across the whole worker range.

use crate::{
    error::{Error, Result},
    layout::Layout,
    time::TimeSource,
    worker::Worker,
};
use core::{
    fmt,
    ops::{Deref, DerefMut},
};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};

/// A fixed set of workers with blocking, mutually exclusive checkout.
pub struct WorkerPool<T>
where
    T: TimeSource,
{
    idle: Mutex<VecDeque<Worker<T>>>,
    returned: Condvar,
    capacity: usize,
}

impl<T> WorkerPool<T>
where
    T: TimeSource,
{
    /// Builds a pool that owns `workers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `workers` is empty or if two
    /// workers share a worker id.
    pub fn new(workers: Vec<Worker<T>>) -> Result<Self> {
        if workers.is_empty() {
            return Err(Error::invalid_configuration(
                "a worker pool needs at least one worker",
            ));
        }

        let mut seen = HashSet::with_capacity(workers.len());
        for worker in &workers {
            if !seen.insert(worker.worker_id()) {
                return Err(Error::invalid_configuration(format!(
                    "worker id {} appears more than once",
                    worker.worker_id()
                )));
            }
        }

        Ok(Self {
            capacity: workers.len(),
            idle: Mutex::new(workers.into()),
            returned: Condvar::new(),
        })
    }

    /// Builds `count` workers with the contiguous ids
    /// `[start_id, start_id + count - 1]`, all sharing `layout` and `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `count` is zero or the last
    /// id does not fit in the layout's worker field.
    ///
    /// # Example
    ///
    /// ```
    /// use snowpool::{Layout, SystemClock, WorkerPool};
    ///
    /// let pool = WorkerPool::with_range(4, 2, Layout::default(), SystemClock).unwrap();
    /// assert_eq!(pool.capacity(), 2);
    ///
    /// let worker = pool.checkout();
    /// assert_eq!(worker.worker_id(), 4);
    /// ```
    pub fn with_range(start_id: u64, count: usize, layout: Layout, time: T) -> Result<Self>
    where
        T: Clone,
    {
        if count == 0 {
            return Err(Error::invalid_configuration(
                "a worker pool needs at least one worker",
            ));
        }
        let last_id = u64::try_from(count - 1)
            .ok()
            .and_then(|offset| start_id.checked_add(offset))
            .ok_or_else(|| Error::invalid_configuration("worker id range overflows u64"))?;
        layout.validate_worker_id(last_id)?;

        let workers = (start_id..=last_id)
            .map(|worker_id| Worker::new(worker_id, layout, time.clone()))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(start_id, last_id, "worker pool created");

        Self::new(workers)
    }

    /// Takes an idle worker out of the pool, blocking until one is returned if
    /// all of them are checked out.
    ///
    /// The worker goes back to the pool when the guard is dropped.
    pub fn checkout(&self) -> PooledWorker<'_, T> {
        let mut idle = self.idle.lock();
        loop {
            if let Some(worker) = idle.pop_front() {
                return PooledWorker::new(self, worker);
            }
            #[cfg(feature = "tracing")]
            tracing::trace!(capacity = self.capacity, "all workers busy, waiting");
            self.returned.wait(&mut idle);
        }
    }

    /// Takes an idle worker out of the pool if one is available right now.
    pub fn try_checkout(&self) -> Option<PooledWorker<'_, T>> {
        self.idle
            .lock()
            .pop_front()
            .map(|worker| PooledWorker::new(self, worker))
    }

    /// Total number of workers owned by the pool.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of workers currently idle.
    pub fn available(&self) -> usize {
        self.idle.lock().len()
    }

    fn checkin(&self, worker: Worker<T>) {
        self.idle.lock().push_back(worker);
        self.returned.notify_one();
    }
}

impl<T> fmt::Debug for WorkerPool<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// A worker checked out of a [`WorkerPool`].
///
/// Dereferences to [`Worker`]. Dropping the guard, or calling
/// [`PooledWorker::checkin`], returns the worker to its pool.
pub struct PooledWorker<'a, T>
where
    T: TimeSource,
{
    pool: &'a WorkerPool<T>,
    worker: Option<Worker<T>>,
}

impl<'a, T> PooledWorker<'a, T>
where
    T: TimeSource,
{
    const fn new(pool: &'a WorkerPool<T>, worker: Worker<T>) -> Self {
        Self {
            pool,
            worker: Some(worker),
        }
    }

    /// Returns the worker to its pool.
    pub fn checkin(self) {
        drop(self);
    }
}

impl<T> Deref for PooledWorker<'_, T>
where
    T: TimeSource,
{
    type Target = Worker<T>;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the worker out.
        self.worker.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T> DerefMut for PooledWorker<'_, T>
where
    T: TimeSource,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.worker.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T> Drop for PooledWorker<'_, T>
where
    T: TimeSource,
{
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.pool.checkin(worker);
        }
    }
}
