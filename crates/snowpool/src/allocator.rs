use crate::{
    error::{BatchError, Result},
    id::SnowflakeId,
    layout::Layout,
    pool::WorkerPool,
    time::TimeSource,
};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Hands out batches of identifiers from a shared [`WorkerPool`].
///
/// Each batch is produced by a single worker, so a successful batch is
/// strictly increasing. Batches from different callers may be served by
/// different workers concurrently; their ids never collide since the worker id
/// field differs.
///
/// # Example
///
/// ```
/// use snowpool::{Allocator, Layout, SystemClock};
///
/// let allocator = Allocator::with_range(0, 4, Layout::default(), SystemClock).unwrap();
/// let ids = allocator.allocate(100).unwrap();
/// assert_eq!(ids.len(), 100);
/// assert!(ids.windows(2).all(|w| w[0] < w[1]));
/// ```
pub struct Allocator<T>
where
    T: TimeSource,
{
    pool: Arc<WorkerPool<T>>,
}

impl<T> Clone for Allocator<T>
where
    T: TimeSource,
{
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<T> Allocator<T>
where
    T: TimeSource,
{
    pub const fn new(pool: Arc<WorkerPool<T>>) -> Self {
        Self { pool }
    }

    /// Builds an allocator over a fresh pool of `count` workers starting at
    /// `start_id`. See [`WorkerPool::with_range`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
    /// for an empty or out-of-range worker id range.
    pub fn with_range(start_id: u64, count: usize, layout: Layout, time: T) -> Result<Self>
    where
        T: Clone,
    {
        let pool = WorkerPool::with_range(start_id, count, layout, time)?;
        Ok(Self::new(Arc::new(pool)))
    }

    pub fn pool(&self) -> &Arc<WorkerPool<T>> {
        &self.pool
    }

    /// Produces `count` identifiers from one worker.
    ///
    /// Blocks while every worker is checked out. Stops at the first failure;
    /// the worker is returned to the pool whatever the outcome. A `count` of
    /// zero returns an empty batch without touching the pool.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] holding the identifiers produced before the
    /// failure and the [`Error`](crate::Error) that stopped the batch.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn allocate(&self, count: usize) -> Result<Vec<SnowflakeId>, BatchError> {
        let mut ids = Vec::with_capacity(count);
        if count == 0 {
            return Ok(ids);
        }

        let mut worker = self.pool.checkout();
        for _ in 0..count {
            match worker.next_id() {
                Ok(id) => ids.push(id),
                Err(source) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        worker_id = worker.worker_id(),
                        produced = ids.len(),
                        requested = count,
                        error = %source,
                        "batch stopped early"
                    );
                    return Err(BatchError {
                        ids,
                        requested: count,
                        source,
                    });
                }
            }
        }
        Ok(ids)
    }
}
