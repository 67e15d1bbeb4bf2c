//! Bounded work dispatcher.
//!
//! Runs a batch of independent blocking closures with a fixed concurrency
//! ceiling. Each closure owns its inputs and returns its own result; the pool
//! merges those results once they come back, so units never share state.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum WorkPoolError {
    #[error("Work pool needs at least one worker")]
    NoWorkers,
    #[error("Work pool is closed")]
    Closed,
    #[error("Unit of work failed: {0}")]
    WorkerFailed(String),
}

impl From<JoinError> for WorkPoolError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            Self::WorkerFailed("unit of work panicked".to_string())
        } else {
            Self::WorkerFailed(err.to_string())
        }
    }
}

impl From<WorkPoolError> for DomainError {
    fn from(err: WorkPoolError) -> Self {
        DomainError::WorkerFailed(err.to_string())
    }
}

/// Fixed-capacity pool; the ceiling is shared by every batch run through it.
#[derive(Debug, Clone)]
pub struct WorkPool {
    max_workers: usize,
    permits: Arc<Semaphore>,
}

impl WorkPool {
    pub fn new(max_workers: usize) -> Result<Self, WorkPoolError> {
        if max_workers == 0 {
            return Err(WorkPoolError::NoWorkers);
        }
        Ok(Self {
            max_workers,
            permits: Arc::new(Semaphore::new(max_workers)),
        })
    }

    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every unit and collect their outputs.
    ///
    /// Returns as soon as one unit fails; units still queued are never
    /// started and the partial output is dropped. Output order is the order
    /// in which units finished.
    pub async fn run<T, E, F>(&self, works: Vec<F>) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<WorkPoolError> + Send + 'static,
    {
        let total = works.len();
        let mut running: JoinSet<Result<T, E>> = JoinSet::new();
        let mut outputs = Vec::with_capacity(total);

        for work in works {
            let permit = loop {
                tokio::select! {
                    permit = self.permits.clone().acquire_owned() => {
                        break permit.map_err(|_| WorkPoolError::Closed)?;
                    }
                    Some(joined) = running.join_next(), if !running.is_empty() => {
                        outputs.push(Self::finish(joined)?);
                    }
                }
            };

            running.spawn_blocking(move || {
                let _permit = permit;
                work()
            });
        }

        while let Some(joined) = running.join_next().await {
            outputs.push(Self::finish(joined)?);
        }

        debug!(units = total, max_workers = self.max_workers, "work pool batch finished");
        Ok(outputs)
    }

    fn finish<T, E>(joined: Result<Result<T, E>, JoinError>) -> Result<T, E>
    where
        E: From<WorkPoolError>,
    {
        joined.map_err(|e| E::from(WorkPoolError::from(e)))?
    }
}
