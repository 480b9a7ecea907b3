//! Bounded access to engines with a fixed number of workers.
//!
//! Some engines expose a single worker resource that cannot take concurrent
//! jobs. [`SerializedEngine`] queues callers on a semaphore so at most
//! `workers` recognitions run at once; the rest wait their turn.

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use super::{EngineConfig, OcrEngine, OcrError, RawOcrLine, Result};

/// Wraps an engine and limits how many calls run concurrently.
pub struct SerializedEngine<E> {
    inner: E,
    permits: Semaphore,
    workers: usize,
}

impl<E: OcrEngine> SerializedEngine<E> {
    /// One call at a time.
    pub fn new(inner: E) -> Self {
        Self::with_workers(inner, 1)
    }

    /// At most `workers` calls at a time (minimum 1).
    pub fn with_workers(inner: E, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            inner,
            permits: Semaphore::new(workers),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: OcrEngine> OcrEngine for SerializedEngine<E> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn recognize(&self, image: &[u8], config: &EngineConfig) -> Result<Vec<RawOcrLine>> {
        // Dropping this future while queued gives up the place in line; dropping it
        // while running releases the permit with the abandoned call.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OcrError::WorkerClosed)?;
        debug!(
            "{} worker acquired ({} available)",
            self.inner.name(),
            self.permits.available_permits()
        );
        self.inner.recognize(image, config).await
    }
}
