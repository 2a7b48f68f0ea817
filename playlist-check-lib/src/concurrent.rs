//! Bounded-concurrency batch execution.
//!
//! All probes of a batch run on the caller's task: `buffer_unordered` keeps
//! at most `max_concurrency` probe futures alive, polls them cooperatively and
//! pulls the next pending target from the queue as soon as one completes.
//! There is no worker thread, so the pending queue, in-flight set and outcome
//! collection are only touched at completion points.

use crate::types::{ProbeOutcome, ProbeTarget};
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;

/// Running completion counter handed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Outcomes received so far, including the current one
    pub completed: usize,
    /// Size of the batch
    pub total: usize,
}

/// Runs a probe function over a target list under a fixed admission cap.
#[derive(Debug, Clone)]
pub struct ConcurrentProcessor {
    max_concurrency: usize,
}

impl ConcurrentProcessor {
    /// Create a new concurrent processor.
    ///
    /// A cap of 0 is treated as 1 (strictly sequential).
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// The admission cap.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Yield outcomes as probes complete.
    ///
    /// Targets are admitted in FIFO order; output order is completion order.
    pub fn stream<F, Fut>(
        &self,
        targets: Vec<ProbeTarget>,
        probe: F,
    ) -> impl Stream<Item = ProbeOutcome>
    where
        F: FnMut(ProbeTarget) -> Fut,
        Fut: Future<Output = ProbeOutcome>,
    {
        stream::iter(targets)
            .map(probe)
            .buffer_unordered(self.max_concurrency)
    }

    /// Probe every target exactly once and collect outcomes in completion order.
    pub async fn run_batch<F, Fut>(&self, targets: Vec<ProbeTarget>, probe: F) -> Vec<ProbeOutcome>
    where
        F: FnMut(ProbeTarget) -> Fut,
        Fut: Future<Output = ProbeOutcome>,
    {
        self.run_batch_with_progress(targets, probe, |_, _| {}).await
    }

    /// Like [`run_batch`](Self::run_batch), invoking `on_complete` once per
    /// finished probe with the running counter.
    pub async fn run_batch_with_progress<F, Fut, C>(
        &self,
        targets: Vec<ProbeTarget>,
        probe: F,
        mut on_complete: C,
    ) -> Vec<ProbeOutcome>
    where
        F: FnMut(ProbeTarget) -> Fut,
        Fut: Future<Output = ProbeOutcome>,
        C: FnMut(Progress, &ProbeOutcome),
    {
        let total = targets.len();
        let mut outcomes = Vec::with_capacity(total);
        if total == 0 {
            return outcomes;
        }

        tracing::info!(
            total,
            concurrency = self.max_concurrency,
            "starting probe batch"
        );

        let mut pending = std::pin::pin!(self.stream(targets, probe));
        while let Some(outcome) = pending.next().await {
            let progress = Progress {
                completed: outcomes.len() + 1,
                total,
            };
            on_complete(progress, &outcome);
            outcomes.push(outcome);
        }

        tracing::info!(completed = outcomes.len(), "probe batch finished");
        outcomes
    }
}
