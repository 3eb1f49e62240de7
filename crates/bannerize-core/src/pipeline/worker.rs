//! The fixed-size worker pool draining the shared queue.
//!
//! Each worker repeatedly pops one item, runs its current stage inside
//! `spawn_blocking` (pixel work is CPU-bound), and re-queues the item if
//! a stage remains. A failing stage drops only its owning item; the
//! units that item would still have executed are forfeited on the latch
//! so the run still terminates after the precomputed count.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::PipelineError;
use crate::types::{SavedCrop, StageFailure, WorkItem};

use super::latch::CountdownLatch;
use super::ops::StageContext;
use super::queue::SharedQueue;
use super::stage::PipelineDefinition;

/// Progress callback: `(units_done, units_total)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Shared state for one run: the queue, the countdown, and the
/// append-only result sinks. The only mutable state workers share.
pub(crate) struct RunState {
    pub queue: SharedQueue<WorkItem>,
    pub latch: CountdownLatch,
    pub total_units: usize,
    pub executed: AtomicUsize,
    pub forfeited: AtomicUsize,
    pub crops: Mutex<Vec<SavedCrop>>,
    pub failures: Mutex<Vec<StageFailure>>,
    pub progress: Option<ProgressFn>,
    progress_gate: Mutex<()>,
}

impl RunState {
    pub fn new(total_units: usize, progress: Option<ProgressFn>) -> Self {
        Self {
            queue: SharedQueue::new(),
            latch: CountdownLatch::new(total_units),
            total_units,
            executed: AtomicUsize::new(0),
            forfeited: AtomicUsize::new(0),
            crops: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            progress,
            progress_gate: Mutex::new(()),
        }
    }

    /// Count down `units` and close the queue when the run is complete.
    fn finish_units(&self, units: usize) {
        let remaining = self.latch.count_down(units);
        if let Some(progress) = &self.progress {
            // Delivery is serialized and the position re-read under the
            // gate, so a later unit's position is never reported before
            // an earlier one's.
            let _gate = self
                .progress_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            progress(self.total_units - self.latch.remaining(), self.total_units);
        }
        if remaining == 0 {
            self.queue.close();
        }
    }
}

/// A fixed set of concurrent workers running the same loop body.
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool of `workers` concurrent workers.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of workers the pool spawns.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Spawn the workers and wait for all of them to exit.
    ///
    /// Workers exit when the latch reaches zero and the queue closes.
    pub(crate) async fn run(
        &self,
        pipeline: Arc<PipelineDefinition>,
        cx: Arc<StageContext>,
        state: Arc<RunState>,
    ) {
        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let pipeline = Arc::clone(&pipeline);
            let cx = Arc::clone(&cx);
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(worker_loop(id, pipeline, cx, state)));
        }
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task join error: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    pipeline: Arc<PipelineDefinition>,
    cx: Arc<StageContext>,
    state: Arc<RunState>,
) {
    tracing::trace!("Worker {} started", id);

    while let Some(item) = state.queue.pop().await {
        let stage_index = item.stage_index;
        let owner = item.name.clone();
        let forfeit_on_failure = item.remaining_units(pipeline.len());

        let Some(stage) = pipeline.stage(stage_index).copied() else {
            // Queued items always satisfy 0 <= stage_index < len; hitting
            // this means the cursor escaped the invariant.
            tracing::error!(
                "Worker {}: item '{}' queued past pipeline end (stage {})",
                id,
                owner,
                stage_index
            );
            state.finish_units(1);
            continue;
        };

        tracing::trace!(
            "Worker {}: stage '{}' ({}/{}) for '{}'",
            id,
            stage.name,
            stage_index + 1,
            pipeline.len(),
            owner
        );

        let blocking_cx = Arc::clone(&cx);
        let outcome =
            tokio::task::spawn_blocking(move || stage.execute(&blocking_cx, item)).await;

        match outcome {
            Ok(Ok((mut item, crops))) => {
                state.executed.fetch_add(1, Ordering::Relaxed);
                if !crops.is_empty() {
                    state
                        .crops
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(crops);
                }
                if item.stage_index + 1 < pipeline.len() {
                    item.stage_index += 1;
                    state.queue.push(item);
                } else {
                    // Pipeline exhausted: the item leaves the system.
                    tracing::debug!("Completed all stages for '{}'", item.name);
                }
                state.finish_units(1);
            }
            Ok(Err(error)) => {
                state.executed.fetch_add(1, Ordering::Relaxed);
                record_failure(&state, stage.name, &error);
                // Drop the item; forfeit its unexecuted units so the
                // countdown still reaches exactly zero.
                let forfeited = forfeit_on_failure.saturating_sub(1);
                state.forfeited.fetch_add(forfeited, Ordering::Relaxed);
                state.finish_units(forfeit_on_failure);
            }
            Err(join_error) => {
                // A panicking stage is reported like any other stage
                // failure, against the owning image.
                state.executed.fetch_add(1, Ordering::Relaxed);
                let error = PipelineError::Stage {
                    image: owner,
                    stage: stage.name.to_string(),
                    message: format!("stage panicked: {}", join_error),
                };
                record_failure(&state, stage.name, &error);
                let forfeited = forfeit_on_failure.saturating_sub(1);
                state.forfeited.fetch_add(forfeited, Ordering::Relaxed);
                state.finish_units(forfeit_on_failure);
            }
        }
    }

    tracing::trace!("Worker {} finished", id);
}

fn record_failure(state: &RunState, stage_name: &str, error: &PipelineError) {
    tracing::error!("{}", error);
    let failure = match error {
        PipelineError::Stage {
            image,
            stage,
            message,
        } => StageFailure {
            image: image.clone(),
            stage: stage.clone(),
            message: message.clone(),
        },
        other => StageFailure {
            image: String::new(),
            stage: stage_name.to_string(),
            message: other.to_string(),
        },
    };
    state
        .failures
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(failure);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_positions_never_step_backwards() {
        let last = Arc::new(Mutex::new(0usize));
        let hook: ProgressFn = {
            let last = Arc::clone(&last);
            Arc::new(move |done, total| {
                assert_eq!(total, 64);
                let mut last = last.lock().unwrap();
                assert!(
                    done >= *last,
                    "position stepped backwards: {done} < {}",
                    *last
                );
                *last = done;
            })
        };

        let state = Arc::new(RunState::new(64, Some(hook)));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let state = Arc::clone(&state);
            handles.push(tokio::spawn(async move {
                for _ in 0..8 {
                    state.finish_units(1);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*last.lock().unwrap(), 64);
    }
}
