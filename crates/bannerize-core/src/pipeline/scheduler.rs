//! Run orchestration: discovery, seeding, exact-count scheduling.
//!
//! The scheduler decodes every discovered image once, seeds the queue
//! with one item per image at stage 0, and computes the exact number of
//! stage executions (`images x pipeline length`) before any worker
//! starts. That count is an exactness requirement: under-counting would
//! silently truncate images with pending stages, over-counting would
//! leave workers blocked on pops that can never be satisfied.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use std::time::Instant;

use crate::config::Config;
use crate::error::{BannerError, PipelineError, PipelineResult, Result};
use crate::types::{RunReport, WorkItem};

use super::codec::Codec;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::ops::StageContext;
use super::stage::PipelineDefinition;
use super::worker::{ProgressFn, RunState, WorkerPool};

/// Drives one batch run end to end.
///
/// Built from configuration; holds no mutable state between runs. The
/// pipeline definition and queue handle are constructed here and handed
/// to the worker pool explicitly.
pub struct Scheduler {
    config: Config,
    pipeline: Arc<PipelineDefinition>,
    discovery: FileDiscovery,
    codec: Codec,
    progress: Option<ProgressFn>,
}

impl Scheduler {
    /// Create a scheduler for the configured axis.
    ///
    /// Fails up front if the pipeline definition is structurally broken;
    /// a miscounted stage list must never reach the workers.
    pub fn new(config: Config) -> Result<Self> {
        let pipeline = PipelineDefinition::for_axis(config.banner.axis);
        pipeline.validate()?;

        let discovery = FileDiscovery::new(config.processing.clone());
        let codec = Codec::new(config.limits.clone());

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            discovery,
            codec,
            progress: None,
        })
    }

    /// Attach a progress callback invoked after every stage execution
    /// with `(units_done, units_total)`.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The pipeline this scheduler will run.
    pub fn pipeline(&self) -> &PipelineDefinition {
        &self.pipeline
    }

    /// Process every supported image in `input`, writing crops to
    /// `output`. Returns a report covering the whole batch.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunReport> {
        if !input.is_dir() {
            return Err(BannerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input directory not found: {}", input.display()),
            )));
        }
        tokio::fs::create_dir_all(output).await?;

        let files = self.discovery.discover(input);
        let mut report = RunReport {
            discovered: files.len(),
            ..RunReport::default()
        };
        if files.is_empty() {
            tracing::warn!("No supported image files found in {:?}", input);
            return Ok(report);
        }
        tracing::info!(
            "Found {} image(s); axis={}, {} stage(s) each",
            files.len(),
            self.pipeline.axis(),
            self.pipeline.len()
        );

        // Decode every source once. Unreadable files are dropped here,
        // before their item ever enters the queue.
        let mut items = Vec::with_capacity(files.len());
        for file in &files {
            match self.seed_item(file).await {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::error!("Dropping {:?}: {}", file.path, e);
                    report.decode_failures += 1;
                }
            }
        }
        report.seeded = items.len();
        if items.is_empty() {
            return Ok(report);
        }

        let total_units = items.len() * self.pipeline.len();
        tracing::debug!(
            "Scheduling exactly {} stage executions across {} worker(s)",
            total_units,
            self.config.worker_count()
        );

        let state = Arc::new(RunState::new(total_units, self.progress.clone()));
        for item in items {
            state.queue.push(item);
        }

        let cx = Arc::new(StageContext {
            banner: self.config.banner.clone(),
            output_dir: output.to_path_buf(),
            codec: self.codec.clone(),
        });

        let start = Instant::now();
        let pool = WorkerPool::new(self.config.worker_count());
        pool.run(Arc::clone(&self.pipeline), cx, Arc::clone(&state))
            .await;
        report.elapsed = start.elapsed();

        // Drain check: the precomputed count must have exhausted the
        // queue exactly, minus units forfeited by dropped items.
        let executed = state.executed.load(Ordering::Relaxed);
        let forfeited = state.forfeited.load(Ordering::Relaxed);
        let queued = state.queue.len();
        if executed + forfeited != total_units || queued != 0 {
            return Err(PipelineError::Miscount {
                expected: total_units,
                executed,
                queued,
            }
            .into());
        }
        report.executed_units = executed;

        report.crops = std::mem::take(
            &mut *state
                .crops
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        report.stage_failures = std::mem::take(
            &mut *state
                .failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        tracing::info!(
            "Run complete: {} crop(s) written, {} decode failure(s), {} stage failure(s) in {:.1?}",
            report.crops.len(),
            report.decode_failures,
            report.stage_failures.len(),
            report.elapsed
        );
        Ok(report)
    }

    /// Read and decode one source file into a seeded work item.
    async fn seed_item(&self, file: &DiscoveredFile) -> PipelineResult<WorkItem> {
        self.codec.check_file_size(&file.path, file.size)?;

        let bytes =
            tokio::fs::read(&file.path)
                .await
                .map_err(|e| PipelineError::Decode {
                    path: file.path.clone(),
                    message: format!("read failed: {}", e),
                })?;
        let original = Arc::new(bytes);

        let codec = self.codec.clone();
        let path = file.path.clone();
        let decode_bytes = Arc::clone(&original);
        let image = tokio::task::spawn_blocking(move || codec.decode(&decode_bytes, &path))
            .await
            .map_err(|e| PipelineError::Decode {
                path: file.path.clone(),
                message: format!("decode task join error: {}", e),
            })??;

        let name = file
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let ext = file
            .path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("jpg")
            .to_lowercase();

        Ok(WorkItem::new(name, ext, image, original))
    }
}
