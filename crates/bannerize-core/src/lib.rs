//! bannerize-core - queue-driven banner crop pipeline.
//!
//! Scales, blurs, and band-crops source images through an ordered stage
//! pipeline. Every stage transition is re-queued as an independent unit
//! of work on a shared FIFO and consumed by a fixed-size worker pool, so
//! the pool interleaves stages of many images instead of running one
//! monolithic job per image.
//!
//! # Architecture
//!
//! ```text
//! Scheduler ─ seeds ─▶ SharedQueue ◀─ pop / advance / push ─ WorkerPool
//!                                                              │
//!                                        terminal stages ─▶ crops on disk
//! ```
//!
//! The scheduler computes the exact number of stage executions up front
//! (`images x pipeline length`) and the run ends when a countdown latch
//! reaches zero, never on queue-empty detection.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bannerize_core::{Config, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> bannerize_core::Result<()> {
//!     let config = Config::load()?;
//!     let scheduler = Scheduler::new(config)?;
//!     let report = scheduler.run("./images".as_ref(), "./processed_images".as_ref()).await?;
//!     println!("{} crops written", report.crops_written());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::{Axis, Config};
pub use error::{BannerError, ConfigError, PipelineError, PipelineResult, Result};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{PipelineDefinition, ProgressFn, Scheduler, SharedQueue, WorkerPool};
pub use types::{RunReport, SavedCrop, StageFailure, WorkItem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_scheduler_from_default_config() {
        let scheduler = Scheduler::new(Config::default()).unwrap();
        assert_eq!(scheduler.pipeline().len(), 4);
    }
}
