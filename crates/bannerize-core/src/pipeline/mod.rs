//! The queue-driven banner processing pipeline.
//!
//! Components, leaves first:
//! - **codec**: decode source bytes, persist crops
//! - **discovery**: find source images (non-recursive)
//! - **ops**: the stage bodies (scale, blur, band crops)
//! - **stage**: stage descriptors and per-axis pipeline definitions
//! - **queue**: the shared FIFO between scheduler and workers
//! - **latch**: countdown for exact-unit termination
//! - **worker**: the fixed-size pool executing one stage per pop
//! - **scheduler**: seeds the queue and drives a whole run

pub mod codec;
pub mod discovery;
pub mod latch;
pub mod ops;
pub mod queue;
pub mod scheduler;
pub mod stage;
pub mod worker;

// Re-exports for convenient access
pub use codec::Codec;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use latch::CountdownLatch;
pub use ops::StageContext;
pub use queue::SharedQueue;
pub use scheduler::Scheduler;
pub use stage::{PipelineDefinition, Stage, StageKind};
pub use worker::{ProgressFn, WorkerPool};
