//! Core data types circulating through the pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// The unit of work circulating through the shared queue.
///
/// One item is tied to one source image and one progress cursor. The
/// decoded `image` payload is owned exclusively by whichever worker
/// currently holds the item; ownership transfers at each queue pop.
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Base name of the source file, without extension
    pub name: String,

    /// Source file extension, without the leading dot
    pub ext: String,

    /// Cursor into the pipeline definition; the next stage to execute
    pub stage_index: usize,

    /// Current decoded payload
    pub image: DynamicImage,

    /// Immutable snapshot of the source bytes, kept for the lifetime of
    /// the item so reset stages can re-decode from scratch. Never mutated.
    pub original: Arc<Vec<u8>>,
}

impl WorkItem {
    /// Create a new item at stage 0.
    pub fn new(name: String, ext: String, image: DynamicImage, original: Arc<Vec<u8>>) -> Self {
        Self {
            name,
            ext,
            stage_index: 0,
            image,
            original,
        }
    }

    /// Number of pipeline units this item still owes, counting the stage
    /// at the current cursor.
    pub fn remaining_units(&self, pipeline_len: usize) -> usize {
        pipeline_len.saturating_sub(self.stage_index)
    }
}

/// Manifest record for one crop written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedCrop {
    /// Base name of the source image
    pub source: String,

    /// Path the crop was written to
    pub path: PathBuf,

    /// Crop width in pixels
    pub width: u32,

    /// Crop height in pixels
    pub height: u32,
}

/// A stage failure attributed to its owning image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageFailure {
    /// Base name of the owning image
    pub image: String,

    /// Name of the stage that failed
    pub stage: String,

    /// Error message
    pub message: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Files found in the source directory
    pub discovered: usize,

    /// Images decoded and seeded into the queue
    pub seeded: usize,

    /// Files that failed to decode (dropped before queueing)
    pub decode_failures: usize,

    /// Stage executions performed (equals seeded x pipeline length when
    /// no stage failed)
    pub executed_units: usize,

    /// Crops written, in completion order
    pub crops: Vec<SavedCrop>,

    /// Per-item stage failures
    pub stage_failures: Vec<StageFailure>,

    /// Wall-clock duration of the queue/worker phase
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of crop files written.
    pub fn crops_written(&self) -> usize {
        self.crops.len()
    }

    /// Whether every seeded image ran to completion.
    pub fn fully_succeeded(&self) -> bool {
        self.decode_failures == 0 && self.stage_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_starts_at_stage_zero() {
        let item = WorkItem::new(
            "photo".to_string(),
            "jpg".to_string(),
            DynamicImage::new_rgb8(4, 4),
            Arc::new(vec![]),
        );
        assert_eq!(item.stage_index, 0);
        assert_eq!(item.remaining_units(4), 4);
    }

    #[test]
    fn test_remaining_units_saturates() {
        let mut item = WorkItem::new(
            "photo".to_string(),
            "jpg".to_string(),
            DynamicImage::new_rgb8(4, 4),
            Arc::new(vec![]),
        );
        item.stage_index = 9;
        assert_eq!(item.remaining_units(9), 0);
        assert_eq!(item.remaining_units(4), 0);
    }

    #[test]
    fn test_saved_crop_serializes() {
        let crop = SavedCrop {
            source: "photo".to_string(),
            path: PathBuf::from("out/photo-top.jpg"),
            width: 1500,
            height: 300,
        };
        let json = serde_json::to_string(&crop).unwrap();
        assert!(json.contains("photo-top.jpg"));
        let back: SavedCrop = serde_json::from_str(&json).unwrap();
        assert_eq!(back, crop);
    }
}
