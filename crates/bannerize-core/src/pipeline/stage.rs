//! Stage descriptors and the per-axis pipeline definitions.
//!
//! A pipeline is an ordered list of stages built once from the axis
//! selector and shared read-only by all workers. Stage dispatch is a
//! tagged variant, not a dynamically-typed function list: a stage is
//! either a pure transform, a terminal batch that persists crops and
//! passes the payload through, or a reset that restores the payload to
//! a fresh decode of the item's original bytes.

use std::path::PathBuf;

use crate::config::Axis;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::types::{SavedCrop, WorkItem};

use super::ops::{self, StageContext};

/// A pure transform: `(name, payload) -> (name, payload)`.
pub type TransformFn = fn(
    &StageContext,
    String,
    image::DynamicImage,
) -> PipelineResult<(String, image::DynamicImage)>;

/// A terminal batch: derives crops from the payload, saves each, and
/// leaves the payload untouched.
pub type BatchFn =
    fn(&StageContext, &str, &str, &image::DynamicImage) -> PipelineResult<Vec<SavedCrop>>;

/// What a stage does when a worker executes it.
#[derive(Debug, Clone, Copy)]
pub enum StageKind {
    /// Pure payload transformation
    Transform(TransformFn),
    /// Derive and persist crops, payload passes through unchanged
    TerminalBatch(BatchFn),
    /// Discard the payload and re-decode the item's original bytes
    Reset,
}

/// One named step of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    /// Stage name, used in logs and error attribution
    pub name: &'static str,
    /// Dispatch tag
    pub kind: StageKind,
}

impl Stage {
    /// Execute this stage against an owned item.
    ///
    /// Possession of the item is established by the caller's queue pop;
    /// nothing here is shared with other workers. Errors are attributed
    /// to the owning image and this stage.
    pub fn execute(
        &self,
        cx: &StageContext,
        item: WorkItem,
    ) -> PipelineResult<(WorkItem, Vec<SavedCrop>)> {
        let owner = item.name.clone();
        self.execute_inner(cx, item).map_err(|e| match e {
            already @ PipelineError::Stage { .. } => already,
            other => PipelineError::Stage {
                image: owner,
                stage: self.name.to_string(),
                message: other.to_string(),
            },
        })
    }

    fn execute_inner(
        &self,
        cx: &StageContext,
        item: WorkItem,
    ) -> PipelineResult<(WorkItem, Vec<SavedCrop>)> {
        match self.kind {
            StageKind::Reset => {
                let WorkItem {
                    name,
                    ext,
                    stage_index,
                    image: _,
                    original,
                } = item;
                let pseudo_path = PathBuf::from(format!("{name}.{ext}"));
                let image = cx.codec.decode(&original, &pseudo_path)?;
                Ok((
                    WorkItem {
                        name,
                        ext,
                        stage_index,
                        image,
                        original,
                    },
                    Vec::new(),
                ))
            }
            StageKind::Transform(f) => {
                let WorkItem {
                    name,
                    ext,
                    stage_index,
                    image,
                    original,
                } = item;
                let (name, image) = f(cx, name, image)?;
                Ok((
                    WorkItem {
                        name,
                        ext,
                        stage_index,
                        image,
                        original,
                    },
                    Vec::new(),
                ))
            }
            StageKind::TerminalBatch(f) => {
                let crops = f(cx, &item.name, &item.ext, &item.image)?;
                Ok((item, crops))
            }
        }
    }
}

/// The ordered, immutable stage list for one run.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    axis: Axis,
    stages: Vec<Stage>,
}

const LOAD: Stage = Stage {
    name: "load",
    kind: StageKind::Reset,
};
const RESET: Stage = Stage {
    name: "reset",
    kind: StageKind::Reset,
};
const SCALE_X: Stage = Stage {
    name: "scale-x",
    kind: StageKind::Transform(ops::scale_x),
};
const SCALE_Y: Stage = Stage {
    name: "scale-y",
    kind: StageKind::Transform(ops::scale_y),
};
const BLUR: Stage = Stage {
    name: "blur",
    kind: StageKind::Transform(ops::blur),
};
const CROP_X: Stage = Stage {
    name: "crop-x",
    kind: StageKind::TerminalBatch(ops::crop_batch_x),
};
const CROP_Y: Stage = Stage {
    name: "crop-y",
    kind: StageKind::TerminalBatch(ops::crop_batch_y),
};

impl PipelineDefinition {
    /// Build the canonical pipeline for an axis selector.
    pub fn for_axis(axis: Axis) -> Self {
        let stages = match axis {
            Axis::X => vec![LOAD, SCALE_X, BLUR, CROP_X],
            Axis::Y => vec![LOAD, SCALE_Y, BLUR, CROP_Y],
            Axis::Both => vec![
                LOAD, SCALE_X, BLUR, CROP_X, RESET, LOAD, SCALE_Y, BLUR, CROP_Y,
            ],
        };
        Self { axis, stages }
    }

    /// Structural sanity checks, run once before any work is scheduled.
    ///
    /// A broken stage list would desynchronize the precomputed unit count
    /// from the work actually performed, so it is a fatal configuration
    /// error rather than a per-item one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline has no stages".into(),
            ));
        }
        let terminals = self
            .stages
            .iter()
            .filter(|s| matches!(s.kind, StageKind::TerminalBatch(_)))
            .count();
        if terminals == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline has no terminal batch stage; no output would be written".into(),
            ));
        }
        if !matches!(
            self.stages[self.stages.len() - 1].kind,
            StageKind::TerminalBatch(_)
        ) {
            return Err(ConfigError::ValidationError(
                "pipeline must end with a terminal batch stage".into(),
            ));
        }
        if self.axis == Axis::Both && terminals < 2 {
            return Err(ConfigError::ValidationError(
                "both-axis pipeline must contain two terminal batch stages".into(),
            ));
        }
        Ok(())
    }

    /// The axis this pipeline was built for.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of stages; one unit of work per stage per image.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline is empty (never true for canonical pipelines).
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stage at a cursor position.
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Crop files each image produces end-to-end (3 per terminal stage).
    pub fn crops_per_image(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.kind, StageKind::TerminalBatch(_)))
            .count()
            * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_axis_pipelines_have_four_stages() {
        assert_eq!(PipelineDefinition::for_axis(Axis::X).len(), 4);
        assert_eq!(PipelineDefinition::for_axis(Axis::Y).len(), 4);
    }

    #[test]
    fn test_both_pipeline_has_nine_stages() {
        let pipeline = PipelineDefinition::for_axis(Axis::Both);
        assert_eq!(pipeline.len(), 9);
        // The x pass is followed by reset + load before the y pass
        assert_eq!(pipeline.stage(4).unwrap().name, "reset");
        assert_eq!(pipeline.stage(5).unwrap().name, "load");
    }

    #[test]
    fn test_pipelines_start_with_load_and_end_with_crop() {
        for axis in [Axis::X, Axis::Y, Axis::Both] {
            let pipeline = PipelineDefinition::for_axis(axis);
            assert_eq!(pipeline.stage(0).unwrap().name, "load");
            assert!(matches!(
                pipeline.stage(pipeline.len() - 1).unwrap().kind,
                StageKind::TerminalBatch(_)
            ));
        }
    }

    #[test]
    fn test_canonical_pipelines_validate() {
        for axis in [Axis::X, Axis::Y, Axis::Both] {
            assert!(PipelineDefinition::for_axis(axis).validate().is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_empty_pipeline() {
        let pipeline = PipelineDefinition {
            axis: Axis::X,
            stages: vec![],
        };
        assert!(pipeline.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_pipeline_without_terminal() {
        let pipeline = PipelineDefinition {
            axis: Axis::X,
            stages: vec![LOAD, SCALE_X, BLUR],
        };
        let err = pipeline.validate().unwrap_err();
        assert!(err.to_string().contains("terminal"));
    }

    #[test]
    fn test_crops_per_image() {
        assert_eq!(PipelineDefinition::for_axis(Axis::X).crops_per_image(), 3);
        assert_eq!(
            PipelineDefinition::for_axis(Axis::Both).crops_per_image(),
            6
        );
    }
}
