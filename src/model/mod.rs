//! Background models.
//!
//! A background model consumes frames in strict temporal order and emits one
//! foreground mask per frame. Models are stateful: every update folds the
//! frame into the model's statistics whether or not the frame is later kept,
//! and skipping or reordering frames degrades the statistics without raising
//! an error.
//!
//! The first update establishes the stream geometry; any later frame with
//! different dimensions is a fatal shape mismatch.
//!
//! Model lifecycle is exactly one pipeline run. There is no reset; a new run
//! constructs a new model.

mod adaptive_mean;
mod first_frame;

pub use adaptive_mean::{AdaptiveMeanModel, DEFAULT_DEVIATION_THRESHOLD, DEFAULT_LEARNING_RATE};
pub use first_frame::FirstFrameModel;

use anyhow::{anyhow, Result};
use std::fmt;

use crate::frame::{ensure_same_shape, Frame, Mask, ShapeMismatch};

pub const MODEL_ADAPTIVE_MEAN: &str = "adaptive-mean";
pub const MODEL_FIRST_FRAME: &str = "first-frame";

/// Adaptive background-subtraction model.
pub trait BackgroundModel: Send {
    /// Model identifier, as selected in configuration.
    fn name(&self) -> &'static str;

    /// Fold one frame into the model and return its foreground mask.
    ///
    /// The returned mask always has the frame's geometry. Calls must follow
    /// the video's frame order; the model trusts the caller on this.
    fn update(&mut self, frame: &Frame) -> Result<Mask>;
}

impl fmt::Debug for dyn BackgroundModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackgroundModel({})", self.name())
    }
}

/// Construct a model by its configured name.
pub fn create_model(kind: &str) -> Result<Box<dyn BackgroundModel>> {
    match kind {
        MODEL_ADAPTIVE_MEAN => Ok(Box::new(AdaptiveMeanModel::default())),
        MODEL_FIRST_FRAME => Ok(Box::new(FirstFrameModel::new())),
        other => Err(anyhow!(
            "unknown background model '{}' (expected '{}' or '{}')",
            other,
            MODEL_ADAPTIVE_MEAN,
            MODEL_FIRST_FRAME
        )),
    }
}

/// First call pins the stream geometry; later calls must match it.
pub(crate) fn establish_dims(
    slot: &mut Option<(u32, u32)>,
    frame: &Frame,
) -> Result<(), ShapeMismatch> {
    match *slot {
        Some(dims) => ensure_same_shape("model update", dims, frame.dims()),
        None => {
            *slot = Some(frame.dims());
            Ok(())
        }
    }
}

/// Mean intensity of one RGB pixel.
pub(crate) fn luma(rgb: &[u8]) -> f32 {
    (rgb[0] as f32 + rgb[1] as f32 + rgb[2] as f32) / 3.0
}
