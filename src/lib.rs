//! framesift
//!
//! Background-subtraction frame pipeline: ingest a video stream frame by
//! frame, learn the static background, keep only frames whose region of
//! interest shows enough foreground, and persist the surviving frame/mask
//! pairs for offline processing.
//!
//! # Per-frame flow
//!
//! 1. **Fetch**: pull the next frame from the source (end-of-stream and read
//!    faults are distinct outcomes).
//! 2. **Subtract**: fold the frame into the background model, get its mask.
//! 3. **Composite**: zero background pixels in the frame.
//! 4. **Crop + Decide** (region mode): crop frame and mask to the configured
//!    rectangle and keep iff the cropped mask's mean clears the threshold.
//! 5. **Persist**: write the full frame/mask pair to the configured sink.
//!
//! # Module Structure
//!
//! - `frame`: Frame and Mask containers, shape checking
//! - `model`: background models (adaptive running mean, fixed first frame)
//! - `composite`: background zeroing
//! - `region`: region-of-interest bounds and cropping
//! - `decision`: the keep/discard rule
//! - `source`: frame suppliers (synthetic, ffmpeg files)
//! - `sink`: artifact destinations (local PNG directory, S3, in-memory)
//! - `naming`: collision-free artifact stems
//! - `pipeline`: the orchestrator that owns one run
//! - `config`: file + environment configuration

pub mod composite;
pub mod config;
pub mod decision;
pub mod frame;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod region;
pub mod sink;
pub mod source;

pub use composite::apply_mask;
pub use config::{FramesiftConfig, RetentionMode, SinkConfig};
pub use decision::RetentionPolicy;
pub use frame::{Frame, Mask, ShapeMismatch};
pub use model::{create_model, AdaptiveMeanModel, BackgroundModel, FirstFrameModel};
pub use naming::{ArtifactNamer, ArtifactStems};
pub use pipeline::{FramePipeline, PipelineState, RetentionGate, RunReport};
pub use region::RegionOfInterest;
#[cfg(feature = "sink-s3")]
pub use sink::S3Sink;
pub use sink::{create_sink, ArtifactSink, LocalDirSink, MemorySink};
#[cfg(feature = "ingest-ffmpeg")]
pub use source::FfmpegSource;
pub use source::{open_source, FrameSource, SourceStats, StreamInfo, SyntheticSource};
