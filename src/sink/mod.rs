//! Persistence sinks.
//!
//! A sink stores one frame/mask pair per keep decision, under stems handed to
//! it by the pipeline. Provided sinks:
//! - `local`: PNG artifacts in a directory, written atomically
//! - `s3`: raw-byte uploads to an S3-compatible bucket (feature: sink-s3)
//! - `memory`: in-process capture, for tests and dry runs
//!
//! Sinks are responsible for appending their own extension to the stems and
//! for failing loudly: a failed write is fatal for the run, so no sink
//! retries or drops artifacts silently.

mod local;
mod memory;
#[cfg(feature = "sink-s3")]
mod s3;

pub use local::LocalDirSink;
pub use memory::{MemorySink, StoredPair};
#[cfg(feature = "sink-s3")]
pub use s3::S3Sink;

use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::path::Path;

use crate::config::SinkConfig;
use crate::frame::{Frame, Mask};
use crate::naming::ArtifactStems;

pub const SINK_LOCAL: &str = "local";
pub const SINK_S3: &str = "s3";
pub const SINK_MEMORY: &str = "memory";

/// Destination for kept frame/mask pairs.
pub trait ArtifactSink: Send {
    /// Sink identifier, as selected in configuration.
    fn name(&self) -> &'static str;

    /// Persist one pair. Both artifacts carry the stems' shared timestamp;
    /// either both land or the run fails.
    fn store_pair(&mut self, stems: &ArtifactStems, frame: &Frame, mask: &Mask) -> Result<()>;
}

impl fmt::Debug for dyn ArtifactSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactSink({})", self.name())
    }
}

/// Build a sink from resolved configuration.
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn ArtifactSink>> {
    match config.kind.as_str() {
        SINK_LOCAL => Ok(Box::new(LocalDirSink::new(Path::new(&config.output_dir))?)),
        SINK_MEMORY => Ok(Box::new(MemorySink::new())),
        SINK_S3 => {
            let bucket = config
                .bucket
                .as_deref()
                .ok_or_else(|| anyhow!("the s3 sink requires a bucket name"))?;
            #[cfg(feature = "sink-s3")]
            {
                Ok(Box::new(S3Sink::new(
                    bucket,
                    config.endpoint.as_deref(),
                    &config.region,
                )?))
            }
            #[cfg(not(feature = "sink-s3"))]
            {
                let _ = bucket;
                bail!("the s3 sink requires the sink-s3 feature")
            }
        }
        other => bail!(
            "unknown sink kind '{}' (expected '{}', '{}' or '{}')",
            other,
            SINK_LOCAL,
            SINK_S3,
            SINK_MEMORY
        ),
    }
}
