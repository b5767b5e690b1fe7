//! Frame sources.
//!
//! A source yields decoded RGB24 frames in stream order. The read contract is
//! tagged: `Ok(Some(frame))` is a frame, `Ok(None)` is normal end-of-stream,
//! `Err` is a read fault. The pipeline treats end-of-stream as clean
//! completion and a fault as fatal; sources never conflate the two.
//!
//! Provided sources:
//! - `synthetic://` deterministic generator (no video stack required)
//! - local video files via ffmpeg (feature: ingest-ffmpeg)
//!
//! Sources are responsible for:
//! - Decoding to tightly packed RGB24
//! - Reporting stream geometry and a basename for artifact naming at connect
//! - Counting frames for progress logging
//!
//! Sources do not decimate, reorder, or retry; the background model depends
//! on seeing every frame once, in order.

#[cfg(feature = "ingest-ffmpeg")]
mod file_ffmpeg;
mod synthetic;

#[cfg(feature = "ingest-ffmpeg")]
pub use file_ffmpeg::FfmpegSource;
pub use synthetic::SyntheticSource;

use anyhow::{bail, Result};

use crate::frame::Frame;

/// Scheme prefix selecting the synthetic generator.
pub const SYNTHETIC_SCHEME: &str = "synthetic://";

/// What a source knows about its stream once opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Basename for artifact stems (file stem for files, "synthetic" for the
    /// generator).
    pub basename: String,
}

/// Read-side counters for progress logging.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_read: u64,
    pub source: String,
}

/// Sequential frame supplier for one pipeline run.
pub trait FrameSource: Send {
    /// Open the stream and report its geometry. Called once, before the
    /// first `next_frame`.
    fn connect(&mut self) -> Result<StreamInfo>;

    /// Pull the next frame. `Ok(None)` means the stream ended normally;
    /// `Err` means the source faulted and the run must stop.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn stats(&self) -> SourceStats;
}

/// Build a source from a configured path or scheme.
pub fn open_source(source: &str) -> Result<Box<dyn FrameSource>> {
    if source.trim().is_empty() {
        bail!("source path is empty");
    }
    if source.starts_with(SYNTHETIC_SCHEME) {
        return Ok(Box::new(SyntheticSource::parse(source)?));
    }
    if source.contains("://") {
        bail!(
            "unsupported source scheme in '{}' (expected a local path or {})",
            source,
            SYNTHETIC_SCHEME
        );
    }
    #[cfg(feature = "ingest-ffmpeg")]
    {
        Ok(Box::new(FfmpegSource::new(source)))
    }
    #[cfg(not(feature = "ingest-ffmpeg"))]
    {
        bail!("local video files require the ingest-ffmpeg feature")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_scheme_dispatches() {
        let mut source = open_source("synthetic://8x8?frames=2").unwrap();
        let info = source.connect().unwrap();
        assert_eq!((info.width, info.height), (8, 8));
        assert_eq!(info.basename, "synthetic");
    }

    #[test]
    fn foreign_schemes_rejected() {
        assert!(open_source("http://camera.local/stream").is_err());
        assert!(open_source("rtsp://10.0.0.2/live").is_err());
    }

    #[test]
    fn empty_source_rejected() {
        assert!(open_source("").is_err());
        assert!(open_source("   ").is_err());
    }
}
