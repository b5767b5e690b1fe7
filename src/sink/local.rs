//! Local directory sink.
//!
//! Encodes the frame as RGB PNG and the mask as grayscale PNG, then writes
//! each artifact atomically: bytes go to a sibling temp file first and the
//! final name appears only via rename, so a failed run never leaves a
//! truncated artifact under a final name.

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::frame::{Frame, Mask};
use crate::naming::ArtifactStems;
use crate::sink::{ArtifactSink, SINK_LOCAL};

pub struct LocalDirSink {
    dir: PathBuf,
    artifacts_written: u64,
}

impl LocalDirSink {
    /// Create the sink, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            artifacts_written: 0,
        })
    }

    pub fn artifacts_written(&self) -> u64 {
        self.artifacts_written
    }

    fn write_png(&mut self, stem: &str, png: &[u8]) -> Result<()> {
        let path = self.dir.join(format!("{}.png", stem));
        write_atomic(&path, png)
            .with_context(|| format!("persist artifact '{}'", path.display()))?;
        self.artifacts_written += 1;
        Ok(())
    }
}

impl ArtifactSink for LocalDirSink {
    fn name(&self) -> &'static str {
        SINK_LOCAL
    }

    fn store_pair(&mut self, stems: &ArtifactStems, frame: &Frame, mask: &Mask) -> Result<()> {
        let frame_png = encode_png(
            frame.pixels(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .context("encode frame png")?;
        let mask_png = encode_png(
            mask.values(),
            mask.width(),
            mask.height(),
            ExtendedColorType::L8,
        )
        .context("encode mask png")?;

        self.write_png(&stems.frame, &frame_png)?;
        self.write_png(&stems.mask, &mask_png)?;
        Ok(())
    }
}

fn encode_png(data: &[u8], width: u32, height: u32, color: ExtendedColorType) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(data, width, height, color)?;
    Ok(out)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}
