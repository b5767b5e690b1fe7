//! Frame and mask containers.
//!
//! - `Frame`: owned RGB24 pixel grid; width x height are fixed for a run.
//! - `Mask`: owned 8-bit foreground mask with the same geometry as its frame
//!   (0 = background, nonzero = foreground).
//! - `ShapeMismatch`: typed error for any stage where the two disagree.
//!
//! Dimensions are checked wherever a frame meets a mask. A mismatch is a
//! programming or configuration error, never a recoverable runtime condition,
//! so every checked stage fails the whole run.

use anyhow::{bail, Result};
use std::fmt;

/// Bytes per pixel. All frames flowing through the pipeline are RGB24.
pub const FRAME_CHANNELS: usize = 3;

// ----------------------------------------------------------------------------
// ShapeMismatch
// ----------------------------------------------------------------------------

/// Frame/mask geometry disagreement, tagged with the stage that caught it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub stage: &'static str,
    pub expected: (u32, u32),
    pub actual: (u32, u32),
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shape mismatch at {}: expected {}x{}, got {}x{}",
            self.stage, self.expected.0, self.expected.1, self.actual.0, self.actual.1
        )
    }
}

impl std::error::Error for ShapeMismatch {}

/// Check two width/height pairs, naming the stage on failure.
pub fn ensure_same_shape(
    stage: &'static str,
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), ShapeMismatch> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShapeMismatch {
            stage,
            expected,
            actual,
        })
    }
}

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One decoded video frame. Pixels are tightly packed RGB24, row-major.
///
/// The pipeline owns exactly one frame at a time; the compositor mutates it
/// in place and nothing aliases it across iterations.
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap a pixel buffer. The buffer length must be exactly
    /// `width * height * FRAME_CHANNELS`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * FRAME_CHANNELS;
        if data.len() != expected {
            bail!(
                "frame buffer length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                FRAME_CHANNELS
            );
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (not bytes).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// RGB triple at (x, y). Callers must stay in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; FRAME_CHANNELS] {
        let idx = (y as usize * self.width as usize + x as usize) * FRAME_CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

// ----------------------------------------------------------------------------
// Mask
// ----------------------------------------------------------------------------

/// Foreground mask produced by a background model. One byte per pixel.
#[derive(Debug)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    /// Wrap a mask buffer. The buffer length must be exactly `width * height`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            bail!(
                "mask buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            );
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// All-zero mask of the given geometry.
    pub fn zeroed(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[u8] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Mask byte at (x, y). Callers must stay in bounds.
    pub fn value(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
