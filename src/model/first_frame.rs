//! Fixed-reference background model.
//!
//! Treats the first frame as the background and masks any pixel that later
//! deviates from it beyond the threshold. No adaptation, so it only suits
//! static scenes and deterministic tests; the adaptive model is the default.

use anyhow::Result;

use crate::frame::{Frame, Mask, FRAME_CHANNELS};
use crate::model::{
    establish_dims, luma, BackgroundModel, DEFAULT_DEVIATION_THRESHOLD, MODEL_FIRST_FRAME,
};

pub struct FirstFrameModel {
    deviation_threshold: f32,
    reference: Vec<f32>,
    dims: Option<(u32, u32)>,
}

impl FirstFrameModel {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_DEVIATION_THRESHOLD)
    }

    pub fn with_threshold(deviation_threshold: f32) -> Self {
        Self {
            deviation_threshold,
            reference: Vec::new(),
            dims: None,
        }
    }
}

impl Default for FirstFrameModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundModel for FirstFrameModel {
    fn name(&self) -> &'static str {
        MODEL_FIRST_FRAME
    }

    fn update(&mut self, frame: &Frame) -> Result<Mask> {
        let first = self.dims.is_none();
        establish_dims(&mut self.dims, frame)?;

        if first {
            self.reference = frame
                .pixels()
                .chunks_exact(FRAME_CHANNELS)
                .map(luma)
                .collect();
            return Ok(Mask::zeroed(frame.width(), frame.height()));
        }

        let mut mask = vec![0u8; frame.pixel_count()];
        for (i, rgb) in frame.pixels().chunks_exact(FRAME_CHANNELS).enumerate() {
            if (luma(rgb) - self.reference[i]).abs() > self.deviation_threshold {
                mask[i] = 255;
            }
        }
        Mask::new(mask, frame.width(), frame.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_pixel(width: u32, height: u32, base: u8, x: u32, y: u32, value: u8) -> Frame {
        let mut data = vec![base; width as usize * height as usize * FRAME_CHANNELS];
        let idx = (y as usize * width as usize + x as usize) * FRAME_CHANNELS;
        data[idx..idx + FRAME_CHANNELS].fill(value);
        Frame::new(data, width, height).unwrap()
    }

    #[test]
    fn masks_only_the_changed_pixel() {
        let mut model = FirstFrameModel::new();
        let background = frame_with_pixel(6, 6, 50, 0, 0, 50);
        model.update(&background).unwrap();

        let with_object = frame_with_pixel(6, 6, 50, 3, 2, 220);
        let mask = model.update(&with_object).unwrap();

        for y in 0..6 {
            for x in 0..6 {
                let expected = if (x, y) == (3, 2) { 255 } else { 0 };
                assert_eq!(mask.value(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn reference_never_adapts() {
        let mut model = FirstFrameModel::new();
        model.update(&frame_with_pixel(4, 4, 40, 0, 0, 40)).unwrap();
        // The change persists for many frames and is still flagged.
        for _ in 0..20 {
            let mask = model
                .update(&frame_with_pixel(4, 4, 40, 1, 1, 200))
                .unwrap();
            assert_eq!(mask.value(1, 1), 255);
        }
    }
}
