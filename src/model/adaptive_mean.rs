//! Exponentially-weighted running-mean background model.
//!
//! Keeps one running mean intensity per pixel. A pixel whose current
//! intensity deviates from its mean by more than the deviation threshold is
//! foreground; afterwards the mean absorbs a `learning_rate` fraction of the
//! new intensity, so persistent changes fade into the background over time.

use anyhow::Result;

use crate::frame::{Frame, Mask, FRAME_CHANNELS};
use crate::model::{establish_dims, luma, BackgroundModel, MODEL_ADAPTIVE_MEAN};

/// Fraction of each new intensity folded into the running mean.
pub const DEFAULT_LEARNING_RATE: f32 = 0.05;

/// Intensity deviation (0..255 scale) beyond which a pixel is foreground.
pub const DEFAULT_DEVIATION_THRESHOLD: f32 = 25.0;

pub struct AdaptiveMeanModel {
    learning_rate: f32,
    deviation_threshold: f32,
    means: Vec<f32>,
    dims: Option<(u32, u32)>,
}

impl AdaptiveMeanModel {
    pub fn new(learning_rate: f32, deviation_threshold: f32) -> Self {
        Self {
            learning_rate,
            deviation_threshold,
            means: Vec::new(),
            dims: None,
        }
    }
}

impl Default for AdaptiveMeanModel {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, DEFAULT_DEVIATION_THRESHOLD)
    }
}

impl BackgroundModel for AdaptiveMeanModel {
    fn name(&self) -> &'static str {
        MODEL_ADAPTIVE_MEAN
    }

    fn update(&mut self, frame: &Frame) -> Result<Mask> {
        let first = self.dims.is_none();
        establish_dims(&mut self.dims, frame)?;

        if first {
            // Seed the statistics; nothing deviates from a model it defines.
            self.means = frame
                .pixels()
                .chunks_exact(FRAME_CHANNELS)
                .map(luma)
                .collect();
            return Ok(Mask::zeroed(frame.width(), frame.height()));
        }

        let mut mask = vec![0u8; frame.pixel_count()];
        for (i, rgb) in frame.pixels().chunks_exact(FRAME_CHANNELS).enumerate() {
            let intensity = luma(rgb);
            let mean = self.means[i];
            if (intensity - mean).abs() > self.deviation_threshold {
                mask[i] = 255;
            }
            // Classify against the pre-update mean, then adapt.
            self.means[i] = mean + self.learning_rate * (intensity - mean);
        }
        Mask::new(mask, frame.width(), frame.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(
            vec![value; width as usize * height as usize * FRAME_CHANNELS],
            width,
            height,
        )
        .unwrap()
    }

    #[test]
    fn first_update_yields_empty_mask() {
        let mut model = AdaptiveMeanModel::default();
        let mask = model.update(&flat_frame(8, 6, 120)).unwrap();
        assert_eq!(mask.dims(), (8, 6));
        assert!(mask.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn static_scene_stays_background() {
        let mut model = AdaptiveMeanModel::default();
        for _ in 0..10 {
            let mask = model.update(&flat_frame(4, 4, 90)).unwrap();
            assert!(mask.values().iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn sudden_change_is_foreground() {
        let mut model = AdaptiveMeanModel::default();
        model.update(&flat_frame(4, 4, 30)).unwrap();
        let mask = model.update(&flat_frame(4, 4, 200)).unwrap();
        assert!(mask.values().iter().all(|&v| v == 255));
    }

    #[test]
    fn persistent_change_fades_into_background() {
        let mut model = AdaptiveMeanModel::new(0.2, 25.0);
        model.update(&flat_frame(2, 2, 30)).unwrap();
        // Hold the new intensity until the running mean absorbs it.
        let mut absorbed = false;
        for _ in 0..60 {
            let mask = model.update(&flat_frame(2, 2, 200)).unwrap();
            if mask.values().iter().all(|&v| v == 0) {
                absorbed = true;
                break;
            }
        }
        assert!(absorbed, "running mean never absorbed the persistent change");
    }

    #[test]
    fn dimension_change_mid_run_fails() {
        let mut model = AdaptiveMeanModel::default();
        model.update(&flat_frame(4, 4, 10)).unwrap();
        let err = model.update(&flat_frame(4, 5, 10)).unwrap_err();
        assert!(err.to_string().contains("model update"));
    }
}
