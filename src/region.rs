//! Region of interest.
//!
//! A fixed rectangle, configured once per run, that the retention decision
//! looks at. Both the frame and its mask are cropped with the same bounds so
//! the pixel-for-pixel correspondence between them survives the crop.
//!
//! Bounds are validated twice at startup: for internal consistency when the
//! configuration is resolved, and against the stream geometry once the source
//! has reported it. The per-frame crop itself does not re-validate.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::frame::{ensure_same_shape, Frame, Mask, FRAME_CHANNELS};

/// Rectangular crop bounds, half-open: columns `x_min..x_max`, rows
/// `y_min..y_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RegionOfInterest {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl RegionOfInterest {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// Internal consistency: both axes must span a nonzero range.
    pub fn validate(&self) -> Result<()> {
        if self.x_min >= self.x_max {
            bail!(
                "region x bounds invalid: x_min {} must be < x_max {}",
                self.x_min,
                self.x_max
            );
        }
        if self.y_min >= self.y_max {
            bail!(
                "region y bounds invalid: y_min {} must be < y_max {}",
                self.y_min,
                self.y_max
            );
        }
        Ok(())
    }

    /// Check the rectangle fits inside a `width` x `height` frame.
    pub fn validate_within(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        if self.x_max > width || self.y_max > height {
            bail!(
                "region ({}, {}, {}, {}) exceeds {}x{} stream",
                self.x_min,
                self.x_max,
                self.y_min,
                self.y_max,
                width,
                height
            );
        }
        Ok(())
    }

    /// Crop `frame` and `mask` to this rectangle, preserving correspondence.
    ///
    /// Callers have already validated the bounds against the stream geometry;
    /// only the frame/mask shape agreement is checked here.
    pub fn crop(&self, frame: &Frame, mask: &Mask) -> Result<(Frame, Mask)> {
        ensure_same_shape("crop", frame.dims(), mask.dims())?;
        debug_assert!(self.x_max <= frame.width() && self.y_max <= frame.height());

        let region_w = self.width() as usize;
        let src_w = frame.width() as usize;
        let mut frame_out = Vec::with_capacity(region_w * self.height() as usize * FRAME_CHANNELS);
        let mut mask_out = Vec::with_capacity(region_w * self.height() as usize);

        for row in self.y_min..self.y_max {
            let row_base = row as usize * src_w + self.x_min as usize;
            let f_start = row_base * FRAME_CHANNELS;
            frame_out.extend_from_slice(&frame.pixels()[f_start..f_start + region_w * FRAME_CHANNELS]);
            mask_out.extend_from_slice(&mask.values()[row_base..row_base + region_w]);
        }

        Ok((
            Frame::new(frame_out, self.width(), self.height())?,
            Mask::new(mask_out, self.width(), self.height())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity(width as usize * height as usize * FRAME_CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.push(x as u8);
                data.push(y as u8);
                data.push((x + y) as u8);
            }
        }
        Frame::new(data, width, height).unwrap()
    }

    fn gradient_mask(width: u32, height: u32) -> Mask {
        let data: Vec<u8> = (0..width as usize * height as usize)
            .map(|i| (i % 251) as u8)
            .collect();
        Mask::new(data, width, height).unwrap()
    }

    #[test]
    fn crop_dimensions_match_bounds() {
        let frame = gradient_frame(20, 16);
        let mask = gradient_mask(20, 16);
        let roi = RegionOfInterest {
            x_min: 3,
            x_max: 11,
            y_min: 2,
            y_max: 7,
        };
        let (frame_region, mask_region) = roi.crop(&frame, &mask).unwrap();
        assert_eq!(frame_region.dims(), (8, 5));
        assert_eq!(mask_region.dims(), (8, 5));
    }

    #[test]
    fn crop_preserves_pixel_correspondence() {
        let frame = gradient_frame(20, 16);
        let mask = gradient_mask(20, 16);
        let roi = RegionOfInterest {
            x_min: 4,
            x_max: 12,
            y_min: 5,
            y_max: 10,
        };
        let (frame_region, mask_region) = roi.crop(&frame, &mask).unwrap();
        for i in 0..roi.height() {
            for j in 0..roi.width() {
                assert_eq!(
                    mask_region.value(j, i),
                    mask.value(roi.x_min + j, roi.y_min + i)
                );
                assert_eq!(
                    frame_region.pixel(j, i),
                    frame.pixel(roi.x_min + j, roi.y_min + i)
                );
            }
        }
    }

    #[test]
    fn zero_area_region_rejected() {
        let roi = RegionOfInterest {
            x_min: 5,
            x_max: 5,
            y_min: 0,
            y_max: 10,
        };
        assert!(roi.validate().is_err());
    }

    #[test]
    fn region_outside_stream_rejected() {
        let roi = RegionOfInterest {
            x_min: 0,
            x_max: 100,
            y_min: 0,
            y_max: 50,
        };
        assert!(roi.validate_within(99, 50).is_err());
        assert!(roi.validate_within(100, 50).is_ok());
    }

    #[test]
    fn crop_requires_matching_shapes() {
        let frame = gradient_frame(10, 10);
        let mask = gradient_mask(10, 9);
        let roi = RegionOfInterest {
            x_min: 0,
            x_max: 5,
            y_min: 0,
            y_max: 5,
        };
        assert!(roi.crop(&frame, &mask).is_err());
    }
}
