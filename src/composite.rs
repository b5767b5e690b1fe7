//! Mask compositor.
//!
//! Applies a foreground mask to a frame in place: every pixel whose mask byte
//! is 0 is forced to 0 on all channels, every pixel whose mask byte is nonzero
//! is left exactly as decoded. Geometry is checked up front and a mismatch
//! fails the run.

use anyhow::Result;

use crate::frame::{ensure_same_shape, Frame, Mask, FRAME_CHANNELS};

/// Zero out background pixels in `frame` according to `mask`.
///
/// After this returns, `frame[p] == 0` wherever `mask[p] == 0` and is
/// unchanged wherever `mask[p] != 0`.
pub fn apply_mask(frame: &mut Frame, mask: &Mask) -> Result<()> {
    ensure_same_shape("composite", frame.dims(), mask.dims())?;
    let pixels = frame.pixels_mut();
    for (i, &m) in mask.values().iter().enumerate() {
        if m == 0 {
            let base = i * FRAME_CHANNELS;
            pixels[base..base + FRAME_CHANNELS].fill(0);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_filled(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(
            vec![value; width as usize * height as usize * FRAME_CHANNELS],
            width,
            height,
        )
        .unwrap()
    }

    #[test]
    fn zero_mask_byte_zeroes_all_channels() {
        let mut frame = frame_filled(4, 4, 200);
        let mut mask = Mask::zeroed(4, 4);
        // foreground only at (1, 2) and (3, 0)
        mask.values_mut()[2 * 4 + 1] = 255;
        mask.values_mut()[3] = 7;

        apply_mask(&mut frame, &mask).unwrap();

        for y in 0..4 {
            for x in 0..4 {
                let expected = if (x, y) == (1, 2) || (x, y) == (3, 0) {
                    [200, 200, 200]
                } else {
                    [0, 0, 0]
                };
                assert_eq!(frame.pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn all_foreground_mask_leaves_frame_untouched() {
        let mut frame = frame_filled(3, 3, 42);
        let mask = Mask::new(vec![1u8; 9], 3, 3).unwrap();
        apply_mask(&mut frame, &mask).unwrap();
        assert!(frame.pixels().iter().all(|&b| b == 42));
    }

    #[test]
    fn mismatched_shapes_fail() {
        let mut frame = frame_filled(4, 4, 1);
        let mask = Mask::zeroed(4, 3);
        let err = apply_mask(&mut frame, &mask).unwrap_err();
        assert!(err.to_string().contains("composite"));
    }
}
