//! Retention decision engine.
//!
//! Computes the arithmetic mean of the mask bytes inside the decision region
//! and keeps the frame iff that mean strictly exceeds
//! `threshold_ratio * max_mask_value`. Foreground coverage above the ratio is
//! treated as evidence of a relevant object occupying the zone; at or below
//! it, the region is assumed empty and the frame is discarded.

use anyhow::{bail, Result};

use crate::frame::Mask;

/// Historical keep ratio: 30% mean foreground coverage.
pub const DEFAULT_THRESHOLD_RATIO: f64 = 0.3;

/// Full-scale value of an 8-bit mask.
pub const DEFAULT_MAX_MASK_VALUE: u8 = 255;

/// Tunable keep/discard rule. Both knobs default to the historical values.
#[derive(Clone, Copy, Debug)]
pub struct RetentionPolicy {
    pub threshold_ratio: f64,
    pub max_mask_value: u8,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
            max_mask_value: DEFAULT_MAX_MASK_VALUE,
        }
    }
}

impl RetentionPolicy {
    pub fn new(threshold_ratio: f64, max_mask_value: u8) -> Result<Self> {
        let policy = Self {
            threshold_ratio,
            max_mask_value,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_ratio > 0.0 && self.threshold_ratio <= 1.0) {
            bail!(
                "retention threshold_ratio {} must be in (0, 1]",
                self.threshold_ratio
            );
        }
        if self.max_mask_value == 0 {
            bail!("retention max_mask_value must be nonzero");
        }
        Ok(())
    }

    /// The absolute mean the mask must exceed for a frame to be kept.
    pub fn threshold(&self) -> f64 {
        self.threshold_ratio * self.max_mask_value as f64
    }

    /// Keep iff mean(mask) > threshold. Strict: a mean exactly at the
    /// threshold is discarded.
    pub fn should_keep(&self, mask_region: &Mask) -> bool {
        let values = mask_region.values();
        if values.is_empty() {
            return false;
        }
        let sum: u64 = values.iter().map(|&v| v as u64).sum();
        let mean = sum as f64 / values.len() as f64;
        mean > self.threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(foreground: usize, total: usize, value: u8) -> Mask {
        let mut data = vec![0u8; total];
        for slot in data.iter_mut().take(foreground) {
            *slot = value;
        }
        Mask::new(data, total as u32, 1).unwrap()
    }

    #[test]
    fn all_zero_region_is_discarded() {
        let policy = RetentionPolicy::default();
        let mask = Mask::zeroed(10, 10);
        assert!(!policy.should_keep(&mask));
    }

    #[test]
    fn forty_percent_full_scale_is_kept() {
        // mean = 0.4 * 255 = 102 > 76.5
        let policy = RetentionPolicy::default();
        let mask = mask_with(40, 100, 255);
        assert!(policy.should_keep(&mask));
    }

    #[test]
    fn mean_exactly_at_threshold_is_discarded() {
        // two pixels, 153 + 0: mean 76.5 == 0.3 * 255
        let policy = RetentionPolicy::default();
        let mask = Mask::new(vec![153, 0], 2, 1).unwrap();
        assert!(!policy.should_keep(&mask));
        // one step above clears the strict bound
        let mask = Mask::new(vec![154, 0], 2, 1).unwrap();
        assert!(policy.should_keep(&mask));
    }

    #[test]
    fn decision_is_monotonic_in_coverage() {
        let policy = RetentionPolicy::default();
        let mut kept = false;
        for foreground in 0..=100 {
            let now = policy.should_keep(&mask_with(foreground, 100, 255));
            assert!(!kept || now, "keep flipped off at coverage {}", foreground);
            kept = now;
        }
        assert!(kept);
    }

    #[test]
    fn custom_threshold_and_scale() {
        let policy = RetentionPolicy::new(0.5, 100).unwrap();
        assert_eq!(policy.threshold(), 50.0);
        let below = Mask::new(vec![50, 50], 2, 1).unwrap();
        assert!(!policy.should_keep(&below));
        let above = Mask::new(vec![51, 51], 2, 1).unwrap();
        assert!(policy.should_keep(&above));
    }

    #[test]
    fn invalid_policies_rejected() {
        assert!(RetentionPolicy::new(0.0, 255).is_err());
        assert!(RetentionPolicy::new(1.1, 255).is_err());
        assert!(RetentionPolicy::new(0.3, 0).is_err());
        assert!(RetentionPolicy::new(1.0, 255).is_ok());
    }
}
