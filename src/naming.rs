//! Artifact naming.
//!
//! Every persisted frame/mask pair shares one timestamp:
//! `frame_<micros>_<basename>` and `bgmask_<micros>_<basename>`. The
//! timestamp is anchored to the Unix epoch at namer construction and then
//! advanced by the monotonic clock, with a bump on collision, so stems within
//! a run are strictly increasing and never collide even at high frame rates.

use anyhow::{Context, Result};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const FRAME_PREFIX: &str = "frame";
pub const MASK_PREFIX: &str = "bgmask";

/// Filename cores for one persisted pair. Sinks append their own extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactStems {
    pub frame: String,
    pub mask: String,
}

/// Per-run stem generator.
pub struct ArtifactNamer {
    basename: String,
    epoch_anchor_micros: u64,
    started: Instant,
    last_micros: u64,
}

impl ArtifactNamer {
    pub fn new(basename: &str) -> Result<Self> {
        let anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the unix epoch")?;
        Ok(Self {
            basename: basename.to_string(),
            epoch_anchor_micros: anchor.as_micros() as u64,
            started: Instant::now(),
            last_micros: 0,
        })
    }

    /// Stems for the next persisted pair. Both artifacts carry the same
    /// timestamp so they stay associated downstream.
    pub fn next_stems(&mut self) -> ArtifactStems {
        let mut micros = self.epoch_anchor_micros + self.started.elapsed().as_micros() as u64;
        if micros <= self.last_micros {
            micros = self.last_micros + 1;
        }
        self.last_micros = micros;
        ArtifactStems {
            frame: format!("{}_{}_{}", FRAME_PREFIX, micros, self.basename),
            mask: format!("{}_{}_{}", MASK_PREFIX, micros, self.basename),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_carry_prefixes_and_basename() {
        let mut namer = ArtifactNamer::new("traffic_cam").unwrap();
        let stems = namer.next_stems();
        assert!(stems.frame.starts_with("frame_"));
        assert!(stems.mask.starts_with("bgmask_"));
        assert!(stems.frame.ends_with("_traffic_cam"));
        assert!(stems.mask.ends_with("_traffic_cam"));
    }

    #[test]
    fn pair_shares_one_timestamp() {
        let mut namer = ArtifactNamer::new("clip").unwrap();
        let stems = namer.next_stems();
        let frame_ts = stems.frame.trim_start_matches("frame_");
        let mask_ts = stems.mask.trim_start_matches("bgmask_");
        assert_eq!(frame_ts, mask_ts);
    }

    #[test]
    fn rapid_calls_never_collide() {
        let mut namer = ArtifactNamer::new("clip").unwrap();
        let mut seen = Vec::new();
        for _ in 0..1000 {
            let stems = namer.next_stems();
            seen.push(stems.frame);
        }
        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(seen.len(), deduped.len());
        // strictly increasing, not merely unique
        let parse = |s: &String| -> u64 {
            s.trim_start_matches("frame_")
                .trim_end_matches("_clip")
                .parse()
                .unwrap()
        };
        for pair in seen.windows(2) {
            assert!(parse(&pair[1]) > parse(&pair[0]));
        }
    }
}
