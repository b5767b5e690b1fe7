//! Deterministic synthetic frame source.
//!
//! `synthetic://[WxH][?frames=N]` yields N frames of a sliding gradient whose
//! pixels are a pure function of (byte index, frame number, scene state), so
//! two instances with the same spec produce byte-identical streams. A scene
//! shift every fixed number of frames gives adaptive models something to
//! track. Runs end with normal end-of-stream once the frame budget is spent.

use anyhow::{anyhow, bail, Context, Result};

use crate::frame::{Frame, FRAME_CHANNELS};
use crate::source::{FrameSource, SourceStats, StreamInfo, SYNTHETIC_SCHEME};

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FRAME_LIMIT: u64 = 300;
const SCENE_SHIFT_EVERY: u64 = 50;

pub struct SyntheticSource {
    spec: String,
    width: u32,
    height: u32,
    frame_limit: u64,
    frames_read: u64,
    scene_state: u8,
}

impl SyntheticSource {
    /// Parse a `synthetic://` spec. Defaults: 640x480, 300 frames.
    pub fn parse(spec: &str) -> Result<Self> {
        let rest = spec
            .strip_prefix(SYNTHETIC_SCHEME)
            .ok_or_else(|| anyhow!("not a synthetic source: '{}'", spec))?;
        let (dims_part, query) = match rest.split_once('?') {
            Some((dims, query)) => (dims, Some(query)),
            None => (rest, None),
        };

        let (width, height) = if dims_part.is_empty() {
            (DEFAULT_WIDTH, DEFAULT_HEIGHT)
        } else {
            let (w, h) = dims_part.split_once('x').ok_or_else(|| {
                anyhow!(
                    "synthetic dimensions must look like 640x480, got '{}'",
                    dims_part
                )
            })?;
            let width = w
                .parse::<u32>()
                .with_context(|| format!("invalid synthetic width '{}'", w))?;
            let height = h
                .parse::<u32>()
                .with_context(|| format!("invalid synthetic height '{}'", h))?;
            (width, height)
        };
        if width == 0 || height == 0 {
            bail!("synthetic dimensions must be nonzero");
        }

        let mut frame_limit = DEFAULT_FRAME_LIMIT;
        if let Some(query) = query {
            for pair in query.split('&') {
                match pair.split_once('=') {
                    Some(("frames", n)) => {
                        frame_limit = n
                            .parse::<u64>()
                            .with_context(|| format!("invalid frames value '{}'", n))?;
                    }
                    _ => bail!("unknown synthetic source parameter '{}'", pair),
                }
            }
        }

        Ok(Self {
            spec: spec.to_string(),
            width,
            height,
            frame_limit,
            frames_read: 0,
            scene_state: 0,
        })
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<StreamInfo> {
        log::info!(
            "source: {} ({}x{}, {} frames)",
            self.spec,
            self.width,
            self.height,
            self.frame_limit
        );
        Ok(StreamInfo {
            width: self.width,
            height: self.height,
            basename: "synthetic".to_string(),
        })
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frames_read >= self.frame_limit {
            return Ok(None);
        }
        self.frames_read += 1;
        if self.frames_read % SCENE_SHIFT_EVERY == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let len = self.width as usize * self.height as usize * FRAME_CHANNELS;
        let mut pixels = vec![0u8; len];
        for (i, px) in pixels.iter_mut().enumerate() {
            *px = ((i as u64 + self.frames_read * 2 + self.scene_state as u64) % 256) as u8;
        }
        Ok(Some(Frame::new(pixels, self.width, self.height)?))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_read: self.frames_read,
            source: self.spec.clone(),
        }
    }
}
