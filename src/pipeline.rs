//! Frame pipeline orchestrator.
//!
//! Owns the source, model and sink for one run and drives the per-frame
//! loop: fetch, model update, composite, optionally crop and decide, persist.
//! The model update happens for every fetched frame whether or not the frame
//! is kept; that mutation is the point of the model and is never skipped.
//!
//! Run lifecycle: `Idle -> Running -> Done | Failed`. Normal end-of-stream
//! and a requested stop end in `Done`; a source fault or any stage error ends
//! in `Failed` with the error surfaced to the caller. Both are terminal, a
//! pipeline value runs at most once.

use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::composite::apply_mask;
use crate::decision::RetentionPolicy;
use crate::frame::Frame;
use crate::model::BackgroundModel;
use crate::naming::ArtifactNamer;
use crate::region::RegionOfInterest;
use crate::sink::ArtifactSink;
use crate::source::FrameSource;

/// Where a run currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Done,
    Failed,
}

/// Keep/discard behavior for the run, fixed at construction.
pub enum RetentionGate {
    /// Crop both grids to the region and keep only frames whose cropped mask
    /// passes the policy.
    Region {
        region: RegionOfInterest,
        policy: RetentionPolicy,
    },
    /// Persist every frame unconditionally; no crop, no decision.
    KeepAll,
}

/// What a finished run did.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub frames_processed: u64,
    pub frames_kept: u64,
    pub frames_discarded: u64,
    pub state: PipelineState,
    pub interrupted: bool,
}

pub struct FramePipeline {
    source: Box<dyn FrameSource>,
    model: Box<dyn BackgroundModel>,
    sink: Box<dyn ArtifactSink>,
    gate: RetentionGate,
    stop_flag: Option<Arc<AtomicBool>>,
    frame_limit: Option<u64>,
    log_every_frames: u64,
    state: PipelineState,
    frames_processed: u64,
    frames_kept: u64,
}

impl FramePipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        model: Box<dyn BackgroundModel>,
        sink: Box<dyn ArtifactSink>,
        gate: RetentionGate,
    ) -> Self {
        Self {
            source,
            model,
            sink,
            gate,
            stop_flag: None,
            frame_limit: None,
            log_every_frames: 0,
            state: PipelineState::Idle,
            frames_processed: 0,
            frames_kept: 0,
        }
    }

    /// Cooperative stop: when the flag goes true, the run finishes the frame
    /// in flight and ends in `Done` with `interrupted` set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// Stop cleanly after `limit` frames. Zero means no limit.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    /// Log progress every `n` frames. Zero disables progress logging.
    pub fn with_log_every(mut self, n: u64) -> Self {
        self.log_every_frames = n;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Drive the run to a terminal state.
    pub fn run(&mut self) -> Result<RunReport> {
        if self.state != PipelineState::Idle {
            bail!("pipeline has already run (state {:?})", self.state);
        }

        let info = match self.source.connect() {
            Ok(info) => info,
            Err(err) => {
                self.state = PipelineState::Failed;
                return Err(err.context("open frame source"));
            }
        };
        if let RetentionGate::Region { region, .. } = &self.gate {
            if let Err(err) = region.validate_within(info.width, info.height) {
                self.state = PipelineState::Failed;
                return Err(err.context("region of interest does not fit the stream"));
            }
        }
        let mut namer = ArtifactNamer::new(&info.basename)?;
        self.state = PipelineState::Running;
        log::info!(
            "run started: {}x{} via {}, model {}, sink {}",
            info.width,
            info.height,
            self.source.stats().source,
            self.model.name(),
            self.sink.name()
        );

        let mut interrupted = false;
        loop {
            if self.stop_requested() {
                log::info!("stop requested, ending run after {} frames", self.frames_processed);
                interrupted = true;
                break;
            }
            if let Some(limit) = self.frame_limit {
                if self.frames_processed >= limit {
                    log::info!("frame limit {} reached", limit);
                    break;
                }
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    self.state = PipelineState::Failed;
                    return Err(err.context("frame source read fault"));
                }
            };

            let kept = match self.process_frame(frame, &mut namer) {
                Ok(kept) => kept,
                Err(err) => {
                    self.state = PipelineState::Failed;
                    return Err(err);
                }
            };
            self.frames_processed += 1;
            if kept {
                self.frames_kept += 1;
            }

            if self.log_every_frames > 0 && self.frames_processed % self.log_every_frames == 0 {
                log::info!(
                    "progress: {} frames processed, {} kept",
                    self.frames_processed,
                    self.frames_kept
                );
            }
        }

        self.state = PipelineState::Done;
        log::info!(
            "run finished: {} frames, {} kept, {} discarded",
            self.frames_processed,
            self.frames_kept,
            self.frames_processed - self.frames_kept
        );
        Ok(RunReport {
            frames_processed: self.frames_processed,
            frames_kept: self.frames_kept,
            frames_discarded: self.frames_processed - self.frames_kept,
            state: self.state,
            interrupted,
        })
    }

    /// One frame through subtract, composite, gate, persist. Returns whether
    /// the frame was kept.
    fn process_frame(&mut self, mut frame: Frame, namer: &mut ArtifactNamer) -> Result<bool> {
        let mask = self
            .model
            .update(&frame)
            .context("background model update")?;
        apply_mask(&mut frame, &mask)?;

        let keep = match &self.gate {
            RetentionGate::KeepAll => true,
            RetentionGate::Region { region, policy } => {
                let (_frame_region, mask_region) = region.crop(&frame, &mask)?;
                policy.should_keep(&mask_region)
            }
        };

        if keep {
            let stems = namer.next_stems();
            self.sink
                .store_pair(&stems, &frame, &mask)
                .context("persist frame/mask pair")?;
            log::debug!("kept frame {} as {}", self.frames_processed + 1, stems.frame);
        }
        Ok(keep)
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
