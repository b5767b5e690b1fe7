//! In-memory sink.
//!
//! Keeps stored pairs in a shared buffer so a test (or a dry run) can hold a
//! clone of the sink, hand another clone to the pipeline, and inspect what
//! was persisted afterwards.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use crate::frame::{Frame, Mask};
use crate::naming::ArtifactStems;
use crate::sink::{ArtifactSink, SINK_MEMORY};

/// One persisted frame/mask pair, byte-for-byte.
#[derive(Clone, Debug)]
pub struct StoredPair {
    pub frame_stem: String,
    pub mask_stem: String,
    pub frame_dims: (u32, u32),
    pub mask_dims: (u32, u32),
    pub frame_bytes: Vec<u8>,
    pub mask_bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MemorySink {
    pairs: Arc<Mutex<Vec<StoredPair>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_count(&self) -> usize {
        self.pairs.lock().map(|pairs| pairs.len()).unwrap_or(0)
    }

    /// Copy of everything stored so far.
    pub fn snapshot(&self) -> Vec<StoredPair> {
        self.pairs
            .lock()
            .map(|pairs| pairs.clone())
            .unwrap_or_default()
    }
}

impl ArtifactSink for MemorySink {
    fn name(&self) -> &'static str {
        SINK_MEMORY
    }

    fn store_pair(&mut self, stems: &ArtifactStems, frame: &Frame, mask: &Mask) -> Result<()> {
        let mut pairs = self
            .pairs
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?;
        pairs.push(StoredPair {
            frame_stem: stems.frame.clone(),
            mask_stem: stems.mask.clone(),
            frame_dims: frame.dims(),
            mask_dims: mask.dims(),
            frame_bytes: frame.pixels().to_vec(),
            mask_bytes: mask.values().to_vec(),
        });
        Ok(())
    }
}
