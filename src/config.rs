use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::path::Path;

use crate::decision::RetentionPolicy;
use crate::model::{MODEL_ADAPTIVE_MEAN, MODEL_FIRST_FRAME};
use crate::pipeline::RetentionGate;
use crate::region::RegionOfInterest;
use crate::sink::{SINK_LOCAL, SINK_MEMORY, SINK_S3};

pub const MODE_REGION: &str = "region";
pub const MODE_KEEP_ALL: &str = "keep-all";

const DEFAULT_SOURCE: &str = "synthetic://";
const DEFAULT_MODEL: &str = MODEL_ADAPTIVE_MEAN;
const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_S3_REGION: &str = "auto";
const DEFAULT_LOG_EVERY_FRAMES: u64 = 100;

/// Historical decision zone, sized for the reference traffic deployment.
pub const DEFAULT_ROI: RegionOfInterest = RegionOfInterest {
    x_min: 1000,
    x_max: 1200,
    y_min: 650,
    y_max: 800,
};

#[derive(Debug, Deserialize, Default)]
struct FramesiftConfigFile {
    source: Option<String>,
    model: Option<String>,
    roi: Option<RegionOfInterest>,
    retention: Option<RetentionConfigFile>,
    sink: Option<SinkConfigFile>,
    log_every_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RetentionConfigFile {
    mode: Option<String>,
    threshold_ratio: Option<f64>,
    max_mask_value: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct SinkConfigFile {
    kind: Option<String>,
    output_dir: Option<String>,
    bucket: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
}

/// Whether the run gates persistence on the region decision or keeps all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetentionMode {
    Region,
    KeepAll,
}

/// Resolved sink settings, handed to the sink factory.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub kind: String,
    pub output_dir: String,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct FramesiftConfig {
    pub source: String,
    pub model: String,
    pub roi: RegionOfInterest,
    pub retention_mode: RetentionMode,
    pub retention: RetentionPolicy,
    pub sink: SinkConfig,
    pub log_every_frames: u64,
}

impl FramesiftConfig {
    /// Load from the file named by `FRAMESIFT_CONFIG` (if set), then apply
    /// environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FRAMESIFT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Same resolution order with an explicit file path.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FramesiftConfigFile) -> Result<Self> {
        let source = file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let model = file.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let roi = file.roi.unwrap_or(DEFAULT_ROI);
        let retention_mode = match file.retention.as_ref().and_then(|r| r.mode.as_deref()) {
            None => RetentionMode::Region,
            Some(mode) => parse_retention_mode(mode)?,
        };
        let defaults = RetentionPolicy::default();
        let retention = RetentionPolicy {
            threshold_ratio: file
                .retention
                .as_ref()
                .and_then(|r| r.threshold_ratio)
                .unwrap_or(defaults.threshold_ratio),
            max_mask_value: file
                .retention
                .as_ref()
                .and_then(|r| r.max_mask_value)
                .unwrap_or(defaults.max_mask_value),
        };
        let sink = SinkConfig {
            kind: file
                .sink
                .as_ref()
                .and_then(|sink| sink.kind.clone())
                .unwrap_or_else(|| SINK_LOCAL.to_string()),
            output_dir: file
                .sink
                .as_ref()
                .and_then(|sink| sink.output_dir.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            bucket: file.sink.as_ref().and_then(|sink| sink.bucket.clone()),
            endpoint: file.sink.as_ref().and_then(|sink| sink.endpoint.clone()),
            region: file
                .sink
                .and_then(|sink| sink.region)
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
        };
        let log_every_frames = file.log_every_frames.unwrap_or(DEFAULT_LOG_EVERY_FRAMES);
        Ok(Self {
            source,
            model,
            roi,
            retention_mode,
            retention,
            sink,
            log_every_frames,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("FRAMESIFT_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(model) = std::env::var("FRAMESIFT_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
        if let Ok(kind) = std::env::var("FRAMESIFT_SINK") {
            if !kind.trim().is_empty() {
                self.sink.kind = kind;
            }
        }
        if let Ok(dir) = std::env::var("FRAMESIFT_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.sink.output_dir = dir;
            }
        }
        if let Ok(bucket) = std::env::var("FRAMESIFT_BUCKET") {
            if !bucket.trim().is_empty() {
                self.sink.bucket = Some(bucket);
            }
        }
        if let Ok(endpoint) = std::env::var("FRAMESIFT_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.sink.endpoint = Some(endpoint);
            }
        }
        if let Ok(threshold) = std::env::var("FRAMESIFT_THRESHOLD") {
            let ratio: f64 = threshold
                .parse()
                .map_err(|_| anyhow!("FRAMESIFT_THRESHOLD must be a ratio in (0, 1]"))?;
            self.retention.threshold_ratio = ratio;
        }
        Ok(())
    }

    /// Fail fast on anything the per-frame loop must never see. Re-run after
    /// mutating a loaded configuration.
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            bail!("source must not be empty");
        }
        if self.model != MODEL_ADAPTIVE_MEAN && self.model != MODEL_FIRST_FRAME {
            bail!(
                "unknown background model '{}' (expected '{}' or '{}')",
                self.model,
                MODEL_ADAPTIVE_MEAN,
                MODEL_FIRST_FRAME
            );
        }
        self.roi.validate()?;
        self.retention.validate()?;
        match self.sink.kind.as_str() {
            SINK_LOCAL | SINK_MEMORY => {}
            SINK_S3 => {
                if self.sink.bucket.is_none() {
                    bail!("the s3 sink requires a bucket name");
                }
            }
            other => bail!(
                "unknown sink kind '{}' (expected '{}', '{}' or '{}')",
                other,
                SINK_LOCAL,
                SINK_S3,
                SINK_MEMORY
            ),
        }
        Ok(())
    }

    /// The gate the pipeline runs with under this configuration.
    pub fn retention_gate(&self) -> RetentionGate {
        match self.retention_mode {
            RetentionMode::KeepAll => RetentionGate::KeepAll,
            RetentionMode::Region => RetentionGate::Region {
                region: self.roi,
                policy: self.retention,
            },
        }
    }
}

pub fn parse_retention_mode(mode: &str) -> Result<RetentionMode> {
    match mode {
        MODE_REGION => Ok(RetentionMode::Region),
        MODE_KEEP_ALL => Ok(RetentionMode::KeepAll),
        other => Err(anyhow!(
            "unknown retention mode '{}' (expected '{}' or '{}')",
            other,
            MODE_REGION,
            MODE_KEEP_ALL
        )),
    }
}

/// Parse `x_min,x_max,y_min,y_max` as used by the CLI.
pub fn parse_roi(value: &str) -> Result<RegionOfInterest> {
    let parts: Vec<&str> = value.split(',').map(|part| part.trim()).collect();
    if parts.len() != 4 {
        bail!("region must be 'x_min,x_max,y_min,y_max', got '{}'", value);
    }
    let mut bounds = [0u32; 4];
    for (slot, part) in bounds.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| anyhow!("invalid region bound '{}'", part))?;
    }
    let roi = RegionOfInterest {
        x_min: bounds[0],
        x_max: bounds[1],
        y_min: bounds[2],
        y_max: bounds[3],
    };
    roi.validate()?;
    Ok(roi)
}

fn read_config_file(path: &Path) -> Result<FramesiftConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
