//! framesift - background-subtraction frame pipeline.
//!
//! Reads frames from a video file or a synthetic source, maintains a
//! background model, composites foreground-only frames, and persists the
//! frame/mask pairs that pass the retention decision.
//!
//! Resolution order for every setting: built-in default, then config file,
//! then `FRAMESIFT_*` environment variables, then command-line flags.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use framesift::config::parse_roi;
use framesift::{
    create_model, create_sink, open_source, FramePipeline, FramesiftConfig, RetentionMode,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video file path, or a synthetic stream such as synthetic://64x64?frames=100.
    source: Option<String>,

    /// JSON config file. Flags below override whatever it sets.
    #[arg(long, env = "FRAMESIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Background model: adaptive-mean or first-frame.
    #[arg(long)]
    model: Option<String>,

    /// Where pairs go: local, s3 or memory.
    #[arg(long)]
    sink: Option<String>,

    /// Directory for the local sink.
    #[arg(long)]
    output_dir: Option<String>,

    /// Bucket for the s3 sink.
    #[arg(long)]
    bucket: Option<String>,

    /// Persist every frame instead of gating on the region decision.
    #[arg(long)]
    keep_all: bool,

    /// Retention threshold as a ratio of the maximum mask value, in (0, 1].
    #[arg(long)]
    threshold: Option<f64>,

    /// Decision region as x_min,x_max,y_min,y_max in frame pixels.
    #[arg(long)]
    roi: Option<String>,

    /// Stop after this many frames. 0 means run to end of stream.
    #[arg(long, default_value_t = 0)]
    limit: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = FramesiftConfig::load_from(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args)?;
    cfg.validate()?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let source = open_source(&cfg.source)?;
    let model = create_model(&cfg.model)?;
    let sink = create_sink(&cfg.sink)?;
    let sink_name = sink.name();

    log::info!(
        "framesift starting: source={} model={} sink={}",
        cfg.source,
        cfg.model,
        sink_name
    );

    let mut pipeline = FramePipeline::new(source, model, sink, cfg.retention_gate())
        .with_stop_flag(stop)
        .with_frame_limit(args.limit)
        .with_log_every(cfg.log_every_frames);
    let report = pipeline.run()?;

    println!("run summary:");
    println!("  frames processed: {}", report.frames_processed);
    println!("  frames kept:      {}", report.frames_kept);
    println!("  frames discarded: {}", report.frames_discarded);
    println!("  sink:             {}", sink_name);
    if report.interrupted {
        println!("  stopped early on interrupt");
    }
    Ok(())
}

/// Fold command-line flags into the resolved config. The caller re-validates
/// afterwards so a bad flag fails the same way a bad file does.
fn apply_overrides(cfg: &mut FramesiftConfig, args: &Args) -> Result<()> {
    if let Some(source) = &args.source {
        cfg.source = source.clone();
    }
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(kind) = &args.sink {
        cfg.sink.kind = kind.clone();
    }
    if let Some(dir) = &args.output_dir {
        cfg.sink.output_dir = dir.clone();
    }
    if let Some(bucket) = &args.bucket {
        cfg.sink.bucket = Some(bucket.clone());
    }
    if args.keep_all {
        cfg.retention_mode = RetentionMode::KeepAll;
    }
    if let Some(ratio) = args.threshold {
        cfg.retention.threshold_ratio = ratio;
    }
    if let Some(roi) = &args.roi {
        cfg.roi = parse_roi(roi)?;
    }
    Ok(())
}
