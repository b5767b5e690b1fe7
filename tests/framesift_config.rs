use std::sync::Mutex;

use tempfile::NamedTempFile;

use framesift::config::{FramesiftConfig, RetentionMode, DEFAULT_ROI};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FRAMESIFT_CONFIG",
        "FRAMESIFT_SOURCE",
        "FRAMESIFT_MODEL",
        "FRAMESIFT_SINK",
        "FRAMESIFT_OUTPUT_DIR",
        "FRAMESIFT_BUCKET",
        "FRAMESIFT_ENDPOINT",
        "FRAMESIFT_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": "synthetic://32x24?frames=8",
        "model": "first-frame",
        "roi": { "x_min": 2, "x_max": 30, "y_min": 2, "y_max": 22 },
        "retention": {
            "mode": "region",
            "threshold_ratio": 0.4,
            "max_mask_value": 200
        },
        "sink": {
            "kind": "local",
            "output_dir": "captures"
        },
        "log_every_frames": 10
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FRAMESIFT_CONFIG", file.path());
    std::env::set_var("FRAMESIFT_MODEL", "adaptive-mean");
    std::env::set_var("FRAMESIFT_THRESHOLD", "0.6");

    let cfg = FramesiftConfig::load().expect("load config");

    assert_eq!(cfg.source, "synthetic://32x24?frames=8");
    assert_eq!(cfg.model, "adaptive-mean", "env wins over the file");
    assert_eq!(cfg.roi.x_min, 2);
    assert_eq!(cfg.roi.x_max, 30);
    assert_eq!(cfg.roi.y_min, 2);
    assert_eq!(cfg.roi.y_max, 22);
    assert_eq!(cfg.retention_mode, RetentionMode::Region);
    assert_eq!(cfg.retention.threshold_ratio, 0.6, "env wins over the file");
    assert_eq!(cfg.retention.max_mask_value, 200);
    assert_eq!(cfg.sink.kind, "local");
    assert_eq!(cfg.sink.output_dir, "captures");
    assert_eq!(cfg.log_every_frames, 10);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = FramesiftConfig::load().expect("load defaults");

    assert_eq!(cfg.source, "synthetic://");
    assert_eq!(cfg.model, "adaptive-mean");
    assert_eq!(cfg.roi, DEFAULT_ROI);
    assert_eq!(cfg.retention_mode, RetentionMode::Region);
    assert_eq!(cfg.retention.threshold_ratio, 0.3);
    assert_eq!(cfg.retention.max_mask_value, 255);
    assert_eq!(cfg.sink.kind, "local");
    assert_eq!(cfg.sink.output_dir, ".");
    assert!(cfg.sink.bucket.is_none());
    assert_eq!(cfg.log_every_frames, 100);

    clear_env();
}

#[test]
fn invalid_threshold_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMESIFT_THRESHOLD", "hot");
    assert!(FramesiftConfig::load().is_err(), "non-numeric threshold");

    std::env::set_var("FRAMESIFT_THRESHOLD", "1.5");
    assert!(FramesiftConfig::load().is_err(), "ratio above 1");

    clear_env();
}

#[test]
fn s3_sink_from_env_requires_bucket() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMESIFT_SINK", "s3");
    assert!(FramesiftConfig::load().is_err(), "s3 without bucket");

    std::env::set_var("FRAMESIFT_BUCKET", "captures");
    let cfg = FramesiftConfig::load().expect("s3 with bucket");
    assert_eq!(cfg.sink.kind, "s3");
    assert_eq!(cfg.sink.bucket.as_deref(), Some("captures"));
    assert_eq!(cfg.sink.region, "auto");

    clear_env();
}
