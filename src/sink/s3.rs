//! S3-compatible object storage sink.
//!
//! Uploads raw frame and mask bytes under `.txt` keys, the format downstream
//! consumers of this pipeline already read. Credentials come from the
//! environment only; bucket, endpoint and region come from configuration.
//! The async SDK is bridged behind the synchronous sink trait with a
//! current-thread runtime owned by the sink.

use anyhow::{anyhow, Context, Result};
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::frame::{Frame, Mask};
use crate::naming::ArtifactStems;
use crate::sink::{ArtifactSink, SINK_S3};

pub const ENV_S3_ACCESS_KEY: &str = "FRAMESIFT_S3_ACCESS_KEY";
pub const ENV_S3_SECRET_KEY: &str = "FRAMESIFT_S3_SECRET_KEY";

pub struct S3Sink {
    runtime: tokio::runtime::Runtime,
    client: Client,
    bucket: String,
    artifacts_written: u64,
}

impl S3Sink {
    pub fn new(bucket: &str, endpoint: Option<&str>, region: &str) -> Result<Self> {
        let access_key = std::env::var(ENV_S3_ACCESS_KEY)
            .with_context(|| format!("{} not set", ENV_S3_ACCESS_KEY))?;
        let secret_key = std::env::var(ENV_S3_SECRET_KEY)
            .with_context(|| format!("{} not set", ENV_S3_SECRET_KEY))?;
        let credentials = Credentials::new(access_key, secret_key, None, None, "framesift");

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("build runtime for s3 sink")?;

        log::info!("sink: s3 bucket '{}'", bucket);
        Ok(Self {
            runtime,
            client,
            bucket: bucket.to_string(),
            artifacts_written: 0,
        })
    }

    pub fn artifacts_written(&self) -> u64 {
        self.artifacts_written
    }

    fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .body(ByteStream::from(data))
                    .content_type("application/octet-stream")
                    .send(),
            )
            .map_err(|e| anyhow!("upload '{}' to bucket '{}' failed: {}", key, self.bucket, e))?;
        Ok(())
    }
}

impl ArtifactSink for S3Sink {
    fn name(&self) -> &'static str {
        SINK_S3
    }

    fn store_pair(&mut self, stems: &ArtifactStems, frame: &Frame, mask: &Mask) -> Result<()> {
        self.put_object(&format!("{}.txt", stems.frame), frame.pixels().to_vec())?;
        self.put_object(&format!("{}.txt", stems.mask), mask.values().to_vec())?;
        self.artifacts_written += 2;
        Ok(())
    }
}
