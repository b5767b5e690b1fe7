//! Local video file source backed by ffmpeg.
//!
//! Decodes the best video track to tightly packed RGB24 through a bilinear
//! scaler. End-of-file drains the decoder and then reports normal
//! end-of-stream; any decode error is a read fault that fails the run.

use anyhow::{anyhow, bail, Context, Result};
use ffmpeg_next as ffmpeg;
use std::path::Path;

use crate::frame::Frame;
use crate::source::{FrameSource, SourceStats, StreamInfo};

pub struct FfmpegSource {
    path: String,
    opened: Option<OpenedStream>,
    frames_read: u64,
}

struct OpenedStream {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    eof_sent: bool,
}

impl FfmpegSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            opened: None,
            frames_read: 0,
        }
    }
}

impl FrameSource for FfmpegSource {
    fn connect(&mut self) -> Result<StreamInfo> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&self.path)
            .with_context(|| format!("failed to open video file '{}'", self.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("'{}' has no video track", self.path))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        let info = StreamInfo {
            width: decoder.width(),
            height: decoder.height(),
            basename: file_stem_of(&self.path),
        };
        log::info!(
            "source: {} ({}x{}, ffmpeg)",
            self.path,
            info.width,
            info.height
        );
        self.opened = Some(OpenedStream {
            input,
            stream_index,
            decoder,
            scaler,
            eof_sent: false,
        });
        Ok(info)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stream) = self.opened.as_mut() else {
            bail!("ffmpeg source '{}' is not connected", self.path);
        };

        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb = ffmpeg::frame::Video::empty();
        loop {
            // Drain whatever the decoder already holds before feeding it.
            if stream.decoder.receive_frame(&mut decoded).is_ok() {
                stream
                    .scaler
                    .run(&decoded, &mut rgb)
                    .context("scale frame to RGB24")?;
                let (pixels, width, height) = frame_to_pixels(&rgb)?;
                self.frames_read += 1;
                return Ok(Some(Frame::new(pixels, width, height)?));
            }
            if stream.eof_sent {
                return Ok(None);
            }
            match next_video_packet(&mut stream.input, stream.stream_index) {
                Some(packet) => stream
                    .decoder
                    .send_packet(&packet)
                    .context("send packet to video decoder")?,
                None => {
                    stream.decoder.send_eof().context("flush video decoder")?;
                    stream.eof_sent = true;
                }
            }
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_read: self.frames_read,
            source: self.path.clone(),
        }
    }
}

fn next_video_packet(
    input: &mut ffmpeg::format::context::Input,
    stream_index: usize,
) -> Option<ffmpeg::Packet> {
    for (stream, packet) in input.packets() {
        if stream.index() == stream_index {
            return Some(packet);
        }
    }
    None
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = width as usize * 3;
    let stride = frame.stride(0) as usize;
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    // Scaler output can carry row padding; repack to a tight buffer.
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }
    Ok((pixels, width, height))
}

fn file_stem_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stream".to_string())
}
