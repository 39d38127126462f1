//! Video file writer
//!
//! Encodes BGR frames with the codec picked from the output extension and
//! muxes them into MP4 or AVI using FFmpeg.

use crate::config::VideoSettings;
use crate::error::{Error, Result};
use crate::media::VideoCodec;
use crate::types::{Frame, Framerate, Resolution};

use super::{fill_video_from_packed, init_ffmpeg, limit_framerate, MPEG4_MAX_TIME_BASE};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags as ScalerFlags};
use ffmpeg_next::util::error::EAGAIN;
use std::path::{Path, PathBuf};

/// Output stream parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriterConfig {
    pub codec: VideoCodec,
    pub resolution: Resolution,
    pub framerate: Framerate,
    pub settings: VideoSettings,
}

impl WriterConfig {
    pub fn new(codec: VideoCodec, resolution: Resolution, framerate: Framerate) -> Self {
        Self {
            codec,
            resolution,
            framerate,
            settings: VideoSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: VideoSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Encoder plus muxer for one output file
pub struct VideoWriter {
    path: PathBuf,
    config: WriterConfig,
    output_ctx: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: Scaler,
    stream_index: usize,
    time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    frame_count: u64,
    closed: bool,
}

impl VideoWriter {
    /// Create the output file, open the encoder and write the container header
    pub fn create(path: impl Into<PathBuf>, config: WriterConfig) -> Result<Self> {
        init_ffmpeg()?;
        let path = path.into();
        let mut config = config;

        if config.resolution.is_empty() {
            return Err(Error::Encode(format!(
                "Invalid output geometry {}",
                config.resolution
            )));
        }
        if !config.framerate.is_valid() {
            tracing::warn!(
                "Source frame rate unknown, writing {} at {}",
                path.display(),
                Framerate::FPS_25
            );
            config.framerate = Framerate::FPS_25;
        }
        if config.codec == VideoCodec::Mp4v {
            let limited = limit_framerate(config.framerate, MPEG4_MAX_TIME_BASE);
            if limited.num as u64 * config.framerate.den as u64
                != config.framerate.num as u64 * limited.den as u64
            {
                tracing::warn!(
                    "Frame rate {}/{} exceeds the MPEG-4 time base, writing {}/{}",
                    config.framerate.num,
                    config.framerate.den,
                    limited.num,
                    limited.den
                );
            }
            config.framerate = limited;
        }

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Muxer(format!("Failed to create directory: {}", e)))?;
            }
        }

        let mut output_ctx = ffmpeg::format::output(&path)
            .map_err(|e| Error::Muxer(format!("Failed to create output context: {}", e)))?;
        let global_header = output_ctx
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        if config.codec == VideoCodec::Rgba {
            // RGBA is missing from the AVI muxer's official tag table
            unsafe {
                (*output_ctx.as_mut_ptr()).strict_std_compliance =
                    ffmpeg::ffi::FF_COMPLIANCE_UNOFFICIAL as _;
            }
        }

        let codec_id = config.codec.codec_id();
        let codec = ffmpeg::encoder::find(codec_id)
            .ok_or_else(|| Error::Encode(format!("Codec {:?} not found", codec_id)))?;

        let mut stream = output_ctx
            .add_stream(codec)
            .map_err(|e| Error::Muxer(format!("Failed to add stream: {}", e)))?;
        let stream_index = stream.index();

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::Encode(e.to_string()))?;

        let time_base = ffmpeg::Rational::from(config.framerate).invert();
        encoder.set_width(config.resolution.width);
        encoder.set_height(config.resolution.height);
        encoder.set_format(config.codec.pixel_format());
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(ffmpeg::Rational::from(config.framerate)));

        if config.codec == VideoCodec::Mp4v {
            encoder.set_bit_rate(config.settings.bitrate_kbps as usize * 1000);
            encoder.set_gop(config.settings.gop_size);
        }
        if global_header {
            encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder
            .open_as(codec)
            .map_err(|e| Error::Encode(format!("Failed to open encoder: {}", e)))?;

        stream.set_parameters(&encoder);
        stream.set_time_base(time_base);

        // Without an explicit tag AVI stores 32-bit rawvideo as BGRA
        unsafe {
            let mut params = stream.parameters();
            (*params.as_mut_ptr()).codec_tag = config.codec.codec_tag();
        }

        output_ctx
            .write_header()
            .map_err(|e| Error::Muxer(format!("Failed to write header: {}", e)))?;

        // The muxer may pick its own time base while writing the header
        let stream_time_base = output_ctx
            .stream(stream_index)
            .map(|s| s.time_base())
            .unwrap_or(time_base);

        let scaler = Scaler::get(
            Pixel::BGR24,
            config.resolution.width,
            config.resolution.height,
            config.codec.pixel_format(),
            config.resolution.width,
            config.resolution.height,
            ScalerFlags::BILINEAR,
        )
        .map_err(|e| Error::Encode(format!("Failed to create scaler: {}", e)))?;

        tracing::info!(
            "Video output initialized: {} ({}, {} @ {})",
            path.display(),
            config.codec,
            config.resolution,
            config.framerate,
        );

        Ok(Self {
            path,
            config,
            output_ctx,
            encoder,
            scaler,
            stream_index,
            time_base,
            stream_time_base,
            frame_count: 0,
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective stream parameters (frame rate after fallback)
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn frames_written(&self) -> u64 {
        self.frame_count
    }

    /// Encode and mux one BGR frame
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.closed {
            return Err(Error::Muxer("Writer already finished".into()));
        }
        if frame.resolution() != self.config.resolution || frame.channels != 3 {
            return Err(Error::FrameGeometry {
                expected: format!("{} BGR", self.config.resolution),
                actual: format!("{} with {} channels", frame.resolution(), frame.channels),
            });
        }
        if frame.data.len() != frame.expected_len() {
            return Err(Error::FrameGeometry {
                expected: format!("{} bytes", frame.expected_len()),
                actual: format!("{} bytes", frame.data.len()),
            });
        }

        let mut bgr = ffmpeg::frame::Video::new(Pixel::BGR24, frame.width, frame.height);
        fill_video_from_packed(&mut bgr, &frame.data, 3);

        let mut converted = ffmpeg::frame::Video::empty();
        self.scaler
            .run(&bgr, &mut converted)
            .map_err(|e| Error::Encode(format!("Pixel conversion failed: {}", e)))?;
        converted.set_pts(Some(self.frame_count as i64));

        self.encoder
            .send_frame(&converted)
            .map_err(|e| Error::Encode(format!("Failed to send frame: {}", e)))?;
        self.write_packets()?;

        self.frame_count += 1;
        tracing::trace!("Encoded frame {}", self.frame_count);
        Ok(())
    }

    /// Flush the encoder and write the container trailer
    pub fn finish(mut self) -> Result<u64> {
        self.close()?;
        tracing::info!(
            "Video output finished: {} ({} frames)",
            self.path.display(),
            self.frame_count
        );
        Ok(self.frame_count)
    }

    fn write_packets(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        while packet_ready(self.encoder.receive_packet(&mut packet))? {
            packet.set_stream(self.stream_index);
            // One tick of the encoder time base per frame
            packet.set_duration(1);
            packet.rescale_ts(self.time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output_ctx)
                .map_err(|e| Error::Muxer(format!("Failed to write packet: {}", e)))?;
        }
        Ok(())
    }

    /// Release the stream; runs at most once whether it succeeds or not
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // The trailer is attempted even when flushing fails
        let eof = self
            .encoder
            .send_eof()
            .map_err(|e| Error::Encode(format!("Failed to flush encoder: {}", e)));
        let flushed = self.write_packets();
        let trailer = self
            .output_ctx
            .write_trailer()
            .map_err(|e| Error::Muxer(format!("Failed to write trailer: {}", e)));

        eof.and(flushed).and(trailer)
    }
}

/// `true` if `receive_packet` produced a packet, `false` once the encoder
/// needs more input or is drained
fn packet_ready(received: std::result::Result<(), ffmpeg::Error>) -> Result<bool> {
    match received {
        Ok(()) => Ok(true),
        Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => Ok(false),
        Err(ffmpeg::Error::Eof) => Ok(false),
        Err(e) => Err(Error::Encode(format!("Failed to receive packet: {}", e))),
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        // Write trailer if still open
        if !self.closed {
            if let Err(e) = self.close() {
                tracing::warn!("Failed to close {}: {}", self.path.display(), e);
            }
        }
        tracing::debug!(
            "Released writer for {} after {} frames",
            self.path.display(),
            self.frame_count
        );
    }
}
