//! Sequential video decoding

use crate::error::{Error, Result};
use crate::types::{Frame, Resolution};

use super::{framerate_from_rational, init_ffmpeg, packed_from_video, VideoInfo};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags as ScalerFlags};
use ffmpeg_next::util::error::EAGAIN;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Packets are still being demuxed
    Reading,
    /// Demuxer hit end of file, decoder is being flushed
    Draining,
    /// No more frames
    Finished,
}

/// Demuxes and decodes the best video stream of a file into BGR frames
pub struct VideoReader {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    stream_index: usize,
    info: VideoInfo,
    // Built on the first decoded frame; the pixel format may be unknown before
    scaler: Option<Scaler>,
    decoded: ffmpeg::frame::Video,
    state: ReadState,
    frames_read: u64,
}

impl VideoReader {
    /// Open a video file and prepare its decoder
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        init_ffmpeg()?;
        let path = path.as_ref().to_path_buf();
        let open_error = |reason: String| Error::VideoOpen(format!("{}: {}", path.display(), reason));

        let input = ffmpeg::format::input(&path).map_err(|e| open_error(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| open_error("no video stream".into()))?;
        let stream_index = stream.index();

        let mut framerate = framerate_from_rational(stream.avg_frame_rate());
        if !framerate.is_valid() {
            framerate = framerate_from_rational(stream.rate());
        }
        let frame_count = stream.frames().max(0) as u64;

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| open_error(format!("failed to open decoder: {}", e)))?;

        let params = stream.parameters();
        let codec_tag = unsafe { (*params.as_ptr()).codec_tag };

        let info = VideoInfo {
            resolution: Resolution::new(decoder.width(), decoder.height()),
            framerate,
            frame_count,
            codec_id: params.id(),
            codec_tag,
        };

        if info.resolution.is_empty() {
            return Err(open_error("video stream has no geometry".into()));
        }

        tracing::info!(
            "Opened {}: {} {} @ {} ({} frames)",
            path.display(),
            info.fourcc(),
            info.resolution,
            info.framerate,
            info.frame_count
        );

        Ok(Self {
            path,
            input,
            decoder,
            stream_index,
            info,
            scaler: None,
            decoded: ffmpeg::frame::Video::empty(),
            state: ReadState::Reading,
            frames_read: 0,
        })
    }

    pub fn info(&self) -> VideoInfo {
        self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Decode the next frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted; that is not an error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if self.state == ReadState::Finished {
                return Ok(None);
            }

            match self.decoder.receive_frame(&mut self.decoded) {
                Ok(()) => return self.convert_decoded().map(Some),
                Err(ffmpeg::Error::Eof) => {
                    self.state = ReadState::Finished;
                    return Ok(None);
                }
                Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => {}
                Err(e) => return Err(Error::Decode(e.to_string())),
            }

            match self.state {
                ReadState::Reading => self.feed_decoder()?,
                // Flushed decoder asking for input: nothing left
                _ => self.state = ReadState::Finished,
            }
        }
    }

    /// Send the next packet of our stream, or end-of-stream, to the decoder
    fn feed_decoder(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) if packet.stream() == self.stream_index => {
                    return self
                        .decoder
                        .send_packet(&packet)
                        .map_err(|e| Error::Decode(e.to_string()));
                }
                Ok(()) => continue,
                Err(ffmpeg::Error::Eof) => {
                    self.state = ReadState::Draining;
                    return self
                        .decoder
                        .send_eof()
                        .map_err(|e| Error::Decode(e.to_string()));
                }
                Err(e) => return Err(Error::Decode(e.to_string())),
            }
        }
    }

    fn convert_decoded(&mut self) -> Result<Frame> {
        let resolution = Resolution::new(self.decoded.width(), self.decoded.height());
        if resolution != self.info.resolution {
            return Err(Error::FrameGeometry {
                expected: self.info.resolution.to_string(),
                actual: resolution.to_string(),
            });
        }

        if self.scaler.is_none() {
            let scaler = Scaler::get(
                self.decoded.format(),
                resolution.width,
                resolution.height,
                Pixel::BGR24,
                resolution.width,
                resolution.height,
                ScalerFlags::BILINEAR,
            )
            .map_err(|e| Error::Decode(format!("Failed to create scaler: {}", e)))?;
            self.scaler = Some(scaler);
        }

        let mut bgr = ffmpeg::frame::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler
                .run(&self.decoded, &mut bgr)
                .map_err(|e| Error::Decode(format!("Pixel conversion failed: {}", e)))?;
        }

        let frame = Frame::from_data(
            packed_from_video(&bgr, 3),
            resolution.width,
            resolution.height,
            3,
        )
        .with_index(self.frames_read);
        self.frames_read += 1;

        tracing::trace!("Decoded frame {}", frame.index);
        Ok(frame)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        tracing::debug!(
            "Released reader for {} after {} frames",
            self.path.display(),
            self.frames_read
        );
    }
}
