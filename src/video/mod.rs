//! Video input and output
//!
//! - [`VideoReader`] demuxes and decodes a container into BGR [`Frame`]s
//! - [`VideoWriter`] encodes BGR frames and muxes them into a container
//!
//! Both are RAII handles: dropping one releases its FFmpeg state exactly once,
//! whatever path the surrounding job took.
//!
//! [`Frame`]: crate::types::Frame

mod reader;
mod writer;

pub use reader::VideoReader;
pub use writer::{VideoWriter, WriterConfig};

use crate::error::{Error, Result};
use crate::types::{Framerate, Resolution};

use ffmpeg_next as ffmpeg;

/// Properties of an opened input stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub resolution: Resolution,
    pub framerate: Framerate,
    /// Frame count reported by the container (0 if unknown)
    pub frame_count: u64,
    pub codec_id: ffmpeg::codec::Id,
    /// Fourcc stored by the container, 0 if it stores none
    pub codec_tag: u32,
}

impl VideoInfo {
    /// Codec tag as text, e.g. `mp4v`
    pub fn fourcc(&self) -> String {
        self.codec_tag
            .to_le_bytes()
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect()
    }
}

/// Largest time base term the MPEG-4 Part 2 encoder accepts
pub(crate) const MPEG4_MAX_TIME_BASE: u32 = 65535;

/// Initialize FFmpeg and keep its own logging to errors only
pub(crate) fn init_ffmpeg() -> Result<()> {
    ffmpeg::init().map_err(|e| Error::FFmpeg(e.to_string()))?;
    ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
    Ok(())
}

/// Copy plane 0 of a packed video frame into a buffer without row padding
pub(crate) fn packed_from_video(video: &ffmpeg::frame::Video, channels: usize) -> Vec<u8> {
    let row = video.width() as usize * channels;
    let stride = video.stride(0);
    let plane = video.data(0);

    let mut out = Vec::with_capacity(row * video.height() as usize);
    for y in 0..video.height() as usize {
        out.extend_from_slice(&plane[y * stride..y * stride + row]);
    }
    out
}

/// Copy a padding-free buffer into plane 0 of a packed video frame
pub(crate) fn fill_video_from_packed(video: &mut ffmpeg::frame::Video, data: &[u8], channels: usize) {
    let row = video.width() as usize * channels;
    let stride = video.stride(0);
    let height = video.height() as usize;
    let plane = video.data_mut(0);

    for (y, src) in data.chunks_exact(row).take(height).enumerate() {
        plane[y * stride..y * stride + row].copy_from_slice(src);
    }
}

impl From<Framerate> for ffmpeg::Rational {
    fn from(rate: Framerate) -> Self {
        ffmpeg::Rational::new(rate.num as i32, rate.den as i32)
    }
}

/// Convert an FFmpeg rational, mapping negative or zero parts to 0/0
pub(crate) fn framerate_from_rational(rate: ffmpeg::Rational) -> Framerate {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Framerate::new(rate.numerator() as u32, rate.denominator() as u32)
    } else {
        Framerate::new(0, 0)
    }
}

/// Approximate a rate by a fraction whose terms both fit in `max`.
///
/// Exact rates are only reduced; invalid rates pass through unchanged.
pub(crate) fn limit_framerate(rate: Framerate, max: u32) -> Framerate {
    if !rate.is_valid() {
        return rate;
    }
    let g = gcd(rate.num, rate.den);
    let reduced = Framerate::new(rate.num / g, rate.den / g);
    if reduced.num <= max && reduced.den <= max {
        return reduced;
    }

    let max = i32::try_from(max).unwrap_or(i32::MAX);
    let approx = unsafe { ffmpeg::ffi::av_d2q(reduced.as_f64(), max) };
    framerate_from_rational(ffmpeg::Rational::from(approx))
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
