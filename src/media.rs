//! Media classification
//!
//! Decides from file extensions alone whether a path is a video or an image,
//! and which video codec an output container gets.

use crate::error::{Error, Result};
use ffmpeg_next::codec::Id as CodecId;
use ffmpeg_next::format::Pixel;
use std::path::Path;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Output extension to codec table
const CODEC_TABLE: &[(&str, VideoCodec)] = &[("mp4", VideoCodec::Mp4v), ("avi", VideoCodec::Rgba)];

/// Kind of media a path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

/// What a validated input/output pair will run as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Image,
    Video,
}

/// Video codec for the output container, identified by its fourcc tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2 (`mp4v`)
    Mp4v,
    /// Uncompressed RGBA (`RGBA`)
    Rgba,
}

impl VideoCodec {
    /// Four character code
    pub fn fourcc(&self) -> &'static str {
        match self {
            VideoCodec::Mp4v => "mp4v",
            VideoCodec::Rgba => "RGBA",
        }
    }

    /// Fourcc packed the way containers store it (first character in the low byte)
    pub fn codec_tag(&self) -> u32 {
        let bytes = self.fourcc().as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// FFmpeg codec implementing this tag
    pub fn codec_id(&self) -> CodecId {
        match self {
            VideoCodec::Mp4v => CodecId::MPEG4,
            VideoCodec::Rgba => CodecId::RAWVIDEO,
        }
    }

    /// Pixel format fed to the encoder
    pub fn pixel_format(&self) -> Pixel {
        match self {
            VideoCodec::Mp4v => Pixel::YUV420P,
            VideoCodec::Rgba => Pixel::RGBA,
        }
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.fourcc())
    }
}

/// Lowercased extension without the dot
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Classify a path by its extension (case-insensitive)
pub fn classify(path: impl AsRef<Path>) -> MediaKind {
    match extension(path.as_ref()) {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
        _ => MediaKind::Unknown,
    }
}

/// Infer the video codec from the output path's extension
pub fn infer_codec(path: impl AsRef<Path>) -> Result<VideoCodec> {
    let path = path.as_ref();
    extension(path)
        .and_then(|ext| {
            CODEC_TABLE
                .iter()
                .find(|(e, _)| *e == ext)
                .map(|(_, codec)| *codec)
        })
        .ok_or_else(|| Error::UnsupportedCodec(path.display().to_string()))
}

/// Check that input and output are both videos or both images
pub fn classify_job(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<JobKind> {
    let (input, output) = (input.as_ref(), output.as_ref());
    match (classify(input), classify(output)) {
        (MediaKind::Video, MediaKind::Video) => Ok(JobKind::Video),
        (MediaKind::Image, MediaKind::Image) => Ok(JobKind::Image),
        _ => Err(Error::MediaMismatch {
            input: input.display().to_string(),
            output: output.display().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify("clip.mp4"), MediaKind::Video);
        assert_eq!(classify("CLIP.MP4"), MediaKind::Video);
        assert_eq!(classify("dir/movie.Avi"), MediaKind::Video);
        assert_eq!(classify("photo.PNG"), MediaKind::Image);
        assert_eq!(classify("photo.JpEg"), MediaKind::Image);
        assert_eq!(classify("anim.gif"), MediaKind::Image);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("clip.mkv"), MediaKind::Unknown);
        assert_eq!(classify("notes.txt"), MediaKind::Unknown);
        assert_eq!(classify("no_extension"), MediaKind::Unknown);
        assert_eq!(classify(".mp4"), MediaKind::Unknown);
    }

    #[test]
    fn test_infer_codec() {
        assert_eq!(infer_codec("clip_up.mp4").unwrap(), VideoCodec::Mp4v);
        assert_eq!(infer_codec("clip_up.AVI").unwrap(), VideoCodec::Rgba);
        assert_eq!(VideoCodec::Mp4v.fourcc(), "mp4v");
        assert_eq!(VideoCodec::Rgba.fourcc(), "RGBA");
        assert_eq!(VideoCodec::Rgba.codec_tag(), u32::from_le_bytes(*b"RGBA"));
        assert_eq!(VideoCodec::Mp4v.codec_tag(), 0x7634_706d);
        assert!(matches!(
            infer_codec("clip_up.xyz"),
            Err(Error::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn test_classification_is_pure() {
        for path in ["a.mp4", "b.png", "c.xyz"] {
            assert_eq!(classify(path), classify(path));
            assert_eq!(infer_codec(path).ok(), infer_codec(path).ok());
        }
    }

    #[test]
    fn test_classify_job() {
        assert_eq!(classify_job("clip.mp4", "clip_up.avi").unwrap(), JobKind::Video);
        assert_eq!(classify_job("photo.jpg", "photo_up.png").unwrap(), JobKind::Image);
        assert!(matches!(
            classify_job("photo.png", "photo.mp4"),
            Err(Error::MediaMismatch { .. })
        ));
        assert!(classify_job("notes.txt", "notes.txt").is_err());
    }
}
