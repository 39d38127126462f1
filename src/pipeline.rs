//! Upscaling pipelines
//!
//! Image: decode → upscale → encode.
//! Video: open reader → open writer → decode/upscale/encode each frame → close.
//!
//! Everything runs on the calling thread, one frame at a time.

use crate::config::{Settings, VideoSettings};
use crate::error::{Error, Result};
use crate::media::{self, JobKind, VideoCodec};
use crate::processing::{self, frame_to_mat, mat_to_frame, Upscaler};
use crate::types::{Framerate, Resolution};
use crate::video::{VideoReader, VideoWriter, WriterConfig};

use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Vector;
use opencv::imgcodecs::{imread, imwrite, IMREAD_COLOR};
use opencv::prelude::*;
use std::path::Path;

/// Options for a video job
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoOptions {
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    pub settings: VideoSettings,
}

impl VideoOptions {
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_settings(mut self, settings: VideoSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl From<&Settings> for VideoOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            show_progress: settings.progress,
            settings: settings.video,
        }
    }
}

/// What a finished video job produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSummary {
    pub frames: u64,
    pub input: Resolution,
    pub output: Resolution,
    pub codec: VideoCodec,
    pub framerate: Framerate,
}

/// Outcome of [`run`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobSummary {
    Image(Resolution),
    Video(VideoSummary),
}

/// Classify the input/output pair and run the matching pipeline
pub fn run<U: Upscaler + ?Sized>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    upscaler: &U,
    options: VideoOptions,
) -> Result<JobSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());
    match media::classify_job(input, output)? {
        JobKind::Image => upscale_image(input, output, upscaler).map(JobSummary::Image),
        JobKind::Video => upscale_video(input, output, upscaler, options).map(JobSummary::Video),
    }
}

/// Upscale a single image; the output format follows the output extension
pub fn upscale_image<U: Upscaler + ?Sized>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    upscaler: &U,
) -> Result<Resolution> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let input_str = path_str(input)?;
    let output_str = path_str(output)?;

    let image = imread(input_str, IMREAD_COLOR)
        .map_err(|e| Error::ImageRead(format!("{}: {}", input.display(), e)))?;
    if image.empty() {
        return Err(Error::ImageRead(format!(
            "{}: missing, unreadable or unsupported format",
            input.display()
        )));
    }

    let frame = mat_to_frame(&image)?;
    let upscaled = processing::upscale_frame(upscaler, &frame)?;
    let result = frame_to_mat(&upscaled)?;

    let written = imwrite(output_str, &result, &Vector::new())
        .map_err(|e| Error::ImageWrite(format!("{}: {}", output.display(), e)))?;
    if !written {
        return Err(Error::ImageWrite(format!(
            "{}: encoder refused the output format",
            output.display()
        )));
    }

    tracing::info!(
        "Upscaled {} ({}) -> {} ({})",
        input.display(),
        frame.resolution(),
        output.display(),
        upscaled.resolution()
    );

    Ok(upscaled.resolution())
}

/// Upscale every frame of a video into a new container.
///
/// The codec is chosen from the output extension before anything is opened.
/// Reader and writer are released on every exit path; a failed job leaves
/// whatever was written so far on disk.
pub fn upscale_video<U: Upscaler + ?Sized>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    upscaler: &U,
    options: VideoOptions,
) -> Result<VideoSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let codec = media::infer_codec(output)?;

    let mut reader = VideoReader::open(input)?;
    let info = reader.info();
    let out_resolution = upscaler.output_resolution(info.resolution);

    let config = WriterConfig::new(codec, out_resolution, info.framerate)
        .with_settings(options.settings);
    let mut writer = VideoWriter::create(output, config)?;
    let framerate = writer.config().framerate;

    let progress = progress_bar(options.show_progress, info.frame_count)?;

    while let Some(frame) = reader.next_frame()? {
        let upscaled = processing::upscale_frame(upscaler, &frame)?;
        writer.write(&upscaled)?;
        progress.inc(1);
        tracing::debug!("Frame {} upscaled to {}", frame.index, upscaled.resolution());
    }
    progress.finish();

    let frames = writer.finish()?;

    Ok(VideoSummary {
        frames,
        input: info.resolution,
        output: out_resolution,
        codec,
        framerate,
    })
}

fn progress_bar(show: bool, total: u64) -> Result<ProgressBar> {
    if !show {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
        )
        .map_err(|e| Error::Config(e.to_string()))?
        .progress_chars("#>-"),
    );
    Ok(bar)
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path is not valid UTF-8: {}", path.display()),
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::NearestUpscaler;
    use crate::types::Frame;
    use crate::video::fixtures::write_clip;

    /// Fails on the second frame it sees
    struct FailsOnSecond(std::cell::Cell<u32>);

    impl Upscaler for FailsOnSecond {
        fn scale(&self) -> u32 {
            2
        }

        fn upscale(&self, frame: &Frame) -> Result<Frame> {
            let seen = self.0.get();
            self.0.set(seen + 1);
            if seen == 1 {
                return Err(Error::Inference("synthetic failure".into()));
            }
            NearestUpscaler::new(2).upscale(frame)
        }
    }

    fn quiet() -> VideoOptions {
        VideoOptions::default().with_progress(false)
    }

    #[test]
    fn test_video_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip_up.mp4");
        write_clip(&input, Resolution::new(10, 10), 3);

        let summary = upscale_video(&input, &output, &NearestUpscaler::new(4), quiet()).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.output, Resolution::new(40, 40));
        assert_eq!(summary.codec, VideoCodec::Mp4v);

        let mut reader = VideoReader::open(&output).unwrap();
        let info = reader.info();
        assert_eq!(info.resolution, Resolution::new(40, 40));
        assert!((info.framerate.as_f64() - 30.0).abs() < 0.5);
        assert_eq!(info.codec_id, ffmpeg_next::codec::Id::MPEG4);
        assert_eq!(info.fourcc(), "mp4v");

        let mut frames = 0;
        while reader.next_frame().unwrap().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_unsupported_codec_opens_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip_up.xyz");
        write_clip(&input, Resolution::new(10, 10), 1);

        let err = upscale_video(&input, &output, &NearestUpscaler::new(4), quiet()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodec(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_unsupported_codec_checked_before_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = upscale_video(
            dir.path().join("missing.mp4"),
            dir.path().join("out.mkv"),
            &NearestUpscaler::new(2),
            quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCodec(_)));
    }

    #[test]
    fn test_zero_frame_video() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.mp4");
        let output = dir.path().join("empty_up.mp4");
        write_clip(&input, Resolution::new(10, 10), 0);

        let summary = upscale_video(&input, &output, &NearestUpscaler::new(4), quiet()).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(output.exists());

        let mut reader = VideoReader::open(&output).unwrap();
        let info = reader.info();
        assert_eq!(info.resolution, Resolution::new(40, 40));
        assert!((info.framerate.as_f64() - 30.0).abs() < 0.5);
        assert_eq!(info.codec_id, ffmpeg_next::codec::Id::MPEG4);
        assert_eq!(info.fourcc(), "mp4v");
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_rgba_video_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip_up.avi");
        write_clip(&input, Resolution::new(6, 4), 2);

        let summary = upscale_video(&input, &output, &NearestUpscaler::new(2), quiet()).unwrap();
        assert_eq!(summary.codec, VideoCodec::Rgba);

        let mut reader = VideoReader::open(&output).unwrap();
        let info = reader.info();
        assert_eq!(info.resolution, Resolution::new(12, 8));
        assert_eq!(info.codec_id, ffmpeg_next::codec::Id::RAWVIDEO);
        assert_eq!(info.fourcc(), "RGBA");

        let mut frames = 0;
        while reader.next_frame().unwrap().is_some() {
            frames += 1;
        }
        assert_eq!(frames, 2);
    }

    #[test]
    fn test_inference_failure_aborts_and_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip_up.mp4");
        write_clip(&input, Resolution::new(10, 10), 3);

        let upscaler = FailsOnSecond(std::cell::Cell::new(0));
        let err = upscale_video(&input, &output, &upscaler, quiet()).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert_eq!(upscaler.0.get(), 2);
        // no rollback
        assert!(output.exists());
    }

    #[test]
    fn test_image_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        let output = dir.path().join("photo_up.bmp");

        let mut frame = Frame::new(5, 3, 3);
        frame.data.iter_mut().enumerate().for_each(|(i, v)| *v = (i * 7) as u8);
        let mat = frame_to_mat(&frame).unwrap();
        assert!(imwrite(input.to_str().unwrap(), &mat, &Vector::new()).unwrap());

        let out = upscale_image(&input, &output, &NearestUpscaler::new(2)).unwrap();
        assert_eq!(out, Resolution::new(10, 6));

        let written = imread(output.to_str().unwrap(), IMREAD_COLOR).unwrap();
        assert_eq!((written.cols(), written.rows()), (10, 6));
        // lossless formats keep the top-left pixel
        assert_eq!(&mat_to_frame(&written).unwrap().data[0..3], &frame.data[0..3]);
    }

    #[test]
    fn test_unreadable_image_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        let output = dir.path().join("broken_up.png");
        std::fs::write(&input, b"not a png").unwrap();

        let err = upscale_image(&input, &output, &NearestUpscaler::new(2)).unwrap_err();
        assert!(matches!(err, Error::ImageRead(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            dir.path().join("photo.png"),
            dir.path().join("photo.mp4"),
            &NearestUpscaler::new(4),
            quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MediaMismatch { .. }));
        assert!(err.is_classification_error());
    }

    #[test]
    fn test_run_dispatches_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        let output = dir.path().join("clip_up.mp4");
        write_clip(&input, Resolution::new(10, 10), 2);

        match run(&input, &output, &NearestUpscaler::new(2), quiet()).unwrap() {
            JobSummary::Video(summary) => {
                assert_eq!(summary.frames, 2);
                assert_eq!(summary.output, Resolution::new(20, 20));
            }
            other => panic!("expected a video job, got {:?}", other),
        }

        let image_in = dir.path().join("photo.png");
        let image_out = dir.path().join("photo_up.png");
        let mat = frame_to_mat(&Frame::new(4, 3, 3)).unwrap();
        assert!(imwrite(image_in.to_str().unwrap(), &mat, &Vector::new()).unwrap());
        assert_eq!(
            run(&image_in, &image_out, &NearestUpscaler::new(2), quiet()).unwrap(),
            JobSummary::Image(Resolution::new(8, 6))
        );
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings::default().with_progress(false);
        let options = VideoOptions::from(&settings);
        assert!(!options.show_progress);
        assert_eq!(options.settings, settings.video);
    }
}
