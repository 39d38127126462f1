//! dnnscale — neural super-resolution for images and video
//!
//! Upscales a still image or every frame of a video with a pretrained
//! super-resolution network (EDSR, ESPCN or LapSRN through OpenCV's
//! `dnn_superres`), re-encoding video with FFmpeg.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnnscale::{pipeline, ModelRegistry, VideoOptions};
//!
//! fn main() -> dnnscale::Result<()> {
//!     let registry = ModelRegistry::new("models");
//!     let model = registry.load("espcn")?;
//!
//!     let summary = pipeline::upscale_video(
//!         "clip.mp4",
//!         "clip_up.mp4",
//!         &model,
//!         VideoOptions::default().with_progress(true),
//!     )?;
//!     println!("{} frames at {}", summary.frames, summary.output);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod processing;
pub mod types;
pub mod video;

// Re-exports for convenience
pub use config::{Settings, VideoSettings};
pub use error::{Error, Result};
pub use media::{classify, classify_job, infer_codec, JobKind, MediaKind, VideoCodec};
pub use model::{Algorithm, Model, ModelRegistry, ModelSpec};
pub use pipeline::{JobSummary, VideoOptions, VideoSummary};
pub use processing::{NearestUpscaler, Upscaler};
pub use types::{Frame, Framerate, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
