//! Frame processing
//!
//! The [`Upscaler`] trait is the single seam between the pipelines and the
//! inference backend:
//! - [`crate::model::Model`] runs a pretrained OpenCV super-resolution network
//! - [`NearestUpscaler`] replicates pixels, no weights required

mod mat;
mod nearest;

pub use mat::{frame_to_mat, mat_to_frame};
pub use nearest::{scale_nearest, NearestUpscaler};

use crate::error::{Error, Result};
use crate::types::{Frame, Resolution};

/// Turns one frame into a larger one
///
/// Every call is independent: no state is carried between frames, and an
/// error must abort the surrounding job rather than drop the frame.
pub trait Upscaler {
    /// Linear factor applied to both width and height
    fn scale(&self) -> u32;

    /// Produce the upscaled frame
    fn upscale(&self, frame: &Frame) -> Result<Frame>;

    /// Output geometry for a given input geometry
    fn output_resolution(&self, input: Resolution) -> Resolution {
        input.scaled(self.scale())
    }
}

impl<U: Upscaler + ?Sized> Upscaler for &U {
    fn scale(&self) -> u32 {
        (**self).scale()
    }

    fn upscale(&self, frame: &Frame) -> Result<Frame> {
        (**self).upscale(frame)
    }
}

/// Upscale a frame and check the result has exactly the expected geometry
pub fn upscale_frame<U: Upscaler + ?Sized>(upscaler: &U, frame: &Frame) -> Result<Frame> {
    let expected = upscaler.output_resolution(frame.resolution());
    let result = upscaler.upscale(frame)?;

    if result.resolution() != expected {
        return Err(Error::FrameGeometry {
            expected: expected.to_string(),
            actual: result.resolution().to_string(),
        });
    }

    Ok(result.with_index(frame.index))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Claims scale 2 but returns the input untouched
    struct Liar;

    impl Upscaler for Liar {
        fn scale(&self) -> u32 {
            2
        }

        fn upscale(&self, frame: &Frame) -> Result<Frame> {
            Ok(frame.clone())
        }
    }

    #[test]
    fn test_upscale_frame_geometry() {
        let frame = Frame::new(10, 10, 3);
        for scale in [2, 4, 8] {
            let out = upscale_frame(&NearestUpscaler::new(scale), &frame).unwrap();
            assert_eq!(out.resolution(), Resolution::new(10 * scale, 10 * scale));
        }
    }

    #[test]
    fn test_upscale_frame_rejects_wrong_geometry() {
        let frame = Frame::new(4, 4, 3);
        assert!(matches!(
            upscale_frame(&Liar, &frame),
            Err(Error::FrameGeometry { .. })
        ));
    }

    #[test]
    fn test_dyn_upscaler() {
        let upscaler: Box<dyn Upscaler> = Box::new(NearestUpscaler::new(3));
        let out = upscale_frame(upscaler.as_ref(), &Frame::new(2, 5, 3)).unwrap();
        assert_eq!(out.resolution(), Resolution::new(6, 15));
    }
}
