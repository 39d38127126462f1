//! Nearest-neighbour upscaler
//!
//! A pure-Rust stand-in for a neural model. It needs no weights, which makes
//! it useful for exercising pipelines and for benchmarking the frame path.

use crate::error::{Error, Result};
use crate::types::Frame;

use super::Upscaler;

/// Integer-factor nearest-neighbour upscaler
#[derive(Debug, Clone, Copy)]
pub struct NearestUpscaler {
    scale: u32,
}

impl NearestUpscaler {
    /// Create an upscaler for `scale`; a zero factor is bumped to 1
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }
}

impl Upscaler for NearestUpscaler {
    fn scale(&self) -> u32 {
        self.scale
    }

    fn upscale(&self, frame: &Frame) -> Result<Frame> {
        let data = scale_nearest(
            &frame.data,
            frame.width,
            frame.height,
            frame.channels,
            self.scale,
        )?;
        let out = frame.resolution().scaled(self.scale);
        Ok(Frame::from_data(data, out.width, out.height, frame.channels).with_index(frame.index))
    }
}

/// Scale packed pixel data by an integer factor
pub fn scale_nearest(
    input: &[u8],
    src_width: u32,
    src_height: u32,
    channels: u32,
    factor: u32,
) -> Result<Vec<u8>> {
    let src_w = src_width as usize;
    let src_h = src_height as usize;
    let bpp = channels as usize;
    let factor = factor as usize;

    if input.len() < src_w * src_h * bpp {
        return Err(Error::Inference("Input buffer too small".into()));
    }
    if factor == 1 {
        return Ok(input[..src_w * src_h * bpp].to_vec());
    }

    let dst_w = src_w * factor;
    let dst_h = src_h * factor;
    let mut output = vec![0u8; dst_w * dst_h * bpp];

    for y in 0..dst_h {
        let src_row = (y / factor) * src_w;
        for x in 0..dst_w {
            let src_idx = (src_row + x / factor) * bpp;
            let dst_idx = (y * dst_w + x) * bpp;

            output[dst_idx..dst_idx + bpp].copy_from_slice(&input[src_idx..src_idx + bpp]);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_replicates_pixels() {
        // 2x1 BGR: red, green
        let input = [0, 0, 255, 0, 255, 0];
        let out = scale_nearest(&input, 2, 1, 3, 2).unwrap();
        assert_eq!(out.len(), 4 * 2 * 3);
        assert_eq!(&out[0..3], &[0, 0, 255]);
        assert_eq!(&out[3..6], &[0, 0, 255]);
        assert_eq!(&out[6..9], &[0, 255, 0]);
        // second row mirrors the first
        assert_eq!(&out[12..24], &out[0..12]);
    }

    #[test]
    fn test_buffer_too_small() {
        assert!(scale_nearest(&[0u8; 5], 2, 1, 3, 2).is_err());
    }

    #[test]
    fn test_upscaler_geometry() {
        let upscaler = NearestUpscaler::new(4);
        let frame = Frame::new(10, 7, 3).with_index(3);
        let out = upscaler.upscale(&frame).unwrap();
        assert_eq!((out.width, out.height), (40, 28));
        assert_eq!(out.data.len(), out.expected_len());
        assert_eq!(out.index, 3);
    }

    #[test]
    fn test_zero_scale_clamped() {
        assert_eq!(NearestUpscaler::new(0).scale(), 1);
    }
}
