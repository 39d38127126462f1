//! Common types used throughout dnnscale

use serde::{Deserialize, Serialize};

/// Frame or image geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Geometry after upscaling by an integer factor.
    ///
    /// Both dimensions are multiplied by the same factor; the result never
    /// depends on the frame content.
    pub const fn scaled(&self, factor: u32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Calculate total pixels
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Framerate representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framerate {
    pub num: u32,
    pub den: u32,
}

impl Framerate {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_30: Self = Self::new(30, 1);

    /// Get framerate as f64
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    /// A rate of 0/x or x/0 carries no timing information
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_25
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{} fps", self.num)
        } else {
            write!(f, "{:.2} fps", self.as_f64())
        }
    }
}

/// A decoded raster: packed 8-bit pixels, `height * width * channels` bytes.
///
/// Channel order is BGR(A), which is what the inference backend and the
/// image codecs expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Packed pixel data, rows without padding
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Interleaved channels per pixel (1, 3 or 4)
    pub channels: u32,
    /// Presentation index within the source stream
    pub index: u64,
}

impl Frame {
    /// Create a zeroed frame
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * channels as usize],
            width,
            height,
            channels,
            index: 0,
        }
    }

    /// Create a frame from existing packed data
    pub fn from_data(data: Vec<u8>, width: u32, height: u32, channels: u32) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            index: 0,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Expected buffer length for the declared geometry
    pub fn expected_len(&self) -> usize {
        self.stride() * self.height as usize
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
