//! In-memory ARGB texture.

use super::{EarsImage, WritableEarsImage};
use thiserror::Error;

/// Edge length of a modern skin texture.
pub const SKIN_SIZE: u32 = 64;

/// Errors raised when importing raw pixel data.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The raw dump is not exactly 64x64 pixels.
    #[error("invalid texture data: expected {expected} bytes, got {got}")]
    InvalidDimensions {
        /// Byte length of a 64x64 dump.
        expected: usize,
        /// Byte length supplied.
        got: usize,
    },
}

/// A texture held as a row-major buffer of packed `0xAARRGGBB` colors.
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    /// Packed pixels, `width * height` entries.
    pixels: Vec<u32>,
    /// Texture width in pixels.
    width: u32,
    /// Texture height in pixels.
    height: u32,
}

impl Texture {
    /// Creates a fully transparent black texture.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    /// Creates a texture with every pixel set to `argb`.
    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        Self {
            pixels: vec![argb; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    /// Creates a 64x64 skin-sized texture filled with `argb`.
    pub fn skin(argb: u32) -> Self {
        Self::filled(SKIN_SIZE, SKIN_SIZE, argb)
    }

    /// Imports a raw 64x64 dump of big-endian ARGB words.
    pub fn from_argb_bytes(data: &[u8]) -> Result<Self, ImageError> {
        let expected = (SKIN_SIZE * SKIN_SIZE * 4) as usize;
        if data.len() != expected {
            return Err(ImageError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }
        let pixels = data
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            pixels,
            width: SKIN_SIZE,
            height: SKIN_SIZE,
        })
    }

    /// Exports the texture as big-endian ARGB words.
    pub fn to_argb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_be_bytes()).collect()
    }

    /// Returns the packed pixel buffer.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        (y as usize) * (self.width as usize) + (x as usize)
    }
}

impl EarsImage for Texture {
    #[inline]
    fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn argb(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }
}

impl WritableEarsImage for Texture {
    #[inline]
    fn set_argb(&mut self, x: u32, y: u32, argb: u32) {
        let idx = self.index(x, y);
        self.pixels[idx] = argb;
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}
