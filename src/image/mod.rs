//! Pixel access capabilities.
//!
//! The codec never owns image storage. It reads through [`EarsImage`] and,
//! on the encode path, writes through [`WritableEarsImage`]. Whatever pixel
//! buffer the host owns implements these traits; [`Texture`] is a plain
//! in-memory implementation for tools and tests.

mod region;
mod texture;

pub use region::Rectangle;
pub use texture::{ImageError, Texture, SKIN_SIZE};

/// Read access to a skin texture.
///
/// Colors are packed `0xAARRGGBB`.
pub trait EarsImage {
    /// Width of the image in pixels.
    fn width(&self) -> u32;

    /// Height of the image in pixels.
    fn height(&self) -> u32;

    /// Returns the packed ARGB color at `(x, y)`.
    fn argb(&self, x: u32, y: u32) -> u32;

    /// Returns only the alpha byte at `(x, y)`.
    #[inline]
    fn alpha(&self, x: u32, y: u32) -> u8 {
        (self.argb(x, y) >> 24) as u8
    }
}

/// Write access to a skin texture. Only needed for encoding.
pub trait WritableEarsImage: EarsImage {
    /// Replaces the packed ARGB color at `(x, y)`.
    fn set_argb(&mut self, x: u32, y: u32, argb: u32);
}

impl<T: EarsImage + ?Sized> EarsImage for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn argb(&self, x: u32, y: u32) -> u32 {
        (**self).argb(x, y)
    }
}

impl<T: EarsImage + ?Sized> EarsImage for &mut T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn argb(&self, x: u32, y: u32) -> u32 {
        (**self).argb(x, y)
    }
}

impl<T: WritableEarsImage + ?Sized> WritableEarsImage for &mut T {
    fn set_argb(&mut self, x: u32, y: u32, argb: u32) {
        (**self).set_argb(x, y, argb)
    }
}
