//! Legacy color tokens.

use std::fmt;

/// A pixel color from the closed palette of the pixelwise format.
///
/// Only the RGB part of a pixel is compared; alpha is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagicPixel {
    /// Any color outside the palette.
    Unknown,
    /// `#3F23D8`.
    Blue,
    /// `#23D848`.
    Green,
    /// `#D82350`.
    Red,
    /// `#B923D8`.
    Purple,
    /// `#23D8C6`.
    Cyan,
    /// `#D87823`.
    Orange,
    /// `#D823B7`.
    Pink,
    /// `#D823FF`.
    Purple2,
    /// `#FEFDF2`.
    White,
    /// `#5E605A`.
    Gray,
}

impl MagicPixel {
    /// Every named token.
    pub const NAMED: [MagicPixel; 10] = [
        MagicPixel::Blue,
        MagicPixel::Green,
        MagicPixel::Red,
        MagicPixel::Purple,
        MagicPixel::Cyan,
        MagicPixel::Orange,
        MagicPixel::Pink,
        MagicPixel::Purple2,
        MagicPixel::White,
        MagicPixel::Gray,
    ];

    /// The 24-bit color bound to this token.
    pub const fn rgb(self) -> Option<u32> {
        match self {
            MagicPixel::Unknown => None,
            MagicPixel::Blue => Some(0x3F23D8),
            MagicPixel::Green => Some(0x23D848),
            MagicPixel::Red => Some(0xD82350),
            MagicPixel::Purple => Some(0xB923D8),
            MagicPixel::Cyan => Some(0x23D8C6),
            MagicPixel::Orange => Some(0xD87823),
            MagicPixel::Pink => Some(0xD823B7),
            MagicPixel::Purple2 => Some(0xD823FF),
            MagicPixel::White => Some(0xFEFDF2),
            MagicPixel::Gray => Some(0x5E605A),
        }
    }

    /// Classifies a packed ARGB color.
    pub fn from_argb(argb: u32) -> MagicPixel {
        let rgb = argb & 0x00FF_FFFF;
        Self::NAMED
            .into_iter()
            .find(|mp| mp.rgb() == Some(rgb))
            .unwrap_or(MagicPixel::Unknown)
    }
}

impl fmt::Display for MagicPixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MagicPixel::Unknown => "Unknown",
            MagicPixel::Blue => "Blue",
            MagicPixel::Green => "Green",
            MagicPixel::Red => "Red",
            MagicPixel::Purple => "Purple",
            MagicPixel::Cyan => "Cyan",
            MagicPixel::Orange => "Orange",
            MagicPixel::Pink => "Pink",
            MagicPixel::Purple2 => "Purple2",
            MagicPixel::White => "White",
            MagicPixel::Gray => "Gray",
        };
        write!(f, "Magic {name}")
    }
}
