//! Cosmetic feature descriptors.
//!
//! A 4x4 block of pixels at `(0..4, 32..36)` describes which extra features
//! a skin wants. The pixel at `(0, 32)` selects the format:
//!
//! - Magic Blue (`#3F23D8`): the legacy pixelwise format ([`v0`]), where each
//!   pixel is a color token.
//! - `#EA2501` ("EARS01"): the binary format ([`v1`]), where the remaining 15
//!   pixels carry a packed bit stream in their RGB bytes.
//!
//! Parsing never fails. Anything unusable becomes [`EarsFeatures::DISABLED`]
//! or a per-field default.

mod magic;
mod v0;
mod v1;

pub use magic::MagicPixel;
pub use v1::{write_v1, V1_PAYLOAD_BYTES};

use crate::alfalfa::Alfalfa;
use crate::bits::BitError;
use crate::image::{EarsImage, SKIN_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when writing feature data into a texture.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The image is not a 64x64 skin.
    #[error("feature data needs a 64x64 skin, got {width}x{height}")]
    NotSkinSized {
        /// Width of the rejected image.
        width: u32,
        /// Height of the rejected image.
        height: u32,
    },
    /// The bit stream could not be built.
    #[error("failed to pack feature data: {0}")]
    Encoding(#[from] BitError),
}

/// Enumerations whose declaration order is part of the binary format.
pub trait Ordinal: Copy + PartialEq + 'static {
    /// Every variant, in ordinal order.
    const ALL: &'static [Self];

    /// Looks up a variant by its ordinal.
    fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// The variant's position in [`Ordinal::ALL`].
    fn ordinal(self) -> u32 {
        Self::ALL.iter().position(|&v| v == self).unwrap_or(0) as u32
    }
}

/// How ears are attached to the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarMode {
    /// No ears.
    #[default]
    None,
    /// On top of the head.
    Above,
    /// On the sides of the head.
    Sides,
    /// Hanging behind the head.
    Behind,
    /// Around the head.
    Around,
    /// Floppy ears.
    Floppy,
    /// Two ears crossing above the head.
    Cross,
    /// Pointing outward.
    Out,
    /// Tall ears on top.
    Tall,
    /// Tall ears crossing above the head.
    TallCross,
}

impl Ordinal for EarMode {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Above,
        Self::Sides,
        Self::Behind,
        Self::Around,
        Self::Floppy,
        Self::Cross,
        Self::Out,
        Self::Tall,
        Self::TallCross,
    ];
}

/// Where on the head ears sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarAnchor {
    /// Centered on the head.
    #[default]
    Center,
    /// Toward the face.
    Front,
    /// Toward the back.
    Back,
}

impl Ordinal for EarAnchor {
    const ALL: &'static [Self] = &[Self::Center, Self::Front, Self::Back];
}

/// Tail direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TailMode {
    /// No tail.
    #[default]
    None,
    /// Hanging down.
    Down,
    /// Straight back.
    Back,
    /// Curving up.
    Up,
    /// Flat and vertical.
    Vertical,
}

impl Ordinal for TailMode {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Down,
        Self::Back,
        Self::Up,
        Self::Vertical,
    ];
}

/// Wing layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WingMode {
    /// No wings.
    #[default]
    None,
    /// Two mirrored wings.
    SymmetricDual,
    /// One centered wing.
    SymmetricSingle,
    /// A single wing on the left.
    AsymmetricL,
    /// A single wing on the right.
    AsymmetricR,
}

impl Ordinal for WingMode {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::SymmetricDual,
        Self::SymmetricSingle,
        Self::AsymmetricL,
        Self::AsymmetricR,
    ];
}

/// Which feature layout a skin uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureFormat {
    /// Legacy color-coded pixels.
    V0,
    /// Dense bit-packed pixels.
    V1,
}

impl FeatureFormat {
    /// Marker pixel RGB for [`FeatureFormat::V0`] (Magic Blue).
    pub const V0_MAGIC: u32 = 0x3F23D8;
    /// Marker pixel RGB for [`FeatureFormat::V1`] ("EARS01").
    pub const V1_MAGIC: u32 = 0xEA2501;

    /// Inspects the marker pixel at `(0, 32)`.
    ///
    /// Returns `None` for images that are not 64x64 or carry no marker.
    pub fn detect<I: EarsImage + ?Sized>(img: &I) -> Option<FeatureFormat> {
        if img.width() != SKIN_SIZE || img.height() != SKIN_SIZE {
            tracing::debug!(
                width = img.width(),
                height = img.height(),
                "Not a 64x64 skin, no feature data"
            );
            return None;
        }
        match img.argb(0, 32) & 0x00FF_FFFF {
            Self::V0_MAGIC => Some(FeatureFormat::V0),
            Self::V1_MAGIC => Some(FeatureFormat::V1),
            other => {
                tracing::debug!(pixel = %format!("{other:06X}"), "No feature marker pixel");
                None
            }
        }
    }
}

/// The decoded feature record of one skin.
///
/// Built once by a parser and never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarsFeatures {
    /// False only for [`EarsFeatures::DISABLED`].
    pub enabled: bool,
    /// Ear attachment style.
    pub ear_mode: EarMode,
    /// Ear position; only meaningful when ears are present.
    pub ear_anchor: EarAnchor,
    /// Claws on hands and feet.
    pub claws: bool,
    /// A horn on the forehead.
    pub horn: bool,
    /// Tail direction.
    pub tail_mode: TailMode,
    /// Number of tail segments in use, 0-4.
    pub tail_segments: u8,
    /// Bend of each tail segment in degrees; unused segments are 0.
    pub tail_bends: [f32; 4],
    /// Snout rows down from the top of the face.
    pub snout_offset: u8,
    /// Snout width in pixels, 0-7; 0 means no snout.
    pub snout_width: u8,
    /// Snout height in pixels, 0-4.
    pub snout_height: u8,
    /// Snout depth in pixels, 0-8.
    pub snout_depth: u8,
    /// Chest size from 0 to 1.
    pub chest_size: f32,
    /// Wing layout.
    pub wing_mode: WingMode,
    /// Whether wings flap.
    pub animate_wings: bool,
    /// Whether the cape texture in the Alfalfa store is used.
    pub cape_enabled: bool,
    /// Side-channel store read from the same skin.
    #[serde(skip)]
    pub alfalfa: Alfalfa,
}

impl EarsFeatures {
    /// No usable features.
    pub const DISABLED: EarsFeatures = EarsFeatures {
        enabled: false,
        ear_mode: EarMode::None,
        ear_anchor: EarAnchor::Center,
        claws: false,
        horn: false,
        tail_mode: TailMode::None,
        tail_segments: 0,
        tail_bends: [0.0; 4],
        snout_offset: 0,
        snout_width: 0,
        snout_height: 0,
        snout_depth: 0,
        chest_size: 0.0,
        wing_mode: WingMode::None,
        animate_wings: false,
        cape_enabled: false,
        alfalfa: Alfalfa::NONE,
    };

    /// Detects the format from the marker pixel and parses accordingly.
    pub fn detect<I: EarsImage + ?Sized>(img: &I) -> EarsFeatures {
        match FeatureFormat::detect(img) {
            Some(format) => Self::parse(img, format),
            None => Self::DISABLED,
        }
    }

    /// Parses `img` as `format`, reading its Alfalfa store first.
    pub fn parse<I: EarsImage + ?Sized>(img: &I, format: FeatureFormat) -> EarsFeatures {
        if img.width() != SKIN_SIZE || img.height() != SKIN_SIZE {
            return Self::DISABLED;
        }
        let alfalfa = Alfalfa::read(img);
        Self::parse_with(img, format, alfalfa)
    }

    /// Parses `img` as `format` with an already decoded store.
    pub fn parse_with<I: EarsImage + ?Sized>(
        img: &I,
        format: FeatureFormat,
        alfalfa: Alfalfa,
    ) -> EarsFeatures {
        match format {
            FeatureFormat::V0 => v0::parse(img, alfalfa),
            FeatureFormat::V1 => v1::parse(img, alfalfa),
        }
    }

    /// False only for [`EarsFeatures::DISABLED`].
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether any ears are drawn.
    pub fn has_ears(&self) -> bool {
        self.enabled && self.ear_mode != EarMode::None
    }

    /// Whether a tail is drawn.
    pub fn has_tail(&self) -> bool {
        self.enabled && self.tail_mode != TailMode::None
    }

    /// Whether the snout has a non-empty volume.
    pub fn has_snout(&self) -> bool {
        self.enabled && self.snout_width > 0 && self.snout_height > 0 && self.snout_depth > 0
    }

    /// Whether wings are drawn.
    pub fn has_wings(&self) -> bool {
        self.enabled && self.wing_mode != WingMode::None
    }
}

impl Default for EarsFeatures {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Position of feature pixel `idx` in the 4x4 block.
#[inline]
pub(crate) fn block_coords(idx: u32) -> (u32, u32) {
    (idx % 4, 32 + idx / 4)
}
