//! Ears Skin Feature Codec
//!
//! Decodes the cosmetic feature descriptors and side-channel data that the
//! Ears mod hides inside ordinary 64x64 player skin textures.
//!
//! # Architecture
//!
//! ```text
//! image ──► alfalfa (alpha-channel store) ──┐
//!   │                                       ▼
//!   └─────► features (marker pixel → V0 / V1 parser) ──► EarsFeatures
//!                         │
//!                        bits
//! ```
//!
//! # Design Principles
//!
//! - **Never fails on input**: malformed skins decode to defaults or
//!   [`EarsFeatures::DISABLED`], never to an error
//! - **Host-owned pixels**: the codec reads and writes through the
//!   [`EarsImage`] traits and never owns image storage
//! - **Visually invisible**: embedded data only touches alpha bits of
//!   pixels the game renders opaque
//!
//! # Example
//!
//! ```
//! use ears_codec::{Alfalfa, EarsFeatures, Texture};
//!
//! let mut skin = Texture::skin(0xFF00_0000);
//! Alfalfa::empty()
//!     .with_entry("cape", vec![1, 2, 3])
//!     .write(&mut skin)
//!     .unwrap();
//!
//! let alfalfa = Alfalfa::read(&skin);
//! assert_eq!(alfalfa.get("cape").unwrap().as_bytes(), &[1, 2, 3]);
//!
//! // no marker pixel, no features
//! assert!(!EarsFeatures::detect(&skin).is_enabled());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod alfalfa;
pub mod bits;
pub mod config;
pub mod features;
pub mod image;

// Re-export commonly used types at crate root
pub use alfalfa::{Alfalfa, AlfalfaError, Slice};
pub use bits::{BitError, BitReader, BitWriter};
pub use config::{ConfigError, FileConfig};
pub use features::{
    EarAnchor, EarMode, EarsFeatures, FeatureError, FeatureFormat, MagicPixel, TailMode, WingMode,
};
pub use image::{EarsImage, ImageError, Rectangle, Texture, WritableEarsImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
