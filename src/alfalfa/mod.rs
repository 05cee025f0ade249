//! Alfalfa: a keyed side-channel hidden in a skin's alpha channel.
//!
//! Parts of a skin are always rendered opaque, so their alpha bytes carry no
//! visual information. Alfalfa reuses seven bits of each of those alpha
//! bytes to store a small versioned key/value container.
//!
//! The container has two layers:
//!
//! ```text
//! Alfalfa ──encode──▶ wire bytes ──write──▶ alpha bits in ENCODE_REGIONS
//!         ◀─decode─── wire bytes ◀──read───
//! ```
//!
//! Decoding is fail-open: bad magic, unknown versions, and truncated streams
//! all degrade to [`Alfalfa::NONE`]. Encoding reports hard-constraint
//! violations as [`AlfalfaError`].

mod key;
mod slice;
mod stego;
mod wire;

pub use key::{Key, PREDEFINED_KEYS};
pub use slice::Slice;
pub use stego::{ENCODE_REGIONS, MAX_PAYLOAD_BYTES};
pub use wire::MAGIC;

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while encoding, or internally while decoding, Alfalfa data.
#[derive(Debug, Error)]
pub enum AlfalfaError {
    /// Only version 1 can be encoded.
    #[error("don't know how to write Alfalfa version {0}")]
    UnsupportedVersion(u8),
    /// A map key that cannot be written to the wire.
    #[error("cannot write an entry with name {key:?}: {reason}")]
    InvalidKey {
        /// The offending map key.
        key: String,
        /// Which rule it breaks.
        reason: &'static str,
    },
    /// The encoded payload is over [`MAX_PAYLOAD_BYTES`].
    #[error("cannot write more than {max} bytes of data (got {len} bytes)")]
    PayloadTooLarge {
        /// Encoded payload size.
        len: usize,
        /// Largest accepted payload size.
        max: usize,
    },
    /// The image is not a 64x64 skin.
    #[error("Alfalfa data needs a 64x64 skin, got {width}x{height}")]
    NotSkinSized {
        /// Width of the rejected image.
        width: u32,
        /// Height of the rejected image.
        height: u32,
    },
    /// The wire stream ended mid-structure.
    #[error("unexpected end of Alfalfa data")]
    Truncated,
    /// Streaming a value failed.
    #[error("failed to stream entry data: {0}")]
    Io(#[from] std::io::Error),
}

/// An immutable versioned key/value store.
///
/// Version 0 is the empty store, [`Alfalfa::NONE`]. Version 1 is the only
/// format that can currently be written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alfalfa {
    version: u8,
    data: BTreeMap<String, Slice>,
}

impl Alfalfa {
    /// The empty store.
    pub const NONE: Alfalfa = Alfalfa {
        version: 0,
        data: BTreeMap::new(),
    };

    /// The only version this crate can write.
    pub const CURRENT_VERSION: u8 = 1;

    /// Wraps an already built entry map.
    pub fn new(version: u8, data: BTreeMap<String, Slice>) -> Self {
        Self { version, data }
    }

    /// An empty store at the current version, ready for entries.
    pub fn empty() -> Self {
        Self::new(Self::CURRENT_VERSION, BTreeMap::new())
    }

    /// Format version; 0 for [`Alfalfa::NONE`].
    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// All entries, in key order.
    #[inline]
    pub fn data(&self) -> &BTreeMap<String, Slice> {
        &self.data
    }

    /// Looks up one entry's value.
    pub fn get(&self, key: &str) -> Option<&Slice> {
        self.data.get(key)
    }

    /// Whether an entry named `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns true for the version 0 store.
    pub fn is_none(&self) -> bool {
        self.version == 0
    }

    /// Returns a copy with `key` set to `value`.
    ///
    /// Adding to [`Alfalfa::NONE`] upgrades the copy to the current version.
    pub fn with_entry(&self, key: impl Into<String>, value: impl Into<Slice>) -> Self {
        let mut data = self.data.clone();
        data.insert(key.into(), value.into());
        let version = if self.is_none() {
            Self::CURRENT_VERSION
        } else {
            self.version
        };
        Self { version, data }
    }

    /// Returns a copy with `key` removed.
    pub fn without_entry(&self, key: &str) -> Self {
        let mut data = self.data.clone();
        data.remove(key);
        Self {
            version: self.version,
            data,
        }
    }
}

impl Default for Alfalfa {
    fn default() -> Self {
        Self::NONE
    }
}
