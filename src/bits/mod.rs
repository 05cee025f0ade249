//! MSB-first bit streams.
//!
//! The dense feature format packs fields of arbitrary width back to back,
//! crossing byte boundaries freely. [`BitReader`] consumes such a stream and
//! [`BitWriter`] produces one.

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

use thiserror::Error;

/// Errors raised by bit stream operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// The stream has fewer bits left than requested.
    #[error("end of data: requested {requested} bits, {remaining} remaining")]
    EndOfData {
        /// Bits the caller asked for.
        requested: u32,
        /// Bits left in the stream.
        remaining: usize,
    },
    /// A field width outside 1-32.
    #[error("invalid field width {0} (must be 1-32)")]
    InvalidWidth(u32),
}

/// Largest code of an `n`-bit field, i.e. `2^n - 1`.
#[inline]
pub(crate) fn max_code(n: u32) -> u32 {
    if n >= 32 {
        u32::MAX
    } else {
        (1u32 << n) - 1
    }
}
