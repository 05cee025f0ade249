//! Bit-granular reader over a byte slice.

use super::{max_code, BitError};

/// Reads fixed-width unsigned fields MSB-first from a byte slice.
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit cursor from the start of `data`.
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Starts reading at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bits not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    /// Number of bits consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Consumes the next `n` bits (1-32) and returns them as an unsigned integer.
    ///
    /// Fails without consuming anything if fewer than `n` bits remain.
    pub fn read(&mut self, n: u32) -> Result<u32, BitError> {
        if n == 0 || n > 32 {
            return Err(BitError::InvalidWidth(n));
        }
        if (n as usize) > self.remaining() {
            return Err(BitError::EndOfData {
                requested: n,
                remaining: self.remaining(),
            });
        }

        let mut value: u64 = 0;
        let mut needed = n;
        while needed > 0 {
            let byte = self.data[self.position / 8];
            let offset = (self.position % 8) as u32;
            let available = 8 - offset;
            let take = available.min(needed);
            // bits [offset, offset + take) of the byte, counting from the MSB
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (byte >> (available - take)) & mask;
            value = (value << take) | u64::from(chunk);
            needed -= take;
            self.position += take as usize;
        }

        Ok(value as u32)
    }

    /// Reads a single bit as a flag.
    pub fn read_bool(&mut self) -> Result<bool, BitError> {
        Ok(self.read(1)? != 0)
    }

    /// Reads an `n`-bit field and scales it to `[0, 1]`.
    pub fn read_unit(&mut self, n: u32) -> Result<f32, BitError> {
        let v = self.read(n)?;
        Ok(v as f32 / max_code(n) as f32)
    }

    /// Reads an `n`-bit signed-amplitude-mapped unit.
    ///
    /// Code 0 is exactly `0.0`. The remaining codes are split around the
    /// midpoint and shifted one step away from zero, so the result lies in
    /// `[-1, 1]` and never collides with the zero code.
    pub fn read_sam_unit(&mut self, n: u32) -> Result<f32, BitError> {
        let v = self.read(n)?;
        Ok(sam_code_to_unit(v, n))
    }
}

pub(crate) fn sam_code_to_unit(v: u32, n: u32) -> f32 {
    if v == 0 {
        return 0.0;
    }
    let half = 1i64 << (n - 1);
    let mut j = i64::from(v) - half;
    if j < 0 {
        j -= 1;
    } else {
        j += 1;
    }
    j as f32 / half as f32
}

impl std::fmt::Debug for BitReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitReader")
            .field("bytes", &self.data.len())
            .field("position", &self.position)
            .finish()
    }
}
