//! Bit-granular writer, the inverse of [`BitReader`](super::BitReader).

use super::{max_code, BitError};

/// Appends fixed-width unsigned fields MSB-first to a growing byte buffer.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    dest: Vec<u8>,
    /// Total bits written.
    bits: usize,
}

impl BitWriter {
    /// An empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bits
    }

    /// Appends the low `n` bits (1-32) of `value`.
    ///
    /// Bits above `n` are ignored.
    pub fn write(&mut self, n: u32, value: u32) -> Result<(), BitError> {
        if n == 0 || n > 32 {
            return Err(BitError::InvalidWidth(n));
        }
        let value = value & max_code(n);
        for i in (0..n).rev() {
            let bit = ((value >> i) & 1) as u8;
            let offset = self.bits % 8;
            if offset == 0 {
                self.dest.push(0);
            }
            if bit != 0 {
                let last = self.dest.len() - 1;
                self.dest[last] |= 0x80 >> offset;
            }
            self.bits += 1;
        }
        Ok(())
    }

    /// Writes a single-bit flag.
    pub fn write_bool(&mut self, flag: bool) -> Result<(), BitError> {
        self.write(1, u32::from(flag))
    }

    /// Writes `unit` (clamped to `[0, 1]`) as the nearest `n`-bit code.
    pub fn write_unit(&mut self, n: u32, unit: f32) -> Result<(), BitError> {
        let max = max_code(n) as f32;
        let code = (unit.clamp(0.0, 1.0) * max).round() as u32;
        self.write(n, code)
    }

    /// Writes `unit` (clamped to `[-1, 1]`) as a signed-amplitude-mapped code.
    ///
    /// The smallest negative magnitude has no code of its own and is written
    /// as the next negative step so the sign survives.
    pub fn write_sam_unit(&mut self, n: u32, unit: f32) -> Result<(), BitError> {
        self.write(n, unit_to_sam_code(unit, n))
    }

    /// Finishes the stream, zero-padding the final partial byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.dest
    }
}

pub(crate) fn unit_to_sam_code(unit: f32, n: u32) -> u32 {
    let half = 1i64 << (n - 1);
    let unit = if unit.is_nan() { 0.0 } else { unit.clamp(-1.0, 1.0) };
    let mut j = (unit * half as f32).round() as i64;
    if j == 0 {
        return 0;
    }
    if j == -1 {
        j = -2;
    }
    let v = if j > 0 { j - 1 + half } else { j + 1 + half };
    v as u32
}
