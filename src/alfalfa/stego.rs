//! Embedding into alpha bits.
//!
//! The wire payload is treated as one big-endian unsigned integer and cut
//! into 7-bit fields, least significant first. Field `n` lands in the `n`th
//! claimed pixel of [`ENCODE_REGIONS`], visited region by region, column by
//! column. A pixel stores field `v` as alpha `(0x7F - v) | 0x80`, so an
//! untouched opaque pixel reads back as zero and every written pixel stays
//! visually opaque.

use super::{Alfalfa, AlfalfaError};
use crate::image::{EarsImage, Rectangle, WritableEarsImage, SKIN_SIZE};

/// The forced-opaque parts of a skin, minus the front of the head so
/// launcher previews and avatar services are left alone.
pub const ENCODE_REGIONS: [Rectangle; 10] = [
    Rectangle::new(8, 0, 24, 8),
    Rectangle::new(0, 8, 8, 16),
    Rectangle::new(16, 8, 32, 16),
    Rectangle::new(4, 16, 12, 20),
    Rectangle::new(20, 16, 36, 20),
    Rectangle::new(44, 16, 52, 20),
    Rectangle::new(0, 20, 56, 32),
    Rectangle::new(20, 48, 28, 52),
    Rectangle::new(36, 48, 44, 52),
    Rectangle::new(16, 52, 48, 64),
];

/// Hard limit on the encoded payload size.
pub const MAX_PAYLOAD_BYTES: usize = 1428;

const FIELD_BITS: usize = 7;
const FIELD_MASK: u8 = 0x7F;

/// Total number of pixels in [`ENCODE_REGIONS`].
pub const fn region_slots() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < ENCODE_REGIONS.len() {
        total += ENCODE_REGIONS[i].area() as usize;
        i += 1;
    }
    total
}

/// Collects 7-bit fields into a little-endian bit buffer.
#[derive(Debug, Default)]
struct FieldAccumulator {
    le: Vec<u8>,
    fields: usize,
}

impl FieldAccumulator {
    fn push(&mut self, field: u8) {
        let bit = self.fields * FIELD_BITS;
        let (byte, shift) = (bit / 8, bit % 8);
        if self.le.len() < byte + 2 {
            self.le.resize(byte + 2, 0);
        }
        let wide = u16::from(field & FIELD_MASK) << shift;
        self.le[byte] |= wide as u8;
        self.le[byte + 1] |= (wide >> 8) as u8;
        self.fields += 1;
    }

    fn is_zero(&self) -> bool {
        self.le.iter().all(|&b| b == 0)
    }

    /// Minimal two's-complement big-endian form of the accumulated value.
    ///
    /// A value whose top byte has its high bit set gains a leading zero byte.
    /// The wire format's reserved first byte is that sign byte.
    fn to_signed_be_bytes(&self) -> Vec<u8> {
        let mut be: Vec<u8> = self
            .le
            .iter()
            .rev()
            .copied()
            .skip_while(|&b| b == 0)
            .collect();
        if be.first().map_or(true, |&b| b & 0x80 != 0) {
            be.insert(0, 0);
        }
        be
    }
}

/// Extracts field `index` from a big-endian payload, counting from the least
/// significant end. Fields past the top of the payload are zero.
fn field_at(payload: &[u8], index: usize) -> u8 {
    let bit = index * FIELD_BITS;
    let (from_end, shift) = (bit / 8, bit % 8);
    let byte_from_end = |k: usize| -> u16 {
        payload
            .len()
            .checked_sub(k + 1)
            .map_or(0, |i| u16::from(payload[i]))
    };
    let wide = byte_from_end(from_end) | (byte_from_end(from_end + 1) << 8);
    ((wide >> shift) as u8) & FIELD_MASK
}

fn is_skin_sized<I: EarsImage + ?Sized>(img: &I) -> bool {
    img.width() == SKIN_SIZE && img.height() == SKIN_SIZE
}

impl Alfalfa {
    /// Reads the store hidden in `img`.
    ///
    /// Images that are not 64x64 carry no store. Fully transparent pixels are not slots and are skipped. Anything that
    /// does not decode cleanly yields [`Alfalfa::NONE`].
    pub fn read<I: EarsImage + ?Sized>(img: &I) -> Alfalfa {
        if !is_skin_sized(img) {
            tracing::debug!(
                width = img.width(),
                height = img.height(),
                "Not a 64x64 skin, no Alfalfa data"
            );
            return Alfalfa::NONE;
        }
        let mut acc = FieldAccumulator::default();
        for rect in &ENCODE_REGIONS {
            for (x, y) in rect.columns() {
                let alpha = img.alpha(x, y);
                if alpha == 0 {
                    continue;
                }
                acc.push(FIELD_MASK - (alpha & FIELD_MASK));
            }
        }

        if acc.is_zero() {
            tracing::debug!("Found no Alfalfa data in alpha channel");
            return Alfalfa::NONE;
        }
        tracing::debug!(fields = acc.fields, "Read Alfalfa fields from alpha channel");

        match Alfalfa::decode(&acc.to_signed_be_bytes()) {
            Ok(alfalfa) => alfalfa,
            Err(e) => {
                tracing::debug!(error = %e, "Error while reading Alfalfa data");
                Alfalfa::NONE
            }
        }
    }

    /// Embeds the store into `img`, claiming every pixel of the encode regions.
    /// Only 64x64 images can be written.
    ///
    /// Transparent pixels become opaque black before their alpha is rewritten;
    /// the color of any other pixel is preserved. Pixels outside the regions
    /// are never touched.
    pub fn write<I: WritableEarsImage + ?Sized>(&self, img: &mut I) -> Result<(), AlfalfaError> {
        if !is_skin_sized(&*img) {
            return Err(AlfalfaError::NotSkinSized {
                width: img.width(),
                height: img.height(),
            });
        }
        let payload = self.encode()?;
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(AlfalfaError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }
        if payload.len() * 8 > region_slots() * FIELD_BITS {
            tracing::warn!(
                bytes = payload.len(),
                "Alfalfa payload exceeds region capacity; leading bits will be lost"
            );
        }

        let mut index = 0;
        for rect in &ENCODE_REGIONS {
            for (x, y) in rect.columns() {
                let mut argb = img.argb(x, y);
                if argb >> 24 == 0 {
                    argb = 0xFF00_0000;
                }
                let alpha = (FIELD_MASK - field_at(&payload, index)) | 0x80;
                img.set_argb(x, y, (argb & 0x00FF_FFFF) | (u32::from(alpha) << 24));
                index += 1;
            }
        }

        tracing::debug!(
            bytes = payload.len(),
            entries = self.data().len(),
            "Wrote Alfalfa data to alpha channel"
        );
        Ok(())
    }
}
