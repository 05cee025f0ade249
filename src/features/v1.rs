//! Bit-packed feature format.
//!
//! The 15 pixels after the marker contribute their R, G and B bytes, in
//! block order, to a 45-byte stream read MSB-first:
//!
//! ```text
//! version:8  ears:6  claws:1  horn:1
//! tail:3  [segments-1:2  bend:6 x segments]
//! snout_width:3  [height-1:2  depth-1:3  offset:3]
//! chest:5  wing:3  [animate:1]  cape:1
//! ```
//!
//! Bracketed groups are only present when the preceding field is non-zero.

use tracing::debug;

use super::{
    block_coords, EarAnchor, EarMode, EarsFeatures, FeatureError, FeatureFormat, Ordinal,
    TailMode, WingMode,
};
use crate::alfalfa::Alfalfa;
use crate::bits::{BitError, BitReader, BitWriter};
use crate::image::{EarsImage, WritableEarsImage, SKIN_SIZE};

/// Pixels carrying payload: the block minus the marker.
const DATA_PIXELS: u32 = 15;

/// Size of the byte stream behind the marker.
pub const V1_PAYLOAD_BYTES: usize = DATA_PIXELS as usize * 3;

/// Version byte written by [`write_v1`].
const FORMAT_VERSION: u8 = 0;

const EARS_BITS: u32 = 6;
const ENUM_BITS: u32 = 3;
const SEGMENT_BITS: u32 = 2;
const BEND_BITS: u32 = 6;
const CHEST_BITS: u32 = 5;
const ANCHORS: u32 = 3;

const MAX_TAIL_SEGMENTS: u8 = 4;
const SNOUT_MAX_WIDTH: u8 = 7;
const SNOUT_MAX_HEIGHT: u8 = 4;
const SNOUT_MAX_DEPTH: u8 = 8;
const FACE_HEIGHT: u8 = 8;

fn payload<I: EarsImage + ?Sized>(img: &I) -> Vec<u8> {
    let mut data = Vec::with_capacity(V1_PAYLOAD_BYTES);
    for idx in 1..=DATA_PIXELS {
        let (x, y) = block_coords(idx);
        let [_, r, g, b] = img.argb(x, y).to_be_bytes();
        data.extend_from_slice(&[r, g, b]);
    }
    data
}

pub(crate) fn parse<I: EarsImage + ?Sized>(img: &I, alfalfa: Alfalfa) -> EarsFeatures {
    debug!("Found v1 (binary) data");
    parse_bytes(&payload(img), alfalfa)
}

/// Parses a packed stream; running out of bits disables all features.
fn parse_bytes(data: &[u8], alfalfa: Alfalfa) -> EarsFeatures {
    match decode(data, alfalfa) {
        Ok(features) => features,
        Err(e) => {
            debug!(error = %e, "Ran out of v1 feature data, disabling features");
            EarsFeatures::DISABLED
        }
    }
}

fn decode(data: &[u8], alfalfa: Alfalfa) -> Result<EarsFeatures, BitError> {
    let mut bits = BitReader::new(data);

    let version = bits.read(8)?;
    debug!(version, "Feature data version");

    let ears = bits.read(EARS_BITS)?;
    let (ear_mode, ear_anchor) = if ears == 0 {
        (EarMode::None, EarAnchor::Center)
    } else {
        (
            EarMode::from_ordinal((ears - 1) / ANCHORS + 1).unwrap_or_default(),
            EarAnchor::from_ordinal((ears - 1) % ANCHORS).unwrap_or_default(),
        )
    };
    debug!(?ear_mode, ?ear_anchor, "Ears");

    let claws = bits.read_bool()?;
    let horn = bits.read_bool()?;
    debug!(claws, horn, "Protrusions");

    let tail_mode = TailMode::from_ordinal(bits.read(ENUM_BITS)?).unwrap_or_default();
    let mut tail_segments = 0;
    let mut tail_bends = [0.0; 4];
    if tail_mode != TailMode::None {
        tail_segments = bits.read(SEGMENT_BITS)? as u8 + 1;
        for bend in tail_bends.iter_mut().take(usize::from(tail_segments)) {
            *bend = bits.read_sam_unit(BEND_BITS)? * 90.0;
        }
    }
    debug!(?tail_mode, tail_segments, ?tail_bends, "Tail");

    let snout_width = bits.read(3)? as u8;
    let (mut snout_height, mut snout_depth, mut snout_offset) = (0, 0, 0);
    if snout_width > 0 {
        snout_height = bits.read(2)? as u8 + 1;
        snout_depth = bits.read(3)? as u8 + 1;
        snout_offset = (bits.read(3)? as u8).min(FACE_HEIGHT - snout_height);
    }
    debug!(
        "Snout geometry is {snout_width}x{snout_height}x{snout_depth}+0,{snout_offset}"
    );

    let chest_size = bits.read_unit(CHEST_BITS)?;
    debug!(chest_size, "Chest");

    let wing_mode = WingMode::from_ordinal(bits.read(ENUM_BITS)?).unwrap_or_default();
    let animate_wings = wing_mode != WingMode::None && bits.read_bool()?;
    debug!(?wing_mode, animate_wings, "Wings");

    let cape_enabled = bits.read_bool()?;
    debug!(cape_enabled, remaining = bits.remaining(), "Cape");

    Ok(EarsFeatures {
        enabled: true,
        ear_mode,
        ear_anchor,
        claws,
        horn,
        tail_mode,
        tail_segments,
        tail_bends,
        snout_offset,
        snout_width,
        snout_height,
        snout_depth,
        chest_size,
        wing_mode,
        animate_wings,
        cape_enabled,
        alfalfa,
    })
}

fn encode(features: &EarsFeatures) -> Result<Vec<u8>, BitError> {
    let mut bits = BitWriter::new();
    bits.write(8, u32::from(FORMAT_VERSION))?;

    let ears = match features.ear_mode {
        EarMode::None => 0,
        mode => (mode.ordinal() - 1) * ANCHORS + features.ear_anchor.ordinal() + 1,
    };
    bits.write(EARS_BITS, ears)?;
    bits.write_bool(features.claws)?;
    bits.write_bool(features.horn)?;

    bits.write(ENUM_BITS, features.tail_mode.ordinal())?;
    if features.tail_mode != TailMode::None {
        let segments = features.tail_segments.clamp(1, MAX_TAIL_SEGMENTS);
        bits.write(SEGMENT_BITS, u32::from(segments - 1))?;
        for bend in &features.tail_bends[..usize::from(segments)] {
            bits.write_sam_unit(BEND_BITS, bend / 90.0)?;
        }
    }

    let width = features.snout_width.min(SNOUT_MAX_WIDTH);
    bits.write(3, u32::from(width))?;
    if width > 0 {
        let height = features.snout_height.clamp(1, SNOUT_MAX_HEIGHT);
        let depth = features.snout_depth.clamp(1, SNOUT_MAX_DEPTH);
        let offset = features.snout_offset.min(FACE_HEIGHT - height).min(7);
        bits.write(2, u32::from(height - 1))?;
        bits.write(3, u32::from(depth - 1))?;
        bits.write(3, u32::from(offset))?;
    }

    bits.write_unit(CHEST_BITS, features.chest_size)?;

    bits.write(ENUM_BITS, features.wing_mode.ordinal())?;
    if features.wing_mode != WingMode::None {
        bits.write_bool(features.animate_wings)?;
    }
    bits.write_bool(features.cape_enabled)?;

    let mut data = bits.into_bytes();
    data.resize(V1_PAYLOAD_BYTES, 0);
    Ok(data)
}

/// Writes `features` into the feature block of `img` in the bit-packed
/// format, including the marker pixel.
///
/// Out-of-range values are clamped to what the format can carry. The
/// Alfalfa store is not touched; write it separately with
/// [`Alfalfa::write`].
pub fn write_v1<I: WritableEarsImage + ?Sized>(
    features: &EarsFeatures,
    img: &mut I,
) -> Result<(), FeatureError> {
    if img.width() != SKIN_SIZE || img.height() != SKIN_SIZE {
        return Err(FeatureError::NotSkinSized {
            width: img.width(),
            height: img.height(),
        });
    }
    let data = encode(features)?;

    img.set_argb(0, 32, 0xFF00_0000 | FeatureFormat::V1_MAGIC);
    for (idx, rgb) in (1..=DATA_PIXELS).zip(data.chunks_exact(3)) {
        let (x, y) = block_coords(idx);
        let argb = u32::from_be_bytes([0xFF, rgb[0], rgb[1], rgb[2]]);
        img.set_argb(x, y, argb);
    }
    debug!(
        ear_mode = ?features.ear_mode,
        tail_mode = ?features.tail_mode,
        wing_mode = ?features.wing_mode,
        "Wrote v1 feature data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Texture;

    /// Writes `data` after the marker, leaving trailing pixels black.
    fn texture_with(data: &[u8]) -> Texture {
        let mut texture = Texture::skin(0xFF00_0000);
        texture.set_argb(0, 32, 0xFFEA_2501);
        let mut padded = data.to_vec();
        padded.resize(V1_PAYLOAD_BYTES, 0);
        for (idx, rgb) in (1..=DATA_PIXELS).zip(padded.chunks_exact(3)) {
            let (x, y) = block_coords(idx);
            texture.set_argb(x, y, u32::from_be_bytes([0xFF, rgb[0], rgb[1], rgb[2]]));
        }
        texture
    }

    fn sample() -> EarsFeatures {
        EarsFeatures {
            enabled: true,
            ear_mode: EarMode::Floppy,
            ear_anchor: EarAnchor::Back,
            claws: true,
            horn: false,
            tail_mode: TailMode::Up,
            tail_segments: 3,
            tail_bends: [45.0, -90.0, 2.8125, 0.0],
            snout_offset: 2,
            snout_width: 4,
            snout_height: 3,
            snout_depth: 6,
            chest_size: 10.0 / 31.0,
            wing_mode: WingMode::AsymmetricL,
            animate_wings: false,
            cape_enabled: true,
            alfalfa: Alfalfa::NONE,
        }
    }

    #[test]
    fn test_all_zero_payload() {
        let features = EarsFeatures::detect(&texture_with(&[]));

        assert!(features.is_enabled());
        assert_eq!(features.ear_mode, EarMode::None);
        assert_eq!(features.tail_segments, 0);
        assert!(!features.has_snout());
        assert_eq!(features.chest_size, 0.0);
        assert_eq!(features.wing_mode, WingMode::None);
        assert!(!features.animate_wings);
        assert!(!features.cape_enabled);
    }

    #[test]
    fn test_ears_field() {
        // version 0, then ears in the top six bits of byte 1
        let features = EarsFeatures::detect(&texture_with(&[0x00, 1 << 2]));
        assert_eq!(features.ear_mode, EarMode::Above);
        assert_eq!(features.ear_anchor, EarAnchor::Center);

        let features = EarsFeatures::detect(&texture_with(&[0x00, 4 << 2]));
        assert_eq!(features.ear_mode, EarMode::Sides);
        assert_eq!(features.ear_anchor, EarAnchor::Center);

        let features = EarsFeatures::detect(&texture_with(&[0x00, 6 << 2]));
        assert_eq!(features.ear_mode, EarMode::Sides);
        assert_eq!(features.ear_anchor, EarAnchor::Back);
    }

    #[test]
    fn test_out_of_range_ordinals_fall_back() {
        // ears 63 points past the last mode; tail 7 is not a tail mode
        let features = EarsFeatures::detect(&texture_with(&[0x00, 0xFC, 0xE0]));
        assert_eq!(features.ear_mode, EarMode::None);
        assert_eq!(features.ear_anchor, EarAnchor::Back);
        assert_eq!(features.tail_mode, TailMode::None);
        assert_eq!(features.tail_segments, 0);
    }

    #[test]
    fn test_claws_and_horn() {
        let features = EarsFeatures::detect(&texture_with(&[0x00, 0b0000_0011]));
        assert!(features.claws);
        assert!(features.horn);
    }

    #[test]
    fn test_tail_bends_are_signed() {
        // tail UP, 2 segments, bends 63 (+1.0) and 1 (-1.0)
        let mut bits = BitWriter::new();
        bits.write(16, 0).unwrap();
        bits.write(3, 3).unwrap();
        bits.write(2, 1).unwrap();
        bits.write(6, 63).unwrap();
        bits.write(6, 1).unwrap();
        let features = EarsFeatures::detect(&texture_with(&bits.into_bytes()));

        assert_eq!(features.tail_mode, TailMode::Up);
        assert_eq!(features.tail_segments, 2);
        assert_eq!(features.tail_bends, [90.0, -90.0, 0.0, 0.0]);
    }

    #[test]
    fn test_snout_offset_is_capped() {
        let mut bits = BitWriter::new();
        bits.write(19, 0).unwrap();
        bits.write(3, 5).unwrap(); // width
        bits.write(2, 3).unwrap(); // height 4
        bits.write(3, 7).unwrap(); // depth 8
        bits.write(3, 7).unwrap(); // offset 7
        let features = EarsFeatures::detect(&texture_with(&bits.into_bytes()));

        assert_eq!(features.snout_width, 5);
        assert_eq!(features.snout_height, 4);
        assert_eq!(features.snout_depth, 8);
        assert_eq!(features.snout_offset, 4);
    }

    #[test]
    fn test_exhausted_stream_is_end_of_data() {
        assert!(matches!(
            decode(&[], Alfalfa::NONE),
            Err(BitError::EndOfData { requested: 8, .. })
        ));
        // runs dry at the chest field
        assert!(matches!(
            decode(&[0x00; 3], Alfalfa::NONE),
            Err(BitError::EndOfData { requested: 5, .. })
        ));
    }

    #[test]
    fn test_truncated_stream_is_disabled() {
        let alfalfa = Alfalfa::empty().with_entry("cape", vec![1]);

        // tail UP with 4 segments, then cut off inside the bend run
        let mut bits = BitWriter::new();
        bits.write(16, 0).unwrap();
        bits.write(3, 3).unwrap();
        bits.write(2, 3).unwrap();
        bits.write(6, 63).unwrap();
        bits.write(6, 63).unwrap();
        let in_bends = bits.into_bytes();
        assert_eq!(in_bends.len(), 5);

        for data in [&[][..], &[0x00][..], &[0x00; 3][..], &in_bends[..]] {
            assert_eq!(
                parse_bytes(data, alfalfa.clone()),
                EarsFeatures::DISABLED,
                "{} bytes",
                data.len()
            );
        }
    }

    #[test]
    fn test_complete_stream_keeps_alfalfa() {
        let alfalfa = Alfalfa::empty().with_entry("cape", vec![1]);
        let features = parse_bytes(&[0x00; V1_PAYLOAD_BYTES], alfalfa.clone());

        assert!(features.is_enabled());
        assert_eq!(features.alfalfa, alfalfa);
    }

    #[test]
    fn test_full_payload_never_runs_dry() {
        let data = [0xFF; V1_PAYLOAD_BYTES];
        let features = decode(&data, Alfalfa::NONE).unwrap();
        assert_eq!(features.tail_segments, 0);
        assert_eq!(features.snout_height, 4);
        assert_eq!(features.chest_size, 1.0);
        assert!(features.cape_enabled);
    }

    #[test]
    fn test_write_v1_round_trip() {
        let features = sample();
        let mut texture = Texture::skin(0xFF00_0000);
        write_v1(&features, &mut texture).unwrap();

        assert_eq!(FeatureFormat::detect(&texture), Some(FeatureFormat::V1));
        assert_eq!(EarsFeatures::detect(&texture), features);
    }

    #[test]
    fn test_write_v1_clamps() {
        let mut features = sample();
        features.tail_segments = 9;
        features.tail_bends = [180.0, 0.0, 0.0, 0.0];
        features.snout_width = 200;
        features.snout_height = 0;
        features.snout_depth = 50;
        features.snout_offset = 99;
        features.chest_size = 3.0;

        let mut texture = Texture::skin(0xFF00_0000);
        write_v1(&features, &mut texture).unwrap();
        let parsed = EarsFeatures::detect(&texture);

        assert_eq!(parsed.tail_segments, 4);
        assert_eq!(parsed.tail_bends[0], 90.0);
        assert_eq!(parsed.snout_width, 7);
        assert_eq!(parsed.snout_height, 1);
        assert_eq!(parsed.snout_depth, 8);
        assert_eq!(parsed.snout_offset, 7);
        assert_eq!(parsed.chest_size, 1.0);
    }

    #[test]
    fn test_write_v1_keeps_alfalfa_regions() {
        let alfalfa = Alfalfa::empty().with_entry("wing", vec![3; 16]);
        let mut texture = Texture::skin(0xFF00_0000);
        alfalfa.write(&mut texture).unwrap();
        write_v1(&sample(), &mut texture).unwrap();

        let parsed = EarsFeatures::detect(&texture);
        assert_eq!(parsed.alfalfa, alfalfa);
        assert_eq!(parsed.wing_mode, WingMode::AsymmetricL);
    }

    #[test]
    fn test_write_v1_rejects_legacy_size() {
        let mut texture = Texture::new(64, 32);
        assert!(matches!(
            write_v1(&sample(), &mut texture),
            Err(FeatureError::NotSkinSized { width: 64, height: 32 })
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn sam_bend(code: u8) -> f32 {
            BitReader::new(&[code << 2]).read_sam_unit(6).unwrap() * 90.0
        }

        fn arb_features() -> impl Strategy<Value = EarsFeatures> {
            (
                (0u32..10, 0u32..3, any::<bool>(), any::<bool>()),
                (0u32..5, 1u8..=4, prop::array::uniform4(1u8..64)),
                (0u8..8, 1u8..=4, 1u8..=8, 0u8..8),
                (0u32..32, 0u32..5, any::<bool>(), any::<bool>()),
            )
                .prop_map(|(ears, tail, snout, rest)| {
                    let ear_mode = EarMode::from_ordinal(ears.0).unwrap();
                    let ear_anchor = if ear_mode == EarMode::None {
                        EarAnchor::Center
                    } else {
                        EarAnchor::from_ordinal(ears.1).unwrap()
                    };

                    let tail_mode = TailMode::from_ordinal(tail.0).unwrap();
                    let (tail_segments, mut tail_bends) = if tail_mode == TailMode::None {
                        (0, [0.0; 4])
                    } else {
                        (tail.1, tail.2.map(sam_bend))
                    };
                    for bend in tail_bends.iter_mut().skip(usize::from(tail_segments)) {
                        *bend = 0.0;
                    }

                    let (snout_width, snout_height, snout_depth, snout_offset) = if snout.0 == 0 {
                        (0, 0, 0, 0)
                    } else {
                        (snout.0, snout.1, snout.2, snout.3.min(8 - snout.1))
                    };

                    let wing_mode = WingMode::from_ordinal(rest.1).unwrap();
                    EarsFeatures {
                        enabled: true,
                        ear_mode,
                        ear_anchor,
                        claws: ears.2,
                        horn: ears.3,
                        tail_mode,
                        tail_segments,
                        tail_bends,
                        snout_offset,
                        snout_width,
                        snout_height,
                        snout_depth,
                        chest_size: rest.0 as f32 / 31.0,
                        wing_mode,
                        animate_wings: wing_mode != WingMode::None && rest.2,
                        cape_enabled: rest.3,
                        alfalfa: Alfalfa::NONE,
                    }
                })
        }

        proptest! {
            #[test]
            fn write_then_parse(features in arb_features()) {
                let mut texture = Texture::skin(0xFF00_0000);
                write_v1(&features, &mut texture).unwrap();
                prop_assert_eq!(EarsFeatures::detect(&texture), features);
            }

            #[test]
            fn parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..=V1_PAYLOAD_BYTES)) {
                let _ = decode(&data, Alfalfa::NONE);
            }
        }
    }
}
