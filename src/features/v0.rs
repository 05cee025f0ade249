//! Pixelwise feature format.
//!
//! Each pixel of the 4x4 block is either a [`MagicPixel`] token or, for the
//! tail bend, snout and etc pixels, raw channel values. Unrecognized tokens
//! fall back to the field's default.

use tracing::{debug, trace};

use super::{block_coords, EarAnchor, EarMode, EarsFeatures, MagicPixel, TailMode, WingMode};
use crate::alfalfa::Alfalfa;
use crate::image::EarsImage;

const EAR_MODES: &[(MagicPixel, EarMode)] = &[
    (MagicPixel::Red, EarMode::None),
    (MagicPixel::Blue, EarMode::Above),
    (MagicPixel::Green, EarMode::Sides),
    (MagicPixel::Purple, EarMode::Behind),
    (MagicPixel::Cyan, EarMode::Around),
    (MagicPixel::Orange, EarMode::Floppy),
    (MagicPixel::Pink, EarMode::Cross),
    (MagicPixel::Purple2, EarMode::Out),
    (MagicPixel::White, EarMode::Tall),
    (MagicPixel::Gray, EarMode::TallCross),
];

const EAR_ANCHORS: &[(MagicPixel, EarAnchor)] = &[
    (MagicPixel::Blue, EarAnchor::Center),
    (MagicPixel::Green, EarAnchor::Front),
    (MagicPixel::Red, EarAnchor::Back),
];

/// Claws and horn share one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Protrusions {
    claws: bool,
    horn: bool,
}

impl Protrusions {
    const NONE: Protrusions = Protrusions { claws: false, horn: false };
    const CLAWS: Protrusions = Protrusions { claws: true, horn: false };
    const HORN: Protrusions = Protrusions { claws: false, horn: true };
    const BOTH: Protrusions = Protrusions { claws: true, horn: true };
}

const PROTRUSIONS: &[(MagicPixel, Protrusions)] = &[
    (MagicPixel::Blue, Protrusions::NONE),
    (MagicPixel::Red, Protrusions::NONE),
    (MagicPixel::Green, Protrusions::CLAWS),
    (MagicPixel::Purple, Protrusions::HORN),
    (MagicPixel::Cyan, Protrusions::BOTH),
];

const TAIL_MODES: &[(MagicPixel, TailMode)] = &[
    (MagicPixel::Red, TailMode::None),
    (MagicPixel::Blue, TailMode::Down),
    (MagicPixel::Green, TailMode::Back),
    (MagicPixel::Purple, TailMode::Up),
    (MagicPixel::Orange, TailMode::Vertical),
];

const WING_MODES: &[(MagicPixel, WingMode)] = &[
    (MagicPixel::Blue, WingMode::None),
    (MagicPixel::Red, WingMode::None),
    (MagicPixel::Pink, WingMode::SymmetricDual),
    (MagicPixel::Green, WingMode::SymmetricSingle),
    (MagicPixel::Cyan, WingMode::AsymmetricL),
    (MagicPixel::Orange, WingMode::AsymmetricR),
];

const SNOUT_MAX_WIDTH: u8 = 7;
const SNOUT_MAX_HEIGHT: u8 = 4;
const SNOUT_MAX_DEPTH: u8 = 8;
/// Snout height plus offset never exceeds the face.
const FACE_HEIGHT: u8 = 8;

#[inline]
fn pixel<I: EarsImage + ?Sized>(img: &I, idx: u32) -> u32 {
    let (x, y) = block_coords(idx);
    img.argb(x, y)
}

#[inline]
fn magic<I: EarsImage + ?Sized>(img: &I, idx: u32) -> MagicPixel {
    MagicPixel::from_argb(pixel(img, idx))
}

/// Looks up the token at pixel `idx` in `table`, falling back to `default`.
fn magic_field<I, T>(img: &I, idx: u32, table: &[(MagicPixel, T)], default: T, what: &str) -> T
where
    I: EarsImage + ?Sized,
    T: Copy + std::fmt::Debug,
{
    let mp = magic(img, idx);
    match table.iter().find(|(key, _)| *key == mp) {
        Some(&(_, value)) => {
            debug!(pixel = idx, field = what, token = %mp, value = ?value, "Read feature token");
            value
        }
        None => {
            debug!(
                pixel = idx,
                field = what,
                token = %mp,
                default = ?default,
                "Unrecognized token, using default"
            );
            default
        }
    }
}

/// Maps a channel value to -1..1 with 0 reserved for exactly zero.
///
/// Values 1-127 cover -1 to just below 0 and 128-255 cover just above 0 to 1,
/// so an all-black pixel means zero everywhere.
pub(crate) fn px_val_to_unit(value: u8) -> f32 {
    if value == 0 {
        return 0.0;
    }
    let mut j = i32::from(value) - 128;
    if j < 0 {
        j -= 1;
    } else {
        j += 1;
    }
    j as f32 / 128.0
}

struct Tail {
    segments: u8,
    bends: [f32; 4],
}

fn parse_tail(px: u32) -> Tail {
    if MagicPixel::from_argb(px) == MagicPixel::Blue {
        debug!("The tail bend pixel is Magic Blue, treating it as black");
        return Tail { segments: 0, bends: [0.0; 4] };
    }

    let [a, r, g, b] = px.to_be_bytes();
    let bends = [
        px_val_to_unit(255 - a) * 90.0,
        px_val_to_unit(r) * 90.0,
        px_val_to_unit(g) * 90.0,
        px_val_to_unit(b) * 90.0,
    ];
    // the first segment always exists; the rest chain on while non-zero
    let segments = 1 + bends[1..].iter().take_while(|&&bend| bend != 0.0).count() as u8;
    debug!(
        pixel = %format!("{px:08X}"),
        segments,
        bends = ?&bends[..usize::from(segments)],
        "Read tail bend"
    );
    Tail { segments, bends }
}

struct Snout {
    offset: u8,
    width: u8,
    height: u8,
    depth: u8,
}

fn parse_snout(snout: u32, etc: u32) -> Snout {
    if MagicPixel::from_argb(snout) == MagicPixel::Blue {
        debug!("The snout pixel is Magic Blue, treating it as black");
        return Snout { offset: 0, width: 0, height: 0, depth: 0 };
    }

    let [_, w, h, d] = snout.to_be_bytes();
    let [_, _, raw_offset, _] = etc.to_be_bytes();
    // offset is bounded by the raw height byte, before height is capped
    let offset = raw_offset.min(FACE_HEIGHT.saturating_sub(h));
    let width = w.min(SNOUT_MAX_WIDTH);
    let height = h.min(SNOUT_MAX_HEIGHT);
    let depth = d.min(SNOUT_MAX_DEPTH);
    debug!(
        snout = %format!("{:06X}", snout & 0x00FF_FFFF),
        etc = %format!("{:06X}", etc & 0x00FF_FFFF),
        "Snout geometry is {width}x{height}x{depth}+0,{offset}"
    );
    Snout { offset, width, height, depth }
}

/// Returns `(chest_size, cape_enabled)`.
fn parse_etc(etc: u32) -> (f32, bool) {
    if MagicPixel::from_argb(etc) == MagicPixel::Blue {
        debug!("The etc pixel is Magic Blue, treating it as black");
        return (0.0, false);
    }

    let [_, chest, _, flags] = etc.to_be_bytes();
    // only the lower half of the channel range is meaningful
    let chest_size = (f32::from(chest) / 128.0).min(1.0);
    let cape_enabled = flags & 0x10 != 0;
    debug!(
        etc = %format!("{:06X}", etc & 0x00FF_FFFF),
        chest_size,
        cape_enabled,
        "Read etc pixel"
    );
    (chest_size, cape_enabled)
}

pub(crate) fn parse<I: EarsImage + ?Sized>(img: &I, alfalfa: Alfalfa) -> EarsFeatures {
    debug!("Found v0 (pixelwise) data");

    let ear_mode = magic_field(img, 1, EAR_MODES, EarMode::None, "ear mode");
    let ear_anchor = if ear_mode != EarMode::None && ear_mode != EarMode::Behind {
        magic_field(img, 2, EAR_ANCHORS, EarAnchor::Center, "ear anchor")
    } else {
        trace!(?ear_mode, "Ear anchor is not relevant");
        EarAnchor::Center
    };
    let protrusions = magic_field(img, 3, PROTRUSIONS, Protrusions::NONE, "protrusions");
    let tail_mode = magic_field(img, 4, TAIL_MODES, TailMode::None, "tail mode");
    let tail = parse_tail(pixel(img, 5));

    let etc = pixel(img, 7);
    let snout = parse_snout(pixel(img, 6), etc);
    let (chest_size, cape_enabled) = parse_etc(etc);

    let mut wing_mode = magic_field(img, 8, WING_MODES, WingMode::None, "wing mode");
    if wing_mode != WingMode::None && !alfalfa.contains_key("wing") {
        debug!("Wings are enabled, but there is no wing texture in the Alfalfa data. Disabling");
        wing_mode = WingMode::None;
    }
    let animate_wings = magic(img, 9) != MagicPixel::Red;

    EarsFeatures {
        enabled: true,
        ear_mode,
        ear_anchor,
        claws: protrusions.claws,
        horn: protrusions.horn,
        tail_mode,
        tail_segments: tail.segments,
        tail_bends: tail.bends,
        snout_offset: snout.offset,
        snout_width: snout.width,
        snout_height: snout.height,
        snout_depth: snout.depth,
        chest_size,
        wing_mode,
        animate_wings,
        cape_enabled,
        alfalfa,
    }
}
