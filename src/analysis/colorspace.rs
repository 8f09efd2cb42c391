// Colorspace module - 8-bit colour conversions used by the analysis indices
//
// All conversions follow the 8-bit conventions of the capture environment:
// - Gray: fixed-point BT.601 luma, Y = (4899 R + 9617 G + 1868 B + 2^13) >> 14
// - HSV: H in [0, 180) (degrees / 2), S and V in [0, 255]
// - Lab: L scaled to [0, 255], a and b offset by 128 (sRGB, D65 white);
//   the CIE conversion itself is `palette`'s

use palette::white_point::D65;
use palette::{encoding, FromColor, Hsv, IntoColor, Lab, Srgb};

use crate::frame::{Bgr, Frame};

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

const HSV_SHIFT: i32 = 12;

/// Perceptual gray value of a BGR pixel
#[inline]
pub fn gray(bgr: Bgr) -> u8 {
    let [b, g, r] = bgr;
    let y = (b as u32 * GRAY_B + g as u32 * GRAY_G + r as u32 * GRAY_R + (1 << (GRAY_SHIFT - 1)))
        >> GRAY_SHIFT;
    y.min(255) as u8
}

/// Gray plane of a frame, row-major
pub fn gray_plane(frame: &Frame) -> Vec<u8> {
    frame.pixels().iter().map(|&p| gray(p)).collect()
}

/// Convert a BGR pixel to 8-bit HSV `[h, s, v]` with h in [0, 180)
pub fn bgr_to_hsv(bgr: Bgr) -> [u8; 3] {
    let [b, g, r] = [bgr[0] as i32, bgr[1] as i32, bgr[2] as i32];
    let v = b.max(g).max(r);
    let min = b.min(g).min(r);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        let sdiv = ((255 << HSV_SHIFT) as f64 / v as f64).round() as i32;
        (diff * sdiv + (1 << (HSV_SHIFT - 1))) >> HSV_SHIFT
    };

    let h = if diff == 0 {
        0
    } else {
        let numerator = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let hdiv = ((180 << HSV_SHIFT) as f64 / (6 * diff) as f64).round() as i32;
        let mut h = (numerator * hdiv + (1 << (HSV_SHIFT - 1))) >> HSV_SHIFT;
        if h < 0 {
            h += 180;
        }
        if h >= 180 {
            h -= 180;
        }
        h
    };

    [h as u8, s.clamp(0, 255) as u8, v as u8]
}

/// Convert 8-bit HSV (h in [0, 180)) back to a BGR pixel
pub fn hsv_to_bgr(hsv: [u8; 3]) -> Bgr {
    let hsv: Hsv<encoding::Srgb, f64> = Hsv::new(
        hsv[0] as f64 * 2.0,
        hsv[1] as f64 / 255.0,
        hsv[2] as f64 / 255.0,
    );
    let rgb: Srgb<u8> = Srgb::<f64>::from_color(hsv).into_format();
    [rgb.blue, rgb.green, rgb.red]
}

/// Convert a BGR pixel to 8-bit Lab `[L, a, b]`
pub fn bgr_to_lab(bgr: Bgr) -> [u8; 3] {
    let [l, a, b] = bgr_to_lab_f64(bgr);
    [
        saturate_u8(l * 255.0 / 100.0),
        saturate_u8(a + 128.0),
        saturate_u8(b + 128.0),
    ]
}

/// Convert a BGR pixel to floating-point CIE Lab (L in [0, 100])
pub fn bgr_to_lab_f64(bgr: Bgr) -> [f64; 3] {
    let lab: Lab<D65, f64> = Srgb::new(bgr[2], bgr[1], bgr[0])
        .into_format::<f64>()
        .into_color();
    [lab.l, lab.a, lab.b]
}

/// Convert 8-bit Lab (as produced by [`bgr_to_lab`]) back to BGR
///
/// Accepts fractional components so k-means centroids can be rendered
/// directly. Out-of-gamut colours are clamped.
pub fn lab_to_bgr(lab: [f64; 3]) -> Bgr {
    let lab = Lab::<D65, f64>::new(lab[0] * 100.0 / 255.0, lab[1] - 128.0, lab[2] - 128.0);
    let rgb: Srgb<u8> = Srgb::<f64>::from_color(lab).into_format();
    [rgb.blue, rgb.green, rgb.red]
}

/// Chroma of an 8-bit Lab pixel: distance of (a, b) from neutral gray
#[inline]
pub fn lab_chroma(lab: [u8; 3]) -> f64 {
    let a = lab[1] as f64 - 128.0;
    let b = lab[2] as f64 - 128.0;
    (a * a + b * b).sqrt()
}

/// Round and clamp to the 8-bit range; NaN maps to 0
#[inline]
pub(crate) fn saturate_u8(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}
