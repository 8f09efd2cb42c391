// Brightness module - mean perceptual luminance of a frame

use crate::analysis::colorspace::gray;
use crate::frame::Frame;

/// Mean gray value over all pixels, range [0, 255]
///
/// Defined for every frame; there is no degenerate case.
pub fn brightness_index(frame: &Frame) -> f64 {
    let sum: u64 = frame.pixels().iter().map(|&p| gray(p) as u64).sum();
    sum as f64 / frame.len() as f64
}
