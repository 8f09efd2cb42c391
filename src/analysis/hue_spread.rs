// Hue spread module - circular concentration of the saturated hues
//
// Each saturated pixel is a unit vector at angle 2·H degrees (8-bit hue is
// half the angle). The length R of the mean resultant vector is 1 for a
// single hue and 0 for hues spread evenly around the circle; the index is
// 1 - R. The arithmetic mean (H, S, V) over all pixels is reported with it.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::bgr_to_hsv;
use crate::analysis::types::finite_or;
use crate::error::{check_threshold, AnalysisError};
use crate::frame::{canvas, rgb, Frame, BLACK, LIGHT_GRAY, RED, WHITE};

/// Maximum number of hue spokes drawn in the debug view
const SPOKE_BUDGET: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueSpreadParams {
    /// Pixels with HSV saturation at or below this are ignored
    pub saturation_threshold: f64,
}

impl Default for HueSpreadParams {
    fn default() -> Self {
        Self {
            saturation_threshold: 20.0,
        }
    }
}

impl HueSpreadParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_threshold("saturation_threshold", self.saturation_threshold)
    }
}

#[derive(Debug, Clone)]
pub struct HueSpreadResult {
    /// 1 - mean resultant length, [0, 1]
    pub index: f64,
    /// Mean resultant vector `(x, y)` of the hue angles
    pub mean_vector: (f64, f64),
    /// Number of pixels above the saturation threshold
    pub saturated_pixels: usize,
    /// Mean (H, S, V) over all pixels
    pub mean_hsv: [f64; 3],
    /// Hue spokes, unit circle and mean vector arrow on white
    pub debug: Frame,
}

/// Hue concentration index
///
/// With no saturated pixels the index is 0.0 and the debug view is a blank
/// white canvas.
///
/// # Errors
/// `ThresholdOutOfRange` for a saturation threshold outside [0, 255].
pub fn hue_spread(frame: &Frame, params: &HueSpreadParams) -> Result<HueSpreadResult, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &HueSpreadParams) -> HueSpreadResult {
    let mut sums = [0u64; 3];
    let mut angles: Vec<f64> = Vec::new();
    for &pixel in frame.pixels() {
        let hsv = bgr_to_hsv(pixel);
        for (sum, &channel) in sums.iter_mut().zip(&hsv) {
            *sum += channel as u64;
        }
        if hsv[1] as f64 > params.saturation_threshold {
            angles.push((hsv[0] as f64 * 2.0).to_radians());
        }
    }

    let n = frame.len() as f64;
    let mean_hsv = [sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n];

    if angles.is_empty() {
        return HueSpreadResult {
            index: 0.0,
            mean_vector: (0.0, 0.0),
            saturated_pixels: 0,
            mean_hsv,
            debug: Frame::from_canvas(&canvas(frame.width(), frame.height(), WHITE)),
        };
    }

    let count = angles.len() as f64;
    let x = angles.iter().map(|a| a.cos()).sum::<f64>() / count;
    let y = angles.iter().map(|a| a.sin()).sum::<f64>() / count;
    let concentration = (x * x + y * y).sqrt();
    let index = finite_or((1.0 - concentration).clamp(0.0, 1.0), 0.0);

    HueSpreadResult {
        index,
        mean_vector: (x, y),
        saturated_pixels: angles.len(),
        mean_hsv,
        debug: render_debug(frame.width(), frame.height(), &angles, (x, y)),
    }
}

fn render_debug(width: u32, height: u32, angles: &[f64], mean: (f64, f64)) -> Frame {
    let mut image = canvas(width, height, WHITE);
    let centre = ((width / 2) as f32, (height / 2) as f32);
    let scale = width.min(height) as f64 / 3.0;
    // image rows grow downwards
    let project = |x: f64, y: f64| {
        (
            centre.0 + (x * scale).round() as f32,
            centre.1 - (y * scale).round() as f32,
        )
    };

    let step = angles.len() / SPOKE_BUDGET + 1;
    for angle in angles.iter().step_by(step) {
        let end = project(angle.cos(), angle.sin());
        draw_line_segment_mut(&mut image, centre, end, rgb(LIGHT_GRAY));
    }
    draw_hollow_circle_mut(
        &mut image,
        (centre.0 as i32, centre.1 as i32),
        scale.round() as i32,
        rgb(BLACK),
    );
    draw_arrow_mut(&mut image, centre, project(mean.0, mean.1), rgb(RED));
    Frame::from_canvas(&image)
}

/// Segment with a two-stroke head at `tip`, head length 10% of the shaft
fn draw_arrow_mut(image: &mut RgbImage, from: (f32, f32), tip: (f32, f32), color: Rgb<u8>) {
    draw_line_segment_mut(image, from, tip, color);

    let dx = tip.0 - from.0;
    let dy = tip.1 - from.1;
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1.0 {
        return;
    }
    let head = (length * 0.1).max(2.0);
    let angle = dy.atan2(dx);
    for wing in [std::f32::consts::FRAC_PI_4, -std::f32::consts::FRAC_PI_4] {
        let end = (
            (tip.0 - head * (angle + wing).cos()).round(),
            (tip.1 - head * (angle + wing).sin()).round(),
        );
        draw_line_segment_mut(image, tip, end, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_hue_is_zero() {
        let frame = Frame::filled(5, 5, [0, 255, 0]).unwrap();
        let result = hue_spread(&frame, &HueSpreadParams::default()).unwrap();
        assert_abs_diff_eq!(result.index, 0.0, epsilon = 1e-12);
        assert_eq!(result.saturated_pixels, 25);
    }

    #[test]
    fn test_four_opposed_hues_is_one() {
        // 8-bit hues 0, 45, 90, 135 map to 0, 90, 180, 270 degrees
        let pixels = vec![
            [0u8, 0, 255],   // h 0
            [0u8, 255, 128], // h 45
            [255u8, 255, 0], // h 90
            [255u8, 0, 127], // h 135
        ];
        let hues: Vec<u8> = pixels.iter().map(|&p| bgr_to_hsv(p)[0]).collect();
        assert_eq!(hues, vec![0, 45, 90, 135]);

        let frame = Frame::new(2, 2, pixels).unwrap();
        let result = hue_spread(&frame, &HueSpreadParams::default()).unwrap();
        assert_abs_diff_eq!(result.index, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_saturated_pixels_blank_debug() {
        let frame = Frame::filled(6, 4, [70, 70, 70]).unwrap();
        let result = hue_spread(&frame, &HueSpreadParams::default()).unwrap();
        assert_eq!(result.index, 0.0);
        assert_eq!(result.saturated_pixels, 0);
        assert!(result.debug.pixels().iter().all(|&p| p == WHITE));
        assert_eq!(result.mean_hsv, [0.0, 0.0, 70.0]);
    }

    #[test]
    fn test_mean_hsv_covers_all_pixels() {
        let frame = Frame::new(2, 1, vec![[0, 0, 255], [0, 0, 0]]).unwrap();
        let result = hue_spread(&frame, &HueSpreadParams::default()).unwrap();
        assert_eq!(result.mean_hsv, [0.0, 127.5, 127.5]);
    }

    #[test]
    fn test_debug_arrow_points_along_mean_hue() {
        let frame = Frame::filled(30, 30, [0, 0, 255]).unwrap();
        let result = hue_spread(&frame, &HueSpreadParams::default()).unwrap();
        // hue 0 points right of the centre
        assert_eq!(result.debug.pixel(20, 15), RED);
        assert_eq!(result.debug.width(), 30);
        // reference circle of radius 30 / 3 crosses straight above the centre
        assert_eq!(result.debug.pixel(15, 5), BLACK);
    }
}
