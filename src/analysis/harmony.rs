// Harmony module - palette coherence of the saturated pixels
//
// Saturated pixels are clustered in (H, S, V). Every pair of cluster centres
// contributes its hue/saturation distance weighted by the product of the two
// cluster sizes; harmony is one minus the weighted mean distance. A palette
// of one colour is perfectly harmonious (1.0).

use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::{bgr_to_hsv, hsv_to_bgr, saturate_u8};
use crate::analysis::kmeans::{kmeans, KmeansParams, Point3};
use crate::analysis::types::finite_or;
use crate::error::{check_threshold, AnalysisError};
use crate::frame::{canvas, rgb, Frame, BLACK};

/// Harmony settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonyParams {
    /// Pixels with HSV saturation at or below this are ignored
    pub saturation_threshold: f64,
    /// Clustering settings; `kmeans.clusters` is the palette size
    pub kmeans: KmeansParams,
}

impl Default for HarmonyParams {
    fn default() -> Self {
        Self {
            saturation_threshold: 20.0,
            kmeans: KmeansParams::new(6, 50, 0.2),
        }
    }
}

impl HarmonyParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_threshold("saturation_threshold", self.saturation_threshold)?;
        self.kmeans.validate()
    }
}

/// One palette entry of the harmony clustering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Centre in 8-bit HSV (H in [0, 180))
    pub hsv: [f64; 3],
    /// Number of pixels in the cluster
    pub count: usize,
}

/// Harmony index, palette and colour bar
#[derive(Debug, Clone)]
pub struct HarmonyResult {
    /// 1 - weighted mean pairwise distance, [0, 1]
    pub index: f64,
    /// Palette sorted by descending count; empty below k saturated pixels
    pub palette: Vec<PaletteEntry>,
    /// Proportional stripes of the palette colours
    pub color_bar: Frame,
}

/// Colour harmony of the saturated pixels
///
/// Fewer than k saturated pixels yields index 0.0 and an all-black colour
/// bar.
///
/// # Errors
/// Invalid threshold or clustering parameters.
pub fn color_harmony(frame: &Frame, params: &HarmonyParams) -> Result<HarmonyResult, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &HarmonyParams) -> HarmonyResult {
    let points: Vec<Point3> = frame
        .pixels()
        .iter()
        .map(|&p| bgr_to_hsv(p))
        .filter(|hsv| hsv[1] as f64 > params.saturation_threshold)
        .map(|hsv| [hsv[0] as f64, hsv[1] as f64, hsv[2] as f64])
        .collect();

    let clusters = match kmeans(&points, &params.kmeans) {
        Some(clusters) => clusters,
        None => {
            return HarmonyResult {
                index: 0.0,
                palette: Vec::new(),
                color_bar: Frame::from_canvas(&canvas(frame.width(), frame.height(), BLACK)),
            }
        }
    };

    let mut palette: Vec<PaletteEntry> = clusters
        .centroids
        .iter()
        .zip(&clusters.counts)
        .map(|(&hsv, &count)| PaletteEntry { hsv, count })
        .collect();
    palette.sort_by(|a, b| b.count.cmp(&a.count));

    let index = finite_or(weighted_harmony(&palette), 0.0);
    let color_bar = render_color_bar(frame.width(), frame.height(), &palette);

    HarmonyResult {
        index,
        palette,
        color_bar,
    }
}

/// Hue/saturation distance between two HSV centres, in [0, sqrt(2)]
///
/// Hue distance wraps around the 180-step circle.
pub fn palette_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let raw = (a[0] - b[0]).abs();
    let dh = raw.min(180.0 - raw) / 180.0;
    let ds = (a[1] - b[1]).abs() / 255.0;
    (dh * dh + ds * ds).sqrt()
}

/// 1 - weighted mean pairwise distance of a palette, clamped to [0, 1]
///
/// Pairs are weighted by the product of their counts. The result does not
/// depend on palette order. Returns 0.0 when the total weight is zero.
pub fn weighted_harmony(palette: &[PaletteEntry]) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (i, first) in palette.iter().enumerate() {
        for second in &palette[i + 1..] {
            let weight = first.count as f64 * second.count as f64;
            weighted += palette_distance(&first.hsv, &second.hsv) * weight;
            total_weight += weight;
        }
    }
    if total_weight <= 0.0 {
        return 0.0;
    }
    (1.0 - weighted / total_weight).clamp(0.0, 1.0)
}

fn render_color_bar(width: u32, height: u32, palette: &[PaletteEntry]) -> Frame {
    let mut image = canvas(width, height, BLACK);
    let total: usize = palette.iter().map(|entry| entry.count).sum();
    if total == 0 {
        return Frame::from_canvas(&image);
    }

    let mut x = 0u32;
    for entry in palette {
        let stripe = (width as u64 * entry.count as u64 / total as u64) as u32;
        if stripe == 0 {
            continue;
        }
        let color = hsv_to_bgr([
            saturate_u8(entry.hsv[0]),
            saturate_u8(entry.hsv[1]),
            saturate_u8(entry.hsv[2]),
        ]);
        let rect = Rect::at(x as i32, 0).of_size(stripe, height);
        draw_filled_rect_mut(&mut image, rect, rgb(color));
        x += stripe;
    }
    Frame::from_canvas(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Bgr;

    fn params(k: usize) -> HarmonyParams {
        HarmonyParams {
            kmeans: KmeansParams::new(k, 50, 0.2).with_attempts(3),
            ..HarmonyParams::default()
        }
    }

    fn entry(h: f64, s: f64, count: usize) -> PaletteEntry {
        PaletteEntry {
            hsv: [h, s, 200.0],
            count,
        }
    }

    #[test]
    fn test_single_colour_is_fully_harmonious() {
        let frame = Frame::filled(6, 6, [0, 0, 255]).unwrap();
        let result = color_harmony(&frame, &HarmonyParams::default()).unwrap();
        assert_eq!(result.index, 1.0);
    }

    #[test]
    fn test_too_few_saturated_pixels() {
        let frame = Frame::filled(2, 2, [90, 90, 90]).unwrap();
        let result = color_harmony(&frame, &HarmonyParams::default()).unwrap();
        assert_eq!(result.index, 0.0);
        assert!(result.palette.is_empty());
        assert!(result.color_bar.pixels().iter().all(|&p| p == BLACK));
        assert_eq!(result.color_bar.width(), 2);
    }

    #[test]
    fn test_hue_distance_wraps() {
        // hues 5 and 175 are 10 steps apart on the circle
        let d = palette_distance(&[5.0, 255.0, 255.0], &[175.0, 255.0, 255.0]);
        assert!((d - 10.0 / 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_permutation_invariance() {
        let palette = vec![entry(0.0, 250.0, 10), entry(60.0, 120.0, 3), entry(120.0, 40.0, 7)];
        let base = weighted_harmony(&palette);
        let reordered = vec![palette[2], palette[0], palette[1]];
        let reversed: Vec<_> = palette.iter().rev().copied().collect();
        assert!((weighted_harmony(&reordered) - base).abs() < 1e-12);
        assert!((weighted_harmony(&reversed) - base).abs() < 1e-12);
    }

    #[test]
    fn test_index_ignores_pixel_order() {
        let colours: [Bgr; 3] = [[0, 0, 255], [0, 200, 60], [180, 40, 40]];
        let mut pixels = Vec::new();
        for (i, &colour) in colours.iter().enumerate() {
            pixels.extend(std::iter::repeat(colour).take(4 * (i + 1)));
        }
        let frame = Frame::new(6, 4, pixels.clone()).unwrap();
        let base = color_harmony(&frame, &params(3)).unwrap().index;
        assert!(base > 0.0 && base < 1.0, "index {}", base);

        for shift in [1, 7, 13] {
            let mut rotated = pixels.clone();
            rotated.rotate_left(shift);
            let frame = Frame::new(6, 4, rotated).unwrap();
            let index = color_harmony(&frame, &params(3)).unwrap().index;
            assert!((index - base).abs() < 1e-9, "shift {}: {} vs {}", shift, index, base);
        }
    }

    #[test]
    fn test_weighted_harmony_matches_hand_computation() {
        // opposite hues at equal saturation: dh = 90/180
        let palette = vec![entry(0.0, 200.0, 2), entry(90.0, 200.0, 3)];
        assert!((weighted_harmony(&palette) - 0.5).abs() < 1e-12);
        assert_eq!(weighted_harmony(&[entry(10.0, 10.0, 4)]), 0.0);
    }

    #[test]
    fn test_two_colours_split_colour_bar() {
        let mut pixels = vec![[0u8, 0, 255]; 12];
        pixels.extend(vec![[255u8, 0, 0]; 4]);
        let frame = Frame::new(4, 4, pixels).unwrap();
        let result = color_harmony(&frame, &params(2)).unwrap();

        assert_eq!(result.palette.len(), 2);
        assert_eq!(result.palette[0].count, 12);
        assert_eq!(result.palette[1].count, 4);
        // red stripe of width 3, blue stripe of width 1
        assert_eq!(result.color_bar.pixel(0, 0), [0, 0, 255]);
        assert_eq!(result.color_bar.pixel(2, 3), [0, 0, 255]);
        assert_eq!(result.color_bar.pixel(3, 0), [255, 0, 0]);
        assert!(result.index > 0.0 && result.index < 1.0);
    }

    #[test]
    fn test_rejects_out_of_range_saturation() {
        let frame = Frame::filled(1, 1, [0, 0, 0]).unwrap();
        let bad = HarmonyParams {
            saturation_threshold: -1.0,
            ..HarmonyParams::default()
        };
        assert!(color_harmony(&frame, &bad).is_err());
    }
}
