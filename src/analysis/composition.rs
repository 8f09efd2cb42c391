// Composition module - semantic colour bucket classifier
//
// Every pixel falls into at most one bucket. Rules are evaluated in a fixed
// order and the first match wins:
//   1. max channel below the black threshold          -> black
//   2. min channel above 255 - white threshold         -> white
//   3. red and green within 65, blue below both        -> yellow
//   4. (extended) green and blue within 65, red lowest -> cyan
//   5. (extended) red and blue within 65, green lowest -> magenta
//   6. green strictly largest                          -> green
//   7. blue strictly largest                           -> blue
//   8. red strictly largest                            -> red
// Pixels matching none of the rules (e.g. neutral grays between the black and
// white thresholds) are dropped, so fractions may sum to less than 1.0.
// Downstream sound mapping is tuned to this, keep it.

use serde::{Deserialize, Serialize};

use crate::analysis::types::ColorComposition;
use crate::error::{check_threshold, AnalysisError};
use crate::frame::{Bgr, Frame};

/// Maximum red/green (or paired channel) gap for the mixed hues
const PAIR_TOLERANCE: f64 = 65.0;

/// Semantic colour names used by the composition classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBucket {
    Red,
    Green,
    Blue,
    Yellow,
    White,
    Black,
    Cyan,
    Magenta,
}

impl ColorBucket {
    /// Every bucket, basic palette first
    pub const ALL: [ColorBucket; 8] = [
        ColorBucket::Red,
        ColorBucket::Green,
        ColorBucket::Blue,
        ColorBucket::Yellow,
        ColorBucket::White,
        ColorBucket::Black,
        ColorBucket::Cyan,
        ColorBucket::Magenta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorBucket::Red => "red",
            ColorBucket::Green => "green",
            ColorBucket::Blue => "blue",
            ColorBucket::Yellow => "yellow",
            ColorBucket::White => "white",
            ColorBucket::Black => "black",
            ColorBucket::Cyan => "cyan",
            ColorBucket::Magenta => "magenta",
        }
    }
}

/// Sensitivity settings for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionParams {
    /// Pixels whose brightest channel is below this are black
    pub black_threshold: f64,
    /// Pixels whose darkest channel is above `255 - white_threshold` are white
    pub white_threshold: f64,
    /// Also classify cyan and magenta
    pub extended_palette: bool,
}

impl Default for CompositionParams {
    fn default() -> Self {
        Self {
            black_threshold: 25.0,
            white_threshold: 75.0,
            extended_palette: false,
        }
    }
}

impl CompositionParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_threshold("black_threshold", self.black_threshold)?;
        check_threshold("white_threshold", self.white_threshold)
    }
}

/// Classify a single pixel, `None` when no rule matches
pub fn classify_pixel(bgr: Bgr, params: &CompositionParams) -> Option<ColorBucket> {
    let b = bgr[0] as f64;
    let g = bgr[1] as f64;
    let r = bgr[2] as f64;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max < params.black_threshold {
        return Some(ColorBucket::Black);
    }
    if min > 255.0 - params.white_threshold {
        return Some(ColorBucket::White);
    }
    if (r - g).abs() < PAIR_TOLERANCE && b < r.min(g) {
        return Some(ColorBucket::Yellow);
    }
    if params.extended_palette {
        if (g - b).abs() < PAIR_TOLERANCE && r < g.min(b) {
            return Some(ColorBucket::Cyan);
        }
        if (r - b).abs() < PAIR_TOLERANCE && g < r.min(b) {
            return Some(ColorBucket::Magenta);
        }
    }
    if g > r && g > b {
        Some(ColorBucket::Green)
    } else if b > r && b > g {
        Some(ColorBucket::Blue)
    } else if r > g && r > b {
        Some(ColorBucket::Red)
    } else {
        None
    }
}

/// Fraction of all pixels in each colour bucket
///
/// # Errors
/// `ThresholdOutOfRange` if either threshold lies outside [0, 255].
pub fn color_composition(
    frame: &Frame,
    params: &CompositionParams,
) -> Result<ColorComposition, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &CompositionParams) -> ColorComposition {
    let mut counts = [0usize; 8];
    for &pixel in frame.pixels() {
        if let Some(bucket) = classify_pixel(pixel, params) {
            counts[bucket_slot(bucket)] += 1;
        }
    }

    let total = frame.len() as f64;
    let fraction = |bucket: ColorBucket| counts[bucket_slot(bucket)] as f64 / total;
    ColorComposition {
        red: fraction(ColorBucket::Red),
        green: fraction(ColorBucket::Green),
        blue: fraction(ColorBucket::Blue),
        yellow: fraction(ColorBucket::Yellow),
        white: fraction(ColorBucket::White),
        black: fraction(ColorBucket::Black),
        cyan: fraction(ColorBucket::Cyan),
        magenta: fraction(ColorBucket::Magenta),
    }
}

fn bucket_slot(bucket: ColorBucket) -> usize {
    match bucket {
        ColorBucket::Red => 0,
        ColorBucket::Green => 1,
        ColorBucket::Blue => 2,
        ColorBucket::Yellow => 3,
        ColorBucket::White => 4,
        ColorBucket::Black => 5,
        ColorBucket::Cyan => 6,
        ColorBucket::Magenta => 7,
    }
}
