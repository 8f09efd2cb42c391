// Histogram module - normalized 8-bit hue histogram

use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::bgr_to_hsv;
use crate::error::AnalysisError;
use crate::frame::Frame;

/// Hue range of the 8-bit HSV convention
const HUE_RANGE: usize = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramParams {
    /// Equal-width bins over [0, 180)
    pub bins: usize,
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self { bins: 12 }
    }
}

impl HistogramParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.bins == 0 || self.bins > HUE_RANGE {
            return Err(AnalysisError::InvalidParameter {
                name: "bins",
                reason: format!("must be in 1..={} (got {})", HUE_RANGE, self.bins),
            });
        }
        Ok(())
    }
}

/// Fraction of all pixels per hue bin; the bins sum to 1
///
/// Achromatic pixels have hue 0 and land in the first bin.
///
/// # Errors
/// `InvalidParameter` when `bins` is 0 or larger than 180.
pub fn hue_histogram(frame: &Frame, params: &HistogramParams) -> Result<Vec<f64>, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &HistogramParams) -> Vec<f64> {
    let mut counts = vec![0usize; params.bins];
    for &pixel in frame.pixels() {
        let hue = bgr_to_hsv(pixel)[0] as usize;
        let bin = (hue * params.bins / HUE_RANGE).min(params.bins - 1);
        counts[bin] += 1;
    }
    let total = frame.len() as f64;
    counts.into_iter().map(|c| c as f64 / total).collect()
}
