// Noise module - edge energy from the variance of the Laplacian
//
// Gray plane -> 4-neighbour Laplacian [0 1 0; 1 -4 1; 0 1 0] with
// reflect-101 borders -> population variance. The variance is unbounded, so
// it is squashed with tanh(variance / divisor) for the exported index.

use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::gray_plane;
use crate::analysis::types::finite_or;
use crate::error::{check_positive, AnalysisError};
use crate::frame::{Bgr, Frame};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Variance that maps to tanh(1)
    pub variance_divisor: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            variance_divisor: 500.0,
        }
    }
}

impl NoiseParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_positive("variance_divisor", self.variance_divisor)
    }
}

#[derive(Debug, Clone)]
pub struct NoiseResult {
    /// tanh(variance / divisor), [0, 1)
    pub index: f64,
    /// Population variance of the Laplacian response, >= 0
    pub variance: f64,
    /// |Laplacian| saturated to 8 bits, as gray
    pub laplacian: Frame,
}

/// Noise / edge-energy index
///
/// # Errors
/// `InvalidParameter` for a non-positive or non-finite divisor.
pub fn noise_index(frame: &Frame, params: &NoiseParams) -> Result<NoiseResult, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &NoiseParams) -> NoiseResult {
    let response = laplacian(&gray_plane(frame), frame.width() as usize, frame.height() as usize);

    let n = response.len() as f64;
    let mean = response.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = response
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let variance = finite_or(variance, 0.0);

    let pixels: Vec<Bgr> = response
        .iter()
        .map(|&v| {
            let level = v.unsigned_abs().min(255) as u8;
            [level, level, level]
        })
        .collect();

    NoiseResult {
        index: finite_or((variance / params.variance_divisor).tanh(), 0.0),
        variance,
        laplacian: frame.same_size(pixels),
    }
}

/// 4-neighbour Laplacian of a row-major plane with reflect-101 borders
pub fn laplacian(plane: &[u8], width: usize, height: usize) -> Vec<i32> {
    let at = |x: usize, y: usize| plane[y * width + x] as i32;
    let mut out = Vec::with_capacity(plane.len());
    for y in 0..height {
        let up = reflect_101(y as isize - 1, height);
        let down = reflect_101(y as isize + 1, height);
        for x in 0..width {
            let left = reflect_101(x as isize - 1, width);
            let right = reflect_101(x as isize + 1, width);
            out.push(at(left, y) + at(right, y) + at(x, up) + at(x, down) - 4 * at(x, y));
        }
    }
    out
}

/// Mirror an out-of-range index without repeating the edge sample
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}
