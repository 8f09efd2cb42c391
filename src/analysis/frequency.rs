// Frequency module - ratio of high to low spatial-frequency energy
//
// Gray plane -> 2-D DFT (rows, then columns) -> zero frequency shifted to
// the centre -> log(1 + |F|). A centred disk holds the low frequencies,
// everything outside it is high:
//
//   index = high^exponent / (low + epsilon)
//
// Flat frames have all their energy at DC and score 0; fine texture and
// pixel-scale detail push the index up.

use image::RgbImage;
use imageproc::drawing::draw_hollow_circle_mut;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::gray_plane;
use crate::analysis::types::finite_or;
use crate::error::{check_positive, AnalysisError};
use crate::frame::{canvas, rgb, Frame, BLACK, GREEN};

/// FFT rounding residue below this magnitude is flushed to zero
const MAGNITUDE_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyParams {
    /// Low-frequency radius is `(min(W, H) / 2) / radius_divisor`
    pub radius_divisor: u32,
    /// Exponent applied to the high-frequency sum
    pub high_exponent: f64,
    /// Added to the low-frequency sum in the denominator
    pub epsilon: f64,
}

impl Default for FrequencyParams {
    fn default() -> Self {
        Self {
            radius_divisor: 4,
            high_exponent: 1.2,
            epsilon: 1e-6,
        }
    }
}

impl FrequencyParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.radius_divisor == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "radius_divisor",
                reason: "must be at least 1".to_string(),
            });
        }
        check_positive("high_exponent", self.high_exponent)?;
        check_positive("epsilon", self.epsilon)
    }

    /// Low-frequency disk radius for a frame of the given size
    pub fn low_radius(&self, width: u32, height: u32) -> u32 {
        (width.min(height) / 2) / self.radius_divisor.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct FrequencyResult {
    /// high^exponent / (low + epsilon), >= 0
    pub index: f64,
    /// Sum of log magnitudes inside the low-frequency disk
    pub low_energy: f64,
    /// Sum of log magnitudes outside the disk
    pub high_energy: f64,
    /// Log spectrum scaled to [0, 255] with the disk outline in green
    pub spectrum: Frame,
}

/// Spatial-frequency index of a frame
///
/// A frame without any low-frequency energy (all black) yields 0.0 and a
/// zero spectrum image.
///
/// # Errors
/// `InvalidParameter` for a zero radius divisor or a non-positive exponent
/// or epsilon.
pub fn spatial_frequency(
    frame: &Frame,
    params: &FrequencyParams,
) -> Result<FrequencyResult, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &FrequencyParams) -> FrequencyResult {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let magnitude = log_magnitude_spectrum(frame);

    let radius = params.low_radius(frame.width(), frame.height()) as i64;
    let centre = ((width / 2) as i64, (height / 2) as i64);

    let mut low = 0.0;
    let mut high = 0.0;
    for y in 0..height {
        for x in 0..width {
            let value = magnitude[y * width + x];
            let dx = x as i64 - centre.0;
            let dy = y as i64 - centre.1;
            if dx * dx + dy * dy <= radius * radius {
                low += value;
            } else {
                high += value;
            }
        }
    }

    if low == 0.0 {
        return FrequencyResult {
            index: 0.0,
            low_energy: 0.0,
            high_energy: high,
            spectrum: Frame::from_canvas(&canvas(frame.width(), frame.height(), BLACK)),
        };
    }

    let index = high.powf(params.high_exponent) / (low + params.epsilon);
    FrequencyResult {
        index: finite_or(index, 0.0),
        low_energy: low,
        high_energy: high,
        spectrum: render_spectrum(frame.width(), frame.height(), &magnitude, centre, radius),
    }
}

/// Centred log(1 + |F|) spectrum of the gray plane, row-major
pub fn log_magnitude_spectrum(frame: &Frame) -> Vec<f64> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    let mut data: Vec<Complex<f64>> = gray_plane(frame)
        .into_iter()
        .map(|v| Complex::new(v as f64, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(width);
    for row in data.chunks_exact_mut(width) {
        row_fft.process(row);
    }

    let column_fft = planner.plan_fft_forward(height);
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for x in 0..width {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = data[y * width + x];
        }
        column_fft.process(&mut column);
        for (y, value) in column.iter().enumerate() {
            data[y * width + x] = *value;
        }
    }

    // zero frequency moves to (width / 2, height / 2)
    let shift_x = width - width / 2;
    let shift_y = height - height / 2;
    let mut shifted = vec![0.0; width * height];
    for y in 0..height {
        let src_y = (y + shift_y) % height;
        for x in 0..width {
            let src_x = (x + shift_x) % width;
            let norm = data[src_y * width + src_x].norm();
            shifted[y * width + x] = if norm < MAGNITUDE_FLOOR {
                0.0
            } else {
                (1.0 + norm).ln()
            };
        }
    }
    shifted
}

fn render_spectrum(
    width: u32,
    height: u32,
    magnitude: &[f64],
    centre: (i64, i64),
    radius: i64,
) -> Frame {
    let max = magnitude.iter().copied().fold(0.0, f64::max);
    let mut image = RgbImage::from_fn(width, height, |x, y| {
        let v = magnitude[y as usize * width as usize + x as usize];
        let level = if max > 0.0 {
            (255.0 * v / max).clamp(0.0, 255.0) as u8
        } else {
            0
        };
        image::Rgb([level, level, level])
    });

    let centre = (centre.0 as i32, centre.1 as i32);
    draw_hollow_circle_mut(&mut image, centre, radius as i32, rgb(GREEN));
    Frame::from_canvas(&image)
}
