// Types module - Data structures produced by the feature extraction pipeline
//
// FeatureVector is the contract with the outbound message bus: every field is
// a finite float inside its documented range, including on degenerate frames.

use serde::{Deserialize, Serialize};

use crate::analysis::composition::ColorBucket;
use crate::frame::Frame;

/// Fraction of pixels per semantic colour bucket
///
/// Each fraction is in [0, 1]; their sum is <= 1 because unclassified pixels
/// are dropped. `cyan` and `magenta` stay 0.0 unless the extended palette is
/// enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorComposition {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub yellow: f64,
    pub white: f64,
    pub black: f64,
    #[serde(default)]
    pub cyan: f64,
    #[serde(default)]
    pub magenta: f64,
}

impl ColorComposition {
    pub fn fraction(&self, bucket: ColorBucket) -> f64 {
        match bucket {
            ColorBucket::Red => self.red,
            ColorBucket::Green => self.green,
            ColorBucket::Blue => self.blue,
            ColorBucket::Yellow => self.yellow,
            ColorBucket::White => self.white,
            ColorBucket::Black => self.black,
            ColorBucket::Cyan => self.cyan,
            ColorBucket::Magenta => self.magenta,
        }
    }

    /// Sum of all bucket fractions (share of classified pixels)
    pub fn classified(&self) -> f64 {
        self.red
            + self.green
            + self.blue
            + self.yellow
            + self.white
            + self.black
            + self.cyan
            + self.magenta
    }
}

/// Perceptual indices of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean luminance, [0, 255]
    pub brightness: f64,

    /// Colour bucket fractions, each [0, 1]
    pub composition: ColorComposition,

    /// Coefficient of variation of chromatic cluster sizes, >= 0
    ///
    /// 0.0 when fewer chromatic pixels than clusters exist.
    pub segmentation: f64,

    /// Palette harmony, [0, 1]; 0.0 when too few saturated pixels
    pub harmony: f64,

    /// 1 - hue concentration, [0, 1]; 0.0 when no saturated pixels
    pub centroid: f64,

    /// Mean (H, S, V) over all pixels, H in [0, 180)
    pub mean_hsv: [f64; 3],

    /// High/low spatial-frequency ratio, >= 0
    pub frequency: f64,

    /// tanh-compressed Laplacian variance, [0, 1)
    pub noise: f64,

    /// Raw Laplacian variance, >= 0
    pub noise_variance: f64,

    /// Normalized hue histogram over [0, 180)
    pub hue_histogram: Vec<f64>,
}

impl FeatureVector {
    /// Scalar fields by name, in a stable order
    ///
    /// Composition buckets are listed by their bucket name.
    pub fn scalars(&self) -> Vec<(&'static str, f64)> {
        let mut fields = vec![
            ("brightness", self.brightness),
            ("segmentation", self.segmentation),
            ("harmony", self.harmony),
            ("centroid", self.centroid),
            ("frequency", self.frequency),
            ("noise", self.noise),
            ("noise_variance", self.noise_variance),
        ];
        for bucket in ColorBucket::ALL {
            fields.push((bucket.name(), self.composition.fraction(bucket)));
        }
        fields
    }

    /// Look up a scalar field by the name used in [`FeatureVector::scalars`]
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// True when every value is finite
    pub fn is_finite(&self) -> bool {
        self.scalars().iter().all(|(_, v)| v.is_finite())
            && self.mean_hsv.iter().all(|v| v.is_finite())
            && self.hue_histogram.iter().all(|v| v.is_finite())
    }
}

/// Feature vector plus every visualization artifact
///
/// All artifacts share the input frame's width and height.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub features: FeatureVector,
    /// Chromatic pixels recoloured with their segmentation centroid
    pub clustered: Frame,
    /// Harmony palette as proportional stripes
    pub color_bar: Frame,
    /// Hue directions with the mean resultant arrow
    pub centroid_debug: Frame,
    /// Log-magnitude spectrum with the low-frequency boundary
    pub spectrum: Frame,
    /// Absolute Laplacian response
    pub laplacian: Frame,
}

/// Replace non-finite values with a sentinel
#[inline]
pub(crate) fn finite_or(value: f64, sentinel: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        sentinel
    }
}
