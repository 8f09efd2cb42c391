// Analysis module - perceptual feature extraction for a single frame
//
// This module turns one captured colour frame into the FeatureVector that
// drives the sound engine, plus the visualization artifacts shown next to
// the projection.
//
// Module organization:
// - colorspace: gray / HSV / Lab conversions (8-bit conventions)
// - kmeans: seeded clustering shared by segmentation and harmony
// - brightness, composition, segmentation, harmony, hue_spread, frequency,
//   noise, histogram: one index each
// - types: FeatureVector, ColorComposition, FrameAnalysis
// - mod.rs: Coordinator (FeatureExtractor)
//
// Indices are independent of each other. Every call is a pure function of
// the frame and the configuration; the extractor keeps no per-frame state.

pub mod brightness;
pub mod colorspace;
pub mod composition;
pub mod frequency;
pub mod harmony;
pub mod histogram;
pub mod hue_spread;
pub mod kmeans;
pub mod noise;
pub mod segmentation;
pub mod types;

use std::time::Instant;

pub use brightness::brightness_index;
pub use composition::{classify_pixel, color_composition, ColorBucket, CompositionParams};
pub use frequency::{spatial_frequency, FrequencyParams, FrequencyResult};
pub use harmony::{color_harmony, HarmonyParams, HarmonyResult, PaletteEntry};
pub use histogram::{hue_histogram, HistogramParams};
pub use hue_spread::{hue_spread, HueSpreadParams, HueSpreadResult};
pub use kmeans::{ClusterSet, KmeansParams};
pub use noise::{noise_index, NoiseParams, NoiseResult};
pub use segmentation::{segmentation_index, SegmentationParams, SegmentationResult};
pub use types::{ColorComposition, FeatureVector, FrameAnalysis};

use crate::config::AnalysisConfig;
use crate::error::{log_analysis_error, AnalysisError};
use crate::frame::Frame;

/// FeatureExtractor coordinates all per-frame indices
///
/// The configuration is validated once in [`FeatureExtractor::new`]; the
/// extraction calls themselves cannot fail.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: AnalysisConfig,
}

impl FeatureExtractor {
    /// Create an extractor, rejecting unusable parameters
    ///
    /// # Errors
    /// The first [`AnalysisError`] reported by any index's parameters.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        if let Err(err) = config.validate() {
            log_analysis_error(&err, "FeatureExtractor::new");
            return Err(err);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compute every index of a frame
    pub fn extract(&self, frame: &Frame) -> FeatureVector {
        self.analyze(frame).features
    }

    /// Compute every index together with all visualization artifacts
    pub fn analyze(&self, frame: &Frame) -> FrameAnalysis {
        let started = Instant::now();
        let config = &self.config;

        let brightness = brightness::brightness_index(frame);
        let composition = composition::compute(frame, &config.composition);
        let segmentation = segmentation::compute(frame, &config.segmentation);
        let harmony = harmony::compute(frame, &config.harmony);
        let spread = hue_spread::compute(frame, &config.hue_spread);
        let frequency = frequency::compute(frame, &config.frequency);
        let noise = noise::compute(frame, &config.noise);
        let hue_histogram = histogram::compute(frame, &config.histogram);

        tracing::debug!(
            "[FeatureExtractor] {}x{} frame: {} chromatic / {} saturated pixels, {} palette entries",
            frame.width(),
            frame.height(),
            segmentation.chromatic_pixels,
            spread.saturated_pixels,
            harmony.palette.len()
        );

        let features = FeatureVector {
            brightness,
            composition,
            segmentation: segmentation.index,
            harmony: harmony.index,
            centroid: spread.index,
            mean_hsv: spread.mean_hsv,
            frequency: frequency.index,
            noise: noise.index,
            noise_variance: noise.variance,
            hue_histogram,
        };

        tracing::debug!(
            "[FeatureExtractor] brightness={:.1} segmentation={:.3} harmony={:.3} centroid={:.3} frequency={:.3} noise={:.3} ({:?})",
            features.brightness,
            features.segmentation,
            features.harmony,
            features.centroid,
            features.frequency,
            features.noise,
            started.elapsed()
        );

        FrameAnalysis {
            features,
            clustered: segmentation.clustered,
            color_bar: harmony.color_bar,
            centroid_debug: spread.debug,
            spectrum: frequency.spectrum,
            laplacian: noise.laplacian,
        }
    }
}
