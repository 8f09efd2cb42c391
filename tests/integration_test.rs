//! Integration tests for the public analysis API
//!
//! These tests exercise the library the way the capture shell does:
//! - frame construction and validation
//! - every index through the free functions and the FeatureExtractor
//! - sentinel results on degenerate frames
//! - determinism for a fixed seed
//! - mapping a FeatureVector to OSC messages

use approx::assert_abs_diff_eq;
use frame_features::analysis::{
    brightness_index, color_composition, color_harmony, hue_spread, noise_index,
    segmentation_index, spatial_frequency, CompositionParams, FrequencyParams, HarmonyParams,
    HueSpreadParams, KmeansParams, NoiseParams, SegmentationParams,
};
use frame_features::config::OscConfig;
use frame_features::error::{AnalysisErrorCodes, ErrorCode};
use frame_features::osc::{feature_messages, OscArg};
use frame_features::{AnalysisConfig, AnalysisError, FeatureExtractor, Frame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_frame(width: u32, height: u32, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = (0..width * height).map(|_| [rng.gen(), rng.gen(), rng.gen()]).collect();
    Frame::new(width, height, pixels).unwrap()
}

fn gray_noise_frame(width: u32, height: u32, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = (0..width * height)
        .map(|_| {
            let v: u8 = rng.gen();
            [v, v, v]
        })
        .collect();
    Frame::new(width, height, pixels).unwrap()
}

#[test]
fn test_frame_validation_errors() {
    let err = Frame::new(0, 4, vec![]).unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::EMPTY_FRAME);

    let err = Frame::new(2, 2, vec![[0, 0, 0]; 3]).unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::BUFFER_MISMATCH);
}

#[test]
fn test_brightness_bounds() {
    let white = Frame::filled(10, 10, [255, 255, 255]).unwrap();
    let black = Frame::filled(10, 10, [0, 0, 0]).unwrap();
    assert_eq!(brightness_index(&white), 255.0);
    assert_eq!(brightness_index(&black), 0.0);

    let value = brightness_index(&random_frame(20, 20, 1));
    assert!((0.0..=255.0).contains(&value));
}

#[test]
fn test_composition_of_four_pixel_frame() {
    let frame = Frame::new(
        2,
        2,
        vec![[255, 255, 255], [0, 0, 0], [0, 0, 255], [0, 255, 0]],
    )
    .unwrap();
    let composition = color_composition(&frame, &CompositionParams::default()).unwrap();
    assert_eq!(composition.white, 0.25);
    assert_eq!(composition.black, 0.25);
    assert_eq!(composition.red, 0.25);
    assert_eq!(composition.green, 0.25);
    assert_eq!(composition.blue, 0.0);
    assert_eq!(composition.yellow, 0.0);
}

#[test]
fn test_composition_fractions_bounded() {
    let composition =
        color_composition(&random_frame(32, 32, 2), &CompositionParams::default()).unwrap();
    for value in [
        composition.red,
        composition.green,
        composition.blue,
        composition.yellow,
        composition.white,
        composition.black,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }
    assert!(composition.classified() <= 1.0 + 1e-12);
}

#[test]
fn test_segmentation_zero_for_gray() {
    let frame = Frame::filled(40, 30, [120, 120, 120]).unwrap();
    let result = segmentation_index(&frame, &SegmentationParams::default()).unwrap();
    assert_eq!(result.index, 0.0);
}

#[test]
fn test_harmony_single_colour_and_range() {
    let frame = Frame::filled(12, 12, [40, 200, 90]).unwrap();
    let result = color_harmony(&frame, &HarmonyParams::default()).unwrap();
    assert_eq!(result.index, 1.0);

    let result = color_harmony(&random_frame(24, 24, 3), &HarmonyParams::default()).unwrap();
    assert!((0.0..=1.0).contains(&result.index));
    assert_eq!(result.color_bar.width(), 24);
}

#[test]
fn test_hue_spread_extremes() {
    let single = Frame::filled(8, 8, [255, 0, 0]).unwrap();
    let result = hue_spread(&single, &HueSpreadParams::default()).unwrap();
    assert_abs_diff_eq!(result.index, 0.0, epsilon = 1e-12);

    // hues 0, 45, 90, 135 (0, 90, 180, 270 degrees)
    let spread = Frame::new(
        4,
        1,
        vec![[0, 0, 255], [0, 255, 128], [255, 255, 0], [255, 0, 127]],
    )
    .unwrap();
    let result = hue_spread(&spread, &HueSpreadParams::default()).unwrap();
    assert_abs_diff_eq!(result.index, 1.0, epsilon = 1e-9);
}

#[test]
fn test_frequency_flat_vs_checkerboard() {
    let flat = Frame::filled(24, 24, [10, 200, 60]).unwrap();
    let result = spatial_frequency(&flat, &FrequencyParams::default()).unwrap();
    assert_eq!(result.index, 0.0);

    let pixels = (0..24 * 24)
        .map(|i| if (i % 24 + i / 24) % 2 == 0 { [255, 255, 255] } else { [0, 0, 0] })
        .collect();
    let board = Frame::new(24, 24, pixels).unwrap();
    let result = spatial_frequency(&board, &FrequencyParams::default()).unwrap();
    assert!(result.index > 0.0);
}

#[test]
fn test_noise_flat_vs_random() {
    let flat = Frame::filled(16, 16, [77, 77, 77]).unwrap();
    let result = noise_index(&flat, &NoiseParams::default()).unwrap();
    assert_abs_diff_eq!(result.index, 0.0, epsilon = 1e-12);

    let result = noise_index(&gray_noise_frame(48, 48, 4), &NoiseParams::default()).unwrap();
    assert!(result.index > 0.99);
    assert!(result.index <= 1.0);
}

#[test]
fn test_extractor_is_deterministic_for_fixed_seed() {
    let frame = random_frame(40, 30, 5);
    let mut config = AnalysisConfig::default();
    config.segmentation.kmeans = KmeansParams::new(8, 30, 1.0).with_seed(99);
    config.harmony.kmeans = KmeansParams::new(4, 30, 0.2).with_seed(99);

    let first = FeatureExtractor::new(config.clone()).unwrap().extract(&frame);
    let second = FeatureExtractor::new(config).unwrap().extract(&frame);
    assert_eq!(first, second);
    assert!(first.is_finite());
}

#[test]
fn test_extractor_outputs_stay_in_range() {
    let extractor = FeatureExtractor::new(AnalysisConfig::default()).unwrap();
    for seed in 0..3 {
        let features = extractor.extract(&random_frame(32, 24, seed));
        assert!((0.0..=255.0).contains(&features.brightness));
        assert!(features.segmentation >= 0.0);
        assert!((0.0..=1.0).contains(&features.harmony));
        assert!((0.0..=1.0).contains(&features.centroid));
        assert!(features.frequency >= 0.0);
        assert!((0.0..=1.0).contains(&features.noise));
        assert_abs_diff_eq!(features.hue_histogram.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(features.mean_hsv[0] < 180.0);
    }
}

#[test]
fn test_single_pixel_frame_is_handled() {
    let frame = Frame::filled(1, 1, [0, 128, 255]).unwrap();
    let analysis = FeatureExtractor::new(AnalysisConfig::default())
        .unwrap()
        .analyze(&frame);
    assert!(analysis.features.is_finite());
    assert_eq!(analysis.features.segmentation, 0.0);
    assert_eq!(analysis.features.harmony, 0.0);
    assert_eq!(analysis.spectrum.width(), 1);
}

#[test]
fn test_invalid_parameters_are_errors() {
    let frame = Frame::filled(4, 4, [0, 0, 255]).unwrap();

    let params = CompositionParams {
        white_threshold: 300.0,
        ..CompositionParams::default()
    };
    let err = color_composition(&frame, &params).unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::THRESHOLD_OUT_OF_RANGE);

    let params = SegmentationParams {
        kmeans: KmeansParams::new(0, 10, 1.0),
        ..SegmentationParams::default()
    };
    let err = segmentation_index(&frame, &params).unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::INVALID_CLUSTER_COUNT);

    let params = HarmonyParams {
        kmeans: KmeansParams::new(3, 10, 0.2).with_attempts(0),
        ..HarmonyParams::default()
    };
    assert!(matches!(
        color_harmony(&frame, &params),
        Err(AnalysisError::InvalidParameter { name: "attempts", .. })
    ));

    let params = NoiseParams {
        variance_divisor: f64::NAN,
    };
    let err = noise_index(&frame, &params).unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::INVALID_PARAMETER);
}

#[test]
fn test_features_map_to_osc() {
    let frame = Frame::new(
        2,
        2,
        vec![[255, 255, 255], [0, 0, 0], [0, 0, 255], [0, 255, 0]],
    )
    .unwrap();
    let features = FeatureExtractor::new(AnalysisConfig::default())
        .unwrap()
        .extract(&frame);
    let messages = feature_messages(&features, &OscConfig::default()).unwrap();

    let red = messages.iter().find(|m| m.address() == "/red").unwrap();
    assert_eq!(red.args(), &[OscArg::Float(0.25)]);
    let blue = messages.iter().find(|m| m.address() == "/blue").unwrap();
    assert_eq!(blue.args(), &[OscArg::Float(0.0)]);
    assert!(messages.iter().all(|m| m.encode().len() % 4 == 0));
}
