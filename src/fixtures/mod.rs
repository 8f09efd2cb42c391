//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers fixture frames, builds them from synthetic JSON
//! descriptions (or decodes image files), parses optional expectation JSON,
//! and runs the feature pipeline against them. It is desktop-focused to
//! support CI and on-site QA workflows.
//!
//! A fixture `<name>.frame.json` describes a synthetic frame; image fixtures
//! (`.png`, `.jpg`, `.jpeg`) are decoded as-is. Expectations live next to
//! the fixture as `<name>.expect.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::{FeatureExtractor, FeatureVector};
use crate::config::AnalysisConfig;
use crate::frame::{Bgr, Frame};

/// Default location for fixture frame/JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const SYNTHETIC_SUFFIX: &str = ".frame.json";
const EXPECT_SUFFIX: &str = ".expect.json";
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub frame_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture data with the decoded frame.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub frame: Frame,
    pub expectations: Option<FixtureExpectations>,
}

/// Synthetic frame description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticFrame {
    pub width: u32,
    pub height: u32,
    pub pattern: Pattern,
}

/// Pixel pattern of a synthetic frame. Colours are BGR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Every pixel the same colour
    Solid { bgr: Bgr },
    /// Alternating square cells of `cell` pixels
    Checkerboard { cell: u32, even: Bgr, odd: Bgr },
    /// Independent uniform gray value per pixel
    Noise { seed: u64 },
    /// Four quadrants: top-left, top-right, bottom-left, bottom-right
    Quadrants { colors: [Bgr; 4] },
    /// Equal-width vertical stripes, left to right
    Stripes { colors: Vec<Bgr> },
}

impl SyntheticFrame {
    pub fn render(&self) -> Result<Frame> {
        let (width, height) = (self.width, self.height);
        let pixel_count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(pixel_count);

        match &self.pattern {
            Pattern::Solid { bgr } => pixels.resize(pixel_count, *bgr),
            Pattern::Checkerboard { cell, even, odd } => {
                if *cell == 0 {
                    return Err(anyhow!("checkerboard cell size must be at least 1"));
                }
                for y in 0..height {
                    for x in 0..width {
                        let parity = (x / cell + y / cell) % 2;
                        pixels.push(if parity == 0 { *even } else { *odd });
                    }
                }
            }
            Pattern::Noise { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                for _ in 0..pixel_count {
                    let v: u8 = rng.gen();
                    pixels.push([v, v, v]);
                }
            }
            Pattern::Quadrants { colors } => {
                for y in 0..height {
                    for x in 0..width {
                        let right = (width > 1 && x >= width / 2) as usize;
                        let bottom = (height > 1 && y >= height / 2) as usize;
                        pixels.push(colors[bottom * 2 + right]);
                    }
                }
            }
            Pattern::Stripes { colors } => {
                if colors.is_empty() {
                    return Err(anyhow!("stripes need at least one colour"));
                }
                for _ in 0..height {
                    for x in 0..width {
                        let stripe = x as usize * colors.len() / width.max(1) as usize;
                        pixels.push(colors[stripe]);
                    }
                }
            }
        }

        Frame::new(width, height, pixels).context("building synthetic frame")
    }
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Scalar field name (see [`FeatureVector::scalars`]) to accepted range
    pub fields: BTreeMap<String, FieldRange>,
}

/// Inclusive range, either bound optional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &FeatureVector) -> std::result::Result<(), ExpectationDiff> {
        let failures: Vec<ExpectationFailure> = self
            .fields
            .iter()
            .filter_map(|(field, range)| {
                let value = actual.scalar(field);
                match value {
                    Some(v) if range.contains(v) => None,
                    _ => Some(ExpectationFailure {
                        field: field.clone(),
                        expected: *range,
                        actual: value,
                    }),
                }
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff {
                fixture: self.fixture.clone(),
                failures,
            })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub fixture: String,
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "fixture": self.fixture,
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": {
                        "min": failure.expected.min,
                        "max": failure.expected.max,
                    },
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure. `actual` is `None` for an
/// unknown field name.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: String,
    pub expected: FieldRange,
    pub actual: Option<f64>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(name) = fixture_name(&path) {
                let expect_path = expectation_path(&path, &name);
                fixtures.push(FixtureMetadata {
                    name,
                    frame_path: path,
                    expect_path,
                });
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture frame + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let frame_path = self.resolve_fixture_path(fixture)?;
        let name = fixture_name(&frame_path)
            .ok_or_else(|| anyhow!("Unsupported fixture file {}", frame_path.display()))?;
        let metadata = FixtureMetadata {
            expect_path: expectation_path(&frame_path, &name),
            name,
            frame_path,
        };
        let frame = read_frame(&metadata.frame_path)?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            frame,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidates = std::iter::once(format!("{fixture}{SYNTHETIC_SUFFIX}"))
            .chain(IMAGE_EXTENSIONS.iter().map(|ext| format!("{fixture}.{ext}")));
        for candidate in candidates {
            let path = self.root.join(candidate);
            if path.is_file() {
                return Ok(path);
            }
        }
        Err(anyhow!(
            "Fixture '{fixture}' not found in {}",
            self.root.display()
        ))
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Runs fixtures through the feature pipeline.
pub struct FixtureProcessor {
    extractor: FeatureExtractor,
}

impl FixtureProcessor {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let extractor = FeatureExtractor::new(config).context("invalid analysis configuration")?;
        Ok(Self { extractor })
    }

    pub fn run(&self, data: &FixtureData) -> FeatureVector {
        self.extractor.extract(&data.frame)
    }
}

/// Fixture name of a supported file, `None` for anything else
fn fixture_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if let Some(stem) = file_name.strip_suffix(SYNTHETIC_SUFFIX) {
        return Some(stem.to_string());
    }
    if file_name.ends_with(EXPECT_SUFFIX) {
        return None;
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return path.file_stem()?.to_str().map(str::to_string);
    }
    None
}

fn expectation_path(frame_path: &Path, name: &str) -> Option<PathBuf> {
    let path = frame_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
    path.exists().then_some(path)
}

fn read_frame(path: &Path) -> Result<Frame> {
    let is_synthetic = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(SYNTHETIC_SUFFIX));

    if is_synthetic {
        let json =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let synthetic: SyntheticFrame =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
        synthetic.render()
    } else {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Frame::decode(&bytes).with_context(|| format!("decoding {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrants_render() {
        let synthetic = SyntheticFrame {
            width: 2,
            height: 2,
            pattern: Pattern::Quadrants {
                colors: [[1, 1, 1], [2, 2, 2], [3, 3, 3], [4, 4, 4]],
            },
        };
        let frame = synthetic.render().unwrap();
        assert_eq!(frame.pixel(0, 0), [1, 1, 1]);
        assert_eq!(frame.pixel(1, 0), [2, 2, 2]);
        assert_eq!(frame.pixel(0, 1), [3, 3, 3]);
        assert_eq!(frame.pixel(1, 1), [4, 4, 4]);
    }

    #[test]
    fn test_checkerboard_and_stripes_render() {
        let board = SyntheticFrame {
            width: 4,
            height: 2,
            pattern: Pattern::Checkerboard {
                cell: 2,
                even: [0, 0, 0],
                odd: [9, 9, 9],
            },
        }
        .render()
        .unwrap();
        assert_eq!(board.pixel(1, 1), [0, 0, 0]);
        assert_eq!(board.pixel(2, 0), [9, 9, 9]);

        let stripes = SyntheticFrame {
            width: 6,
            height: 1,
            pattern: Pattern::Stripes {
                colors: vec![[1, 0, 0], [2, 0, 0], [3, 0, 0]],
            },
        }
        .render()
        .unwrap();
        assert_eq!(stripes.pixel(1, 0), [1, 0, 0]);
        assert_eq!(stripes.pixel(2, 0), [2, 0, 0]);
        assert_eq!(stripes.pixel(5, 0), [3, 0, 0]);
    }

    #[test]
    fn test_pattern_json_shape() {
        let json = r#"{ "width": 3, "height": 1, "pattern": { "kind": "solid", "bgr": [0, 0, 255] } }"#;
        let synthetic: SyntheticFrame = serde_json::from_str(json).unwrap();
        assert_eq!(synthetic.pattern, Pattern::Solid { bgr: [0, 0, 255] });
        assert!(synthetic.render().is_ok());
    }

    #[test]
    fn test_invalid_synthetic_frames() {
        let zero = SyntheticFrame {
            width: 0,
            height: 2,
            pattern: Pattern::Solid { bgr: [0, 0, 0] },
        };
        assert!(zero.render().is_err());

        let no_colours = SyntheticFrame {
            width: 2,
            height: 2,
            pattern: Pattern::Stripes { colors: vec![] },
        };
        assert!(no_colours.render().is_err());
    }

    #[test]
    fn test_expectation_verify_reports_failures() {
        let json = r#"{
            "fixture": "demo",
            "fields": {
                "brightness": { "min": 200.0 },
                "noise": { "max": 0.5 },
                "bogus": { "min": 0.0 }
            }
        }"#;
        let expectations: FixtureExpectations = serde_json::from_str(json).unwrap();
        let frame = Frame::filled(4, 4, [10, 10, 10]).unwrap();
        let extractor = FeatureExtractor::new(AnalysisConfig::default()).unwrap();
        let features = extractor.extract(&frame);

        let diff = expectations.verify(&features).unwrap_err();
        let fields: Vec<_> = diff.failures.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["bogus", "brightness"]);

        let json = diff.to_json();
        assert_eq!(json["fixture"], "demo");
        assert_eq!(json["failures"][0]["actual"], serde_json::Value::Null);
    }

    #[test]
    fn test_fixture_name_detection() {
        assert_eq!(
            fixture_name(Path::new("/x/flat_gray.frame.json")),
            Some("flat_gray".to_string())
        );
        assert_eq!(fixture_name(Path::new("/x/photo.PNG")), Some("photo".to_string()));
        assert_eq!(fixture_name(Path::new("/x/flat_gray.expect.json")), None);
        assert_eq!(fixture_name(Path::new("/x/readme.md")), None);
    }

    #[test]
    fn test_bundled_fixtures_meet_expectations() {
        let catalog = FixtureCatalog::default();
        let fixtures = catalog.discover().unwrap();
        assert!(!fixtures.is_empty());

        let processor = FixtureProcessor::new(AnalysisConfig::default()).unwrap();
        for metadata in fixtures {
            let data = catalog.load(&metadata.name, None).unwrap();
            let features = processor.run(&data);
            assert!(features.is_finite(), "{} produced non-finite output", metadata.name);
            if let Some(expectations) = &data.expectations {
                if let Err(diff) = expectations.verify(&features) {
                    panic!("{}: {}", metadata.name, diff.to_json());
                }
            }
        }
    }
}
