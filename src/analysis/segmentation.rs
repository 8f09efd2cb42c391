// Segmentation module - fragmentation of the chromatic content of a frame
//
// Pipeline: 8-bit Lab -> keep pixels with chroma above `color_threshold` ->
// k-means in (L, a, b) -> coefficient of variation of the cluster sizes.
// A frame dominated by one colour region scores high, evenly split
// palettes score near zero.

use serde::{Deserialize, Serialize};

use crate::analysis::colorspace::{bgr_to_lab, lab_chroma, lab_to_bgr};
use crate::analysis::kmeans::{count_dispersion, kmeans, KmeansParams, Point3};
use crate::analysis::types::finite_or;
use crate::error::{check_threshold, AnalysisError};
use crate::frame::{Frame, BLACK};

/// Segmentation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Minimum Lab chroma for a pixel to take part in clustering
    pub color_threshold: f64,
    /// Clustering settings; `kmeans.clusters` is k
    pub kmeans: KmeansParams,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            color_threshold: 25.0,
            kmeans: KmeansParams::new(20, 100, 1.0),
        }
    }
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_threshold("color_threshold", self.color_threshold)?;
        self.kmeans.validate()
    }
}

/// Segmentation index and its cluster-recoloured frame
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// Population std-dev / mean of cluster sizes, >= 0
    pub index: f64,
    /// Number of pixels that passed the chroma filter
    pub chromatic_pixels: usize,
    /// Retained pixels painted in their centroid colour, others black
    pub clustered: Frame,
}

/// Fragmentation index of the chromatic pixels
///
/// Fewer than k chromatic pixels is a valid result: index 0.0 and an
/// all-black visualization.
///
/// # Errors
/// Invalid threshold or clustering parameters.
pub fn segmentation_index(
    frame: &Frame,
    params: &SegmentationParams,
) -> Result<SegmentationResult, AnalysisError> {
    params.validate()?;
    Ok(compute(frame, params))
}

pub(crate) fn compute(frame: &Frame, params: &SegmentationParams) -> SegmentationResult {
    let mut retained: Vec<usize> = Vec::new();
    let mut points: Vec<Point3> = Vec::new();
    for (i, &pixel) in frame.pixels().iter().enumerate() {
        let lab = bgr_to_lab(pixel);
        if lab_chroma(lab) > params.color_threshold {
            retained.push(i);
            points.push([lab[0] as f64, lab[1] as f64, lab[2] as f64]);
        }
    }

    let mut clustered = vec![BLACK; frame.len()];
    let clusters = match kmeans(&points, &params.kmeans) {
        Some(clusters) => clusters,
        None => {
            return SegmentationResult {
                index: 0.0,
                chromatic_pixels: points.len(),
                clustered: frame.same_size(clustered),
            }
        }
    };

    let palette: Vec<_> = clusters.centroids.iter().map(|&c| lab_to_bgr(c)).collect();
    for (&pixel_index, &label) in retained.iter().zip(&clusters.labels) {
        clustered[pixel_index] = palette[label];
    }

    SegmentationResult {
        index: finite_or(count_dispersion(&clusters.counts), 0.0),
        chromatic_pixels: points.len(),
        clustered: frame.same_size(clustered),
    }
}
