// K-means module - seeded clustering over 3-channel colour points
//
// Used by the segmentation index (Lab space) and the harmony index (HSV
// space). Each restart is one `kmeans_colors::get_kmeans` run:
// - k-means++ seeding from the data, restart `i` seeded with `seed + i`
// - a restart stops after `max_iterations` or once no centre moves more than
//   `epsilon`
// - a cluster that loses all its points is re-seeded with a random data point
// The most compact restart wins. Afterwards every empty cluster steals the
// farthest point of the largest cluster, so `counts` has no zeros whenever
// there are at least k points.

use kmeans_colors::{get_kmeans, Calculate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A point in a 3-channel colour space
pub type Point3 = [f64; 3];

/// Largest supported k; cluster labels are stored as `u8`
pub const MAX_CLUSTERS: usize = 256;

/// Clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmeansParams {
    /// Number of clusters (k)
    pub clusters: usize,
    /// Independent restarts
    pub attempts: usize,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Convergence threshold on centre movement
    pub epsilon: f64,
    /// Seed of the first restart
    pub seed: u64,
}

impl Default for KmeansParams {
    fn default() -> Self {
        Self::new(8, 100, 1.0)
    }
}

impl KmeansParams {
    pub fn new(clusters: usize, max_iterations: usize, epsilon: f64) -> Self {
        Self {
            clusters,
            attempts: 10,
            max_iterations,
            epsilon,
            seed: 0x5EED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Reject parameter sets that cannot produce a clustering
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.clusters == 0 || self.clusters > MAX_CLUSTERS {
            return Err(AnalysisError::InvalidClusterCount {
                clusters: self.clusters,
            });
        }
        if self.attempts == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "attempts",
                reason: "at least one restart is required".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "max_iterations",
                reason: "at least one iteration is required".to_string(),
            });
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(AnalysisError::InvalidParameter {
                name: "epsilon",
                reason: format!("must be finite and >= 0 (got {})", self.epsilon),
            });
        }
        Ok(())
    }
}

/// Result of one clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSet {
    /// Cluster centres
    pub centroids: Vec<Point3>,
    /// Number of points assigned to each centre
    pub counts: Vec<usize>,
    /// Cluster index of every input point
    pub labels: Vec<usize>,
    /// Sum of squared distances from points to their centres
    pub compactness: f64,
}

/// Colour point as seen by `kmeans_colors`
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorPoint(Point3);

impl Calculate for ColorPoint {
    fn get_closest_centroid(buffer: &[Self], centroids: &[Self], indices: &mut Vec<u8>) {
        indices.clear();
        indices.extend(
            buffer
                .iter()
                .map(|point| nearest(&point.0, centroids.iter().map(|c| &c.0)) as u8),
        );
    }

    fn recalculate_centroids(
        rng: &mut impl Rng,
        buf: &[Self],
        centroids: &mut [Self],
        indices: &[u8],
    ) {
        let labels: Vec<usize> = indices.iter().map(|&i| i as usize).collect();
        let points: Vec<Point3> = buf.iter().map(|p| p.0).collect();
        let previous: Vec<Point3> = centroids.iter().map(|c| c.0).collect();
        let (updated, counts) = means(&points, &labels, &previous);

        for ((centre, mean), count) in centroids.iter_mut().zip(updated).zip(counts) {
            centre.0 = if count == 0 && !buf.is_empty() {
                buf[rng.gen_range(0..buf.len())].0
            } else {
                mean
            };
        }
    }

    fn check_loop(centroids: &[Self], old_centroids: &[Self]) -> f32 {
        centroids
            .iter()
            .zip(old_centroids)
            .map(|(new, old)| squared_distance(&new.0, &old.0).sqrt())
            .fold(0.0, f64::max) as f32
    }

    fn create_random(rng: &mut impl Rng) -> Self {
        ColorPoint([
            rng.gen_range(0.0..=255.0),
            rng.gen_range(0.0..=255.0),
            rng.gen_range(0.0..=255.0),
        ])
    }

    // k-means++ seeding draws the next centre with probability proportional
    // to this value; it must stay positive even for duplicate points.
    fn difference(c1: &Self, c2: &Self) -> f32 {
        (squared_distance(&c1.0, &c2.0) as f32).max(f32::MIN_POSITIVE)
    }
}

/// Cluster `points` into `params.clusters` groups
///
/// Returns `None` when there are fewer points than clusters; callers turn
/// that into their documented sentinel result.
pub fn kmeans(points: &[Point3], params: &KmeansParams) -> Option<ClusterSet> {
    let k = params.clusters;
    if k == 0 || k > MAX_CLUSTERS || points.len() < k {
        return None;
    }

    let buffer: Vec<ColorPoint> = points.iter().copied().map(ColorPoint).collect();
    let converge = params.epsilon as f32;

    let mut best: Option<ClusterSet> = None;
    for attempt in 0..params.attempts.max(1) {
        let seed = params.seed.wrapping_add(attempt as u64);
        let run = get_kmeans(
            k,
            params.max_iterations.max(1),
            converge,
            false,
            &buffer,
            seed,
        );
        let centroids: Vec<Point3> = run.centroids.iter().map(|c| c.0).collect();
        let candidate = finish(points, centroids, k);

        let better = match &best {
            Some(current) => candidate.compactness < current.compactness,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    best
}

/// Final assignment against the converged centres so labels, counts and
/// centroids are mutually consistent
fn finish(points: &[Point3], mut centroids: Vec<Point3>, k: usize) -> ClusterSet {
    // seeding may stop short of k centres when the data has fewer distinct
    // colours than clusters
    while centroids.len() < k {
        let fill = centroids.first().copied().unwrap_or(points[0]);
        centroids.push(fill);
    }

    let mut labels: Vec<usize> = points
        .iter()
        .map(|point| nearest(point, centroids.iter()))
        .collect();
    repair_empty_clusters(points, &mut centroids, &mut labels, k);
    let (centroids, counts) = means(points, &labels, &centroids);

    let compactness = points
        .iter()
        .zip(&labels)
        .map(|(point, &label)| squared_distance(point, &centroids[label]))
        .sum();

    ClusterSet {
        centroids,
        counts,
        labels,
        compactness,
    }
}

/// Index of the nearest centre (ties go to the lowest index)
fn nearest<'a>(point: &Point3, centroids: impl Iterator<Item = &'a Point3>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, centre) in centroids.enumerate() {
        let dist = squared_distance(point, centre);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

/// Give every empty cluster the farthest point of the currently largest one
fn repair_empty_clusters(
    points: &[Point3],
    centroids: &mut [Point3],
    labels: &mut [usize],
    k: usize,
) {
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let largest = (0..k)
            .max_by(|&a, &b| counts[a].cmp(&counts[b]).then(b.cmp(&a)))
            .unwrap_or(0);
        if counts[largest] < 2 {
            break;
        }

        let mut farthest = None;
        let mut farthest_dist = -1.0;
        for (idx, point) in points.iter().enumerate() {
            if labels[idx] != largest {
                continue;
            }
            let dist = squared_distance(point, &centroids[largest]);
            if dist > farthest_dist {
                farthest_dist = dist;
                farthest = Some(idx);
            }
        }

        if let Some(idx) = farthest {
            labels[idx] = empty;
            counts[largest] -= 1;
            counts[empty] += 1;
            centroids[empty] = points[idx];
        }
    }
}

/// Per-cluster means and sizes; clusters without points keep their previous
/// centre
fn means(points: &[Point3], labels: &[usize], previous: &[Point3]) -> (Vec<Point3>, Vec<usize>) {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in points.iter().zip(labels) {
        if label >= k {
            continue;
        }
        for dim in 0..3 {
            sums[label][dim] += point[dim];
        }
        counts[label] += 1;
    }

    let centres = sums
        .into_iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                let n = count as f64;
                [sum[0] / n, sum[1] / n, sum[2] / n]
            }
        })
        .collect();
    (centres, counts)
}

#[inline]
pub(crate) fn squared_distance(a: &Point3, b: &Point3) -> f64 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

/// Population coefficient of variation of cluster sizes (std / mean)
pub fn count_dispersion(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}
