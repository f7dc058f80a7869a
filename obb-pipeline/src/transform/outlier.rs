use std::num::NonZeroUsize;

use kiddo::{immutable::float::kdtree::ImmutableKdTree, SquaredEuclidean};
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

use obb_core::pointcloud::point::PointCloud;

use super::Transform;

pub const DEFAULT_NEIGHBORS: usize = 5;
pub const DEFAULT_STD_RATIO: f64 = 1.0;

/// Drops points whose mean distance to their `neighbors` nearest points
/// (the point itself included) exceeds the cloud-wide mean of that value by
/// more than `std_ratio` standard deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalOutlierRemoval {
    pub neighbors: usize,
    pub std_ratio: f64,
}

impl Default for StatisticalOutlierRemoval {
    fn default() -> Self {
        Self::new(DEFAULT_NEIGHBORS, DEFAULT_STD_RATIO)
    }
}

impl StatisticalOutlierRemoval {
    pub fn new(neighbors: usize, std_ratio: f64) -> Self {
        Self {
            neighbors,
            std_ratio,
        }
    }

    fn mean_neighbor_distances(&self, xyz: &[[f64; 3]], k: NonZeroUsize) -> Vec<f64> {
        let kdtree: ImmutableKdTree<f64, u32, 3, 32> = ImmutableKdTree::new_from_slice(xyz);
        xyz.par_iter()
            .map(|p| {
                let found = kdtree.nearest_n::<SquaredEuclidean>(p, k);
                let sum: f64 = found.iter().map(|nn| nn.distance.sqrt()).sum();
                sum / found.len().max(1) as f64
            })
            .collect()
    }
}

impl Transform for StatisticalOutlierRemoval {
    fn transform(&self, point_cloud: PointCloud) -> Vec<PointCloud> {
        let k = match NonZeroUsize::new(self.neighbors.min(point_cloud.len())) {
            Some(k) if point_cloud.len() > 1 => k,
            _ => return vec![point_cloud],
        };

        let xyz: Vec<[f64; 3]> = point_cloud.points.iter().map(|p| p.xyz()).collect();
        let distances = self.mean_neighbor_distances(&xyz, k);

        let n = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / n;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let threshold = mean + self.std_ratio * variance.sqrt();

        let points: Vec<_> = point_cloud
            .points
            .iter()
            .zip(&distances)
            .filter(|(_, d)| **d <= threshold)
            .map(|(p, _)| *p)
            .collect();

        log::debug!(
            "removed {} outliers of {} points",
            point_cloud.len() - points.len(),
            point_cloud.len()
        );
        vec![PointCloud::new(points)]
    }
}
