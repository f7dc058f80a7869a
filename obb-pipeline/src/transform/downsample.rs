use obb_core::pointcloud::{
    decimation::decimator::{PointCloudDecimator as _, UniformDecimator},
    point::PointCloud,
};

use super::Transform;

/// Keeps the points whose index is a multiple of `every_k`.
pub struct UniformDownsample {
    decimator: UniformDecimator,
}

impl UniformDownsample {
    pub fn new(every_k: usize) -> Self {
        Self {
            decimator: UniformDecimator { every_k },
        }
    }

    pub fn every_k(&self) -> usize {
        self.decimator.every_k
    }
}

impl Transform for UniformDownsample {
    fn transform(&self, point_cloud: PointCloud) -> Vec<PointCloud> {
        if self.decimator.every_k <= 1 {
            return vec![point_cloud];
        }
        let points = self.decimator.decimate(&point_cloud.points);
        vec![PointCloud::new(points)]
    }
}

#[cfg(test)]
mod tests {
    use obb_core::pointcloud::point::Point;

    use super::*;

    #[test]
    fn test_downsample() {
        let pc = PointCloud::new(
            (0..10)
                .map(|i| Point::new(i as f64, 0.0, i as f64, 0.0))
                .collect(),
        );

        let out = UniformDownsample::new(4).transform(pc.clone());
        assert_eq!(out.len(), 1);
        let xs: Vec<f64> = out[0].points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 4.0, 8.0]);
        assert_eq!(out[0].metadata.point_count, 3);
        assert_eq!(out[0].z_range(), Some((0.0, 8.0)));

        assert_eq!(UniformDownsample::new(0).transform(pc.clone())[0].len(), 10);
        assert_eq!(UniformDownsample::new(1).transform(pc)[0].len(), 10);
    }
}
