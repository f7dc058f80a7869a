use crate::pointcloud::point::Point;

pub trait PointCloudDecimator {
    fn decimate(&self, points: &[Point]) -> Vec<Point>;
}

/// Keeps every k-th point, starting with the first one.
pub struct UniformDecimator {
    pub every_k: usize,
}

impl PointCloudDecimator for UniformDecimator {
    fn decimate(&self, points: &[Point]) -> Vec<Point> {
        if self.every_k <= 1 {
            return points.to_vec();
        }

        points.iter().step_by(self.every_k).copied().collect()
    }
}
