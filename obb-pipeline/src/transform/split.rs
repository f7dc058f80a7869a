use obb_core::pointcloud::point::{Point, PointCloud};

use super::Transform;

pub const DEFAULT_X_RANGE: f64 = 5.13;
pub const DEFAULT_MIN_FRAC: f64 = 0.23;
pub const DEFAULT_MAX_FRAC: f64 = 0.77;

/// Cuts a scan along x into two windows that meet at `x_range / 2`.
///
/// The first output holds `mid < x < max_frac * x_range` shifted by `-mid`,
/// the second `min_frac * x_range < x <= mid` shifted by `-min_frac * x_range`,
/// so both start near x = 0. Either output may be empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XRangeSplit {
    pub x_range: f64,
    pub min_frac: f64,
    pub max_frac: f64,
}

impl Default for XRangeSplit {
    fn default() -> Self {
        Self::new(DEFAULT_X_RANGE, DEFAULT_MIN_FRAC, DEFAULT_MAX_FRAC)
    }
}

impl XRangeSplit {
    pub fn new(x_range: f64, min_frac: f64, max_frac: f64) -> Self {
        Self {
            x_range,
            min_frac,
            max_frac,
        }
    }

    fn mid(&self) -> f64 {
        self.x_range / 2.0
    }
}

fn shifted(point: &Point, dx: f64) -> Point {
    Point::new(point.x - dx, point.y, point.z, point.intensity)
}

impl Transform for XRangeSplit {
    fn transform(&self, point_cloud: PointCloud) -> Vec<PointCloud> {
        let mid = self.mid();
        let lower = self.min_frac * self.x_range;
        let upper = self.max_frac * self.x_range;

        let mut part1 = Vec::new();
        let mut part2 = Vec::new();
        for point in &point_cloud.points {
            if point.x > mid && point.x < upper {
                part1.push(shifted(point, mid));
            } else if point.x > lower && point.x <= mid {
                part2.push(shifted(point, lower));
            }
        }

        log::debug!(
            "split {} points into {} + {}",
            point_cloud.len(),
            part1.len(),
            part2.len()
        );

        vec![PointCloud::new(part1), PointCloud::new(part2)]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_split_windows() {
        let split = XRangeSplit::new(10.0, 0.2, 0.8);
        let pc = PointCloud::new(
            [1.0, 2.0, 3.0, 5.0, 6.0, 8.0, 9.0]
                .iter()
                .map(|&x| Point::new(x, 1.0, 2.0, 0.0))
                .collect(),
        );

        let out = split.transform(pc);
        assert_eq!(out.len(), 2);

        let part1: Vec<f64> = out[0].points.iter().map(|p| p.x).collect();
        let part2: Vec<f64> = out[1].points.iter().map(|p| p.x).collect();
        assert_eq!(part1, vec![1.0]);
        assert_eq!(part2, vec![1.0, 3.0]);
        assert_eq!(out[0].points[0].y, 1.0);
    }

    #[test]
    fn test_default_split() {
        let split = XRangeSplit::default();
        assert_relative_eq!(split.mid(), 2.565);

        let pc = PointCloud::new(vec![
            Point::new(3.0, 0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0, 0.0),
            Point::new(-1.0, 0.0, 0.0, 0.0),
        ]);
        let out = split.transform(pc);
        assert_relative_eq!(out[0].points[0].x, 3.0 - 2.565);
        assert_relative_eq!(out[1].points[0].x, 2.0 - 5.13 * 0.23);
    }

    #[test]
    fn test_split_of_empty_cloud_yields_two_empty_clouds() {
        let out = XRangeSplit::default().transform(PointCloud::new(vec![]));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|pc| pc.is_empty()));
    }
}
