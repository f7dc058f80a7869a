use obb_core::{error::CodecError, pointcloud::point::PointCloud, record::check_magnify_factor};

use super::Transform;

/// Scales x, y and z by a constant factor. Intensity is left as is.
pub struct MagnifyTransform {
    factor: f64,
}

impl MagnifyTransform {
    pub fn new(factor: f64) -> Result<Self, CodecError> {
        check_magnify_factor(factor)?;
        Ok(Self { factor })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Transform for MagnifyTransform {
    fn transform(&self, mut point_cloud: PointCloud) -> Vec<PointCloud> {
        for point in point_cloud.iter_mut() {
            point.scale(self.factor);
        }
        vec![PointCloud::new(point_cloud.points)]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use obb_core::pointcloud::point::Point;

    use super::*;

    #[test]
    fn test_magnify_scales_coordinates_only() {
        let pc = PointCloud::new(vec![Point::new(1.0, -2.0, 0.125, 0.75)]);
        let out = MagnifyTransform::new(20.0).unwrap().transform(pc);

        let p = out[0].points[0];
        assert_relative_eq!(p.x, 20.0);
        assert_relative_eq!(p.y, -40.0);
        assert_relative_eq!(p.z, 2.5);
        assert_eq!(p.intensity, 0.75);
        assert_eq!(out[0].z_range(), Some((2.5, 2.5)));
    }

    #[test]
    fn test_magnify_rejects_bad_factor() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(MagnifyTransform::new(factor).is_err());
        }
    }
}
