use obb_core::pointcloud::point::PointCloud;

pub mod downsample;
pub mod magnify;
pub mod outlier;
pub mod split;

pub use downsample::UniformDownsample;
pub use magnify::MagnifyTransform;
pub use outlier::StatisticalOutlierRemoval;
pub use split::XRangeSplit;

/// One preprocessing stage. A stage may split its input into several clouds.
pub trait Transform: Send + Sync {
    fn transform(&self, point_cloud: PointCloud) -> Vec<PointCloud>;
}

pub struct CompositeTransform {
    transforms: Vec<Box<dyn Transform>>,
}

impl CompositeTransform {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for CompositeTransform {
    fn transform(&self, point_cloud: PointCloud) -> Vec<PointCloud> {
        let mut intermediate = vec![point_cloud];

        for transform in &self.transforms {
            let mut next_stage = Vec::new();
            for pc in intermediate {
                let transformed = transform.transform(pc);
                next_stage.extend(transformed);
            }
            intermediate = next_stage;
        }

        intermediate
    }
}
