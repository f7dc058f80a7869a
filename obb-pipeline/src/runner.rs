use obb_core::{error::CodecError, pointcloud::point::PointCloud};

use crate::{builder::TransformBuilder, transform::Transform};

pub trait Transformer {
    fn execute(&self, point_cloud: PointCloud) -> Vec<PointCloud>;
}

pub struct PointCloudTransformer {
    transform: Box<dyn Transform>,
}

impl PointCloudTransformer {
    pub fn new(transform: Box<dyn Transform>) -> Self {
        Self { transform }
    }

    pub fn from_builder(builder: &dyn TransformBuilder) -> Result<Self, CodecError> {
        Ok(Self::new(builder.build()?))
    }
}

impl Transformer for PointCloudTransformer {
    fn execute(&self, point_cloud: PointCloud) -> Vec<PointCloud> {
        self.transform.transform(point_cloud)
    }
}
