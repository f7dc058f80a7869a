use obb_core::error::CodecError;

use crate::transform::{
    CompositeTransform, MagnifyTransform, StatisticalOutlierRemoval, Transform, UniformDownsample,
    XRangeSplit,
};

pub trait TransformBuilder {
    fn build(&self) -> Result<Box<dyn Transform>, CodecError>;
}

/// Preprocessing options. Stages run as downsample, outlier removal, split,
/// magnify; unset ones are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessBuilder {
    pub every_k: Option<usize>,
    pub outlier_removal: Option<StatisticalOutlierRemoval>,
    pub split: Option<XRangeSplit>,
    pub magnify_factor: Option<f64>,
}

impl PreprocessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downsample(mut self, every_k: usize) -> Self {
        self.every_k = Some(every_k);
        self
    }

    pub fn remove_outliers(mut self, outlier_removal: StatisticalOutlierRemoval) -> Self {
        self.outlier_removal = Some(outlier_removal);
        self
    }

    pub fn split(mut self, split: XRangeSplit) -> Self {
        self.split = Some(split);
        self
    }

    pub fn magnify(mut self, factor: f64) -> Self {
        self.magnify_factor = Some(factor);
        self
    }
}

impl TransformBuilder for PreprocessBuilder {
    fn build(&self) -> Result<Box<dyn Transform>, CodecError> {
        let mut stages: Vec<Box<dyn Transform>> = Vec::new();

        if let Some(every_k) = self.every_k {
            stages.push(Box::new(UniformDownsample::new(every_k)));
        }
        if let Some(sor) = self.outlier_removal {
            stages.push(Box::new(sor));
        }
        if let Some(split) = self.split {
            stages.push(Box::new(split));
        }
        if let Some(factor) = self.magnify_factor {
            stages.push(Box::new(MagnifyTransform::new(factor)?));
        }

        Ok(Box::new(CompositeTransform::new(stages)))
    }
}
