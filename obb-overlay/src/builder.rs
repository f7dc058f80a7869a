use obb_core::{
    color::ColorTable,
    geometry::{footprint_rectangle, OrientedBoundingBox3D},
    pointcloud::point::PointCloud,
    record::CanonicalRecord,
};

use crate::{
    bundle::{BoxShape, BoxSource, OverlayBox, OverlayBundle, RenderMode},
    depth::depth_colors,
};

/// Turns a scan and its record sets into an [`OverlayBundle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayBuilder {
    pub mode: RenderMode,
    pub colors: ColorTable,
}

impl OverlayBuilder {
    pub fn new(mode: RenderMode, colors: ColorTable) -> Self {
        Self { mode, colors }
    }

    /// Prediction boxes come first, followed by truth boxes, each in record order.
    pub fn build_overlay(
        &self,
        point_cloud: &PointCloud,
        predictions: &[CanonicalRecord],
        truth: Option<&[CanonicalRecord]>,
    ) -> OverlayBundle {
        let depth = depth_colors(point_cloud);
        if depth.degenerate {
            log::debug!("all points share one height, using a flat color");
        }

        let mut bundle = OverlayBundle {
            points: point_cloud.points.iter().map(|p| p.xyz()).collect(),
            point_colors: depth.colors,
            degenerate_depth: depth.degenerate,
            ..Default::default()
        };

        let labelled = predictions
            .iter()
            .map(|r| (r, BoxSource::Prediction))
            .chain(truth.unwrap_or_default().iter().map(|r| (r, BoxSource::Truth)));

        for (record, source) in labelled {
            bundle.boxes.push(OverlayBox {
                shape: self.shape(record),
                source,
                cls: record.cls,
                confidence: record.conf,
            });
            bundle.colors.push(self.colors.color_for(record.cls));
        }

        bundle
    }

    fn shape(&self, record: &CanonicalRecord) -> BoxShape {
        match self.mode {
            RenderMode::BirdsEye => BoxShape::Rectangle(footprint_rectangle(record)),
            RenderMode::Wireframe => {
                BoxShape::Wireframe(OrientedBoundingBox3D::from_record(record))
            }
        }
    }
}
