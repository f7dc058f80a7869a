use obb_core::{
    class::ClassCode,
    color::Color,
    geometry::{Footprint2D, OrientedBoundingBox3D, Point3},
};

/// Which primitive every box is turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// 2D footprint rectangles seen from above.
    #[default]
    BirdsEye,
    /// 3D wireframe boxes.
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSource {
    Prediction,
    Truth,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxShape {
    Wireframe(OrientedBoundingBox3D),
    Rectangle(Footprint2D),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub shape: BoxShape,
    pub source: BoxSource,
    pub cls: ClassCode,
    pub confidence: Option<f64>,
}

/// Everything a renderer needs for one scene. `colors[i]` belongs to `boxes[i]`
/// and `point_colors[i]` to `points[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayBundle {
    pub points: Vec<Point3>,
    pub point_colors: Vec<Color>,
    pub boxes: Vec<OverlayBox>,
    pub colors: Vec<Color>,
    pub degenerate_depth: bool,
}

impl OverlayBundle {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.boxes.is_empty()
    }

    pub fn colored_boxes(&self) -> impl Iterator<Item = (&OverlayBox, Color)> + '_ {
        self.boxes.iter().zip(self.colors.iter().copied())
    }

    pub fn colored_points(&self) -> impl Iterator<Item = (Point3, Color)> + '_ {
        self.points
            .iter()
            .copied()
            .zip(self.point_colors.iter().copied())
    }
}
