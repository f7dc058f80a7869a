use obb_core::{color::Color, pointcloud::point::PointCloud};

/// Hue at normalized depth 0.
pub const NEAR_COLOR: Color = Color::RED;
/// Hue at normalized depth 1.
pub const FAR_COLOR: Color = Color::BLUE;

/// Per-point gradient colors of a cloud, from z.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthColors {
    pub colors: Vec<Color>,
    /// Set when every point has the same z and all of them got the middle hue.
    pub degenerate: bool,
}

/// `(z - z_min) / (z_max - z_min)`, or 0.5 when the range is empty.
pub fn normalized_depth(z: f64, z_min: f64, z_max: f64) -> f64 {
    let range = z_max - z_min;
    if range <= 0.0 || !range.is_finite() {
        return 0.5;
    }
    (z - z_min) / range
}

pub fn depth_color(normalized: f64) -> Color {
    NEAR_COLOR.lerp(FAR_COLOR, normalized)
}

pub fn depth_colors(point_cloud: &PointCloud) -> DepthColors {
    let Some((z_min, z_max)) = point_cloud.z_range() else {
        return DepthColors::default();
    };

    let colors = point_cloud
        .points
        .iter()
        .map(|p| depth_color(normalized_depth(p.z, z_min, z_max)))
        .collect();

    DepthColors {
        colors,
        degenerate: z_max <= z_min,
    }
}
