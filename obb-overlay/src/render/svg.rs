use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use obb_core::{color::Color, geometry::Point2};

use super::{output_path, RenderError, Renderer};
use crate::bundle::{BoxShape, BoxSource, OverlayBundle};

const MARGIN: f64 = 1.0;

/// Bird's-eye SVG: points and boxes projected onto the x-y plane, +y up.
///
/// Truth boxes are dashed. Wireframes are drawn as their projected edges.
pub struct SvgRenderer {
    pub output_dir: PathBuf,
    pub point_radius: Option<f64>,
}

impl SvgRenderer {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            point_radius: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Point2,
    max: Point2,
}

impl Bounds {
    fn of(bundle: &OverlayBundle) -> Self {
        let mut min = [f64::MAX; 2];
        let mut max = [f64::MIN; 2];
        let mut extend = |p: Point2| {
            for i in 0..2 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        };

        for p in &bundle.points {
            extend([p[0], p[1]]);
        }
        for b in &bundle.boxes {
            match &b.shape {
                BoxShape::Rectangle(rect) => rect.corners().into_iter().for_each(&mut extend),
                BoxShape::Wireframe(obb) => {
                    obb.corners.iter().for_each(|c| extend([c[0], c[1]]))
                }
            }
        }

        if min[0] > max[0] {
            return Bounds {
                min: [-MARGIN; 2],
                max: [MARGIN; 2],
            };
        }
        Bounds {
            min: [min[0] - MARGIN, min[1] - MARGIN],
            max: [max[0] + MARGIN, max[1] + MARGIN],
        }
    }

    fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }
}

fn stroke(color: Color, source: BoxSource) -> String {
    let dash = match source {
        BoxSource::Prediction => "",
        BoxSource::Truth => r#" stroke-dasharray="4 2""#,
    };
    format!(
        r#"fill="none" stroke="{}" stroke-width="1.5" vector-effect="non-scaling-stroke"{}"#,
        color, dash
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl SvgRenderer {
    fn write_svg<W: Write>(
        &self,
        mut w: W,
        scene: &str,
        bundle: &OverlayBundle,
    ) -> io::Result<()> {
        let bounds = Bounds::of(bundle);
        let radius = self
            .point_radius
            .unwrap_or_else(|| bounds.width().max(bounds.height()) / 800.0);

        writeln!(
            w,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            bounds.min[0],
            -bounds.max[1],
            bounds.width(),
            bounds.height()
        )?;
        writeln!(w, "<title>{}</title>", escape_xml(scene))?;
        // y is flipped so that world coordinates can be used directly below
        writeln!(w, r#"<g transform="scale(1,-1)">"#)?;

        for (p, color) in bundle.colored_points() {
            writeln!(
                w,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                p[0], p[1], radius, color
            )?;
        }

        for (b, color) in bundle.colored_boxes() {
            let style = stroke(color, b.source);
            match &b.shape {
                BoxShape::Rectangle(rect) => {
                    let [cx, cy] = rect.center();
                    writeln!(
                        w,
                        r#"<rect x="{}" y="{}" width="{}" height="{}" transform="rotate({} {} {})" {}/>"#,
                        rect.origin[0],
                        rect.origin[1],
                        rect.width,
                        rect.height,
                        rect.angle_deg,
                        cx,
                        cy,
                        style
                    )?;
                }
                BoxShape::Wireframe(obb) => {
                    for (from, to) in obb.segments() {
                        writeln!(
                            w,
                            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
                            from[0], from[1], to[0], to[1], style
                        )?;
                    }
                }
            }
        }

        writeln!(w, "</g>")?;
        writeln!(w, "</svg>")?;
        w.flush()
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, scene: &str, bundle: &OverlayBundle) -> Result<PathBuf, RenderError> {
        let path = output_path(&self.output_dir, scene, "svg")?;
        let io_error = |source| RenderError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_error)?;
        self.write_svg(BufWriter::new(file), scene, bundle)
            .map_err(io_error)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use obb_core::{
        color::ColorTable,
        pointcloud::point::{Point, PointCloud},
        record::parse_record_line,
    };

    use super::*;
    use crate::{builder::OverlayBuilder, bundle::RenderMode};

    fn bundle(mode: RenderMode) -> OverlayBundle {
        let pc = PointCloud::new(vec![
            Point::new(0.0, 0.0, 0.0, 0.0),
            Point::new(2.0, 2.0, 1.0, 0.0),
        ]);
        let preds = vec![parse_record_line("1 1 0 2 1 1 1.5707963267948966 0 0.5").unwrap()];
        let truth = vec![parse_record_line("1 1 0 2 1 1 0 1").unwrap()];
        OverlayBuilder::new(mode, ColorTable::default()).build_overlay(&pc, &preds, Some(&truth))
    }

    #[test]
    fn test_render_birds_eye_svg() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgRenderer::new(dir.path());

        let path = renderer
            .render("scan1", &bundle(RenderMode::BirdsEye))
            .unwrap();
        assert_eq!(path, dir.path().join("scan1.svg"));

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(r#"transform="rotate(90 1 1)""#));
        assert!(svg.contains(r##"stroke="#0000ff""##));
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
    }

    #[test]
    fn test_render_wireframe_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = SvgRenderer::new(&dir.path().join("nested"))
            .render("scan1", &bundle(RenderMode::Wireframe))
            .unwrap();

        let svg = std::fs::read_to_string(path).unwrap();
        assert_eq!(svg.matches("<line").count(), 24);
        assert_eq!(svg.matches("<rect").count(), 0);
    }

    #[test]
    fn test_scene_name_is_escaped_in_title() {
        let dir = tempfile::tempdir().unwrap();
        let mut svg = Vec::new();
        SvgRenderer::new(dir.path())
            .write_svg(&mut svg, "a&b<c>", &OverlayBundle::default())
            .unwrap();

        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("<title>a&amp;b&lt;c&gt;</title>"));
        assert!(!svg.contains("a&b"));
    }

    #[test]
    fn test_render_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = SvgRenderer::new(dir.path())
            .render("empty", &OverlayBundle::default())
            .unwrap();
        let svg = std::fs::read_to_string(path).unwrap();
        assert!(svg.contains(r#"viewBox="-1 -1 2 2""#));
    }
}
