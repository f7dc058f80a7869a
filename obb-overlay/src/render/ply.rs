use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use obb_core::{
    color::Color,
    geometry::{Edge, Point3, BOX_EDGES},
};

use super::{output_path, RenderError, Renderer};
use crate::bundle::{BoxShape, OverlayBundle};

const FOOTPRINT_EDGES: [Edge; 4] = [(0, 1), (1, 2), (2, 3), (3, 0)];

/// ASCII PLY with colored vertices and an `edge` element for the box outlines.
/// Footprints are drawn as closed loops at z = 0.
pub struct PlyRenderer {
    pub output_dir: PathBuf,
}

impl PlyRenderer {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }
}

#[derive(Default)]
struct Mesh {
    vertices: Vec<(Point3, Color)>,
    edges: Vec<(usize, usize, Color)>,
}

impl Mesh {
    fn from_bundle(bundle: &OverlayBundle) -> Self {
        let mut mesh = Mesh {
            vertices: bundle.colored_points().collect(),
            edges: Vec::new(),
        };

        for (b, color) in bundle.colored_boxes() {
            match &b.shape {
                BoxShape::Wireframe(obb) => mesh.add_outline(&obb.corners, &BOX_EDGES, color),
                BoxShape::Rectangle(rect) => {
                    let corners = rect.corners().map(|[x, y]| [x, y, 0.0]);
                    mesh.add_outline(&corners, &FOOTPRINT_EDGES, color)
                }
            }
        }
        mesh
    }

    fn add_outline(&mut self, corners: &[Point3], edges: &[Edge], color: Color) {
        let base = self.vertices.len();
        self.vertices.extend(corners.iter().map(|c| (*c, color)));
        self.edges
            .extend(edges.iter().map(|(a, b)| (base + a, base + b, color)));
    }

    fn write<W: Write>(&self, mut w: W, scene: &str) -> io::Result<()> {
        writeln!(w, "ply")?;
        writeln!(w, "format ascii 1.0")?;
        writeln!(w, "comment scene {}", scene)?;
        writeln!(w, "element vertex {}", self.vertices.len())?;
        for axis in ["x", "y", "z"] {
            writeln!(w, "property float {}", axis)?;
        }
        for channel in ["red", "green", "blue"] {
            writeln!(w, "property uchar {}", channel)?;
        }
        writeln!(w, "element edge {}", self.edges.len())?;
        writeln!(w, "property int vertex1")?;
        writeln!(w, "property int vertex2")?;
        for channel in ["red", "green", "blue"] {
            writeln!(w, "property uchar {}", channel)?;
        }
        writeln!(w, "end_header")?;

        for ([x, y, z], c) in &self.vertices {
            writeln!(
                w,
                "{} {} {} {} {} {}",
                *x as f32, *y as f32, *z as f32, c.r, c.g, c.b
            )?;
        }
        for (a, b, c) in &self.edges {
            writeln!(w, "{} {} {} {} {}", a, b, c.r, c.g, c.b)?;
        }
        w.flush()
    }
}

impl Renderer for PlyRenderer {
    fn render(&self, scene: &str, bundle: &OverlayBundle) -> Result<PathBuf, RenderError> {
        let path = output_path(&self.output_dir, scene, "ply")?;
        let io_error = |source| RenderError::Io {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(io_error)?;
        Mesh::from_bundle(bundle)
            .write(BufWriter::new(file), scene)
            .map_err(io_error)?;
        Ok(path)
    }
}
