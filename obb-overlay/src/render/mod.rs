use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::bundle::OverlayBundle;

pub mod ply;
pub mod svg;

pub use ply::PlyRenderer;
pub use svg::SvgRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write overlay {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Draws one scene and returns where the result went.
pub trait Renderer: Send + Sync {
    fn render(&self, scene: &str, bundle: &OverlayBundle) -> Result<PathBuf, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    #[default]
    Svg,
    Ply,
}

impl RendererKind {
    pub fn build(&self, output_dir: &Path) -> Box<dyn Renderer> {
        match self {
            RendererKind::Svg => Box::new(SvgRenderer::new(output_dir)),
            RendererKind::Ply => Box::new(PlyRenderer::new(output_dir)),
        }
    }
}

/// Creates `output_dir` if needed and returns `output_dir/scene.extension`.
pub(crate) fn output_path(
    output_dir: &Path,
    scene: &str,
    extension: &str,
) -> Result<PathBuf, RenderError> {
    fs::create_dir_all(output_dir).map_err(|source| RenderError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    Ok(output_dir.join(format!("{}.{}", scene, extension)))
}
