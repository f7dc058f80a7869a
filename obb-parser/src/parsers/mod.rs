use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use obb_core::pointcloud::point::PointCloud;

pub mod bin;
pub mod ply;

#[derive(Debug, Error)]
pub enum PointCloudError {
    #[error("failed to read point cloud: {0}")]
    Io(#[from] io::Error),

    #[error("{path:?}: byte length {len} is not a multiple of 16")]
    TruncatedBin { path: PathBuf, len: usize },

    #[error("{path:?}: invalid PLY: {message}")]
    Ply { path: PathBuf, message: String },

    #[error("unsupported point cloud extension {0:?}")]
    UnsupportedExtension(String),
}

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<PointCloud, PointCloudError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Bin,
    Ply,
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Bin => "bin",
            Extension::Ply => "ply",
        }
    }
}

pub fn get_extension(extension: &str) -> Result<Extension, PointCloudError> {
    match extension.to_ascii_lowercase().as_str() {
        "bin" => Ok(Extension::Bin),
        "ply" => Ok(Extension::Ply),
        other => Err(PointCloudError::UnsupportedExtension(other.to_string())),
    }
}

pub fn provider_for(extension: Extension, filenames: Vec<PathBuf>) -> Box<dyn ParserProvider> {
    match extension {
        Extension::Bin => Box::new(bin::BinParserProvider { filenames }),
        Extension::Ply => Box::new(ply::PlyParserProvider { filenames }),
    }
}

/// Reads one scan, choosing the parser from the file extension.
pub fn read_point_cloud(path: &Path) -> Result<PointCloud, PointCloudError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let extension = get_extension(extension)?;

    provider_for(extension, vec![path.to_path_buf()])
        .get_parser()
        .parse()
}
