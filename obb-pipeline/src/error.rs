use std::{fmt, io, path::PathBuf};

use obb_core::error::CodecError;
use thiserror::Error;

/// Errors that stop a whole run. Anything scoped to one scene is a [`SceneFailure`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input directory {0:?} does not exist")]
    InputDir(PathBuf),

    #[error("output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output directory {0:?} is not empty")]
    OutputNotEmpty(PathBuf),

    #[error("output directory {0:?} is the input directory")]
    SameDirectory(PathBuf),

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path {0:?} is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFailure {
    pub scene: String,
    pub reason: String,
}

impl SceneFailure {
    pub fn new(scene: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            scene: scene.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for SceneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scene, self.reason)
    }
}
