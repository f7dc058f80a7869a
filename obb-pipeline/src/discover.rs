use std::path::{Path, PathBuf};

use glob::{glob, Pattern};

use crate::error::PipelineError;

/// Files under `dir` (recursively) with one of `extensions`, sorted by path.
pub fn discover_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::InputDir(dir.to_path_buf()));
    }
    let root = dir
        .to_str()
        .ok_or_else(|| PipelineError::NonUtf8Path(dir.to_path_buf()))?;

    let mut files = Vec::new();
    for extension in extensions {
        let pattern = format!("{}/**/*.{}", Pattern::escape(root), extension);
        for entry in glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => log::warn!("skipping unreadable entry: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Name used for a file in reports: its path relative to `root`.
pub fn scene_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
