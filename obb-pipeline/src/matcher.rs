use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    vec,
};

use thiserror::Error;

use crate::{discover::discover_files, error::PipelineError};

/// Whether a scene without a ground-truth file is still matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruthPolicy {
    /// Emit the scene without truth (prediction-only overlay).
    #[default]
    Optional,
    /// Skip the scene.
    Required,
}

/// A point cloud and the label files sharing its stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTriple {
    pub stem: String,
    pub point_cloud: PathBuf,
    pub prediction: Option<PathBuf>,
    pub truth: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchDiagnostic {
    #[error("scene {stem}: prediction file {expected:?} not found")]
    MissingPrediction { stem: String, expected: PathBuf },

    #[error("scene {stem}: truth file {expected:?} not found")]
    MissingTruth { stem: String, expected: PathBuf },

    #[error("scene {stem}: {duplicate:?} ignored, {kept:?} has the same name")]
    DuplicateStem {
        stem: String,
        kept: PathBuf,
        duplicate: PathBuf,
    },
}

impl MatchDiagnostic {
    pub fn stem(&self) -> &str {
        match self {
            MatchDiagnostic::MissingPrediction { stem, .. }
            | MatchDiagnostic::MissingTruth { stem, .. }
            | MatchDiagnostic::DuplicateStem { stem, .. } => stem,
        }
    }
}

/// Pairs `name.<point_cloud_extension>` scans with `name.<label_extension>` label files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneMatcher {
    pub point_cloud_extension: String,
    pub label_extension: String,
    pub truth_policy: TruthPolicy,
}

impl Default for SceneMatcher {
    fn default() -> Self {
        Self {
            point_cloud_extension: "bin".to_string(),
            label_extension: "txt".to_string(),
            truth_policy: TruthPolicy::default(),
        }
    }
}

impl SceneMatcher {
    pub fn with_truth_policy(truth_policy: TruthPolicy) -> Self {
        Self {
            truth_policy,
            ..Default::default()
        }
    }

    /// Lists the scans under `point_cloud_dir` (recursively, sorted by path) and
    /// returns an iterator that checks the label files of each scan as it goes.
    ///
    /// Without a prediction directory every scan is emitted on its own. Calling
    /// this again starts a fresh pass.
    pub fn match_scenes(
        &self,
        point_cloud_dir: &Path,
        prediction_dir: Option<&Path>,
        truth_dir: Option<&Path>,
    ) -> Result<SceneIter, PipelineError> {
        let point_clouds =
            discover_files(point_cloud_dir, &[self.point_cloud_extension.as_str()])?;

        Ok(SceneIter {
            point_clouds: point_clouds.into_iter(),
            prediction_dir: prediction_dir.map(Path::to_path_buf),
            truth_dir: truth_dir.map(Path::to_path_buf),
            label_extension: self.label_extension.clone(),
            truth_policy: self.truth_policy,
            seen: HashMap::new(),
        })
    }
}

/// Yields one item per scan: a matched scene or the reason it was skipped.
#[derive(Debug, Clone)]
pub struct SceneIter {
    point_clouds: vec::IntoIter<PathBuf>,
    prediction_dir: Option<PathBuf>,
    truth_dir: Option<PathBuf>,
    label_extension: String,
    truth_policy: TruthPolicy,
    seen: HashMap<String, PathBuf>,
}

impl SceneIter {
    fn label_path(&self, dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{}.{}", stem, self.label_extension))
    }

    fn match_one(&mut self, point_cloud: PathBuf) -> Result<SceneTriple, MatchDiagnostic> {
        let stem = point_cloud
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(kept) = self.seen.get(&stem) {
            return Err(MatchDiagnostic::DuplicateStem {
                stem,
                kept: kept.clone(),
                duplicate: point_cloud,
            });
        }
        self.seen.insert(stem.clone(), point_cloud.clone());

        let prediction = match &self.prediction_dir {
            Some(dir) => {
                let expected = self.label_path(dir, &stem);
                if !expected.is_file() {
                    return Err(MatchDiagnostic::MissingPrediction { stem, expected });
                }
                Some(expected)
            }
            None => None,
        };

        let truth = match &self.truth_dir {
            Some(dir) => {
                let expected = self.label_path(dir, &stem);
                match (expected.is_file(), self.truth_policy) {
                    (true, _) => Some(expected),
                    (false, TruthPolicy::Optional) => None,
                    (false, TruthPolicy::Required) => {
                        return Err(MatchDiagnostic::MissingTruth { stem, expected })
                    }
                }
            }
            None => None,
        };

        Ok(SceneTriple {
            stem,
            point_cloud,
            prediction,
            truth,
        })
    }
}

impl Iterator for SceneIter {
    type Item = Result<SceneTriple, MatchDiagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        let point_cloud = self.point_clouds.next()?;
        Some(self.match_one(point_cloud))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.point_clouds.size_hint()
    }
}

impl ExactSizeIterator for SceneIter {}
