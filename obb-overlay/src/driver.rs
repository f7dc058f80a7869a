use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use thiserror::Error;

use obb_core::record::CanonicalRecord;
use obb_parser::{read_point_cloud, read_records, PointCloudError, RecordFileError, RecordPolicy};
use obb_pipeline::{MatchDiagnostic, SceneFailure, SceneTriple};

use crate::{
    builder::OverlayBuilder,
    render::{RenderError, Renderer},
};

#[derive(Debug, Default)]
pub struct RenderReport {
    pub rendered: Vec<PathBuf>,
    /// Scenes the matcher dropped.
    pub unmatched: Vec<MatchDiagnostic>,
    /// Matched scenes whose inputs could not be read.
    pub failed: Vec<SceneFailure>,
}

#[derive(Debug, Error)]
enum SceneInputError {
    #[error("point cloud: {0}")]
    PointCloud(#[from] PointCloudError),

    #[error("{path:?}: {source}")]
    Records {
        path: PathBuf,
        #[source]
        source: RecordFileError,
    },
}

fn load_records(
    path: Option<&Path>,
    policy: RecordPolicy,
) -> Result<Option<Vec<CanonicalRecord>>, SceneInputError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let set = read_records(path, policy).map_err(|source| SceneInputError::Records {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(set.records))
}

fn render_scene(
    triple: &SceneTriple,
    builder: &OverlayBuilder,
    renderer: &dyn Renderer,
    policy: RecordPolicy,
) -> Result<Result<PathBuf, SceneInputError>, RenderError> {
    let inputs = read_point_cloud(&triple.point_cloud)
        .map_err(SceneInputError::from)
        .and_then(|pc| {
            let predictions = load_records(triple.prediction.as_deref(), policy)?;
            let truth = load_records(triple.truth.as_deref(), policy)?;
            Ok((pc, predictions.unwrap_or_default(), truth))
        });

    let (point_cloud, predictions, truth) = match inputs {
        Ok(inputs) => inputs,
        Err(e) => return Ok(Err(e)),
    };

    let bundle = builder.build_overlay(&point_cloud, &predictions, truth.as_deref());
    let path = renderer.render(&triple.stem, &bundle)?;
    Ok(Ok(path))
}

/// Renders every matched scene. Scenes are independent and rendered in parallel;
/// the report keeps the matcher's order.
///
/// Unmatched scenes and unreadable inputs are collected in the report. A
/// renderer that cannot write its output stops the run.
pub fn render_scenes<I>(
    scenes: I,
    builder: &OverlayBuilder,
    renderer: &dyn Renderer,
    policy: RecordPolicy,
) -> Result<RenderReport, RenderError>
where
    I: IntoIterator<Item = Result<SceneTriple, MatchDiagnostic>>,
{
    let mut report = RenderReport::default();
    let mut triples = Vec::new();
    for scene in scenes {
        match scene {
            Ok(triple) => triples.push(triple),
            Err(diagnostic) => {
                log::warn!("{}", diagnostic);
                report.unmatched.push(diagnostic);
            }
        }
    }

    let results: Vec<_> = triples
        .par_iter()
        .map(|triple| render_scene(triple, builder, renderer, policy))
        .collect();

    for (triple, result) in triples.iter().zip(results) {
        match result? {
            Ok(path) => {
                log::debug!("{} -> {:?}", triple.stem, path);
                report.rendered.push(path);
            }
            Err(e) => {
                log::warn!("skipping {}: {}", triple.stem, e);
                report.failed.push(SceneFailure::new(triple.stem.clone(), e));
            }
        }
    }

    Ok(report)
}
