use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

use obb_core::pointcloud::point::PointCloud;
use obb_parser::{parsers::bin::write_points, read_point_cloud, Extension, PointCloudError};

use crate::{
    convert::write_atomically,
    discover::{discover_files, scene_name},
    error::{PipelineError, SceneFailure},
    runner::{PointCloudTransformer, Transformer as _},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<SceneFailure>,
}

enum PreprocessError {
    Read(PointCloudError),
    Output(PipelineError),
}

/// `stem.bin` for a single output, `stem_part{n}.bin` (1-based) otherwise.
fn output_names(stem: &str, count: usize) -> Vec<String> {
    if count == 1 {
        return vec![format!("{}.bin", stem)];
    }
    (1..=count)
        .map(|n| format!("{}_part{}.bin", stem, n))
        .collect()
}

fn check_output_dir(
    input_dir: &Path,
    output_dir: &Path,
    overwrite: bool,
) -> Result<(), PipelineError> {
    let output_error = |source| PipelineError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    };

    if !output_dir.exists() {
        return fs::create_dir_all(output_dir).map_err(output_error);
    }

    let same = match (input_dir.canonicalize(), output_dir.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if same {
        return Err(PipelineError::SameDirectory(output_dir.to_path_buf()));
    }

    let occupied = fs::read_dir(output_dir)
        .map_err(output_error)?
        .next()
        .is_some();
    if occupied && !overwrite {
        return Err(PipelineError::OutputNotEmpty(output_dir.to_path_buf()));
    }
    Ok(())
}

/// Runs `transformer` over every `.ply` and `.bin` scan under `input_dir` and
/// writes the resulting clouds as flat `.bin` files into `output_dir`.
///
/// Scans sharing a file stem are written once, from the first in path order.
pub fn preprocess_directory(
    input_dir: &Path,
    output_dir: &Path,
    transformer: &PointCloudTransformer,
    overwrite: bool,
) -> Result<PreprocessReport, PipelineError> {
    let inputs = discover_files(input_dir, &[Extension::Ply.as_str(), Extension::Bin.as_str()])?;
    check_output_dir(input_dir, output_dir, overwrite)?;
    log::info!("found {} scans in {:?}", inputs.len(), input_dir);

    let mut report = PreprocessReport::default();
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut jobs = Vec::new();
    for input in &inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(kept) = seen.get(&stem) {
            let name = scene_name(input_dir, input);
            log::warn!("skipping {}: same name as {:?}", name, kept);
            report.failed.push(SceneFailure::new(
                name,
                format!("same file stem as {}", kept.display()),
            ));
            continue;
        }
        seen.insert(stem.clone(), input);
        jobs.push((stem, input));
    }

    let results: Vec<_> = jobs
        .par_iter()
        .map(|(stem, input)| preprocess_file(input, stem, output_dir, transformer))
        .collect();

    for ((_, input), result) in jobs.iter().zip(results) {
        let name = scene_name(input_dir, input);
        match result {
            Ok(outputs) => {
                log::debug!("{} -> {} files", name, outputs.len());
                report.written.extend(outputs);
            }
            Err(PreprocessError::Read(e)) => {
                log::warn!("skipping {}: {}", name, e);
                report.failed.push(SceneFailure::new(name, e));
            }
            Err(PreprocessError::Output(e)) => return Err(e),
        }
    }

    Ok(report)
}

fn preprocess_file(
    input: &Path,
    stem: &str,
    output_dir: &Path,
    transformer: &PointCloudTransformer,
) -> Result<Vec<PathBuf>, PreprocessError> {
    let point_cloud = read_point_cloud(input).map_err(PreprocessError::Read)?;
    let clouds: Vec<PointCloud> = transformer.execute(point_cloud);

    let mut written = Vec::with_capacity(clouds.len());
    for (name, cloud) in output_names(stem, clouds.len()).into_iter().zip(&clouds) {
        let path = output_dir.join(name);
        write_atomically(&path, output_dir, |file| write_points(file, cloud))
            .map_err(PreprocessError::Output)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use obb_parser::parsers::bin::read_bin;

    use super::*;
    use crate::{
        builder::{PreprocessBuilder, TransformBuilder as _},
        transform::XRangeSplit,
    };

    const PLY: &str = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 0 0\n3 0 0.5\n3.5 1 1\n";

    fn transformer(builder: PreprocessBuilder) -> PointCloudTransformer {
        PointCloudTransformer::new(builder.build().unwrap())
    }

    #[test]
    fn test_output_names() {
        assert_eq!(output_names("a", 1), vec!["a.bin"]);
        assert_eq!(output_names("a", 2), vec!["a_part1.bin", "a_part2.bin"]);
    }

    #[test]
    fn test_preprocess_ply_to_magnified_bin() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("scan.ply"), PLY).unwrap();

        let report = preprocess_directory(
            input.path(),
            output.path(),
            &transformer(PreprocessBuilder::new().magnify(20.0)),
            false,
        )
        .unwrap();

        assert_eq!(report.written, vec![output.path().join("scan.bin")]);
        let pc = read_bin(&report.written[0]).unwrap();
        assert_eq!(pc.len(), 3);
        assert_relative_eq!(pc.points[1].x, 60.0);
        assert_relative_eq!(pc.points[1].z, 10.0);
        assert_eq!(pc.points[1].intensity, 0.0);
    }

    #[test]
    fn test_preprocess_split_writes_parts() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("scan.ply"), PLY).unwrap();

        let report = preprocess_directory(
            input.path(),
            output.path(),
            &transformer(PreprocessBuilder::new().split(XRangeSplit::new(4.0, 0.0, 1.0))),
            false,
        )
        .unwrap();

        assert_eq!(
            report.written,
            vec![
                output.path().join("scan_part1.bin"),
                output.path().join("scan_part2.bin")
            ]
        );
        assert_eq!(read_bin(&report.written[0]).unwrap().len(), 2);
        assert_eq!(read_bin(&report.written[1]).unwrap().len(), 1);
    }

    #[test]
    fn test_refuses_non_empty_output_unless_overwrite() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("scan.ply"), PLY).unwrap();
        fs::write(output.path().join("scan.bin"), b"old").unwrap();
        let t = transformer(PreprocessBuilder::new());

        assert!(matches!(
            preprocess_directory(input.path(), output.path(), &t, false),
            Err(PipelineError::OutputNotEmpty(_))
        ));

        let report = preprocess_directory(input.path(), output.path(), &t, true).unwrap();
        assert_eq!(report.written.len(), 1);
        assert_eq!(read_bin(&report.written[0]).unwrap().len(), 3);
    }

    #[test]
    fn test_refuses_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let t = transformer(PreprocessBuilder::new());
        assert!(matches!(
            preprocess_directory(dir.path(), dir.path(), &t, true),
            Err(PipelineError::SameDirectory(_))
        ));
    }

    #[test]
    fn test_bad_scan_and_duplicate_stem_are_reported() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.bin"), [0u8; 16]).unwrap();
        fs::write(input.path().join("a.ply"), PLY).unwrap();
        fs::write(input.path().join("b.bin"), [0u8; 7]).unwrap();

        let report = preprocess_directory(
            input.path(),
            &output.path().join("new"),
            &transformer(PreprocessBuilder::new()),
            false,
        )
        .unwrap();

        assert_eq!(report.written, vec![output.path().join("new/a.bin")]);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.scene.as_str()).collect();
        assert_eq!(failed, vec!["a.ply", "b.bin"]);
    }
}
