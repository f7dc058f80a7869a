use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rayon::iter::{
    IndexedParallelIterator as _, IntoParallelRefIterator as _, ParallelIterator as _,
};
use tempfile::NamedTempFile;

use obb_core::{error::CodecError, record::RecordCodec};
use obb_parser::{records::write_records, scene::read_scene, SceneError};

use crate::{
    discover::{discover_files, scene_name},
    error::{PipelineError, SceneFailure},
};

/// `{index:06}.txt`
pub fn output_filename(index: usize) -> String {
    format!("{:06}.txt", index)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    pub written: usize,
    pub outputs: Vec<PathBuf>,
    pub failed: Vec<SceneFailure>,
}

enum ConvertError {
    Scene(SceneError),
    Codec(CodecError),
    Output(PipelineError),
}

/// Converts a directory of annotated scenes into one record file per scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPipeline {
    pub codec: RecordCodec,
    pub extension: String,
}

impl Default for ConversionPipeline {
    fn default() -> Self {
        Self {
            codec: RecordCodec::default(),
            extension: "json".to_string(),
        }
    }
}

impl ConversionPipeline {
    pub fn new(codec: RecordCodec) -> Self {
        Self {
            codec,
            ..Default::default()
        }
    }

    /// Writes `output_dir/{i:06}.txt` for the i-th scene in sorted path order.
    ///
    /// A scene that cannot be decoded or encoded is reported in
    /// [`ConversionReport::failed`] and the run goes on; its index is not reused.
    /// Failing to create or write into `output_dir` aborts the run, as does a
    /// codec that cannot encode anything, before any file is touched.
    pub fn convert_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<ConversionReport, PipelineError> {
        self.codec.validate()?;

        let inputs = discover_files(input_dir, &[self.extension.as_str()])?;
        log::info!("found {} scene files in {:?}", inputs.len(), input_dir);

        fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let results: Vec<(PathBuf, Result<usize, ConvertError>)> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| {
                let output = output_dir.join(output_filename(index));
                let result = self.convert_scene(input, &output, output_dir);
                (output, result)
            })
            .collect();

        let mut report = ConversionReport::default();
        for ((output, result), input) in results.into_iter().zip(&inputs) {
            let scene = scene_name(input_dir, input);
            match result {
                Ok(count) => {
                    log::debug!("{} -> {:?} ({} objects)", scene, output, count);
                    report.written += 1;
                    report.outputs.push(output);
                }
                Err(ConvertError::Output(e)) => return Err(e),
                Err(ConvertError::Scene(e)) => {
                    log::warn!("skipping {}: {}", scene, e);
                    report.failed.push(SceneFailure::new(scene, e));
                    remove_stale_output(&output)?;
                }
                Err(ConvertError::Codec(e)) => {
                    log::warn!("skipping {}: {}", scene, e);
                    report.failed.push(SceneFailure::new(scene, e));
                    remove_stale_output(&output)?;
                }
            }
        }

        Ok(report)
    }

    fn convert_scene(
        &self,
        input: &Path,
        output: &Path,
        output_dir: &Path,
    ) -> Result<usize, ConvertError> {
        let annotations = read_scene(input).map_err(ConvertError::Scene)?;
        let records = self
            .codec
            .encode_all(&annotations)
            .map_err(ConvertError::Codec)?;

        write_atomically(output, output_dir, |file| write_records(file, &records))
            .map_err(ConvertError::Output)?;

        Ok(records.len())
    }
}

/// Writes through a temporary file in `dir` that is renamed onto `path` once complete.
pub(crate) fn write_atomically<F>(path: &Path, dir: &Path, write: F) -> Result<(), PipelineError>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let write_error = |source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    write(tmp.as_file_mut()).map_err(write_error)?;
    tmp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

fn remove_stale_output(path: &Path) -> Result<(), PipelineError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::info!("removed stale output {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PipelineError::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}
