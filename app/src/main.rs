use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    process,
    time::Instant,
};

use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Builder;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use thiserror::Error;

use obb_core::{
    class::{ClassEncoding, ClassTable},
    color::ColorTable,
    error::CodecError,
    record::{RecordCodec, DEFAULT_MAGNIFY_FACTOR},
};
use obb_overlay::{render_scenes, OverlayBuilder, RenderError, RenderMode, RendererKind};
use obb_parser::RecordPolicy;
use obb_pipeline::{
    preprocess_directory,
    transform::{outlier, StatisticalOutlierRemoval, XRangeSplit},
    ConversionPipeline, PipelineError,
    PointCloudTransformer, PreprocessBuilder, SceneMatcher, TruthPolicy,
};

#[derive(Parser, Debug)]
#[command(
    name = "obbtool",
    about = "Converts 3D box annotations into OBB records and draws them over point clouds",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one record file per annotated scene
    Convert(ConvertArgs),
    /// Draw prediction and truth boxes over each scan
    Overlay(OverlayArgs),
    /// Downsample, split and rescale raw scans into .bin files
    Preprocess(PreprocessArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ClassEncodingArg {
    /// "good" is 0, every other name is 1
    Binary,
    /// labels are already numeric
    Passthrough,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    BirdsEye,
    Wireframe,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::BirdsEye => RenderMode::BirdsEye,
            ModeArg::Wireframe => RenderMode::Wireframe,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RendererArg {
    Svg,
    Ply,
}

impl From<RendererArg> for RendererKind {
    fn from(renderer: RendererArg) -> Self {
        match renderer {
            RendererArg::Svg => RendererKind::Svg,
            RendererArg::Ply => RendererKind::Ply,
        }
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[arg(short, long, value_name = "DIR")]
    input_dir: PathBuf,

    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAGNIFY_FACTOR)]
    magnify_factor: f64,

    #[arg(long, value_enum, default_value_t = ClassEncodingArg::Binary)]
    class_encoding: ClassEncodingArg,

    /// JSON file like {"names": {"good": 0}, "default": 1}; replaces the binary table
    #[arg(long, value_name = "FILE", conflicts_with = "class_encoding")]
    class_map: Option<PathBuf>,

    #[arg(long, default_value = "json")]
    extension: String,
}

#[derive(Args, Debug)]
struct OverlayArgs {
    #[arg(long, value_name = "DIR")]
    point_cloud_dir: PathBuf,

    /// Without it, every scan is drawn without boxes
    #[arg(long, value_name = "DIR")]
    prediction_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    truth_dir: Option<PathBuf>,

    /// Skip scenes that have no truth file
    #[arg(long, requires = "truth_dir")]
    require_truth: bool,

    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::BirdsEye)]
    mode: ModeArg,

    #[arg(long, value_enum, default_value_t = RendererArg::Svg)]
    renderer: RendererArg,

    /// Fail a scene on its first malformed record instead of skipping the line
    #[arg(long)]
    strict_records: bool,

    /// JSON file like {"0": "blue", "1": "red"}
    #[arg(long, value_name = "FILE")]
    palette: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PreprocessArgs {
    #[arg(short, long, value_name = "DIR")]
    input_dir: PathBuf,

    #[arg(short, long, value_name = "DIR")]
    output_dir: PathBuf,

    #[arg(long)]
    magnify_factor: Option<f64>,

    /// Keep every k-th point
    #[arg(long, value_name = "K")]
    every_k: Option<usize>,

    /// Drop points far from their neighbours before splitting
    #[arg(long)]
    remove_outliers: bool,

    /// Neighbours per point for outlier removal
    #[arg(long, value_name = "K", default_value_t = outlier::DEFAULT_NEIGHBORS)]
    outlier_neighbors: usize,

    /// Standard deviations above the mean neighbour distance to keep
    #[arg(long, value_name = "RATIO", default_value_t = outlier::DEFAULT_STD_RATIO)]
    outlier_std_ratio: f64,

    /// Cut each scan into two x windows
    #[arg(long)]
    split: bool,

    #[arg(long)]
    overwrite: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to read {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn class_encoding(args: &ConvertArgs) -> Result<ClassEncoding, AppError> {
    if let Some(path) = &args.class_map {
        let table: ClassTable = load_json(path)?;
        return Ok(ClassEncoding::Table(table));
    }
    Ok(match args.class_encoding {
        ClassEncodingArg::Binary => ClassEncoding::binary(),
        ClassEncodingArg::Passthrough => ClassEncoding::Passthrough,
    })
}

fn palette(args: &OverlayArgs) -> Result<ColorTable, AppError> {
    match &args.palette {
        Some(path) => load_json(path),
        None => Ok(ColorTable::default()),
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), AppError> {
    log::info!("input folder: {:?}", args.input_dir);
    log::info!("output folder: {:?}", args.output_dir);
    log::info!("magnify factor: {}", args.magnify_factor);

    let encoding = class_encoding(&args)?;
    log::info!("class encoding: {:?}", encoding);
    let pipeline = ConversionPipeline {
        codec: RecordCodec::new(args.magnify_factor, encoding),
        extension: args.extension,
    };

    log::info!("start converting...");
    let start = Instant::now();
    let report = pipeline.convert_directory(&args.input_dir, &args.output_dir)?;
    log::info!("finish converting in {:?}", start.elapsed());

    log::info!("{} scenes written", report.written);
    for failure in &report.failed {
        log::error!("failed scene {}", failure);
    }
    Ok(())
}

fn run_overlay(args: OverlayArgs) -> Result<(), AppError> {
    log::info!("point cloud folder: {:?}", args.point_cloud_dir);
    log::info!("prediction folder: {:?}", args.prediction_dir);
    log::info!("truth folder: {:?}", args.truth_dir);
    log::info!("output folder: {:?}", args.output_dir);

    let truth_policy = if args.require_truth {
        TruthPolicy::Required
    } else {
        TruthPolicy::Optional
    };
    let record_policy = if args.strict_records {
        RecordPolicy::FailFast
    } else {
        RecordPolicy::SkipAndWarn
    };
    let builder = OverlayBuilder::new(args.mode.into(), palette(&args)?);
    let renderer = RendererKind::from(args.renderer).build(&args.output_dir);

    log::info!("start matching...");
    let scenes = SceneMatcher::with_truth_policy(truth_policy).match_scenes(
        &args.point_cloud_dir,
        args.prediction_dir.as_deref(),
        args.truth_dir.as_deref(),
    )?;
    log::info!("found {} scans", scenes.len());

    log::info!("start rendering...");
    let start = Instant::now();
    let report = render_scenes(scenes, &builder, renderer.as_ref(), record_policy)?;
    log::info!("finish rendering in {:?}", start.elapsed());

    log::info!(
        "{} scenes rendered, {} unmatched",
        report.rendered.len(),
        report.unmatched.len()
    );
    for failure in &report.failed {
        log::error!("failed scene {}", failure);
    }
    Ok(())
}

fn preprocess_builder(args: &PreprocessArgs) -> PreprocessBuilder {
    let mut builder = PreprocessBuilder::new();
    if let Some(every_k) = args.every_k {
        builder = builder.downsample(every_k);
    }
    if args.remove_outliers {
        builder = builder.remove_outliers(StatisticalOutlierRemoval::new(
            args.outlier_neighbors,
            args.outlier_std_ratio,
        ));
    }
    if args.split {
        builder = builder.split(XRangeSplit::default());
    }
    if let Some(factor) = args.magnify_factor {
        builder = builder.magnify(factor);
    }
    builder
}

fn run_preprocess(args: PreprocessArgs) -> Result<(), AppError> {
    log::info!("input folder: {:?}", args.input_dir);
    log::info!("output folder: {:?}", args.output_dir);

    let builder = preprocess_builder(&args);
    log::info!("stages: {:?}", builder);
    let transformer = PointCloudTransformer::from_builder(&builder)?;

    log::info!("start preprocessing...");
    let start = Instant::now();
    let report =
        preprocess_directory(&args.input_dir, &args.output_dir, &transformer, args.overwrite)?;
    log::info!("finish preprocessing in {:?}", start.elapsed());

    log::info!("{} files written", report.written.len());
    for failure in &report.failed {
        log::error!("failed scan {}", failure);
    }
    Ok(())
}

fn main() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let start = Instant::now();
    let result = match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Overlay(args) => run_overlay(args),
        Command::Preprocess(args) => run_preprocess(args),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
    log::info!("Elapsed: {:?}", start.elapsed());
}

#[cfg(test)]
mod tests {
    use obb_core::{annotation::ClassLabel, color::Color};

    use super::*;

    fn convert_args(extra: &[&str]) -> ConvertArgs {
        let mut argv = vec!["obbtool", "convert", "-i", "in", "-o", "out"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Convert(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_defaults() {
        let args = convert_args(&[]);
        assert_eq!(args.magnify_factor, 20.0);
        assert_eq!(args.extension, "json");
        assert_eq!(class_encoding(&args).unwrap(), ClassEncoding::binary());
    }

    #[test]
    fn test_class_map_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        fs::write(&path, r#"{"names": {"dent": 2, "good": 0}, "default": 1}"#).unwrap();

        let args = convert_args(&["--class-map", path.to_str().unwrap()]);
        let encoding = class_encoding(&args).unwrap();
        assert_eq!(
            encoding.encode(&ClassLabel::Name("dent".to_string())).unwrap(),
            2
        );
        assert_eq!(
            encoding.encode(&ClassLabel::Name("scratch".to_string())).unwrap(),
            1
        );
    }

    #[test]
    fn test_bad_class_map_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        fs::write(&path, r#"{"names": {}}"#).unwrap();

        let args = convert_args(&["--class-map", path.to_str().unwrap()]);
        assert!(matches!(
            class_encoding(&args),
            Err(AppError::ParseConfig { .. })
        ));
    }

    #[test]
    fn test_preprocess_outlier_flags() {
        let preprocess = |extra: &[&str]| {
            let mut argv = vec!["obbtool", "preprocess", "-i", "raw", "-o", "bin"];
            argv.extend_from_slice(extra);
            match Cli::parse_from(argv).command {
                Command::Preprocess(args) => preprocess_builder(&args),
                other => panic!("unexpected command {:?}", other),
            }
        };

        assert_eq!(preprocess(&[]).outlier_removal, None);
        assert_eq!(
            preprocess(&["--remove-outliers"]).outlier_removal,
            Some(StatisticalOutlierRemoval::default())
        );
        assert_eq!(
            preprocess(&[
                "--remove-outliers",
                "--outlier-neighbors",
                "8",
                "--outlier-std-ratio",
                "2.5"
            ])
            .outlier_removal,
            Some(StatisticalOutlierRemoval::new(8, 2.5))
        );
    }

    #[test]
    fn test_overlay_palette_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.json");
        fs::write(&path, r##"{"0": "red", "1": "#00ff00"}"##).unwrap();

        let cli = Cli::parse_from([
            "obbtool",
            "overlay",
            "--point-cloud-dir",
            "velodyne",
            "-o",
            "out",
            "--mode",
            "wireframe",
            "--renderer",
            "ply",
            "--palette",
            path.to_str().unwrap(),
        ]);
        let Command::Overlay(args) = cli.command else {
            panic!("expected overlay");
        };
        assert_eq!(RenderMode::from(args.mode), RenderMode::Wireframe);
        assert_eq!(RendererKind::from(args.renderer), RendererKind::Ply);

        let colors = palette(&args).unwrap();
        assert_eq!(colors.color_for(0), Color::RED);
        assert_eq!(colors.color_for(1), Color::new(0, 255, 0));
        assert_eq!(colors.color_for(2), Color::GRAY);
    }
}
