pub mod builder;
pub mod convert;
pub mod discover;
pub mod error;
pub mod matcher;
pub mod preprocess;
pub mod runner;
pub mod transform;

pub use builder::{PreprocessBuilder, TransformBuilder};
pub use convert::{output_filename, ConversionPipeline, ConversionReport};
pub use error::{PipelineError, SceneFailure};
pub use matcher::{MatchDiagnostic, SceneIter, SceneMatcher, SceneTriple, TruthPolicy};
pub use preprocess::{preprocess_directory, PreprocessReport};
pub use runner::{PointCloudTransformer, Transformer};
