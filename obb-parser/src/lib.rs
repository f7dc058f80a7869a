pub mod parsers;
pub mod records;
pub mod scene;

pub use parsers::{get_extension, read_point_cloud, Extension, PointCloudError};
pub use records::{read_records, write_records, RecordFileError, RecordPolicy, RecordSet};
pub use scene::{decode_scene, decode_scene_str, read_scene, SceneError};
