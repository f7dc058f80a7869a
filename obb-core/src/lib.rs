pub mod annotation;
pub mod class;
pub mod color;
pub mod error;
pub mod geometry;
pub mod pointcloud;
pub mod record;

pub use annotation::{Centroid, ClassLabel, Dimensions, ObjectAnnotation};
pub use class::{ClassCode, ClassEncoding, ClassTable};
pub use color::{class_to_color, Color, ColorTable};
pub use error::{CodecError, MalformedRecordError, ParseColorError};
pub use geometry::{corners_and_edges, footprint_rectangle, Footprint2D, OrientedBoundingBox3D};
pub use record::{encode_record, parse_record_line, CanonicalRecord, RecordCodec};
