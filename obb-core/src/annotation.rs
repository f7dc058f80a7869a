use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::class::{class_code_from_f64, ClassCode};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Class of an annotated object, either a label name or an id that is already numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Id(#[serde(deserialize_with = "whole_class_code")] ClassCode),
    Name(String),
}

// Exporters that write every number as a float store ids as `1.0`.
fn whole_class_code<'de, D>(deserializer: D) -> Result<ClassCode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    class_code_from_f64(value)
        .ok_or_else(|| de::Error::custom(format!("{} is not a class id", value)))
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Id(id) => write!(f, "{}", id),
            ClassLabel::Name(name) => write!(f, "{}", name),
        }
    }
}

/// One annotated object of a scene, in scene units.
///
/// `yaw` is the rotation about the z axis in radians and is kept exactly as
/// annotated (it is never normalized). `confidence` is only present for
/// detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAnnotation {
    pub centroid: Centroid,
    pub dimensions: Dimensions,
    pub yaw: f64,
    pub class: ClassLabel,
    pub confidence: Option<f64>,
}
