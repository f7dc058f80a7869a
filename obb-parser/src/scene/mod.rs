use std::{fs, io, path::Path};

use serde::Deserialize;
use serde_json::{error::Category, Value};
use thiserror::Error;

use obb_core::annotation::{Centroid, ClassLabel, Dimensions, ObjectAnnotation};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene: {0}")]
    Io(#[from] io::Error),

    #[error("malformed JSON: {0}")]
    Decode(serde_json::Error),

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Io => SceneError::Io(e.into()),
            Category::Syntax | Category::Eof => SceneError::Decode(e),
            Category::Data => SceneError::Schema(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawScene {
    objects: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    centroid: Centroid,
    dimensions: Dimensions,
    rotations: RawRotations,
    name: ClassLabel,
    #[serde(default, alias = "score")]
    confidence: Option<f64>,
}

// labelCloud style exports carry x and y rotations too; only yaw is used.
#[derive(Debug, Deserialize)]
struct RawRotations {
    z: f64,
}

impl RawObject {
    fn into_annotation(self, index: usize) -> Result<ObjectAnnotation, SceneError> {
        let d = &self.dimensions;
        if [d.length, d.width, d.height]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(SceneError::Schema(format!(
                "object {}: dimensions must be finite and non-negative",
                index
            )));
        }
        if let Some(conf) = self.confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(SceneError::Schema(format!(
                    "object {}: confidence {} is outside [0, 1]",
                    index, conf
                )));
            }
        }

        Ok(ObjectAnnotation {
            centroid: self.centroid,
            dimensions: self.dimensions,
            yaw: self.rotations.z,
            class: self.name,
            confidence: self.confidence,
        })
    }
}

/// Annotations of one scene in file order.
///
/// Every object needs `centroid.{x,y,z}`, `dimensions.{length,width,height}`,
/// `rotations.z` and `name`; a missing key is a schema error, never a default.
pub fn decode_scene(payload: &Value) -> Result<Vec<ObjectAnnotation>, SceneError> {
    let scene = RawScene::deserialize(payload)?;
    into_annotations(scene)
}

pub fn decode_scene_str(payload: &str) -> Result<Vec<ObjectAnnotation>, SceneError> {
    let scene: RawScene = serde_json::from_str(payload)?;
    into_annotations(scene)
}

pub fn read_scene(path: &Path) -> Result<Vec<ObjectAnnotation>, SceneError> {
    let payload = fs::read_to_string(path)?;
    decode_scene_str(&payload)
}

fn into_annotations(scene: RawScene) -> Result<Vec<ObjectAnnotation>, SceneError> {
    scene
        .objects
        .into_iter()
        .enumerate()
        .map(|(index, object)| object.into_annotation(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(name: Value) -> Value {
        json!({
            "centroid": {"x": 1.0, "y": 2.0, "z": 3.0},
            "dimensions": {"length": 0.5, "width": 0.25, "height": 0.125},
            "rotations": {"x": 0.0, "y": 0.0, "z": -0.5},
            "name": name
        })
    }

    #[test]
    fn test_decode_scene_keeps_object_order() {
        let payload = json!({"objects": [object(json!("good")), object(json!(3))]});
        let annotations = decode_scene(&payload).unwrap();

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].class, ClassLabel::Name("good".to_string()));
        assert_eq!(annotations[1].class, ClassLabel::Id(3));
        assert_eq!(annotations[0].centroid.z, 3.0);
        assert_eq!(annotations[0].dimensions.width, 0.25);
        assert_eq!(annotations[0].yaw, -0.5);
        assert_eq!(annotations[0].confidence, None);
    }

    #[test]
    fn test_decode_scene_reads_score() {
        let mut obj = object(json!("good"));
        obj["score"] = json!(0.8);
        let annotations = decode_scene(&json!({ "objects": [obj] })).unwrap();
        assert_eq!(annotations[0].confidence, Some(0.8));
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        for key in ["centroid", "dimensions", "rotations", "name"] {
            let mut obj = object(json!("good"));
            obj.as_object_mut().unwrap().remove(key);
            let result = decode_scene(&json!({ "objects": [obj] }));
            assert!(
                matches!(result, Err(SceneError::Schema(ref m)) if m.contains(key)),
                "missing {} gave {:?}",
                key,
                result
            );
        }
    }

    #[test]
    fn test_missing_nested_key_is_schema_error() {
        let mut obj = object(json!("good"));
        obj["rotations"] = json!({"x": 0.0});
        let result = decode_scene_str(&json!({ "objects": [obj] }).to_string());
        assert!(matches!(result, Err(SceneError::Schema(_))));
    }

    #[test]
    fn test_missing_objects_is_schema_error() {
        assert!(matches!(
            decode_scene_str("{\"labels\": []}"),
            Err(SceneError::Schema(_))
        ));
    }

    #[test]
    fn test_syntax_error_is_decode_error() {
        assert!(matches!(
            decode_scene_str("{\"objects\": [ {"),
            Err(SceneError::Decode(_))
        ));
    }

    #[test]
    fn test_negative_dimension_is_rejected() {
        let mut obj = object(json!("good"));
        obj["dimensions"]["width"] = json!(-1.0);
        assert!(matches!(
            decode_scene(&json!({ "objects": [obj] })),
            Err(SceneError::Schema(_))
        ));
    }

    #[test]
    fn test_read_scene_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        fs::write(&path, json!({"objects": [object(json!("good"))]}).to_string()).unwrap();

        let annotations = read_scene(&path).unwrap();
        assert_eq!(annotations.len(), 1);

        assert!(matches!(
            read_scene(&dir.path().join("absent.json")),
            Err(SceneError::Io(_))
        ));
    }
}
