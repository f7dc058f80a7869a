use std::{fmt, str::FromStr};

use crate::{
    annotation::ObjectAnnotation,
    class::{class_code_from_f64, ClassCode, ClassEncoding},
    error::{CodecError, MalformedRecordError},
};

pub const DEFAULT_MAGNIFY_FACTOR: f64 = 20.0;

/// Field count of an unscored (ground truth) record line.
pub const UNSCORED_FIELD_COUNT: usize = 8;
/// Field count of a scored (prediction) record line.
pub const SCORED_FIELD_COUNT: usize = 9;

/// One line of a label file: `x y z dx dy dz rot cls [conf]`.
///
/// Position and extents are already magnified. `rot` is the yaw in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rot: f64,
    pub cls: ClassCode,
    pub conf: Option<f64>,
}

impl CanonicalRecord {
    pub fn center(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn extents(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    pub fn field_count(&self) -> usize {
        if self.conf.is_some() {
            SCORED_FIELD_COUNT
        } else {
            UNSCORED_FIELD_COUNT
        }
    }
}

// Floats use the shortest round-trip form and always keep a decimal point,
// so `20` is written as `20.0`.
impl fmt::Display for CanonicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} {:?} {:?} {:?} {:?} {:?} {}",
            self.x, self.y, self.z, self.dx, self.dy, self.dz, self.rot, self.cls
        )?;
        if let Some(conf) = self.conf {
            write!(f, " {:?}", conf)?;
        }
        Ok(())
    }
}

impl FromStr for CanonicalRecord {
    type Err = MalformedRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_record_line(s)
    }
}

pub fn parse_record_line(line: &str) -> Result<CanonicalRecord, MalformedRecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let count = fields.len();
    if count != UNSCORED_FIELD_COUNT && count != SCORED_FIELD_COUNT {
        return Err(MalformedRecordError::FieldCount { count });
    }

    let number = |index: usize| -> Result<f64, MalformedRecordError> {
        fields[index]
            .parse::<f64>()
            .map_err(|_| MalformedRecordError::InvalidField {
                index,
                value: fields[index].to_string(),
            })
    };

    let cls = parse_class_field(fields[7])?;
    let conf = if count == SCORED_FIELD_COUNT {
        let conf = number(8)?;
        if !(0.0..=1.0).contains(&conf) {
            return Err(MalformedRecordError::InvalidField {
                index: 8,
                value: fields[8].to_string(),
            });
        }
        Some(conf)
    } else {
        None
    };

    Ok(CanonicalRecord {
        x: number(0)?,
        y: number(1)?,
        z: number(2)?,
        dx: number(3)?,
        dy: number(4)?,
        dz: number(5)?,
        rot: number(6)?,
        cls,
        conf,
    })
}

// Label files written by other tools store the class as a float (`1.0`).
fn parse_class_field(field: &str) -> Result<ClassCode, MalformedRecordError> {
    if let Ok(code) = field.parse::<ClassCode>() {
        return Ok(code);
    }

    let invalid = || MalformedRecordError::InvalidClass {
        value: field.to_string(),
    };
    let value = field.parse::<f64>().map_err(|_| invalid())?;
    class_code_from_f64(value).ok_or_else(invalid)
}

/// Magnify factors must be positive and finite.
pub fn check_magnify_factor(magnify_factor: f64) -> Result<(), CodecError> {
    if magnify_factor.is_finite() && magnify_factor > 0.0 {
        Ok(())
    } else {
        Err(CodecError::InvalidMagnifyFactor(magnify_factor))
    }
}

/// Scales centroid and dimensions by `magnify_factor` and encodes the class.
/// Yaw and confidence are carried over unscaled.
pub fn encode_record(
    annotation: &ObjectAnnotation,
    magnify_factor: f64,
    encoding: &ClassEncoding,
) -> Result<CanonicalRecord, CodecError> {
    check_magnify_factor(magnify_factor)?;

    let c = &annotation.centroid;
    let d = &annotation.dimensions;
    Ok(CanonicalRecord {
        x: c.x * magnify_factor,
        y: c.y * magnify_factor,
        z: c.z * magnify_factor,
        dx: d.length * magnify_factor,
        dy: d.width * magnify_factor,
        dz: d.height * magnify_factor,
        rot: annotation.yaw,
        cls: encoding.encode(&annotation.class)?,
        conf: annotation.confidence,
    })
}

/// Magnify factor and class encoding applied to every object of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCodec {
    pub magnify_factor: f64,
    pub encoding: ClassEncoding,
}

impl RecordCodec {
    pub fn new(magnify_factor: f64, encoding: ClassEncoding) -> Self {
        Self {
            magnify_factor,
            encoding,
        }
    }

    /// Checks the settings that would make every scene fail.
    pub fn validate(&self) -> Result<(), CodecError> {
        check_magnify_factor(self.magnify_factor)
    }

    pub fn encode(&self, annotation: &ObjectAnnotation) -> Result<CanonicalRecord, CodecError> {
        encode_record(annotation, self.magnify_factor, &self.encoding)
    }

    pub fn encode_all(
        &self,
        annotations: &[ObjectAnnotation],
    ) -> Result<Vec<CanonicalRecord>, CodecError> {
        annotations.iter().map(|a| self.encode(a)).collect()
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAGNIFY_FACTOR, ClassEncoding::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Centroid, ClassLabel, Dimensions};

    fn annotation(name: &str, yaw: f64, confidence: Option<f64>) -> ObjectAnnotation {
        ObjectAnnotation {
            centroid: Centroid {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            dimensions: Dimensions {
                length: 0.5,
                width: 0.5,
                height: 0.5,
            },
            yaw,
            class: ClassLabel::Name(name.to_string()),
            confidence,
        }
    }

    #[test]
    fn test_encode_good_object() {
        let record = encode_record(&annotation("good", 0.0, None), 20.0, &ClassEncoding::binary())
            .unwrap();
        assert_eq!(record.to_string(), "20.0 40.0 60.0 10.0 10.0 10.0 0.0 0");
    }

    #[test]
    fn test_encode_scales_position_but_not_rotation_or_confidence() {
        let a = annotation("dent", -2.5, Some(0.75));
        for m in [0.5, 1.0, 3.0, 20.0] {
            let record = encode_record(&a, m, &ClassEncoding::binary()).unwrap();
            assert_eq!(record.x, a.centroid.x * m);
            assert_eq!(record.dz, a.dimensions.height * m);
            assert_eq!(record.rot, a.yaw);
            assert_eq!(record.conf, Some(0.75));
            assert_eq!(record.cls, 1);
        }
    }

    #[test]
    fn test_encode_rejects_non_positive_factor() {
        let a = annotation("good", 0.0, None);
        for m in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                encode_record(&a, m, &ClassEncoding::binary()),
                Err(CodecError::InvalidMagnifyFactor(_))
            ));
            assert!(RecordCodec::new(m, ClassEncoding::binary()).validate().is_err());
        }
        assert!(RecordCodec::default().validate().is_ok());
    }

    #[test]
    fn test_encode_passthrough_rejects_names() {
        let a = annotation("good", 0.0, None);
        assert!(matches!(
            encode_record(&a, 20.0, &ClassEncoding::Passthrough),
            Err(CodecError::UnmappedClass(_))
        ));
    }

    #[test]
    fn test_parse_record_roundtrip() {
        let codec = RecordCodec::default();
        for a in [
            annotation("good", 0.3, None),
            annotation("scratch", -1.2, Some(0.913)),
        ] {
            let record = codec.encode(&a).unwrap();
            let parsed = parse_record_line(&record.to_string()).unwrap();
            assert_eq!(parsed, record);
            assert_eq!(parsed.field_count(), record.field_count());
        }
    }

    #[test]
    fn test_parse_scored_line() {
        let record = parse_record_line("1 2 3 4 5 6 0.5 1 0.9").unwrap();
        assert_eq!(record.center(), [1.0, 2.0, 3.0]);
        assert_eq!(record.extents(), [4.0, 5.0, 6.0]);
        assert_eq!(record.cls, 1);
        assert_eq!(record.conf, Some(0.9));
    }

    #[test]
    fn test_parse_float_class() {
        let record = parse_record_line("1 2 3 4 5 6 0.5 1.0").unwrap();
        assert_eq!(record.cls, 1);
        assert_eq!(record.conf, None);
    }

    #[test]
    fn test_parse_wrong_field_count() {
        assert_eq!(
            parse_record_line("1 2 3 4 5 6 0.5"),
            Err(MalformedRecordError::FieldCount { count: 7 })
        );
        assert_eq!(
            parse_record_line("1 2 3 4 5 6 0.5 1 0.9 7"),
            Err(MalformedRecordError::FieldCount { count: 10 })
        );
        assert_eq!(
            parse_record_line(""),
            Err(MalformedRecordError::FieldCount { count: 0 })
        );
    }

    #[test]
    fn test_parse_invalid_fields() {
        assert_eq!(
            parse_record_line("1 2 x 4 5 6 0.5 1"),
            Err(MalformedRecordError::InvalidField {
                index: 2,
                value: "x".to_string()
            })
        );
        assert!(matches!(
            parse_record_line("1 2 3 4 5 6 0.5 1.5"),
            Err(MalformedRecordError::InvalidClass { .. })
        ));
        assert!(matches!(
            parse_record_line("1 2 3 4 5 6 0.5 -1"),
            Err(MalformedRecordError::InvalidClass { .. })
        ));
    }

    #[test]
    fn test_parse_confidence_out_of_range() {
        for conf in ["1.5", "-0.1", "NaN", "inf"] {
            let line = format!("1 2 3 4 5 6 0.5 1 {}", conf);
            assert_eq!(
                parse_record_line(&line),
                Err(MalformedRecordError::InvalidField {
                    index: 8,
                    value: conf.to_string()
                })
            );
        }

        let edges = ["0", "1", "1.0"]
            .iter()
            .map(|c| parse_record_line(&format!("1 2 3 4 5 6 0.5 1 {}", c)).unwrap().conf);
        assert_eq!(edges.collect::<Vec<_>>(), vec![Some(0.0), Some(1.0), Some(1.0)]);
    }
}
