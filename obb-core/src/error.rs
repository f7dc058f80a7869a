use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("class label {0:?} has no numeric code under the passthrough encoding")]
    UnmappedClass(String),

    #[error("magnify factor must be a positive finite number, got {0}")]
    InvalidMagnifyFactor(f64),
}

/// A text record line that does not follow the `x y z dx dy dz rot cls [conf]` layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedRecordError {
    #[error("expected 8 or 9 fields, found {count}")]
    FieldCount { count: usize },

    #[error("field {index} is not a number: {value:?}")]
    InvalidField { index: usize, value: String },

    #[error("class field is not a non-negative integer: {value:?}")]
    InvalidClass { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color {0:?}")]
pub struct ParseColorError(pub String);
