use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{annotation::ClassLabel, error::CodecError};

pub type ClassCode = u32;

/// Class codes written as floats (`1.0`) by other tools. Fractional,
/// negative and out of range values are not codes.
pub fn class_code_from_f64(value: f64) -> Option<ClassCode> {
    (value.fract() == 0.0 && value >= 0.0 && value <= ClassCode::MAX as f64)
        .then_some(value as ClassCode)
}

/// Name to code lookup with a code for every name not listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTable {
    pub names: BTreeMap<String, ClassCode>,
    pub default: ClassCode,
}

impl ClassTable {
    /// `good` is 0, everything else is 1.
    pub fn binary() -> Self {
        let mut names = BTreeMap::new();
        names.insert("good".to_string(), 0);
        ClassTable { names, default: 1 }
    }

    pub fn code_for(&self, name: &str) -> ClassCode {
        self.names.get(name).copied().unwrap_or(self.default)
    }
}

/// How an annotation's class label becomes the integer code of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEncoding {
    /// Names go through the table; numeric ids are kept as they are.
    Table(ClassTable),
    /// Labels must already be numeric, either as a JSON number or a numeric string.
    Passthrough,
}

impl ClassEncoding {
    pub fn binary() -> Self {
        ClassEncoding::Table(ClassTable::binary())
    }

    pub fn encode(&self, label: &ClassLabel) -> Result<ClassCode, CodecError> {
        match (self, label) {
            (_, ClassLabel::Id(id)) => Ok(*id),
            (ClassEncoding::Table(table), ClassLabel::Name(name)) => Ok(table.code_for(name)),
            (ClassEncoding::Passthrough, ClassLabel::Name(name)) => name
                .trim()
                .parse::<ClassCode>()
                .map_err(|_| CodecError::UnmappedClass(name.clone())),
        }
    }
}

impl Default for ClassEncoding {
    fn default() -> Self {
        Self::binary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ClassLabel {
        ClassLabel::Name(s.to_string())
    }

    #[test]
    fn test_binary_table() {
        let encoding = ClassEncoding::binary();
        assert_eq!(encoding.encode(&name("good")).unwrap(), 0);
        assert_eq!(encoding.encode(&name("bad")).unwrap(), 1);
        assert_eq!(encoding.encode(&name("")).unwrap(), 1);
        assert_eq!(encoding.encode(&ClassLabel::Id(4)).unwrap(), 4);
    }

    #[test]
    fn test_passthrough() {
        let encoding = ClassEncoding::Passthrough;
        assert_eq!(encoding.encode(&ClassLabel::Id(2)).unwrap(), 2);
        assert_eq!(encoding.encode(&name("7")).unwrap(), 7);
        assert!(matches!(
            encoding.encode(&name("good")),
            Err(CodecError::UnmappedClass(ref n)) if n == "good"
        ));
    }

    #[test]
    fn test_class_table_from_json() {
        let table: ClassTable =
            serde_json::from_str(r#"{"names": {"car": 0, "truck": 2}, "default": 5}"#).unwrap();
        assert_eq!(table.code_for("truck"), 2);
        assert_eq!(table.code_for("bus"), 5);
    }
}
