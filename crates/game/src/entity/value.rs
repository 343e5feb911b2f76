use crate::net::FrameError;
use crate::wire::{ByteReader, ByteWriter};

/// Top-level entity field value. Scalar fields travel as
/// `(name, valueTypeCode, value)` and are the escape hatch for state that
/// does not belong to any extension (e.g. raw player input).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    F64(f64),
    Bool(bool),
    Json(serde_json::Value),
}

impl FieldValue {
    pub const TYPE_STR: u32 = 0;
    pub const TYPE_F64: u32 = 1;
    pub const TYPE_BOOL: u32 = 2;
    pub const TYPE_JSON: u32 = 3;

    pub fn type_code(&self) -> u32 {
        match self {
            FieldValue::Str(_) => Self::TYPE_STR,
            FieldValue::F64(_) => Self::TYPE_F64,
            FieldValue::Bool(_) => Self::TYPE_BOOL,
            FieldValue::Json(_) => Self::TYPE_JSON,
        }
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.type_code());
        match self {
            FieldValue::Str(value) => writer.write_string(value),
            FieldValue::F64(value) => writer.write_f64(*value),
            FieldValue::Bool(value) => writer.write_bool(*value),
            FieldValue::Json(value) => writer.write_string(&value.to_string()),
        }
    }

    pub fn decode(reader: &mut ByteReader) -> Result<Self, FrameError> {
        let type_code = reader.read_u32()?;
        match type_code {
            Self::TYPE_STR => Ok(FieldValue::Str(reader.read_string()?)),
            Self::TYPE_F64 => Ok(FieldValue::F64(reader.read_f64()?)),
            Self::TYPE_BOOL => Ok(FieldValue::Bool(reader.read_bool()?)),
            Self::TYPE_JSON => {
                let raw = reader.read_string()?;
                Ok(FieldValue::Json(serde_json::from_str(&raw)?))
            }
            other => Err(FrameError::UnknownValueType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(value: FieldValue) -> FieldValue {
        let mut writer = ByteWriter::new();
        value.encode(&mut writer);
        let buf = writer.into_vec();
        FieldValue::decode(&mut ByteReader::new(&buf)).unwrap()
    }

    #[test]
    fn all_value_types_roundtrip() {
        assert_eq!(
            roundtrip(FieldValue::Str("sprint".into())),
            FieldValue::Str("sprint".into())
        );
        assert_eq!(roundtrip(FieldValue::F64(13.25)), FieldValue::F64(13.25));
        assert_eq!(roundtrip(FieldValue::Bool(true)), FieldValue::Bool(true));
        assert_eq!(
            roundtrip(FieldValue::Json(json!({"up": true, "angle": 1.5}))),
            FieldValue::Json(json!({"up": true, "angle": 1.5}))
        );
    }

    #[test]
    fn unknown_type_code_is_an_error() {
        let mut writer = ByteWriter::new();
        writer.write_u32(99);
        let buf = writer.into_vec();
        assert!(matches!(
            FieldValue::decode(&mut ByteReader::new(&buf)),
            Err(FrameError::UnknownValueType(99))
        ));
    }
}
