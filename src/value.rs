//! Typed cell values and the scan-type descriptors reported for columns.

use serde::Serialize;

/// A single decoded cell.
///
/// `Null` doubles as the content of a slot that has not been written yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::UInt8(v) => Some(i64::from(*v)),
            Value::UInt16(v) => Some(i64::from(*v)),
            Value::UInt32(v) => Some(i64::from(*v)),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scan type this value belongs to. `Null` has none.
    pub fn scan_type(&self) -> Option<ScanType> {
        let scan_type = match self {
            Value::Null => return None,
            Value::Int8(_) => ScanType::Int8,
            Value::Int16(_) => ScanType::Int16,
            Value::Int32(_) => ScanType::Int32,
            Value::Int64(_) => ScanType::Int64,
            Value::UInt8(_) => ScanType::UInt8,
            Value::UInt16(_) => ScanType::UInt16,
            Value::UInt32(_) => ScanType::UInt32,
            Value::UInt64(_) => ScanType::UInt64,
            Value::Float32(_) => ScanType::Float32,
            Value::Float64(_) => ScanType::Float64,
            Value::String(_) => ScanType::String,
        };
        Some(scan_type)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// The semantic value type a column decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    /// Tag not known to the registry; metadata only.
    Unsupported,
}

impl ScanType {
    /// Rust type name of the decoded value.
    pub fn name(&self) -> &'static str {
        match self {
            ScanType::Int8 => "i8",
            ScanType::Int16 => "i16",
            ScanType::Int32 => "i32",
            ScanType::Int64 => "i64",
            ScanType::UInt8 => "u8",
            ScanType::UInt16 => "u16",
            ScanType::UInt32 => "u32",
            ScanType::UInt64 => "u64",
            ScanType::Float32 => "f32",
            ScanType::Float64 => "f64",
            ScanType::String => "String",
            ScanType::Unsupported => "unsupported",
        }
    }
}

impl Serialize for ScanType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
