//! Type-tag registry.
//!
//! Maps the tags found on the header's second line to a scan type and a
//! decode function. The built-in mapping is created once per process; callers
//! that need more tags clone it and [`TypeRegistry::register`] their own.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::error::DecodeError;
use crate::value::{ScanType, Value};

/// Decodes one raw token into a typed value.
pub type DecodeFn = fn(&[u8]) -> Result<Value, DecodeError>;

/// Raw token that stands for NULL in a `Nullable(T)` column.
pub const NULL_MARKER: &[u8] = b"\\N";

static BUILTIN: Lazy<TypeRegistry> = Lazy::new(|| {
    let mut registry = TypeRegistry::new();
    registry.register("Int8", ScanType::Int8, decode_int8);
    registry.register("Int16", ScanType::Int16, decode_int16);
    registry.register("Int32", ScanType::Int32, decode_int32);
    registry.register("Int64", ScanType::Int64, decode_int64);
    registry.register("UInt8", ScanType::UInt8, decode_uint8);
    registry.register("UInt16", ScanType::UInt16, decode_uint16);
    registry.register("UInt32", ScanType::UInt32, decode_uint32);
    registry.register("UInt64", ScanType::UInt64, decode_uint64);
    registry.register("Float32", ScanType::Float32, decode_float32);
    registry.register("Float64", ScanType::Float64, decode_float64);
    registry.register("String", ScanType::String, decode_string);
    trace!("Built-in type registry initialised with {} tags", registry.len());
    registry
});

#[derive(Debug, Clone, Copy)]
struct Entry {
    scan_type: ScanType,
    decode: DecodeFn,
}

/// Resolved type of a column: what it scans into and how to decode it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnType {
    scan_type: ScanType,
    nullable: bool,
    decode: Option<DecodeFn>,
}

impl ColumnType {
    pub fn unsupported() -> Self {
        Self {
            scan_type: ScanType::Unsupported,
            nullable: false,
            decode: None,
        }
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_supported(&self) -> bool {
        self.decode.is_some()
    }

    pub fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        let decode = self.decode.ok_or(DecodeError::Unsupported)?;
        if self.nullable && raw == NULL_MARKER {
            return Ok(Value::Null);
        }
        decode(raw)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, Entry>,
}

impl TypeRegistry {
    /// An empty registry. Every tag resolves to unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide built-in mapping.
    pub fn builtin() -> &'static TypeRegistry {
        &BUILTIN
    }

    /// An owned copy of the built-in mapping, ready for extension.
    pub fn with_builtins() -> Self {
        BUILTIN.clone()
    }

    /// Add or replace the entry for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, scan_type: ScanType, decode: DecodeFn) {
        self.entries.insert(tag.into(), Entry { scan_type, decode });
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a raw type tag. Never fails: unknown tags come back unsupported.
    ///
    /// Exact entries win. Otherwise `Nullable(T)`, `LowCardinality(T)` and
    /// `FixedString(N)` are unwrapped and resolved structurally.
    pub fn resolve(&self, tag: &str) -> ColumnType {
        if let Some(entry) = self.entries.get(tag) {
            return ColumnType {
                scan_type: entry.scan_type,
                nullable: false,
                decode: Some(entry.decode),
            };
        }

        if let Some(inner) = unwrap_param(tag, "Nullable") {
            let inner = self.resolve(inner);
            if !inner.is_supported() || inner.nullable {
                return ColumnType::unsupported();
            }
            return ColumnType {
                nullable: true,
                ..inner
            };
        }

        if let Some(inner) = unwrap_param(tag, "LowCardinality") {
            return self.resolve(inner);
        }

        if let Some(width) = unwrap_param(tag, "FixedString") {
            if width.parse::<usize>().is_ok() {
                return self.resolve("String");
            }
        }

        ColumnType::unsupported()
    }
}

/// `Wrapper(inner)` -> `inner`
fn unwrap_param<'a>(tag: &'a str, wrapper: &str) -> Option<&'a str> {
    tag.strip_prefix(wrapper)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

/// Remove exactly one outer pair of double quotes, if the token has one.
pub fn dequote(raw: &[u8]) -> &[u8] {
    match raw {
        [b'"', inner @ .., b'"'] => inner,
        _ => raw,
    }
}

fn parse_signed(raw: &[u8], type_name: &'static str) -> Result<i64, DecodeError> {
    let (negative, digits, offset) = match raw.first() {
        Some(b'-') => (true, &raw[1..], 1),
        Some(b'+') => (false, &raw[1..], 1),
        _ => (false, raw, 0),
    };
    if digits.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut acc: i64 = 0;
    for (i, &byte) in digits.iter().enumerate() {
        if !byte.is_ascii_digit() {
            return Err(DecodeError::InvalidByte {
                byte,
                offset: offset + i,
            });
        }
        let digit = i64::from(byte - b'0');
        // accumulate toward the sign so i64::MIN stays representable
        acc = acc
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or(DecodeError::Overflow(type_name))?;
    }
    Ok(acc)
}

fn parse_unsigned(raw: &[u8], type_name: &'static str) -> Result<u64, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut acc: u64 = 0;
    for (offset, &byte) in raw.iter().enumerate() {
        if !byte.is_ascii_digit() {
            return Err(DecodeError::InvalidByte { byte, offset });
        }
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or(DecodeError::Overflow(type_name))?;
    }
    Ok(acc)
}

macro_rules! signed_decoder {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(raw: &[u8]) -> Result<Value, DecodeError> {
            let wide = parse_signed(raw, stringify!($ty))?;
            <$ty>::try_from(wide)
                .map(Value::$variant)
                .map_err(|_| DecodeError::Overflow(stringify!($ty)))
        }
    };
}

macro_rules! unsigned_decoder {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(raw: &[u8]) -> Result<Value, DecodeError> {
            let wide = parse_unsigned(raw, stringify!($ty))?;
            <$ty>::try_from(wide)
                .map(Value::$variant)
                .map_err(|_| DecodeError::Overflow(stringify!($ty)))
        }
    };
}

signed_decoder!(decode_int8, i8, Int8);
signed_decoder!(decode_int16, i16, Int16);
signed_decoder!(decode_int32, i32, Int32);
signed_decoder!(decode_int64, i64, Int64);
unsigned_decoder!(decode_uint8, u8, UInt8);
unsigned_decoder!(decode_uint16, u16, UInt16);
unsigned_decoder!(decode_uint32, u32, UInt32);
unsigned_decoder!(decode_uint64, u64, UInt64);

fn float_literal(raw: &[u8]) -> Result<&str, DecodeError> {
    if raw.is_empty() {
        return Err(DecodeError::Empty);
    }
    std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)
}

fn decode_float32(raw: &[u8]) -> Result<Value, DecodeError> {
    let literal = float_literal(raw)?;
    literal
        .parse::<f32>()
        .map(Value::Float32)
        .map_err(|_| DecodeError::InvalidFloat(literal.to_string()))
}

fn decode_float64(raw: &[u8]) -> Result<Value, DecodeError> {
    let literal = float_literal(raw)?;
    literal
        .parse::<f64>()
        .map(Value::Float64)
        .map_err(|_| DecodeError::InvalidFloat(literal.to_string()))
}

fn decode_string(raw: &[u8]) -> Result<Value, DecodeError> {
    std::str::from_utf8(dequote(raw))
        .map(|s| Value::String(s.to_string()))
        .map_err(|_| DecodeError::InvalidUtf8)
}
