use std::sync::Arc;

use thiserror::Error;

/// Per-token decode failure produced by a registry decode function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid byte 0x{byte:02x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },

    #[error("empty value")]
    Empty,

    #[error("value out of range for {0}")]
    Overflow(&'static str),

    #[error("invalid float literal '{0}'")]
    InvalidFloat(String),

    #[error("invalid UTF-8 in text value")]
    InvalidUtf8,

    #[error("type has no decoder")]
    Unsupported,
}

#[derive(Error, Debug, Clone)]
pub enum RowsError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Row shape error: {0}")]
    RowShape(String),

    #[error("Cannot decode column {index} ('{column}') as {type_tag}: {source}")]
    ValueParse {
        index: usize,
        column: String,
        type_tag: String,
        #[source]
        source: DecodeError,
    },

    #[error("Unsupported type '{type_tag}' for column {index} ('{column}')")]
    UnsupportedType {
        index: usize,
        column: String,
        type_tag: String,
    },

    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("Rows are closed")]
    Closed,
}

pub type RowsResult<T> = Result<T, RowsError>;

impl From<std::io::Error> for RowsError {
    fn from(err: std::io::Error) -> Self {
        RowsError::Io(Arc::new(err))
    }
}

impl serde::Serialize for RowsError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RowsError::Format("missing types line".to_string());
        assert_eq!(err.to_string(), "Format error: missing types line");

        let err = RowsError::RowShape("expected 2 fields, got 3".to_string());
        assert_eq!(err.to_string(), "Row shape error: expected 2 fields, got 3");

        let err = RowsError::ValueParse {
            index: 0,
            column: "Number".to_string(),
            type_tag: "Int32".to_string(),
            source: DecodeError::InvalidByte {
                byte: b'x',
                offset: 1,
            },
        };
        assert_eq!(
            err.to_string(),
            "Cannot decode column 0 ('Number') as Int32: invalid byte 0x78 at offset 1"
        );

        let err = RowsError::UnsupportedType {
            index: 2,
            column: "When".to_string(),
            type_tag: "DateTime".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported type 'DateTime' for column 2 ('When')"
        );

        let err = RowsError::LineTooLong { limit: 16 };
        assert_eq!(err.to_string(), "Line exceeds 16 bytes");

        assert_eq!(RowsError::Closed.to_string(), "Rows are closed");
    }

    #[test]
    fn test_decode_error_messages() {
        assert_eq!(DecodeError::Empty.to_string(), "empty value");
        assert_eq!(
            DecodeError::Overflow("i8").to_string(),
            "value out of range for i8"
        );
        assert_eq!(
            DecodeError::InvalidFloat("1.2.3".to_string()).to_string(),
            "invalid float literal '1.2.3'"
        );
    }

    #[test]
    fn test_io_error_is_clonable() {
        let err: RowsError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "body cut").into();
        let copy = err.clone();
        assert!(matches!(copy, RowsError::Io(_)));
        assert_eq!(copy.to_string(), "IO error: body cut");
    }

    #[test]
    fn test_error_serializes_as_message() {
        let err = RowsError::Format("empty stream".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Format error: empty stream\"");
    }

    #[test]
    fn test_rows_result_type() {
        let ok_result: RowsResult<i32> = Ok(42);
        assert_eq!(ok_result.unwrap(), 42);

        let err_result: RowsResult<i32> = Err(RowsError::Closed);
        assert!(err_result.is_err());
    }
}
