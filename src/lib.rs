//! textrows - streaming decoder for tab-separated, type-annotated query results.
//!
//! A result in this format starts with two header lines, column names and
//! then type tags, followed by one tab-separated line per row:
//!
//! ```text
//! Number<TAB>Text
//! Int32<TAB>String
//! 1<TAB>hello
//! 2<TAB>world
//! ```
//!
//! # Main Components
//!
//! - **Tokenizer**: splits a line into raw fields, honouring quoted fields
//! - **Registry**: maps type tags to scan types and decode functions
//! - **Header**: parses the two header lines into column descriptors
//! - **Rows**: owns the stream and decodes rows on demand

pub mod error;
pub mod header;
pub mod registry;
pub mod rows;
pub mod tokenizer;
pub mod value;

pub use error::{DecodeError, RowsError, RowsResult};
pub use header::{parse_header, ColumnDescriptor, ColumnInfo};
pub use registry::{dequote, ColumnType, DecodeFn, TypeRegistry, NULL_MARKER};
pub use rows::{Phase, RowIter, TextRows, TextRowsBuilder};
pub use tokenizer::{tokenize, tokenize_row};
pub use value::{ScanType, Value};
