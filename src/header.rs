use std::io::BufRead;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DecodeError, RowsError, RowsResult};
use crate::registry::{ColumnType, TypeRegistry};
use crate::tokenizer::{read_line, tokenize};
use crate::value::{ScanType, Value};

/// One result column as declared by the header.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    name: String,
    type_tag: String,
    column_type: ColumnType,
}

/// Serializable metadata view of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo<'a> {
    pub name: &'a str,
    pub type_tag: &'a str,
    pub scan_type: ScanType,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            column_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn scan_type(&self) -> ScanType {
        self.column_type.scan_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.column_type.is_nullable()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn info(&self) -> ColumnInfo<'_> {
        ColumnInfo {
            name: &self.name,
            type_tag: &self.type_tag,
            scan_type: self.scan_type(),
            nullable: self.is_nullable(),
        }
    }

    /// Decode a raw token of this column, attaching column context to faults.
    pub fn decode(&self, index: usize, raw: &[u8]) -> RowsResult<Value> {
        self.column_type.decode(raw).map_err(|source| match source {
            DecodeError::Unsupported => RowsError::UnsupportedType {
                index,
                column: self.name.clone(),
                type_tag: self.type_tag.clone(),
            },
            source => RowsError::ValueParse {
                index,
                column: self.name.clone(),
                type_tag: self.type_tag.clone(),
                source,
            },
        })
    }
}

/// Consume the names line and the types line and resolve every column.
///
/// Reads exactly two lines. Unsupported tags are kept; only decoding of
/// those columns will fail later.
pub fn parse_header<R: BufRead>(
    reader: &mut R,
    registry: &TypeRegistry,
    max_line_bytes: Option<usize>,
) -> RowsResult<Vec<ColumnDescriptor>> {
    let mut names_line = Vec::new();
    if !read_line(reader, &mut names_line, max_line_bytes)? {
        return Err(RowsError::Format("missing column names line".to_string()));
    }
    let mut types_line = Vec::new();
    if !read_line(reader, &mut types_line, max_line_bytes)? {
        return Err(RowsError::Format("missing column types line".to_string()));
    }
    if names_line.is_empty() {
        return Err(RowsError::Format("empty column names line".to_string()));
    }
    if types_line.is_empty() {
        return Err(RowsError::Format("empty column types line".to_string()));
    }

    let names = tokenize(&names_line).map_err(|e| header_fault("names", e))?;
    let tags = tokenize(&types_line).map_err(|e| header_fault("types", e))?;
    if names.len() != tags.len() {
        return Err(RowsError::Format(format!(
            "header has {} column names but {} type tags",
            names.len(),
            tags.len()
        )));
    }

    let columns = names
        .into_iter()
        .zip(tags)
        .enumerate()
        .map(|(index, (name, tag))| {
            let name = header_text(name, "column name", index)?;
            let tag = header_text(tag, "type tag", index)?;
            let column_type = registry.resolve(&tag);
            if !column_type.is_supported() {
                warn!(
                    "Column {} ('{}') has unsupported type '{}'; it cannot be decoded",
                    index, name, tag
                );
            }
            Ok(ColumnDescriptor::new(name, tag, column_type))
        })
        .collect::<RowsResult<Vec<_>>>()?;

    debug!(
        "Parsed result header: {} columns [{}]",
        columns.len(),
        columns
            .iter()
            .map(ColumnDescriptor::type_tag)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(columns)
}

fn header_fault(line: &str, err: RowsError) -> RowsError {
    match err {
        RowsError::RowShape(msg) => RowsError::Format(format!("{} line: {}", line, msg)),
        other => other,
    }
}

fn header_text(raw: &[u8], what: &str, index: usize) -> RowsResult<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|_| RowsError::Format(format!("{} {} is not valid UTF-8", what, index)))
}
