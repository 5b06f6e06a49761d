//! Row iterator over a tab-separated, type-annotated result stream.
//!
//! The header is parsed eagerly when the iterator is built. Rows are then
//! pulled one line at a time with [`TextRows::next`], which writes the decoded
//! cells into a caller-owned slot slice. End of data is `Ok(false)`, never an
//! error.
//!
//! ```rust
//! use textrows::{TextRows, Value};
//!
//! let input: &[u8] = b"Number\tText\nInt32\tString\n1\thello\n2\tworld\n";
//! let mut rows = TextRows::new(input)?;
//! let mut dest = vec![Value::Null; rows.column_count()];
//!
//! while rows.next(&mut dest)? {
//!     println!("{:?}", dest);
//! }
//! rows.close()?;
//! # Ok::<(), textrows::RowsError>(())
//! ```

mod builder;

use std::io::BufRead;

use tracing::{debug, trace, warn};

use crate::error::{RowsError, RowsResult};
use crate::header::{parse_header, ColumnDescriptor};
use crate::registry::TypeRegistry;
use crate::tokenizer::{read_line, tokenize_row};
use crate::value::{ScanType, Value};

pub use builder::TextRowsBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    HeaderParsed,
    Iterating,
    Exhausted,
    Failed,
    Closed,
}

/// Decodes rows from an owned result stream.
///
/// Not restartable. The stream is dropped by [`TextRows::close`] or, failing
/// that, when the iterator itself is dropped.
#[derive(Debug)]
pub struct TextRows<R> {
    columns: Vec<ColumnDescriptor>,
    stream: Option<R>,
    phase: Phase,
    failure: Option<RowsError>,
    line: Vec<u8>,
    max_line_bytes: Option<usize>,
    rows_read: u64,
}

impl<R: BufRead> TextRows<R> {
    /// Parse the header of `reader` using the built-in type registry.
    pub fn new(reader: R) -> RowsResult<Self> {
        TextRowsBuilder::new().build(reader)
    }

    pub(crate) fn open(
        mut reader: R,
        registry: &TypeRegistry,
        max_line_bytes: Option<usize>,
    ) -> RowsResult<Self> {
        let columns = parse_header(&mut reader, registry, max_line_bytes)?;

        Ok(Self {
            columns,
            stream: Some(reader),
            phase: Phase::HeaderParsed,
            failure: None,
            line: Vec::new(),
            max_line_bytes,
            rows_read: 0,
        })
    }

    /// Decode the next row into `dest`.
    ///
    /// Returns `Ok(true)` for a decoded row and `Ok(false)` once the stream
    /// is exhausted, repeatedly. After a fault the same fault is returned on
    /// every later call. On a fault, `dest` may hold a partially written row.
    pub fn next(&mut self, dest: &mut [Value]) -> RowsResult<bool> {
        match self.phase {
            Phase::Closed => return Err(RowsError::Closed),
            Phase::Exhausted => return Ok(false),
            _ => {}
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        if dest.len() != self.columns.len() {
            return Err(RowsError::RowShape(format!(
                "destination has {} slots but the result has {} columns",
                dest.len(),
                self.columns.len()
            )));
        }

        match self.advance(dest) {
            Ok(true) => {
                self.phase = Phase::Iterating;
                self.rows_read += 1;
                trace!("Decoded row {}", self.rows_read);
                Ok(true)
            }
            Ok(false) => {
                self.phase = Phase::Exhausted;
                debug!("Result stream exhausted after {} rows", self.rows_read);
                Ok(false)
            }
            Err(err) => {
                warn!("Failed to decode row {}: {}", self.rows_read + 1, err);
                self.phase = Phase::Failed;
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Decode the next row into a freshly allocated vector.
    pub fn next_row(&mut self) -> RowsResult<Option<Vec<Value>>> {
        let mut dest = vec![Value::Null; self.columns.len()];
        Ok(self.next(&mut dest)?.then_some(dest))
    }

    /// Iterate remaining rows as owned vectors. Stops after the first fault.
    pub fn iter(&mut self) -> RowIter<'_, R> {
        RowIter { rows: self }
    }

    fn advance(&mut self, dest: &mut [Value]) -> RowsResult<bool> {
        let stream = self.stream.as_mut().ok_or(RowsError::Closed)?;
        if !read_line(stream, &mut self.line, self.max_line_bytes)? {
            return Ok(false);
        }

        let tokens = tokenize_row(&self.line, self.columns.len())?;
        for (index, ((column, raw), slot)) in self
            .columns
            .iter()
            .zip(tokens)
            .zip(dest.iter_mut())
            .enumerate()
        {
            *slot = column.decode(index, raw)?;
        }
        Ok(true)
    }
}

impl<R> TextRows<R> {
    /// Release the underlying stream. Safe to call any number of times.
    pub fn close(&mut self) -> RowsResult<()> {
        if self.stream.take().is_some() {
            debug!("Closed result stream after {} rows", self.rows_read);
        }
        self.phase = Phase::Closed;
        Ok(())
    }

    /// Column names in result order.
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDescriptor::name).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column_type_scan_type(&self, index: usize) -> Option<ScanType> {
        self.columns.get(index).map(ColumnDescriptor::scan_type)
    }

    /// The raw type tag from the header, e.g. `Int32` or `Nullable(String)`.
    pub fn column_type_database_type_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(ColumnDescriptor::type_tag)
    }

    pub fn column_type_nullable(&self, index: usize) -> Option<bool> {
        self.columns.get(index).map(ColumnDescriptor::is_nullable)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// The owned stream, while it has not been closed.
    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.stream.as_mut()
    }
}

/// Borrowing iterator returned by [`TextRows::iter`].
pub struct RowIter<'a, R> {
    rows: &'a mut TextRows<R>,
}

impl<R: BufRead> Iterator for RowIter<'_, R> {
    type Item = RowsResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.rows.phase, Phase::Failed | Phase::Closed) {
            return None;
        }
        self.rows.next_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"Number\tText\nInt32\tString\n1\thello\n2\tworld\n";

    #[test]
    fn test_phases() {
        let mut rows = TextRows::new(SAMPLE).unwrap();
        assert_eq!(rows.phase(), Phase::HeaderParsed);

        let mut dest = vec![Value::Null; 2];
        assert!(rows.next(&mut dest).unwrap());
        assert_eq!(rows.phase(), Phase::Iterating);
        assert!(rows.next(&mut dest).unwrap());
        assert!(!rows.next(&mut dest).unwrap());
        assert_eq!(rows.phase(), Phase::Exhausted);
        assert_eq!(rows.rows_read(), 2);

        rows.close().unwrap();
        assert_eq!(rows.phase(), Phase::Closed);
        assert!(rows.get_mut().is_none());
    }

    #[test]
    fn test_builder_configures_rows() {
        let input: &[u8] = b"n\nInt32\n1\n";
        let mut rows = TextRowsBuilder::new()
            .registry(std::sync::Arc::new(TypeRegistry::with_builtins()))
            .max_line_bytes(usize::MAX)
            .build(input)
            .unwrap();

        assert_eq!(rows.next_row().unwrap(), Some(vec![Value::Int32(1)]));
        assert_eq!(rows.next_row().unwrap(), None);
    }

    #[test]
    fn test_wrong_destination_length_does_not_consume() {
        let mut rows = TextRows::new(SAMPLE).unwrap();
        let mut short = vec![Value::Null; 1];
        assert!(matches!(
            rows.next(&mut short).unwrap_err(),
            RowsError::RowShape(_)
        ));
        assert_eq!(rows.phase(), Phase::HeaderParsed);

        let mut dest = vec![Value::Null; 2];
        assert!(rows.next(&mut dest).unwrap());
        assert_eq!(dest, vec![Value::Int32(1), Value::from("hello")]);
    }

    #[test]
    fn test_failed_phase_repeats_fault() {
        let input: &[u8] = b"n\tt\nInt32\tString\nx\ta\n2\tb\n";
        let mut rows = TextRows::new(input).unwrap();
        let mut dest = vec![Value::Null; 2];

        let first = rows.next(&mut dest).unwrap_err();
        assert_eq!(rows.phase(), Phase::Failed);
        let second = rows.next(&mut dest).unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(rows.rows_read(), 0);
    }

    #[test]
    fn test_partial_row_left_in_destination() {
        let input: &[u8] = b"a\tb\nInt32\tInt32\n7\toops\n";
        let mut rows = TextRows::new(input).unwrap();
        let mut dest = vec![Value::Null; 2];

        assert!(rows.next(&mut dest).is_err());
        assert_eq!(dest[0], Value::Int32(7));
        assert_eq!(dest[1], Value::Null);
    }

    #[test]
    fn test_next_after_close() {
        let mut rows = TextRows::new(SAMPLE).unwrap();
        rows.close().unwrap();
        let mut dest = vec![Value::Null; 2];
        assert!(matches!(
            rows.next(&mut dest).unwrap_err(),
            RowsError::Closed
        ));
    }

    #[test]
    fn test_iter_collects_rows() {
        let mut rows = TextRows::new(SAMPLE).unwrap();
        let collected: Vec<Vec<Value>> = rows.iter().collect::<RowsResult<_>>().unwrap();
        assert_eq!(
            collected,
            vec![
                vec![Value::Int32(1), Value::from("hello")],
                vec![Value::Int32(2), Value::from("world")],
            ]
        );
        assert_eq!(rows.phase(), Phase::Exhausted);
    }

    #[test]
    fn test_iter_stops_after_fault() {
        let input: &[u8] = b"n\nInt8\n1\n300\n2\n";
        let mut rows = TextRows::new(input).unwrap();
        let items: Vec<_> = rows.iter().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
