//! Line framing and field splitting for the tab-separated result format.
//!
//! A field that opens with `"` is opaque: it runs until a `"` that is
//! directly followed by a tab or by the end of the line. Every other byte in
//! between, including tabs and stray quotes, belongs to the field. Quote
//! characters are kept in the raw token; dequoting is the decoder's job.

use std::io::{BufRead, Read};

use crate::error::{RowsError, RowsResult};

pub const TAB: u8 = b'\t';
pub const QUOTE: u8 = b'"';

/// Strip one trailing `\n` and, if present, the `\r` before it.
pub fn trim_line_terminator(line: &[u8]) -> &[u8] {
    match line {
        [rest @ .., b'\r', b'\n'] => rest,
        [rest @ .., b'\n'] => rest,
        _ => line,
    }
}

/// Read the next line into `buf` without its terminator.
///
/// Returns `Ok(false)` only when the stream has no bytes left. Never reads
/// past the end of the current line.
pub fn read_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_line_bytes: Option<usize>,
) -> RowsResult<bool> {
    buf.clear();

    let read = match max_line_bytes {
        // Room for the content plus a CRLF terminator.
        Some(limit) => reader
            .by_ref()
            .take((limit as u64).saturating_add(2))
            .read_until(b'\n', buf)?,
        None => reader.read_until(b'\n', buf)?,
    };
    if read == 0 {
        return Ok(false);
    }

    let content_len = trim_line_terminator(buf).len();
    if let Some(limit) = max_line_bytes {
        if content_len > limit {
            return Err(RowsError::LineTooLong { limit });
        }
    }
    buf.truncate(content_len);
    Ok(true)
}

/// Split one line (terminator already removed) into raw tokens.
pub fn tokenize(line: &[u8]) -> RowsResult<Vec<&[u8]>> {
    let mut tokens = Vec::new();
    let mut start = 0;

    loop {
        if line.get(start) == Some(&QUOTE) {
            let end = quoted_field_end(line, start)?;
            tokens.push(&line[start..end]);
            if end == line.len() {
                return Ok(tokens);
            }
            // quoted_field_end guarantees a tab here
            start = end + 1;
            continue;
        }

        match line[start..].iter().position(|&b| b == TAB) {
            Some(offset) => {
                tokens.push(&line[start..start + offset]);
                start += offset + 1;
            }
            None => {
                tokens.push(&line[start..]);
                return Ok(tokens);
            }
        }
    }
}

/// Split a data line and enforce the expected row shape.
pub fn tokenize_row(line: &[u8], expected: usize) -> RowsResult<Vec<&[u8]>> {
    let tokens = tokenize(line)?;
    if tokens.len() != expected {
        return Err(RowsError::RowShape(format!(
            "expected {} fields, got {}",
            expected,
            tokens.len()
        )));
    }
    Ok(tokens)
}

/// Index one past the closing quote of the field opening at `start`.
fn quoted_field_end(line: &[u8], start: usize) -> RowsResult<usize> {
    let mut pos = start + 1;
    while pos < line.len() {
        if line[pos] == QUOTE && matches!(line.get(pos + 1), None | Some(&TAB)) {
            return Ok(pos + 1);
        }
        pos += 1;
    }

    Err(RowsError::RowShape(format!(
        "unterminated quoted field at byte {}",
        start
    )))
}
