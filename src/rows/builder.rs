use std::io::BufRead;
use std::sync::Arc;

use crate::error::RowsResult;
use crate::registry::TypeRegistry;

use super::TextRows;

/// Configures how a result stream is decoded.
#[derive(Debug, Clone, Default)]
pub struct TextRowsBuilder {
    registry: Option<Arc<TypeRegistry>>,
    max_line_bytes: Option<usize>,
}

impl TextRowsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve type tags with `registry` instead of the built-in one.
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fail any header or data line longer than `bytes`, terminator excluded.
    pub fn max_line_bytes(mut self, bytes: usize) -> Self {
        self.max_line_bytes = Some(bytes);
        self
    }

    /// Take ownership of `reader` and parse its header.
    pub fn build<R: BufRead>(self, reader: R) -> RowsResult<TextRows<R>> {
        let registry = self
            .registry
            .as_deref()
            .unwrap_or_else(|| TypeRegistry::builtin());
        TextRows::open(reader, registry, self.max_line_bytes)
    }
}
