//! Lookups for SQL completion.
//!
//! The schema itself lives with the completion collaborator. Here is only
//! the synchronous read of an already populated cache, keyed by the engine
//! the cell's metadata names.

use serde::{Deserialize, Serialize};

use crate::language::metadata::{DEFAULT_ENGINE, ENGINE, LanguageMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Tables known per engine
pub trait SchemaCache {
    fn tables(&self, engine: &str) -> Option<&[TableSchema]>;
}

impl SchemaCache for std::collections::HashMap<String, Vec<TableSchema>> {
    fn tables(&self, engine: &str) -> Option<&[TableSchema]> {
        self.get(engine).map(Vec::as_slice)
    }
}

/// Engine to complete against: the cell's `engine` setting, else the built-in one
pub fn completion_engine(metadata: &LanguageMetadata) -> &str {
    metadata
        .get(ENGINE)
        .and_then(|value| value.as_str())
        .unwrap_or(DEFAULT_ENGINE)
}

pub fn tables_for<'c>(metadata: &LanguageMetadata, cache: &'c dyn SchemaCache) -> &'c [TableSchema] {
    cache.tables(completion_engine(metadata)).unwrap_or_default()
}
