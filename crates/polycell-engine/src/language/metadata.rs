//! Per-editor language metadata.
//!
//! The store itself is an open string-keyed map so that any adapter can keep
//! its own settings in it. Adapters never read the map directly; they go
//! through a typed view ([`MarkdownMetadata`], [`SqlMetadata`]) that ignores
//! keys it does not know and fills in defaults for missing ones.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::quotes::QuotePrefixKind;

pub const QUOTE_PREFIX: &str = "quotePrefix";
pub const DATAFRAME_NAME: &str = "dataframeName";
pub const ENGINE: &str = "engine";
pub const SHOW_OUTPUT: &str = "showOutput";
pub const COMMENT_LINES: &str = "commentLines";

/// Identifier of the SQL engine embedded in the notebook runtime
pub const DEFAULT_ENGINE: &str = "__marimo_duckdb";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Written the way Python would spell the value
impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(true) => f.write_str("True"),
            MetadataValue::Bool(false) => f.write_str("False"),
            MetadataValue::Int(n) => write!(f, "{n}"),
            MetadataValue::Str(s) => write!(f, "{s:?}"),
            MetadataValue::List(items) => write!(f, "{items:?}"),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        MetadataValue::List(value)
    }
}

impl From<QuotePrefixKind> for MetadataValue {
    fn from(value: QuotePrefixKind) -> Self {
        MetadataValue::Str(value.as_str().to_string())
    }
}

/// Open key-value record scoped to one editor instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMetadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl LanguageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge: keys in `patch` overwrite, all other keys stay.
    pub fn merge(&mut self, patch: LanguageMetadata) {
        self.entries.extend(patch.entries);
    }

    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(MetadataValue::as_str).unwrap_or(default)
    }

    fn quote_prefix_or(&self, default: QuotePrefixKind) -> QuotePrefixKind {
        self.get(QUOTE_PREFIX)
            .and_then(MetadataValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }
}

impl<K: Into<String>, V: Into<MetadataValue>, const N: usize> From<[(K, V); N]>
    for LanguageMetadata
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for LanguageMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Settings the Markdown adapter keeps between edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownMetadata {
    pub quote_prefix: QuotePrefixKind,
}

impl Default for MarkdownMetadata {
    fn default() -> Self {
        Self {
            quote_prefix: QuotePrefixKind::R,
        }
    }
}

impl From<&LanguageMetadata> for MarkdownMetadata {
    fn from(metadata: &LanguageMetadata) -> Self {
        Self {
            quote_prefix: metadata.quote_prefix_or(QuotePrefixKind::R),
        }
    }
}

impl From<MarkdownMetadata> for LanguageMetadata {
    fn from(metadata: MarkdownMetadata) -> Self {
        LanguageMetadata::from([(QUOTE_PREFIX, metadata.quote_prefix)])
    }
}

/// Settings the SQL adapter keeps between edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMetadata {
    /// Variable the query result is assigned to
    pub dataframe_name: String,
    pub quote_prefix: QuotePrefixKind,
    /// Connection the query runs against
    pub engine: String,
    pub show_output: bool,
    /// Comment lines written above the `mo.sql` call
    pub comment_lines: Vec<String>,
}

impl Default for SqlMetadata {
    fn default() -> Self {
        Self {
            dataframe_name: "_df".to_string(),
            quote_prefix: QuotePrefixKind::F,
            engine: DEFAULT_ENGINE.to_string(),
            show_output: true,
            comment_lines: Vec::new(),
        }
    }
}

impl SqlMetadata {
    pub fn uses_default_engine(&self) -> bool {
        self.engine == DEFAULT_ENGINE
    }
}

impl From<&LanguageMetadata> for SqlMetadata {
    fn from(metadata: &LanguageMetadata) -> Self {
        let defaults = SqlMetadata::default();
        Self {
            dataframe_name: metadata
                .str_or(DATAFRAME_NAME, &defaults.dataframe_name)
                .to_string(),
            quote_prefix: metadata.quote_prefix_or(defaults.quote_prefix),
            engine: metadata.str_or(ENGINE, &defaults.engine).to_string(),
            show_output: metadata
                .get(SHOW_OUTPUT)
                .and_then(MetadataValue::as_bool)
                .unwrap_or(defaults.show_output),
            comment_lines: metadata
                .get(COMMENT_LINES)
                .and_then(MetadataValue::as_list)
                .map(<[String]>::to_vec)
                .unwrap_or(defaults.comment_lines),
        }
    }
}

impl From<SqlMetadata> for LanguageMetadata {
    fn from(metadata: SqlMetadata) -> Self {
        let mut map = LanguageMetadata::new();
        map.insert(DATAFRAME_NAME, metadata.dataframe_name);
        map.insert(QUOTE_PREFIX, metadata.quote_prefix);
        map.insert(ENGINE, metadata.engine);
        map.insert(SHOW_OUTPUT, metadata.show_output);
        map.insert(COMMENT_LINES, metadata.comment_lines);
        map
    }
}
