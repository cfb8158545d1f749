//! One adapter per embedded language.
//!
//! Adapters are stateless. Each one knows how to recognise its host pattern,
//! how to enter its editing surface from host text (`transform_in`) and how
//! to leave it again (`transform_out`). Dispatch is a single match over the
//! closed [`LanguageAdapter`] enum; a new language is one more variant.

mod layout;
pub mod markdown;
pub mod python;
pub mod sql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use markdown::MarkdownAdapter;
pub use python::PythonAdapter;
pub use sql::SqlAdapter;

use crate::language::context::TransformContext;
use crate::language::metadata::LanguageMetadata;
use crate::language::surface::EditingSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageKind {
    Python,
    Markdown,
    Sql,
}

impl LanguageKind {
    /// Detection priority; Python last as the fallback
    pub const DETECTION_ORDER: [LanguageKind; 2] = [LanguageKind::Markdown, LanguageKind::Sql];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageKind::Python => "python",
            LanguageKind::Markdown => "markdown",
            LanguageKind::Sql => "sql",
        }
    }

    pub fn adapter(self) -> LanguageAdapter {
        match self {
            LanguageKind::Python => LanguageAdapter::Python(PythonAdapter),
            LanguageKind::Markdown => LanguageAdapter::Markdown(MarkdownAdapter),
            LanguageKind::Sql => LanguageAdapter::Sql(SqlAdapter),
        }
    }

    /// Next language in the toggle cycle
    pub fn next(self) -> LanguageKind {
        match self {
            LanguageKind::Python => LanguageKind::Markdown,
            LanguageKind::Markdown => LanguageKind::Sql,
            LanguageKind::Sql => LanguageKind::Python,
        }
    }
}

impl fmt::Display for LanguageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct ParseLanguageError(pub String);

impl FromStr for LanguageKind {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(LanguageKind::Python),
            "markdown" => Ok(LanguageKind::Markdown),
            "sql" => Ok(LanguageKind::Sql),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

/// Result of entering an editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Text for the editing surface
    pub code: String,
    /// Byte offset of the first native byte within the host text
    pub offset: usize,
    pub metadata: LanguageMetadata,
}

impl Transformed {
    pub(crate) fn new(code: String, offset: usize, metadata: LanguageMetadata) -> Self {
        Self {
            code,
            offset,
            metadata,
        }
    }
}

/// Result of leaving an editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    /// Host text
    pub code: String,
    /// Byte offset of the first native byte within `code`
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageAdapter {
    Python(PythonAdapter),
    Markdown(MarkdownAdapter),
    Sql(SqlAdapter),
}

impl Default for LanguageAdapter {
    fn default() -> Self {
        LanguageAdapter::Python(PythonAdapter)
    }
}

impl LanguageAdapter {
    pub fn kind(&self) -> LanguageKind {
        match self {
            LanguageAdapter::Python(_) => LanguageKind::Python,
            LanguageAdapter::Markdown(_) => LanguageKind::Markdown,
            LanguageAdapter::Sql(_) => LanguageKind::Sql,
        }
    }

    /// Whether `host` is this language's embedding pattern.
    ///
    /// Syntactic and best effort; ambiguous text is rejected.
    pub fn is_supported(&self, host: &str) -> bool {
        match self {
            LanguageAdapter::Python(a) => a.is_supported(host),
            LanguageAdapter::Markdown(a) => a.is_supported(host),
            LanguageAdapter::Sql(a) => a.is_supported(host),
        }
    }

    /// Host text to editing-surface text, plus the metadata it implies.
    ///
    /// Total: text this adapter does not own comes back trimmed with the
    /// adapter's default metadata.
    pub fn transform_in(&self, host: &str, ctx: &TransformContext<'_>) -> Transformed {
        match self {
            LanguageAdapter::Python(a) => a.transform_in(host),
            LanguageAdapter::Markdown(a) => a.transform_in(host),
            LanguageAdapter::Sql(a) => a.transform_in(host, ctx),
        }
    }

    /// Editing-surface text back to host text.
    pub fn transform_out(&self, native: &str, metadata: &LanguageMetadata) -> Exported {
        match self {
            LanguageAdapter::Python(a) => a.transform_out(native, metadata),
            LanguageAdapter::Markdown(a) => a.transform_out(native, metadata),
            LanguageAdapter::Sql(a) => a.transform_out(native, metadata),
        }
    }

    pub fn default_metadata(&self, ctx: &TransformContext<'_>) -> LanguageMetadata {
        self.transform_in("", ctx).metadata
    }

    pub fn default_code(&self) -> &'static str {
        match self {
            LanguageAdapter::Python(a) => a.default_code(),
            LanguageAdapter::Markdown(a) => a.default_code(),
            LanguageAdapter::Sql(a) => a.default_code(),
        }
    }

    /// Whether `transform_out` can write `metadata` back as valid host text.
    pub fn accepts(&self, metadata: &LanguageMetadata) -> bool {
        self.invalid_setting(metadata).is_none()
    }

    pub fn invalid_setting(&self, metadata: &LanguageMetadata) -> Option<(&'static str, String)> {
        match self {
            LanguageAdapter::Python(_) | LanguageAdapter::Markdown(_) => None,
            LanguageAdapter::Sql(a) => a.invalid_setting(metadata),
        }
    }

    pub fn editing_surface(&self) -> EditingSurface {
        match self {
            LanguageAdapter::Python(a) => a.editing_surface(),
            LanguageAdapter::Markdown(a) => a.editing_surface(),
            LanguageAdapter::Sql(a) => a.editing_surface(),
        }
    }
}

impl From<LanguageKind> for LanguageAdapter {
    fn from(kind: LanguageKind) -> Self {
        kind.adapter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::surface::CompletionSource;
    use rstest::rstest;

    #[rstest]
    #[case(LanguageKind::Python)]
    #[case(LanguageKind::Markdown)]
    #[case(LanguageKind::Sql)]
    fn test_kind_round_trips(#[case] kind: LanguageKind) {
        assert_eq!(kind.adapter().kind(), kind);
        assert_eq!(kind.as_str().parse::<LanguageKind>(), Ok(kind));
        assert_eq!(kind.next().next().next(), kind);
    }

    #[test]
    fn test_parse_language_is_case_insensitive() {
        assert_eq!("SQL".parse::<LanguageKind>(), Ok(LanguageKind::Sql));
        assert!("rust".parse::<LanguageKind>().is_err());
    }

    #[rstest]
    #[case(LanguageKind::Python)]
    #[case(LanguageKind::Markdown)]
    #[case(LanguageKind::Sql)]
    fn test_default_code_is_recognised(#[case] kind: LanguageKind) {
        let adapter = kind.adapter();

        assert!(adapter.is_supported(adapter.default_code()));
    }

    #[test]
    fn test_only_sql_completes_table_schema() {
        let with_schema: Vec<LanguageKind> = [
            LanguageKind::Python,
            LanguageKind::Markdown,
            LanguageKind::Sql,
        ]
        .into_iter()
        .filter(|kind| {
            kind.adapter()
                .editing_surface()
                .has_completion(CompletionSource::TableSchema)
        })
        .collect();

        assert_eq!(with_schema, vec![LanguageKind::Sql]);
    }
}
