/*!
 * # Language Adapters
 *
 * A notebook cell is always stored as Python. Some cells are really
 * Markdown or SQL wrapped in a call (`mo.md(...)`, `_df = mo.sql(...)`),
 * and the editor lets the user work on the embedded text directly.
 *
 * ## Pieces
 *
 * - **`quotes`** and **`escape`**: string-literal prefixes and delimiter escaping
 * - **`metadata`**: per-editor settings such as the SQL output variable
 * - **`adapters`**: one adapter per language, converting between the stored
 *   Python (host text) and what the user edits (native text)
 * - **`switch`**: the pure state transition behind changing a cell's language
 * - **`context`**: name and engine lookups passed into transforms
 * - **`surface`** and **`schema`**: what the UI attaches for each language
 *
 * ## Usage Pattern
 *
 * ```rust
 * use polycell_engine::language::*;
 *
 * let ctx = TransformContext::standalone();
 * let state = LanguageState::from_host("SELECT * FROM df", &ctx, 100);
 *
 * let sql = apply_language_switch(&state, &SwitchCommand::transform(LanguageKind::Sql), &ctx)
 *     .unwrap()
 *     .unwrap();
 * let python = apply_language_switch(&sql, &SwitchCommand::transform(LanguageKind::Python), &ctx)
 *     .unwrap()
 *     .unwrap();
 *
 * assert_eq!(python.text(), "_df = mo.sql(f\"\"\"SELECT * FROM df\"\"\")");
 * ```
 */

pub mod adapters;
pub mod context;
pub mod escape;
pub mod metadata;
pub mod quotes;
pub mod schema;
pub mod surface;
pub mod switch;

pub use adapters::{
    Exported, LanguageAdapter, LanguageKind, MarkdownAdapter, ParseLanguageError, PythonAdapter,
    SqlAdapter, Transformed,
};
pub use context::{DeclaredNames, EngineResolver, NameAllocator, PrivateNames, TransformContext};
pub use metadata::{LanguageMetadata, MarkdownMetadata, MetadataValue, SqlMetadata};
pub use quotes::{ParseQuotePrefixError, QuotePrefixKind, split_quote_prefix};
pub use schema::{SchemaCache, TableSchema, completion_engine, tables_for};
pub use surface::{CompletionSource, EditingSurface, Highlighting, KeyBinding};
pub use switch::{
    LanguageState, SwitchCommand, TOGGLE_LANGUAGE_KEY, apply_language_switch,
    initial_language_adapter, next_language,
};
