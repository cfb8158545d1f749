//! Language switching as a pure state transition.
//!
//! [`apply_language_switch`] takes one [`LanguageState`] snapshot and
//! returns the next. Text, cursor, metadata, adapter and history all change
//! together in the returned value, so no caller ever observes a new adapter
//! paired with the old metadata.

use xi_rope::Rope;

use crate::editing::commands::snap_to_char_boundary;
use crate::editing::history::History;
use crate::error::SwitchError;
use crate::language::adapters::{LanguageAdapter, LanguageKind};
use crate::language::context::TransformContext;
use crate::language::metadata::LanguageMetadata;

/// Default key for cycling through languages
pub const TOGGLE_LANGUAGE_KEY: &str = "F4";

/// Everything one editor knows about its cell
#[derive(Debug, Clone)]
pub struct LanguageState {
    pub(crate) adapter: LanguageAdapter,
    pub(crate) document: Rope,
    pub(crate) cursor: usize,
    pub(crate) metadata: LanguageMetadata,
    pub(crate) history: History,
}

impl LanguageState {
    /// Enter the language detected for `host`, cursor at the end.
    pub fn from_host(host: &str, ctx: &TransformContext<'_>, history_limit: usize) -> Self {
        let adapter = initial_language_adapter(host);
        let entered = adapter.transform_in(host, ctx);
        log::debug!("detected {} for new cell", adapter.kind());
        Self {
            adapter,
            cursor: entered.code.len(),
            document: Rope::from(entered.code),
            metadata: entered.metadata,
            history: History::new(history_limit),
        }
    }

    /// Python over `text` as is, with nothing remembered
    pub(crate) fn python_fallback(&self, text: String) -> Self {
        Self {
            adapter: LanguageAdapter::default(),
            cursor: snap_to_char_boundary(&text, self.cursor),
            document: Rope::from(text),
            metadata: LanguageMetadata::new(),
            history: self.history.restarted(),
        }
    }

    pub fn adapter(&self) -> LanguageAdapter {
        self.adapter
    }

    pub fn language(&self) -> LanguageKind {
        self.adapter.kind()
    }

    pub fn document(&self) -> &Rope {
        &self.document
    }

    pub fn text(&self) -> String {
        self.document.to_string()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn metadata(&self) -> &LanguageMetadata {
        &self.metadata
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

/// Language a fresh editor starts in.
///
/// Blank text is Python. Otherwise the first of Markdown, SQL that
/// recognises the trimmed text, and Python when neither does.
pub fn initial_language_adapter(host: &str) -> LanguageAdapter {
    let trimmed = host.trim();
    if trimmed.is_empty() {
        return LanguageAdapter::default();
    }
    LanguageKind::DETECTION_ORDER
        .into_iter()
        .map(LanguageKind::adapter)
        .find(|adapter| adapter.is_supported(trimmed))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchCommand {
    pub target: LanguageKind,
    /// Leave the document untouched instead of converting it
    pub keep_code_as_is: bool,
}

impl SwitchCommand {
    pub fn transform(target: LanguageKind) -> Self {
        Self {
            target,
            keep_code_as_is: false,
        }
    }

    pub fn keep_code(target: LanguageKind) -> Self {
        Self {
            target,
            keep_code_as_is: true,
        }
    }
}

/// Compute the state after switching to `cmd.target`.
///
/// `Ok(None)` when the target is already active. Any other switch restarts
/// the history. With `keep_code_as_is` the document and cursor stay as they
/// are and the metadata becomes the target's defaults. Otherwise the
/// document is written out by the current adapter and read back in by the
/// target, with the cursor carried across.
pub fn apply_language_switch(
    state: &LanguageState,
    cmd: &SwitchCommand,
    ctx: &TransformContext<'_>,
) -> Result<Option<LanguageState>, SwitchError> {
    let current = state.adapter;
    if current.kind() == cmd.target {
        return Ok(None);
    }
    let target = cmd.target.adapter();
    let history = state.history.restarted();

    if cmd.keep_code_as_is {
        log::debug!(
            "switching {} -> {} keeping code as is",
            current.kind(),
            target.kind()
        );
        return Ok(Some(LanguageState {
            adapter: target,
            document: state.document.clone(),
            cursor: state.cursor,
            metadata: target.default_metadata(ctx),
            history,
        }));
    }

    if let Some((key, value)) = current.invalid_setting(&state.metadata) {
        return Err(SwitchError::InvalidMetadata {
            key: key.to_string(),
            value,
        });
    }
    let exported = current.transform_out(&state.text(), &state.metadata);
    if !current.is_supported(&exported.code) {
        return Err(SwitchError::Unrepresentable {
            language: current.kind(),
        });
    }

    let entered = target.transform_in(&exported.code, ctx);
    let cursor = remap_cursor(state.cursor, exported.offset, entered.offset, &entered.code);
    log::debug!(
        "switched {} -> {}, cursor {} -> {}",
        current.kind(),
        target.kind(),
        state.cursor,
        cursor
    );

    Ok(Some(LanguageState {
        adapter: target,
        document: Rope::from(entered.code),
        cursor,
        metadata: entered.metadata,
        history,
    }))
}

/// Carry a cursor through host text: `cursor + out - in`, clamped to `text`.
fn remap_cursor(cursor: usize, out_offset: usize, in_offset: usize, text: &str) -> usize {
    let host_position = cursor + out_offset;
    snap_to_char_boundary(text, host_position.saturating_sub(in_offset))
}

/// Next language in the Python, Markdown, SQL cycle that recognises `host`.
///
/// Returns `current` when no other language does.
pub fn next_language(current: LanguageKind, host: &str) -> LanguageKind {
    let mut candidate = current.next();
    while candidate != current {
        if candidate.adapter().is_supported(host) {
            return candidate;
        }
        candidate = candidate.next();
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::metadata::{
        DATAFRAME_NAME, DEFAULT_ENGINE, ENGINE, QUOTE_PREFIX, SHOW_OUTPUT, SqlMetadata,
    };
    use crate::language::quotes::QuotePrefixKind;
    use crate::MetadataValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn state(host: &str) -> LanguageState {
        LanguageState::from_host(host, &TransformContext::standalone(), 100)
    }

    fn python(text: &str) -> LanguageState {
        LanguageState {
            adapter: LanguageAdapter::default(),
            document: Rope::from(text),
            cursor: text.len(),
            metadata: LanguageMetadata::new(),
            history: History::new(100),
        }
    }

    fn switch(state: &LanguageState, cmd: SwitchCommand) -> LanguageState {
        apply_language_switch(state, &cmd, &TransformContext::standalone())
            .unwrap()
            .unwrap()
    }

    #[rstest]
    #[case("", LanguageKind::Python)]
    #[case("   \n", LanguageKind::Python)]
    #[case("mo.md('hello')", LanguageKind::Markdown)]
    #[case("df = mo.sql('hello')", LanguageKind::Sql)]
    #[case("print('hello')", LanguageKind::Python)]
    #[case("\n  mo.md(r\"\"\"# Title\"\"\")\n", LanguageKind::Markdown)]
    fn test_initial_language(#[case] host: &str, #[case] expected: LanguageKind) {
        assert_eq!(initial_language_adapter(host).kind(), expected);
    }

    #[test]
    fn test_from_host_enters_detected_language() {
        let state = state("mo.md(\"# Hi\")");

        assert_eq!(state.language(), LanguageKind::Markdown);
        assert_eq!(state.text(), "# Hi");
        assert_eq!(state.cursor(), 4);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_switch_to_active_language_is_noop() {
        let state = state("x = 1");

        let result = apply_language_switch(
            &state,
            &SwitchCommand::transform(LanguageKind::Python),
            &TransformContext::standalone(),
        );

        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_keep_code_as_is_round_trip_preserves_text_and_cursor() {
        let mut python = state("print('hi')\n# done");
        python.cursor = 5;

        let markdown = switch(&python, SwitchCommand::keep_code(LanguageKind::Markdown));
        assert_eq!(markdown.text(), python.text());
        assert_eq!(markdown.cursor(), 5);
        assert_eq!(
            markdown.metadata(),
            &LanguageMetadata::from([(QUOTE_PREFIX, "r")])
        );

        let back = switch(&markdown, SwitchCommand::keep_code(LanguageKind::Python));
        assert_eq!(back.text(), python.text());
        assert_eq!(back.cursor(), 5);
        assert!(back.metadata().is_empty());
    }

    #[test]
    fn test_python_to_sql_and_back_wraps_the_query() {
        let python = state("SELECT * FROM df");

        let sql = switch(&python, SwitchCommand::transform(LanguageKind::Sql));
        assert_eq!(sql.text(), "SELECT * FROM df");
        assert_eq!(sql.cursor(), 16);
        let defaults = SqlMetadata::from(sql.metadata());
        assert_eq!(defaults.dataframe_name, "_df");
        assert_eq!(defaults.quote_prefix, QuotePrefixKind::F);
        assert!(defaults.show_output);
        assert_eq!(sql.metadata().get(ENGINE), Some(&MetadataValue::from(DEFAULT_ENGINE)));
        assert_eq!(sql.metadata().get(DATAFRAME_NAME), Some(&MetadataValue::from("_df")));
        assert_eq!(sql.metadata().get(SHOW_OUTPUT), Some(&MetadataValue::Bool(true)));

        let back = switch(&sql, SwitchCommand::transform(LanguageKind::Python));
        insta::assert_snapshot!(back.text(), @r#"_df = mo.sql(f"""SELECT * FROM df""")"#);
        assert_eq!(&back.text()[back.cursor()..], "\"\"\")");
        assert!(back.metadata().is_empty());
    }

    #[test]
    fn test_cursor_follows_text_into_markdown() {
        let mut cell = python("mo.md(\n    r\"\"\"\n    # Title\n    body\n    \"\"\"\n)");
        cell.cursor = cell.text().find("Title").unwrap();

        let markdown = switch(&cell, SwitchCommand::transform(LanguageKind::Markdown));

        assert_eq!(markdown.text(), "# Title\nbody");
        assert_eq!(&markdown.text()[markdown.cursor()..], "Title\nbody");
    }

    #[test]
    fn test_switch_restarts_history() {
        let mut python = state("SELECT 1");
        python.history.record(crate::editing::history::Step {
            document: Rope::from(""),
            cursor: 0,
        });

        let sql = switch(&python, SwitchCommand::transform(LanguageKind::Sql));

        assert!(sql.history().is_empty());
        assert_eq!(sql.history().limit(), 100);
    }

    #[test]
    fn test_unwritable_metadata_is_reported() {
        let mut sql = state("df = mo.sql('SELECT 1')");
        sql.metadata.insert(DATAFRAME_NAME, "not valid");

        let result = apply_language_switch(
            &sql,
            &SwitchCommand::transform(LanguageKind::Python),
            &TransformContext::standalone(),
        );

        assert_eq!(
            result.err(),
            Some(SwitchError::InvalidMetadata {
                key: DATAFRAME_NAME.to_string(),
                value: "not valid".to_string(),
            })
        );
    }

    #[rstest]
    #[case(LanguageKind::Python, "mo.md('x')", LanguageKind::Markdown)]
    #[case(LanguageKind::Python, "df = mo.sql('x')", LanguageKind::Sql)]
    #[case(LanguageKind::Python, "print(1)", LanguageKind::Python)]
    #[case(LanguageKind::Markdown, "mo.md('x')", LanguageKind::Python)]
    #[case(LanguageKind::Sql, "df = mo.sql('x')", LanguageKind::Python)]
    #[case(LanguageKind::Markdown, "", LanguageKind::Sql)]
    fn test_next_language(
        #[case] current: LanguageKind,
        #[case] host: &str,
        #[case] expected: LanguageKind,
    ) {
        assert_eq!(next_language(current, host), expected);
    }

    #[test]
    fn test_remap_cursor_clamps_and_snaps() {
        assert_eq!(remap_cursor(3, 0, 10, "abc"), 0);
        assert_eq!(remap_cursor(3, 10, 0, "abc"), 3);
        assert_eq!(remap_cursor(1, 0, 0, "é"), 0);
    }
}
