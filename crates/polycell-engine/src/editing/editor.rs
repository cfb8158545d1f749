use xi_rope::Rope;

use crate::editing::commands::{
    Cmd, changed_ranges, compile_command, snap_to_char_boundary, transform_cursor,
};
use crate::editing::history::{DEFAULT_HISTORY_LIMIT, Step};
use crate::editing::patch::Patch;
use crate::error::{EngineError, Result};
use crate::language::adapters::LanguageKind;
use crate::language::context::TransformContext;
use crate::language::metadata::LanguageMetadata;
use crate::language::surface::EditingSurface;
use crate::language::switch::{
    LanguageState, SwitchCommand, TOGGLE_LANGUAGE_KEY, apply_language_switch, next_language,
};

/// Editor settings that do not depend on the cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub history_limit: usize,
    pub toggle_language_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            toggle_language_key: TOGGLE_LANGUAGE_KEY.to_string(),
        }
    }
}

/// How a language change ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Language is the same as before
    Unchanged,
    Switched,
    /// The change could not be made faithfully; the cell is now Python over
    /// the unchanged text.
    FellBack,
}

/// One cell being edited.
///
/// Owns a [`LanguageState`] and replaces it wholesale on every language
/// change. Text edits, cursor moves and metadata updates mutate it in place.
#[derive(Debug, Clone)]
pub struct CellEditor {
    state: LanguageState,
    version: u64,
}

impl CellEditor {
    pub fn new(host: &str, ctx: &TransformContext<'_>, history_limit: usize) -> Self {
        Self {
            state: LanguageState::from_host(host, ctx, history_limit),
            version: 0,
        }
    }

    pub fn from_config(host: &str, ctx: &TransformContext<'_>, config: &EditorConfig) -> Self {
        Self::new(host, ctx, config.history_limit)
    }

    pub fn state(&self) -> &LanguageState {
        &self.state
    }

    pub fn language(&self) -> LanguageKind {
        self.state.language()
    }

    pub fn text(&self) -> String {
        self.state.text()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Move the cursor, clamped to the document and snapped to a character.
    pub fn set_cursor(&mut self, pos: usize) {
        self.state.cursor = snap_to_char_boundary(&self.text(), pos);
    }

    pub fn metadata(&self) -> &LanguageMetadata {
        &self.state.metadata
    }

    /// Replace the whole metadata map.
    pub fn set_metadata(&mut self, metadata: LanguageMetadata) {
        self.state.metadata = metadata;
    }

    /// Shallow-merge `patch` into the metadata.
    pub fn update_metadata(&mut self, patch: LanguageMetadata) {
        self.state.metadata.merge(patch);
    }

    pub fn editing_surface(&self) -> EditingSurface {
        self.state.adapter.editing_surface()
    }

    /// Apply an edit to the editing surface.
    ///
    /// Positions outside the document are clamped. Every edit that changes
    /// the text can be undone.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let text = self.text();
        let cmd = cmd.clamped(&text);
        if cmd.is_noop() {
            return Patch {
                changed: Vec::new(),
                cursor: self.state.cursor,
                version: self.version,
            };
        }

        let delta = compile_command(&self.state.document, &cmd);
        let changed = changed_ranges(&delta);
        let before = self.current_step();
        self.state.history.record(before);
        self.state.document = delta.apply(&self.state.document);
        self.state.cursor = transform_cursor(self.state.cursor, &cmd);
        self.version += 1;

        Patch {
            changed,
            cursor: self.state.cursor,
            version: self.version,
        }
    }

    pub fn undo(&mut self) -> bool {
        let current = self.current_step();
        match self.state.history.undo(current) {
            Some(step) => {
                self.restore(step);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.current_step();
        match self.state.history.redo(current) {
            Some(step) => {
                self.restore(step);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    /// Change the cell's language. Never fails: a switch that cannot be made
    /// leaves the cell as Python over its current text.
    pub fn switch_language(&mut self, cmd: SwitchCommand, ctx: &TransformContext<'_>) -> SwitchOutcome {
        match apply_language_switch(&self.state, &cmd, ctx) {
            Ok(None) => SwitchOutcome::Unchanged,
            Ok(Some(next)) => {
                self.replace_state(next);
                SwitchOutcome::Switched
            }
            Err(err) => {
                log::warn!(
                    "switching {} -> {} failed, falling back to python: {err}",
                    self.language(),
                    cmd.target
                );
                self.fall_back(self.text());
                SwitchOutcome::FellBack
            }
        }
    }

    /// Move on to the next language that recognises the cell's host code.
    pub fn toggle_language(&mut self, ctx: &TransformContext<'_>) -> SwitchOutcome {
        let current = self.language();
        let next = next_language(current, &self.host_code());
        if next == current {
            return SwitchOutcome::Unchanged;
        }
        self.switch_language(SwitchCommand::transform(next), ctx)
    }

    /// The cell as stored in the notebook
    pub fn host_code(&self) -> String {
        self.state
            .adapter
            .transform_out(&self.text(), &self.state.metadata)
            .code
    }

    /// Re-enter the current language from `host`, as an undoable edit.
    ///
    /// Host text the current language no longer recognises drops the cell to
    /// Python, the same way a failed switch does.
    pub fn replace_from_host(&mut self, host: &str, ctx: &TransformContext<'_>) -> SwitchOutcome {
        let adapter = self.state.adapter;
        if !adapter.is_supported(host) {
            log::warn!(
                "{} does not recognise the replacement code, falling back to python",
                adapter.kind()
            );
            self.fall_back(host.to_string());
            return SwitchOutcome::FellBack;
        }

        let entered = adapter.transform_in(host, ctx);
        let before = self.current_step();
        self.state.history.record(before);
        self.state.cursor = snap_to_char_boundary(&entered.code, self.state.cursor);
        self.state.document = Rope::from(entered.code);
        self.state.metadata = entered.metadata;
        self.version += 1;
        SwitchOutcome::Unchanged
    }

    /// Run the cell's host code through `formatter` and take the result back.
    ///
    /// A formatter error leaves the editor untouched.
    pub fn format_with<F, E>(&mut self, formatter: F, ctx: &TransformContext<'_>) -> Result<SwitchOutcome>
    where
        F: FnOnce(&str) -> std::result::Result<String, E>,
        E: std::fmt::Display,
    {
        let formatted = formatter(&self.host_code()).map_err(|e| EngineError::Format(e.to_string()))?;
        Ok(self.replace_from_host(&formatted, ctx))
    }

    fn current_step(&self) -> Step {
        Step {
            document: self.state.document.clone(),
            cursor: self.state.cursor,
        }
    }

    fn restore(&mut self, step: Step) {
        self.state.document = step.document;
        self.state.cursor = step.cursor;
        self.version += 1;
    }

    fn replace_state(&mut self, state: LanguageState) {
        self.state = state;
        self.version += 1;
    }

    fn fall_back(&mut self, text: String) {
        let fallback = self.state.python_fallback(text);
        self.replace_state(fallback);
    }
}
