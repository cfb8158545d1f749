/*!
 * # Cell Editing
 *
 * Each cell has one [`CellEditor`]. Its document is an **`xi_rope::Rope`**
 * holding the text the user edits (native text), never the stored Python.
 *
 * - **`commands`**: `Cmd` enum compiled to xi-rope deltas
 * - **`history`**: bounded undo/redo of document and cursor
 * - **`patch`**: what an edit changed
 * - **`editor`**: `CellEditor`, tying edits, metadata and language switching together
 *
 * ```rust
 * use polycell_engine::editing::*;
 * use polycell_engine::language::{LanguageKind, SwitchCommand, TransformContext};
 *
 * let ctx = TransformContext::standalone();
 * let mut editor = CellEditor::new("mo.md(\"# Notes\")", &ctx, 100);
 * assert_eq!(editor.language(), LanguageKind::Markdown);
 *
 * editor.apply(Cmd::InsertText { at: 7, text: "!".to_string() });
 * assert_eq!(editor.host_code(), "mo.md(\"\"\"# Notes!\"\"\")");
 *
 * editor.switch_language(SwitchCommand::keep_code(LanguageKind::Python), &ctx);
 * assert_eq!(editor.text(), "# Notes!");
 * ```
 */

pub mod commands;
pub mod editor;
pub mod history;
pub mod patch;

pub use commands::{Cmd, snap_to_char_boundary};
pub use editor::{CellEditor, EditorConfig, SwitchOutcome};
pub use history::{DEFAULT_HISTORY_LIMIT, History, Step};
pub use patch::Patch;
