//! Declarative description of the editing surface for a language.
//!
//! The editor wiring reads this to decide highlighting, extra keybindings
//! and completion sources. Nothing in this crate attaches to a renderer.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Highlighting {
    Python,
    /// Markdown with Python highlighted inside `{...}` interpolations
    MarkdownWithPython,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionSource {
    /// Code completion served by the kernel
    PythonCode,
    /// Variables in scope, offered inside f-string interpolations
    PythonVariables,
    Emoji,
    SqlKeywords,
    /// Tables and columns of the engine named in the cell metadata
    TableSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBinding {
    /// Key in editor notation, e.g. `Mod-b`
    pub key: &'static str,
    pub command: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditingSurface {
    pub highlighting: Highlighting,
    pub keymap: Vec<KeyBinding>,
    pub completions: Vec<CompletionSource>,
}

impl EditingSurface {
    pub fn has_completion(&self, source: CompletionSource) -> bool {
        self.completions.contains(&source)
    }
}
