use thiserror::Error;

use crate::language::adapters::LanguageKind;

/// Why a language switch could not be carried out.
///
/// Never surfaces from [`crate::CellEditor::switch_language`], which recovers
/// by falling back to Python.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("{language} cannot represent the current text")]
    Unrepresentable { language: LanguageKind },

    #[error("metadata {key} = {value:?} cannot be written back")]
    InvalidMetadata { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("formatter failed: {0}")]
    Format(String),

    #[error(transparent)]
    Switch(#[from] SwitchError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
