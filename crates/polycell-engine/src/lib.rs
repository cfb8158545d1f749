pub mod editing;
pub mod error;
pub mod language;

// Re-export key types for easier usage
pub use editing::*;
pub use error::{EngineError, SwitchError};
pub use language::*;
