use crate::language::adapters::{Exported, Transformed};
use crate::language::metadata::LanguageMetadata;
use crate::language::surface::{CompletionSource, EditingSurface, Highlighting};

/// Plain Python: the host form is the editing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PythonAdapter;

impl PythonAdapter {
    pub fn default_code(&self) -> &'static str {
        ""
    }

    /// Python is the fallback for every cell.
    pub fn is_supported(&self, _host: &str) -> bool {
        true
    }

    pub fn transform_in(&self, host: &str) -> Transformed {
        Transformed::new(host.to_string(), 0, LanguageMetadata::new())
    }

    pub fn transform_out(&self, native: &str, _metadata: &LanguageMetadata) -> Exported {
        Exported {
            code: native.to_string(),
            offset: 0,
        }
    }

    pub fn editing_surface(&self) -> EditingSurface {
        EditingSurface {
            highlighting: Highlighting::Python,
            keymap: Vec::new(),
            completions: vec![CompletionSource::PythonCode],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transforms_are_identity() {
        let code = "  x = 1\nprint(x)  ";

        let entered = PythonAdapter.transform_in(code);
        let exported = PythonAdapter.transform_out(&entered.code, &entered.metadata);

        assert_eq!(entered.code, code);
        assert_eq!(entered.offset, 0);
        assert!(entered.metadata.is_empty());
        assert_eq!(exported.code, code);
        assert_eq!(exported.offset, 0);
    }

    #[test]
    fn test_supports_anything() {
        assert!(PythonAdapter.is_supported(""));
        assert!(PythonAdapter.is_supported("mo.md('x')"));
        assert!(PythonAdapter.is_supported("def broken(:"));
    }
}
