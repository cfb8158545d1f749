use std::sync::OnceLock;

use regex::Regex;

use crate::language::adapters::layout::{self, PREFIX_PATTERN};
use crate::language::adapters::{Exported, Transformed};
use crate::language::metadata::{LanguageMetadata, MarkdownMetadata};
use crate::language::surface::{CompletionSource, EditingSurface, Highlighting, KeyBinding};

/// Markdown cells: a single `mo.md(...)` call around a string literal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownAdapter;

fn patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        layout::literal_patterns(|quote| {
            format!(r"(?s)^mo\.md\(\s*(?P<prefix>{PREFIX_PATTERN})?{quote}(?P<body>.*){quote}\s*\)$")
        })
    })
}

const EMPTY_CALL: &str = "mo.md()";

impl MarkdownAdapter {
    pub fn default_code(&self) -> &'static str {
        "mo.md(r\"\"\" \"\"\")"
    }

    pub fn is_supported(&self, host: &str) -> bool {
        let host = host.trim();
        if host.is_empty() || host == EMPTY_CALL {
            return true;
        }
        if !host.starts_with("mo.md(") {
            return false;
        }
        layout::find_literal(patterns(), host).is_some()
    }

    pub fn transform_in(&self, host: &str) -> Transformed {
        let leading = layout::leading_whitespace(host);
        let trimmed = host.trim();
        let defaults = LanguageMetadata::from(MarkdownMetadata::default());

        if trimmed.is_empty() || trimmed == EMPTY_CALL {
            return Transformed::new(String::new(), 0, defaults);
        }

        match layout::find_literal(patterns(), trimmed) {
            Some((_, literal)) => {
                let (native, offset) = literal.native();
                let metadata = MarkdownMetadata {
                    quote_prefix: literal.prefix,
                };
                Transformed::new(native, leading + offset, metadata.into())
            }
            None => Transformed::new(trimmed.to_string(), leading, defaults),
        }
    }

    pub fn transform_out(&self, native: &str, metadata: &LanguageMetadata) -> Exported {
        let MarkdownMetadata { quote_prefix } = MarkdownMetadata::from(metadata);
        let head = "mo.md(";
        let literal = layout::wrap_literal(native, quote_prefix);
        let tail = if literal.multiline { "\n)" } else { ")" };
        Exported {
            code: format!("{head}{}{tail}", literal.text),
            offset: head.len() + literal.offset,
        }
    }

    pub fn editing_surface(&self) -> EditingSurface {
        EditingSurface {
            highlighting: Highlighting::MarkdownWithPython,
            keymap: vec![
                KeyBinding {
                    key: "Mod-b",
                    command: "toggle-bold",
                },
                KeyBinding {
                    key: "Mod-i",
                    command: "toggle-italic",
                },
                KeyBinding {
                    key: "Mod-k",
                    command: "insert-link",
                },
            ],
            completions: vec![CompletionSource::Emoji, CompletionSource::PythonVariables],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::metadata::QUOTE_PREFIX;
    use crate::language::quotes::QuotePrefixKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn prefix_of(metadata: &LanguageMetadata) -> QuotePrefixKind {
        MarkdownMetadata::from(metadata).quote_prefix
    }

    #[rstest]
    #[case("")]
    #[case("   \n ")]
    #[case("mo.md()")]
    #[case("mo.md('hello')")]
    #[case("mo.md(\"hello\")")]
    #[case("mo.md(r\"\"\"# Title\"\"\")")]
    #[case("mo.md(f'''{name}''')")]
    #[case("mo.md(\n    r\"\"\"\n    # Title\n    \"\"\"\n)")]
    #[case("  mo.md(rf\"x\")  ")]
    fn test_is_supported(#[case] host: &str) {
        assert!(MarkdownAdapter.is_supported(host));
    }

    #[rstest]
    #[case("print('hello')")]
    #[case("mo.md('a') + mo.md('b')")]
    #[case("mo.md(\"a\nb\")")]
    #[case("mo.md(text)")]
    #[case("mo.md('hello').center()")]
    #[case("mo.md(b'bytes')")]
    #[case("mo.md(\"\"\"a\"\"\" + \"\"\"b\"\"\")")]
    #[case("x = mo.md('hello')")]
    fn test_is_not_supported(#[case] host: &str) {
        assert!(!MarkdownAdapter.is_supported(host));
    }

    #[test]
    fn test_transform_in_single_line() {
        let host = "mo.md(\"hello\")";

        let result = MarkdownAdapter.transform_in(host);

        assert_eq!(result.code, "hello");
        assert_eq!(result.offset, 7);
        assert_eq!(prefix_of(&result.metadata), QuotePrefixKind::None);
    }

    #[test]
    fn test_transform_in_block_dedents_and_trims() {
        let host = "mo.md(\n    f\"\"\"\n    # Hello {name}\n\n    - item\n    \"\"\"\n)";

        let result = MarkdownAdapter.transform_in(host);

        assert_eq!(result.code, "# Hello {name}\n\n- item");
        assert_eq!(&host[result.offset..result.offset + 7], "# Hello");
        assert_eq!(prefix_of(&result.metadata), QuotePrefixKind::F);
    }

    #[test]
    fn test_transform_in_unescapes_its_own_delimiter() {
        let result = MarkdownAdapter.transform_in("mo.md(r\"\"\"a \\\"\"\" b\"\"\")");

        assert_eq!(result.code, "a \"\"\" b");
    }

    #[rstest]
    #[case("")]
    #[case("mo.md()")]
    fn test_transform_in_empty_defaults_to_raw(#[case] host: &str) {
        let result = MarkdownAdapter.transform_in(host);

        assert_eq!(result.code, "");
        assert_eq!(result.offset, 0);
        assert_eq!(
            result.metadata,
            LanguageMetadata::from([(QUOTE_PREFIX, "r")])
        );
    }

    #[test]
    fn test_transform_in_plain_python_is_kept() {
        let result = MarkdownAdapter.transform_in("  print(1)\n");

        assert_eq!(result.code, "print(1)");
        assert_eq!(result.offset, 2);
        assert_eq!(prefix_of(&result.metadata), QuotePrefixKind::R);
    }

    #[test]
    fn test_transform_out_single_line() {
        let metadata = LanguageMetadata::from([(QUOTE_PREFIX, "r")]);

        let result = MarkdownAdapter.transform_out("# Hello", &metadata);

        insta::assert_snapshot!(result.code, @r##"mo.md(r"""# Hello""")"##);
        assert_eq!(result.offset, "mo.md(r\"\"\"".len());
    }

    #[test]
    fn test_transform_out_multiline() {
        let metadata = LanguageMetadata::from([(QUOTE_PREFIX, "f")]);

        let result = MarkdownAdapter.transform_out("# Hello\n\n{name}", &metadata);

        assert_eq!(
            result.code,
            "mo.md(\n    f\"\"\"\n    # Hello\n\n    {name}\n    \"\"\"\n)"
        );
        assert_eq!(&result.code[result.offset..result.offset + 7], "# Hello");
    }

    #[test]
    fn test_transform_out_empty_is_still_a_call() {
        let result = MarkdownAdapter.transform_out("", &LanguageMetadata::new());

        assert_eq!(result.code, "mo.md(r\"\"\" \"\"\")");
        assert!(MarkdownAdapter.is_supported(&result.code));
        assert_eq!(MarkdownAdapter.transform_in(&result.code).code, "");
    }

    #[test]
    fn test_transform_out_switches_delimiter_for_embedded_triple_quotes() {
        let metadata = LanguageMetadata::from([(QUOTE_PREFIX, "r")]);

        let result = MarkdownAdapter.transform_out("use \"\"\" for docstrings", &metadata);

        assert_eq!(result.code, "mo.md(r'''use \"\"\" for docstrings''')");
    }

    #[test]
    fn test_transform_out_escapes_when_both_triple_quotes_present() {
        let native = "\"\"\" and ''' both";
        let metadata = LanguageMetadata::from([(QUOTE_PREFIX, "r")]);

        let result = MarkdownAdapter.transform_out(native, &metadata);

        assert_eq!(result.code, "mo.md(r\"\"\"\\\"\"\" and ''' both\"\"\")");
        assert_eq!(MarkdownAdapter.transform_in(&result.code).code, native);
    }

    #[test]
    fn test_transform_out_escapes_backslash_before_delimiter() {
        let metadata = LanguageMetadata::from([(QUOTE_PREFIX, "r")]);

        let result = MarkdownAdapter.transform_out("a \\\"\"\" b ''' c", &metadata);

        insta::assert_snapshot!(result.code, @r#"mo.md(r"""a \\\""" b ''' c""")"#);
        assert!(MarkdownAdapter.is_supported(&result.code));
    }

    #[test]
    fn test_transform_out_trailing_backslash_uses_block_layout() {
        let result = MarkdownAdapter.transform_out("line ends with \\", &LanguageMetadata::new());

        assert!(result.code.starts_with("mo.md(\n"));
        assert!(MarkdownAdapter.is_supported(&result.code));
    }

    #[rstest]
    #[case("# Title", QuotePrefixKind::R)]
    #[case("# Title\n\nSome *text*\n\n  - nested", QuotePrefixKind::F)]
    #[case("quote: \"\"\"", QuotePrefixKind::None)]
    #[case("ends with a quote \"", QuotePrefixKind::Rf)]
    #[case("a \\\"\"\" b ''' c", QuotePrefixKind::R)]
    #[case("four \"\"\"\" and '''", QuotePrefixKind::None)]
    #[case("", QuotePrefixKind::R)]
    fn test_round_trip(#[case] native: &str, #[case] prefix: QuotePrefixKind) {
        let metadata = LanguageMetadata::from(MarkdownMetadata {
            quote_prefix: prefix,
        });

        let exported = MarkdownAdapter.transform_out(native, &metadata);
        assert!(MarkdownAdapter.is_supported(&exported.code));

        let back = MarkdownAdapter.transform_in(&exported.code);
        assert_eq!(back.code, native);
        assert_eq!(back.metadata, metadata);
    }
}
