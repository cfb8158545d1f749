use std::sync::OnceLock;

use regex::Regex;

use crate::language::adapters::layout::{self, PREFIX_PATTERN};
use crate::language::adapters::{Exported, Transformed};
use crate::language::context::TransformContext;
use crate::language::metadata::{
    COMMENT_LINES, DATAFRAME_NAME, DEFAULT_ENGINE, ENGINE, LanguageMetadata, SqlMetadata,
};
use crate::language::quotes::QuotePrefixKind;
use crate::language::surface::{CompletionSource, EditingSurface, Highlighting};

/// SQL cells: `name = mo.sql(...)` around a string literal, with optional
/// `output=` and `engine=` arguments and comment lines above the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlAdapter;

const CALL: &str = "mo.sql";

fn patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        layout::literal_patterns(|quote| {
            format!(
                r"(?s)^(?P<name>[^\W\d]\w*)\s*=\s*mo\.sql\(\s*(?P<prefix>{PREFIX_PATTERN})?{quote}(?P<body>.*){quote}(?P<params>(?:\s*,\s*\w+\s*=\s*[\w.]+)*)\s*,?\s*\)$"
            )
        })
    })
}

fn param_pattern() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| {
        Regex::new(r"^\s*(?P<key>\w+)\s*=\s*(?P<value>[\w.]+)\s*$").expect("Invalid param regex")
    })
}

fn identifier_pattern() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[^\W\d]\w*(?:\.[^\W\d]\w*)*$").expect("Invalid identifier regex")
    })
}

/// Keyword arguments of the call that survive a round trip
#[derive(Debug, Default, PartialEq, Eq)]
struct CallParams {
    show_output: Option<bool>,
    engine: Option<String>,
}

impl CallParams {
    /// `None` when an argument is unknown, repeated, or has a value that
    /// could not be written back the same way.
    fn parse(params: &str) -> Option<Self> {
        let mut parsed = CallParams::default();
        for param in params.split(',').filter(|p| !p.trim().is_empty()) {
            let captures = param_pattern().captures(param)?;
            let value = &captures["value"];
            match &captures["key"] {
                "output" if parsed.show_output.is_none() => {
                    parsed.show_output = Some(match value {
                        "True" => true,
                        "False" => false,
                        _ => return None,
                    });
                }
                "engine" if parsed.engine.is_none() => {
                    if !identifier_pattern().is_match(value) {
                        return None;
                    }
                    parsed.engine = Some(value.to_string());
                }
                _ => return None,
            }
        }
        Some(parsed)
    }
}

/// Host text split into the comment lines above the statement and the
/// statement itself.
struct Statement<'h> {
    comment_lines: Vec<String>,
    code: &'h str,
    /// Byte offset of `code` in the text that was split
    start: usize,
}

fn split_comment_lines(text: &str) -> Statement<'_> {
    let mut comment_lines = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.starts_with('#') {
            break;
        }
        comment_lines.push(trimmed.to_string());
        start += line.len();
    }
    let rest = &text[start..];
    let code = rest.trim_start();
    Statement {
        comment_lines,
        start: start + (rest.len() - code.len()),
        code,
    }
}

fn is_identifier(name: &str) -> bool {
    !name.contains('.') && identifier_pattern().is_match(name)
}

impl SqlAdapter {
    pub fn default_code(&self) -> &'static str {
        "_df = mo.sql(f\"\"\"SELECT * FROM \"\"\")"
    }

    pub fn default_metadata(&self, ctx: &TransformContext<'_>) -> SqlMetadata {
        SqlMetadata {
            dataframe_name: ctx.names.allocate(ctx.dataframe_base),
            quote_prefix: QuotePrefixKind::F,
            engine: ctx
                .engines
                .selected_engine()
                .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            show_output: true,
            comment_lines: Vec::new(),
        }
    }

    pub fn is_supported(&self, host: &str) -> bool {
        let host = host.trim();
        if host.is_empty() {
            return true;
        }
        self.parse(split_comment_lines(host).code).is_some()
    }

    /// Native SQL, offset of its first byte within `code`, and the metadata
    /// the call spells out.
    ///
    /// The statement must make exactly one `mo.sql` call; mentions inside the
    /// query text do not count.
    fn parse(&self, code: &str) -> Option<(String, usize, SqlMetadata)> {
        let (captures, literal) = layout::find_literal(patterns(), code)?;
        let body_end = literal.body_start + literal.body.len();
        let calls = code[..literal.body_start].matches(CALL).count()
            + code[body_end..].matches(CALL).count();
        if calls != 1 {
            return None;
        }
        let params = CallParams::parse(captures.name("params").map_or("", |m| m.as_str()))?;
        let (native, offset) = literal.native();
        let metadata = SqlMetadata {
            dataframe_name: captures["name"].to_string(),
            quote_prefix: literal.prefix,
            engine: params.engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            show_output: params.show_output.unwrap_or(true),
            comment_lines: Vec::new(),
        };
        Some((native, offset, metadata))
    }

    pub fn transform_in(&self, host: &str, ctx: &TransformContext<'_>) -> Transformed {
        let leading = layout::leading_whitespace(host);
        let trimmed = host.trim();

        if trimmed.is_empty() {
            return Transformed::new(String::new(), 0, self.default_metadata(ctx).into());
        }

        let statement = split_comment_lines(trimmed);
        match self.parse(statement.code) {
            Some((native, offset, mut metadata)) => {
                metadata.comment_lines = statement.comment_lines;
                log::debug!(
                    "entered sql for {} on engine {}",
                    metadata.dataframe_name,
                    metadata.engine
                );
                Transformed::new(native, leading + statement.start + offset, metadata.into())
            }
            None => Transformed::new(
                trimmed.to_string(),
                leading,
                self.default_metadata(ctx).into(),
            ),
        }
    }

    pub fn transform_out(&self, native: &str, metadata: &LanguageMetadata) -> Exported {
        let sql = SqlMetadata::from(metadata);
        let literal = layout::wrap_literal(native, sql.quote_prefix);

        let mut params = Vec::new();
        if !sql.show_output {
            params.push("output=False".to_string());
        }
        if !sql.uses_default_engine() {
            params.push(format!("engine={}", sql.engine));
        }

        let mut code = String::new();
        for line in &sql.comment_lines {
            code.push_str(line);
            code.push('\n');
        }
        let head = format!("{} = {CALL}(", sql.dataframe_name);
        let offset = code.len() + head.len() + literal.offset;
        code.push_str(&head);
        code.push_str(&literal.text);
        if literal.multiline {
            for param in &params {
                code.push_str(&format!(",\n{}{param}", layout::INDENT));
            }
            code.push_str("\n)");
        } else {
            for param in &params {
                code.push_str(&format!(", {param}"));
            }
            code.push(')');
        }

        Exported { code, offset }
    }

    /// Whether `transform_out` can write these settings back as valid code.
    pub fn accepts(&self, metadata: &LanguageMetadata) -> bool {
        self.invalid_setting(metadata).is_none()
    }

    /// First setting that would not survive being written out, as key and value.
    pub fn invalid_setting(&self, metadata: &LanguageMetadata) -> Option<(&'static str, String)> {
        let sql = SqlMetadata::from(metadata);
        if !is_identifier(&sql.dataframe_name) {
            return Some((DATAFRAME_NAME, sql.dataframe_name));
        }
        if !identifier_pattern().is_match(&sql.engine) {
            return Some((ENGINE, sql.engine));
        }
        sql.comment_lines
            .into_iter()
            .find(|line| !line.starts_with('#') || line.contains('\n'))
            .map(|line| (COMMENT_LINES, line))
    }

    pub fn editing_surface(&self) -> EditingSurface {
        EditingSurface {
            highlighting: Highlighting::Sql,
            keymap: Vec::new(),
            completions: vec![CompletionSource::SqlKeywords, CompletionSource::TableSchema],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::context::DeclaredNames;
    use crate::language::metadata::{QUOTE_PREFIX, SHOW_OUTPUT};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sql_of(metadata: &LanguageMetadata) -> SqlMetadata {
        SqlMetadata::from(metadata)
    }

    #[rstest]
    #[case("")]
    #[case("df = mo.sql('hello')")]
    #[case("_df = mo.sql(f\"\"\"SELECT * FROM t\"\"\")")]
    #[case("_df = mo.sql(\n    f\"\"\"\n    SELECT 1\n    \"\"\"\n)")]
    #[case("res = mo.sql(f\"SELECT 1\", output=False)")]
    #[case("res = mo.sql(f\"SELECT 1\", engine=pg)")]
    #[case("res = mo.sql(f\"SELECT 1\",\n    output=False,\n    engine=pg,\n)")]
    #[case("# weekly numbers\n# second line\nres = mo.sql(\"SELECT 1\")")]
    #[case("sales = mo.sql(f\"\"\"SELECT 1 -- copied from a mo.sql cell\"\"\", engine=pg)")]
    fn test_is_supported(#[case] host: &str) {
        assert!(SqlAdapter.is_supported(host));
    }

    #[rstest]
    #[case("SELECT * FROM df")]
    #[case("mo.sql('SELECT 1')")]
    #[case("df = mo.sql('a'); df2 = mo.sql('b')")]
    #[case("df = mo.sql('SELECT 1', limit=10)")]
    #[case("df = mo.sql('SELECT 1', output=maybe)")]
    #[case("df = mo.sql('SELECT 1', output=True, output=False)")]
    #[case("df = mo.sql(query)")]
    #[case("1df = mo.sql('SELECT 1')")]
    #[case("print(1)\ndf = mo.sql('SELECT 1')")]
    #[case("df = mo.sql(f\"\"\"SELECT 1\"\"\", engine=mo.sql)")]
    fn test_is_not_supported(#[case] host: &str) {
        assert!(!SqlAdapter.is_supported(host));
    }

    #[test]
    fn test_transform_in_reads_call_arguments() {
        let host = "# totals\nsales = mo.sql(\n    f\"\"\"\n    SELECT *\n    FROM orders\n    \"\"\",\n    output=False,\n    engine=warehouse\n)";

        let result = SqlAdapter.transform_in(host, &TransformContext::standalone());

        assert_eq!(result.code, "SELECT *\nFROM orders");
        assert_eq!(&host[result.offset..result.offset + 8], "SELECT *");
        assert_eq!(
            sql_of(&result.metadata),
            SqlMetadata {
                dataframe_name: "sales".to_string(),
                quote_prefix: QuotePrefixKind::F,
                engine: "warehouse".to_string(),
                show_output: false,
                comment_lines: vec!["# totals".to_string()],
            }
        );
    }

    #[test]
    fn test_transform_in_single_quoted_call() {
        let result = SqlAdapter.transform_in("df = mo.sql('hello')", &TransformContext::standalone());

        assert_eq!(result.code, "hello");
        assert_eq!(result.offset, "df = mo.sql('".len());
        let sql = sql_of(&result.metadata);
        assert_eq!(sql.dataframe_name, "df");
        assert_eq!(sql.quote_prefix, QuotePrefixKind::None);
        assert_eq!(sql.engine, DEFAULT_ENGINE);
    }

    #[test]
    fn test_transform_in_call_named_in_query() {
        let host = "t = mo.sql(f\"\"\"SELECT 'x = mo.sql(y)' AS s\"\"\")";

        let result = SqlAdapter.transform_in(host, &TransformContext::standalone());

        assert_eq!(result.code, "SELECT 'x = mo.sql(y)' AS s");
        assert_eq!(sql_of(&result.metadata).dataframe_name, "t");
    }

    #[test]
    fn test_transform_in_plain_text_gets_defaults() {
        let result = SqlAdapter.transform_in("SELECT * FROM df", &TransformContext::standalone());

        assert_eq!(result.code, "SELECT * FROM df");
        assert_eq!(result.offset, 0);
        assert_eq!(
            result.metadata,
            LanguageMetadata::from([
                (COMMENT_LINES, crate::MetadataValue::List(Vec::new())),
                (DATAFRAME_NAME, "_df".into()),
                (ENGINE, DEFAULT_ENGINE.into()),
                (QUOTE_PREFIX, "f".into()),
                (SHOW_OUTPUT, true.into()),
            ])
        );
    }

    #[test]
    fn test_defaults_come_from_context() {
        let names = DeclaredNames::new(["_df"]);
        let engine = Some("snowflake".to_string());
        let ctx = TransformContext::new(&names, &engine);

        let result = SqlAdapter.transform_in("", &ctx);

        let sql = sql_of(&result.metadata);
        assert_eq!(sql.dataframe_name, "_df_1");
        assert_eq!(sql.engine, "snowflake");
    }

    #[test]
    fn test_explicit_call_without_engine_uses_builtin_engine() {
        let engine = Some("snowflake".to_string());
        let ctx = TransformContext::new(&crate::PrivateNames, &engine);

        let result = SqlAdapter.transform_in("t = mo.sql(f\"SELECT 1\")", &ctx);

        assert_eq!(sql_of(&result.metadata).engine, DEFAULT_ENGINE);
    }

    #[test]
    fn test_transform_out_default_settings() {
        let metadata = LanguageMetadata::from(SqlMetadata::default());

        let result = SqlAdapter.transform_out("SELECT * FROM df", &metadata);

        insta::assert_snapshot!(result.code, @r#"_df = mo.sql(f"""SELECT * FROM df""")"#);
        assert_eq!(&result.code[result.offset..], "SELECT * FROM df\"\"\")");
    }

    #[test]
    fn test_transform_out_with_arguments_and_comments() {
        let metadata = LanguageMetadata::from(SqlMetadata {
            dataframe_name: "sales".to_string(),
            quote_prefix: QuotePrefixKind::F,
            engine: "warehouse".to_string(),
            show_output: false,
            comment_lines: vec!["# totals".to_string()],
        });

        let result = SqlAdapter.transform_out("SELECT *\nFROM orders", &metadata);

        assert_eq!(
            result.code,
            "# totals\nsales = mo.sql(\n    f\"\"\"\n    SELECT *\n    FROM orders\n    \"\"\",\n    output=False,\n    engine=warehouse\n)"
        );
        assert_eq!(&result.code[result.offset..result.offset + 8], "SELECT *");
    }

    #[test]
    fn test_transform_out_inline_arguments() {
        let metadata = LanguageMetadata::from(SqlMetadata {
            show_output: false,
            ..SqlMetadata::default()
        });

        let result = SqlAdapter.transform_out("SELECT 1", &metadata);

        assert_eq!(result.code, "_df = mo.sql(f\"\"\"SELECT 1\"\"\", output=False)");
    }

    #[rstest]
    #[case("SELECT 1")]
    #[case("SELECT *\nFROM t\nWHERE name = 'x'")]
    #[case("SELECT '\"\"\"' AS quotes")]
    #[case("SELECT 'mo.sql(' AS call")]
    #[case("")]
    fn test_round_trip(#[case] native: &str) {
        let metadata = LanguageMetadata::from(SqlMetadata {
            dataframe_name: "result".to_string(),
            quote_prefix: QuotePrefixKind::Rf,
            engine: "pg".to_string(),
            show_output: false,
            comment_lines: vec!["# a comment".to_string()],
        });

        let exported = SqlAdapter.transform_out(native, &metadata);
        assert!(SqlAdapter.is_supported(&exported.code));

        let back = SqlAdapter.transform_in(&exported.code, &TransformContext::standalone());
        assert_eq!(back.code, native);
        assert_eq!(back.metadata, metadata);
    }

    #[rstest]
    #[case(DATAFRAME_NAME, "my df")]
    #[case(DATAFRAME_NAME, "mo.x")]
    #[case(ENGINE, "engine; drop")]
    fn test_accepts_rejects_unwritable_settings(#[case] key: &'static str, #[case] value: &str) {
        let mut metadata = LanguageMetadata::from(SqlMetadata::default());
        metadata.insert(key, value);

        assert!(!SqlAdapter.accepts(&metadata));
        assert_eq!(
            SqlAdapter.invalid_setting(&metadata),
            Some((key, value.to_string()))
        );
    }

    #[test]
    fn test_accepts_defaults() {
        assert!(SqlAdapter.accepts(&SqlMetadata::default().into()));
    }
}
