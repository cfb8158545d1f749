//! Shared pieces for adapters that embed their text in a string literal
//! passed to a single call (`mo.md(...)`, `mo.sql(...)`).

use regex::{Captures, Regex};

use crate::language::escape::{
    QUOTE_KINDS, closes_cleanly, escape_quotes, unescape_quotes,
};
use crate::language::quotes::{QuotePrefixKind, split_quote_prefix};

pub(crate) const INDENT: &str = "    ";

/// Regex alternation of the known prefixes, longest first
pub(crate) const PREFIX_PATTERN: &str = "fr|rf|f|r";

/// One compiled pattern per quote kind, in [`QUOTE_KINDS`] order.
///
/// `build` receives the quote and returns a full pattern; it must contain
/// the named groups `prefix` and `body`.
pub(crate) fn literal_patterns(build: impl Fn(&str) -> String) -> Vec<(&'static str, Regex)> {
    QUOTE_KINDS
        .iter()
        .map(|quote| {
            let pattern = build(&regex::escape(quote));
            let regex = Regex::new(&pattern).expect("Invalid literal pattern");
            (*quote, regex)
        })
        .collect()
}

/// A string literal located inside host text
pub(crate) struct Literal<'h> {
    pub prefix: QuotePrefixKind,
    pub quote: &'static str,
    pub body: &'h str,
    /// Byte offset of `body` inside the matched text
    pub body_start: usize,
}

impl<'h> Literal<'h> {
    /// Pull the literal out of `captures`, rejecting bodies Python would
    /// not read as one literal.
    pub fn from_captures(quote: &'static str, captures: &Captures<'h>) -> Option<Self> {
        let body = captures.name("body")?;
        let introducer = match captures.name("prefix") {
            Some(prefix) => format!("{}{quote}", prefix.as_str()),
            None => quote.to_string(),
        };
        let (prefix, rest) = split_quote_prefix(&introducer);
        if rest != quote {
            return None;
        }
        let text = body.as_str();
        if quote.len() == 1 && text.contains('\n') {
            return None;
        }
        if !closes_cleanly(text, quote) {
            return None;
        }
        Some(Self {
            prefix,
            quote,
            body: text,
            body_start: body.start(),
        })
    }

    /// Native text of the literal and the offset of its first byte relative
    /// to the start of the matched text.
    pub fn native(&self) -> (String, usize) {
        let unescaped = unescape_quotes(self.body, self.quote);
        let native = dedent(&unescaped).trim().to_string();
        (native, self.body_start + leading_whitespace(self.body))
    }
}

/// First matching pattern wins; a match that fails validation means the
/// text is ambiguous and no later pattern is consulted.
pub(crate) fn find_literal<'h>(
    patterns: &[(&'static str, Regex)],
    text: &'h str,
) -> Option<(Captures<'h>, Literal<'h>)> {
    let (quote, captures) = patterns
        .iter()
        .find_map(|(quote, regex)| regex.captures(text).map(|caps| (*quote, caps)))?;
    let literal = Literal::from_captures(quote, &captures)?;
    Some((captures, literal))
}

/// Delimiter used for writing `native` back out.
///
/// Triple double quotes unless the text has them and triple single quotes
/// would need no escaping.
pub(crate) fn choose_delimiter(native: &str) -> &'static str {
    if native.contains("\"\"\"") && !native.contains("'''") {
        "'''"
    } else {
        "\"\"\""
    }
}

/// Literal written around native text, either inline or as an indented block
pub(crate) struct WrappedLiteral {
    pub text: String,
    /// Offset of the first native byte inside `text`
    pub offset: usize,
    pub multiline: bool,
}

/// Wrap `native` in `prefix` + delimiter, escaped.
///
/// Text that fits on one line stays inline right after the call's opening
/// parenthesis. Anything else becomes an indented block starting on the
/// next line; the caller then closes the call on a line of its own.
pub(crate) fn wrap_literal(native: &str, prefix: QuotePrefixKind) -> WrappedLiteral {
    // An empty literal would print as six quotes in a row
    let native = if native.is_empty() { " " } else { native };
    let quote = choose_delimiter(native);
    let escaped = escape_quotes(native, quote);

    if !escaped.contains('\n') && closes_cleanly(&escaped, quote) {
        let open = format!("{prefix}{quote}");
        return WrappedLiteral {
            offset: open.len(),
            text: format!("{open}{escaped}{quote}"),
            multiline: false,
        };
    }

    let open = format!("\n{INDENT}{prefix}{quote}\n");
    let first_line_indent = if escaped.starts_with('\n') { 0 } else { INDENT.len() };
    WrappedLiteral {
        offset: open.len() + first_line_indent,
        text: format!("{open}{}\n{INDENT}{quote}", indent_lines(&escaped)),
        multiline: true,
    }
}

/// Indent every non-empty line by one level.
pub(crate) fn indent_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the indentation shared by all lines that have content.
///
/// Whitespace-only lines do not count towards the shared indentation and
/// lose at most that much.
pub(crate) fn dedent(text: &str) -> String {
    let common = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(leading_indent)
        .min()
        .unwrap_or(0);
    if common == 0 {
        return text.to_string();
    }
    text.split('\n')
        .map(|line| &line[leading_indent(line).min(common)..])
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_indent(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Byte length of all leading whitespace, newlines included.
pub(crate) fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}
