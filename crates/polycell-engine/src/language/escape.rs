//! Escaping of quote delimiters for text embedded in Python string literals.
//!
//! Only the delimiter and the backslashes right in front of it are handled.
//! Other backslash sequences are left alone, this is not a Python
//! string-literal parser.

use std::borrow::Cow;

/// Delimiters the escaper knows about, longest first.
pub const QUOTE_KINDS: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];

fn is_known_quote(quote: &str) -> bool {
    QUOTE_KINDS.contains(&quote)
}

/// Put a backslash in front of every occurrence of `quote` in `text`.
///
/// Backslashes already in front of an occurrence are doubled so they cannot
/// swallow the added one. In a run of quote characters longer than `quote`
/// the occurrences are taken from the end of the run, leaving fewer bare
/// quote characters than make a delimiter in front. Unknown delimiters pass
/// `text` through untouched.
pub fn escape_quotes<'a>(text: &'a str, quote: &str) -> Cow<'a, str> {
    if !is_known_quote(quote) || !text.contains(quote) {
        return Cow::Borrowed(text);
    }
    let mark = &quote[..1];
    let mut escaped = String::with_capacity(text.len() + 4);
    let mut rest = text;
    while let Some(start) = rest.find(quote) {
        let (before, tail) = rest.split_at(start);
        let run = tail.len() - tail.trim_start_matches(mark).len();
        let bare = run % quote.len();
        escaped.push_str(before);
        if bare == 0 {
            escaped.push_str(&"\\".repeat(trailing_backslashes(before)));
        }
        escaped.push_str(&tail[..bare]);
        for _ in 0..run / quote.len() {
            escaped.push('\\');
            escaped.push_str(quote);
        }
        rest = &tail[run..];
    }
    escaped.push_str(rest);
    Cow::Owned(escaped)
}

/// Inverse of [`escape_quotes`]: an odd run of `n` backslashes followed by
/// `quote` becomes `n / 2` backslashes and `quote`.
pub fn unescape_quotes<'a>(text: &'a str, quote: &str) -> Cow<'a, str> {
    if !is_known_quote(quote) {
        return Cow::Borrowed(text);
    }
    if !text.contains(&format!("\\{quote}")) {
        return Cow::Borrowed(text);
    }
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(quote) {
        let (before, tail) = rest.split_at(start);
        let slashes = trailing_backslashes(before);
        if slashes % 2 == 1 {
            unescaped.push_str(&before[..before.len() - slashes]);
            unescaped.push_str(&"\\".repeat(slashes / 2));
        } else {
            unescaped.push_str(before);
        }
        unescaped.push_str(quote);
        rest = &tail[quote.len()..];
    }
    unescaped.push_str(rest);
    Cow::Owned(unescaped)
}

fn trailing_backslashes(text: &str) -> usize {
    text.len() - text.trim_end_matches('\\').len()
}

/// Byte offset of the first `quote` in `text` not preceded by an escaping
/// backslash.
pub fn find_unescaped(text: &str, quote: &str) -> Option<usize> {
    if quote.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i..].starts_with(quote.as_bytes()) {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Whether `text` contains `quote` not preceded by an escaping backslash.
pub fn contains_unescaped(text: &str, quote: &str) -> bool {
    find_unescaped(text, quote).is_some()
}

/// Whether a literal with this body really ends at the closing `quote`
/// placed right after it.
///
/// Python closes a literal at the first unescaped delimiter, so a body with
/// a bare delimiter inside, a trailing backslash, or (for triple quotes) a
/// trailing quote character would be read differently than intended.
pub fn closes_cleanly(body: &str, quote: &str) -> bool {
    let literal = format!("{body}{quote}");
    find_unescaped(&literal, quote) == Some(body.len())
}
