use std::fmt;
use std::str::FromStr;

/// Prefix introducing a Python string literal (`f"""`, `r"""`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuotePrefixKind {
    #[default]
    None,
    F,
    R,
    Fr,
    Rf,
}

impl QuotePrefixKind {
    /// Longest prefixes first so `fr` is never read as `f` + `r...`
    const BY_LENGTH: [QuotePrefixKind; 4] = [
        QuotePrefixKind::Fr,
        QuotePrefixKind::Rf,
        QuotePrefixKind::F,
        QuotePrefixKind::R,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuotePrefixKind::None => "",
            QuotePrefixKind::F => "f",
            QuotePrefixKind::R => "r",
            QuotePrefixKind::Fr => "fr",
            QuotePrefixKind::Rf => "rf",
        }
    }

    /// Whether `{...}` in the literal is interpolated
    pub fn is_format(self) -> bool {
        matches!(
            self,
            QuotePrefixKind::F | QuotePrefixKind::Fr | QuotePrefixKind::Rf
        )
    }
}

impl fmt::Display for QuotePrefixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quote prefix: {0:?}")]
pub struct ParseQuotePrefixError(pub String);

impl FromStr for QuotePrefixKind {
    type Err = ParseQuotePrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(QuotePrefixKind::None),
            "f" => Ok(QuotePrefixKind::F),
            "r" => Ok(QuotePrefixKind::R),
            "fr" => Ok(QuotePrefixKind::Fr),
            "rf" => Ok(QuotePrefixKind::Rf),
            other => Err(ParseQuotePrefixError(other.to_string())),
        }
    }
}

/// Split a quote introducer such as `fr"""` into its prefix and the rest.
///
/// Never fails: an unknown introducer comes back whole with an empty prefix.
pub fn split_quote_prefix(quote: &str) -> (QuotePrefixKind, &str) {
    for prefix in QuotePrefixKind::BY_LENGTH {
        if let Some(rest) = quote.strip_prefix(prefix.as_str()) {
            return (prefix, rest);
        }
    }
    (QuotePrefixKind::None, quote)
}
