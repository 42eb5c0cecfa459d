//! Shared chumsky parser utilities
//!
//! Symbol names, attribute names and endpoint labels all share one lexical
//! rule: ASCII letters, digits, underscores and dashes, at least one of them.

use chumsky::prelude::*;

/// Returns true for characters allowed in a name.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a name (`[A-Za-z0-9_-]+`), yielding the matched slice.
pub fn identifier<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    any()
        .filter(|c: &char| is_name_char(*c))
        .repeated()
        .at_least(1)
        .to_slice()
}

/// Returns true if the whole of `input` is a single valid name.
pub fn is_identifier(input: &str) -> bool {
    identifier()
        .then_ignore(end())
        .parse(input)
        .into_result()
        .is_ok()
}
