//! Query translation from user syntax to engine syntax.
//!
//! Users write space-separated terms. Unprefixed terms are required (`+term`),
//! `-term` excludes and `+term` requires explicitly, and `~term` makes a term
//! optional by dropping the prefix.

/// Rewrite a user query into engine query syntax.
///
/// `alpha -beta ~gamma` becomes `+alpha -beta gamma`. Runs of whitespace are
/// collapsed; an all-whitespace query translates to the empty string.
#[must_use]
pub fn translate_query(query: &str) -> String {
    let mut translated = String::with_capacity(query.len() + 8);
    for term in query.split_whitespace() {
        if !translated.is_empty() {
            translated.push(' ');
        }
        if term.starts_with('+') || term.starts_with('-') {
            translated.push_str(term);
        } else if let Some(optional) = term.strip_prefix('~') {
            translated.push_str(optional);
        } else {
            translated.push('+');
            translated.push_str(term);
        }
    }
    translated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_prefixes() {
        assert_eq!(translate_query("alpha -beta ~gamma"), "+alpha -beta gamma");
    }

    #[test]
    fn explicit_plus_passes_through() {
        assert_eq!(translate_query("+alpha"), "+alpha");
    }

    #[test]
    fn leading_and_repeated_whitespace_collapses() {
        assert_eq!(translate_query("  compact   ~metric "), "+compact metric");
    }

    #[test]
    fn empty_query_stays_empty() {
        assert_eq!(translate_query(""), "");
        assert_eq!(translate_query(" \t "), "");
    }

    #[test]
    fn field_queries_are_required_too() {
        assert_eq!(translate_query("type:lemma"), "+type:lemma");
    }
}
