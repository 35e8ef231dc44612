//! Declarative list-query building blocks.
//!
//! # Responsibility
//! - Normalize client paging input into a concrete [`page::Page`].
//! - Resolve client sort tokens into deterministic SQL orderings.
//! - Build safe `LIKE` patterns for keyword filters.
//!
//! # Invariants
//! - Every ordering ends with an id tie-break, so pages never overlap.
//! - Unknown sort tokens never fail a request.

pub mod page;
pub mod sort;

/// Escape character used by [`contains_pattern`]; pair with `ESCAPE '\'`.
pub const LIKE_ESCAPE: char = '\\';

/// Builds a `LIKE` pattern matching `keyword` anywhere in a column.
///
/// `%`, `_` and the escape character itself are escaped so user input is
/// matched literally.
pub fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
