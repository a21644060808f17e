//! SQL `LIKE`/`ILIKE` pattern matching for in-process stores.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::store::StoreError;

/// A compiled LIKE pattern.
///
/// Supports the following wildcards:
/// - `%` matches zero or more characters
/// - `_` matches exactly one character
/// - `\%` and `\_` match literal `%` and `_` characters
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    regex: Arc<Regex>,
}

impl LikePattern {
    /// Compile a pattern. `case_insensitive` selects ILIKE semantics.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, StoreError> {
        let regex = Self::compile_pattern(pattern, case_insensitive)?;
        Ok(LikePattern {
            pattern: pattern.to_string(),
            regex: Arc::new(regex),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn compile_pattern(pattern: &str, case_insensitive: bool) -> Result<Regex, StoreError> {
        let mut regex_pattern = String::from("^");
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => regex_pattern.push_str(&regex::escape(&escaped.to_string())),
                    None => regex_pattern.push_str(r"\\"),
                },
                '%' => regex_pattern.push_str(".*"),
                '_' => regex_pattern.push('.'),
                other => regex_pattern.push_str(&regex::escape(&other.to_string())),
            }
        }
        regex_pattern.push('$');

        RegexBuilder::new(&regex_pattern)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| StoreError::new(format!("invalid LIKE pattern '{pattern}': {e}")))
    }

    /// Check if a text value matches the pattern.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_wildcards() {
        let prefix = LikePattern::new("etx%", true).unwrap();
        assert!(prefix.matches("etxe"));
        assert!(prefix.matches("ETXEA"));
        assert!(!prefix.matches("betxe"));

        let suffix = LikePattern::new("%tasun", true).unwrap();
        assert!(suffix.matches("osasuntasun"));
        assert!(!suffix.matches("tasuna"));

        let single = LikePattern::new("e_xe", true).unwrap();
        assert!(single.matches("etxe"));
        assert!(!single.matches("ettxe"));
    }

    #[test]
    fn test_like_exact_and_escapes() {
        let exact = LikePattern::new("etxe", true).unwrap();
        assert!(exact.matches("Etxe"));
        assert!(!exact.matches("etxea"));

        let literal = LikePattern::new(r"100\%", false).unwrap();
        assert!(literal.matches("100%"));
        assert!(!literal.matches("1000"));
    }

    #[test]
    fn test_like_regex_metacharacters_are_literal() {
        let pattern = LikePattern::new("a.b(c)%", true).unwrap();
        assert!(pattern.matches("a.b(c)d"));
        assert!(!pattern.matches("axb(c)d"));
    }

    #[test]
    fn test_case_sensitive_like() {
        let pattern = LikePattern::new("Etx%", false).unwrap();
        assert!(pattern.matches("Etxe"));
        assert!(!pattern.matches("etxe"));
    }
}
