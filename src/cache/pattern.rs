//! Key pattern matching for the in-process store.
//!
//! `*` splits a pattern into literal fragments. A key matches when every fragment
//! occurs in it, in order, anywhere (the match is not anchored). For the common
//! trailing-wildcard form (`alumni:list:*`) this is plain substring containment of
//! the pattern without its wildcard. Every key a glob would match also matches
//! here, so the in-process store may over-invalidate but never keeps an entry a
//! glob would have cleared.

/// Compiled form of a `*` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    fragments: Vec<String>,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Self {
        let fragments = pattern
            .split('*')
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string)
            .collect();
        Self { fragments }
    }

    /// True when the pattern has no literal text and therefore matches every key.
    pub fn matches_all(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn matches(&self, key: &str) -> bool {
        let mut rest = key;
        for fragment in &self.fragments {
            match rest.find(fragment.as_str()) {
                Some(at) => rest = &rest[at + fragment.len()..],
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_wildcard_is_substring() {
        let pattern = KeyPattern::new("alumni:list:*");

        assert!(pattern.matches("alumni:list:1:{}"));
        assert!(pattern.matches("alumni:list:"));
        assert!(!pattern.matches("alumni:profile:1"));
    }

    #[test]
    fn test_unanchored_match_over_invalidates() {
        let pattern = KeyPattern::new("alumni:list:*");
        assert!(pattern.matches("search:alumni:list:1"));
    }

    #[test]
    fn test_inner_wildcard_keeps_fragment_order() {
        let pattern = KeyPattern::new("alumni:*:5");

        assert!(pattern.matches("alumni:list:5"));
        assert!(pattern.matches("alumni:5:list:5"));
        assert!(!pattern.matches("5:list:alumni:"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        let pattern = KeyPattern::new("*");

        assert!(pattern.matches_all());
        assert!(pattern.matches("anything"));
        assert!(pattern.matches(""));
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = KeyPattern::new("user:profile:7");

        assert!(pattern.matches("user:profile:7"));
        assert!(pattern.matches("user:profile:77"));
        assert!(!pattern.matches("user:profile:8"));
    }
}
