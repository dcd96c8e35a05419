//! Wildcard key patterns
//!
//! `*` matches any substring (including empty), matching is case-insensitive
//! and anchored at both ends. Every other character is literal.

use regex::{Regex, RegexBuilder};

use crate::error::{CacheError, CacheResult};

/// Compiled wildcard pattern over cache keys.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compiles `pattern`; an empty pattern is rejected.
    pub fn new(pattern: &str) -> CacheResult<Self> {
        if pattern.is_empty() {
            return Err(CacheError::InvalidPattern("pattern is empty".to_string()));
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = RegexBuilder::new(&format!("^{}$", body))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| CacheError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The pattern as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
