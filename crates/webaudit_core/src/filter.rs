//! Include/exclude filtering by diagnostic code.
//!
//! A pattern is a list of codes separated by commas and/or whitespace. A code
//! matches when it appears in a finding's code as a whole word, ignoring case:
//! `1_1` matches `WCAG2AA.1_1.title` but not `WCAG2AA.1_12.title`.

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

/// Case-insensitive whole-word matcher built from a code list.
#[derive(Debug, Clone)]
pub struct CodeFilter {
    pattern: String,
    regex: Regex,
}

impl CodeFilter {
    /// Builds a matcher from a raw pattern. `kind` only labels errors.
    pub fn new(kind: &'static str, pattern: &str) -> Result<Self, ConfigError> {
        let codes: Vec<String> = pattern
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|code| !code.is_empty())
            .map(regex::escape)
            .collect();

        if codes.is_empty() {
            return Err(ConfigError::Filter {
                kind,
                pattern: pattern.to_string(),
                reason: "no codes given".to_string(),
            });
        }

        let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", codes.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::Filter {
                kind,
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, code: &str) -> bool {
        self.regex.is_match(code)
    }
}

/// The include and exclude predicates applied to accessibility findings.
#[derive(Debug, Clone, Default)]
pub struct CodeFilters {
    include: Option<CodeFilter>,
    exclude: Option<CodeFilter>,
}

impl CodeFilters {
    /// Builds both predicates. Absent patterns leave the predicate inactive.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            include: include.map(|p| CodeFilter::new("include", p)).transpose()?,
            exclude: exclude.map(|p| CodeFilter::new("exclude", p)).transpose()?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.include.is_some() || self.exclude.is_some()
    }

    /// Include predicate. A missing code never satisfies an active include list.
    pub fn included(&self, code: Option<&str>) -> bool {
        match (&self.include, code) {
            (None, _) => true,
            (Some(filter), Some(code)) => filter.matches(code),
            (Some(_), None) => false,
        }
    }

    /// Exclude predicate. A missing code cannot match an exclude list.
    pub fn not_excluded(&self, code: Option<&str>) -> bool {
        match (&self.exclude, code) {
            (Some(filter), Some(code)) => !filter.matches(code),
            _ => true,
        }
    }

    pub fn accepts(&self, code: Option<&str>) -> bool {
        self.included(code) && self.not_excluded(code)
    }
}
