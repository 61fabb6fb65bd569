//! Normalized audit findings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::severity;

/// Checker a finding originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// Produced by the accessibility engine.
    Accessibility,
    /// Produced by the markup validator.
    Markup,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Accessibility => "accessibility",
            FindingKind::Markup => "markup",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity label of a finding.
///
/// Labels other than `error`, `warning` and `notice` are kept verbatim in
/// [`Level::Other`] and rank below every known level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    Error,
    Warning,
    Notice,
    Other(String),
}

impl Level {
    /// Parses a raw label. Matching is exact, as the checkers emit lowercase.
    pub fn from_label(label: &str) -> Self {
        match label {
            "error" => Level::Error,
            "warning" => Level::Warning,
            "notice" => Level::Notice,
            other => Level::Other(other.to_string()),
        }
    }

    /// Maps a markup validator message type: `info` becomes `notice`.
    pub fn from_markup_type(message_type: &str) -> Self {
        match message_type {
            "info" => Level::Notice,
            other => Level::from_label(other),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Notice => "notice",
            Level::Other(label) => label,
        }
    }

    /// Ordinal rank used for threshold filtering.
    pub fn rank(&self) -> u8 {
        severity::rank(self.as_str())
    }
}

impl From<String> for Level {
    fn from(label: String) -> Self {
        Level::from_label(&label)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic from either checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Checker that produced the finding.
    #[serde(rename = "type")]
    pub kind: FindingKind,

    /// Severity level.
    pub level: Level,

    /// Rule identifier, e.g. `WCAG2AA.Principle1.Guideline1_1.1_1_1.H37`.
    pub code: Option<String>,

    /// Markup excerpt the finding refers to.
    pub context: String,

    /// Location of the offending element, e.g. `html > body > img`.
    pub selector: Option<String>,

    /// Human-readable description.
    pub message: String,
}

impl Finding {
    /// Creates an accessibility finding. A missing code or selector stays
    /// `None`.
    pub fn accessibility(
        level: Level,
        code: Option<String>,
        context: impl Into<String>,
        selector: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: FindingKind::Accessibility,
            level,
            code,
            context: context.into(),
            selector,
            message: message.into(),
        }
    }

    /// Creates a markup finding. Markup findings carry no code and no selector.
    pub fn markup(level: Level, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::Markup,
            level,
            code: None,
            context: context.into(),
            selector: None,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}
