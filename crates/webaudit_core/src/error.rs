//! Audit error types.

use thiserror::Error;

use crate::finding::Finding;

/// Errors raised while building a [`RunConfig`](crate::RunConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A filter pattern could not be turned into a code predicate.
    #[error("Invalid {kind} filter '{pattern}': {reason}")]
    Filter {
        kind: &'static str,
        pattern: String,
        reason: String,
    },

    /// The requested report format is not one of the known reporters.
    #[error("Unknown report format: {0} (expected one of cli, csv, json, html)")]
    UnknownReporter(String),

    /// Any other invalid option.
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON.
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a generic configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Failure of a single checker.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The accessibility engine reported an error.
    #[error("Accessibility engine error: {0}")]
    Engine(String),

    /// The markup validator produced output that is not a JSON report.
    #[error("Markup validator output is not valid JSON: {0}")]
    ValidatorOutput(#[source] serde_json::Error),

    /// A checker subprocess could not be started or awaited.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    /// Creates an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Creates a spawn error for `program`.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}

/// Errors returned by an audit run for one URL.
#[derive(Debug, Error)]
pub enum AuditError {
    /// One or both checkers failed. Findings from the checker that succeeded
    /// are kept in `findings`.
    #[error("Audit of {url} failed: {}", join_errors(.errors))]
    Checkers {
        url: String,
        findings: Vec<Finding>,
        errors: Vec<AdapterError>,
    },

    /// A checker task panicked or was cancelled.
    #[error("Fatal error while auditing {url}: {message}")]
    Fatal { url: String, message: String },

    /// The audit did not finish in time.
    #[error("Audit of {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// Writing a report failed.
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    /// Creates a fatal error for `url`.
    pub fn fatal(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a report error.
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }

    /// URL the error belongs to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Checkers { url, .. } | Self::Fatal { url, .. } | Self::Timeout { url, .. } => {
                Some(url)
            }
            Self::Report(_) | Self::Io(_) => None,
        }
    }

    /// Whether the error ended the episode without both checkers reporting.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. } | Self::Timeout { .. })
    }
}

fn join_errors(errors: &[AdapterError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
