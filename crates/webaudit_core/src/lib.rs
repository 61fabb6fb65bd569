//! # webaudit_core
//!
//! Accessibility and markup audit engine for webaudit.
//!
//! This crate provides:
//! - The `Auditor`, which runs both checkers per URL and merges their findings
//! - Adapters for the accessibility engine and the markup validator
//! - Severity and code filtering
//! - Reporters (cli, csv, json, html)
//!
//! ## Example
//!
//! ```rust,ignore
//! use webaudit_core::{Auditor, RunConfig, RunOptions};
//!
//! let config = RunConfig::from_options(RunOptions::from_file(".webaudit.json")?)?;
//! let auditor = Auditor::new(&config);
//!
//! let findings = auditor.run("https://example.com").await?;
//! println!("{} findings", findings.len());
//! ```

pub mod accessibility;
mod auditor;
mod config;
pub mod episode;
mod error;
mod filter;
mod finding;
pub mod markup;
pub mod reporter;
mod severity;

pub use accessibility::{AccessibilityAdapter, AccessibilityEngine, CommandEngine};
pub use auditor::{Auditor, UrlOutcome, checker_errors};
pub use config::{
    BasicAuth, CONFIG_FILE_NAME, MARKUP_STANDARD, ReporterKind, RunConfig, RunOptions, USER_AGENT,
};
pub use episode::{Checker, Episode, EpisodeState, Outcome};
pub use error::{AdapterError, AuditError, ConfigError};
pub use filter::{CodeFilter, CodeFilters};
pub use finding::{Finding, FindingKind, Level};
pub use markup::{JarValidator, MarkupAdapter, MarkupValidator};
pub use reporter::{Reporter, create_reporter};
pub use severity::{SeverityThreshold, rank};

#[cfg(test)]
pub mod test_utils;
