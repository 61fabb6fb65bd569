//! Audit configuration.
//!
//! [`RunOptions`] is the loose, user-facing shape (config file or CLI flags).
//! [`RunConfig`] is the validated, immutable form an [`Auditor`](crate::Auditor)
//! is built from.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::filter::CodeFilters;
use crate::severity::SeverityThreshold;

/// Standard name that enables the markup validator.
pub const MARKUP_STANDARD: &str = "HTML";

/// User-Agent sent by the accessibility engine.
pub const USER_AGENT: &str = concat!("webaudit/", env!("CARGO_PKG_VERSION"));

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".webaudit.json";

const DEFAULT_STANDARDS: &str = "WCAG2AA,HTML";
const DEFAULT_ERROR_LEVEL: &str = "notice";
const DEFAULT_ENGINE_COMMAND: &str = "pa11y";
const DEFAULT_JAVA: &str = "java";
const DEFAULT_VALIDATOR_JAR: &str = "resource/vnu/vnu.jar";
const DEFAULT_OUTPUT_DIR: &str = "a11y_report";

/// Reporter variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    /// Human-readable text on stdout.
    #[default]
    Cli,
    /// CSV rows on stdout.
    Csv,
    /// One JSON document per URL on stdout.
    Json,
    /// HTML pages written to the output directory.
    Html,
}

impl FromStr for ReporterKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(ReporterKind::Cli),
            "csv" => Ok(ReporterKind::Csv),
            "json" => Ok(ReporterKind::Json),
            "html" => Ok(ReporterKind::Html),
            _ => Err(ConfigError::UnknownReporter(s.to_string())),
        }
    }
}

/// Audit options as written in `.webaudit.json` or passed on the command line.
///
/// Every field is optional; [`RunOptions::merge`] layers one set over another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunOptions {
    /// Report format: cli, csv, json or html.
    pub report: Option<String>,
    /// Output directory for the html report.
    pub output: Option<PathBuf>,
    /// Comma-separated standards; `HTML` enables markup validation.
    pub standards: Option<String>,
    /// Path to the sniffers script handed to the accessibility engine.
    pub sniffers: Option<String>,
    /// Minimum level: notice, warning or error.
    pub error_level: Option<String>,
    /// Only keep accessibility findings whose code matches one of these.
    pub filter_by_codes: Option<String>,
    /// Drop accessibility findings whose code matches one of these.
    pub exclude_by_codes: Option<String>,
    pub http_auth_user: Option<String>,
    pub http_auth_password: Option<String>,
    /// Extra request headers for the accessibility engine.
    pub headers: Option<BTreeMap<String, String>>,
    /// Accessibility engine executable.
    pub engine_command: Option<String>,
    /// Java executable used to run the markup validator.
    pub java: Option<PathBuf>,
    /// Markup validator jar.
    pub validator_jar: Option<PathBuf>,
    /// Per-URL timeout in seconds.
    pub timeout: Option<u64>,
    /// Number of URLs audited at once.
    pub concurrency: Option<usize>,
}

impl RunOptions {
    /// Loads options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Looks for [`CONFIG_FILE_NAME`] in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Returns `self` with every unset field taken from `base`.
    pub fn merge(self, base: RunOptions) -> RunOptions {
        RunOptions {
            report: self.report.or(base.report),
            output: self.output.or(base.output),
            standards: self.standards.or(base.standards),
            sniffers: self.sniffers.or(base.sniffers),
            error_level: self.error_level.or(base.error_level),
            filter_by_codes: self.filter_by_codes.or(base.filter_by_codes),
            exclude_by_codes: self.exclude_by_codes.or(base.exclude_by_codes),
            http_auth_user: self.http_auth_user.or(base.http_auth_user),
            http_auth_password: self.http_auth_password.or(base.http_auth_password),
            headers: self.headers.or(base.headers),
            engine_command: self.engine_command.or(base.engine_command),
            java: self.java.or(base.java),
            validator_jar: self.validator_jar.or(base.validator_jar),
            timeout: self.timeout.or(base.timeout),
            concurrency: self.concurrency.or(base.concurrency),
        }
    }
}

/// HTTP basic-auth credentials for the audited pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user_name: String,
    pub password: Option<String>,
}

/// Validated, immutable audit configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Accessibility standard; `None` disables the accessibility checker.
    pub standard: Option<String>,
    /// Whether the markup validator runs.
    pub markup: bool,
    pub sniffers: Option<String>,
    pub threshold: SeverityThreshold,
    pub filters: CodeFilters,
    pub auth: Option<BasicAuth>,
    /// Request headers, including the fixed User-Agent.
    pub headers: BTreeMap<String, String>,
    pub reporter: ReporterKind,
    pub output_dir: PathBuf,
    pub engine_command: String,
    pub java: PathBuf,
    pub validator_jar: PathBuf,
    pub timeout: Option<Duration>,
    pub concurrency: usize,
}

impl RunConfig {
    /// Validates options. Filters and the reporter are checked here so that a
    /// bad pattern never surfaces mid-run.
    pub fn from_options(options: RunOptions) -> Result<Self, ConfigError> {
        let reporter = options
            .report
            .as_deref()
            .map(ReporterKind::from_str)
            .transpose()?
            .unwrap_or_default();

        let (standard, markup) =
            parse_standards(options.standards.as_deref().unwrap_or(DEFAULT_STANDARDS))?;

        let threshold = SeverityThreshold::from_label(
            options.error_level.as_deref().unwrap_or(DEFAULT_ERROR_LEVEL),
        );

        let filters = CodeFilters::new(
            options.filter_by_codes.as_deref(),
            options.exclude_by_codes.as_deref(),
        )?;

        let auth = match (options.http_auth_user, options.http_auth_password) {
            (Some(user_name), password) => Some(BasicAuth {
                user_name,
                password,
            }),
            (None, Some(_)) => {
                return Err(ConfigError::invalid(
                    "httpAuthPassword requires httpAuthUser",
                ));
            }
            (None, None) => None,
        };

        let mut headers = options.headers.unwrap_or_default();
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());

        let concurrency = options.concurrency.unwrap_or(1);
        if concurrency == 0 {
            return Err(ConfigError::invalid("concurrency must be at least 1"));
        }

        let timeout = match options.timeout {
            Some(0) => return Err(ConfigError::invalid("timeout must be at least 1 second")),
            other => other.map(Duration::from_secs),
        };

        let config = Self {
            standard,
            markup,
            sniffers: options.sniffers,
            threshold,
            filters,
            auth,
            headers,
            reporter,
            output_dir: options
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            engine_command: options
                .engine_command
                .unwrap_or_else(|| DEFAULT_ENGINE_COMMAND.to_string()),
            java: options.java.unwrap_or_else(|| PathBuf::from(DEFAULT_JAVA)),
            validator_jar: options
                .validator_jar
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VALIDATOR_JAR)),
            timeout,
            concurrency,
        };
        debug!(
            standard = ?config.standard,
            markup = config.markup,
            min_level = config.threshold.minimum(),
            reporter = ?config.reporter,
            "Built run configuration"
        );
        Ok(config)
    }
}

/// Splits a standards list into the accessibility standard and the markup flag.
fn parse_standards(list: &str) -> Result<(Option<String>, bool), ConfigError> {
    let mut markup = false;
    let mut accessibility = Vec::new();

    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if name == MARKUP_STANDARD {
            markup = true;
        } else {
            accessibility.push(name);
        }
    }

    match accessibility.as_slice() {
        [] => Ok((None, markup)),
        [standard] => Ok((Some(standard.to_string()), markup)),
        many => Err(ConfigError::invalid(format!(
            "only one accessibility standard can be audited at a time, got {}",
            many.join(", ")
        ))),
    }
}
