//! Accessibility checker.
//!
//! [`AccessibilityEngine`] is the seam to the scanning engine; the default
//! [`CommandEngine`] drives the engine's command-line interface and reads its
//! JSON reporter output. [`AccessibilityAdapter`] normalizes and filters
//! whatever an engine returns.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::AdapterError;
use crate::filter::CodeFilters;
use crate::finding::{Finding, Level};
use crate::severity::SeverityThreshold;

/// Options handed to the accessibility engine for every page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub standard: String,
    pub allowed_standards: Vec<String>,
    #[serde(rename = "htmlcs", skip_serializing_if = "Option::is_none")]
    pub sniffers: Option<String>,
    pub page: PageOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageOptions {
    pub headers: BTreeMap<String, String>,
    pub settings: PageSettings,
}

/// Page-level settings; only basic-auth credentials are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl EngineOptions {
    /// Engine options for `config`, or `None` when no standard is selected.
    pub fn from_config(config: &RunConfig) -> Option<Self> {
        let standard = config.standard.clone()?;
        let settings = match &config.auth {
            Some(auth) => PageSettings {
                user_name: Some(auth.user_name.clone()),
                password: auth.password.clone(),
            },
            None => PageSettings::default(),
        };

        Some(Self {
            allowed_standards: vec![standard.clone()],
            standard,
            sniffers: config.sniffers.clone(),
            page: PageOptions {
                headers: config.headers.clone(),
                settings,
            },
        })
    }
}

/// One issue as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIssue {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    pub message: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: String,
}

/// An accessibility scanning engine.
#[async_trait]
pub trait AccessibilityEngine: Send + Sync {
    /// Scans `url` and returns the raw issues.
    async fn run(&self, url: &str, options: &EngineOptions) -> Result<Vec<RawIssue>, AdapterError>;
}

/// Runs the engine's CLI: `<program> --config <file> --reporter json <url>`.
///
/// The engine exits non-zero whenever it finds issues, so the exit status is
/// ignored and stdout decides.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn write_config(
        &self,
        options: &EngineOptions,
    ) -> Result<tempfile::NamedTempFile, AdapterError> {
        let mut file = tempfile::Builder::new()
            .prefix("webaudit-engine-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| AdapterError::spawn(&self.program, e))?;
        let json = serde_json::to_vec(options)
            .map_err(|e| AdapterError::engine(format!("Failed to encode engine options: {}", e)))?;
        file.write_all(&json)
            .and_then(|_| file.flush())
            .map_err(|e| AdapterError::spawn(&self.program, e))?;
        Ok(file)
    }
}

#[async_trait]
impl AccessibilityEngine for CommandEngine {
    async fn run(&self, url: &str, options: &EngineOptions) -> Result<Vec<RawIssue>, AdapterError> {
        // Kept alive until the engine has exited.
        let config_file = self.write_config(options)?;

        debug!("Running {} on {}", self.program, url);
        let output = Command::new(&self.program)
            .arg("--config")
            .arg(config_file.path())
            .args(["--reporter", "json", url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AdapterError::spawn(&self.program, e))?;

        parse_engine_output(&output.stdout).map_err(|e| {
            let stderr = String::from_utf8_lossy(&output.stderr);
            AdapterError::engine(format!("{} ({})", e, stderr.trim()))
        })
    }
}

fn parse_engine_output(stdout: &[u8]) -> Result<Vec<RawIssue>, serde_json::Error> {
    serde_json::from_slice(stdout)
}

/// Normalizes and filters accessibility engine results.
pub struct AccessibilityAdapter {
    engine: Arc<dyn AccessibilityEngine>,
    options: Option<EngineOptions>,
    threshold: SeverityThreshold,
    filters: CodeFilters,
}

impl AccessibilityAdapter {
    pub fn new(engine: Arc<dyn AccessibilityEngine>, config: &RunConfig) -> Self {
        Self {
            engine,
            options: EngineOptions::from_config(config),
            threshold: config.threshold,
            filters: config.filters.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.options.is_some()
    }

    /// Checks `url`. Returns no findings without calling the engine when no
    /// standard is configured.
    pub async fn check(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        let Some(options) = &self.options else {
            return Ok(Vec::new());
        };

        let issues = self.engine.run(url, options).await?;
        let total = issues.len();
        let findings: Vec<Finding> = issues
            .into_iter()
            .map(normalize)
            .filter(|f| self.threshold.accepts(&f.level) && self.filters.accepts(f.code.as_deref()))
            .collect();

        debug!(
            "Accessibility check of {} kept {} of {} issues",
            url,
            findings.len(),
            total
        );
        Ok(findings)
    }
}

fn normalize(issue: RawIssue) -> Finding {
    Finding::accessibility(
        Level::from_label(&issue.issue_type),
        issue.code,
        issue.context.unwrap_or_default(),
        issue.selector,
        issue.message,
    )
}
