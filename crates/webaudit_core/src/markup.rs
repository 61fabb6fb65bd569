//! Markup validity checker.
//!
//! The validator is a Java program that writes its JSON report to stderr.
//! [`MarkupAdapter`] normalizes the report into findings and applies the
//! severity threshold; code filters do not apply because markup messages have
//! no code.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::AdapterError;
use crate::finding::{Finding, Level};
use crate::severity::SeverityThreshold;

/// The validator's JSON report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidatorReport {
    #[serde(default)]
    pub messages: Vec<ValidatorMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidatorMessage {
    /// `error`, `info` or `non-document-error`.
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ValidatorReport {
    /// Parses the bytes the validator wrote to stderr.
    pub fn parse(output: &[u8]) -> Result<Self, AdapterError> {
        serde_json::from_slice(output).map_err(AdapterError::ValidatorOutput)
    }
}

/// A markup validator.
#[async_trait]
pub trait MarkupValidator: Send + Sync {
    async fn validate(&self, url: &str) -> Result<ValidatorReport, AdapterError>;
}

/// Runs `java -jar <jar> --format json <url>` and parses its stderr once the
/// process has exited. Any exit status triggers parsing.
#[derive(Debug, Clone)]
pub struct JarValidator {
    java: PathBuf,
    jar: PathBuf,
}

impl JarValidator {
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(&config.java, &config.validator_jar)
    }
}

#[async_trait]
impl MarkupValidator for JarValidator {
    async fn validate(&self, url: &str) -> Result<ValidatorReport, AdapterError> {
        let program = self.java.display().to_string();
        debug!("Running markup validator on {}", url);

        // `output()` waits for exit, so the child is always reaped before the
        // report is parsed.
        let output = Command::new(&self.java)
            .arg("-jar")
            .arg(&self.jar)
            .args(["--format", "json", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AdapterError::spawn(program, e))?;

        debug!("Markup validator exited with {}", output.status);
        ValidatorReport::parse(&output.stderr)
    }
}

/// Normalizes and filters markup validator results.
pub struct MarkupAdapter {
    validator: Arc<dyn MarkupValidator>,
    enabled: bool,
    threshold: SeverityThreshold,
}

impl MarkupAdapter {
    pub fn new(validator: Arc<dyn MarkupValidator>, config: &RunConfig) -> Self {
        Self {
            validator,
            enabled: config.markup,
            threshold: config.threshold,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Validates `url`. Returns no findings without spawning anything when
    /// markup validation is disabled.
    pub async fn check(&self, url: &str) -> Result<Vec<Finding>, AdapterError> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let report = self.validator.validate(url).await?;
        let total = report.messages.len();
        let findings: Vec<Finding> = report
            .messages
            .into_iter()
            .map(normalize)
            .filter(|f| self.threshold.accepts(&f.level))
            .collect();

        debug!(
            "Markup check of {} kept {} of {} messages",
            url,
            findings.len(),
            total
        );
        Ok(findings)
    }
}

fn normalize(message: ValidatorMessage) -> Finding {
    let context = message
        .extract
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    Finding::markup(
        Level::from_markup_type(&message.message_type),
        context,
        message.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::finding::FindingKind;
    use crate::test_utils::{ScriptedValidator, message};
    use pretty_assertions::assert_eq;

    fn config(options: RunOptions) -> RunConfig {
        RunConfig::from_options(options).unwrap()
    }

    #[test]
    fn test_parse_report() {
        let stderr = r#"{"url":"https://example.com/","messages":[
            {"type":"error","lastLine":3,"message":"Stray end tag “div”.","extract":"  </p></div>\n  "},
            {"type":"info","subType":"warning","message":"Consider adding a lang attribute."}
        ]}"#;
        let report = ValidatorReport::parse(stderr.as_bytes()).unwrap();

        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.messages[0].message_type, "error");
        assert_eq!(report.messages[1].extract, None);
    }

    #[test]
    fn test_parse_garbage_is_validator_error() {
        let err = ValidatorReport::parse(b"Exception in thread \"main\"").unwrap_err();
        assert!(matches!(err, AdapterError::ValidatorOutput(_)));
    }

    #[test]
    fn test_normalize() {
        let finding = normalize(ValidatorMessage {
            message_type: "info".to_string(),
            extract: Some("\n  <img src=a.png>  ".to_string()),
            message: "Missing alt".to_string(),
        });

        assert_eq!(
            finding,
            Finding {
                kind: FindingKind::Markup,
                level: Level::Notice,
                code: None,
                context: "<img src=a.png>".to_string(),
                selector: None,
                message: "Missing alt".to_string(),
            }
        );
    }

    #[test]
    fn test_normalize_without_extract() {
        let finding = normalize(ValidatorMessage {
            message_type: "error".to_string(),
            extract: None,
            message: "m".to_string(),
        });
        assert_eq!(finding.context, "");
        assert_eq!(finding.level, Level::Error);
    }

    #[tokio::test]
    async fn test_disabled_never_calls_validator() {
        let validator = Arc::new(ScriptedValidator::messages(vec![message("error", "x")]));
        let adapter = MarkupAdapter::new(
            validator.clone(),
            &config(RunOptions {
                standards: Some("WCAG2AA".to_string()),
                ..Default::default()
            }),
        );

        assert!(!adapter.is_enabled());
        assert!(adapter.check("https://example.com").await.unwrap().is_empty());
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn test_severity_filter_only() {
        let validator = Arc::new(ScriptedValidator::messages(vec![
            message("error", "Stray end tag"),
            message("info", "Consider lang"),
        ]));
        let adapter = MarkupAdapter::new(
            validator,
            &config(RunOptions {
                error_level: Some("error".to_string()),
                // Code filters must not touch markup findings.
                filter_by_codes: Some("H37".to_string()),
                ..Default::default()
            }),
        );

        let findings = adapter.check("https://example.com").await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Stray end tag");
        assert_eq!(findings[0].code, None);
    }

    #[tokio::test]
    async fn test_missing_java_is_spawn_error() {
        let validator = JarValidator::new("/nonexistent/bin/java", "vnu.jar");
        let err = validator.validate("https://example.com").await.unwrap_err();
        assert!(matches!(err, AdapterError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_report_is_read_from_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake_java = dir.path().join("java");
        std::fs::write(
            &fake_java,
            "#!/bin/sh\necho 'ignored' \necho '{\"messages\":[{\"type\":\"error\",\"message\":\"Bad\"}]}' >&2\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake_java, std::fs::Permissions::from_mode(0o755)).unwrap();

        let report = JarValidator::new(&fake_java, "vnu.jar")
            .validate("https://example.com")
            .await
            .unwrap();
        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.messages[0].message, "Bad");
    }
}
