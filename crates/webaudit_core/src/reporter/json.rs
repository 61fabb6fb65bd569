//! JSON reporter: one pretty-printed document per URL.

use serde::Serialize;

use super::{Reporter, Streams};
use crate::error::AuditError;
use crate::finding::Finding;

#[derive(Serialize)]
struct PageReport<'a> {
    url: &'a str,
    findings: &'a [Finding],
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    url: Option<&'a str>,
    error: String,
}

pub struct JsonReporter {
    streams: Streams,
}

impl JsonReporter {
    pub fn new(streams: Streams) -> Self {
        Self { streams }
    }
}

impl Reporter for JsonReporter {
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError> {
        let mut json = serde_json::to_string_pretty(&PageReport { url, findings })
            .map_err(|e| AuditError::report(format!("Failed to encode JSON: {}", e)))?;
        json.push('\n');
        self.streams.write_out(json.as_bytes())
    }

    fn error(&self, error: &AuditError) -> Result<(), AuditError> {
        let mut json = serde_json::to_string(&ErrorReport {
            url: error.url(),
            error: error.to_string(),
        })
        .map_err(|e| AuditError::report(format!("Failed to encode JSON: {}", e)))?;
        json.push('\n');
        self.streams.write_err(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Level;
    use crate::test_utils::{SharedBuffer, a11y_finding};

    #[test]
    fn test_results_document() {
        let out = SharedBuffer::default();
        let reporter = JsonReporter::new(Streams::new(out.clone(), SharedBuffer::default()));

        reporter
            .results(&[a11y_finding(Level::Error, "H37")], "https://example.com")
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["findings"][0]["type"], "accessibility");
        assert_eq!(value["findings"][0]["code"], "H37");
    }

    #[test]
    fn test_error_document() {
        let err = SharedBuffer::default();
        let reporter = JsonReporter::new(Streams::new(SharedBuffer::default(), err.clone()));

        reporter
            .error(&AuditError::Timeout {
                url: "https://example.com".to_string(),
                seconds: 5,
            })
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&err.contents()).unwrap();
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["error"], "Audit of https://example.com timed out after 5s");
    }
}
