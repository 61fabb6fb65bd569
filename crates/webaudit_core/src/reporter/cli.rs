//! Human-readable text reporter.

use std::fmt::Write as _;

use super::{Reporter, Streams};
use crate::error::AuditError;
use crate::finding::{Finding, Level};

pub struct CliReporter {
    streams: Streams,
}

impl CliReporter {
    pub fn new(streams: Streams) -> Self {
        Self { streams }
    }
}

impl Reporter for CliReporter {
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError> {
        self.streams
            .write_out(format_results(findings, url).as_bytes())
    }

    fn error(&self, error: &AuditError) -> Result<(), AuditError> {
        self.streams
            .write_err(format!("\nError: {}\n", error).as_bytes())
    }
}

fn format_results(findings: &[Finding], url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}:", url);

    for finding in findings {
        let code = finding.code.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "  {} [{}] {}: {}",
            finding.level, finding.kind, code, finding.message
        );
        if let Some(selector) = &finding.selector {
            let _ = writeln!(out, "      {}", selector);
        }
        if !finding.context.is_empty() {
            let _ = writeln!(out, "      {}", finding.context.replace('\n', " "));
        }
    }

    let count = |level: Level| findings.iter().filter(|f| f.level == level).count();
    let _ = writeln!(
        out,
        "\nFound {} issues ({} errors, {} warnings, {} notices)",
        findings.len(),
        count(Level::Error),
        count(Level::Warning),
        count(Level::Notice)
    );
    out
}
