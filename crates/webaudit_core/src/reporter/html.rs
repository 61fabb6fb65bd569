//! HTML reporter.
//!
//! Accumulates across URLs: every URL gets its own page in the output
//! directory, and [`Reporter::finish`] writes `index.html` linking them all.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use super::Reporter;
use crate::error::AuditError;
use crate::finding::{Finding, Level};

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
enum PageEntry {
    Audited {
        url: String,
        file: String,
        errors: usize,
        warnings: usize,
        notices: usize,
    },
    Failed {
        url: Option<String>,
        message: String,
    },
}

pub struct HtmlReporter {
    output_dir: PathBuf,
    entries: Mutex<Vec<PageEntry>>,
}

impl HtmlReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn lock_entries(&self) -> Result<std::sync::MutexGuard<'_, Vec<PageEntry>>, AuditError> {
        self.entries
            .lock()
            .map_err(|_| AuditError::report("HTML report mutex poisoned"))
    }
}

impl Reporter for HtmlReporter {
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError> {
        fs::create_dir_all(&self.output_dir)?;

        let mut entries = self.lock_entries()?;
        let file = format!("{:03}-{}.html", entries.len() + 1, slug(url));
        fs::write(self.output_dir.join(&file), render_page(findings, url))?;

        let count = |level: Level| findings.iter().filter(|f| f.level == level).count();
        entries.push(PageEntry::Audited {
            url: url.to_string(),
            file,
            errors: count(Level::Error),
            warnings: count(Level::Warning),
            notices: count(Level::Notice),
        });
        Ok(())
    }

    fn error(&self, error: &AuditError) -> Result<(), AuditError> {
        self.lock_entries()?.push(PageEntry::Failed {
            url: error.url().map(str::to_string),
            message: error.to_string(),
        });
        Ok(())
    }

    fn finish(&self) -> Result<(), AuditError> {
        fs::create_dir_all(&self.output_dir)?;
        let entries = self.lock_entries()?;
        let index = self.output_dir.join(INDEX_FILE);
        fs::write(&index, render_index(&entries))?;
        info!("HTML report written to {}", index.display());
        Ok(())
    }
}

fn slug(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let slug: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(80)
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "page".to_string()
    } else {
        slug.to_string()
    }
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}

fn render_page(findings: &[Finding], url: &str) -> String {
    let url = escape_html(url);
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(html, "<head><meta charset=\"utf-8\"><title>Audit of {}</title></head>", url);
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>Audit of <a href=\"{0}\">{0}</a></h1>", url);
    let _ = writeln!(html, "<p><a href=\"{}\">Back to index</a></p>", INDEX_FILE);

    if findings.is_empty() {
        let _ = writeln!(html, "<p>No issues found.</p>");
    } else {
        let _ = writeln!(html, "<table>");
        let _ = writeln!(
            html,
            "<thead><tr><th>Level</th><th>Type</th><th>Code</th><th>Message</th><th>Selector</th><th>Context</th></tr></thead>"
        );
        let _ = writeln!(html, "<tbody>");
        for finding in findings {
            let _ = writeln!(
                html,
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><code>{}</code></td></tr>",
                escape_html(finding.level.as_str()),
                escape_html(finding.level.as_str()),
                finding.kind,
                escape_html(finding.code.as_deref().unwrap_or_default()),
                escape_html(&finding.message),
                escape_html(finding.selector.as_deref().unwrap_or_default()),
                escape_html(&finding.context),
            );
        }
        let _ = writeln!(html, "</tbody>");
        let _ = writeln!(html, "</table>");
    }

    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

fn render_index(entries: &[PageEntry]) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(html, "<head><meta charset=\"utf-8\"><title>Audit report</title></head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>Audit report</h1>");
    let _ = writeln!(html, "<ul>");
    for entry in entries {
        match entry {
            PageEntry::Audited {
                url,
                file,
                errors,
                warnings,
                notices,
            } => {
                let _ = writeln!(
                    html,
                    "<li><a href=\"{}\">{}</a>: {} errors, {} warnings, {} notices</li>",
                    escape_html(file),
                    escape_html(url),
                    errors,
                    warnings,
                    notices
                );
            }
            PageEntry::Failed { url, message } => {
                let _ = writeln!(
                    html,
                    "<li class=\"failed\">{}: {}</li>",
                    escape_html(url.as_deref().unwrap_or("run")),
                    escape_html(message)
                );
            }
        }
    }
    let _ = writeln!(html, "</ul>");
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}
