//! CSV reporter. The header row is written once, before the first row.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{Reporter, Streams, write_locked};
use crate::error::AuditError;
use crate::finding::Finding;

const HEADER: [&str; 7] = ["url", "type", "level", "code", "context", "selector", "message"];

pub struct CsvReporter {
    streams: Streams,
    header_written: AtomicBool,
}

impl CsvReporter {
    pub fn new(streams: Streams) -> Self {
        Self {
            streams,
            header_written: AtomicBool::new(false),
        }
    }

    fn encode(findings: &[Finding], url: &str, header: bool) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        if header {
            writer.write_record(HEADER)?;
        }

        for finding in findings {
            writer.write_record([
                url,
                finding.kind.as_str(),
                finding.level.as_str(),
                finding.code.as_deref().unwrap_or_default(),
                finding.context.as_str(),
                finding.selector.as_deref().unwrap_or_default(),
                finding.message.as_str(),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

impl Reporter for CsvReporter {
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError> {
        // The header decision and the write share the output lock.
        let mut out = self.streams.lock_out()?;
        let header = !self.header_written.load(Ordering::SeqCst);
        let bytes = Self::encode(findings, url, header)
            .map_err(|e| AuditError::report(format!("Failed to write CSV: {}", e)))?;
        write_locked(&mut out, &bytes)?;
        self.header_written.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn error(&self, error: &AuditError) -> Result<(), AuditError> {
        self.streams.write_err(format!("{}\n", error).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Level;
    use std::sync::Arc;
    use crate::test_utils::{SharedBuffer, a11y_finding, markup_finding};

    #[test]
    fn test_header_once_and_quoting() {
        let out = SharedBuffer::default();
        let reporter = CsvReporter::new(Streams::new(out.clone(), SharedBuffer::default()));

        let mut finding = markup_finding(Level::Error, "Bad, very \"bad\"");
        finding.context = "<p>".to_string();
        reporter.results(&[finding], "https://a.example").unwrap();
        reporter
            .results(&[a11y_finding(Level::Notice, "H37")], "https://b.example")
            .unwrap();

        let text = out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "url,type,level,code,context,selector,message");
        assert_eq!(
            lines[1],
            r#"https://a.example,markup,error,,<p>,,"Bad, very ""bad""""#
        );
        assert!(lines[2].starts_with("https://b.example,accessibility,notice,H37,"));
    }

    #[test]
    fn test_header_precedes_rows_from_concurrent_callers() {
        let out = SharedBuffer::default();
        let reporter = Arc::new(CsvReporter::new(Streams::new(
            out.clone(),
            SharedBuffer::default(),
        )));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reporter = Arc::clone(&reporter);
                std::thread::spawn(move || {
                    let url = format!("https://{}.example", i);
                    reporter
                        .results(&[a11y_finding(Level::Error, "H37")], &url)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let text = out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "url,type,level,code,context,selector,message");
        assert_eq!(lines.iter().filter(|l| l.starts_with("url,")).count(), 1);
    }

    #[test]
    fn test_header_written_even_without_findings() {
        let out = SharedBuffer::default();
        let reporter = CsvReporter::new(Streams::new(out.clone(), SharedBuffer::default()));

        reporter.results(&[], "https://a.example").unwrap();
        assert_eq!(out.contents(), "url,type,level,code,context,selector,message\n");
    }
}
