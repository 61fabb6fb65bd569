//! Reporting gateway.
//!
//! The auditor only ever calls [`Reporter::results`] and [`Reporter::error`]
//! (and [`Reporter::finish`] once after the last URL); it does not know which
//! variant it is talking to.

mod cli;
mod csv;
mod html;
mod json;

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use self::cli::CliReporter;
pub use self::csv::CsvReporter;
pub use self::html::HtmlReporter;
pub use self::json::JsonReporter;

use crate::config::ReporterKind;
use crate::error::AuditError;
use crate::finding::Finding;

/// Sink for merged results and errors.
pub trait Reporter: Send + Sync {
    /// Receives the merged findings of one URL.
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError>;

    /// Receives a failure.
    fn error(&self, error: &AuditError) -> Result<(), AuditError>;

    /// Called once after every URL has been reported.
    fn finish(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Creates the reporter selected in the configuration.
pub fn create_reporter(kind: ReporterKind, output_dir: &Path) -> Arc<dyn Reporter> {
    match kind {
        ReporterKind::Cli => Arc::new(CliReporter::new(Streams::stdio())),
        ReporterKind::Csv => Arc::new(CsvReporter::new(Streams::stdio())),
        ReporterKind::Json => Arc::new(JsonReporter::new(Streams::stdio())),
        ReporterKind::Html => Arc::new(HtmlReporter::new(output_dir)),
    }
}

type BoxWriter = Box<dyn Write + Send>;

/// Output and error streams shared by the stream-based reporters.
pub struct Streams {
    out: Mutex<BoxWriter>,
    err: Mutex<BoxWriter>,
}

impl Streams {
    pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            err: Mutex::new(Box::new(err)),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    fn write_out(&self, bytes: &[u8]) -> Result<(), AuditError> {
        write_locked(&mut *lock(&self.out)?, bytes)
    }

    /// Holds the output stream for a sequence of writes.
    fn lock_out(&self) -> Result<MutexGuard<'_, BoxWriter>, AuditError> {
        lock(&self.out)
    }

    fn write_err(&self, bytes: &[u8]) -> Result<(), AuditError> {
        write_locked(&mut *lock(&self.err)?, bytes)
    }
}

fn lock(writer: &Mutex<BoxWriter>) -> Result<MutexGuard<'_, BoxWriter>, AuditError> {
    writer
        .lock()
        .map_err(|_| AuditError::report("Output stream mutex poisoned"))
}

fn write_locked(writer: &mut BoxWriter, bytes: &[u8]) -> Result<(), AuditError> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
