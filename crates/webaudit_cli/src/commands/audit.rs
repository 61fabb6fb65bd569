//! Audit command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};
use webaudit_core::{Auditor, RunConfig, RunOptions, UrlOutcome};

use crate::cli::Cli;

/// Audits every URL on the command line.
///
/// Returns `true` when any URL failed or any error-level finding was reported.
pub fn run_audit(cli: &Cli) -> Result<bool> {
    let file_options = load_options(cli.config.as_deref())?;
    let options = cli.run_options().merge(file_options);
    let config = RunConfig::from_options(options).into_diagnostic()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    let auditor = Auditor::new(&config);
    let outcomes = runtime.block_on(auditor.run_all(&cli.urls));

    Ok(summarize(&outcomes))
}

fn load_options(explicit: Option<&Path>) -> Result<RunOptions> {
    if let Some(path) = explicit {
        info!("Using config {}", path.display());
        return RunOptions::from_file(path).into_diagnostic();
    }

    let cwd = std::env::current_dir().into_diagnostic()?;
    match RunOptions::discover(&cwd) {
        Some(path) => {
            info!("Using config {}", path.display());
            RunOptions::from_file(&path).into_diagnostic()
        }
        None => {
            debug!("No config file found in {}", cwd.display());
            Ok(RunOptions::default())
        }
    }
}

fn summarize(outcomes: &[UrlOutcome]) -> bool {
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let with_errors = outcomes.iter().filter(|o| o.has_errors()).count();

    if failed > 0 {
        info!("{} of {} URL(s) could not be audited", failed, outcomes.len());
    }
    if with_errors > 0 {
        info!("{} URL(s) have error-level findings", with_errors);
    }
    failed > 0 || with_errors > 0
}
