//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;
use webaudit_core::RunOptions;

/// webaudit - Accessibility and markup auditor for web pages
#[derive(Parser, Debug)]
#[command(name = "webaudit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URLs to audit
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Report format (cli, csv, json, html)
    #[arg(short, long)]
    pub report: Option<String>,

    /// Output directory for the html report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated standards; HTML enables markup validation [default: WCAG2AA,HTML]
    #[arg(short, long)]
    pub standards: Option<String>,

    /// Sniffers script passed to the accessibility engine
    #[arg(long)]
    pub sniffers: Option<String>,

    /// Minimum level to report (notice, warning, error) [default: notice]
    #[arg(short, long)]
    pub error_level: Option<String>,

    /// Only report accessibility findings with one of these codes
    #[arg(long)]
    pub filter_by_codes: Option<String>,

    /// Drop accessibility findings with one of these codes
    #[arg(long)]
    pub exclude_by_codes: Option<String>,

    /// HTTP basic auth user name
    #[arg(long)]
    pub http_auth_user: Option<String>,

    /// HTTP basic auth password
    #[arg(long)]
    pub http_auth_password: Option<String>,

    /// Per-URL timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Number of URLs audited at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Options given on the command line. Unset flags stay `None` so that
    /// config file values show through.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            report: self.report.clone(),
            output: self.output.clone(),
            standards: self.standards.clone(),
            sniffers: self.sniffers.clone(),
            error_level: self.error_level.clone(),
            filter_by_codes: self.filter_by_codes.clone(),
            exclude_by_codes: self.exclude_by_codes.clone(),
            http_auth_user: self.http_auth_user.clone(),
            http_auth_password: self.http_auth_password.clone(),
            timeout: self.timeout,
            concurrency: self.concurrency,
            ..Default::default()
        }
    }
}
