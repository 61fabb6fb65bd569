//! Runs both checkers per URL and delivers one merged result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::accessibility::{AccessibilityAdapter, AccessibilityEngine, CommandEngine};
use crate::config::RunConfig;
use crate::episode::{Checker, Episode, Outcome};
use crate::error::{AdapterError, AuditError};
use crate::finding::Finding;
use crate::markup::{JarValidator, MarkupAdapter, MarkupValidator};
use crate::reporter::{Reporter, create_reporter};

/// Result of auditing one URL.
#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: Result<Vec<Finding>, AuditError>,
}

impl UrlOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether an error-level finding was reported for this URL.
    pub fn has_errors(&self) -> bool {
        match &self.result {
            Ok(findings) => findings.iter().any(Finding::is_error),
            Err(AuditError::Checkers { findings, .. }) => findings.iter().any(Finding::is_error),
            Err(_) => false,
        }
    }
}

/// The audit engine.
///
/// Built once from a [`RunConfig`]; [`Auditor::run`] can be called for any
/// number of URLs, each call being an isolated episode.
pub struct Auditor {
    accessibility: Arc<AccessibilityAdapter>,
    markup: Arc<MarkupAdapter>,
    reporter: Arc<dyn Reporter>,
    timeout: Option<Duration>,
    concurrency: usize,
}

impl Auditor {
    /// Creates an auditor with the command-line engine, the jar validator and
    /// the configured reporter.
    pub fn new(config: &RunConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(CommandEngine::new(&config.engine_command)),
            Arc::new(JarValidator::from_config(config)),
            create_reporter(config.reporter, &config.output_dir),
        )
    }

    pub fn with_collaborators(
        config: &RunConfig,
        engine: Arc<dyn AccessibilityEngine>,
        validator: Arc<dyn MarkupValidator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            accessibility: Arc::new(AccessibilityAdapter::new(engine, config)),
            markup: Arc::new(MarkupAdapter::new(validator, config)),
            reporter,
            timeout: config.timeout,
            concurrency: config.concurrency,
        }
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Audits one URL.
    ///
    /// Both checkers run concurrently. The result is delivered once both have
    /// reported: merged findings on success, or [`AuditError::Checkers`]
    /// carrying the errors and the findings of the checker that succeeded.
    /// A panicking checker ends the episode with [`AuditError::Fatal`].
    pub async fn run(&self, url: &str) -> Result<Vec<Finding>, AuditError> {
        debug!("Auditing {}", url);

        // Dropping the set aborts whatever is still running.
        let mut tasks = JoinSet::new();
        let mut checkers = HashMap::new();

        let accessibility = Arc::clone(&self.accessibility);
        let target = url.to_string();
        let handle = tasks.spawn(async move { accessibility.check(&target).await });
        checkers.insert(handle.id(), Checker::Accessibility);

        let markup = Arc::clone(&self.markup);
        let target = url.to_string();
        let handle = tasks.spawn(async move { markup.check(&target).await });
        checkers.insert(handle.id(), Checker::Markup);

        let mut episode = Episode::new(url);
        while let Some(joined) = tasks.join_next_with_id().await {
            let (checker, result) = match joined {
                Ok((id, result)) => match checkers.get(&id) {
                    Some(&checker) => (checker, result),
                    None => continue,
                },
                Err(join_error) => {
                    let checker = checkers.get(&join_error.id()).copied();
                    let reason = if join_error.is_panic() {
                        "panicked"
                    } else {
                        "was cancelled"
                    };
                    let message = match checker {
                        Some(checker) => format!("{} checker {}", checker, reason),
                        None => format!("checker {}", reason),
                    };
                    let err = AuditError::fatal(url, message);
                    self.report_error(&err);
                    return Err(err);
                }
            };

            if let Some(outcome) = episode.complete(checker, result) {
                return self.deliver(url, outcome);
            }
        }

        let err = AuditError::fatal(
            url,
            format!("episode ended with {:?} outstanding", episode.outstanding()),
        );
        self.report_error(&err);
        Err(err)
    }

    /// Like [`Auditor::run`], but gives up after `limit`. Expiry aborts both
    /// checkers and only affects this URL.
    pub async fn run_with_timeout(
        &self,
        url: &str,
        limit: Duration,
    ) -> Result<Vec<Finding>, AuditError> {
        match tokio::time::timeout(limit, self.run(url)).await {
            Ok(result) => result,
            Err(_) => {
                let err = AuditError::Timeout {
                    url: url.to_string(),
                    seconds: limit.as_secs(),
                };
                self.report_error(&err);
                Err(err)
            }
        }
    }

    /// Audits one URL with the configured timeout, if any.
    pub async fn audit(&self, url: &str) -> Result<Vec<Finding>, AuditError> {
        match self.timeout {
            Some(limit) => self.run_with_timeout(url, limit).await,
            None => self.run(url).await,
        }
    }

    /// Audits every URL, at most `concurrency` at a time, and finishes the
    /// reporter. Outcomes are returned in input order.
    pub async fn run_all(&self, urls: &[String]) -> Vec<UrlOutcome> {
        info!("Auditing {} URL(s)", urls.len());

        let outcomes: Vec<UrlOutcome> = stream::iter(urls)
            .map(|url| async move {
                UrlOutcome {
                    url: url.clone(),
                    result: self.audit(url).await,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        if let Err(e) = self.reporter.finish() {
            warn!("Failed to finish report: {}", e);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "Audited {} URL(s), {} failed",
            outcomes.len(),
            failed
        );
        outcomes
    }

    fn deliver(&self, url: &str, outcome: Outcome) -> Result<Vec<Finding>, AuditError> {
        match outcome {
            Outcome::Success(findings) => {
                self.report_results(&findings, url);
                Ok(findings)
            }
            Outcome::Failure {
                findings,
                errors,
                partial,
            } => {
                if partial {
                    self.report_results(&findings, url);
                }
                let err = AuditError::Checkers {
                    url: url.to_string(),
                    findings,
                    errors,
                };
                self.report_error(&err);
                Err(err)
            }
        }
    }

    fn report_results(&self, findings: &[Finding], url: &str) {
        if let Err(e) = self.reporter.results(findings, url) {
            warn!("Failed to report results for {}: {}", url, e);
        }
    }

    fn report_error(&self, error: &AuditError) {
        warn!("{}", error);
        if let Err(e) = self.reporter.error(error) {
            warn!("Failed to report error: {}", e);
        }
    }
}

/// Errors of an [`AuditError::Checkers`] result, if any.
pub fn checker_errors(error: &AuditError) -> &[AdapterError] {
    match error {
        AuditError::Checkers { errors, .. } => errors,
        _ => &[],
    }
}
