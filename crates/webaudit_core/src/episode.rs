//! Per-URL aggregation state.
//!
//! An [`Episode`] receives one completion from each checker, in whatever
//! order they finish, and yields its [`Outcome`] exactly once: when the
//! second checker has reported. Successful completions land in the success
//! channel, failures in the error channel; a failure never ends the episode
//! early.

use std::fmt;

use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::finding::Finding;

/// The two checkers of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checker {
    Accessibility,
    Markup,
}

impl Checker {
    pub const ALL: [Checker; 2] = [Checker::Accessibility, Checker::Markup];

    fn index(self) -> usize {
        match self {
            Checker::Accessibility => 0,
            Checker::Markup => 1,
        }
    }
}

impl fmt::Display for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checker::Accessibility => f.write_str("accessibility"),
            Checker::Markup => f.write_str("markup"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    /// No checker has reported.
    Pending,
    /// One checker has reported.
    AwaitingSecond,
    /// Both checkers have reported and the outcome was handed out.
    Done,
}

/// Terminal result of an episode.
#[derive(Debug)]
pub enum Outcome {
    /// Both checkers succeeded; findings are in completion order.
    Success(Vec<Finding>),
    /// At least one checker failed.
    Failure {
        /// Findings of the checkers that succeeded.
        findings: Vec<Finding>,
        errors: Vec<AdapterError>,
        /// Whether any checker succeeded at all.
        partial: bool,
    },
}

#[derive(Debug)]
struct Channel<T> {
    contributions: usize,
    items: Vec<T>,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            contributions: 0,
            items: Vec::new(),
        }
    }
}

impl<T> Channel<T> {
    fn push(&mut self, items: impl IntoIterator<Item = T>) {
        self.contributions += 1;
        self.items.extend(items);
    }
}

/// Aggregation state for one URL.
#[derive(Debug)]
pub struct Episode {
    url: String,
    state: EpisodeState,
    reported: [bool; 2],
    success: Channel<Finding>,
    failure: Channel<AdapterError>,
}

impl Episode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: EpisodeState::Pending,
            reported: [false; 2],
            success: Channel::default(),
            failure: Channel::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    /// Checkers that have not reported yet.
    pub fn outstanding(&self) -> Vec<Checker> {
        Checker::ALL
            .into_iter()
            .filter(|c| !self.reported[c.index()])
            .collect()
    }

    /// Records the completion of `checker`.
    ///
    /// Returns the outcome on the completion that brings the episode to
    /// [`EpisodeState::Done`], and `None` otherwise. A second completion from
    /// the same checker, or any completion after `Done`, is ignored.
    pub fn complete(
        &mut self,
        checker: Checker,
        result: Result<Vec<Finding>, AdapterError>,
    ) -> Option<Outcome> {
        if self.state == EpisodeState::Done || self.reported[checker.index()] {
            warn!("Ignoring duplicate {} completion for {}", checker, self.url);
            return None;
        }
        self.reported[checker.index()] = true;

        match result {
            Ok(findings) => {
                debug!(
                    "{} check of {} reported {} findings",
                    checker,
                    self.url,
                    findings.len()
                );
                self.success.push(findings);
            }
            Err(error) => {
                debug!("{} check of {} failed: {}", checker, self.url, error);
                self.failure.push([error]);
            }
        }

        self.state = match self.state {
            EpisodeState::Pending => EpisodeState::AwaitingSecond,
            _ => EpisodeState::Done,
        };

        (self.state == EpisodeState::Done).then(|| self.take_outcome())
    }

    fn take_outcome(&mut self) -> Outcome {
        let success = std::mem::take(&mut self.success);
        let failure = std::mem::take(&mut self.failure);

        if failure.contributions == 0 {
            Outcome::Success(success.items)
        } else {
            Outcome::Failure {
                findings: success.items,
                errors: failure.items,
                partial: success.contributions > 0,
            }
        }
    }
}
