//! Scripted collaborators for tests.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::accessibility::{AccessibilityEngine, EngineOptions, RawIssue};
use crate::error::{AdapterError, AuditError};
use crate::finding::{Finding, Level};
use crate::markup::{MarkupValidator, ValidatorMessage, ValidatorReport};
use crate::reporter::Reporter;

/// What a scripted collaborator does when called.
#[derive(Debug, Clone)]
pub enum Script<T> {
    Return(T),
    Fail(String),
    Panic,
    Hang,
}

impl<T: Clone> Script<T> {
    async fn play(&self, delay: Duration) -> Result<T, String> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self {
            Script::Return(value) => Ok(value.clone()),
            Script::Fail(message) => Err(message.clone()),
            Script::Panic => panic!("scripted collaborator panicked"),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Shared log of collaborator completions, in order.
pub type CompletionLog = Arc<Mutex<Vec<&'static str>>>;

pub struct Scripted<T> {
    default: Script<T>,
    per_url: HashMap<String, Script<T>>,
    delay: Duration,
    calls: AtomicUsize,
    log: Option<(CompletionLog, &'static str)>,
}

impl<T: Clone + Send + Sync> Scripted<T> {
    pub fn new(default: Script<T>) -> Self {
        Self {
            default,
            per_url: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            log: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn for_url(mut self, url: &str, script: Script<T>) -> Self {
        self.per_url.insert(url.to_string(), script);
        self
    }

    pub fn logging_to(mut self, log: CompletionLog, name: &'static str) -> Self {
        self.log = Some((log, name));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn call(&self, url: &str) -> Result<T, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.per_url.get(url).unwrap_or(&self.default);
        let result = script.play(self.delay).await;
        if let Some((log, name)) = &self.log {
            log.lock().unwrap().push(*name);
        }
        result
    }
}

pub type ScriptedEngine = Scripted<Vec<RawIssue>>;
pub type ScriptedValidator = Scripted<ValidatorReport>;

impl ScriptedEngine {
    pub fn issues(issues: Vec<RawIssue>) -> Self {
        Self::new(Script::Return(issues))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Script::Fail(message.to_string()))
    }
}

impl ScriptedValidator {
    pub fn messages(messages: Vec<ValidatorMessage>) -> Self {
        Self::new(Script::Return(ValidatorReport { messages }))
    }

    /// Validator whose output is not JSON.
    pub fn garbage() -> Self {
        Self::new(Script::Fail("Exception in thread \"main\"".to_string()))
    }
}

#[async_trait]
impl AccessibilityEngine for ScriptedEngine {
    async fn run(
        &self,
        url: &str,
        _options: &EngineOptions,
    ) -> Result<Vec<RawIssue>, AdapterError> {
        self.call(url).await.map_err(AdapterError::engine)
    }
}

#[async_trait]
impl MarkupValidator for ScriptedValidator {
    async fn validate(&self, url: &str) -> Result<ValidatorReport, AdapterError> {
        match self.call(url).await {
            Ok(report) => Ok(report),
            Err(output) => ValidatorReport::parse(output.as_bytes()),
        }
    }
}

pub fn issue(level: &str, code: &str) -> RawIssue {
    RawIssue {
        code: Some(code.to_string()),
        context: Some("<b>bold</b>".to_string()),
        message: "Semantic markup should be used.".to_string(),
        selector: Some("html > body > b".to_string()),
        issue_type: level.to_string(),
    }
}

pub fn message(message_type: &str, text: &str) -> ValidatorMessage {
    ValidatorMessage {
        message_type: message_type.to_string(),
        extract: Some(" <p> ".to_string()),
        message: text.to_string(),
    }
}

pub fn a11y_finding(level: Level, code: &str) -> Finding {
    Finding::accessibility(
        level,
        Some(code.to_string()),
        "<img>",
        Some("html > body > img".to_string()),
        "Missing alt",
    )
}

pub fn markup_finding(level: Level, message: &str) -> Finding {
    Finding::markup(level, "", message)
}

/// Reporter that records every call.
#[derive(Default)]
pub struct RecordingReporter {
    reported: Mutex<Vec<(String, Vec<Finding>)>>,
    failures: Mutex<Vec<String>>,
    finished: AtomicUsize,
}

impl RecordingReporter {
    pub fn reported(&self) -> Vec<(String, Vec<Finding>)> {
        self.reported.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Reporter for RecordingReporter {
    fn results(&self, findings: &[Finding], url: &str) -> Result<(), AuditError> {
        self.reported
            .lock()
            .unwrap()
            .push((url.to_string(), findings.to_vec()));
        Ok(())
    }

    fn error(&self, error: &AuditError) -> Result<(), AuditError> {
        self.failures.lock().unwrap().push(error.to_string());
        Ok(())
    }

    fn finish(&self) -> Result<(), AuditError> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory writer that can be read back after being handed to a reporter.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
