use crate::logging::{LogEvent, LogLevel, NoopEventLogger, SharedEventLogger};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Purely observational marker of where a check is in its work. Never
/// affects the check's result.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    #[serde(rename = "validator")]
    pub validator_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Observer of progress events. Must be safe for concurrent emission, since
/// checks run in parallel over the same sink.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent) -> anyhow::Result<()>;
}

pub type SharedProgressSink = Arc<dyn ProgressSink>;

/// Sink that records every event it receives. Used in tests and by UIs that
/// poll rather than stream.
#[derive(Default)]
pub struct CollectingProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn emit(&self, event: ProgressEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Per-check handle for progress reporting. Reporting is best effort: a sink
/// failure is logged and counted, never surfaced into the check's result, so
/// observability stays isolated from correctness.
#[derive(Clone)]
pub struct Reporter {
    validator_name: String,
    sink: Option<SharedProgressSink>,
    logger: SharedEventLogger,
    dropped: Arc<AtomicU64>,
}

impl Reporter {
    pub fn new(
        validator_name: impl Into<String>,
        sink: Option<SharedProgressSink>,
        logger: SharedEventLogger,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            sink,
            logger,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reporter with no observer and no logger. Both reporting calls become
    /// no-ops.
    pub fn disabled(validator_name: impl Into<String>) -> Self {
        Self::new(validator_name, None, Arc::new(NoopEventLogger))
    }

    pub fn validator_name(&self) -> &str {
        &self.validator_name
    }

    /// Coarse milestone, e.g. "sending to remote".
    pub fn report_stage(&self, stage: impl Into<String>) {
        self.emit(ProgressEvent {
            validator_name: self.validator_name.clone(),
            stage: Some(stage.into()),
            current: None,
            total: None,
        });
    }

    /// Position inside a per-item loop with a known denominator.
    pub fn report_progress(&self, current: usize, total: usize) {
        self.emit(ProgressEvent {
            validator_name: self.validator_name.clone(),
            stage: None,
            current: Some(current),
            total: Some(total),
        });
    }

    /// Number of events the sink rejected. Diagnostic channel for the
    /// swallowed observer failures.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn emit(&self, event: ProgressEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.emit(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.logger.log(
                LogEvent::new(LogLevel::Warn, "progress.sink_failed")
                    .with_validator(self.validator_name.clone())
                    .with_field("error", e.to_string()),
            );
        }
    }
}
