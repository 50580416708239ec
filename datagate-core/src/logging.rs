use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub validator: Option<String>,
    pub message: String,
    pub fields: HashMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level,
            validator: None,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    pub fn with_field(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.fields.insert(k.into(), v.into());
        self
    }
}

pub trait EventLogger: Send + Sync {
    fn log(&self, event: LogEvent);
}

#[derive(Default)]
pub struct NoopEventLogger;

impl EventLogger for NoopEventLogger {
    fn log(&self, _event: LogEvent) {}
}

pub type SharedEventLogger = Arc<dyn EventLogger>;

/// In-memory ring buffer of run events, with a per-validator tail so a UI or
/// a test can inspect what one check logged without scanning the whole run.
pub struct BufferedEventLogger {
    seq: AtomicU64,
    max_events: usize,
    max_events_per_validator: usize,
    state: Mutex<BufferedEventLoggerState>,
}

struct BufferedEventLoggerState {
    events: VecDeque<(u64, LogEvent)>,
    validator_events: HashMap<String, VecDeque<(u64, LogEvent)>>,
}

impl BufferedEventLogger {
    pub fn new(max_events: usize, max_events_per_validator: usize) -> Self {
        Self {
            seq: AtomicU64::new(0),
            max_events: max_events.max(1),
            max_events_per_validator: max_events_per_validator.max(1),
            state: Mutex::new(BufferedEventLoggerState {
                events: VecDeque::new(),
                validator_events: HashMap::new(),
            }),
        }
    }

    pub fn events_since(&self, last_seq: u64) -> (u64, Vec<LogEvent>) {
        let state = self.state.lock().unwrap();
        let mut out = Vec::new();
        let mut new_last = last_seq;
        for (seq, ev) in state.events.iter() {
            if *seq > last_seq {
                out.push(ev.clone());
                new_last = new_last.max(*seq);
            }
        }
        (new_last, out)
    }

    pub fn validator_events_tail(&self, validator: &str, max: usize) -> Vec<LogEvent> {
        let state = self.state.lock().unwrap();
        let Some(q) = state.validator_events.get(validator) else {
            return Vec::new();
        };
        q.iter()
            .rev()
            .take(max)
            .cloned()
            .map(|(_, ev)| ev)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }
}

impl EventLogger for BufferedEventLogger {
    fn log(&self, event: LogEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;

        let mut state = self.state.lock().unwrap();
        state.events.push_back((seq, event.clone()));
        while state.events.len() > self.max_events {
            state.events.pop_front();
        }

        if let Some(validator) = event.validator.clone() {
            let q = state.validator_events.entry(validator).or_default();
            q.push_back((seq, event));
            while q.len() > self.max_events_per_validator {
                q.pop_front();
            }
        }
    }
}
