use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One multi-turn conversation unit. Its position in the dataset is its
/// identity for error reporting.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    pub messages: Vec<Message>,
}

impl Sample {
    pub fn from_turns<I, S>(turns: I) -> Self
    where
        I: IntoIterator<Item = (Role, S)>,
        S: Into<String>,
    {
        Self {
            messages: turns
                .into_iter()
                .map(|(role, content)| Message::new(role, content))
                .collect(),
        }
    }
}

/// A dataset is an ordered sequence of samples. No check ever mutates it.
pub type Dataset = Vec<Sample>;

/// Per-check configuration, scoped to one check instance and immutable for
/// the lifetime of a run. Each check defines its own recognized keys.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Options(HashMap<String, serde_json::Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        self.0.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
    }

    pub fn str_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }
}

impl From<HashMap<String, serde_json::Value>> for Options {
    fn from(map: HashMap<String, serde_json::Value>) -> Self {
        Self(map)
    }
}
