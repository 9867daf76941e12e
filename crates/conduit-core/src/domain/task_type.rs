use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key naming a pluggable task implementation.
///
/// A `TaskModel` refers to its implementation through this key and the
/// worker resolves it against the registered tasks by exact match.
///
/// 命名規約（推奨）: `{domain}.{action}`、例: `deploy.wait_for_up_instances`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
