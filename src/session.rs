//! Debug session record and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of a debug session.
///
/// `initialized -> running -> {running, completed, error}`; `completed` and
/// `error` only leave their state through `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Initialized,
    Running,
    Error,
    Completed,
}

impl SessionStatus {
    /// Terminal states accept no further steps.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }
}

/// Which frontend visualizer should render this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VisualizerType {
    #[default]
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "tree")]
    Tree,
    #[serde(rename = "graph")]
    Graph,
    #[serde(rename = "linkedList")]
    LinkedList,
}

/// One captured local binding from a variable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub line: usize,
}

/// Best-effort annotation of a probable data-structure operation at the
/// current line. UI aid only; never correctness-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationHint {
    #[serde(rename = "type")]
    pub kind: String,
    pub elements: Vec<usize>,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The mutable record of one stepped-execution exploration.
///
/// Owned exclusively by the engine; callers only ever see clones produced
/// by engine operations.
#[derive(Debug, Clone, Serialize)]
pub struct DebugSession {
    pub id: String,
    pub code: String,
    pub current_line: usize,
    pub variables: Vec<Variable>,
    pub output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub status: SessionStatus,
    pub visualizer_type: VisualizerType,
    pub visualization_hints: Vec<VisualizationHint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebugSession {
    pub fn new(code: &str, visualizer_type: VisualizerType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            current_line: 1,
            variables: Vec::new(),
            output: String::new(),
            error: String::new(),
            status: SessionStatus::Initialized,
            visualizer_type,
            visualization_hints: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a failed step; the session stays inspectable afterwards.
    pub fn record_failure(&mut self, message: String) {
        self.error = message;
        self.status = SessionStatus::Error;
        self.touch();
    }

    /// Return to the initial state, keeping the source text and visualizer.
    pub fn reset(&mut self) {
        self.current_line = 1;
        self.variables.clear();
        self.output.clear();
        self.error.clear();
        self.visualization_hints.clear();
        self.status = SessionStatus::Initialized;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
