//! Per-step outcomes produced by executing a plan.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::plan::Step;

/// Terminal status of a single step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    TimedOut,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub plugin: String,
    pub status: StepStatus,
    /// Exit code (-1 when the step never produced one)
    pub exit_code: i32,
    /// Human-readable summary of the step's output
    pub output: String,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl StepOutcome {
    /// Successful outcome with the given output.
    pub fn success(step: &Step, output: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        let output = output.into();
        Self {
            step_id: step.id.clone(),
            plugin: step.plugin.clone(),
            status: StepStatus::Success,
            exit_code: 0,
            stdout: output.clone(),
            output,
            stderr: String::new(),
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Failed outcome carrying an error description.
    pub fn failed(step: &Step, error: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        let error = error.into();
        Self {
            step_id: step.id.clone(),
            plugin: step.plugin.clone(),
            status: StepStatus::Failed,
            exit_code: -1,
            output: error.clone(),
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Success
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}

/// Map from step id to outcome, iterated in plan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExecutionResult {
    outcomes: IndexMap<String, StepOutcome>,
}

impl ExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `step_id`, replacing any earlier entry.
    pub fn insert(&mut self, step_id: impl Into<String>, outcome: StepOutcome) {
        self.outcomes.insert(step_id.into(), outcome);
    }

    pub fn get(&self, step_id: &str) -> Option<&StepOutcome> {
        self.outcomes.get(step_id)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.outcomes.contains_key(step_id)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether every recorded step succeeded (true for an empty result).
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(StepOutcome::succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| !o.succeeded()).count()
    }
}
