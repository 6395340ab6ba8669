//! Plan execution through a pluggable runner.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, Instrument};

use crate::error::ExecuteError;
use crate::obs;
use crate::plan::{Plan, Step};
use crate::result::{ExecutionResult, StepOutcome};

/// Runs every step of a plan.
///
/// Guarantees:
/// - Every step id in `plan` appears exactly once in the result, even when
///   the step failed; no other ids appear.
/// - An empty plan yields an empty result.
/// - `ExecuteError` is returned only when execution cannot begin.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        plan: &Plan,
        document_id: &str,
        document_created_date: &str,
    ) -> Result<ExecutionResult, ExecuteError>;
}

/// Identity of the document a step belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub document_id: String,
    pub document_created_date: String,
}

/// Runs a single step for the executor.
#[async_trait]
pub trait PluginRunner: Send + Sync {
    /// Checked once before any step runs; an error aborts the whole call.
    async fn ensure_ready(&self) -> Result<(), ExecuteError> {
        Ok(())
    }

    /// Run one step. An `Err` is recorded as a failed outcome for that step.
    async fn run_step(&self, step: &Step, run: &RunContext) -> anyhow::Result<StepOutcome>;
}

/// Executor that runs steps sequentially in plan order through a `PluginRunner`.
pub struct PluginStepExecutor {
    runner: Arc<dyn PluginRunner>,
}

impl PluginStepExecutor {
    pub fn new(runner: Arc<dyn PluginRunner>) -> Self {
        Self { runner }
    }

    async fn run_plan(&self, plan: &Plan, run: &RunContext) -> Result<ExecutionResult, ExecuteError> {
        let start = Instant::now();

        if let Err(e) = self.runner.ensure_ready().await {
            obs::emit_executor_unavailable(&run.document_id, &e);
            return Err(e);
        }

        let mut result = ExecutionResult::new();
        for step in plan {
            obs::emit_step_started(&step.id, &step.plugin);
            let started_at = Utc::now();

            let mut outcome = match self.runner.run_step(step, run).await {
                Ok(outcome) => outcome,
                Err(e) => StepOutcome::failed(
                    step,
                    format!("Step '{}' execution error: {:#}", step.id, e),
                    started_at,
                ),
            };
            // the plan's id is authoritative for the result key
            outcome.step_id = step.id.clone();

            obs::emit_step_finished(&step.id, outcome.status, outcome.duration_ms());
            result.insert(step.id.clone(), outcome);
        }

        obs::emit_execution_finished(
            &run.document_id,
            result.len(),
            result.failed_count(),
            start.elapsed().as_millis() as u64,
        );
        Ok(result)
    }
}

#[async_trait]
impl StepExecutor for PluginStepExecutor {
    async fn execute(
        &self,
        plan: &Plan,
        document_id: &str,
        document_created_date: &str,
    ) -> Result<ExecutionResult, ExecuteError> {
        debug!(document_id, steps = plan.len(), "Executing plan");
        let run = RunContext {
            document_id: document_id.to_string(),
            document_created_date: document_created_date.to_string(),
        };
        let span = obs::execution_span(document_id, plan.len());
        self.run_plan(plan, &run).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParserContext;
    use crate::fakes::{Script, ScriptedRunner};
    use crate::plan::{Parameters, StepConfiguration};
    use crate::result::StepStatus;
    use serde_json::json;

    fn plan(ids: &[&str]) -> Plan {
        let steps = ids
            .iter()
            .map(|id| {
                Step::new(
                    *id,
                    "aws:runShellScript",
                    StepConfiguration::new(json!({}), &ParserContext::new("doc"), Parameters::new()),
                )
            })
            .collect();
        Plan::new(steps).unwrap()
    }

    #[tokio::test]
    async fn test_empty_plan_yields_empty_result() {
        let executor = PluginStepExecutor::new(Arc::new(ScriptedRunner::new()));
        let result = executor.execute(&Plan::empty(), "doc", "2024-01-01").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_runner_error_becomes_failed_entry() {
        let runner = ScriptedRunner::new().with_script("b", Script::Error("spawn failed".into()));
        let executor = PluginStepExecutor::new(Arc::new(runner));

        let result = executor.execute(&plan(&["a", "b", "c"]), "doc", "").await.unwrap();

        assert_eq!(result.step_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        let b = result.get("b").unwrap();
        assert_eq!(b.status, StepStatus::Failed);
        assert!(b.error.as_deref().unwrap().contains("spawn failed"));
        assert!(result.get("c").unwrap().succeeded());
    }

    #[tokio::test]
    async fn test_steps_run_in_plan_order() {
        let runner = Arc::new(ScriptedRunner::new());
        let executor = PluginStepExecutor::new(runner.clone());

        executor.execute(&plan(&["z", "y", "x"]), "doc", "").await.unwrap();

        assert_eq!(runner.calls(), vec!["z", "y", "x"]);
    }

    #[tokio::test]
    async fn test_unavailable_runner_is_call_level_error() {
        let runner = Arc::new(ScriptedRunner::unavailable("runner offline"));
        let executor = PluginStepExecutor::new(runner.clone());

        let err = executor.execute(&plan(&["a"]), "doc", "").await.unwrap_err();

        assert!(matches!(err, ExecuteError::ExecutorUnavailable { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_outcome_key_follows_plan_id() {
        let runner = ScriptedRunner::new().with_script("a", Script::ReportAs("other".into()));
        let executor = PluginStepExecutor::new(Arc::new(runner));

        let result = executor.execute(&plan(&["a"]), "doc", "").await.unwrap();

        assert_eq!(result.step_ids().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(result.get("a").unwrap().step_id, "a");
    }
}
