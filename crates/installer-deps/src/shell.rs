//! Shell-script plugin runner.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExecuteError;
use crate::executor::{PluginRunner, RunContext};
use crate::plan::Step;
use crate::result::{StepOutcome, StepStatus};

/// Plugin name handled by [`ShellPluginRunner`].
pub const RUN_SHELL_SCRIPT: &str = "aws:runShellScript";

/// Runner that executes `aws:runShellScript` steps through a local shell.
///
/// Other plugins are reported as failed steps.
#[derive(Debug, Clone)]
pub struct ShellPluginRunner {
    shell: PathBuf,
    default_timeout: Duration,
}

impl ShellPluginRunner {
    pub fn new(shell: impl Into<PathBuf>, default_timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            default_timeout,
        }
    }
}

/// One shell invocation, built from a single input object.
#[derive(Debug, Default, PartialEq)]
struct ShellInvocation {
    commands: Vec<String>,
    working_directory: Option<String>,
    timeout_seconds: Option<u64>,
}

impl ShellInvocation {
    /// Accepts either one input object or a list of them (1.x `properties`).
    /// Each list entry keeps its own working directory and timeout.
    fn parse_all(properties: &Value) -> anyhow::Result<Vec<Self>> {
        match properties {
            Value::Object(_) => Ok(vec![Self::from_object(properties)?]),
            Value::Array(items) => items.iter().map(Self::from_object).collect(),
            other => anyhow::bail!("expected an object of inputs, got {}", other),
        }
    }

    fn from_object(value: &Value) -> anyhow::Result<Self> {
        let commands = match value.get("runCommand") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|l| {
                    l.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| anyhow::anyhow!("runCommand entries must be strings"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            Some(_) => anyhow::bail!("runCommand must be a string or a list of strings"),
            None => anyhow::bail!("missing runCommand"),
        };

        let working_directory = value
            .get("workingDirectory")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        // documents carry this as either a number or a numeric string
        let timeout_seconds = match value.get("timeoutSeconds") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid timeoutSeconds {:?}", s))?,
            ),
            _ => None,
        };

        Ok(Self {
            commands,
            working_directory,
            timeout_seconds,
        })
    }
}

impl ShellPluginRunner {
    /// Run one invocation. `None` means it hit its timeout and was killed.
    async fn invoke(
        &self,
        step: &Step,
        run: &RunContext,
        invocation: &ShellInvocation,
        timeout: Duration,
    ) -> anyhow::Result<Option<Output>> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(invocation.commands.join("\n"))
            .env("INSTALLER_DOCUMENT_ID", &run.document_id)
            .env("INSTALLER_DOCUMENT_CREATED_DATE", &run.document_created_date)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let working_dir = invocation.working_directory.as_deref().or_else(|| {
            Some(step.configuration.default_working_dir.as_str()).filter(|d| !d.is_empty())
        });
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        debug!(step = %step.id, timeout_secs = timeout.as_secs(), "Spawning shell step");
        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.shell.display()))?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => Ok(Some(output?)),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl PluginRunner for ShellPluginRunner {
    async fn ensure_ready(&self) -> Result<(), ExecuteError> {
        tokio::fs::metadata(&self.shell)
            .await
            .map(|_| ())
            .map_err(|e| ExecuteError::ExecutorUnavailable {
                reason: format!("shell {} is not usable: {}", self.shell.display(), e),
            })
    }

    async fn run_step(&self, step: &Step, run: &RunContext) -> anyhow::Result<StepOutcome> {
        let started_at = Utc::now();

        if step.plugin != RUN_SHELL_SCRIPT {
            warn!(step = %step.id, plugin = %step.plugin, "Plugin not supported by shell runner");
            return Ok(StepOutcome::failed(
                step,
                format!("Plugin {} is not supported", step.plugin),
                started_at,
            ));
        }

        let invocations = ShellInvocation::parse_all(&step.configuration.properties)
            .with_context(|| format!("invalid inputs for step {}", step.id))?;

        let mut stdout = String::new();
        let mut stderr = String::new();
        // invocations run in order; the first failure ends the step
        for invocation in &invocations {
            let timeout = invocation
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(self.default_timeout);

            let Some(output) = self.invoke(step, run, invocation, timeout).await? else {
                let mut outcome = StepOutcome::failed(
                    step,
                    format!("Step {} timed out after {} seconds", step.id, timeout.as_secs()),
                    started_at,
                );
                outcome.status = StepStatus::TimedOut;
                outcome.stdout = stdout;
                outcome.stderr = stderr;
                return Ok(outcome);
            };

            stdout.push_str(&String::from_utf8_lossy(&output.stdout));
            stderr.push_str(&String::from_utf8_lossy(&output.stderr));

            if !output.status.success() {
                let exit_code = output.status.code().unwrap_or(-1);
                let mut outcome = StepOutcome::failed(
                    step,
                    format!("Step '{}' exited with code {}", step.id, exit_code),
                    started_at,
                );
                outcome.exit_code = exit_code;
                outcome.stdout = stdout;
                outcome.stderr = stderr;
                return Ok(outcome);
            }
        }

        let mut outcome = StepOutcome::success(step, stdout.clone(), started_at);
        outcome.exit_code = 0;
        outcome.stdout = stdout;
        outcome.stderr = stderr;
        Ok(outcome)
    }
}
