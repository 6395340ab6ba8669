//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `MemoryFileSystem`, `StaticHostIdentity`, `ScriptedRunner` and
//! `StaticTranslator`, which satisfy the trait contracts without touching
//! the disk, the network or a shell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::context::ParserContext;
use crate::document::RawDocument;
use crate::error::{ExecuteError, FsError, HostError, TranslateError};
use crate::executor::{PluginRunner, RunContext};
use crate::fs::FileSystem;
use crate::host::HostIdentity;
use crate::plan::{Parameters, Plan, Step};
use crate::result::StepOutcome;
use crate::translator::DocumentTranslator;

// ---------------------------------------------------------------------------
// MemoryFileSystem
// ---------------------------------------------------------------------------

/// In-memory filesystem backed by a `HashMap<path, bytes>`.
///
/// Paths registered with [`MemoryFileSystem::insert_unreadable`] exist but
/// fail to read with `FsError::ReadError`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    unreadable: Mutex<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: Vec<u8>) {
        self.files.lock().unwrap().insert(path.into(), content);
    }

    pub fn insert_unreadable(&self, path: impl Into<PathBuf>) {
        self.unreadable.lock().unwrap().push(path.into());
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
            || self.unreadable.lock().unwrap().iter().any(|p| p == path)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        if self.unreadable.lock().unwrap().iter().any(|p| p == path) {
            return Err(FsError::ReadError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
            });
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

// ---------------------------------------------------------------------------
// StaticHostIdentity
// ---------------------------------------------------------------------------

/// Host identity with fixed answers, each of which can be made to fail.
#[derive(Debug)]
pub struct StaticHostIdentity {
    instance_id: Result<String, HostError>,
    region: Result<String, HostError>,
    instance_id_calls: AtomicUsize,
    region_calls: AtomicUsize,
}

impl StaticHostIdentity {
    pub fn new(instance_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            instance_id: Ok(instance_id.into()),
            region: Ok(region.into()),
            instance_id_calls: AtomicUsize::new(0),
            region_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_instance_id(mut self) -> Self {
        self.instance_id = Err(HostError::unavailable("instance_id", "fake failure"));
        self
    }

    pub fn failing_region(mut self) -> Self {
        self.region = Err(HostError::unavailable("region", "fake failure"));
        self
    }

    pub fn instance_id_calls(&self) -> usize {
        self.instance_id_calls.load(Ordering::SeqCst)
    }

    pub fn region_calls(&self) -> usize {
        self.region_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostIdentity for StaticHostIdentity {
    async fn instance_id(&self) -> Result<String, HostError> {
        self.instance_id_calls.fetch_add(1, Ordering::SeqCst);
        self.instance_id.clone()
    }

    async fn region(&self) -> Result<String, HostError> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        self.region.clone()
    }
}

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// What a [`ScriptedRunner`] does for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Succeed with the given output
    Succeed(String),
    /// Finish with the given non-zero exit code
    Exit(i32),
    /// Runner-level error (`run_step` returns `Err`)
    Error(String),
    /// Succeed but label the outcome with a different step id
    ReportAs(String),
}

/// Plugin runner that follows a per-step script and records call order.
///
/// Steps without a script succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    unavailable: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose readiness check fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_script(mut self, step_id: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(step_id.into(), script);
        self
    }

    /// Step ids passed to `run_step`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginRunner for ScriptedRunner {
    async fn ensure_ready(&self) -> Result<(), ExecuteError> {
        match &self.unavailable {
            Some(reason) => Err(ExecuteError::ExecutorUnavailable {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn run_step(&self, step: &Step, _run: &RunContext) -> anyhow::Result<StepOutcome> {
        self.calls.lock().unwrap().push(step.id.clone());
        let started_at = Utc::now();

        match self.scripts.get(&step.id) {
            None => Ok(StepOutcome::success(step, "", started_at)),
            Some(Script::Succeed(output)) => Ok(StepOutcome::success(step, output.clone(), started_at)),
            Some(Script::Exit(code)) => {
                let mut outcome =
                    StepOutcome::failed(step, format!("exited with code {}", code), started_at);
                outcome.exit_code = *code;
                Ok(outcome)
            }
            Some(Script::Error(message)) => Err(anyhow::anyhow!("{}", message)),
            Some(Script::ReportAs(other)) => {
                let mut outcome = StepOutcome::success(step, "", started_at);
                outcome.step_id = other.clone();
                Ok(outcome)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StaticTranslator
// ---------------------------------------------------------------------------

/// Translator that ignores its input and returns a fixed answer.
#[derive(Debug)]
pub struct StaticTranslator {
    answer: Result<Plan, TranslateError>,
    calls: AtomicUsize,
}

impl StaticTranslator {
    pub fn returning(plan: Plan) -> Self {
        Self {
            answer: Ok(plan),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: TranslateError) -> Self {
        Self {
            answer: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentTranslator for StaticTranslator {
    fn translate(
        &self,
        _document: &RawDocument,
        _context: &ParserContext,
        _parameters: &Parameters,
    ) -> Result<Plan, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}
