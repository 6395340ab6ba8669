//! Installer-Deps: collaborator seams for a package-installer plugin
//!
//! An installer turns a raw installation document into an ordered plan and
//! runs that plan, tagging the run with the host's identity. Every
//! collaborator it needs is a trait so it can be replaced in tests or by an
//! alternate backend:
//!
//! - `DocumentTranslator`: raw document + context → `Plan`
//! - `StepExecutor`: `Plan` → `ExecutionResult` (one entry per step)
//! - `FileSystem`: existence checks and whole-file reads
//! - `HostIdentity`: instance id and region
//!
//! `InstallerDeps` bundles production implementations; in-memory fakes live
//! in the `fakes` module.

pub mod config;
pub mod context;
pub mod deps;
pub mod document;
mod error;
pub mod executor;
pub mod fakes;
pub mod fs;
pub mod host;
pub mod obs;
pub mod plan;
pub mod result;
pub mod shell;
pub mod telemetry;
pub mod translator;

pub use config::InstallerConfig;
pub use context::ParserContext;
pub use deps::InstallerDeps;
pub use document::{DocumentContent, RawDocument, SchemaFamily};
pub use error::{ExecuteError, FsError, HostError, TranslateError};
pub use executor::{PluginRunner, PluginStepExecutor, RunContext, StepExecutor};
pub use fs::{FileSystem, LocalFileSystem};
pub use host::{HostContext, HostIdentity, HostIdentityConfig, MetadataServiceResolver};
pub use plan::{DuplicateStepId, Parameters, Plan, Step, StepConfiguration};
pub use result::{ExecutionResult, StepOutcome, StepStatus};
pub use shell::{ShellPluginRunner, RUN_SHELL_SCRIPT};
pub use telemetry::init_tracing;
pub use translator::{DocumentTranslator, JsonDocumentTranslator};
