//! The bundle of collaborators an installer is constructed with.

use std::path::Path;
use std::sync::Arc;

use crate::config::InstallerConfig;
use crate::document::RawDocument;
use crate::error::{FsError, HostError};
use crate::executor::{PluginStepExecutor, StepExecutor};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::host::{HostIdentity, MetadataServiceResolver};
use crate::shell::ShellPluginRunner;
use crate::translator::{DocumentTranslator, JsonDocumentTranslator};

/// Collaborators used by the installer.
///
/// Built once at process start and passed to whatever needs it; each field
/// can be swapped independently (see [`crate::fakes`]).
#[derive(Clone)]
pub struct InstallerDeps {
    pub translator: Arc<dyn DocumentTranslator>,
    pub executor: Arc<dyn StepExecutor>,
    pub fs: Arc<dyn FileSystem>,
    pub host: Arc<dyn HostIdentity>,
}

impl InstallerDeps {
    pub fn new(
        translator: Arc<dyn DocumentTranslator>,
        executor: Arc<dyn StepExecutor>,
        fs: Arc<dyn FileSystem>,
        host: Arc<dyn HostIdentity>,
    ) -> Self {
        Self {
            translator,
            executor,
            fs,
            host,
        }
    }

    /// Production adapters: JSON translator, shell-backed executor, local
    /// disk and the instance metadata service.
    pub fn production(config: &InstallerConfig) -> Result<Self, HostError> {
        let runner = ShellPluginRunner::new(config.shell.clone(), config.step_timeout);
        Ok(Self {
            translator: Arc::new(JsonDocumentTranslator::new()),
            executor: Arc::new(PluginStepExecutor::new(Arc::new(runner))),
            fs: Arc::new(LocalFileSystem),
            host: Arc::new(MetadataServiceResolver::new(config.host.clone())?),
        })
    }

    /// Read a raw document through the filesystem probe.
    pub fn load_document(&self, path: &Path) -> Result<RawDocument, FsError> {
        self.fs.read_file(path).map(RawDocument::from)
    }
}

impl std::fmt::Debug for InstallerDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallerDeps").finish_non_exhaustive()
    }
}
