//! Per-invocation translation context.

use serde::{Deserialize, Serialize};

/// Execution context handed to the translator alongside a raw document.
///
/// Every field is a plain string and is copied verbatim onto each step of
/// the resulting plan; empty values are legal at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserContext {
    /// Directory under which per-step working state is kept
    pub orchestration_dir: String,
    /// Bucket that receives step output artifacts
    pub artifact_bucket: String,
    /// Key prefix inside `artifact_bucket`
    pub artifact_key_prefix: String,
    /// Identifier of the message that triggered this run
    pub message_id: String,
    /// Identifier of the document being translated
    pub document_id: String,
    /// Working directory for steps that do not declare one
    pub default_working_dir: String,
}

impl ParserContext {
    /// Create a context for the given document; other fields start empty.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Self::default()
        }
    }

    /// Set the orchestration directory
    pub fn with_orchestration_dir(mut self, dir: impl Into<String>) -> Self {
        self.orchestration_dir = dir.into();
        self
    }

    /// Set the artifact bucket and key prefix
    pub fn with_artifact_location(
        mut self,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        self.artifact_bucket = bucket.into();
        self.artifact_key_prefix = key_prefix.into();
        self
    }

    /// Set the message id
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Set the default working directory
    pub fn with_default_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.default_working_dir = dir.into();
        self
    }
}
