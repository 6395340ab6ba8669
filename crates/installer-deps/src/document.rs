//! Raw documents and their deserialized shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialized installation document, immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument(Vec<u8>);

impl RawDocument {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        RawDocument(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 of the payload as lowercase hex.
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hex::encode(hasher.finalize())
    }
}

impl From<Vec<u8>> for RawDocument {
    fn from(bytes: Vec<u8>) -> Self {
        RawDocument(bytes)
    }
}

impl From<&str> for RawDocument {
    fn from(text: &str) -> Self {
        RawDocument(text.as_bytes().to_vec())
    }
}

/// Schema families the translator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFamily {
    /// `1.0` / `1.2`: plugins keyed by name under `runtimeConfig`
    RuntimeConfig,
    /// `2.0` / `2.2`: ordered `mainSteps`
    MainSteps,
}

impl SchemaFamily {
    pub fn from_version(version: &str) -> Option<Self> {
        match version {
            "1.0" | "1.2" => Some(SchemaFamily::RuntimeConfig),
            "2.0" | "2.2" => Some(SchemaFamily::MainSteps),
            _ => None,
        }
    }
}

/// Declared document parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Plugin block of a `runtimeConfig` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub settings: Option<Value>,
}

/// Entry of a `mainSteps` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub action: String,
    pub name: String,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub precondition: Option<Value>,
}

/// Deserialized document content.
///
/// Maps are `IndexMap`s so declaration order survives deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub schema_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterDecl>,
    #[serde(default)]
    pub runtime_config: Option<IndexMap<String, PluginConfig>>,
    #[serde(default)]
    pub main_steps: Option<Vec<InstructionStep>>,
}
