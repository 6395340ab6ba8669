//! Document translation: raw bytes + context → ordered plan.

use tracing::debug;

use crate::context::ParserContext;
use crate::document::{DocumentContent, RawDocument, SchemaFamily};
use crate::error::TranslateError;
use crate::obs;
use crate::plan::{Parameters, Plan, Step, StepConfiguration};

/// Converts a raw document into a plan.
///
/// Guarantees:
/// - The plan's step order equals the document's declaration order.
/// - Step ids are unique within the plan.
/// - Output depends only on the inputs; no filesystem or network access.
pub trait DocumentTranslator: Send + Sync {
    fn translate(
        &self,
        document: &RawDocument,
        context: &ParserContext,
        parameters: &Parameters,
    ) -> Result<Plan, TranslateError>;
}

/// Translator for JSON documents with `1.x` (`runtimeConfig`) or `2.x`
/// (`mainSteps`) schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocumentTranslator;

impl JsonDocumentTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentTranslator for JsonDocumentTranslator {
    fn translate(
        &self,
        document: &RawDocument,
        context: &ParserContext,
        parameters: &Parameters,
    ) -> Result<Plan, TranslateError> {
        let content: DocumentContent = serde_json::from_slice(document.as_bytes())?;
        let version = content.schema_version.as_str();
        let family = SchemaFamily::from_version(version)
            .ok_or_else(|| TranslateError::unsupported(version, "unrecognized schema version"))?;

        let resolved = resolve_parameters(&content, parameters);

        let steps = match family {
            SchemaFamily::RuntimeConfig => {
                let plugins = content.runtime_config.ok_or_else(|| {
                    TranslateError::unsupported(version, "missing runtimeConfig")
                })?;
                plugins
                    .into_iter()
                    .map(|(name, plugin)| {
                        let mut configuration =
                            StepConfiguration::new(plugin.properties, context, resolved.clone());
                        configuration.settings = plugin.settings;
                        Step::new(name.clone(), name, configuration)
                    })
                    .collect::<Vec<_>>()
            }
            SchemaFamily::MainSteps => {
                let main_steps = content
                    .main_steps
                    .ok_or_else(|| TranslateError::unsupported(version, "missing mainSteps"))?;
                main_steps
                    .into_iter()
                    .map(|instruction| {
                        let mut configuration =
                            StepConfiguration::new(instruction.inputs, context, resolved.clone());
                        configuration.settings = instruction.settings;
                        configuration.precondition = instruction.precondition;
                        Step::new(instruction.name, instruction.action, configuration)
                    })
                    .collect::<Vec<_>>()
            }
        };

        if let Some(step) = steps.iter().find(|s| s.id.trim().is_empty()) {
            return Err(TranslateError::unsupported(
                version,
                format!("step with action {:?} has an empty name", step.plugin),
            ));
        }

        let plan = Plan::new(steps).map_err(|e| TranslateError::unsupported(version, e.to_string()))?;

        debug!(schema_version = %version, steps = plan.len(), "Document translated");
        obs::emit_document_translated(&context.document_id, &document.sha256(), version, plan.len());
        Ok(plan)
    }
}

/// Declared defaults overlaid with caller-supplied values.
///
/// Values are not substituted into step inputs.
fn resolve_parameters(content: &DocumentContent, supplied: &Parameters) -> Parameters {
    let mut resolved: Parameters = content
        .parameters
        .iter()
        .filter_map(|(name, decl)| decl.default.clone().map(|d| (name.clone(), d)))
        .collect();
    for (name, value) in supplied {
        resolved.insert(name.clone(), value.clone());
    }
    resolved
}
