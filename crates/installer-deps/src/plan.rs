//! Translated plans and their steps.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::ParserContext;

/// Caller-supplied document parameters, keyed by parameter name.
pub type Parameters = BTreeMap<String, Value>;

/// Everything a plugin needs to run one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfiguration {
    /// Step inputs (`inputs` for 2.x documents, `properties` for 1.x)
    pub properties: Value,
    /// Plugin settings, if the document declares any
    pub settings: Option<Value>,
    /// Precondition expression, passed through untouched
    pub precondition: Option<Value>,
    /// Resolved document parameters; never substituted into `properties`
    pub parameters: Parameters,
    pub orchestration_dir: String,
    pub artifact_bucket: String,
    pub artifact_key_prefix: String,
    pub message_id: String,
    pub document_id: String,
    pub default_working_dir: String,
}

impl StepConfiguration {
    /// Build a configuration from step-level values and the shared context.
    pub fn new(properties: Value, context: &ParserContext, parameters: Parameters) -> Self {
        Self {
            properties,
            settings: None,
            precondition: None,
            parameters,
            orchestration_dir: context.orchestration_dir.clone(),
            artifact_bucket: context.artifact_bucket.clone(),
            artifact_key_prefix: context.artifact_key_prefix.clone(),
            message_id: context.message_id.clone(),
            document_id: context.document_id.clone(),
            default_working_dir: context.default_working_dir.clone(),
        }
    }
}

/// One unit of installation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, unique within a plan
    pub id: String,
    /// Plugin (action) that runs this step, e.g. `aws:runShellScript`
    pub plugin: String,
    pub configuration: StepConfiguration,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        plugin: impl Into<String>,
        configuration: StepConfiguration,
    ) -> Self {
        Self {
            id: id.into(),
            plugin: plugin.into(),
            configuration,
        }
    }
}

/// Two steps in one plan share an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Duplicate step id: {0}")]
pub struct DuplicateStepId(pub String);

/// Ordered, immutable sequence of steps.
///
/// The steps field is private so a plan can only be built through
/// [`Plan::new`], which enforces unique step ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Build a plan, keeping the given order.
    pub fn new(steps: Vec<Step>) -> Result<Self, DuplicateStepId> {
        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.id.as_str()) {
                return Err(DuplicateStepId(step.id.clone()));
            }
        }
        Ok(Self { steps })
    }

    /// A plan with no steps.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in plan order.
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.id.as_str())
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(id: &str) -> Step {
        Step::new(
            id,
            "aws:runShellScript",
            StepConfiguration::new(json!({}), &ParserContext::new("doc"), Parameters::new()),
        )
    }

    #[test]
    fn test_plan_keeps_order() {
        let plan = Plan::new(vec![step("b"), step("a"), step("c")]).unwrap();
        assert_eq!(plan.step_ids().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_plan_rejects_duplicate_ids() {
        let err = Plan::new(vec![step("a"), step("b"), step("a")]).unwrap_err();
        assert_eq!(err, DuplicateStepId("a".to_string()));
    }

    #[test]
    fn test_empty_plan() {
        let plan = Plan::empty();
        assert!(plan.is_empty());
        assert_eq!(plan.step_ids().count(), 0);
    }

    #[test]
    fn test_configuration_copies_context() {
        let ctx = ParserContext::new("doc-7")
            .with_message_id("m")
            .with_artifact_location("b", "p");
        let cfg = StepConfiguration::new(json!({"x": 1}), &ctx, Parameters::new());
        assert_eq!(cfg.document_id, "doc-7");
        assert_eq!(cfg.message_id, "m");
        assert_eq!(cfg.artifact_bucket, "b");
        assert_eq!(cfg.artifact_key_prefix, "p");
        assert_eq!(cfg.properties, json!({"x": 1}));
    }
}
