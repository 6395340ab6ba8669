//! Structured observability hooks for document translation and execution.
//!
//! Events are emitted at `info!` level unless noted; the subscriber is set up
//! by [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::result::StepStatus;

/// Span covering one `execute` call; attached with `Instrument` so it stays
/// valid across await points.
pub fn execution_span(document_id: &str, steps: usize) -> tracing::Span {
    tracing::info_span!("installer.execute", document_id = %document_id, steps = steps)
}

/// Emit event: document translated into a plan.
pub fn emit_document_translated(
    document_id: &str,
    document_digest: &str,
    schema_version: &str,
    steps: usize,
) {
    let short_digest = &document_digest[..12.min(document_digest.len())];
    info!(
        event = "document.translated",
        document_id = %document_id,
        digest = %short_digest,
        schema_version = %schema_version,
        steps = steps,
    );
}

pub fn emit_step_started(step_id: &str, plugin: &str) {
    info!(event = "step.started", step_id = %step_id, plugin = %plugin);
}

pub fn emit_step_finished(step_id: &str, status: StepStatus, duration_ms: u64) {
    info!(
        event = "step.finished",
        step_id = %step_id,
        status = %status,
        duration_ms = duration_ms,
    );
}

/// Emit event: all steps of a plan ran.
pub fn emit_execution_finished(document_id: &str, steps: usize, failed: usize, duration_ms: u64) {
    info!(
        event = "execution.finished",
        document_id = %document_id,
        steps = steps,
        failed = failed,
        duration_ms = duration_ms,
    );
}

/// Emit event: execution could not begin (warning level).
pub fn emit_executor_unavailable(document_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "execution.unavailable", document_id = %document_id, error = %error);
}

/// Emit event: one host identity attribute could not be resolved (warning level).
pub fn emit_host_lookup_failed(attribute: &str, error: &dyn std::fmt::Display) {
    warn!(event = "host.lookup_failed", attribute = %attribute, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitters_without_subscriber() {
        emit_document_translated("doc", "ab12", "2.2", 3);
        emit_step_started("s", "aws:runShellScript");
        emit_step_finished("s", StepStatus::Failed, 12);
        emit_execution_finished("doc", 3, 1, 40);
        emit_executor_unavailable("doc", &"offline");
        emit_host_lookup_failed("region", &"timeout");
    }

    #[test]
    fn test_execution_span_create() {
        let span = execution_span("doc", 2);
        let _entered = span.enter();
    }
}
