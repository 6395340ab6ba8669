//! End-to-end: read a document, translate it, execute the plan and tag the
//! run with host identity, the way an installer drives the seams.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use installer_deps::fakes::{MemoryFileSystem, Script, ScriptedRunner, StaticHostIdentity};
use installer_deps::*;
use serde_json::json;

const TWO_STEP_DOC: &str = r#"{
    "schemaVersion": "2.2",
    "description": "Install a package in two steps",
    "parameters": {
        "version": {"type": "String", "default": "latest"}
    },
    "mainSteps": [
        {"action": "aws:runShellScript", "name": "stepA", "inputs": {"runCommand": ["echo installing"]}},
        {"action": "aws:runShellScript", "name": "stepB", "inputs": {"runCommand": ["exit 7"]}}
    ]
}"#;

fn deps_with(runner: Arc<dyn PluginRunner>) -> InstallerDeps {
    let fs = MemoryFileSystem::new();
    fs.insert("/pkg/install.json", TWO_STEP_DOC.as_bytes().to_vec());
    InstallerDeps::new(
        Arc::new(JsonDocumentTranslator::new()),
        Arc::new(PluginStepExecutor::new(runner)),
        Arc::new(fs),
        Arc::new(StaticHostIdentity::new("i-0123", "eu-central-1").failing_region()),
    )
}

async fn run(deps: &InstallerDeps) -> ExecutionResult {
    let path = Path::new("/pkg/install.json");
    assert!(deps.fs.exists(path));
    let raw = deps.load_document(path).unwrap();

    let ctx = ParserContext::new("install-doc")
        .with_orchestration_dir("/var/lib/installer/orchestration")
        .with_artifact_location("artifacts", "runs/")
        .with_message_id("msg-1");
    let mut params = Parameters::new();
    params.insert("version".to_string(), json!("1.4.2"));

    let plan = deps.translator.translate(&raw, &ctx, &params).unwrap();
    assert_eq!(
        plan.steps()[0].configuration.parameters.get("version"),
        Some(&json!("1.4.2"))
    );

    deps.executor
        .execute(&plan, "install-doc", "2024-06-01T12:00:00Z")
        .await
        .unwrap()
}

fn keys(result: &ExecutionResult) -> BTreeSet<&str> {
    result.step_ids().collect()
}

#[tokio::test]
async fn two_step_document_with_shell_runner() {
    let deps = deps_with(Arc::new(ShellPluginRunner::new("/bin/sh", Duration::from_secs(30))));

    let result = run(&deps).await;

    assert_eq!(keys(&result), BTreeSet::from(["stepA", "stepB"]));
    let a = result.get("stepA").unwrap();
    assert_eq!(a.status, StepStatus::Success);
    assert!(a.stdout.contains("installing"));
    let b = result.get("stepB").unwrap();
    assert_eq!(b.status, StepStatus::Failed);
    assert_eq!(b.exit_code, 7);
}

#[tokio::test]
async fn two_step_document_keys_independent_of_outcome() {
    let scripts = [
        ScriptedRunner::new(),
        ScriptedRunner::new().with_script("stepA", Script::Exit(1)),
        ScriptedRunner::new()
            .with_script("stepA", Script::Error("boom".into()))
            .with_script("stepB", Script::Error("boom".into())),
    ];

    for runner in scripts {
        let result = run(&deps_with(Arc::new(runner))).await;
        assert_eq!(keys(&result), BTreeSet::from(["stepA", "stepB"]));
    }
}

#[tokio::test]
async fn host_context_tags_run_despite_region_failure() {
    let deps = deps_with(Arc::new(ScriptedRunner::new()));

    let host = HostContext::resolve(deps.host.as_ref()).await;

    assert_eq!(host.instance_id.as_deref(), Some("i-0123"));
    assert!(host.region.is_none());
}

#[tokio::test]
async fn runtime_config_document_executes_in_declared_order() {
    let doc = RawDocument::from(
        r#"{"schemaVersion":"1.2","runtimeConfig":{
            "aws:runShellScript":{"properties":[{"runCommand":["echo one","echo two"]}]},
            "aws:configurePackage":{"properties":{"name":"pkg","action":"Install"}}
        }}"#,
    );
    let plan = JsonDocumentTranslator::new()
        .translate(&doc, &ParserContext::new("legacy"), &Parameters::new())
        .unwrap();

    let executor = PluginStepExecutor::new(Arc::new(ShellPluginRunner::new(
        "/bin/sh",
        Duration::from_secs(30),
    )));
    let result = executor.execute(&plan, "legacy", "").await.unwrap();

    assert_eq!(
        result.step_ids().collect::<Vec<_>>(),
        vec!["aws:runShellScript", "aws:configurePackage"]
    );
    let shell = result.get("aws:runShellScript").unwrap();
    assert!(shell.succeeded());
    assert_eq!(shell.stdout, "one\ntwo\n");
    assert!(!result.get("aws:configurePackage").unwrap().succeeded());
}
