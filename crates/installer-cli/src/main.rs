//! installer-run - drive installation documents through the installer seams
//!
//! ## Commands
//!
//! - `parse`: Translate a document and print its plan
//! - `run`: Translate and execute a document, printing per-step results
//! - `host`: Print the host identity

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};
use uuid::Uuid;

use installer_deps::{
    init_tracing, ExecutionResult, HostContext, InstallerConfig, InstallerDeps, Parameters,
    ParserContext, Plan,
};

#[derive(Parser)]
#[command(name = "installer-run")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Translate and execute package installation documents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Instance metadata service endpoint
    #[arg(long, global = true, env = "INSTALLER_METADATA_ENDPOINT")]
    metadata_endpoint: Option<String>,

    /// Static instance id (skips the metadata service)
    #[arg(long, global = true, env = "INSTALLER_INSTANCE_ID")]
    instance_id: Option<String>,

    /// Static region (skips the metadata service)
    #[arg(long, global = true, env = "INSTALLER_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a document and print the resulting plan as JSON
    Parse {
        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Translate and execute a document
    Run {
        #[command(flatten)]
        document: DocumentArgs,

        /// Creation date recorded for the document
        #[arg(long, default_value = "")]
        created_date: String,

        /// Shell used for script steps
        #[arg(long, env = "INSTALLER_SHELL")]
        shell: Option<PathBuf>,

        /// Default step timeout in seconds
        #[arg(long, env = "INSTALLER_STEP_TIMEOUT_SECS")]
        step_timeout: Option<u64>,
    },

    /// Print the instance id and region of this host
    Host,
}

#[derive(Args)]
struct DocumentArgs {
    /// Path to the document (JSON)
    path: PathBuf,

    /// Document id (default: file stem)
    #[arg(long)]
    document_id: Option<String>,

    /// Message id for this invocation (default: random UUID)
    #[arg(long)]
    message_id: Option<String>,

    /// Orchestration directory
    #[arg(long, default_value = "")]
    orchestration_dir: String,

    /// Bucket for step output
    #[arg(long, default_value = "")]
    bucket: String,

    /// Key prefix inside the bucket
    #[arg(long, default_value = "")]
    key_prefix: String,

    /// Default working directory for steps
    #[arg(long, default_value = "")]
    working_dir: String,

    /// Document parameter as key=value; the value is always a string
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// Typed document parameter as key=<json>, e.g. count=3 or tags=["a"]
    #[arg(long = "param-json", value_parser = parse_param_json)]
    json_params: Vec<(String, Value)>,
}

impl DocumentArgs {
    fn document_id(&self) -> String {
        self.document_id.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        })
    }

    fn context(&self) -> ParserContext {
        ParserContext::new(self.document_id())
            .with_orchestration_dir(&self.orchestration_dir)
            .with_artifact_location(&self.bucket, &self.key_prefix)
            .with_message_id(
                self.message_id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            )
            .with_default_working_dir(&self.working_dir)
    }

    fn parameters(&self) -> Parameters {
        // typed values win over plain strings for the same key
        self.params
            .iter()
            .chain(&self.json_params)
            .cloned()
            .collect()
    }
}

fn split_param(raw: &str) -> Result<(String, &str), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))?;
    if key.trim().is_empty() {
        return Err(format!("empty parameter name in {:?}", raw));
    }
    Ok((key.trim().to_string(), value))
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = split_param(raw)?;
    Ok((key, Value::String(value.to_string())))
}

fn parse_param_json(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = split_param(raw)?;
    let value = serde_json::from_str(value)
        .map_err(|e| format!("invalid JSON for parameter {}: {}", key, e))?;
    Ok((key, value))
}

#[derive(Serialize)]
struct RunReport<'a> {
    document_id: &'a str,
    host: &'a HostContext,
    success: bool,
    results: &'a ExecutionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let mut config = InstallerConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid installer configuration")?;
    if let Some(endpoint) = &cli.metadata_endpoint {
        config = config.with_metadata_endpoint(endpoint);
    }
    if let Some(id) = &cli.instance_id {
        config = config.with_instance_id(id);
    }
    if let Some(region) = &cli.region {
        config = config.with_region(region);
    }

    match cli.command {
        Commands::Parse { document } => {
            let deps = InstallerDeps::production(&config)?;
            let plan = translate(&deps, &document)?;
            print_json(&plan)
        }
        Commands::Run {
            document,
            created_date,
            shell,
            step_timeout,
        } => {
            if let Some(shell) = shell {
                config = config.with_shell(shell);
            }
            if let Some(secs) = step_timeout {
                config = config.with_step_timeout(Duration::from_secs(secs));
            }
            let deps = InstallerDeps::production(&config)?;
            cmd_run(&deps, &document, &created_date).await
        }
        Commands::Host => {
            let deps = InstallerDeps::production(&config)?;
            let host = HostContext::resolve(deps.host.as_ref()).await;
            print_json(&host)
        }
    }
}

fn translate(deps: &InstallerDeps, document: &DocumentArgs) -> Result<Plan> {
    let raw = load(deps, &document.path)?;
    let plan = deps
        .translator
        .translate(&raw, &document.context(), &document.parameters())
        .with_context(|| format!("Failed to translate {}", document.path.display()))?;
    Ok(plan)
}

fn load(deps: &InstallerDeps, path: &Path) -> Result<installer_deps::RawDocument> {
    deps.load_document(path)
        .with_context(|| format!("Failed to load document {}", path.display()))
}

async fn cmd_run(deps: &InstallerDeps, document: &DocumentArgs, created_date: &str) -> Result<()> {
    let host = HostContext::resolve(deps.host.as_ref()).await;
    let plan = translate(deps, document)?;
    let document_id = document.document_id();

    info!(document_id = %document_id, steps = plan.len(), "Executing document");
    let results = deps
        .executor
        .execute(&plan, &document_id, created_date)
        .await
        .context("Failed to execute document")?;

    let success = results.all_succeeded();
    print_json(&RunReport {
        document_id: &document_id,
        host: &host,
        success,
        results: &results,
    })?;

    if !success {
        anyhow::bail!("{} of {} steps failed", results.failed_count(), results.len());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_param_keeps_strings() {
        assert_eq!(
            parse_param("version=1.10").unwrap(),
            ("version".to_string(), serde_json::json!("1.10"))
        );
        assert_eq!(
            parse_param("count=3").unwrap(),
            ("count".to_string(), serde_json::json!("3"))
        );
        assert_eq!(
            parse_param("name=nginx").unwrap(),
            ("name".to_string(), serde_json::json!("nginx"))
        );
        assert_eq!(
            parse_param("empty=").unwrap(),
            ("empty".to_string(), serde_json::json!(""))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_parse_param_json_is_typed() {
        assert_eq!(
            parse_param_json("count=3").unwrap(),
            ("count".to_string(), serde_json::json!(3))
        );
        assert_eq!(
            parse_param_json("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".to_string(), serde_json::json!(["a", "b"]))
        );
        assert!(parse_param_json("name=nginx").is_err());
    }

    #[test]
    fn test_document_id_defaults_to_file_stem() {
        let cli = Cli::parse_from(["installer-run", "parse", "/docs/install-nginx.json"]);
        let Commands::Parse { document } = cli.command else {
            panic!("expected parse");
        };
        assert_eq!(document.document_id(), "install-nginx");
        let ctx = document.context();
        assert_eq!(ctx.document_id, "install-nginx");
        assert!(Uuid::parse_str(&ctx.message_id).is_ok());
    }

    #[test]
    fn test_params_are_collected() {
        let cli = Cli::parse_from([
            "installer-run",
            "run",
            "doc.json",
            "--param",
            "version=1.10",
            "--param",
            "channel=stable",
            "--param-json",
            "retries=2",
        ]);
        let Commands::Run { document, .. } = cli.command else {
            panic!("expected run");
        };
        let params = document.parameters();
        assert_eq!(params.get("version"), Some(&serde_json::json!("1.10")));
        assert_eq!(params.get("channel"), Some(&serde_json::json!("stable")));
        assert_eq!(params.get("retries"), Some(&serde_json::json!(2)));
    }
}
