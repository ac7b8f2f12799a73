//! Artifact Registry CLI: drive the registry against a local snapshot store.
//!
//! Usage:
//!   artifact-registry version create <name> [--store path]
//!   artifact-registry artifact <subcommand> [--store path] [--config path]
//!   artifact-registry reconcile
//!   artifact-registry schema

use artifact_registry::{
    Artifact, ArtifactService, DocArtifact, ListOptions, MemoryStore, ModelArtifact, OrderBy,
    RegistryConfig, RegistryResult, SortOrder,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "artifact-registry",
    version,
    about = "Model registry artifacts over a metadata store"
)]
struct Cli {
    /// Path to the JSON store snapshot
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Path to a YAML registry config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage model versions
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },
    /// Upsert and look up artifacts
    Artifact {
        #[command(subcommand)]
        action: ArtifactAction,
    },
    /// Restore attributions missing after a failed create
    Reconcile,
    /// Print the JSON Schema of the artifact resource
    Schema,
}

#[derive(Subcommand)]
enum VersionAction {
    /// Create a model version
    Create {
        /// Name of the model version
        name: String,
    },
}

#[derive(Subcommand)]
enum ArtifactAction {
    /// Create or update an artifact from a JSON file
    Upsert {
        /// JSON file holding one artifact
        #[arg(long)]
        file: PathBuf,
        /// Model version to attach a new artifact to
        #[arg(long)]
        model_version: Option<String>,
    },
    /// Show an artifact by id
    Get {
        id: String,
    },
    /// List artifacts of a model version
    List {
        #[arg(long)]
        model_version: String,
        #[arg(long)]
        page_size: Option<i32>,
        /// CREATE_TIME, LAST_UPDATE_TIME or ID
        #[arg(long)]
        order_by: Option<OrderBy>,
        /// ASC or DESC
        #[arg(long)]
        sort_order: Option<SortOrder>,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Find one artifact by external id, or by name within a model version
    Find {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        model_version: Option<String>,
        #[arg(long)]
        external_id: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Model,
    Doc,
}

/// Get the default store path (~/.local/share/artifact-registry/store.json)
fn default_store_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("artifact-registry").join("store.json")
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_service(
    store_path: &Path,
    config: Option<&Path>,
) -> Result<(Arc<MemoryStore>, ArtifactService), String> {
    let config = match config {
        Some(path) => RegistryConfig::load(path).map_err(|e| e.to_string())?,
        None => RegistryConfig::default(),
    };
    let store = Arc::new(
        MemoryStore::open(store_path).map_err(|e| format!("Failed to open store: {}", e))?,
    );
    let service = ArtifactService::connect(store.clone(), &config)
        .await
        .map_err(|e| format!("Failed to register types: {}", e))?;
    Ok((store, service))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn report<T: Serialize>(result: RegistryResult<T>) -> i32 {
    match result {
        Ok(value) => print_json(&value),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn save_store(store: &MemoryStore, path: &Path) -> i32 {
    match store.save(path) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: failed to save store: {}", e);
            1
        }
    }
}

async fn cmd_version_create(service: &ArtifactService, name: &str) -> i32 {
    match service.create_model_version(name).await {
        Ok(id) => {
            println!("Created model version '{}' ({})", name, id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_artifact_upsert(
    service: &ArtifactService,
    file: &Path,
    model_version: Option<&str>,
) -> i32 {
    let raw = match std::fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", file.display(), e);
            return 1;
        }
    };
    let artifact: Artifact = match serde_json::from_str(&raw) {
        Ok(artifact) => artifact,
        Err(e) => {
            eprintln!("Error: invalid artifact in {}: {}", file.display(), e);
            return 1;
        }
    };
    report(service.upsert_artifact(artifact, model_version).await)
}

async fn cmd_artifact_find(
    service: &ArtifactService,
    kind: KindArg,
    name: Option<&str>,
    model_version: Option<&str>,
    external_id: Option<&str>,
) -> i32 {
    match kind {
        KindArg::Model => report(
            service
                .get_typed_by_params::<ModelArtifact>(name, model_version, external_id)
                .await,
        ),
        KindArg::Doc => report(
            service
                .get_typed_by_params::<DocArtifact>(name, model_version, external_id)
                .await,
        ),
    }
}

fn cmd_schema() -> i32 {
    let schema = schemars::schema_for!(Artifact);
    print_json(&schema)
}

async fn run(cli: Cli) -> i32 {
    let store_path = cli.store.unwrap_or_else(default_store_path);
    let (store, service) = match open_service(&store_path, cli.config.as_deref()).await {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let (code, mutated) = match cli.command {
        Commands::Version {
            action: VersionAction::Create { name },
        } => (cmd_version_create(&service, &name).await, true),
        Commands::Artifact { action } => match action {
            ArtifactAction::Upsert {
                file,
                model_version,
            } => (
                cmd_artifact_upsert(&service, &file, model_version.as_deref()).await,
                true,
            ),
            ArtifactAction::Get { id } => (report(service.get_artifact_by_id(&id).await), false),
            ArtifactAction::List {
                model_version,
                page_size,
                order_by,
                sort_order,
                page_token,
            } => {
                let options = ListOptions {
                    page_size,
                    order_by,
                    sort_order,
                    next_page_token: page_token,
                };
                let result = service.get_artifacts(options, Some(&model_version)).await;
                (report(result), false)
            }
            ArtifactAction::Find {
                kind,
                name,
                model_version,
                external_id,
            } => (
                cmd_artifact_find(
                    &service,
                    kind,
                    name.as_deref(),
                    model_version.as_deref(),
                    external_id.as_deref(),
                )
                .await,
                false,
            ),
        },
        Commands::Reconcile => (report(service.reconcile_attributions().await), true),
        Commands::Schema => (cmd_schema(), false),
    };

    // A failed create can still leave a node behind, so persist regardless
    if mutated {
        let saved = save_store(&store, &store_path);
        if code == 0 {
            return saved;
        }
    }
    code
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    let code = runtime.block_on(run(cli));
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_command_parses_and_prints() {
        let cli = Cli::try_parse_from(["artifact-registry", "schema"]).unwrap();
        assert!(matches!(cli.command, Commands::Schema));
        assert_eq!(cmd_schema(), 0);
    }

    #[tokio::test]
    async fn test_schema_runs_without_an_existing_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("store.json");
        let cli = Cli::try_parse_from([
            "artifact-registry",
            "schema",
            "--store",
            store_path.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(run(cli).await, 0);
        assert!(!store_path.exists());
    }
}
