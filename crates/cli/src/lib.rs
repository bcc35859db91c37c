//! Thin CLI adapter over `jarscope-core` (base spec §1: "packaging and
//! process launch beyond a minimal CLI entry point that wires configuration
//! into the core"). Grounded on the teacher's `crates/cli/src/lib.rs`: a
//! `clap::Parser`/`Subcommand` pair, a manually-constructed
//! `tokio::runtime::Runtime`, and one `rt.block_on` dispatch per subcommand.

use clap::{Parser, Subcommand};
use jarscope_api::DetailKind;
use jarscope_core::{Config, JarscopeEngine};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "jarscope",
    version,
    about = "Indexes local Maven/Gradle dependency caches and answers code-discovery queries over them"
)]
pub struct Cli {
    /// Path to a jarscope.toml config file. Defaults are used if omitted.
    #[arg(long, global = true, value_name = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the configured Maven/Gradle roots and ingest any new artifacts
    Index,
    /// Clear the index and re-scan both roots from scratch
    Refresh,
    /// Search artifacts by a substring of groupId or artifactId
    SearchArtifacts { query: String },
    /// Search classes by fragment, `regex:<pattern>`, or a `*`/`?` glob
    SearchClasses { query: String },
    /// Find every transitive subclass/implementor of a class or interface
    SearchImplementations { class_name: String },
    /// Search resources by a substring of their archive-relative path
    SearchResources { pattern: String },
    /// Retrieve signatures, Javadoc, or source for a fully-qualified class
    ClassDetails {
        class_name: String,
        /// One of `signatures`, `docs`, `source`
        #[arg(long, default_value = "signatures")]
        kind: String,
        /// Pin resolution to one artifact (`groupId:artifactId:version`)
        #[arg(long)]
        coordinate: Option<String>,
    },
    /// Start the Model Context Protocol stdio server
    Mcp,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Mcp => "mcp",
        _ => "cli",
    };
    let _guard = jarscope_core::logging::init_logging(component, true);

    let config = Config::load(cli.config.as_deref())?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let engine = Arc::new(JarscopeEngine::open(config)?);

        match cli.command {
            Commands::Index => {
                let outcome = engine.index().await?;
                print_json(&format!("{outcome:?}"))
            }
            Commands::Refresh => {
                let outcome = engine.refresh().await?;
                print_json(&format!("{outcome:?}"))
            }
            Commands::SearchArtifacts { query } => {
                let matches = engine.query().search_artifacts(&query);
                print_json(&matches)
            }
            Commands::SearchClasses { query } => {
                let matches = engine.query().search_classes(&query)?;
                print_json(&matches)
            }
            Commands::SearchImplementations { class_name } => {
                let matches = engine.query().search_implementations(&class_name);
                print_json(&matches)
            }
            Commands::SearchResources { pattern } => {
                let matches = engine.query().search_resources(&pattern);
                print_json(&matches)
            }
            Commands::ClassDetails {
                class_name,
                kind,
                coordinate,
            } => {
                let kind = parse_detail_kind(&kind)?;
                let detail = engine
                    .get_class_details(&class_name, kind, coordinate.as_deref())
                    .await?;
                print_json(&detail)
            }
            Commands::Mcp => {
                let background_engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    if let Err(e) = background_engine.index().await {
                        tracing::error!("initial index() pass failed: {e}");
                    }
                });
                engine.start_background();
                jarscope_mcp::stdio::run_stdio_server(engine).await
            }
        }
    })
}

fn parse_detail_kind(kind: &str) -> anyhow::Result<DetailKind> {
    match kind {
        "signatures" => Ok(DetailKind::Signatures),
        "docs" => Ok(DetailKind::Docs),
        "source" => Ok(DetailKind::Source),
        other => anyhow::bail!("unknown detail type '{other}'; expected signatures, docs, or source"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
