//! codescan-config - resolves the effective configuration of a code scanning run
//!
//! # Overview
//!
//! `codescan-config init` reads the run settings (defaults, an optional
//! settings file, then `CODESCAN_*` environment variables), resolves the
//! languages, queries and path filters, and writes the result to
//! `<temp_dir>/config`. `codescan-config show` prints that file again.
//!
//! # Execution Flow
//!
//! 1. Load [`RunSettings`]
//! 2. Initialize logging (console, plus JSON files when `log_dir` is set)
//! 3. Create the tokio runtime
//! 4. Run the command
//! 5. Shutdown the runtime with a 5s timeout

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use codescan_config::services::{CodeQlResolver, ConfigInitializer, GitCheckout, GitHubApi};
use codescan_config::{APP_NAME, ConfigError, ConfigStore, RunSettings, VERSION, logging};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "codescan-config")]
#[command(about = "Resolve the languages, queries and path filters of a code scanning run", version)]
struct Cli {
    /// Settings file (YAML, TOML or JSON); environment variables override it
    #[arg(long, short = 's', global = true)]
    settings: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the configuration and persist it in the temp dir
    Init,
    /// Print the configuration persisted by `init`
    Show,
}

async fn run_init(settings: &RunSettings) -> Result<()> {
    let options = settings.init_options()?;

    let initializer = ConfigInitializer::new(
        Arc::new(CodeQlResolver::new(
            settings.codeql_path.clone(),
            settings.resolver_timeout(),
        )),
        Arc::new(GitHubApi::new(settings.api_url.clone(), settings.token.clone())?),
        Arc::new(GitCheckout::new(
            settings.server_url.clone(),
            settings.resolver_timeout(),
        )),
    );

    let config = initializer.init_config(&options).await?;

    for (language, queries) in &config.queries {
        println!(
            "{}: {} builtin, {} custom groups",
            language,
            queries.builtin.len(),
            queries.custom.len()
        );
    }
    if !config.paths.is_empty() {
        println!("paths: {}", config.paths.join(", "));
    }
    if !config.paths_ignore.is_empty() {
        println!("paths-ignore: {}", config.paths_ignore.join(", "));
    }
    Ok(())
}

fn show(settings: &RunSettings) -> Result<()> {
    let store = ConfigStore::new(&settings.temp_dir)?;
    let config = store
        .load()?
        .with_context(|| format!("No config saved at {}, run init first", store.config_path()))?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = RunSettings::load(cli.settings.as_deref())?;
    let _guard = logging::setup_logging(settings.debug, settings.log_dir.as_deref())?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("codescan-worker")
        .build()?;

    let result = match cli.command {
        Command::Init => runtime.block_on(run_init(&settings)),
        Command::Show => show(&settings),
    };

    runtime.shutdown_timeout(Duration::from_secs(5));

    result.inspect_err(|e| match e.downcast_ref::<ConfigError>() {
        Some(config_error) => tracing::error!("{:?}: {}", config_error.kind(), config_error),
        None => tracing::error!("{:#}", e),
    })
}
