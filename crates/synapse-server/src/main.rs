//! synapse-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), loads the model
//! artifact, opens the SQLite store and serves the JSON API over HTTP.
//!
//! ```
//! synapse-server --config /etc/synapse/config.toml
//! synapse-server backfill-profiles
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use synapse_api::{AppState, PredictionOrchestrator};
use synapse_auth::CredentialVerifier;
use synapse_server::{ServerConfig, backfill};
use synapse_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Synapse sentiment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Fill missing subject emails and names from the identity provider.
  BackfillProfiles,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read configuration from {}", cli.config.display()))?;

  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let verifier =
    CredentialVerifier::from_config(&cfg.auth).context("failed to build credential verifier")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store, verifier).await,
    Command::BackfillProfiles => {
      let Some(profiles) = verifier.profiles() else {
        bail!("backfill-profiles needs auth.secret_key to be configured");
      };
      let summary = backfill::backfill_profiles(&store, profiles.as_ref())
        .await
        .context("backfill failed")?;
      println!(
        "scanned {}, updated {}, skipped {}, failed {}",
        summary.scanned, summary.updated, summary.skipped, summary.failed
      );
      Ok(())
    }
  }
}

async fn serve(
  cfg: ServerConfig,
  store: SqliteStore,
  verifier: CredentialVerifier,
) -> anyhow::Result<()> {
  let predictor = synapse_nlp::load_predictor(&cfg.model_path)
    .with_context(|| format!("failed to load model from {}", cfg.model_path.display()))?;

  let orchestrator = PredictionOrchestrator::new(Arc::new(store), Arc::new(predictor))
    .with_store_timeout(Duration::from_secs(cfg.store_timeout_secs));
  let state = AppState::new(orchestrator, verifier);

  let app = synapse_server::router(state, &cfg.cors_origins);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
