//! `synapse`, the command-line client for the Synapse sentiment API.
//!
//! # Usage
//!
//! ```
//! synapse --url http://localhost:5000 --token $JWT predict "Great battery life"
//! synapse --config ~/.config/synapse/config.toml upload reviews.csv
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:5000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "synapse", about = "Command-line client for the Synapse sentiment API")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the Synapse server (default: http://localhost:5000).
  #[arg(long, env = "SYNAPSE_URL")]
  url: Option<String>,

  /// Bearer credential sent with every request.
  #[arg(long, env = "SYNAPSE_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Classify one piece of text.
  Predict { text: String },
  /// Classify every row of a .csv or .tsv file.
  Upload { file: PathBuf },
  /// List stored reviews, newest first.
  Reviews {
    #[arg(long, default_value_t = 50)]
    limit: usize,
    #[arg(long, default_value_t = 0)]
    skip:  usize,
  },
  /// List bulk sessions, or the reviews of one session.
  Sessions {
    #[arg(long, value_name = "ID")]
    session: Option<String>,
  },
  /// Show review and session counts.
  Stats,
  /// Re-sync email and name from the credential.
  RefreshProfile,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

/// Flags and environment override the config file, which overrides defaults.
fn resolve(args_url: Option<String>, args_token: Option<String>, file: ConfigFile) -> ApiConfig {
  ApiConfig {
    base_url: args_url
      .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    token:    args_token
      .or_else(|| (!file.token.is_empty()).then(|| file.token.clone()))
      .unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(resolve(args.url, args.token, file_cfg))?;

  let output = match args.command {
    Command::Predict { text } => client.predict(&text).await?,
    Command::Upload { file } => client.upload(&file).await?,
    Command::Reviews { limit, skip } => client.reviews(limit, skip).await?,
    Command::Sessions { session } => client.sessions(session.as_deref()).await?,
    Command::Stats => client.stats().await?,
    Command::RefreshProfile => client.refresh_profile().await?,
  };

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}
