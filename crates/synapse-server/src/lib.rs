//! Server assembly for Synapse: configuration, middleware and maintenance
//! jobs around the [`synapse_api`] router.

pub mod backfill;

use std::path::{Path, PathBuf};

use axum::Router;
use config::{ConfigError, Environment};
use serde::Deserialize;
use synapse_api::AppState;
use synapse_auth::AuthConfig;
use synapse_core::store::SubjectStore;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SYNAPSE_`-prefixed environment variables (`SYNAPSE_AUTH__SECRET_KEY`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub model_path:         PathBuf,
  /// Allowed browser origins. Empty, or `["*"]`, allows any origin.
  pub cors_origins:       Vec<String>,
  pub store_timeout_secs: u64,
  pub auth:               AuthConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_owned(),
      port:               5000,
      store_path:         PathBuf::from("~/.local/share/synapse/synapse.db"),
      model_path:         PathBuf::from("models/sentiment.json"),
      cors_origins:       Vec::new(),
      store_timeout_secs: 10,
      auth:               AuthConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (if it exists) layered under the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_source(config::File::from(path).required(false))
  }

  fn from_source<T>(file: T) -> Result<Self, ConfigError>
  where
    T: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("SYNAPSE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins")
          .with_list_parse_key("auth.issuers"),
      )
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

fn cors_layer(origins: &[String]) -> CorsLayer {
  if origins.is_empty() || origins.iter().any(|o| o == "*") {
    return CorsLayer::permissive();
  }
  let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
  CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

/// The API router wrapped in CORS and request tracing.
pub fn router<S>(state: AppState<S>, cors_origins: &[String]) -> Router
where
  S: SubjectStore + 'static,
{
  synapse_api::api_router(state)
    .layer(cors_layer(cors_origins))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use config::FileFormat;
  use synapse_api::PredictionOrchestrator;
  use synapse_auth::CredentialVerifier;
  use synapse_nlp::artifact::ModelArtifacts;
  use synapse_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn from_toml(raw: &str) -> ServerConfig {
    ServerConfig::from_source(config::File::from_str(raw, FileFormat::Toml)).unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.store_timeout_secs, 10);
    assert!(cfg.cors_origins.is_empty());
    assert_eq!(cfg.auth.api_base, "https://api.clerk.com");
    assert_eq!(cfg.auth.jwks_timeout_secs, 5);
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      r#"
        port = 8080
        cors_origins = ["http://localhost:3000"]

        [auth]
        secret_key = "sk_live_abc"
        issuers = ["https://clerk.example.com"]
        profile_timeout_secs = 2
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.cors_origins, ["http://localhost:3000"]);
    assert_eq!(cfg.auth.effective_secret_key(), Some("sk_live_abc"));
    assert_eq!(cfg.auth.issuers, ["https://clerk.example.com"]);
    assert_eq!(cfg.auth.profile_timeout_secs, 2);
    assert_eq!(cfg.auth.jwks_timeout_secs, 5);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/data/synapse.db"));
    assert_eq!(expanded, PathBuf::from(home).join("data/synapse.db"));
    assert_eq!(expand_tilde(Path::new("/abs/path.db")), PathBuf::from("/abs/path.db"));
  }

  async fn app(cors_origins: &[String]) -> Router {
    let artifacts = ModelArtifacts::from_json(
      r#"{"vocabulary": {"good": 0}, "scaler": {"mean": [0.0], "scale": [1.0]},
          "classifier": {"coef": [1.0], "intercept": 0.0}}"#,
    )
    .unwrap();
    let (vectorizer, scaler, classifier) = artifacts.into_parts();
    let predictor = synapse_nlp::Predictor::new(
      synapse_nlp::TextNormalizer::new(),
      vectorizer,
      scaler,
      classifier,
    );
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let orchestrator = PredictionOrchestrator::new(store, Arc::new(predictor));
    router(AppState::new(orchestrator, CredentialVerifier::degraded()), cors_origins)
  }

  fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
      .method("OPTIONS")
      .uri("/predict")
      .header(header::ORIGIN, origin)
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .body(Body::empty())
      .unwrap()
  }

  #[tokio::test]
  async fn empty_origin_list_is_permissive() {
    let resp = app(&[]).await.oneshot(preflight("http://anywhere.test")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }

  #[tokio::test]
  async fn configured_origins_are_enforced() {
    let origins = vec!["http://localhost:3000".to_owned()];
    let app = app(&origins).await;

    let resp = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");

    let resp = app.oneshot(preflight("http://evil.test")).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
  }
}
