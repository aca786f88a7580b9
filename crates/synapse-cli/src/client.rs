//! Async HTTP client wrapping the Synapse JSON API.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::{
  Client, RequestBuilder,
  multipart::{Form, Part},
};
use serde_json::{Value, json};

/// Connection settings for the Synapse API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Bearer credential; sent only when non-empty.
  pub token:    String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.token.is_empty() { req } else { req.bearer_auth(&self.config.token) }
  }

  /// Send `req` and return the JSON body, turning error responses into
  /// errors carrying the server's message.
  async fn send(&self, what: &str, req: RequestBuilder) -> Result<Value> {
    let resp = self.auth(req).send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    let body: Value = resp.json().await.with_context(|| format!("deserialising {what}"))?;
    if !status.is_success() {
      let message = body["error"].as_str().unwrap_or("no error message");
      return Err(anyhow!("{what} → {status}: {message}"));
    }
    Ok(body)
  }

  // ── Prediction ────────────────────────────────────────────────────────────

  /// `POST /predict` with a JSON text body.
  pub async fn predict(&self, text: &str) -> Result<Value> {
    let req = self.client.post(self.url("/predict")).json(&json!({ "text": text }));
    self.send("POST /predict", req).await
  }

  /// `POST /predict` with a multipart `file` part.
  pub async fn upload(&self, path: &Path) -> Result<Value> {
    let bytes = tokio::fs::read(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?;
    let filename = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload.csv".to_owned());

    let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));
    let req = self.client.post(self.url("/predict")).multipart(form);
    self.send("POST /predict (file)", req).await
  }

  // ── History ───────────────────────────────────────────────────────────────

  /// `GET /api/reviews?limit=<n>&skip=<n>`
  pub async fn reviews(&self, limit: usize, skip: usize) -> Result<Value> {
    let req = self
      .client
      .get(self.url("/api/reviews"))
      .query(&[("limit", limit), ("skip", skip)]);
    self.send("GET /api/reviews", req).await
  }

  /// `GET /api/sessions`, or one session's reviews.
  pub async fn sessions(&self, session_id: Option<&str>) -> Result<Value> {
    match session_id {
      Some(id) => {
        let path = format!("/api/sessions/{id}/reviews");
        let req = self.client.get(self.url(&path));
        self.send(&format!("GET {path}"), req).await
      }
      None => self.send("GET /api/sessions", self.client.get(self.url("/api/sessions"))).await,
    }
  }

  // ── Account ───────────────────────────────────────────────────────────────

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<Value> {
    self.send("GET /api/stats", self.client.get(self.url("/api/stats"))).await
  }

  /// `POST /api/refresh-user-info`
  pub async fn refresh_profile(&self) -> Result<Value> {
    let req = self.client.post(self.url("/api/refresh-user-info"));
    self.send("POST /api/refresh-user-info", req).await
  }
}
