//! JSON HTTP API for Synapse.
//!
//! Exposes an axum [`Router`] backed by any [`synapse_core::store::SubjectStore`].
//! CORS, tracing and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = synapse_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod account;
pub mod error;
pub mod extract;
#[cfg(test)]
mod fakes;
pub mod history;
pub mod ingest;
pub mod orchestrator;
pub mod predict;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use synapse_auth::CredentialVerifier;
use synapse_core::store::SubjectStore;

pub use error::ApiError;
pub use orchestrator::PredictionOrchestrator;

/// Largest accepted request body, uploads included.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state handed to every handler.
pub struct AppState<S> {
  pub orchestrator: Arc<PredictionOrchestrator<S>>,
  pub verifier:     Arc<CredentialVerifier>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      orchestrator: Arc::clone(&self.orchestrator),
      verifier:     Arc::clone(&self.verifier),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(orchestrator: PredictionOrchestrator<S>, verifier: CredentialVerifier) -> Self {
    Self { orchestrator: Arc::new(orchestrator), verifier: Arc::new(verifier) }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SubjectStore + 'static,
{
  Router::new()
    .route("/test", get(predict::liveness))
    .route("/predict", post(predict::predict::<S>))
    // History
    .route("/api/reviews", get(history::reviews::<S>))
    .route("/api/sessions", get(history::sessions::<S>))
    .route("/api/sessions/{id}/reviews", get(history::session_reviews::<S>))
    .route("/api/user-data", get(history::user_data::<S>))
    // Account
    .route("/api/stats", get(account::stats::<S>))
    .route("/api/refresh-user-info", post(account::refresh::<S>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use synapse_core::{store::SubjectStore, subject::SubjectId};
  use synapse_nlp::{
    Predictor, TextNormalizer,
    artifact::{CountVectorizer, LogisticClassifier, StandardScaler},
  };
  use synapse_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  const BOUNDARY: &str = "synapse-test-boundary";

  fn predictor() -> Predictor {
    let vocabulary = HashMap::from([
      ("great".to_owned(), 0),
      ("love".to_owned(), 1),
      ("terribl".to_owned(), 2),
      ("broke".to_owned(), 3),
    ]);
    Predictor::new(
      TextNormalizer::new(),
      Arc::new(CountVectorizer::new(vocabulary)),
      Arc::new(StandardScaler::new(vec![0.0; 4], vec![1.0; 4])),
      Arc::new(LogisticClassifier::new(vec![2.0, 2.0, -2.0, -2.0], 0.0)),
    )
  }

  async fn setup() -> (Router, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let orchestrator = PredictionOrchestrator::new(Arc::clone(&store), Arc::new(predictor()));
    let state = AppState::new(orchestrator, CredentialVerifier::degraded());
    (api_router(state), store)
  }

  fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
  }

  fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
      .uri(uri)
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap()
  }

  fn multipart_request(token: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, filename, content) in parts {
      body.push_str(&format!("--{BOUNDARY}\r\n"));
      match filename {
        Some(filename) => body.push_str(&format!(
          "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
           Content-Type: text/csv\r\n\r\n"
        )),
        None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
      }
      body.push_str(content);
      body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
      .method("POST")
      .uri("/predict")
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
      .body(Body::from(body))
      .unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// The id a degraded verifier assigns to `token`.
  async fn subject_for(token: &str) -> SubjectId {
    CredentialVerifier::degraded()
      .verify(Some(format!("Bearer {token}").as_str()))
      .await
      .unwrap()
      .subject_id
  }

  // ─── Liveness and auth ────────────────────────────────────────────────────

  #[tokio::test]
  async fn liveness_needs_no_credential() {
    let (app, _) = setup().await;
    let resp = app
      .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn predict_without_credential_is_rejected_and_touches_nothing() {
    let (app, store) = setup().await;
    let resp = app
      .oneshot(json_request("POST", "/predict", None, json!({ "text": "great" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["kind"], "missing_credential");
    assert!(store.subjects_missing_profile().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn read_endpoints_require_a_credential() {
    let (app, _) = setup().await;
    for uri in ["/api/reviews", "/api/sessions", "/api/stats", "/api/user-data"] {
      let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
  }

  // ─── Predict ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn single_prediction_is_returned_and_stored() {
    let (app, _) = setup().await;
    let resp = app
      .clone()
      .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "text": "Great, love it!" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["prediction"], "Positive");
    assert_eq!(body["persisted"], true);
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));

    let resp = app.oneshot(get_request("/api/reviews", "tok-a")).await.unwrap();
    let body = body_json(resp).await;
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["text"], "Great, love it!");
    assert_eq!(reviews[0]["session_id"], Value::Null);
  }

  #[tokio::test]
  async fn predict_with_neither_input_is_invalid() {
    let (app, store) = setup().await;
    let resp = app
      .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "other": 1 })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["kind"], "invalid_input");
    assert_eq!(store.stats(&subject_for("tok-a").await).await.unwrap().account_created, None);
  }

  #[tokio::test]
  async fn predict_with_both_inputs_is_invalid() {
    let (app, _) = setup().await;
    let req = multipart_request("tok-a", &[
      ("text", None, "great"),
      ("file", Some("reviews.csv"), "Sentence\ngreat\n"),
    ]);
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn multipart_text_part_is_a_single_prediction() {
    let (app, _) = setup().await;
    let resp = app
      .oneshot(multipart_request("tok-a", &[("text", None, "it broke, terrible")]))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["prediction"], "Negative");
  }

  #[tokio::test]
  async fn bulk_upload_records_a_session() {
    let (app, _) = setup().await;
    let csv = "id,Sentence\n1,Great phone\n2,Love the screen\n3,Broke in a week\n";
    let resp = app
      .clone()
      .oneshot(multipart_request("tok-a", &[("file", Some("reviews.csv"), csv)]))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["filename"], "reviews.csv");
    assert_eq!(body["total_reviews"], 3);
    assert_eq!(body["positive_count"], 2);
    assert_eq!(body["negative_count"], 1);
    assert_eq!(body["persisted"], true);
    assert_eq!(body["rows"][2]["prediction"], "Negative");
    let session_id = body["session_id"].as_str().unwrap().to_owned();

    let resp = app
      .clone()
      .oneshot(get_request(&format!("/api/sessions/{session_id}/reviews"), "tok-a"))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["reviews"].as_array().unwrap().len(), 3);

    let resp = app.oneshot(get_request("/api/stats", "tok-a")).await.unwrap();
    let stats = body_json(resp).await;
    assert_eq!(stats["total_reviews"], 3);
    assert_eq!(stats["positive_reviews"], 2);
    assert_eq!(stats["negative_reviews"], 1);
    assert_eq!(stats["total_sessions"], 1);
  }

  #[tokio::test]
  async fn bulk_upload_without_text_column_is_invalid() {
    let (app, _) = setup().await;
    let resp = app
      .oneshot(multipart_request("tok-a", &[("file", Some("data.csv"), "id,stars\n1,5\n")]))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Available columns: id, stars"));
  }

  #[tokio::test]
  async fn spreadsheet_upload_is_unsupported() {
    let (app, _) = setup().await;
    let resp = app
      .oneshot(multipart_request("tok-a", &[("file", Some("data.xlsx"), "PK")]))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("unsupported file format"));
  }

  // ─── Isolation ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sessions_of_another_caller_are_not_found() {
    let (app, _) = setup().await;
    let resp = app
      .clone()
      .oneshot(multipart_request("tok-a", &[("file", Some("a.csv"), "text\ngreat\n")]))
      .await
      .unwrap();
    let session_id = body_json(resp).await["session_id"].as_str().unwrap().to_owned();

    let uri = format!("/api/sessions/{session_id}/reviews");
    let resp = app.clone().oneshot(get_request(&uri, "tok-b")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["kind"], "not_found");

    let resp = app.clone().oneshot(get_request("/api/sessions", "tok-b")).await.unwrap();
    assert!(body_json(resp).await["sessions"].as_array().unwrap().is_empty());

    let resp = app.oneshot(get_request("/api/sessions/not-a-uuid/reviews", "tok-a")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ─── History ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reviews_paginate_newest_first() {
    let (app, _) = setup().await;
    for text in ["one", "two", "three"] {
      app
        .clone()
        .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "text": text })))
        .await
        .unwrap();
    }

    let resp = app
      .clone()
      .oneshot(get_request("/api/reviews?limit=1&skip=1", "tok-a"))
      .await
      .unwrap();
    let body = body_json(resp).await;
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["text"], "two");

    let resp = app.oneshot(get_request("/api/reviews?limit=lots", "tok-a")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn user_data_uses_dashboard_row_shape() {
    let (app, _) = setup().await;
    app
      .clone()
      .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "text": "great" })))
      .await
      .unwrap();

    let resp = app.oneshot(get_request("/api/user-data", "tok-a")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["reviews"][0]["Sentence"], "great");
    assert_eq!(body["reviews"][0]["Predicted sentiment"], "Positive");
    assert!(body["reviews"][0]["confidence"].is_number());
  }

  #[tokio::test]
  async fn stats_create_the_subject_and_refresh_reports_profile() {
    let (app, store) = setup().await;
    let resp = app.clone().oneshot(get_request("/api/stats", "tok-a")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats = body_json(resp).await;
    assert_eq!(stats["total_reviews"], 0);
    assert!(stats["account_created"].is_string());

    let resp = app
      .oneshot(json_request("POST", "/api/refresh-user-info", Some("tok-a"), json!({})))
      .await
      .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["email"], Value::Null);

    let missing = store.subjects_missing_profile().await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].subject_id, subject_for("tok-a").await);
  }

  // ─── Failure paths ────────────────────────────────────────────────────────

  use std::time::Duration;

  use crate::fakes::{BrokenStore, Failure, broken_predictor};

  fn broken_app(failure: Failure) -> Router {
    let orchestrator = PredictionOrchestrator::new(Arc::new(BrokenStore(failure)), Arc::new(predictor()))
      .with_store_timeout(Duration::from_millis(10));
    api_router(AppState::new(orchestrator, CredentialVerifier::degraded()))
  }

  #[tokio::test]
  async fn predictions_survive_an_offline_store() {
    let app = broken_app(Failure::Error);
    let resp = app
      .clone()
      .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "text": "great" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["prediction"], "Positive");
    assert_eq!(body["persisted"], false);

    let resp = app
      .oneshot(multipart_request("tok-a", &[("file", Some("r.csv"), "text\ngreat\nterrible")]))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session_id"], Value::Null);
    assert_eq!(body["persisted"], false);
    assert_eq!(body["total_reviews"], 2);
  }

  #[tokio::test]
  async fn reads_from_an_offline_store_are_503() {
    for failure in [Failure::Error, Failure::Hang] {
      let app = broken_app(failure);
      for uri in ["/api/reviews", "/api/sessions", "/api/stats", "/api/user-data"] {
        let resp = app.clone().oneshot(get_request(uri, "tok-a")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri} {failure:?}");
        assert_eq!(body_json(resp).await["kind"], "persistence_unavailable");
      }
    }
  }

  #[tokio::test]
  async fn failing_model_is_500() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let orchestrator = PredictionOrchestrator::new(store, broken_predictor());
    let app = api_router(AppState::new(orchestrator, CredentialVerifier::degraded()));

    let resp = app
      .oneshot(json_request("POST", "/predict", Some("tok-a"), json!({ "text": "great" })))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["kind"], "model_unavailable");
  }
}
