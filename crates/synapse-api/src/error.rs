//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use synapse_auth::AuthError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("model unavailable: {0}")]
  ModelUnavailable(#[from] synapse_nlp::Error),

  #[error("persistence unavailable: {0}")]
  PersistenceUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("not found: {0}")]
  NotFound(String),
}

impl ApiError {
  pub fn persistence(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::PersistenceUnavailable(Box::new(e))
  }

  /// Stable machine-readable discriminant, sent as `kind`.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Auth(e) => e.kind(),
      Self::InvalidInput(_) => "invalid_input",
      Self::ModelUnavailable(_) => "model_unavailable",
      Self::PersistenceUnavailable(_) => "persistence_unavailable",
      Self::NotFound(_) => "not_found",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Auth(_) => StatusCode::UNAUTHORIZED,
      Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
      Self::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let Self::ModelUnavailable(e) = &self {
      tracing::error!("prediction failed: {e}");
    }
    let body = json!({ "error": self.to_string(), "kind": self.kind() });
    (self.status(), Json(body)).into_response()
  }
}
