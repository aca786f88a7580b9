//! Error types for the synapse-nlp pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A vectorizer, scaler or classifier failed. Not transient; the request
  /// that hit it fails and nothing retries.
  #[error("model unavailable: {0}")]
  ModelUnavailable(String),

  #[error("invalid model artifact: {0}")]
  Artifact(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// Collapse any error into [`Error::ModelUnavailable`], keeping the message.
  pub(crate) fn into_unavailable(self) -> Self {
    match self {
      Self::ModelUnavailable(_) => self,
      other => Self::ModelUnavailable(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
