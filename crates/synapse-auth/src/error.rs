//! Error types for `synapse-auth`.

use thiserror::Error;

/// Why a credential was rejected. Every variant maps to HTTP 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
  #[error("missing bearer credential")]
  MissingCredential,

  #[error("malformed credential: {0}")]
  MalformedCredential(String),

  #[error("credential verification failed: {0}")]
  VerificationFailed(String),
}

impl AuthError {
  /// Stable machine-readable discriminant.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::MissingCredential => "missing_credential",
      Self::MalformedCredential(_) => "malformed_credential",
      Self::VerificationFailed(_) => "verification_failed",
    }
  }
}

/// A failure talking to the identity provider.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{0}")]
  Other(String),
}
