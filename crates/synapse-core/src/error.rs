//! Error types for `synapse-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject id must not be empty")]
  EmptySubjectId,

  #[error("unknown sentiment label: {0:?}")]
  UnknownSentiment(String),

  #[error("confidence {0} is outside [0, 1]")]
  ConfidenceOutOfRange(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
