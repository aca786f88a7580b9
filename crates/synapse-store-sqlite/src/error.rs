//! Error type for `synapse-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] synapse_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside its domain.
  #[error("corrupt column {column}: {value}")]
  Corrupt { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
