//! Subjects: verified end-user identities and the unit of data isolation.
//!
//! Every review and analysis session is owned by exactly one subject. The
//! owning id always comes from credential verification, never from a request
//! payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── SubjectId ───────────────────────────────────────────────────────────────

/// A non-empty, whitespace-trimmed subject identifier.
///
/// There is no way to build an empty `SubjectId`: [`SubjectId::new`] trims its
/// input and rejects blank values, and deserialisation goes through the same
/// path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
  pub fn new(raw: impl AsRef<str>) -> Result<Self> {
    let trimmed = raw.as_ref().trim();
    if trimmed.is_empty() {
      return Err(Error::EmptySubjectId);
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// At most the first 20 characters, for log lines.
  pub fn redacted(&self) -> &str {
    match self.0.char_indices().nth(20) {
      Some((idx, _)) => &self.0[..idx],
      None => &self.0,
    }
  }
}

impl fmt::Display for SubjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl TryFrom<String> for SubjectId {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<SubjectId> for String {
  fn from(id: SubjectId) -> Self { id.0 }
}

// ─── Authenticated context ───────────────────────────────────────────────────

/// The typed outcome of a successful credential verification.
///
/// Handlers receive this as an explicit parameter; it is the only source of
/// the subject id used for attribution and lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedContext {
  pub subject_id: SubjectId,
  pub email:      Option<String>,
  pub name:       Option<String>,
}

// ─── Subject ─────────────────────────────────────────────────────────────────

/// The durable per-identity record.
///
/// `email` and `display_name` are fill-once on the regular request path.
/// `total_reviews` and `total_sessions` are best-effort counters; use
/// [`SubjectStats`] for exact figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:     SubjectId,
  pub email:          Option<String>,
  pub display_name:   Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
  pub total_reviews:  u64,
  pub total_sessions: u64,
}

impl Subject {
  /// Whether either profile field is still unknown.
  pub fn is_profile_incomplete(&self) -> bool {
    self.email.is_none() || self.display_name.is_none()
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Per-subject statistics, computed by counting stored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
  pub total_reviews:    u64,
  pub positive_reviews: u64,
  pub negative_reviews: u64,
  pub total_sessions:   u64,
  /// `None` when no subject row exists yet.
  pub account_created:  Option<DateTime<Utc>>,
}
