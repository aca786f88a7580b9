//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that text order equals time order. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use synapse_core::{
  review::{AnalysisSession, Review, Sentiment},
  subject::{Subject, SubjectId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Saturates at `i64::MAX`.
pub fn encode_count(n: impl TryInto<i64>) -> i64 { n.try_into().unwrap_or(i64::MAX) }

pub fn decode_count(column: &'static str, n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Corrupt { column, value: n.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str =
  "subject_id, email, display_name, created_at, updated_at, total_reviews, total_sessions";

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:     String,
  pub email:          Option<String>,
  pub display_name:   Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
  pub total_reviews:  i64,
  pub total_sessions: i64,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:     row.get(0)?,
      email:          row.get(1)?,
      display_name:   row.get(2)?,
      created_at:     row.get(3)?,
      updated_at:     row.get(4)?,
      total_reviews:  row.get(5)?,
      total_sessions: row.get(6)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:     SubjectId::new(&self.subject_id)?,
      email:          self.email,
      display_name:   self.display_name,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
      total_reviews:  decode_count("subjects.total_reviews", self.total_reviews)?,
      total_sessions: decode_count("subjects.total_sessions", self.total_sessions)?,
    })
  }
}

pub const REVIEW_COLUMNS: &str =
  "review_id, owner_subject_id, text, predicted_sentiment, confidence, session_id, created_at";

/// Raw values read directly from a `reviews` row.
pub struct RawReview {
  pub review_id:           String,
  pub owner_subject_id:    String,
  pub text:                String,
  pub predicted_sentiment: String,
  pub confidence:          f64,
  pub session_id:          Option<String>,
  pub created_at:          String,
}

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:           row.get(0)?,
      owner_subject_id:    row.get(1)?,
      text:                row.get(2)?,
      predicted_sentiment: row.get(3)?,
      confidence:          row.get(4)?,
      session_id:          row.get(5)?,
      created_at:          row.get(6)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:           decode_uuid(&self.review_id)?,
      owner_subject_id:    SubjectId::new(&self.owner_subject_id)?,
      text:                self.text,
      predicted_sentiment: Sentiment::parse(&self.predicted_sentiment)?,
      confidence:          self.confidence,
      session_id:          self.session_id.as_deref().map(decode_uuid).transpose()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub const SESSION_COLUMNS: &str = "session_id, owner_subject_id, source_filename, total_reviews, \
                                   positive_count, negative_count, created_at";

/// Raw values read directly from an `analysis_sessions` row.
pub struct RawSession {
  pub session_id:       String,
  pub owner_subject_id: String,
  pub source_filename:  String,
  pub total_reviews:    i64,
  pub positive_count:   i64,
  pub negative_count:   i64,
  pub created_at:       String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:       row.get(0)?,
      owner_subject_id: row.get(1)?,
      source_filename:  row.get(2)?,
      total_reviews:    row.get(3)?,
      positive_count:   row.get(4)?,
      negative_count:   row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_session(self) -> Result<AnalysisSession> {
    Ok(AnalysisSession {
      session_id:       decode_uuid(&self.session_id)?,
      owner_subject_id: SubjectId::new(&self.owner_subject_id)?,
      source_filename:  self.source_filename,
      total_reviews:    decode_count("analysis_sessions.total_reviews", self.total_reviews)?,
      positive_count:   decode_count("analysis_sessions.positive_count", self.positive_count)?,
      negative_count:   decode_count("analysis_sessions.negative_count", self.negative_count)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = early + chrono::Duration::nanoseconds(1);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn negative_counts_are_corrupt() {
    assert!(matches!(decode_count("x", -1), Err(Error::Corrupt { .. })));
    assert_eq!(decode_count("x", 7).unwrap(), 7);
  }

  #[test]
  fn counts_saturate_instead_of_wrapping() {
    assert_eq!(encode_count(7_usize), 7);
    assert_eq!(encode_count(u64::MAX), i64::MAX);
    assert_eq!(encode_count(usize::MAX), i64::MAX);
  }
}
