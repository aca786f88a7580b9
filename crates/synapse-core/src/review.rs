//! Review and analysis-session types.
//!
//! A review is an immutable record of one scored text. Bulk submissions are
//! grouped under an [`AnalysisSession`] whose counts always equal the number
//! of reviews that point back at it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, subject::SubjectId};

// ─── Sentiment ───────────────────────────────────────────────────────────────

/// The polarity label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
  Positive,
  Negative,
}

impl Sentiment {
  /// Map a two-class argmax index to a label. Index 1 is positive.
  pub fn from_class_index(index: usize) -> Self {
    if index == 1 { Self::Positive } else { Self::Negative }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Positive => "Positive",
      Self::Negative => "Negative",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Positive" => Ok(Self::Positive),
      "Negative" => Ok(Self::Negative),
      other => Err(Error::UnknownSentiment(other.to_owned())),
    }
  }
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// One scored text item. No field changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:           Uuid,
  pub owner_subject_id:    SubjectId,
  pub text:                String,
  pub predicted_sentiment: Sentiment,
  pub confidence:          f64,
  /// `None` for single-item predictions.
  pub session_id:          Option<Uuid>,
  pub created_at:          DateTime<Utc>,
}

/// A scored text awaiting persistence; ownership is supplied separately.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewInput {
  pub text:       String,
  pub sentiment:  Sentiment,
  pub confidence: f64,
}

impl ReviewInput {
  /// Build an input, rejecting confidences outside `[0, 1]` (and NaN).
  pub fn new(text: impl Into<String>, sentiment: Sentiment, confidence: f64) -> Result<Self> {
    if !(0.0..=1.0).contains(&confidence) {
      return Err(Error::ConfidenceOutOfRange(confidence));
    }
    Ok(Self { text: text.into(), sentiment, confidence })
  }
}

/// Input to [`crate::store::SubjectStore::record_review`].
/// `review_id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewReview {
  pub owner_subject_id: SubjectId,
  pub input:            ReviewInput,
}

// ─── AnalysisSession ─────────────────────────────────────────────────────────

/// The record grouping one bulk submission's reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
  pub session_id:       Uuid,
  pub owner_subject_id: SubjectId,
  pub source_filename:  String,
  pub total_reviews:    u64,
  pub positive_count:   u64,
  pub negative_count:   u64,
  pub created_at:       DateTime<Utc>,
}

/// Positive and negative tallies over a set of inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
  pub positive: u64,
  pub negative: u64,
}

impl SentimentCounts {
  pub fn tally<'a>(labels: impl IntoIterator<Item = &'a Sentiment>) -> Self {
    labels.into_iter().fold(Self::default(), |mut acc, label| {
      match label {
        Sentiment::Positive => acc.positive += 1,
        Sentiment::Negative => acc.negative += 1,
      }
      acc
    })
  }

  pub fn total(&self) -> u64 { self.positive + self.negative }
}
