//! Batch sentiment prediction.

use std::sync::Arc;

use synapse_core::review::Sentiment;

use crate::{
  Error, Result,
  model::{Classifier, Scaler, Vectorizer},
  normalize::TextNormalizer,
};

/// One scored input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
  pub label:      Sentiment,
  pub confidence: f64,
}

/// Normalise → vectorise → scale → score.
///
/// Every stage is called once per batch, so a single text and the same text
/// inside a larger batch score identically.
#[derive(Clone)]
pub struct Predictor {
  normalizer: TextNormalizer,
  vectorizer: Arc<dyn Vectorizer>,
  scaler:     Arc<dyn Scaler>,
  classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for Predictor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Predictor").finish_non_exhaustive()
  }
}

impl Predictor {
  pub fn new(
    normalizer: TextNormalizer,
    vectorizer: Arc<dyn Vectorizer>,
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
  ) -> Self {
    Self { normalizer, vectorizer, scaler, classifier }
  }

  pub fn normalizer(&self) -> &TextNormalizer { &self.normalizer }

  /// Score `texts`, preserving order. Any stage failure, or a stage that
  /// returns something other than one finite two-class row per input, is
  /// reported as [`Error::ModelUnavailable`].
  pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let normalized = self.normalizer.normalize_all(texts);
    let features = self.vectorizer.vectorize(&normalized).map_err(Error::into_unavailable)?;
    check_rows("vectorizer", features.len(), texts.len())?;
    let scaled = self.scaler.scale(features).map_err(Error::into_unavailable)?;
    check_rows("scaler", scaled.len(), texts.len())?;
    let proba = self.classifier.predict_proba(&scaled).map_err(Error::into_unavailable)?;
    check_rows("classifier", proba.len(), texts.len())?;

    proba.iter().map(|row| to_prediction(*row)).collect()
  }

  pub fn predict_one(&self, text: &str) -> Result<Prediction> {
    self
      .predict(&[text])?
      .pop()
      .ok_or_else(|| Error::ModelUnavailable("classifier returned no rows".into()))
  }
}

fn check_rows(stage: &str, got: usize, expected: usize) -> Result<()> {
  if got != expected {
    return Err(Error::ModelUnavailable(format!(
      "{stage} returned {got} rows for {expected} inputs"
    )));
  }
  Ok(())
}

fn to_prediction(row: [f64; 2]) -> Result<Prediction> {
  if row.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
    return Err(Error::ModelUnavailable(format!("invalid probability row {row:?}")));
  }
  // Ties go to index 0.
  let index = if row[1] > row[0] { 1 } else { 0 };
  Ok(Prediction { label: Sentiment::from_class_index(index), confidence: row[index] })
}
