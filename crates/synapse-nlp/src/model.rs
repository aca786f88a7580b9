//! The three model capabilities the predictor composes.
//!
//! Each capability is batch-shaped: one call handles every row of a request.
//! Implementations are constructed once at startup and shared behind `Arc`,
//! so they take `&self` and must be `Send + Sync`.

use crate::Result;

/// Dense row-major feature matrix, one row per input text.
pub type FeatureMatrix = Vec<Vec<f64>>;

/// Turns normalised texts into feature rows.
pub trait Vectorizer: Send + Sync {
  fn vectorize(&self, normalized: &[String]) -> Result<FeatureMatrix>;
}

/// Rescales feature rows in place of the training-time scaler.
pub trait Scaler: Send + Sync {
  fn scale(&self, features: FeatureMatrix) -> Result<FeatureMatrix>;
}

/// Scores feature rows as `[p_negative, p_positive]`.
pub trait Classifier: Send + Sync {
  fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>>;
}
