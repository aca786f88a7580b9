//! JSON model artifacts.
//!
//! The training pipeline exports a single bundle:
//!
//! ```json
//! {
//!   "vocabulary": { "great": 0, "batteri": 1 },
//!   "scaler":     { "mean": [0.1, 0.2], "scale": [0.3, 0.4] },
//!   "classifier": { "coef": [1.5, -0.2], "intercept": 0.05 }
//! }
//! ```
//!
//! [`ModelArtifacts::load`] validates that every dimension agrees, then
//! [`ModelArtifacts::into_parts`] splits the bundle into the three capability
//! implementations.

use std::{collections::HashMap, path::Path, sync::Arc};

use serde::Deserialize;

use crate::{
  Error, Result,
  model::{Classifier, FeatureMatrix, Scaler, Vectorizer},
};

// ─── Bundle ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifacts {
  pub vocabulary: HashMap<String, usize>,
  pub scaler:     ScalerParams,
  pub classifier: ClassifierParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
  pub mean:  Vec<f64>,
  pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierParams {
  pub coef:      Vec<f64>,
  pub intercept: f64,
}

impl ModelArtifacts {
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    Self::from_json(&raw)
  }

  pub fn from_json(raw: &str) -> Result<Self> {
    let artifacts: Self = serde_json::from_str(raw)?;
    artifacts.validate()?;
    Ok(artifacts)
  }

  /// Number of features every stage agrees on.
  pub fn dimension(&self) -> usize { self.classifier.coef.len() }

  fn validate(&self) -> Result<()> {
    let dim = self.dimension();
    if dim == 0 {
      return Err(Error::Artifact("classifier has no coefficients".into()));
    }
    if self.scaler.mean.len() != dim || self.scaler.scale.len() != dim {
      return Err(Error::Artifact(format!(
        "scaler has {} means and {} scales, classifier expects {dim}",
        self.scaler.mean.len(),
        self.scaler.scale.len(),
      )));
    }
    if let Some((token, idx)) = self.vocabulary.iter().find(|(_, idx)| **idx >= dim) {
      return Err(Error::Artifact(format!(
        "vocabulary entry {token:?} maps to column {idx}, dimension is {dim}"
      )));
    }
    let all_finite = self
      .scaler
      .mean
      .iter()
      .chain(&self.scaler.scale)
      .chain(&self.classifier.coef)
      .chain(std::iter::once(&self.classifier.intercept))
      .all(|v| v.is_finite());
    if !all_finite {
      return Err(Error::Artifact("non-finite model parameter".into()));
    }
    Ok(())
  }

  pub fn into_parts(
    self,
  ) -> (Arc<CountVectorizer>, Arc<StandardScaler>, Arc<LogisticClassifier>) {
    let dim = self.dimension();
    (
      Arc::new(CountVectorizer { vocabulary: self.vocabulary, dimension: dim }),
      Arc::new(StandardScaler::new(self.scaler.mean, self.scaler.scale)),
      Arc::new(LogisticClassifier {
        coef:      self.classifier.coef,
        intercept: self.classifier.intercept,
      }),
    )
  }
}

// ─── CountVectorizer ─────────────────────────────────────────────────────────

/// Bag-of-words term counts over a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
  vocabulary: HashMap<String, usize>,
  dimension:  usize,
}

impl CountVectorizer {
  pub fn new(vocabulary: HashMap<String, usize>) -> Self {
    let dimension = vocabulary.values().max().map_or(0, |max| max + 1);
    Self { vocabulary, dimension }
  }

  fn row(&self, doc: &str) -> Vec<f64> {
    let mut row = vec![0.0; self.dimension];
    // Single-letter tokens were never part of the fitted vocabulary.
    for token in doc.split_whitespace().filter(|t| t.chars().count() >= 2) {
      if let Some(&idx) = self.vocabulary.get(token) {
        row[idx] += 1.0;
      }
    }
    row
  }
}

impl Vectorizer for CountVectorizer {
  fn vectorize(&self, normalized: &[String]) -> Result<FeatureMatrix> {
    Ok(normalized.iter().map(|doc| self.row(doc)).collect())
  }
}

// ─── StandardScaler ──────────────────────────────────────────────────────────

/// `(x - mean) / scale` per column. A zero scale leaves the column unscaled.
#[derive(Debug, Clone)]
pub struct StandardScaler {
  mean:  Vec<f64>,
  scale: Vec<f64>,
}

impl StandardScaler {
  pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
    let scale = scale.into_iter().map(|s| if s == 0.0 { 1.0 } else { s }).collect();
    Self { mean, scale }
  }
}

impl Scaler for StandardScaler {
  fn scale(&self, mut features: FeatureMatrix) -> Result<FeatureMatrix> {
    for row in &mut features {
      if row.len() != self.mean.len() {
        return Err(Error::ModelUnavailable(format!(
          "scaler expects {} features, got {}",
          self.mean.len(),
          row.len()
        )));
      }
      for ((x, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
        *x = (*x - mean) / scale;
      }
    }
    Ok(features)
  }
}

// ─── LogisticClassifier ──────────────────────────────────────────────────────

/// Binary logistic regression; class 1 is positive.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
  coef:      Vec<f64>,
  intercept: f64,
}

impl LogisticClassifier {
  pub fn new(coef: Vec<f64>, intercept: f64) -> Self { Self { coef, intercept } }
}

fn sigmoid(z: f64) -> f64 { 1.0 / (1.0 + (-z).exp()) }

impl Classifier for LogisticClassifier {
  fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<[f64; 2]>> {
    features
      .iter()
      .map(|row| {
        if row.len() != self.coef.len() {
          return Err(Error::ModelUnavailable(format!(
            "classifier expects {} features, got {}",
            self.coef.len(),
            row.len()
          )));
        }
        let z: f64 = row.iter().zip(&self.coef).map(|(x, w)| x * w).sum::<f64>() + self.intercept;
        let p = sigmoid(z);
        Ok([1.0 - p, p])
      })
      .collect()
  }
}
