//! Text normalisation and sentiment scoring for Synapse.
//!
//! [`TextNormalizer`] produces the canonical token string both prediction
//! paths feed to the model; [`Predictor`] composes it with the three model
//! capabilities in [`model`]. [`artifact`] provides JSON-backed
//! implementations of those capabilities.

pub mod artifact;
pub mod error;
pub mod model;
pub mod normalize;
pub mod porter;
pub mod predictor;
pub mod stopwords;

pub use error::{Error, Result};
pub use normalize::TextNormalizer;
pub use predictor::{Prediction, Predictor};

/// Build a [`Predictor`] from a JSON artifact bundle on disk.
pub fn load_predictor(path: impl AsRef<std::path::Path>) -> Result<Predictor> {
  let artifacts = artifact::ModelArtifacts::load(path.as_ref())?;
  tracing::info!(
    path = %path.as_ref().display(),
    vocabulary = artifacts.vocabulary.len(),
    features = artifacts.dimension(),
    "loaded model artifacts"
  );
  let (vectorizer, scaler, classifier) = artifacts.into_parts();
  Ok(Predictor::new(TextNormalizer::new(), vectorizer, scaler, classifier))
}
