//! Text normalisation ahead of vectorisation.
//!
//! The pipeline is fixed and must stay identical to the one the model
//! vocabulary was fitted against:
//!
//! 1. every character that is not an ASCII letter becomes a space
//! 2. lowercase
//! 3. split on whitespace
//! 4. drop English stopwords
//! 5. Porter-stem what is left
//! 6. join with single spaces

use std::collections::HashSet;

use crate::{porter::PorterStemmer, stopwords};

#[derive(Debug, Clone)]
pub struct TextNormalizer {
  stopwords: HashSet<&'static str>,
  stemmer:   PorterStemmer,
}

impl Default for TextNormalizer {
  fn default() -> Self { Self::new() }
}

impl TextNormalizer {
  pub fn new() -> Self {
    Self {
      stopwords: stopwords::ENGLISH.iter().copied().collect(),
      stemmer:   PorterStemmer::new(),
    }
  }

  /// Normalise one text. Never fails; text with no surviving tokens yields
  /// an empty string.
  pub fn normalize(&self, text: &str) -> String {
    let letters: String = text
      .chars()
      .map(|c| if c.is_ascii_alphabetic() { c.to_ascii_lowercase() } else { ' ' })
      .collect();

    letters
      .split_whitespace()
      .filter(|token| !self.stopwords.contains(token))
      .map(|token| self.stemmer.stem(token))
      .collect::<Vec<_>>()
      .join(" ")
  }

  pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
    texts.iter().map(|t| self.normalize(t.as_ref())).collect()
  }
}
