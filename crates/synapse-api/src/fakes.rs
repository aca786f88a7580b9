//! Store and model doubles for exercising the failure paths.

use std::{future::Future, sync::Arc};

use synapse_core::{
  review::{AnalysisSession, NewReview, Review, ReviewInput},
  store::SubjectStore,
  subject::{Subject, SubjectId, SubjectStats},
};
use synapse_nlp::{
  Predictor, TextNormalizer,
  artifact::{CountVectorizer, StandardScaler},
  model::{Classifier, FeatureMatrix},
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[error("store offline")]
pub struct Offline;

/// How every call on a [`BrokenStore`] behaves.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
  /// Resolves immediately with [`Offline`].
  Error,
  /// Never resolves.
  Hang,
}

pub struct BrokenStore(pub Failure);

impl BrokenStore {
  fn fail<T>(&self) -> impl Future<Output = Result<T, Offline>> + Send + 'static
  where
    T: Send + 'static,
  {
    let failure = self.0;
    async move {
      match failure {
        Failure::Error => Err(Offline),
        Failure::Hang => std::future::pending().await,
      }
    }
  }
}

impl SubjectStore for BrokenStore {
  type Error = Offline;

  fn get_or_create_subject<'a>(
    &'a self,
    _: &'a SubjectId,
    _: Option<String>,
    _: Option<String>,
  ) -> impl Future<Output = Result<Subject, Offline>> + Send + 'a {
    self.fail()
  }

  fn refresh_profile<'a>(
    &'a self,
    _: &'a SubjectId,
    _: Option<String>,
    _: Option<String>,
  ) -> impl Future<Output = Result<Subject, Offline>> + Send + 'a {
    self.fail()
  }

  fn subjects_missing_profile(&self) -> impl Future<Output = Result<Vec<Subject>, Offline>> + Send + '_ {
    self.fail()
  }

  fn record_review(&self, _: NewReview) -> impl Future<Output = Result<Review, Offline>> + Send + '_ {
    self.fail()
  }

  fn record_session<'a>(
    &'a self,
    _: &'a SubjectId,
    _: &'a str,
    _: Vec<ReviewInput>,
  ) -> impl Future<Output = Result<(AnalysisSession, Vec<Review>), Offline>> + Send + 'a {
    self.fail()
  }

  fn list_reviews<'a>(
    &'a self,
    _: &'a SubjectId,
    _: usize,
    _: usize,
  ) -> impl Future<Output = Result<Vec<Review>, Offline>> + Send + 'a {
    self.fail()
  }

  fn list_sessions<'a>(
    &'a self,
    _: &'a SubjectId,
  ) -> impl Future<Output = Result<Vec<AnalysisSession>, Offline>> + Send + 'a {
    self.fail()
  }

  fn session_reviews<'a>(
    &'a self,
    _: &'a SubjectId,
    _: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<Review>>, Offline>> + Send + 'a {
    self.fail()
  }

  fn stats<'a>(
    &'a self,
    _: &'a SubjectId,
  ) -> impl Future<Output = Result<SubjectStats, Offline>> + Send + 'a {
    self.fail()
  }
}

/// A classifier whose weights never loaded.
pub struct BrokenClassifier;

impl Classifier for BrokenClassifier {
  fn predict_proba(&self, _: &FeatureMatrix) -> synapse_nlp::Result<Vec<[f64; 2]>> {
    Err(synapse_nlp::Error::Artifact("weights missing".into()))
  }
}

pub fn broken_predictor() -> Arc<Predictor> {
  Arc::new(Predictor::new(
    TextNormalizer::new(),
    Arc::new(CountVectorizer::new(std::collections::HashMap::from([("great".to_owned(), 0)]))),
    Arc::new(StandardScaler::new(vec![0.0], vec![1.0])),
    Arc::new(BrokenClassifier),
  ))
}
