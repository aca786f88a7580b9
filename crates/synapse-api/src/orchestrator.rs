//! The request-facing prediction workflow.
//!
//! Both prediction paths follow the same sequence: resolve the caller's
//! subject record, score the texts, persist the result. Persistence is
//! best-effort on those paths; the prediction is still returned when the
//! store is unavailable, flagged `persisted: false`. Read paths report store
//! failures as [`ApiError::PersistenceUnavailable`].

use std::{future::Future, sync::Arc, time::Duration};

use synapse_core::{
  review::{AnalysisSession, NewReview, Review, ReviewInput, SentimentCounts},
  store::SubjectStore,
  subject::{AuthenticatedContext, Subject, SubjectStats},
};
use synapse_nlp::{Prediction, Predictor};
use uuid::Uuid;

use crate::ApiError;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

const EXPORT_PAGE_SIZE: usize = 500;

/// Result of a single-text prediction.
#[derive(Debug, Clone)]
pub struct SingleOutcome {
  pub prediction: Prediction,
  pub persisted:  bool,
}

/// Result of a bulk prediction.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
  pub filename:   String,
  /// `None` when the session could not be stored.
  pub session_id: Option<Uuid>,
  pub counts:     SentimentCounts,
  pub rows:       Vec<(String, Prediction)>,
  pub persisted:  bool,
}

pub struct PredictionOrchestrator<S> {
  store:         Arc<S>,
  predictor:     Arc<Predictor>,
  store_timeout: Duration,
}

impl<S: SubjectStore> PredictionOrchestrator<S> {
  pub fn new(store: Arc<S>, predictor: Arc<Predictor>) -> Self {
    Self { store, predictor, store_timeout: DEFAULT_STORE_TIMEOUT }
  }

  pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
    self.store_timeout = timeout;
    self
  }

  /// Run a store call under the configured timeout.
  async fn guarded<T, E>(
    &self,
    operation: &'static str,
    call: impl Future<Output = Result<T, E>>,
  ) -> Result<T, ApiError>
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match tokio::time::timeout(self.store_timeout, call).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => Err(ApiError::persistence(e)),
      Err(_) => Err(ApiError::PersistenceUnavailable(
        format!("{operation} timed out after {:?}", self.store_timeout).into(),
      )),
    }
  }

  /// Fetch or create the caller's subject, filling unknown profile fields.
  pub async fn resolve_subject(&self, ctx: &AuthenticatedContext) -> Result<Subject, ApiError> {
    self
      .guarded(
        "get_or_create_subject",
        self.store.get_or_create_subject(&ctx.subject_id, ctx.email.clone(), ctx.name.clone()),
      )
      .await
  }

  /// Like [`resolve_subject`](Self::resolve_subject) but a failure is only
  /// logged. Every authenticated operation touches the subject record.
  async fn touch_subject(&self, ctx: &AuthenticatedContext) {
    if let Err(e) = self.resolve_subject(ctx).await {
      tracing::warn!(subject = ctx.subject_id.redacted(), "could not resolve subject: {e}");
    }
  }

  // ── Prediction ──────────────────────────────────────────────────────────

  pub async fn predict_single(
    &self,
    ctx: &AuthenticatedContext,
    text: String,
  ) -> Result<SingleOutcome, ApiError> {
    self.touch_subject(ctx).await;

    let prediction = self.predictor.predict_one(&text)?;
    let input = ReviewInput::new(text, prediction.label, prediction.confidence)
      .map_err(out_of_range)?;

    let persisted = match self
      .guarded(
        "record_review",
        self.store.record_review(NewReview { owner_subject_id: ctx.subject_id.clone(), input }),
      )
      .await
    {
      Ok(_) => {
        tracing::info!(
          subject = ctx.subject_id.redacted(),
          sentiment = prediction.label.as_str(),
          "saved review"
        );
        true
      }
      Err(e) => {
        tracing::warn!(subject = ctx.subject_id.redacted(), "review not saved: {e}");
        false
      }
    };

    Ok(SingleOutcome { prediction, persisted })
  }

  pub async fn predict_bulk(
    &self,
    ctx: &AuthenticatedContext,
    filename: String,
    texts: Vec<String>,
  ) -> Result<BulkOutcome, ApiError> {
    self.touch_subject(ctx).await;

    let predictions = self.predictor.predict(&texts)?;
    let counts = SentimentCounts::tally(predictions.iter().map(|p| &p.label));
    let rows: Vec<(String, Prediction)> = texts.into_iter().zip(predictions).collect();

    let inputs = rows
      .iter()
      .map(|(text, p)| ReviewInput::new(text.clone(), p.label, p.confidence))
      .collect::<Result<Vec<_>, _>>()
      .map_err(out_of_range)?;

    let session_id = match self
      .guarded(
        "record_session",
        self.store.record_session(&ctx.subject_id, &filename, inputs),
      )
      .await
    {
      Ok((session, _)) => {
        tracing::info!(
          subject = ctx.subject_id.redacted(),
          total = session.total_reviews,
          positive = session.positive_count,
          "saved analysis session"
        );
        Some(session.session_id)
      }
      Err(e) => {
        tracing::warn!(subject = ctx.subject_id.redacted(), "analysis session not saved: {e}");
        None
      }
    };

    Ok(BulkOutcome {
      filename,
      persisted: session_id.is_some(),
      session_id,
      counts,
      rows,
    })
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  pub async fn list_reviews(
    &self,
    ctx: &AuthenticatedContext,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<Review>, ApiError> {
    self.touch_subject(ctx).await;
    self.review_page(ctx, limit, offset).await
  }

  async fn review_page(
    &self,
    ctx: &AuthenticatedContext,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<Review>, ApiError> {
    self
      .guarded("list_reviews", self.store.list_reviews(&ctx.subject_id, limit, offset))
      .await
  }

  /// Every review the caller owns, newest first, fetched page by page.
  pub async fn all_reviews(&self, ctx: &AuthenticatedContext) -> Result<Vec<Review>, ApiError> {
    self.touch_subject(ctx).await;
    let mut reviews = Vec::new();
    loop {
      let page = self.review_page(ctx, EXPORT_PAGE_SIZE, reviews.len()).await?;
      let done = page.len() < EXPORT_PAGE_SIZE;
      reviews.extend(page);
      if done {
        return Ok(reviews);
      }
    }
  }

  pub async fn list_sessions(
    &self,
    ctx: &AuthenticatedContext,
  ) -> Result<Vec<AnalysisSession>, ApiError> {
    self.touch_subject(ctx).await;
    self.guarded("list_sessions", self.store.list_sessions(&ctx.subject_id)).await
  }

  pub async fn session_reviews(
    &self,
    ctx: &AuthenticatedContext,
    session_id: Uuid,
  ) -> Result<Vec<Review>, ApiError> {
    self.touch_subject(ctx).await;
    self
      .guarded("session_reviews", self.store.session_reviews(&ctx.subject_id, session_id))
      .await?
      .ok_or_else(|| ApiError::NotFound(format!("session {session_id} not found")))
  }

  pub async fn stats(&self, ctx: &AuthenticatedContext) -> Result<SubjectStats, ApiError> {
    self.resolve_subject(ctx).await?;
    self.guarded("stats", self.store.stats(&ctx.subject_id)).await
  }

  /// Overwrite stored profile fields with the verified claims that are
  /// present.
  pub async fn refresh_profile(&self, ctx: &AuthenticatedContext) -> Result<Subject, ApiError> {
    self
      .guarded(
        "refresh_profile",
        self.store.refresh_profile(&ctx.subject_id, ctx.email.clone(), ctx.name.clone()),
      )
      .await
  }
}

/// A confidence the predictor produced but a review cannot hold.
fn out_of_range(e: synapse_core::Error) -> ApiError {
  ApiError::ModelUnavailable(synapse_nlp::Error::ModelUnavailable(e.to_string()))
}
