//! Handlers for the caller's stored reviews and sessions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/reviews` | `?limit=` (default 50, max 500), `?skip=` |
//! | `GET`  | `/api/sessions` | Newest first |
//! | `GET`  | `/api/sessions/{id}/reviews` | 404 unless owned by the caller |
//! | `GET`  | `/api/user-data` | Every review, in the dashboard's row shape |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use synapse_core::{
  review::{AnalysisSession, Review},
  store::SubjectStore,
  subject::AuthenticatedContext,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

// ─── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ReviewParams {
  pub limit: Option<usize>,
  pub skip:  Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReviewList {
  pub reviews: Vec<Review>,
}

/// `GET /api/reviews[?limit=<n>&skip=<n>]`
pub async fn reviews<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
  params: Result<Query<ReviewParams>, QueryRejection>,
) -> Result<Json<ReviewList>, ApiError>
where
  S: SubjectStore + 'static,
{
  let Query(params) = params.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
  let skip = params.skip.unwrap_or(0);

  let reviews = state.orchestrator.list_reviews(&ctx, limit, skip).await?;
  Ok(Json(ReviewList { reviews }))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionList {
  pub sessions: Vec<AnalysisSession>,
}

/// `GET /api/sessions`
pub async fn sessions<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
) -> Result<Json<SessionList>, ApiError>
where
  S: SubjectStore + 'static,
{
  let sessions = state.orchestrator.list_sessions(&ctx).await?;
  Ok(Json(SessionList { sessions }))
}

/// `GET /api/sessions/{id}/reviews`
///
/// An id that is not a UUID cannot name a caller-owned session, so it is a
/// 404 like any other unknown id.
pub async fn session_reviews<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
  Path(id): Path<String>,
) -> Result<Json<ReviewList>, ApiError>
where
  S: SubjectStore + 'static,
{
  let session_id =
    Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(format!("session {id} not found")))?;
  let reviews = state.orchestrator.session_reviews(&ctx, session_id).await?;
  Ok(Json(ReviewList { reviews }))
}

// ─── Export ──────────────────────────────────────────────────────────────────

fn dashboard_row(review: &Review) -> Value {
  json!({
    "Sentence": review.text,
    "Predicted sentiment": review.predicted_sentiment,
    "confidence": review.confidence,
  })
}

/// `GET /api/user-data`
pub async fn user_data<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
) -> Result<Json<Value>, ApiError>
where
  S: SubjectStore + 'static,
{
  let reviews = state.orchestrator.all_reviews(&ctx).await?;
  let rows: Vec<Value> = reviews.iter().map(dashboard_row).collect();
  tracing::debug!(subject = ctx.subject_id.redacted(), total = rows.len(), "exported user data");
  Ok(Json(json!({ "total": rows.len(), "reviews": rows })))
}
