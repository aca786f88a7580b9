//! Handlers for the caller's own subject record.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/stats` | Creates the subject on first call |
//! | `POST` | `/api/refresh-user-info` | Overwrites email/name with verified claims |

use axum::{Json, extract::State};
use serde::Serialize;
use synapse_core::{
  store::SubjectStore,
  subject::{AuthenticatedContext, SubjectStats},
};

use crate::{AppState, error::ApiError};

/// `GET /api/stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
) -> Result<Json<SubjectStats>, ApiError>
where
  S: SubjectStore + 'static,
{
  Ok(Json(state.orchestrator.stats(&ctx).await?))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
  pub success: bool,
  pub email:   Option<String>,
  pub name:    Option<String>,
}

/// `POST /api/refresh-user-info`
pub async fn refresh<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
) -> Result<Json<RefreshResponse>, ApiError>
where
  S: SubjectStore + 'static,
{
  let subject = state.orchestrator.refresh_profile(&ctx).await?;
  tracing::info!(subject = ctx.subject_id.redacted(), "refreshed profile");
  Ok(Json(RefreshResponse {
    success: true,
    email:   subject.email,
    name:    subject.display_name,
  }))
}
