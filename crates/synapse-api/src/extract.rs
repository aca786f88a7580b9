//! Bearer-credential extractor.
//!
//! Handlers take an [`AuthenticatedContext`] parameter; the extractor runs the
//! configured [`synapse_auth::CredentialVerifier`] against the
//! `Authorization` header before any handler code executes.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use synapse_auth::AuthError;
use synapse_core::{store::SubjectStore, subject::AuthenticatedContext};

use crate::{AppState, ApiError};

impl<S> FromRequestParts<AppState<S>> for AuthenticatedContext
where
  S: SubjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = match parts.headers.get(header::AUTHORIZATION) {
      Some(value) => Some(value.to_str().map_err(|_| {
        AuthError::MalformedCredential("authorization header is not valid UTF-8".into())
      })?),
      None => None,
    };

    let ctx = state.verifier.verify(header).await?;
    tracing::debug!(subject = ctx.subject_id.redacted(), "authenticated request");
    Ok(ctx)
  }
}
