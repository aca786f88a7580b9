//! [`CredentialVerifier`]: bearer credential → [`AuthenticatedContext`].

use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use synapse_core::subject::{AuthenticatedContext, SubjectId};

use crate::{
  AuthConfig, AuthError, SourceError,
  claims::{self, TokenClaims},
  keys::{HttpKeySetSource, KeySetSource, select_key},
  profile::{ClerkProfileClient, Profile, ProfileLookup},
};

/// Issuer and audience rules applied in trusted mode.
#[derive(Debug, Clone, Default)]
pub struct VerifyPolicy {
  /// Accepted issuers; empty accepts any.
  pub issuers:  Vec<String>,
  /// Required audience; `None` accepts the token's own `aud`.
  pub audience: Option<String>,
}

#[derive(Clone)]
enum Mode {
  Trusted {
    keys:     Arc<dyn KeySetSource>,
    profiles: Arc<dyn ProfileLookup>,
    policy:   VerifyPolicy,
  },
  Degraded,
}

#[derive(Clone)]
pub struct CredentialVerifier {
  mode: Mode,
}

impl std::fmt::Debug for CredentialVerifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CredentialVerifier").field("trusted", &self.is_trusted()).finish()
  }
}

/// Claims that must survive signature verification.
#[derive(Debug, Deserialize)]
struct VerifiedClaims {
  sub: String,
}

impl CredentialVerifier {
  pub fn trusted(
    keys: Arc<dyn KeySetSource>,
    profiles: Arc<dyn ProfileLookup>,
    policy: VerifyPolicy,
  ) -> Self {
    Self { mode: Mode::Trusted { keys, profiles, policy } }
  }

  /// No signature checks; identities are derived from the credential bytes.
  pub fn degraded() -> Self { Self { mode: Mode::Degraded } }

  /// Trusted mode with HTTP sources when a secret key is configured,
  /// degraded mode otherwise.
  pub fn from_config(config: &AuthConfig) -> Result<Self, SourceError> {
    let Some(secret_key) = config.effective_secret_key() else {
      tracing::warn!("no identity-provider secret key configured; credentials will NOT be verified");
      return Ok(Self::degraded());
    };

    let keys = HttpKeySetSource::new(Duration::from_secs(config.jwks_timeout_secs))?;
    let profiles = ClerkProfileClient::new(
      &config.api_base,
      secret_key,
      Duration::from_secs(config.profile_timeout_secs),
    )?;
    let policy = VerifyPolicy { issuers: config.issuers.clone(), audience: config.audience.clone() };
    Ok(Self::trusted(Arc::new(keys), Arc::new(profiles), policy))
  }

  pub fn is_trusted(&self) -> bool { matches!(self.mode, Mode::Trusted { .. }) }

  /// The profile source, in trusted mode.
  pub fn profiles(&self) -> Option<&Arc<dyn ProfileLookup>> {
    match &self.mode {
      Mode::Trusted { profiles, .. } => Some(profiles),
      Mode::Degraded => None,
    }
  }

  /// Verify the raw `Authorization` header value.
  pub async fn verify(&self, header: Option<&str>) -> Result<AuthenticatedContext, AuthError> {
    let raw = header.unwrap_or_default().trim_start();
    let token = match raw.strip_prefix("Bearer") {
      Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
      _ => raw.trim(),
    };
    if token.is_empty() {
      return Err(AuthError::MissingCredential);
    }

    match &self.mode {
      Mode::Trusted { keys, profiles, policy } => {
        verify_trusted(token, keys.as_ref(), profiles.as_ref(), policy).await
      }
      Mode::Degraded => degraded_context(token),
    }
  }
}

// ─── Trusted mode ────────────────────────────────────────────────────────────

async fn verify_trusted(
  token: &str,
  keys: &dyn KeySetSource,
  profiles: &dyn ProfileLookup,
  policy: &VerifyPolicy,
) -> Result<AuthenticatedContext, AuthError> {
  let unverified = claims::parse_unverified(token)?;
  let issuer = unverified
    .claims
    .issuer()
    .ok_or_else(|| AuthError::MalformedCredential("token has no issuer".into()))?;

  if !policy.issuers.is_empty() && !policy.issuers.iter().any(|i| *i == issuer) {
    return Err(AuthError::VerificationFailed(format!("issuer {issuer} is not accepted")));
  }

  let key_set = keys
    .fetch(&issuer)
    .await
    .map_err(|e| AuthError::VerificationFailed(format!("key set unavailable: {e}")))?;
  let jwk = select_key(&key_set, unverified.header.kid.as_deref())
    .ok_or_else(|| AuthError::VerificationFailed("no matching signing key".into()))?;
  let key = DecodingKey::from_jwk(jwk)
    .map_err(|e| AuthError::VerificationFailed(format!("unusable signing key: {e}")))?;

  let mut validation = Validation::new(Algorithm::RS256);
  validation.set_required_spec_claims(&["exp", "iss", "sub"]);
  validation.set_issuer(&[&issuer]);
  match (&policy.audience, &unverified.claims.aud) {
    (Some(required), _) => validation.set_audience(&[required]),
    (None, Some(own)) => validation.set_audience(&own.values()),
    (None, None) => validation.validate_aud = false,
  }

  let verified = jsonwebtoken::decode::<VerifiedClaims>(token, &key, &validation)
    .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;
  let subject_id = SubjectId::new(&verified.claims.sub)
    .map_err(|_| AuthError::VerificationFailed("empty subject".into()))?;

  let mut email = unverified.claims.email();
  let mut name = unverified.claims.display_name();
  if email.is_none() || name.is_none() {
    let looked_up = lookup_profile(profiles, &subject_id).await;
    email = email.or(looked_up.email);
    name = name.or(looked_up.name);
  }

  Ok(AuthenticatedContext { subject_id, email, name })
}

/// Never fails: lookup errors are logged and yield an empty profile.
async fn lookup_profile(profiles: &dyn ProfileLookup, subject_id: &SubjectId) -> Profile {
  match profiles.lookup(subject_id.as_str()).await {
    Ok(profile) => profile,
    Err(e) => {
      tracing::warn!(subject = subject_id.redacted(), "profile lookup failed: {e}");
      Profile::default()
    }
  }
}

// ─── Degraded mode ───────────────────────────────────────────────────────────

/// Bucket for the development identity: a SHA-256 of the first 50 characters,
/// reduced modulo one million.
pub fn degraded_bucket(credential: &str) -> u64 {
  let prefix: String = credential.chars().take(50).collect();
  let digest = Sha256::digest(prefix.as_bytes());
  let mut head = [0u8; 8];
  head.copy_from_slice(&digest[..8]);
  u64::from_be_bytes(head) % 1_000_000
}

fn degraded_context(token: &str) -> Result<AuthenticatedContext, AuthError> {
  let claims = claims::decode_payload(token).unwrap_or_else(|_| TokenClaims::default());
  let subject_id = SubjectId::new(format!("dev_user_{}", degraded_bucket(token)))
    .map_err(|e| AuthError::VerificationFailed(e.to_string()))?;
  Ok(AuthenticatedContext { subject_id, email: claims.email(), name: claims.display_name() })
}
