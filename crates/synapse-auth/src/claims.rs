//! Reading a JWT before its signature has been checked.
//!
//! Nothing read here is trusted on its own. The issuer locates the key set,
//! and the profile claims only ever label an identity that was verified by
//! other means (or, in degraded mode, never was).

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Header;
use serde::Deserialize;

use crate::AuthError;

/// `aud` may be a single string or an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
  One(String),
  Many(Vec<String>),
}

impl Audience {
  pub fn values(&self) -> Vec<String> {
    match self {
      Self::One(aud) => vec![aud.clone()],
      Self::Many(auds) => auds.clone(),
    }
  }
}

/// The subset of the claim set this service reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
  pub iss:                   Option<String>,
  pub sub:                   Option<String>,
  pub aud:                   Option<Audience>,
  pub email:                 Option<String>,
  pub primary_email_address: Option<String>,
  pub first_name:            Option<String>,
  pub last_name:             Option<String>,
  pub username:              Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

impl TokenClaims {
  pub fn issuer(&self) -> Option<String> { non_empty(self.iss.as_deref()) }

  /// `email`, falling back to `primary_email_address`.
  pub fn email(&self) -> Option<String> {
    non_empty(self.email.as_deref()).or_else(|| non_empty(self.primary_email_address.as_deref()))
  }

  /// `"{first_name} {last_name}"` when either is set, else `username`.
  pub fn display_name(&self) -> Option<String> {
    let first = self.first_name.as_deref().unwrap_or_default();
    let last = self.last_name.as_deref().unwrap_or_default();
    non_empty(Some(format!("{first} {last}").as_str())).or_else(|| non_empty(self.username.as_deref()))
  }
}

/// Header and claims of a token whose signature has not been checked.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
  pub header: Header,
  pub claims: TokenClaims,
}

/// Decode the payload segment only.
pub fn decode_payload(token: &str) -> Result<TokenClaims, String> {
  let mut segments = token.split('.');
  let (Some(_), Some(payload), Some(_), None) =
    (segments.next(), segments.next(), segments.next(), segments.next())
  else {
    return Err("expected three dot-separated segments".into());
  };

  let bytes = URL_SAFE_NO_PAD
    .decode(payload.trim_end_matches('='))
    .map_err(|e| format!("payload is not base64url: {e}"))?;
  serde_json::from_slice(&bytes).map_err(|e| format!("payload is not a JSON claim set: {e}"))
}

/// Decode header and payload without verifying anything.
pub fn parse_unverified(token: &str) -> Result<UnverifiedToken, AuthError> {
  let header = jsonwebtoken::decode_header(token)
    .map_err(|e| AuthError::MalformedCredential(format!("bad header: {e}")))?;
  let claims = decode_payload(token).map_err(AuthError::MalformedCredential)?;
  Ok(UnverifiedToken { header, claims })
}
