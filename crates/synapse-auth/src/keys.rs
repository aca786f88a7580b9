//! Issuer key sets.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};

use crate::SourceError;

/// Where verification keys come from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
  /// Fetch the key set published by `issuer`.
  async fn fetch(&self, issuer: &str) -> Result<JwkSet, SourceError>;
}

/// Fetches `{issuer}/.well-known/jwks.json` on every call.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
  client: reqwest::Client,
}

impl HttpKeySetSource {
  pub fn new(timeout: Duration) -> Result<Self, SourceError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

pub fn jwks_url(issuer: &str) -> String {
  format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
  async fn fetch(&self, issuer: &str) -> Result<JwkSet, SourceError> {
    let url = jwks_url(issuer);
    tracing::debug!(%url, "fetching key set");
    let keys = self
      .client
      .get(&url)
      .send()
      .await?
      .error_for_status()?
      .json::<JwkSet>()
      .await?;
    Ok(keys)
  }
}

/// The key matching `kid`, or the only key when the token names none.
pub fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
  match kid {
    Some(kid) => keys.find(kid),
    None if keys.keys.len() == 1 => keys.keys.first(),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(kids: &[&str]) -> JwkSet {
    let keys: Vec<_> = kids
      .iter()
      .map(|kid| {
        serde_json::json!({
          "kty": "RSA", "kid": kid, "use": "sig", "alg": "RS256",
          "n": "sXch", "e": "AQAB",
        })
      })
      .collect();
    serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap()
  }

  #[test]
  fn url_is_built_from_the_issuer() {
    assert_eq!(jwks_url("https://clerk.example.com/"), "https://clerk.example.com/.well-known/jwks.json");
  }

  #[test]
  fn key_is_selected_by_kid() {
    let keys = set(&["one", "two"]);
    let key = select_key(&keys, Some("two")).unwrap();
    assert_eq!(key.common.key_id.as_deref(), Some("two"));
    assert!(select_key(&keys, Some("three")).is_none());
  }

  #[test]
  fn missing_kid_needs_a_single_key() {
    assert!(select_key(&set(&["only"]), None).is_some());
    assert!(select_key(&set(&["one", "two"]), None).is_none());
  }
}
