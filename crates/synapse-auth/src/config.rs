//! Identity-provider settings.

use serde::Deserialize;

/// Value shipped in sample environment files; treated as "not configured".
pub const PLACEHOLDER_SECRET_KEY: &str = "sk_test_your_clerk_secret_key_here";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  /// Identity-provider secret key. Absent, blank or the placeholder selects
  /// degraded mode.
  pub secret_key:           Option<String>,
  /// Required `aud` claim. When unset, a token's own `aud` is accepted.
  pub audience:             Option<String>,
  /// Accepted `iss` values. Empty accepts any issuer.
  pub issuers:              Vec<String>,
  pub api_base:             String,
  pub profile_timeout_secs: u64,
  pub jwks_timeout_secs:    u64,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      secret_key:           None,
      audience:             None,
      issuers:              Vec::new(),
      api_base:             "https://api.clerk.com".to_owned(),
      profile_timeout_secs: 5,
      jwks_timeout_secs:    5,
    }
  }
}

impl AuthConfig {
  /// The secret key, if one is really configured.
  pub fn effective_secret_key(&self) -> Option<&str> {
    self
      .secret_key
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty() && *k != PLACEHOLDER_SECRET_KEY)
  }
}
