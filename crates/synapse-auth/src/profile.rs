//! Identity-provider profile lookup.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::SourceError;

/// Profile fields that may label a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
  pub email: Option<String>,
  pub name:  Option<String>,
}

#[async_trait]
pub trait ProfileLookup: Send + Sync {
  async fn lookup(&self, subject_id: &str) -> Result<Profile, SourceError>;
}

// ─── Clerk users API ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmailAddress {
  id:            Option<String>,
  email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
  #[serde(default)]
  email_addresses:          Vec<EmailAddress>,
  primary_email_address_id: Option<String>,
  first_name:               Option<String>,
  last_name:                Option<String>,
  username:                 Option<String>,
}

impl UserRecord {
  fn into_profile(self) -> Profile {
    let primary = self
      .email_addresses
      .iter()
      .find(|e| e.id.is_some() && e.id == self.primary_email_address_id)
      .or_else(|| self.email_addresses.first());
    let email = primary
      .and_then(|e| e.email_address.as_deref())
      .map(str::trim)
      .filter(|e| !e.is_empty())
      .map(str::to_owned);

    let first = self.first_name.as_deref().unwrap_or_default();
    let last = self.last_name.as_deref().unwrap_or_default();
    let full = format!("{first} {last}").trim().to_owned();
    let name = if full.is_empty() {
      self.username.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty())
    } else {
      Some(full)
    };

    Profile { email, name }
  }
}

/// `GET {api_base}/v1/users/{subject_id}`, authorised with the secret key.
#[derive(Debug, Clone)]
pub struct ClerkProfileClient {
  client:     reqwest::Client,
  api_base:   String,
  secret_key: String,
}

impl ClerkProfileClient {
  pub fn new(api_base: &str, secret_key: &str, timeout: Duration) -> Result<Self, SourceError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_base: api_base.trim_end_matches('/').to_owned(),
      secret_key: secret_key.to_owned(),
    })
  }
}

#[async_trait]
impl ProfileLookup for ClerkProfileClient {
  async fn lookup(&self, subject_id: &str) -> Result<Profile, SourceError> {
    let url = format!("{}/v1/users/{subject_id}", self.api_base);
    let record = self
      .client
      .get(&url)
      .bearer_auth(&self.secret_key)
      .send()
      .await?
      .error_for_status()?
      .json::<UserRecord>()
      .await?;
    Ok(record.into_profile())
  }
}
