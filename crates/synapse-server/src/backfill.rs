//! Fill in missing subject profiles from the identity provider.
//!
//! Runs offline (`synapse-server backfill-profiles`), never from a request
//! handler. Identities minted in degraded mode are unknown to the provider
//! and are skipped.

use synapse_auth::ProfileLookup;
use synapse_core::store::SubjectStore;

/// Prefix of identities created without credential verification.
pub const DEGRADED_PREFIX: &str = "dev_user_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
  pub scanned: usize,
  pub updated: usize,
  pub skipped: usize,
  pub failed:  usize,
}

/// Look up every subject with a missing email or display name and write
/// every field the provider returns, overwriting stored values.
pub async fn backfill_profiles<S>(
  store: &S,
  profiles: &dyn ProfileLookup,
) -> Result<BackfillSummary, S::Error>
where
  S: SubjectStore,
{
  let mut summary = BackfillSummary::default();

  for subject in store.subjects_missing_profile().await? {
    summary.scanned += 1;
    let id = subject.subject_id.as_str();

    if id.starts_with(DEGRADED_PREFIX) {
      summary.skipped += 1;
      continue;
    }

    let profile = match profiles.lookup(id).await {
      Ok(profile) => profile,
      Err(e) => {
        tracing::warn!(subject = subject.subject_id.redacted(), "profile lookup failed: {e}");
        summary.failed += 1;
        continue;
      }
    };

    if profile.email.is_none() && profile.name.is_none() {
      summary.skipped += 1;
      continue;
    }

    store.refresh_profile(&subject.subject_id, profile.email, profile.name).await?;
    tracing::info!(subject = subject.subject_id.redacted(), "backfilled profile");
    summary.updated += 1;
  }

  Ok(summary)
}
