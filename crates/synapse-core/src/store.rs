//! The `SubjectStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `synapse-store-sqlite`).
//! Higher layers (`synapse-api`, `synapse-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  review::{AnalysisSession, NewReview, Review, ReviewInput},
  subject::{Subject, SubjectId, SubjectStats},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Synapse subject store backend.
///
/// Every review and session operation takes the owning [`SubjectId`]
/// explicitly and only ever reads or writes rows owned by it. Reviews and
/// sessions are append-only.
///
/// Counter fields on [`Subject`] are maintained best-effort: a failure to
/// bump them after a committed write is logged, not returned. [`stats`]
/// counts rows directly and is the source of truth.
///
/// Returned futures are `Send`, so handlers can hold them across `.await` in
/// axum.
///
/// [`stats`]: SubjectStore::stats
pub trait SubjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Fetch the subject, creating it with zeroed counters if absent.
  ///
  /// On an existing subject, `email` / `name` are written only where the
  /// stored value is null; `updated_at` is always refreshed.
  fn get_or_create_subject<'a>(
    &'a self,
    subject_id: &'a SubjectId,
    email: Option<String>,
    name: Option<String>,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + 'a;

  /// Overwrite whichever of `email` / `name` are supplied, creating the
  /// subject if needed.
  fn refresh_profile<'a>(
    &'a self,
    subject_id: &'a SubjectId,
    email: Option<String>,
    name: Option<String>,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + 'a;

  /// Subjects with a null email or display name. Maintenance use only; not
  /// reachable from request handlers.
  fn subjects_missing_profile(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a single-item review (no session) and bump `total_reviews`.
  fn record_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Insert a session and all its reviews atomically, then bump
  /// `total_sessions` by one and `total_reviews` by the batch size.
  fn record_session<'a>(
    &'a self,
    owner: &'a SubjectId,
    source_filename: &'a str,
    inputs: Vec<ReviewInput>,
  ) -> impl Future<Output = Result<(AnalysisSession, Vec<Review>), Self::Error>>
  + Send
  + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The owner's reviews, newest first.
  fn list_reviews<'a>(
    &'a self,
    owner: &'a SubjectId,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + 'a;

  /// The owner's sessions, newest first.
  fn list_sessions<'a>(
    &'a self,
    owner: &'a SubjectId,
  ) -> impl Future<Output = Result<Vec<AnalysisSession>, Self::Error>> + Send + 'a;

  /// Reviews belonging to `session_id`, or `None` if the session does not
  /// exist or is owned by someone else.
  fn session_reviews<'a>(
    &'a self,
    owner: &'a SubjectId,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<Review>>, Self::Error>> + Send + 'a;

  /// Counts computed by filtered queries scoped to `owner`.
  fn stats<'a>(
    &'a self,
    owner: &'a SubjectId,
  ) -> impl Future<Output = Result<SubjectStats, Self::Error>> + Send + 'a;
}
