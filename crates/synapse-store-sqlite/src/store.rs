//! [`SqliteStore`]: the SQLite implementation of [`SubjectStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use synapse_core::{
  review::{AnalysisSession, NewReview, Review, ReviewInput, SentimentCounts},
  store::SubjectStore,
  subject::{Subject, SubjectId, SubjectStats},
};

use crate::{
  Result,
  encode::{
    REVIEW_COLUMNS, RawReview, RawSession, RawSubject, SESSION_COLUMNS, SUBJECT_COLUMNS,
    decode_count, decode_dt, encode_count, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Synapse subject store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Upsert a subject row. `overwrite` selects between fill-once and
  /// overwrite semantics for the profile fields. Returns the row and whether
  /// it was newly created.
  async fn upsert_subject(
    &self,
    subject_id: &SubjectId,
    email: Option<String>,
    name: Option<String>,
    overwrite: bool,
  ) -> Result<(RawSubject, bool)> {
    let id_str = subject_id.as_str().to_owned();
    let now_str = encode_dt(Utc::now());

    // Supplied values win on overwrite; stored values win otherwise. A null
    // on the winning side falls through to the other.
    let sql = if overwrite {
      "INSERT INTO subjects (subject_id, email, display_name, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?4)
       ON CONFLICT (subject_id) DO UPDATE SET
         email        = COALESCE(excluded.email, subjects.email),
         display_name = COALESCE(excluded.display_name, subjects.display_name),
         updated_at   = excluded.updated_at"
    } else {
      "INSERT INTO subjects (subject_id, email, display_name, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?4)
       ON CONFLICT (subject_id) DO UPDATE SET
         email        = COALESCE(subjects.email, excluded.email),
         display_name = COALESCE(subjects.display_name, excluded.display_name),
         updated_at   = excluded.updated_at"
    };

    let result = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed = tx
          .query_row(
            "SELECT 1 FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        tx.execute(sql, rusqlite::params![id_str, email, name, now_str])?;

        let raw = tx.query_row(
          &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
          rusqlite::params![id_str],
          RawSubject::from_row,
        )?;
        tx.commit()?;
        Ok((raw, !existed))
      })
      .await?;
    Ok(result)
  }

  /// Bump the cached counters after a committed write. Failures are logged
  /// and swallowed.
  async fn bump_counters(&self, owner: &SubjectId, reviews: usize, sessions: usize) {
    let id_str = owner.as_str().to_owned();
    let reviews = encode_count(reviews);
    let sessions = encode_count(sessions);
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE subjects
             SET total_reviews  = total_reviews + ?2,
                 total_sessions = total_sessions + ?3,
                 updated_at     = ?4
           WHERE subject_id = ?1",
          rusqlite::params![id_str, reviews, sessions, now_str],
        )?;
        Ok(())
      })
      .await;

    if let Err(e) = outcome {
      tracing::warn!(subject = owner.redacted(), "failed to update subject counters: {e}");
    }
  }
}

/// Insert the subject row with zeroed counters if it does not exist yet.
fn ensure_subject(conn: &rusqlite::Connection, id: &str, now: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO subjects (subject_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
    rusqlite::params![id, now],
  )?;
  Ok(())
}

fn insert_review(conn: &rusqlite::Connection, review: &Review) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO reviews (
       review_id, owner_subject_id, text, predicted_sentiment,
       confidence, session_id, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(review.review_id),
      review.owner_subject_id.as_str(),
      review.text,
      review.predicted_sentiment.as_str(),
      review.confidence,
      review.session_id.map(encode_uuid),
      encode_dt(review.created_at),
    ],
  )?;
  Ok(())
}

// ─── SubjectStore impl ───────────────────────────────────────────────────────

impl SubjectStore for SqliteStore {
  type Error = crate::Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn get_or_create_subject(
    &self,
    subject_id: &SubjectId,
    email: Option<String>,
    name: Option<String>,
  ) -> Result<Subject> {
    let (raw, created) = self.upsert_subject(subject_id, email, name, false).await?;
    if created {
      tracing::info!(subject = subject_id.redacted(), "created subject");
    }
    raw.into_subject()
  }

  async fn refresh_profile(
    &self,
    subject_id: &SubjectId,
    email: Option<String>,
    name: Option<String>,
  ) -> Result<Subject> {
    let (raw, _) = self.upsert_subject(subject_id, email, name, true).await?;
    raw.into_subject()
  }

  async fn subjects_missing_profile(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE email IS NULL OR display_name IS NULL
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn record_review(&self, input: NewReview) -> Result<Review> {
    let review = Review {
      review_id:           Uuid::new_v4(),
      owner_subject_id:    input.owner_subject_id,
      text:                input.input.text,
      predicted_sentiment: input.input.sentiment,
      confidence:          input.input.confidence,
      session_id:          None,
      created_at:          Utc::now(),
    };

    let row = review.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        ensure_subject(&tx, row.owner_subject_id.as_str(), &encode_dt(row.created_at))?;
        insert_review(&tx, &row)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.bump_counters(&review.owner_subject_id, 1, 0).await;
    Ok(review)
  }

  async fn record_session(
    &self,
    owner: &SubjectId,
    source_filename: &str,
    inputs: Vec<ReviewInput>,
  ) -> Result<(AnalysisSession, Vec<Review>)> {
    let counts = SentimentCounts::tally(inputs.iter().map(|i| &i.sentiment));
    let created_at = Utc::now();

    let session = AnalysisSession {
      session_id:       Uuid::new_v4(),
      owner_subject_id: owner.clone(),
      source_filename:  source_filename.to_owned(),
      total_reviews:    counts.total(),
      positive_count:   counts.positive,
      negative_count:   counts.negative,
      created_at,
    };

    let reviews: Vec<Review> = inputs
      .into_iter()
      .map(|input| Review {
        review_id: Uuid::new_v4(),
        owner_subject_id: owner.clone(),
        text: input.text,
        predicted_sentiment: input.sentiment,
        confidence: input.confidence,
        session_id: Some(session.session_id),
        created_at,
      })
      .collect();

    let row_session = session.clone();
    let row_reviews = reviews.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let at_str = encode_dt(row_session.created_at);
        ensure_subject(&tx, row_session.owner_subject_id.as_str(), &at_str)?;
        tx.execute(
          "INSERT INTO analysis_sessions (
             session_id, owner_subject_id, source_filename,
             total_reviews, positive_count, negative_count, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(row_session.session_id),
            row_session.owner_subject_id.as_str(),
            row_session.source_filename,
            encode_count(row_session.total_reviews),
            encode_count(row_session.positive_count),
            encode_count(row_session.negative_count),
            at_str,
          ],
        )?;
        for review in &row_reviews {
          insert_review(&tx, review)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.bump_counters(owner, reviews.len(), 1).await;
    Ok((session, reviews))
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_reviews(
    &self,
    owner: &SubjectId,
    limit: usize,
    offset: usize,
  ) -> Result<Vec<Review>> {
    let id_str = owner.as_str().to_owned();
    let limit = encode_count(limit);
    let offset = encode_count(offset);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE owner_subject_id = ?1
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit, offset], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn list_sessions(&self, owner: &SubjectId) -> Result<Vec<AnalysisSession>> {
    let id_str = owner.as_str().to_owned();

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SESSION_COLUMNS} FROM analysis_sessions
           WHERE owner_subject_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawSession::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  async fn session_reviews(
    &self,
    owner: &SubjectId,
    session_id: Uuid,
  ) -> Result<Option<Vec<Review>>> {
    let id_str = owner.as_str().to_owned();
    let session_str = encode_uuid(session_id);

    let raws: Option<Vec<RawReview>> = self
      .conn
      .call(move |conn| {
        let owned = conn
          .query_row(
            "SELECT 1 FROM analysis_sessions WHERE session_id = ?1 AND owner_subject_id = ?2",
            rusqlite::params![session_str, id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !owned {
          return Ok(None);
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE session_id = ?1 AND owner_subject_id = ?2
           ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![session_str, id_str], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|raws| raws.into_iter().map(RawReview::into_review).collect())
      .transpose()
  }

  async fn stats(&self, owner: &SubjectId) -> Result<SubjectStats> {
    let id_str = owner.as_str().to_owned();

    let (created_at, total, positive, sessions): (Option<String>, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        let created_at: Option<String> = conn
          .query_row(
            "SELECT created_at FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let (total, positive): (i64, i64) = conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(CASE WHEN predicted_sentiment = 'Positive' THEN 1 ELSE 0 END), 0)
           FROM reviews WHERE owner_subject_id = ?1",
          rusqlite::params![id_str],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let sessions: i64 = conn.query_row(
          "SELECT COUNT(*) FROM analysis_sessions WHERE owner_subject_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;

        Ok((created_at, total, positive, sessions))
      })
      .await?;

    let total_reviews = decode_count("reviews", total)?;
    let positive_reviews = decode_count("reviews", positive)?;
    Ok(SubjectStats {
      total_reviews,
      positive_reviews,
      negative_reviews: total_reviews.saturating_sub(positive_reviews),
      total_sessions: decode_count("analysis_sessions", sessions)?,
      account_created: created_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
