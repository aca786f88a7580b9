//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use synapse_core::{
  review::{NewReview, ReviewInput, Sentiment},
  store::SubjectStore,
  subject::SubjectId,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn id(raw: &str) -> SubjectId { SubjectId::new(raw).unwrap() }

fn input(text: &str, sentiment: Sentiment, confidence: f64) -> ReviewInput {
  ReviewInput::new(text, sentiment, confidence).unwrap()
}

fn single(owner: &SubjectId, text: &str, sentiment: Sentiment) -> NewReview {
  NewReview { owner_subject_id: owner.clone(), input: input(text, sentiment, 0.9) }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_or_create_starts_with_zero_counters() {
  let s = store().await;
  let subject = s
    .get_or_create_subject(&id("user_a"), Some("a@example.com".into()), None)
    .await
    .unwrap();

  assert_eq!(subject.subject_id.as_str(), "user_a");
  assert_eq!(subject.email.as_deref(), Some("a@example.com"));
  assert_eq!(subject.display_name, None);
  assert_eq!(subject.total_reviews, 0);
  assert_eq!(subject.total_sessions, 0);
}

#[tokio::test]
async fn get_or_create_is_idempotent_and_fills_once() {
  let s = store().await;
  let a = id("user_a");

  let first = s.get_or_create_subject(&a, None, None).await.unwrap();
  let second = s
    .get_or_create_subject(&a, Some("a@example.com".into()), Some("Ada".into()))
    .await
    .unwrap();
  assert_eq!(second.created_at, first.created_at);
  assert_eq!(second.email.as_deref(), Some("a@example.com"));
  assert_eq!(second.display_name.as_deref(), Some("Ada"));
  assert!(second.updated_at >= first.updated_at);

  // Already-set fields are not overwritten on the regular path.
  let third = s
    .get_or_create_subject(&a, Some("other@example.com".into()), None)
    .await
    .unwrap();
  assert_eq!(third.email.as_deref(), Some("a@example.com"));
  assert_eq!(third.display_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn refresh_profile_overwrites_supplied_fields_only() {
  let s = store().await;
  let a = id("user_a");
  s.get_or_create_subject(&a, Some("old@example.com".into()), Some("Old".into()))
    .await
    .unwrap();

  let refreshed = s
    .refresh_profile(&a, Some("new@example.com".into()), None)
    .await
    .unwrap();
  assert_eq!(refreshed.email.as_deref(), Some("new@example.com"));
  assert_eq!(refreshed.display_name.as_deref(), Some("Old"));
}

#[tokio::test]
async fn subjects_missing_profile_lists_incomplete_rows() {
  let s = store().await;
  s.get_or_create_subject(&id("complete"), Some("c@example.com".into()), Some("C".into()))
    .await
    .unwrap();
  s.get_or_create_subject(&id("no_name"), Some("n@example.com".into()), None)
    .await
    .unwrap();
  s.get_or_create_subject(&id("bare"), None, None).await.unwrap();

  let missing = s.subjects_missing_profile().await.unwrap();
  let ids: Vec<&str> = missing.iter().map(|m| m.subject_id.as_str()).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&"no_name"));
  assert!(ids.contains(&"bare"));
  assert!(missing.iter().all(|m| m.is_profile_incomplete()));
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_review_has_no_session_and_bumps_counter() {
  let s = store().await;
  let a = id("user_a");
  s.get_or_create_subject(&a, None, None).await.unwrap();

  let review = s
    .record_review(single(&a, "Great battery life", Sentiment::Positive))
    .await
    .unwrap();
  assert_eq!(review.owner_subject_id, a);
  assert_eq!(review.session_id, None);
  assert_eq!(review.predicted_sentiment, Sentiment::Positive);

  let subject = s.get_or_create_subject(&a, None, None).await.unwrap();
  assert_eq!(subject.total_reviews, 1);
  assert_eq!(subject.total_sessions, 0);
}

#[tokio::test]
async fn record_review_creates_a_missing_subject() {
  let s = store().await;
  let a = id("user_new");
  s.record_review(single(&a, "fine", Sentiment::Positive)).await.unwrap();

  let stats = s.stats(&a).await.unwrap();
  assert_eq!(stats.total_reviews, 1);
  assert!(stats.account_created.is_some());
}

#[tokio::test]
async fn record_session_counts_match_reviews() {
  let s = store().await;
  let a = id("user_a");
  s.get_or_create_subject(&a, None, None).await.unwrap();

  let inputs = vec![
    input("love it", Sentiment::Positive, 0.91),
    input("works well", Sentiment::Positive, 0.77),
    input("broke in a day", Sentiment::Negative, 0.88),
  ];
  let (session, reviews) = s.record_session(&a, "reviews.csv", inputs).await.unwrap();

  assert_eq!(session.source_filename, "reviews.csv");
  assert_eq!(session.total_reviews, 3);
  assert_eq!(session.positive_count, 2);
  assert_eq!(session.negative_count, 1);
  assert_eq!(reviews.len(), 3);
  assert!(reviews.iter().all(|r| r.session_id == Some(session.session_id)));
  assert!(reviews.iter().all(|r| r.owner_subject_id == a));

  let stored = s.session_reviews(&a, session.session_id).await.unwrap().unwrap();
  assert_eq!(stored.len() as u64, session.total_reviews);
  let texts: Vec<&str> = stored.iter().map(|r| r.text.as_str()).collect();
  assert_eq!(texts, ["love it", "works well", "broke in a day"]);

  let subject = s.get_or_create_subject(&a, None, None).await.unwrap();
  assert_eq!(subject.total_reviews, 3);
  assert_eq!(subject.total_sessions, 1);
}

#[tokio::test]
async fn empty_session_is_recorded_with_zero_counts() {
  let s = store().await;
  let a = id("user_a");
  let (session, reviews) = s.record_session(&a, "empty.csv", Vec::new()).await.unwrap();
  assert_eq!(session.total_reviews, 0);
  assert!(reviews.is_empty());
  assert_eq!(s.list_sessions(&a).await.unwrap().len(), 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_reviews_is_newest_first_and_paginates() {
  let s = store().await;
  let a = id("user_a");
  for text in ["one", "two", "three", "four"] {
    s.record_review(single(&a, text, Sentiment::Positive)).await.unwrap();
  }

  let all = s.list_reviews(&a, 50, 0).await.unwrap();
  let texts: Vec<&str> = all.iter().map(|r| r.text.as_str()).collect();
  assert_eq!(texts, ["four", "three", "two", "one"]);

  let page = s.list_reviews(&a, 2, 1).await.unwrap();
  let texts: Vec<&str> = page.iter().map(|r| r.text.as_str()).collect();
  assert_eq!(texts, ["three", "two"]);
}

#[tokio::test]
async fn session_reviews_of_another_subject_is_none() {
  let s = store().await;
  let a = id("user_a");
  let b = id("user_b");
  let (session, _) = s
    .record_session(&a, "a.csv", vec![input("ok", Sentiment::Positive, 0.6)])
    .await
    .unwrap();

  assert!(s.session_reviews(&b, session.session_id).await.unwrap().is_none());
  assert!(s.session_reviews(&a, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn stats_count_rows_directly() {
  let s = store().await;
  let a = id("user_a");

  let empty = s.stats(&a).await.unwrap();
  assert_eq!(empty.total_reviews, 0);
  assert_eq!(empty.account_created, None);

  s.record_review(single(&a, "good", Sentiment::Positive)).await.unwrap();
  s.record_session(&a, "f.csv", vec![
    input("bad", Sentiment::Negative, 0.7),
    input("fine", Sentiment::Positive, 0.6),
  ])
  .await
  .unwrap();

  let stats = s.stats(&a).await.unwrap();
  assert_eq!(stats.total_reviews, 3);
  assert_eq!(stats.positive_reviews, 2);
  assert_eq!(stats.negative_reviews, 1);
  assert_eq!(stats.total_sessions, 1);
  assert!(stats.account_created.is_some());
}

// ─── Isolation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn reads_never_cross_subjects() {
  let s = store().await;
  let a = id("user_a");
  let b = id("user_b");

  s.record_review(single(&a, "a's review", Sentiment::Positive)).await.unwrap();
  s.record_session(&b, "b.csv", vec![input("b's review", Sentiment::Negative, 0.8)])
    .await
    .unwrap();

  let a_reviews = s.list_reviews(&a, 50, 0).await.unwrap();
  assert_eq!(a_reviews.len(), 1);
  assert_eq!(a_reviews[0].text, "a's review");
  assert!(s.list_sessions(&a).await.unwrap().is_empty());

  let b_stats = s.stats(&b).await.unwrap();
  assert_eq!(b_stats.total_reviews, 1);
  assert_eq!(b_stats.positive_reviews, 0);
}

#[tokio::test]
async fn concurrent_submissions_stay_partitioned() {
  let s = Arc::new(store().await);
  let owners: Vec<SubjectId> = (0..4).map(|n| id(&format!("user_{n}"))).collect();

  let mut handles = Vec::new();
  for round in 0..10 {
    for owner in &owners {
      let s = Arc::clone(&s);
      let owner = owner.clone();
      handles.push(tokio::spawn(async move {
        if round % 2 == 0 {
          let text = format!("{owner} single {round}");
          s.record_review(single(&owner, &text, Sentiment::Positive)).await.unwrap();
        } else {
          let text = format!("{owner} bulk {round}");
          s.record_session(&owner, "bulk.csv", vec![input(&text, Sentiment::Negative, 0.5)])
            .await
            .unwrap();
        }
      }));
    }
  }
  for handle in handles {
    handle.await.unwrap();
  }

  for owner in &owners {
    let reviews = s.list_reviews(owner, 500, 0).await.unwrap();
    assert_eq!(reviews.len(), 10);
    assert!(reviews.iter().all(|r| r.owner_subject_id == *owner));
    assert!(reviews.iter().all(|r| r.text.starts_with(&format!("{owner} "))));

    let subject = s.get_or_create_subject(owner, None, None).await.unwrap();
    assert_eq!(subject.total_reviews, 10);
    assert_eq!(subject.total_sessions, 5);
  }
}
