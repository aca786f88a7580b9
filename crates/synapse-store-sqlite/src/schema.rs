//! SQL schema for the Synapse SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id      TEXT PRIMARY KEY,
    email           TEXT,
    display_name    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    total_reviews   INTEGER NOT NULL DEFAULT 0,
    total_sessions  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS analysis_sessions (
    session_id        TEXT PRIMARY KEY,
    owner_subject_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    source_filename   TEXT NOT NULL,
    total_reviews     INTEGER NOT NULL,
    positive_count    INTEGER NOT NULL,
    negative_count    INTEGER NOT NULL,
    created_at        TEXT NOT NULL,
    CHECK (positive_count + negative_count = total_reviews)
);

-- Reviews are append-only.
CREATE TABLE IF NOT EXISTS reviews (
    review_id            TEXT PRIMARY KEY,
    owner_subject_id     TEXT NOT NULL REFERENCES subjects(subject_id),
    text                 TEXT NOT NULL,
    predicted_sentiment  TEXT NOT NULL CHECK (predicted_sentiment IN ('Positive', 'Negative')),
    confidence           REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
    session_id           TEXT REFERENCES analysis_sessions(session_id),
    created_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS reviews_owner_created_idx  ON reviews(owner_subject_id, created_at);
CREATE INDEX IF NOT EXISTS reviews_session_idx        ON reviews(session_id);
CREATE INDEX IF NOT EXISTS sessions_owner_created_idx ON analysis_sessions(owner_subject_id, created_at);

PRAGMA user_version = 1;
";
