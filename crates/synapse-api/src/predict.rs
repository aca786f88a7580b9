//! Handlers for `/predict` and `/test`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/test` | Liveness text; no credential required |
//! | `POST` | `/predict` | JSON `{"text": ...}` or multipart with a `file` part |

use axum::{
  Json,
  extract::{FromRequest, Multipart, Request, State},
  http::header,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use synapse_core::{
  review::Sentiment,
  store::SubjectStore,
  subject::AuthenticatedContext,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  ingest,
  orchestrator::{BulkOutcome, SingleOutcome},
};

/// `GET /test`
pub async fn liveness() -> &'static str {
  "Test request received successfully. Service is running."
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PredictBody {
  pub text: Option<String>,
}

/// What a `/predict` request asked for.
enum Submission {
  Single(String),
  Bulk { filename: String, bytes: Vec<u8> },
}

impl Submission {
  fn from_parts(text: Option<String>, file: Option<(String, Vec<u8>)>) -> Result<Self, ApiError> {
    match (text, file) {
      (Some(text), None) => Ok(Self::Single(text)),
      (None, Some((filename, bytes))) => Ok(Self::Bulk { filename, bytes }),
      (Some(_), Some(_)) => {
        Err(ApiError::InvalidInput("provide either a file or text, not both".into()))
      }
      (None, None) => Err(ApiError::InvalidInput(
        "provide either a file or text in JSON format".into(),
      )),
    }
  }
}

async fn read_submission<S>(request: Request, state: &AppState<S>) -> Result<Submission, ApiError>
where
  S: SubjectStore + 'static,
{
  let content_type = request
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_ascii_lowercase();

  if content_type.starts_with("multipart/form-data") {
    let mut multipart = Multipart::from_request(request, state)
      .await
      .map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    let mut text = None;
    let mut file = None;
    while let Some(field) = multipart
      .next_field()
      .await
      .map_err(|e| ApiError::InvalidInput(e.body_text()))?
    {
      let name = field.name().map(str::to_owned);
      match name.as_deref() {
        Some("file") => {
          let filename = field.file_name().unwrap_or_default().to_owned();
          let bytes = field.bytes().await.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
          file = Some((filename, bytes.to_vec()));
        }
        Some("text") => {
          text = Some(field.text().await.map_err(|e| ApiError::InvalidInput(e.body_text()))?);
        }
        _ => {}
      }
    }
    Submission::from_parts(text, file)
  } else if content_type.starts_with("application/json") {
    let Json(body) = Json::<PredictBody>::from_request(request, state)
      .await
      .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    Submission::from_parts(body.text, None)
  } else {
    Err(ApiError::InvalidInput(
      "expected an application/json or multipart/form-data body".into(),
    ))
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SingleResponse {
  pub prediction: Sentiment,
  pub confidence: f64,
  pub persisted:  bool,
}

impl From<SingleOutcome> for SingleResponse {
  fn from(out: SingleOutcome) -> Self {
    Self {
      prediction: out.prediction.label,
      confidence: out.prediction.confidence,
      persisted:  out.persisted,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ScoredRow {
  pub text:       String,
  pub prediction: Sentiment,
  pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
  pub session_id:     Option<Uuid>,
  pub filename:       String,
  pub total_reviews:  u64,
  pub positive_count: u64,
  pub negative_count: u64,
  pub persisted:      bool,
  pub rows:           Vec<ScoredRow>,
}

impl From<BulkOutcome> for BulkResponse {
  fn from(out: BulkOutcome) -> Self {
    Self {
      session_id:     out.session_id,
      filename:       out.filename,
      total_reviews:  out.counts.total(),
      positive_count: out.counts.positive,
      negative_count: out.counts.negative,
      persisted:      out.persisted,
      rows:           out
        .rows
        .into_iter()
        .map(|(text, p)| ScoredRow { text, prediction: p.label, confidence: p.confidence })
        .collect(),
    }
  }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /predict`
pub async fn predict<S>(
  State(state): State<AppState<S>>,
  ctx: AuthenticatedContext,
  request: Request,
) -> Result<Response, ApiError>
where
  S: SubjectStore + 'static,
{
  match read_submission(request, &state).await? {
    Submission::Single(text) => {
      let out = state.orchestrator.predict_single(&ctx, text).await?;
      Ok(Json(SingleResponse::from(out)).into_response())
    }
    Submission::Bulk { filename, bytes } => {
      let texts = ingest::locate_texts(&filename, &bytes)?;
      let out = state.orchestrator.predict_bulk(&ctx, filename, texts).await?;
      Ok(Json(BulkResponse::from(out)).into_response())
    }
  }
}
