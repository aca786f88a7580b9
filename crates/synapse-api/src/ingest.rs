//! Bulk-file ingestion: find the review text column of an uploaded table.
//!
//! Pipeline:
//!   filename + bytes
//!     └─ delimiter_for()   → ',' or '\t'
//!          └─ csv::Reader      → header + records   (RFC 4180 quoting)
//!               └─ text_column() → column index
//!                    └─ Vec<String> of texts, one per data row

use thiserror::Error;

use crate::ApiError;

/// Header names recognised verbatim.
const TEXT_COLUMNS: &[&str] = &[
  "Sentence",
  "sentence",
  "Review",
  "review",
  "review_text",
  "Review Text",
  "text",
  "Text",
  "comment",
  "Comment",
  "feedback",
  "Feedback",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
  #[error("unsupported file format: {0} (expected .csv or .tsv)")]
  UnsupportedFormat(String),

  #[error("file is not valid UTF-8")]
  NotUtf8,

  #[error("file is empty")]
  Empty,

  #[error("malformed row: {0}")]
  Malformed(String),

  #[error(
    "could not find review column. Available columns: {}. Expected column names: Sentence, \
     Review, review_text, etc.",
    .0.join(", ")
  )]
  NoTextColumn(Vec<String>),

  #[error("file has a header but no rows")]
  NoRows,
}

impl From<csv::Error> for IngestError {
  fn from(e: csv::Error) -> Self { IngestError::Malformed(e.to_string()) }
}

impl From<IngestError> for ApiError {
  fn from(e: IngestError) -> Self { ApiError::InvalidInput(e.to_string()) }
}

/// Extract the review texts from an uploaded `.csv` or `.tsv` file.
pub fn locate_texts(filename: &str, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
  let delimiter = delimiter_for(filename)?;

  let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
  std::str::from_utf8(bytes).map_err(|_| IngestError::NotUtf8)?;

  let mut reader = csv::ReaderBuilder::new()
    .delimiter(delimiter)
    .flexible(true)
    .has_headers(true)
    .from_reader(bytes);

  let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
  if header.is_empty() {
    return Err(IngestError::Empty);
  }
  let column = text_column(&header).ok_or_else(|| IngestError::NoTextColumn(header.clone()))?;

  let mut texts = Vec::new();
  for record in reader.records() {
    let record = record?;
    texts.push(record.get(column).unwrap_or_default().to_owned());
  }

  if texts.is_empty() {
    return Err(IngestError::NoRows);
  }
  Ok(texts)
}

fn delimiter_for(filename: &str) -> Result<u8, IngestError> {
  let extension = filename
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();
  match extension.as_str() {
    "csv" => Ok(b','),
    "tsv" => Ok(b'\t'),
    _ => Err(IngestError::UnsupportedFormat(filename.to_owned())),
  }
}

/// Index of the first header naming a text column.
fn text_column(header: &[String]) -> Option<usize> {
  header.iter().position(|name| {
    let lower = name.to_lowercase();
    TEXT_COLUMNS.contains(&name.as_str()) || lower.contains("sentence") || lower.contains("review")
  })
}
