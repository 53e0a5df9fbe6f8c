//! Error types: caller-fixable validation failures and their HTTP mapping.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

/// Caller-fixable problems with quiz, vocabulary or CSV input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
  #[error("at least 4 vocabulary entries are required to build a quiz, found {0}")]
  NotEnoughEntries(usize),
  #[error("requested {requested} questions but only {available} vocabulary entries are available")]
  CountExceedsPool { requested: usize, available: usize },
  #[error("question count must be between 1 and 100, got {0}")]
  CountOutOfRange(usize),
  #[error("select at least one question type")]
  NoQuestionTypes,
  #[error("not enough unique distractors for \"{word}\" ({field}): need 3, found {found}")]
  NotEnoughDistractors { word: String, field: &'static str, found: usize },
  #[error("CSV import failed:\n{}", .0.join("\n"))]
  InvalidCsv(Vec<String>),
  #[error("CSV file contains no vocabulary rows")]
  EmptyImport,
  #[error("missing required fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),
  #[error("invalid question: {0}")]
  InvalidQuestion(String),
  #[error("unknown difficulty \"{0}\"; expected one of: beginner, intermediate, advanced")]
  UnknownDifficulty(String),
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("missing or empty X-User-Id header")]
  Unauthenticated,
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
