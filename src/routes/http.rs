//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::domain::{ParsedFeedback, VocabularyRecord};
use crate::error::ApiError;
use crate::logic::{self, DEFAULT_DIFFICULTY};
use crate::protocol::*;
use crate::routes::identity::UserId;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

// -------- Vocabulary --------

#[instrument(level = "info", skip(state), fields(user = %user.0))]
pub async fn http_list_vocabulary(
  State(state): State<Arc<AppState>>,
  user: UserId,
) -> impl IntoResponse {
  let entries = state.list_vocabulary(&user.0).await;
  info!(target: "vocabulary", user = %user.0, count = entries.len(), "HTTP vocabulary listed");
  Json(VocabularyListOut { entries })
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, word = %body.word))]
pub async fn http_add_vocabulary(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Json(body): Json<VocabularyRecord>,
) -> Result<impl IntoResponse, ApiError> {
  let entry = logic::add_vocabulary(&state, &user.0, body).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, content_len = body.content.len()))]
pub async fn http_import_vocabulary(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Json(body): Json<ImportIn>,
) -> Result<Json<ImportOut>, ApiError> {
  Ok(Json(logic::import_vocabulary(&state, &user.0, &body.content).await?))
}

#[instrument(level = "info", skip(state), fields(user = %user.0, %id))]
pub async fn http_delete_vocabulary(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  logic::delete_vocabulary(&state, &user.0, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, count = body.question_count))]
pub async fn http_create_vocabulary_quiz(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Json(body): Json<VocabularyQuizIn>,
) -> Result<impl IntoResponse, ApiError> {
  let quiz = logic::create_vocabulary_quiz(&state, &user.0, body).await?;
  Ok((StatusCode::CREATED, Json(quiz)))
}

// -------- Quizzes --------

#[instrument(level = "info", skip(state), fields(user = %user.0))]
pub async fn http_list_quizzes(
  State(state): State<Arc<AppState>>,
  user: UserId,
) -> impl IntoResponse {
  let quizzes = state
    .list_quizzes(&user.0)
    .await
    .iter()
    .map(|q| to_summary(q, &user.0))
    .collect();
  Json(QuizListOut { quizzes })
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, questions = body.questions.len()))]
pub async fn http_create_quiz(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Json(body): Json<CreateQuizIn>,
) -> Result<impl IntoResponse, ApiError> {
  let quiz = logic::create_quiz(&state, &user.0, body).await?;
  Ok((StatusCode::CREATED, Json(quiz)))
}

#[instrument(level = "info", skip(state), fields(user = %user.0, %id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Path(id): Path<String>,
) -> Result<Json<QuizOut>, ApiError> {
  Ok(Json(logic::get_quiz(&state, &user.0, &id).await?))
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, %id, answered = body.answers.len()))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Path(id): Path<String>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let out = logic::submit_quiz(&state, &user.0, &id, &body.answers).await?;
  info!(target: "quiz", %id, correct = out.correct, total = out.total, "HTTP quiz graded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(user = %user.0, %id))]
pub async fn http_quiz_attempts(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Path(id): Path<String>,
) -> Result<Json<AttemptsOut>, ApiError> {
  Ok(Json(logic::quiz_attempts(&state, &user.0, &id).await?))
}

// -------- Translation practice --------

#[instrument(level = "info", skip(state), fields(difficulty = %q.difficulty.clone().unwrap_or_else(|| DEFAULT_DIFFICULTY.into())))]
pub async fn http_get_passage(
  State(state): State<Arc<AppState>>,
  _user: UserId,
  Query(q): Query<PassageQuery>,
) -> Result<Json<PassageOut>, ApiError> {
  let difficulty = q.difficulty.unwrap_or_else(|| DEFAULT_DIFFICULTY.into());
  let passage = logic::next_passage(&state, &difficulty).await?;
  info!(target: "translation", %difficulty, id = %passage.id, "HTTP passage served");
  Ok(Json(passage))
}

#[instrument(level = "info", skip(state, body), fields(user = %user.0, urdu_len = body.urdu.len(), translation_len = body.translation.len()))]
pub async fn http_post_feedback(
  State(state): State<Arc<AppState>>,
  user: UserId,
  Json(body): Json<FeedbackIn>,
) -> Result<Json<ParsedFeedback>, ApiError> {
  let parsed = logic::translation_feedback(&state, body.passage_id.as_deref(), &body.urdu, &body.translation).await?;
  info!(target: "translation", user = %user.0, rows = parsed.feedback_rows.len(), score = parsed.score, "HTTP feedback served");
  Ok(Json(parsed))
}
