//! Public protocol structs for HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
  PassageSource, QuestionType, Quiz, QuizAttempt, QuizMode, QuizQuestion, QuizSource, VocabularyEntry,
};

//
// Vocabulary
//

#[derive(Serialize)]
pub struct VocabularyListOut {
  pub entries: Vec<VocabularyEntry>,
}

#[derive(Deserialize)]
pub struct ImportIn {
  pub content: String,
}
#[derive(Serialize)]
pub struct ImportOut {
  pub imported: usize,
  pub skipped: usize,
  pub entries: Vec<VocabularyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyQuizIn {
  pub question_types: Vec<QuestionType>,
  pub question_count: usize,
  #[serde(default)]
  pub title: Option<String>,
}

//
// Quizzes
//

#[derive(Debug, Deserialize)]
pub struct CreateQuizIn {
  pub title: String,
  #[serde(default)]
  pub mode: QuizMode,
  pub questions: Vec<QuizQuestion>,
}

/// Question as shown to a quiz taker. `correct_answer` only for the owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
  pub question: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub correct_answer: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind: Option<QuestionType>,
}

#[derive(Debug, Serialize)]
pub struct QuizOut {
  pub id: String,
  pub title: String,
  pub mode: QuizMode,
  pub source: QuizSource,
  pub owner: String,
  pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummaryOut {
  pub id: String,
  pub title: String,
  pub mode: QuizMode,
  pub question_count: usize,
  pub owned: bool,
  pub created_at: u64,
}

/// Convert a stored quiz to its list entry for `user`.
pub fn to_summary(q: &Quiz, user: &str) -> QuizSummaryOut {
  QuizSummaryOut {
    id: q.id.clone(),
    title: q.title.clone(),
    mode: q.mode,
    question_count: q.questions.len(),
    owned: q.owner == user,
    created_at: q.created_at,
  }
}

#[derive(Serialize)]
pub struct QuizListOut {
  pub quizzes: Vec<QuizSummaryOut>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
  /// Answers keyed by question index (JSON object keys are stringified indices).
  #[serde(default)]
  pub answers: HashMap<usize, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
  pub attempt_id: String,
  pub correct: usize,
  pub total: usize,
  pub percentage: f32,
  /// Practice quizzes only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub per_question: Option<Vec<bool>>,
  /// Practice quizzes only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub correct_answers: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptsOut {
  pub quiz_id: String,
  pub attempt_count: usize,
  pub average_percentage: f32,
  /// Share (0..=1) of attempts that answered each question correctly.
  pub question_correct_rate: Vec<f32>,
  pub attempts: Vec<QuizAttempt>,
}

//
// Translation practice
//

#[derive(Debug, Deserialize)]
pub struct PassageQuery {
  pub difficulty: Option<String>,
}
#[derive(Serialize)]
pub struct PassageOut {
  pub id: String,
  pub difficulty: String,
  pub source: PassageSource,
  pub urdu: String,
}

/// Either `urdu` text or the `passageId` of a served passage must be given.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackIn {
  #[serde(default)]
  pub urdu: String,
  pub translation: String,
  #[serde(default)]
  pub passage_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
