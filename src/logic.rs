//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Vocabulary collection upkeep (add, CSV import, delete)
//!   - Quiz authoring, vocabulary quiz generation, per-user presentation
//!   - Submitting and grading attempts, attempt analytics
//!   - Translation practice (passages + mined feedback)
//!
//! Handlers stay thin; every request body is already typed by serde when it gets here,
//! and domain checks happen here before the pure core functions run.

use std::collections::HashMap;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::csv_import::parse_vocabulary_csv;
use crate::domain::{
  normalize_difficulty, ParsedFeedback, Quiz, QuizAttempt, QuizMode, QuizSource, VocabularyEntry, VocabularyQuizConfig, VocabularyRecord,
};
use crate::error::{ApiError, ValidationError};
use crate::feedback::parse_feedback_response;
use crate::protocol::{AttemptsOut, CreateQuizIn, ImportOut, PassageOut, QuestionOut, QuizOut, SubmitOut, VocabularyQuizIn};
use crate::scoring::grade_quiz;
use crate::shuffle::{generate_seed, shuffle};
use crate::state::AppState;
use crate::util::{now_secs, trunc_for_log};
use crate::vocab_quiz::generate_vocabulary_quiz;

pub const DEFAULT_DIFFICULTY: &str = "beginner";
const DEFAULT_VOCAB_QUIZ_TITLE: &str = "Vocabulary practice";

// -------- Vocabulary --------

#[instrument(level = "info", skip(state, record), fields(%user))]
pub async fn add_vocabulary(state: &AppState, user: &str, record: VocabularyRecord) -> Result<VocabularyEntry, ApiError> {
  let missing = record.missing_fields();
  if !missing.is_empty() {
    return Err(ValidationError::MissingFields(missing).into());
  }
  let word = record.word.trim().to_string();
  let (mut inserted, _) = state.insert_vocabulary(user, vec![record]).await;
  match inserted.pop() {
    Some(entry) => {
      info!(target: "vocabulary", %user, id = %entry.id, "Vocabulary entry added");
      Ok(entry)
    }
    None => Err(ApiError::Conflict(format!("\"{word}\" is already in your vocabulary"))),
  }
}

#[instrument(level = "info", skip(state, content), fields(%user, content_len = content.len()))]
pub async fn import_vocabulary(state: &AppState, user: &str, content: &str) -> Result<ImportOut, ApiError> {
  let records = parse_vocabulary_csv(content).map_err(|e| {
    warn!(target: "vocabulary", %user, error = %e, "CSV import rejected");
    e
  })?;
  let (entries, skipped) = state.insert_vocabulary(user, records).await;
  info!(target: "vocabulary", %user, imported = entries.len(), skipped, "CSV import done");
  Ok(ImportOut { imported: entries.len(), skipped, entries })
}

#[instrument(level = "info", skip(state), fields(%user, %id))]
pub async fn delete_vocabulary(state: &AppState, user: &str, id: &str) -> Result<(), ApiError> {
  if state.delete_vocabulary(user, id).await {
    Ok(())
  } else {
    Err(ApiError::NotFound(format!("vocabulary entry {id} not found")))
  }
}

// -------- Quizzes --------

#[instrument(level = "info", skip(state, input), fields(%user, types = input.question_types.len(), count = input.question_count))]
pub async fn create_vocabulary_quiz(state: &AppState, user: &str, input: VocabularyQuizIn) -> Result<QuizOut, ApiError> {
  let entries = state.list_vocabulary(user).await;
  let config = VocabularyQuizConfig {
    question_types: input.question_types,
    question_count: input.question_count,
  };
  let questions = generate_vocabulary_quiz(&entries, &config, user)?;

  let quiz = Quiz {
    id: Uuid::new_v4().to_string(),
    title: input
      .title
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .unwrap_or_else(|| DEFAULT_VOCAB_QUIZ_TITLE.to_string()),
    owner: user.to_string(),
    mode: QuizMode::Practice,
    source: QuizSource::Vocabulary,
    questions,
    created_at: now_secs(),
  };
  state.insert_quiz(quiz.clone()).await;
  info!(target: "quiz", %user, id = %quiz.id, questions = quiz.questions.len(), "Vocabulary quiz created");
  Ok(present_quiz(&quiz, user))
}

#[instrument(level = "info", skip(state, input), fields(%user, title_len = input.title.len(), questions = input.questions.len()))]
pub async fn create_quiz(state: &AppState, user: &str, input: CreateQuizIn) -> Result<QuizOut, ApiError> {
  let title = input.title.trim().to_string();
  if title.is_empty() {
    return Err(ValidationError::MissingFields(vec!["title"]).into());
  }
  if input.questions.is_empty() {
    return Err(ValidationError::InvalidQuestion("a quiz needs at least one question".into()).into());
  }
  for (i, q) in input.questions.iter().enumerate() {
    q.validate(i)?;
  }

  let quiz = Quiz {
    id: Uuid::new_v4().to_string(),
    title,
    owner: user.to_string(),
    mode: input.mode,
    source: QuizSource::Authored,
    questions: input.questions,
    created_at: now_secs(),
  };
  state.insert_quiz(quiz.clone()).await;
  info!(target: "quiz", %user, id = %quiz.id, mode = ?quiz.mode, "Quiz created");
  Ok(present_quiz(&quiz, user))
}

/// Per-user view of a quiz: MCQ options in a stable, user-specific order.
/// Correct answers are only included for the author of an authored quiz; a generated
/// vocabulary quiz is taken by its owner, who sees answers after submitting.
pub fn present_quiz(quiz: &Quiz, user: &str) -> QuizOut {
  let show_answers = quiz.owner == user && quiz.source == QuizSource::Authored;
  let questions = quiz
    .questions
    .iter()
    .map(|q| QuestionOut {
      question: q.question.clone(),
      options: q
        .options
        .as_ref()
        .map(|opts| shuffle(opts, generate_seed(&format!("{user}-{}", q.question)))),
      correct_answer: show_answers.then(|| q.correct_answer.clone()),
      kind: q.kind,
    })
    .collect();

  QuizOut {
    id: quiz.id.clone(),
    title: quiz.title.clone(),
    mode: quiz.mode,
    source: quiz.source,
    owner: quiz.owner.clone(),
    questions,
  }
}

/// Fetch a quiz the user is allowed to see: their own, or any assessment.
async fn visible_quiz(state: &AppState, user: &str, id: &str) -> Result<Quiz, ApiError> {
  let quiz = state
    .get_quiz(id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("quiz {id} not found")))?;
  if quiz.owner != user && quiz.mode != QuizMode::Assessment {
    return Err(ApiError::Forbidden("this practice quiz belongs to another user".into()));
  }
  Ok(quiz)
}

#[instrument(level = "info", skip(state), fields(%user, %id))]
pub async fn get_quiz(state: &AppState, user: &str, id: &str) -> Result<QuizOut, ApiError> {
  let quiz = visible_quiz(state, user, id).await?;
  Ok(present_quiz(&quiz, user))
}

#[instrument(level = "info", skip(state, answers), fields(%user, %id, answered = answers.len()))]
pub async fn submit_quiz(
  state: &AppState,
  user: &str,
  id: &str,
  answers: &HashMap<usize, String>,
) -> Result<SubmitOut, ApiError> {
  let quiz = visible_quiz(state, user, id).await?;
  let result = grade_quiz(&quiz.questions, answers);

  let attempt = QuizAttempt {
    id: Uuid::new_v4().to_string(),
    quiz_id: quiz.id.clone(),
    user_id: user.to_string(),
    correct: result.correct,
    total: result.total,
    percentage: result.percentage,
    per_question: result.per_question.clone(),
    submitted_at: now_secs(),
  };
  let attempt_id = attempt.id.clone();
  if !state.record_attempt(&quiz, attempt).await {
    return Err(ApiError::Conflict("this assessment has already been submitted".into()));
  }
  info!(target: "quiz", %user, %id, correct = result.correct, total = result.total, "Quiz submitted");

  let reveal = quiz.mode == QuizMode::Practice;
  Ok(SubmitOut {
    attempt_id,
    correct: result.correct,
    total: result.total,
    percentage: result.percentage,
    per_question: reveal.then_some(result.per_question),
    correct_answers: reveal.then(|| quiz.questions.iter().map(|q| q.correct_answer.clone()).collect()),
  })
}

#[instrument(level = "info", skip(state), fields(%user, %id))]
pub async fn quiz_attempts(state: &AppState, user: &str, id: &str) -> Result<AttemptsOut, ApiError> {
  let quiz = state
    .get_quiz(id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("quiz {id} not found")))?;
  if quiz.owner != user {
    return Err(ApiError::Forbidden("only the quiz owner can view attempts".into()));
  }
  let attempts = state.attempts_for(id).await;
  Ok(summarize_attempts(&quiz, attempts))
}

fn summarize_attempts(quiz: &Quiz, attempts: Vec<QuizAttempt>) -> AttemptsOut {
  let n = attempts.len();
  let average_percentage = if n == 0 {
    0.0
  } else {
    let sum: f32 = attempts.iter().map(|a| a.percentage).sum();
    ((sum / n as f32) * 10.0).round() / 10.0
  };
  let question_correct_rate = (0..quiz.questions.len())
    .map(|i| {
      if n == 0 {
        return 0.0;
      }
      let ok = attempts.iter().filter(|a| a.per_question.get(i).copied().unwrap_or(false)).count();
      ok as f32 / n as f32
    })
    .collect();

  AttemptsOut {
    quiz_id: quiz.id.clone(),
    attempt_count: n,
    average_percentage,
    question_correct_rate,
    attempts,
  }
}

// -------- Translation practice --------

/// Only the known levels are served; anything else is a 400 rather than a new pool.
#[instrument(level = "info", skip(state), fields(%difficulty))]
pub async fn next_passage(state: &AppState, difficulty: &str) -> Result<PassageOut, ApiError> {
  let level = normalize_difficulty(difficulty)
    .ok_or_else(|| ValidationError::UnknownDifficulty(difficulty.trim().to_string()))?;
  let (p, origin) = state.choose_passage(level).await;
  debug!(target: "translation", id = %p.id, %origin, "Passage chosen");
  Ok(PassageOut { id: p.id, difficulty: p.difficulty, source: p.source, urdu: p.urdu })
}

/// Ask the text service for feedback and mine its reply. When the service is off or
/// fails, the degraded result (no rows, fallback version, default score) is returned.
///
/// A blank `urdu` is filled from the served passage named by `passage_id`.
#[instrument(level = "info", skip(state, urdu, translation), fields(?passage_id, urdu_len = urdu.len(), translation_len = translation.len()))]
pub async fn translation_feedback(
  state: &AppState,
  passage_id: Option<&str>,
  urdu: &str,
  translation: &str,
) -> Result<ParsedFeedback, ApiError> {
  let stored;
  let urdu = match passage_id {
    Some(id) if urdu.trim().is_empty() => {
      stored = state
        .get_passage(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("passage {id} not found")))?;
      stored.urdu.as_str()
    }
    _ => urdu,
  };

  let mut missing = vec![];
  if urdu.trim().is_empty() { missing.push("urdu"); }
  if translation.trim().is_empty() { missing.push("translation"); }
  if !missing.is_empty() {
    return Err(ValidationError::MissingFields(missing).into());
  }

  let raw = match &state.openai {
    Some(oa) => match oa.translation_feedback(&state.prompts, urdu.trim(), translation.trim()).await {
      Ok(text) => {
        debug!(target: "translation", preview = %trunc_for_log(&text, 80), "Feedback text received");
        text
      }
      Err(e) => {
        error!(target: "translation", error = %e, "OpenAI feedback failed; returning degraded feedback.");
        String::new()
      }
    },
    None => {
      warn!(target: "translation", "OpenAI disabled; returning degraded feedback.");
      String::new()
    }
  };

  let parsed = parse_feedback_response(&raw);
  if !parsed.score_found {
    warn!(target: "translation", score = parsed.score, "No score in feedback text; default applied");
  }
  Ok(parsed)
}
