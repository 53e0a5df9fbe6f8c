//! Domain models: quiz questions, vocabulary entries, quiz configs, translation feedback.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of question produced by the vocabulary quiz generator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
  /// Pick the English meaning of a word.
  WordToMeaning,
  /// Pick the Urdu translation of a word.
  WordToUrdu,
  /// Pick the sentence that uses the word correctly.
  WordToUsage,
}

impl QuestionType {
  /// Name of the `VocabularyEntry` field this type asks about. Also used in seeds.
  pub fn field_name(self) -> &'static str {
    match self {
      QuestionType::WordToMeaning => "meaning",
      QuestionType::WordToUrdu => "urduTranslation",
      QuestionType::WordToUsage => "usageExample",
    }
  }

  pub fn field_value(self, entry: &VocabularyEntry) -> &str {
    match self {
      QuestionType::WordToMeaning => &entry.meaning,
      QuestionType::WordToUrdu => &entry.urdu_translation,
      QuestionType::WordToUsage => &entry.usage_example,
    }
  }

  pub fn prompt(self, word: &str) -> String {
    match self {
      QuestionType::WordToMeaning => format!("What is the meaning of \"{}\"?", word),
      QuestionType::WordToUrdu => format!("What is the Urdu translation of \"{}\"?", word),
      QuestionType::WordToUsage => format!("Which sentence correctly uses the word \"{}\"?", word),
    }
  }
}

/// One question of a quiz. MCQ when `options` is present, free text otherwise.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  pub correct_answer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<QuestionType>,
}

impl QuizQuestion {
  /// Checks the structural invariants of a question received from outside.
  /// `position` is zero-based; messages report it one-based.
  pub fn validate(&self, position: usize) -> Result<(), ValidationError> {
    let n = position + 1;
    if self.question.trim().is_empty() {
      return Err(ValidationError::InvalidQuestion(format!("question {n} has no text")));
    }
    if self.correct_answer.trim().is_empty() {
      return Err(ValidationError::InvalidQuestion(format!("question {n} has no correct answer")));
    }
    if let Some(options) = &self.options {
      if options.len() < 2 {
        return Err(ValidationError::InvalidQuestion(format!(
          "question {n} needs at least 2 options, got {}",
          options.len()
        )));
      }
      if !options.contains(&self.correct_answer) {
        return Err(ValidationError::InvalidQuestion(format!(
          "question {n}: correct answer is not one of the options"
        )));
      }
    }
    Ok(())
  }
}

/// A word in a user's vocabulary collection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
  pub id: String,
  pub word: String,
  pub meaning: String,
  pub urdu_translation: String,
  pub usage_example: String,
}

/// Vocabulary fields without identity, as produced by CSV import or the add form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyRecord {
  pub word: String,
  pub meaning: String,
  pub urdu_translation: String,
  pub usage_example: String,
}

impl VocabularyRecord {
  /// Names of the empty fields after trimming, in column order.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = vec![];
    if self.word.trim().is_empty() { missing.push("word"); }
    if self.meaning.trim().is_empty() { missing.push("meaning"); }
    if self.urdu_translation.trim().is_empty() { missing.push("urduTranslation"); }
    if self.usage_example.trim().is_empty() { missing.push("usageExample"); }
    missing
  }

  pub fn into_entry(self, id: String) -> VocabularyEntry {
    VocabularyEntry {
      id,
      word: self.word.trim().to_string(),
      meaning: self.meaning.trim().to_string(),
      urdu_translation: self.urdu_translation.trim().to_string(),
      usage_example: self.usage_example.trim().to_string(),
    }
  }
}

/// Transient input of the vocabulary quiz generator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyQuizConfig {
  pub question_types: Vec<QuestionType>,
  pub question_count: usize,
}

/// One flagged translation discrepancy, in the order of the source table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRow {
  pub urdu_phrase: String,
  pub user_translation: String,
  pub suggested_translation: String,
  pub explanation: String,
}

/// Result of mining a free-text feedback response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFeedback {
  pub feedback_rows: Vec<FeedbackRow>,
  pub natural_version: String,
  /// In [0, 10]. 5 when no score could be found.
  pub score: f32,
  /// False when `score` is the default rather than a value read from the text.
  pub score_found: bool,
  pub raw_text: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
  /// Self-service quiz; results reveal answers, unlimited attempts.
  #[default]
  Practice,
  /// Instructor-published test; one attempt per user, answers withheld.
  Assessment,
}

/// Where did a quiz come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
  Authored,
  Vocabulary,
}

/// Quiz persisted in-memory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: String,
  pub title: String,
  pub owner: String,
  pub mode: QuizMode,
  pub source: QuizSource,
  pub questions: Vec<QuizQuestion>,
  pub created_at: u64,
}

/// One graded submission of a quiz.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
  pub id: String,
  pub quiz_id: String,
  pub user_id: String,
  pub correct: usize,
  pub total: usize,
  pub percentage: f32,
  pub per_question: Vec<bool>,
  pub submitted_at: u64,
}

/// Passage levels accepted from clients and from the TOML bank.
pub const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Canonical level for `raw` (trimmed, case-insensitive), or `None` if unknown.
pub fn normalize_difficulty(raw: &str) -> Option<&'static str> {
  let raw = raw.trim();
  DIFFICULTIES.iter().copied().find(|d| d.eq_ignore_ascii_case(raw))
}

/// Where did a translation passage come from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PassageSource {
  LocalBank, // from user-provided TOML bank
  Generated, // generated by the text service
  Seed,      // built-in seeds (last resort)
}

/// Urdu passage offered for translation practice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Passage {
  pub id: String,
  pub difficulty: String,
  pub source: PassageSource,
  pub urdu: String,
  #[serde(default)] pub english: String,
}
