//! Vocabulary-driven quiz generation.
//!
//! Flow:
//! 1) Shuffle the entry pool once (seeded by identity + nonce, so regenerating differs).
//! 2) Split the requested count across question types as evenly as possible.
//! 3) Walk the pool round-robin, building one MCQ per slot.
//! 4) Pick 3 distractors of the same field from other entries (seeded per entry/field).
//! 5) Shuffle the options with a seed tied to identity, position and entry.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, instrument};

use crate::domain::{QuestionType, QuizQuestion, VocabularyEntry, VocabularyQuizConfig};
use crate::error::ValidationError;
use crate::shuffle::{generate_seed, shuffle};

pub const MIN_ENTRIES: usize = 4;
pub const MAX_QUESTIONS: usize = 100;
const DISTRACTORS: usize = 3;

/// Generate a quiz using the current time as nonce.
pub fn generate_vocabulary_quiz(
  entries: &[VocabularyEntry],
  config: &VocabularyQuizConfig,
  identity: &str,
) -> Result<Vec<QuizQuestion>, ValidationError> {
  let nonce = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or_default();
  generate_vocabulary_quiz_with_nonce(entries, config, identity, nonce)
}

/// Deterministic core of [`generate_vocabulary_quiz`].
#[instrument(level = "debug", skip(entries, config), fields(pool = entries.len(), count = config.question_count))]
pub fn generate_vocabulary_quiz_with_nonce(
  entries: &[VocabularyEntry],
  config: &VocabularyQuizConfig,
  identity: &str,
  nonce: u64,
) -> Result<Vec<QuizQuestion>, ValidationError> {
  validate_config(entries, config)?;

  let pool = shuffle(entries, generate_seed(&format!("{identity}-{nonce}")));
  let per_type = distribute(config.question_count, config.question_types.len());

  let mut questions = Vec::with_capacity(config.question_count);
  let mut cursor = 0usize;
  for (qtype, count) in config.question_types.iter().copied().zip(per_type) {
    for _ in 0..count {
      let entry = &pool[cursor % pool.len()];
      cursor += 1;
      let position = questions.len();
      questions.push(build_question(entries, entry, qtype, identity, position)?);
    }
  }

  debug!(target: "vocabulary", generated = questions.len(), "Vocabulary quiz generated");
  Ok(questions)
}

fn validate_config(entries: &[VocabularyEntry], config: &VocabularyQuizConfig) -> Result<(), ValidationError> {
  if config.question_types.is_empty() {
    return Err(ValidationError::NoQuestionTypes);
  }
  if entries.len() < MIN_ENTRIES {
    return Err(ValidationError::NotEnoughEntries(entries.len()));
  }
  if config.question_count == 0 || config.question_count > MAX_QUESTIONS {
    return Err(ValidationError::CountOutOfRange(config.question_count));
  }
  if config.question_count > entries.len() {
    return Err(ValidationError::CountExceedsPool {
      requested: config.question_count,
      available: entries.len(),
    });
  }
  Ok(())
}

/// `count` split over `types` slots; the first `count % types` slots get one extra.
fn distribute(count: usize, types: usize) -> Vec<usize> {
  let base = count / types;
  let extra = count % types;
  (0..types).map(|i| base + usize::from(i < extra)).collect()
}

fn build_question(
  entries: &[VocabularyEntry],
  entry: &VocabularyEntry,
  qtype: QuestionType,
  identity: &str,
  position: usize,
) -> Result<QuizQuestion, ValidationError> {
  let correct = qtype.field_value(entry).to_string();
  let distractors = pick_distractors(entries, entry, qtype, &correct)?;

  let mut options = Vec::with_capacity(DISTRACTORS + 1);
  options.push(correct.clone());
  options.extend(distractors);
  let options = shuffle(&options, generate_seed(&format!("{identity}-{position}-{}", entry.id)));

  Ok(QuizQuestion {
    question: qtype.prompt(&entry.word),
    options: Some(options),
    correct_answer: correct,
    kind: Some(qtype),
  })
}

fn pick_distractors(
  entries: &[VocabularyEntry],
  entry: &VocabularyEntry,
  qtype: QuestionType,
  correct: &str,
) -> Result<Vec<String>, ValidationError> {
  let mut seen = HashSet::new();
  let candidates: Vec<String> = entries
    .iter()
    .filter(|e| e.id != entry.id)
    .map(|e| qtype.field_value(e))
    .filter(|v| *v != correct && seen.insert(*v))
    .map(str::to_string)
    .collect();

  if candidates.len() < DISTRACTORS {
    return Err(ValidationError::NotEnoughDistractors {
      word: entry.word.clone(),
      field: qtype.field_name(),
      found: candidates.len(),
    });
  }

  let seed = generate_seed(&format!("{}-{}", entry.id, qtype.field_name()));
  Ok(shuffle(&candidates, seed).into_iter().take(DISTRACTORS).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn entry(i: usize) -> VocabularyEntry {
    VocabularyEntry {
      id: format!("e{i}"),
      word: format!("word{i}"),
      meaning: format!("meaning {i}"),
      urdu_translation: format!("ترجمہ {i}"),
      usage_example: format!("I used word{i} today."),
    }
  }

  fn entries(n: usize) -> Vec<VocabularyEntry> {
    (0..n).map(entry).collect()
  }

  fn config(types: &[QuestionType], count: usize) -> VocabularyQuizConfig {
    VocabularyQuizConfig { question_types: types.to_vec(), question_count: count }
  }

  fn assert_well_formed(q: &QuizQuestion) {
    let options = q.options.as_ref().expect("mcq");
    assert_eq!(options.len(), 4);
    assert_eq!(options.iter().filter(|o| **o == q.correct_answer).count(), 1);
    let unique: HashSet<&String> = options.iter().collect();
    assert_eq!(unique.len(), 4, "options must be distinct: {options:?}");
  }

  #[test]
  fn generates_exact_count() {
    let qs = generate_vocabulary_quiz(&entries(8), &config(&[QuestionType::WordToMeaning], 5), "u1").expect("quiz");
    assert_eq!(qs.len(), 5);
    qs.iter().for_each(assert_well_formed);
  }

  #[test]
  fn every_question_is_well_formed_for_all_types() {
    let all = [QuestionType::WordToMeaning, QuestionType::WordToUrdu, QuestionType::WordToUsage];
    let qs = generate_vocabulary_quiz_with_nonce(&entries(12), &config(&all, 10), "u1", 7).expect("quiz");
    assert_eq!(qs.len(), 10);
    qs.iter().for_each(assert_well_formed);
    let mut per_type: HashMap<QuestionType, usize> = HashMap::new();
    for q in &qs {
      *per_type.entry(q.kind.expect("kind")).or_default() += 1;
    }
    assert_eq!(per_type[&QuestionType::WordToMeaning], 4);
    assert_eq!(per_type[&QuestionType::WordToUrdu], 3);
    assert_eq!(per_type[&QuestionType::WordToUsage], 3);
  }

  #[test]
  fn four_entries_two_types_splits_evenly() {
    let cfg = config(&[QuestionType::WordToMeaning, QuestionType::WordToUrdu], 4);
    let qs = generate_vocabulary_quiz(&entries(4), &cfg, "u1").expect("quiz");
    assert_eq!(qs.len(), 4);
    assert_eq!(qs.iter().filter(|q| q.kind == Some(QuestionType::WordToMeaning)).count(), 2);
    assert_eq!(qs.iter().filter(|q| q.kind == Some(QuestionType::WordToUrdu)).count(), 2);
    qs.iter().for_each(assert_well_formed);
  }

  #[test]
  fn correct_answer_matches_the_asked_word() {
    let pool = entries(6);
    let qs = generate_vocabulary_quiz_with_nonce(&pool, &config(&[QuestionType::WordToUrdu], 6), "u2", 1).expect("quiz");
    for q in &qs {
      let e = pool.iter().find(|e| q.question.contains(&format!("\"{}\"", e.word))).expect("entry");
      assert_eq!(q.correct_answer, e.urdu_translation);
    }
  }

  #[test]
  fn same_nonce_is_reproducible() {
    let cfg = config(&[QuestionType::WordToMeaning, QuestionType::WordToUsage], 6);
    let a = generate_vocabulary_quiz_with_nonce(&entries(9), &cfg, "u1", 42).expect("a");
    let b = generate_vocabulary_quiz_with_nonce(&entries(9), &cfg, "u1", 42).expect("b");
    assert_eq!(a, b);
  }

  #[test]
  fn rejects_small_pool() {
    let err = generate_vocabulary_quiz(&entries(3), &config(&[QuestionType::WordToMeaning], 3), "u1").unwrap_err();
    assert_eq!(err, ValidationError::NotEnoughEntries(3));
  }

  #[test]
  fn rejects_bad_configs() {
    let pool = entries(5);
    assert_eq!(
      generate_vocabulary_quiz(&pool, &config(&[], 2), "u1").unwrap_err(),
      ValidationError::NoQuestionTypes
    );
    assert_eq!(
      generate_vocabulary_quiz(&pool, &config(&[QuestionType::WordToUrdu], 6), "u1").unwrap_err(),
      ValidationError::CountExceedsPool { requested: 6, available: 5 }
    );
    assert_eq!(
      generate_vocabulary_quiz(&pool, &config(&[QuestionType::WordToUrdu], 0), "u1").unwrap_err(),
      ValidationError::CountOutOfRange(0)
    );
  }

  #[test]
  fn duplicate_field_values_cannot_supply_distractors() {
    let mut pool = entries(5);
    for e in pool.iter_mut().skip(1) {
      e.meaning = "same".into();
    }
    let err = generate_vocabulary_quiz_with_nonce(&pool, &config(&[QuestionType::WordToMeaning], 5), "u1", 3)
      .unwrap_err();
    assert!(matches!(err, ValidationError::NotEnoughDistractors { field: "meaning", .. }));
  }

  #[test]
  fn distribution_never_differs_by_more_than_one() {
    assert_eq!(distribute(10, 3), vec![4, 3, 3]);
    assert_eq!(distribute(4, 2), vec![2, 2]);
    assert_eq!(distribute(2, 3), vec![1, 1, 0]);
  }
}
