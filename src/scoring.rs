//! Quiz scoring. MCQ answers must match exactly; free-text answers are normalized.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::QuizQuestion;

/// Per-submission grading summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub correct: usize,
  pub total: usize,
  /// 0..=100, rounded to one decimal.
  pub percentage: f32,
  pub per_question: Vec<bool>,
}

/// Trim, lowercase and collapse internal whitespace runs to single spaces.
pub fn normalize_free_text(s: &str) -> String {
  s.split_whitespace()
    .map(|w| w.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn is_correct(question: &QuizQuestion, answer: Option<&str>) -> bool {
  let Some(answer) = answer else { return false };
  if question.options.is_some() {
    answer == question.correct_answer
  } else {
    normalize_free_text(answer) == normalize_free_text(&question.correct_answer)
  }
}

/// Number of correctly answered questions. `answers` is keyed by question index.
pub fn score_quiz(questions: &[QuizQuestion], answers: &HashMap<usize, String>) -> usize {
  questions
    .iter()
    .enumerate()
    .filter(|(i, q)| is_correct(q, answers.get(i).map(String::as_str)))
    .count()
}

pub fn grade_quiz(questions: &[QuizQuestion], answers: &HashMap<usize, String>) -> QuizResult {
  let per_question: Vec<bool> = questions
    .iter()
    .enumerate()
    .map(|(i, q)| is_correct(q, answers.get(&i).map(String::as_str)))
    .collect();
  let correct = score_quiz(questions, answers);
  let total = questions.len();
  let percentage = if total == 0 {
    0.0
  } else {
    ((correct as f32 / total as f32) * 1000.0).round() / 10.0
  };
  QuizResult { correct, total, percentage, per_question }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mcq() -> QuizQuestion {
    QuizQuestion {
      question: "First letter?".into(),
      options: Some(vec!["A".into(), "B".into()]),
      correct_answer: "A".into(),
      kind: None,
    }
  }

  fn free(answer: &str) -> QuizQuestion {
    QuizQuestion { question: "Capital of France?".into(), options: None, correct_answer: answer.into(), kind: None }
  }

  fn answers(pairs: &[(usize, &str)]) -> HashMap<usize, String> {
    pairs.iter().map(|(i, a)| (*i, a.to_string())).collect()
  }

  #[test]
  fn mcq_is_case_sensitive() {
    assert_eq!(score_quiz(&[mcq()], &answers(&[(0, "A")])), 1);
    assert_eq!(score_quiz(&[mcq()], &answers(&[(0, "a")])), 0);
    assert_eq!(score_quiz(&[mcq()], &answers(&[(0, " A")])), 0);
  }

  #[test]
  fn free_text_is_normalized() {
    assert_eq!(score_quiz(&[free("Paris")], &answers(&[(0, " paris ")])), 1);
    assert_eq!(score_quiz(&[free("New  York")], &answers(&[(0, "new\tyork")])), 1);
    assert_eq!(score_quiz(&[free("Paris")], &answers(&[(0, "Lyon")])), 0);
  }

  #[test]
  fn missing_answers_count_as_wrong() {
    let qs = vec![mcq(), free("Paris")];
    assert_eq!(score_quiz(&qs, &HashMap::new()), 0);
    assert_eq!(score_quiz(&qs, &answers(&[(1, "PARIS"), (7, "A")])), 1);
  }

  #[test]
  fn grade_reports_percentage_and_breakdown() {
    let qs = vec![mcq(), free("Paris"), free("Rome")];
    let r = grade_quiz(&qs, &answers(&[(0, "A"), (2, "rome")]));
    assert_eq!(r.correct, 2);
    assert_eq!(r.total, 3);
    assert_eq!(r.percentage, 66.7);
    assert_eq!(r.per_question, vec![true, false, true]);
    assert_eq!(grade_quiz(&[], &HashMap::new()).percentage, 0.0);
  }
}
