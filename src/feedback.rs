//! Best-effort mining of translation feedback out of free-form model output.
//!
//! Expected (but never guaranteed) shape of the response:
//!
//! ```text
//! | Urdu phrase | Your translation | Suggested | Why |
//! |---|---|---|---|
//! | ... | ... | ... | ... |
//!
//! ## Natural Version
//! A fluent English rendering of the whole passage.
//!
//! ## Overall Score
//! 7/10
//! ```
//!
//! Parsing never fails: missing pieces are replaced by fixed fallbacks.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{FeedbackRow, ParsedFeedback};

pub const NATURAL_VERSION_FALLBACK: &str = "Natural version not available.";
pub const DEFAULT_SCORE: f32 = 5.0;
const MAX_SCORE: f32 = 10.0;

static NATURAL_VERSION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*|\*\*)?natural[ \t]+version\b").expect("natural version regex is invalid")
});

static OVERALL_SCORE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?im)^[ \t]*(?:#+[ \t]*|\*\*)?overall[ \t]+score\b").expect("overall score regex is invalid")
});

static NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number regex is invalid"));

// "(0-10)" style scale hints on a score header line.
static PARENTHESIZED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthesized regex is invalid"));

static OUT_OF_TEN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:/\s*10\b|out\s+of\s+10\b)").expect("out of ten regex is invalid")
});

pub fn parse_feedback_response(text: &str) -> ParsedFeedback {
  let feedback_rows = parse_table(text);
  let natural_version = parse_natural_version(text).unwrap_or_else(|| NATURAL_VERSION_FALLBACK.to_string());
  let found = parse_score(text);

  debug!(
    target: "translation",
    rows = feedback_rows.len(),
    score_found = found.is_some(),
    "Feedback response parsed"
  );

  ParsedFeedback {
    feedback_rows,
    natural_version,
    score: found.unwrap_or(DEFAULT_SCORE),
    score_found: found.is_some(),
    raw_text: text.to_string(),
  }
}

/// First run of consecutive `|` lines; header and separator rows are dropped.
fn parse_table(text: &str) -> Vec<FeedbackRow> {
  let block: Vec<&str> = text
    .lines()
    .map(str::trim)
    .skip_while(|l| !l.starts_with('|'))
    .take_while(|l| l.starts_with('|'))
    .collect();

  block
    .iter()
    .skip(2)
    .filter_map(|line| {
      let cells: Vec<&str> = line.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
      if cells.len() < 4 {
        return None;
      }
      Some(FeedbackRow {
        urdu_phrase: cells[0].to_string(),
        user_translation: cells[1].to_string(),
        suggested_translation: cells[2].to_string(),
        explanation: cells[3].to_string(),
      })
    })
    .collect()
}

/// Section opened by a heading line matching `header`: the rest of the heading line
/// and the lines up to the next `##` heading.
fn section<'t>(header: &Regex, text: &'t str) -> Option<(&'t str, Vec<&'t str>)> {
  let found = header.find(text)?;
  let mut lines = text[found.end()..].lines();
  let inline = lines.next().unwrap_or_default();
  let body = lines.take_while(|l| !l.trim_start().starts_with("##")).collect();
  Some((inline, body))
}

fn parse_natural_version(text: &str) -> Option<String> {
  let (inline, body) = section(&NATURAL_VERSION, text)?;

  // e.g. "**Natural Version:** It rained."
  let inline = inline
    .trim_start_matches(|c: char| c == '*' || c == ':' || c == '#' || c.is_whitespace())
    .trim_end();
  let body = body.join("\n");
  let body = body.trim();

  let out = match (inline.is_empty(), body.is_empty()) {
    (true, true) => return None,
    (false, true) => inline.to_string(),
    (true, false) => body.to_string(),
    (false, false) => format!("{inline}\n{body}"),
  };
  Some(out)
}

/// First number inside the "Overall Score" section, else an "N/10" or "N out of 10" anywhere.
fn parse_score(text: &str) -> Option<f32> {
  let in_section = section(&OVERALL_SCORE, text).and_then(|(inline, body)| {
    let inline = PARENTHESIZED.replace_all(inline, "");
    NUMBER
      .find(&inline)
      .map(|m| m.as_str().to_string())
      .or_else(|| body.iter().find_map(|l| NUMBER.find(l)).map(|m| m.as_str().to_string()))
  });
  let raw = match in_section {
    Some(n) => n,
    None => OUT_OF_TEN.captures(text)?.get(1)?.as_str().to_string(),
  };
  let score = raw.parse::<f32>().ok()?;
  Some(score.clamp(0.0, MAX_SCORE))
}

#[cfg(test)]
mod tests {
  use super::*;

  const FULL: &str = "\
Here is my review.

| Urdu Phrase | Your Translation | Suggested Translation | Explanation |
|-------------|------------------|-----------------------|-------------|
| میں بازار گیا | I go market | I went to the market | Past tense is needed |
| وہ خوش ہے | He happy | He is happy | Missing the verb |
| short | row |

## Natural Version
I went to the market. He is happy.

## Overall Score
7.5/10
";

  #[test]
  fn empty_input_degrades_gracefully() {
    let p = parse_feedback_response("");
    assert!(p.feedback_rows.is_empty());
    assert_eq!(p.natural_version, NATURAL_VERSION_FALLBACK);
    assert_eq!(p.score, 5.0);
    assert!(!p.score_found);
    assert_eq!(p.raw_text, "");
  }

  #[test]
  fn parses_a_well_formed_response() {
    let p = parse_feedback_response(FULL);
    assert_eq!(p.feedback_rows.len(), 2);
    assert_eq!(p.feedback_rows[0].urdu_phrase, "میں بازار گیا");
    assert_eq!(p.feedback_rows[0].user_translation, "I go market");
    assert_eq!(p.feedback_rows[1].suggested_translation, "He is happy");
    assert_eq!(p.feedback_rows[1].explanation, "Missing the verb");
    assert_eq!(p.natural_version, "I went to the market. He is happy.");
    assert_eq!(p.score, 7.5);
    assert!(p.score_found);
    assert_eq!(p.raw_text, FULL);
  }

  #[test]
  fn score_is_clamped() {
    assert_eq!(parse_feedback_response("## Overall Score\n15").score, 10.0);
    assert_eq!(parse_feedback_response("## Overall Score\n-3").score, 0.0);
  }

  #[test]
  fn score_falls_back_to_out_of_ten_patterns() {
    let p = parse_feedback_response("Nice work overall, I'd give this 8 out of 10.");
    assert_eq!(p.score, 8.0);
    assert!(p.score_found);
    assert_eq!(parse_feedback_response("Rating: 6 / 10").score, 6.0);
  }

  #[test]
  fn natural_version_header_is_case_insensitive_and_stops_at_next_heading() {
    let text = "## NATURAL VERSION\nThe weather is lovely today.\nLet us go out.\n## Overall Score\n9";
    let p = parse_feedback_response(text);
    assert_eq!(p.natural_version, "The weather is lovely today.\nLet us go out.");
    assert_eq!(p.score, 9.0);
  }

  #[test]
  fn natural_version_may_share_the_header_line() {
    let p = parse_feedback_response("**Natural Version:** It is raining heavily.");
    assert_eq!(p.natural_version, "It is raining heavily.");
  }

  #[test]
  fn table_without_data_rows_yields_nothing() {
    let p = parse_feedback_response("| a | b | c | d |\n|---|---|---|---|\n\nno more");
    assert!(p.feedback_rows.is_empty());
  }

  #[test]
  fn garbage_never_panics() {
    for input in ["|", "||||\n|", "Overall Score", "## Natural Version", "/10", "\n\n\n"] {
      let p = parse_feedback_response(input);
      assert!((0.0..=10.0).contains(&p.score));
    }
  }

  #[test]
  fn section_names_in_prose_do_not_hijack_the_parse() {
    let text = "\
Your overall score reflects 3 small errors.

| Urdu Phrase | Your Translation | Suggested Translation | Explanation |
|---|---|---|---|
| وہ خوش ہے | He happy | He is happy | A more natural version adds the verb |

## Natural Version
He is happy.

## Overall Score
8
";
    let p = parse_feedback_response(text);
    assert_eq!(p.natural_version, "He is happy.");
    assert_eq!(p.score, 8.0);
    assert_eq!(p.feedback_rows.len(), 1);
  }

  #[test]
  fn score_header_may_carry_the_value_or_a_scale_hint() {
    assert_eq!(parse_feedback_response("**Overall Score:** 7/10").score, 7.0);
    assert_eq!(parse_feedback_response("## Overall Score (0-10)\n6.5").score, 6.5);
  }

  #[test]
  fn score_outside_its_section_is_ignored() {
    let p = parse_feedback_response("## Overall Score\n\n## Notes\nThree things to fix.");
    assert!(!p.score_found);
    assert_eq!(p.score, DEFAULT_SCORE);
  }
}
