//! Tolerant vocabulary CSV parser.
//!
//! - first line is a header and is always skipped
//! - delimiter is chosen per line: `;` if present, else `,`
//! - double quotes group a field; `""` inside quotes is a literal quote (via `csv`)
//! - every data row needs exactly: word, meaning, urduTranslation, usageExample

use tracing::{debug, instrument};

use crate::domain::VocabularyRecord;
use crate::error::ValidationError;

const EXPECTED_FIELDS: usize = 4;

#[instrument(level = "debug", skip(content), fields(content_len = content.len()))]
pub fn parse_vocabulary_csv(content: &str) -> Result<Vec<VocabularyRecord>, ValidationError> {
  let mut records = Vec::new();
  let mut errors = Vec::new();

  for (idx, raw) in content.lines().enumerate().skip(1) {
    let line_no = idx + 1;
    let line = raw.trim_end_matches('\r');
    if line.trim().is_empty() {
      continue;
    }

    let fields = match split_line(line, detect_delimiter(line)) {
      Ok(fields) => fields,
      Err(e) => {
        errors.push(format!("Row {line_no}: {e}"));
        continue;
      }
    };
    if fields.len() != EXPECTED_FIELDS {
      errors.push(format!(
        "Row {line_no}: expected {EXPECTED_FIELDS} fields (word, meaning, urduTranslation, usageExample), found {}",
        fields.len()
      ));
      continue;
    }

    let mut it = fields.into_iter();
    let record = VocabularyRecord {
      word: it.next().unwrap_or_default(),
      meaning: it.next().unwrap_or_default(),
      urdu_translation: it.next().unwrap_or_default(),
      usage_example: it.next().unwrap_or_default(),
    };
    let missing = record.missing_fields();
    if !missing.is_empty() {
      errors.push(format!("Row {line_no}: empty {}", missing.join(", ")));
      continue;
    }
    records.push(record);
  }

  if !errors.is_empty() {
    return Err(ValidationError::InvalidCsv(errors));
  }
  if records.is_empty() {
    return Err(ValidationError::EmptyImport);
  }
  debug!(target: "vocabulary", rows = records.len(), "CSV parsed");
  Ok(records)
}

fn detect_delimiter(line: &str) -> u8 {
  if line.contains(';') { b';' } else { b',' }
}

/// One line as trimmed fields. Quoting and `""` escapes are handled by the `csv` reader.
fn split_line(line: &str, delimiter: u8) -> Result<Vec<String>, csv::Error> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .delimiter(delimiter)
    .from_reader(line.as_bytes());

  match reader.records().next() {
    Some(record) => Ok(record?.iter().map(str::to_string).collect()),
    None => Ok(Vec::new()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_simple_row() {
    let text = "word,meaning,urdu,usage\ncat,a feline,بلی,I saw a cat";
    let rows = parse_vocabulary_csv(text).expect("rows");
    assert_eq!(
      rows,
      vec![VocabularyRecord {
        word: "cat".into(),
        meaning: "a feline".into(),
        urdu_translation: "بلی".into(),
        usage_example: "I saw a cat".into(),
      }]
    );
  }

  #[test]
  fn trims_fields_and_skips_blank_lines() {
    let text = "h1,h2,h3,h4\r\n\r\n  dog , a canine ,کتا, The dog barked \r\n\n";
    let rows = parse_vocabulary_csv(text).expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].word, "dog");
    assert_eq!(rows[0].usage_example, "The dog barked");
  }

  #[test]
  fn quoted_fields_keep_delimiters_and_escaped_quotes() {
    let text = "header\nbook,\"a set of pages, bound\",کتاب,\"She said \"\"read this book\"\"\"";
    let rows = parse_vocabulary_csv(text).expect("rows");
    assert_eq!(rows[0].meaning, "a set of pages, bound");
    assert_eq!(rows[0].usage_example, "She said \"read this book\"");
  }

  #[test]
  fn semicolon_is_detected_per_line() {
    let text = "word;meaning;urdu;usage\nsun;the star, ours;سورج;The sun rose\nmoon,night light,چاند,The moon is full";
    let rows = parse_vocabulary_csv(text).expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].meaning, "the star, ours");
    assert_eq!(rows[1].urdu_translation, "چاند");
  }

  #[test]
  fn collects_every_bad_row() {
    let text = "word,meaning,urdu,usage\ncat,a feline,بلی\ndog,a canine,کتا,The dog barked\nbird,,پرندہ";
    let err = parse_vocabulary_csv(text).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Row 2"), "{msg}");
    assert!(msg.contains("Row 4"), "{msg}");
    assert!(!msg.contains("Row 3"), "{msg}");
    match err {
      ValidationError::InvalidCsv(rows) => assert_eq!(rows.len(), 2),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn blank_fields_are_reported_by_name() {
    let text = "h\ntree,  ,درخت,The tree is tall";
    let msg = parse_vocabulary_csv(text).unwrap_err().to_string();
    assert!(msg.contains("Row 2: empty meaning"), "{msg}");
  }

  #[test]
  fn header_only_is_rejected() {
    assert_eq!(parse_vocabulary_csv("word,meaning,urdu,usage\n"), Err(ValidationError::EmptyImport));
    assert_eq!(parse_vocabulary_csv(""), Err(ValidationError::EmptyImport));
  }

  #[test]
  fn unterminated_quote_swallows_the_rest_of_the_line() {
    let text = "word,meaning,urdu,usage\nlamp,\"a light, for reading,چراغ,Turn on the lamp";
    let msg = parse_vocabulary_csv(text).unwrap_err().to_string();
    assert!(msg.contains("Row 2: expected 4 fields"), "{msg}");
    assert!(msg.contains("found 2"), "{msg}");
  }
}
