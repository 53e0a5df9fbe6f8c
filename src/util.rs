//! Small utility helpers used across modules.

use std::time::{SystemTime, UNIX_EPOCH};

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True if the char belongs to the Arabic-script blocks Urdu is written in.
pub fn is_urdu_script(ch: char) -> bool {
  ('\u{0600}'..='\u{06FF}').contains(&ch)
    || ('\u{0750}'..='\u{077F}').contains(&ch)
    || ('\u{FB50}'..='\u{FDFF}').contains(&ch)
    || ('\u{FE70}'..='\u{FEFF}').contains(&ch)
}

/// Log-safe truncation for large strings, on a char boundary.
/// Avoids spamming logs with huge model responses.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let total = s.chars().count();
  if total <= max_chars {
    s.to_string()
  } else {
    format!("{}… ({} chars total)", s.chars().take(max_chars).collect::<String>(), total)
  }
}

/// Seconds since the Unix epoch; 0 if the clock is before it.
pub fn now_secs() -> u64 {
  SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
