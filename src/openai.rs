//! OpenAI chat client used as the opaque text service.
//!
//! Two jobs: writing Urdu practice passages and reviewing a learner's English
//! translation. Both go through one plain-text `chat/completions` call. Logged
//! fields are models, latencies and sizes; prompt and reply bodies stay out of logs
//! and the API key is never logged.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Passage, PassageSource};
use crate::util::{fill_template, is_urdu_script};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Minimum share of Urdu-script characters for a generated passage to be accepted.
const MIN_URDU_RATIO: f32 = 0.6;

const STRICT_PASSAGE_SYSTEM: &str = r#"
You write Urdu reading passages for language learners.

Output:
- Output ONLY Urdu text in Urdu (Nastaliq/Arabic) script.
- No English, no transliteration, no titles, no notes.
"#;

fn urdu_ratio(s: &str) -> f32 {
  let (urdu, total) = s
    .chars()
    .filter(|c| !c.is_whitespace())
    .fold((0usize, 0usize), |(u, t), c| (u + usize::from(is_urdu_script(c)), t + 1));
  if total == 0 { 0.0 } else { urdu as f32 / total as f32 }
}

fn env_or(key: &str, default: &str) -> String {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

/// Which configured model a call should use.
#[derive(Clone, Copy, Debug)]
enum Tier {
  Fast,
  Strong,
}

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAI {
  /// `None` when OPENAI_API_KEY is unset, which switches the service to local fallbacks.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "quizdesk_backend", error = %e, "Could not build HTTP client for OpenAI");
        return None;
      }
    };
    Some(Self {
      client,
      api_key,
      base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
      fast_model: env_or("OPENAI_FAST_MODEL", "gpt-4o-mini"),
      strong_model: env_or("OPENAI_STRONG_MODEL", "gpt-4o"),
    })
  }

  fn model(&self, tier: Tier) -> &str {
    match tier {
      Tier::Fast => &self.fast_model,
      Tier::Strong => &self.strong_model,
    }
  }

  /// One system + user exchange; returns the trimmed reply of the first choice.
  #[instrument(level = "info", skip(self, system, user), fields(system_len = system.len(), user_len = user.len()))]
  async fn complete(&self, tier: Tier, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    let body = ChatRequest {
      model: self.model(tier),
      messages: [
        ChatMessage { role: "system", content: system },
        ChatMessage { role: "user", content: user },
      ],
      temperature,
    };
    let started = Instant::now();
    let res = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .header(USER_AGENT, concat!("quizdesk-backend/", env!("CARGO_PKG_VERSION")))
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| format!("OpenAI request failed: {e}"))?;

    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      let detail = api_error_message(&text).unwrap_or(text);
      return Err(format!("OpenAI HTTP {status}: {detail}"));
    }

    let reply: ChatResponse = res.json().await.map_err(|e| format!("OpenAI response unreadable: {e}"))?;
    if let Some(u) = &reply.usage {
      debug!(prompt = ?u.prompt_tokens, completion = ?u.completion_tokens, total = ?u.total_tokens, "OpenAI token usage");
    }
    let text = reply
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|s| s.trim().to_string())
      .unwrap_or_default();
    info!(elapsed = ?started.elapsed(), reply_len = text.len(), "OpenAI reply");
    Ok(text)
  }

  /// Fresh Urdu passage for `difficulty`. A reply that is not mostly Urdu script gets
  /// one stricter retry on the strong model.
  #[instrument(level = "info", skip(self, prompts), fields(%difficulty))]
  pub async fn generate_passage(&self, prompts: &Prompts, difficulty: &str) -> Result<Passage, String> {
    let user = fill_template(&prompts.passage_user_template, &[("difficulty", difficulty)]);

    let mut urdu = self.complete(Tier::Fast, &prompts.passage_system, &user, 0.9).await?;
    if urdu_ratio(&urdu) < MIN_URDU_RATIO {
      warn!(ratio = urdu_ratio(&urdu), "Passage not mostly Urdu; retrying with strict prompt");
      urdu = self.complete(Tier::Strong, STRICT_PASSAGE_SYSTEM, &user, 0.7).await?;
      if urdu_ratio(&urdu) < MIN_URDU_RATIO {
        return Err("model did not return an Urdu passage".into());
      }
    }

    Ok(Passage {
      id: Uuid::new_v4().to_string(),
      difficulty: difficulty.to_string(),
      source: PassageSource::Generated,
      urdu,
      english: String::new(),
    })
  }

  /// Free-text review of `translation`; mined later by `feedback::parse_feedback_response`.
  pub async fn translation_feedback(&self, prompts: &Prompts, urdu: &str, translation: &str) -> Result<String, String> {
    let user = fill_template(&prompts.feedback_user_template, &[("urdu", urdu), ("translation", translation)]);
    self.complete(Tier::Strong, &prompts.feedback_system, &user, 0.2).await
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: [ChatMessage<'a>; 2],
  temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
  #[serde(default)]
  usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
  message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
  content: Option<String>,
}

#[derive(Deserialize)]
struct TokenUsage {
  prompt_tokens: Option<u32>,
  completion_tokens: Option<u32>,
  total_tokens: Option<u32>,
}

/// `{"error":{"message":..}}` bodies are reduced to the message.
fn api_error_message(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct Envelope {
    error: Detail,
  }
  #[derive(Deserialize)]
  struct Detail {
    message: String,
  }
  serde_json::from_str::<Envelope>(body).ok().map(|e| e.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn urdu_ratio_ignores_whitespace() {
    assert_eq!(urdu_ratio(""), 0.0);
    assert_eq!(urdu_ratio("میں گیا"), 1.0);
    assert!(urdu_ratio("I went میں") < MIN_URDU_RATIO);
  }

  #[test]
  fn api_error_body_is_unwrapped() {
    let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
    assert_eq!(api_error_message(body).as_deref(), Some("Invalid API key"));
    assert_eq!(api_error_message("not json"), None);
  }

  #[test]
  fn chat_response_tolerates_missing_usage() {
    let body = r#"{"choices":[{"message":{"content":" hi "}}]}"#;
    let parsed: ChatResponse = serde_json::from_str(body).expect("response");
    assert!(parsed.usage.is_none());
    assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" hi "));
  }

  #[test]
  fn request_serializes_both_turns() {
    let req = ChatRequest {
      model: "m",
      messages: [ChatMessage { role: "system", content: "s" }, ChatMessage { role: "user", content: "u" }],
      temperature: 0.5,
    };
    let v = serde_json::to_value(&req).expect("json");
    assert_eq!(v["messages"][1]["role"], "user");
    assert_eq!(v["model"], "m");
  }
}
