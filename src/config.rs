//! Loading agent configuration (prompts + optional passage bank) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub passages: Vec<PassageCfg>,
}

/// Translation-practice passage accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct PassageCfg {
  #[serde(default)] pub id: Option<String>,
  pub difficulty: String,
  pub urdu: String,
  #[serde(default)] pub english: Option<String>,
}

/// Prompts used by the text-generation client. Defaults target Urdu → English practice.
/// You can override them in TOML if you need to tune tone/structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Passage generation
  pub passage_system: String,
  pub passage_user_template: String,
  // Translation feedback (free text, mined by `feedback::parse_feedback_response`)
  pub feedback_system: String,
  pub feedback_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      passage_system: "You write short Urdu reading passages for language learners. Output ONLY the Urdu text.".into(),
      passage_user_template: "Write a 3-4 sentence Urdu passage at '{difficulty}' level about an everyday topic. Use Urdu script only.".into(),
      feedback_system: "You are an Urdu to English translation tutor. Be precise and encouraging.".into(),
      feedback_user_template: "Urdu passage:\n{urdu}\n\nStudent translation:\n{translation}\n\n\
Respond in markdown with exactly these parts:\n\
1. A table with columns | Urdu Phrase | Your Translation | Suggested Translation | Explanation | listing only phrases the student got wrong, followed by a blank line.\n\
2. A section headed '## Natural Version' with a fluent English translation of the whole passage.\n\
3. A section headed '## Overall Score' containing a single number from 0 to 10.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizdesk_backend", %path, passages = cfg.passages.len(), "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizdesk_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizdesk_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
