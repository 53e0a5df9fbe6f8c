//! Seed data: built-in translation passages so practice works without config or a text service.

use crate::domain::{Passage, PassageSource};

/// Minimal set of built-in passages.
pub fn seed_passages() -> Vec<Passage> {
  vec![
    Passage {
      id: "p101".into(),
      difficulty: "beginner".into(),
      source: PassageSource::Seed,
      urdu: "میرا نام علی ہے۔ میں لاہور میں رہتا ہوں۔ مجھے کرکٹ کھیلنا پسند ہے۔".into(),
      english: "My name is Ali. I live in Lahore. I like playing cricket.".into(),
    },
    Passage {
      id: "p102".into(),
      difficulty: "beginner".into(),
      source: PassageSource::Seed,
      urdu: "آج موسم بہت اچھا ہے۔ ہم پارک جا رہے ہیں۔".into(),
      english: "The weather is very nice today. We are going to the park.".into(),
    },
    Passage {
      id: "p201".into(),
      difficulty: "intermediate".into(),
      source: PassageSource::Seed,
      urdu: "کل شام بارش کی وجہ سے بازار بند تھا، اس لیے ہم نے گھر پر کھانا بنایا۔".into(),
      english: "Yesterday evening the market was closed because of the rain, so we cooked at home.".into(),
    },
  ]
}

/// Absolute last-resort fallback when no passage exists for a difficulty.
/// The id is fixed per level, so serving it repeatedly never grows the stores.
pub fn hard_fallback_passage(difficulty: &str) -> Passage {
  Passage {
    id: format!("fallback-{difficulty}"),
    difficulty: difficulty.to_string(),
    source: PassageSource::Seed,
    urdu: "وہ استاد ہے۔".into(),
    english: "He is a teacher.".into(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::is_urdu_script;

  #[test]
  fn seeds_are_written_in_urdu_script() {
    for p in seed_passages() {
      assert!(p.urdu.chars().any(is_urdu_script), "{}", p.id);
      assert!(!p.english.is_empty());
    }
  }
}
