//! Application state: in-memory stores, prompts, OpenAI client, and passage selection.
//!
//! This module owns:
//!   - per-user vocabulary collections
//!   - quizzes and their attempts
//!   - passage stores (by id, by difficulty, last-by-difficulty)
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!
//! One `AppState` is built in `main` and shared by `Arc` with every handler.

use std::{collections::HashMap, sync::Arc};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_agent_config_from_env, AgentConfig, Prompts};
use crate::domain::{normalize_difficulty, Passage, PassageSource, Quiz, QuizAttempt, QuizMode, VocabularyEntry, VocabularyRecord};
use crate::openai::OpenAI;
use crate::seeds::{hard_fallback_passage, seed_passages};

/// Generated passages kept per difficulty; the oldest is evicted beyond this.
pub const MAX_GENERATED_PER_DIFFICULTY: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub vocabulary: Arc<RwLock<HashMap<String, Vec<VocabularyEntry>>>>,
    pub quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
    pub attempts: Arc<RwLock<HashMap<String, Vec<QuizAttempt>>>>,
    pub passages_by_id: Arc<RwLock<HashMap<String, Passage>>>,
    pub passages_by_diff: Arc<RwLock<HashMap<String, Vec<String>>>>,
    pub last_by_diff: Arc<RwLock<HashMap<String, String>>>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, seed passages, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "quizdesk_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "quizdesk_backend", "OpenAI disabled (no OPENAI_API_KEY). Using local/seed logic.");
        }
        Self::from_parts(load_agent_config_from_env(), openai)
    }

    /// Build state from an already-loaded config; used by `new` and by tests.
    pub fn from_parts(cfg_opt: Option<AgentConfig>, openai: Option<OpenAI>) -> Self {
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut id_map = HashMap::<String, Passage>::new();
        let mut diff_map = HashMap::<String, Vec<String>>::new();

        // Config-bank passages first.
        if let Some(cfg) = &cfg_opt {
            for pc in &cfg.passages {
                let id = pc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                if pc.urdu.trim().is_empty() {
                    error!(target: "translation", %id, difficulty = %pc.difficulty, "Skipping bank passage: empty urdu text.");
                    continue;
                }
                let Some(difficulty) = normalize_difficulty(&pc.difficulty) else {
                    warn!(target: "translation", %id, difficulty = %pc.difficulty, "Skipping bank passage: unknown difficulty.");
                    continue;
                };
                let p = Passage {
                    id: id.clone(),
                    difficulty: difficulty.to_string(),
                    source: PassageSource::LocalBank,
                    urdu: pc.urdu.trim().to_string(),
                    english: pc.english.clone().unwrap_or_default(),
                };
                diff_map.entry(p.difficulty.clone()).or_default().push(id.clone());
                id_map.insert(id, p);
            }
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        for p in seed_passages() {
            if id_map.contains_key(&p.id) {
                continue;
            }
            diff_map.entry(p.difficulty.clone()).or_default().push(p.id.clone());
            id_map.insert(p.id.clone(), p);
        }

        let mut count_by_diff: HashMap<String, (usize, usize)> = HashMap::new();
        for p in id_map.values() {
            let entry = count_by_diff.entry(p.difficulty.clone()).or_insert((0, 0));
            match p.source {
                PassageSource::LocalBank => entry.0 += 1,
                PassageSource::Seed | PassageSource::Generated => entry.1 += 1,
            }
        }
        for (diff, (bank, seed)) in count_by_diff {
            info!(target: "translation", %diff, local_bank = bank, seed = seed, "Startup passage inventory");
        }

        Self {
            vocabulary: Arc::new(RwLock::new(HashMap::new())),
            quizzes: Arc::new(RwLock::new(HashMap::new())),
            attempts: Arc::new(RwLock::new(HashMap::new())),
            passages_by_id: Arc::new(RwLock::new(id_map)),
            passages_by_diff: Arc::new(RwLock::new(diff_map)),
            last_by_diff: Arc::new(RwLock::new(HashMap::new())),
            openai,
            prompts,
        }
    }

    // -------- Vocabulary --------

    #[instrument(level = "debug", skip(self))]
    pub async fn list_vocabulary(&self, user: &str) -> Vec<VocabularyEntry> {
        self.vocabulary.read().await.get(user).cloned().unwrap_or_default()
    }

    /// Insert records into a user's collection. Words already present (case-insensitive),
    /// including earlier records of the same batch, are skipped.
    /// Returns the inserted entries and the number skipped.
    #[instrument(level = "debug", skip(self, records), fields(batch = records.len()))]
    pub async fn insert_vocabulary(&self, user: &str, records: Vec<VocabularyRecord>) -> (Vec<VocabularyEntry>, usize) {
        let mut store = self.vocabulary.write().await;
        let collection = store.entry(user.to_string()).or_default();
        let mut inserted = vec![];
        let mut skipped = 0usize;
        for r in records {
            let key = r.word.trim().to_lowercase();
            if collection.iter().any(|e| e.word.to_lowercase() == key) {
                skipped += 1;
                continue;
            }
            let entry = r.into_entry(Uuid::new_v4().to_string());
            collection.push(entry.clone());
            inserted.push(entry);
        }
        (inserted, skipped)
    }

    /// Remove one entry by id; false if the user has no such entry.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_vocabulary(&self, user: &str, id: &str) -> bool {
        let mut store = self.vocabulary.write().await;
        let Some(collection) = store.get_mut(user) else { return false };
        let before = collection.len();
        collection.retain(|e| e.id != id);
        collection.len() != before
    }

    // -------- Quizzes --------

    #[instrument(level = "debug", skip(self, quiz), fields(id = %quiz.id))]
    pub async fn insert_quiz(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_quiz(&self, id: &str) -> Option<Quiz> {
        self.quizzes.read().await.get(id).cloned()
    }

    /// Quizzes the user may take: their own plus every assessment.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_quizzes(&self, user: &str) -> Vec<Quiz> {
        let mut out: Vec<Quiz> = self
            .quizzes
            .read()
            .await
            .values()
            .filter(|q| q.owner == user || q.mode == QuizMode::Assessment)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.title.cmp(&b.title)));
        out
    }

    /// Store an attempt. Assessment quizzes take one attempt per user; returns false
    /// (and stores nothing) on a second one.
    #[instrument(level = "debug", skip(self, quiz, attempt), fields(quiz_id = %quiz.id, user = %attempt.user_id))]
    pub async fn record_attempt(&self, quiz: &Quiz, attempt: QuizAttempt) -> bool {
        let mut store = self.attempts.write().await;
        let list = store.entry(quiz.id.clone()).or_default();
        if quiz.mode == QuizMode::Assessment && list.iter().any(|a| a.user_id == attempt.user_id) {
            return false;
        }
        list.push(attempt);
        true
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn attempts_for(&self, quiz_id: &str) -> Vec<QuizAttempt> {
        self.attempts.read().await.get(quiz_id).cloned().unwrap_or_default()
    }

    // -------- Passages --------

    /// Insert passage into stores (by id and by difficulty). Generated passages are
    /// capped at `MAX_GENERATED_PER_DIFFICULTY` per level, oldest evicted first.
    #[instrument(level = "debug", skip(self, p), fields(id = %p.id))]
    pub async fn insert_passage(&self, p: Passage) {
        let mut by_id = self.passages_by_id.write().await;
        let mut by_diff = self.passages_by_diff.write().await;
        let id = p.id.clone();
        let generated = p.source == PassageSource::Generated;
        let ids = by_diff.entry(p.difficulty.clone()).or_default();
        ids.push(id.clone());
        by_id.insert(id, p);

        if !generated {
            return;
        }
        let mut generated_ids: Vec<String> = ids
            .iter()
            .filter(|i| by_id.get(*i).is_some_and(|p| p.source == PassageSource::Generated))
            .cloned()
            .collect();
        while generated_ids.len() > MAX_GENERATED_PER_DIFFICULTY {
            let oldest = generated_ids.remove(0);
            ids.retain(|i| *i != oldest);
            by_id.remove(&oldest);
            debug!(target: "translation", evicted = %oldest, "Generated passage evicted");
        }
    }

    /// Selection policy:
    /// 1) generate a fresh passage when the text service is available;
    /// 2) otherwise serve a random pooled passage, avoiding an immediate repeat;
    /// 3) otherwise insert a hard fallback.
    #[instrument(level = "info", skip(self), fields(%difficulty))]
    pub async fn choose_passage(&self, difficulty: &str) -> (Passage, &'static str) {
        if let Some(oa) = &self.openai {
            match oa.generate_passage(&self.prompts, difficulty).await {
                Ok(p) => {
                    let id = p.id.clone();
                    self.insert_passage(p.clone()).await;
                    self.last_by_diff.write().await.insert(difficulty.to_string(), id.clone());
                    info!(target: "translation", %difficulty, chosen = %id, source = "openai_generated_new", "Generated fresh passage");
                    return (p, "openai_generated_new");
                }
                Err(e) => {
                    error!(target: "translation", %difficulty, error = %e, "OpenAI generation failed; using pool");
                }
            }
        }

        let pooled = self.passages_by_diff.read().await.get(difficulty).cloned();
        if let Some(ids) = pooled {
            let last = self.last_by_diff.read().await.get(difficulty).cloned();
            let candidates: Vec<&String> = ids.iter().filter(|id| Some(*id) != last.as_ref()).collect();
            let chosen = candidates
                .choose(&mut rand::thread_rng())
                .map(|id| (*id).clone())
                .or_else(|| ids.first().cloned());

            if let Some(chosen_id) = chosen {
                let found = self.passages_by_id.read().await.get(&chosen_id).cloned();
                if let Some(p) = found {
                    self.last_by_diff.write().await.insert(difficulty.to_string(), chosen_id.clone());
                    info!(target: "translation", %difficulty, chosen = %chosen_id, source = "existing_pool", "Serving pooled passage");
                    return (p, "existing_pool");
                }
            }
        }

        // Registered by id only (for feedback lookups); the pool stays empty.
        let p = hard_fallback_passage(difficulty);
        self.passages_by_id
            .write()
            .await
            .entry(p.id.clone())
            .or_insert_with(|| p.clone());
        warn!(target: "translation", %difficulty, chosen = %p.id, source = "hard_fallback", "Serving hard fallback passage");
        (p, "hard_fallback")
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_passage(&self, id: &str) -> Option<Passage> {
        self.passages_by_id.read().await.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassageCfg;
    use crate::domain::QuizSource;

    fn record(word: &str) -> VocabularyRecord {
        VocabularyRecord {
            word: word.into(),
            meaning: format!("meaning of {word}"),
            urdu_translation: "لفظ".into(),
            usage_example: format!("A sentence with {word}."),
        }
    }

    fn quiz(mode: QuizMode) -> Quiz {
        Quiz {
            id: "q1".into(),
            title: "Test".into(),
            owner: "teacher".into(),
            mode,
            source: QuizSource::Authored,
            questions: vec![],
            created_at: 0,
        }
    }

    fn attempt(user: &str) -> QuizAttempt {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            quiz_id: "q1".into(),
            user_id: user.into(),
            correct: 0,
            total: 0,
            percentage: 0.0,
            per_question: vec![],
            submitted_at: 0,
        }
    }

    #[tokio::test]
    async fn vocabulary_words_are_unique_case_insensitively() {
        let state = AppState::from_parts(None, None);
        let (inserted, skipped) = state.insert_vocabulary("u1", vec![record("Cat"), record("cat "), record("dog")]).await;
        assert_eq!(inserted.len(), 2);
        assert_eq!(skipped, 1);
        let (inserted, skipped) = state.insert_vocabulary("u1", vec![record("CAT")]).await;
        assert!(inserted.is_empty());
        assert_eq!(skipped, 1);
        // other users have their own collection
        let (inserted, _) = state.insert_vocabulary("u2", vec![record("cat")]).await;
        assert_eq!(inserted.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_only_the_given_entry() {
        let state = AppState::from_parts(None, None);
        let (inserted, _) = state.insert_vocabulary("u1", vec![record("a"), record("b")]).await;
        assert!(state.delete_vocabulary("u1", &inserted[0].id).await);
        assert!(!state.delete_vocabulary("u1", &inserted[0].id).await);
        assert!(!state.delete_vocabulary("u2", &inserted[1].id).await);
        assert_eq!(state.list_vocabulary("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn assessments_accept_one_attempt_per_user() {
        let state = AppState::from_parts(None, None);
        let q = quiz(QuizMode::Assessment);
        assert!(state.record_attempt(&q, attempt("s1")).await);
        assert!(!state.record_attempt(&q, attempt("s1")).await);
        assert!(state.record_attempt(&q, attempt("s2")).await);

        let p = Quiz { id: "q2".into(), ..quiz(QuizMode::Practice) };
        assert!(state.record_attempt(&p, attempt("s1")).await);
        assert!(state.record_attempt(&p, attempt("s1")).await);
        assert_eq!(state.attempts_for("q1").await.len(), 2);
    }

    #[tokio::test]
    async fn passages_come_from_bank_then_seeds_then_fallback() {
        let cfg = AgentConfig {
            prompts: Prompts::default(),
            passages: vec![PassageCfg {
                id: Some("bank1".into()),
                difficulty: "advanced".into(),
                urdu: "یہ ایک امتحان ہے۔".into(),
                english: None,
            }],
        };
        let state = AppState::from_parts(Some(cfg), None);

        let (p, origin) = state.choose_passage("advanced").await;
        assert_eq!((p.id.as_str(), origin), ("bank1", "existing_pool"));

        let (p, origin) = state.choose_passage("beginner").await;
        assert_eq!(origin, "existing_pool");
        assert_eq!(p.source, PassageSource::Seed);
        let (second, _) = state.choose_passage("beginner").await;
        assert_ne!(p.id, second.id, "two beginner seeds exist, so no immediate repeat");
    }

    #[tokio::test]
    async fn hard_fallback_does_not_grow_the_stores() {
        let state = AppState::from_parts(None, None);
        let before = state.passages_by_id.read().await.len();
        let (p, origin) = state.choose_passage("advanced").await;
        assert_eq!(origin, "hard_fallback");
        assert!(state.get_passage(&p.id).await.is_some());
        for _ in 0..50 {
            let (again, _) = state.choose_passage("advanced").await;
            assert_eq!(again.id, p.id);
        }
        assert_eq!(state.passages_by_id.read().await.len(), before + 1);
        assert!(!state.passages_by_diff.read().await.contains_key("advanced"));
        assert!(state.last_by_diff.read().await.get("advanced").is_none());
    }

    #[tokio::test]
    async fn bank_passages_with_unknown_difficulty_are_skipped() {
        let cfg = AgentConfig {
            prompts: Prompts::default(),
            passages: vec![PassageCfg {
                id: Some("odd".into()),
                difficulty: "expert".into(),
                urdu: "یہ ایک امتحان ہے۔".into(),
                english: None,
            }],
        };
        let state = AppState::from_parts(Some(cfg), None);
        assert!(state.get_passage("odd").await.is_none());
        assert!(!state.passages_by_diff.read().await.contains_key("expert"));
    }

    #[tokio::test]
    async fn generated_passages_are_capped_per_difficulty() {
        let state = AppState::from_parts(None, None);
        for i in 0..MAX_GENERATED_PER_DIFFICULTY + 5 {
            state
                .insert_passage(Passage {
                    id: format!("g{i}"),
                    difficulty: "beginner".into(),
                    source: PassageSource::Generated,
                    urdu: "نیا سبق".into(),
                    english: String::new(),
                })
                .await;
        }
        let by_diff = state.passages_by_diff.read().await;
        let beginner = by_diff.get("beginner").expect("beginner pool");
        // two seeds plus the newest generated ones
        assert_eq!(beginner.len(), 2 + MAX_GENERATED_PER_DIFFICULTY);
        assert!(beginner.contains(&"p101".to_string()));
        assert!(!beginner.contains(&"g0".to_string()));
        assert!(state.passages_by_id.read().await.get("g4").is_none());
        assert!(state.passages_by_id.read().await.get("g5").is_some());
    }
}
