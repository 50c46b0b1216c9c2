use std::sync::LazyLock;

use regex::Regex;

use crate::config::SproutCfg;
use crate::memory::history::HistoryStore;
use crate::types::{Classification, HistoryEntry, Intent, UserProfile};

use super::persona::persona_for;

/// Greeting must open the message; "hello there" is a greeting, "say hi" is not.
static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(hi|hai|hey|hiya|hello|hellow|greet|yo|howdy)\b")
        .expect("greeting pattern is valid")
});

/// Keyword intents in priority order; first match wins.
const KEYWORD_INTENTS: &[(Intent, &[&str])] = &[
    (Intent::BedtimeStory, &["bedtime story", "story for sleep", "sotry", "sleepy"]),
    (Intent::MathQuiz, &["math", "quiz", "numbers"]),
    (Intent::EmotionalCheckin, &["feeling", "sad", "happy", "scared"]),
];

const CHARACTER_QUERY: &str = "who is";

/// Maps a message to an intent and builds the handler's task description.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    relevant_limit: usize,
}

impl IntentClassifier {
    pub fn new(relevant_limit: usize) -> Self {
        Self { relevant_limit }
    }

    pub fn from_cfg(cfg: &SproutCfg) -> Self {
        Self::new(cfg.relevant_limit)
    }

    pub fn classify(&self, input: &str, profile: &UserProfile, history: &HistoryStore) -> Classification {
        let normalized = input.trim().to_lowercase();
        let relevant = history.relevant(&normalized, self.relevant_limit);
        let snapshot = history_snapshot(&relevant);
        let intent = detect_intent(&normalized);
        tracing::debug!(%intent, relevant = relevant.len(), "intent classified");

        let (context, expected_output) = match intent {
            Intent::Greeting => (
                format!(
                    "Greet the child who said: '{input}'. Context: {snapshot}. \
                     Call them {} and mention their favorite theme: {}.",
                    profile.name, profile.favorite_theme
                ),
                "A friendly greeting response".to_string(),
            ),
            Intent::Fallback => (
                format!("Chat in a friendly way about: '{input}'. Context: {snapshot}"),
                "A friendly response".to_string(),
            ),
            _ => {
                let mut task = format!("Handle {intent} for input: '{input}'. Context: {snapshot}");
                if intent == Intent::BedtimeStory {
                    task.push_str(&story_enrichment(&normalized, profile, &relevant));
                }
                (task, format!("A {intent} response"))
            }
        };

        Classification {
            intent,
            persona: persona_for(intent),
            context,
            expected_output,
        }
    }
}

/// Intent for already-normalized input.
pub fn detect_intent(normalized: &str) -> Intent {
    if GREETING.is_match(normalized) {
        return Intent::Greeting;
    }
    KEYWORD_INTENTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Fallback)
}

fn story_enrichment(normalized: &str, profile: &UserProfile, relevant: &[&HistoryEntry]) -> String {
    let theme = &profile.favorite_theme;
    let mut extra = format!(" Include {} and {theme}.", profile.name);
    let told_before = relevant.iter().any(|e| e.intent == Intent::BedtimeStory);
    if told_before && normalized.contains(CHARACTER_QUERY) {
        extra.push_str(&format!(
            " The child is asking about a character; treat it as someone from an earlier {theme} story and describe them."
        ));
    } else if told_before {
        extra.push_str(&format!(
            " Refer back to the earlier bedtime story, e.g. 'Last time you loved {theme}, want more?', and offer to continue it."
        ));
    }
    extra
}

/// Serialized view of the relevant history for the prompt.
fn history_snapshot(relevant: &[&HistoryEntry]) -> String {
    if relevant.is_empty() {
        return "No relevant history.".to_string();
    }
    match serde_json::to_string_pretty(relevant) {
        Ok(json) => format!("Previous chats: {json}"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize history snapshot");
            "No relevant history.".to_string()
        }
    }
}
