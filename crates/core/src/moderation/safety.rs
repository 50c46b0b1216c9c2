use crate::config::SproutCfg;
use crate::memory::history::HistoryStore;
use crate::types::Verdict;

use super::find_keyword;

pub const UNSAFE_INPUT_MSG: &str =
    "Sorry, that request isn't safe for kids. Try something fun like a story!";
pub const UNSAFE_HISTORY_MSG: &str =
    "Sorry, I can't use that past chat because it's not safe. What's next?";
pub const SAFE_MSG: &str = "Content is safe.";

/// Keyword gate over the current input and the history it would pull in.
/// Best effort only; read-only.
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    keywords: Vec<String>,
    relevant_limit: usize,
}

impl SafetyFilter {
    pub fn new(keywords: Vec<String>, relevant_limit: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            relevant_limit,
        }
    }

    pub fn from_cfg(cfg: &SproutCfg) -> Self {
        Self::new(cfg.unsafe_keywords.clone(), cfg.relevant_limit)
    }

    /// Fails on a denylisted keyword in `input`, or in the input/output of
    /// any history entry relevant to it. Only the relevant window is scanned.
    pub fn check(&self, input: &str, history: &HistoryStore) -> Verdict {
        if let Some(keyword) = find_keyword(&self.keywords, input) {
            tracing::debug!(keyword, "unsafe keyword in input");
            return Verdict::fail(UNSAFE_INPUT_MSG);
        }
        let poisoned = history
            .relevant(input, self.relevant_limit)
            .into_iter()
            .any(|e| {
                find_keyword(&self.keywords, &e.input).is_some()
                    || find_keyword(&self.keywords, &e.output).is_some()
            });
        if poisoned {
            tracing::debug!("unsafe keyword in relevant history");
            return Verdict::fail(UNSAFE_HISTORY_MSG);
        }
        Verdict::pass(SAFE_MSG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoryEntry, Intent};

    fn filter() -> SafetyFilter {
        SafetyFilter::from_cfg(&SproutCfg::default())
    }

    #[test]
    fn blocks_unsafe_input() {
        let history = HistoryStore::new(20);
        let v = filter().check("let's watch something violent", &history);
        assert!(!v.passed);
        assert_eq!(v.message, UNSAFE_INPUT_MSG);
    }

    #[test]
    fn blocks_case_insensitively() {
        let history = HistoryStore::new(20);
        assert!(!filter().check("EXPLICIT stuff", &history).passed);
    }

    #[test]
    fn passes_benign_input() {
        let history = HistoryStore::new(20);
        let v = filter().check("tell me about rainbows", &history);
        assert!(v.passed);
        assert_eq!(v.message, SAFE_MSG);
    }

    #[test]
    fn relevant_history_output_poisons_check() {
        let mut history = HistoryStore::new(20);
        history.append(HistoryEntry::new(
            "tell me about movies",
            Intent::Fallback,
            "some movies are explicit",
            "companion",
        ));
        let v = filter().check("more movies please", &history);
        assert!(!v.passed);
        assert_eq!(v.message, UNSAFE_HISTORY_MSG);
    }

    #[test]
    fn irrelevant_unsafe_history_is_ignored() {
        let mut history = HistoryStore::new(20);
        history.append(HistoryEntry::new(
            "tell me about movies",
            Intent::Fallback,
            "some movies are explicit",
            "companion",
        ));
        assert!(filter().check("count to ten", &history).passed);
    }

    #[test]
    fn only_relevant_window_is_scanned() {
        let mut history = HistoryStore::new(20);
        history.append(HistoryEntry::new("dogs", Intent::Fallback, "a mature dog", "companion"));
        for _ in 0..3 {
            history.append(HistoryEntry::new("dogs", Intent::Fallback, "woof", "companion"));
        }
        // The poisoned entry is the fourth most recent match.
        assert!(filter().check("dogs", &history).passed);
    }

    #[test]
    fn custom_denylist() {
        let f = SafetyFilter::new(vec!["Spooky".into()], 3);
        let history = HistoryStore::new(20);
        assert!(!f.check("a spooky tale", &history).passed);
        assert!(f.check("a violent tale", &history).passed);
    }
}
