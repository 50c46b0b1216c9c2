use crate::config::SproutCfg;
use crate::io::parental::ParentalLog;
use crate::memory::history::HistoryStore;
use crate::types::Verdict;

use super::find_keyword;

pub const DISTRESS_INPUT_MSG: &str =
    "It sounds like you're feeling down. Want to talk to a parent or hear a fun story?";
pub const DISTRESS_PATTERN_MSG: &str =
    "You've mentioned feeling down a few times. Want to talk to a parent or try a fun activity?";
pub const DEGRADED_MSG: &str = "Sorry, I got a little mixed up there. Let's keep chatting!";
pub const NO_ESCALATION_MSG: &str = "No escalation needed.";

/// Detects emotional distress in the current input, or as a repeated
/// pattern across the whole retained history.
///
/// A failed verdict means "escalate". Never blocks on its own faults: if the
/// guardian notice cannot be delivered, the check degrades to a pass.
#[derive(Debug, Clone)]
pub struct EscalationDetector {
    keywords: Vec<String>,
    history_threshold: usize,
}

impl EscalationDetector {
    pub fn new(keywords: Vec<String>, history_threshold: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            history_threshold,
        }
    }

    pub fn from_cfg(cfg: &SproutCfg) -> Self {
        Self::new(cfg.distress_keywords.clone(), cfg.escalation_history_threshold)
    }

    pub fn check(&self, input: &str, history: &HistoryStore, parental: &mut ParentalLog) -> Verdict {
        if find_keyword(&self.keywords, input).is_some() {
            return escalate(parental, format!("Escalation triggered for input: {input}"), DISTRESS_INPUT_MSG);
        }

        // Whole window, not just the relevant entries.
        let distressed = history
            .iter()
            .filter(|e| find_keyword(&self.keywords, &e.input).is_some())
            .count();
        if self.history_threshold > 0 && distressed >= self.history_threshold {
            return escalate(
                parental,
                "Multiple emotional triggers detected in history".to_string(),
                DISTRESS_PATTERN_MSG,
            );
        }

        Verdict::pass(NO_ESCALATION_MSG)
    }
}

fn escalate(parental: &mut ParentalLog, notice: String, message: &str) -> Verdict {
    match parental.notify(notice) {
        Ok(()) => {
            tracing::warn!("escalation signalled");
            Verdict::fail(message)
        }
        Err(e) => {
            tracing::warn!(error = %e, "escalation notice undeliverable, continuing without escalation");
            Verdict::degraded(DEGRADED_MSG)
        }
    }
}
