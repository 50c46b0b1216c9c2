use crate::memory::history::HistoryStore;
use crate::types::{Intent, SessionCounters};

/// Gamification for quiz-like intents. Not idempotent: every call on an
/// eligible intent awards points again.
#[derive(Debug, Clone, Copy)]
pub struct Rewarder {
    points: u32,
}

impl Rewarder {
    pub fn new(points: u32) -> Self {
        Self { points }
    }

    /// Award points and decorate `output` for eligible intents; pass others
    /// through. Prior exchanges with the same intent add an encouragement
    /// line ahead of the congratulations.
    pub fn reward(
        &self,
        output: &str,
        intent: Intent,
        name: &str,
        counters: &mut SessionCounters,
        history: &HistoryStore,
    ) -> String {
        if !intent.is_reward_eligible() {
            return output.to_string();
        }
        counters.points += self.points;
        tracing::info!(%intent, awarded = self.points, total = counters.points, "points awarded");

        let mut text = output.to_string();
        if history.iter().any(|e| e.intent == intent) {
            text.push('\n');
            text.push_str(&encouragement(intent, name));
        }
        text.push_str(&format!(
            "\nGreat job! You earned {} points (Total: {}). Want a fun fact as a bonus?",
            self.points, counters.points
        ));
        text
    }
}

fn encouragement(intent: Intent, name: &str) -> String {
    match intent {
        Intent::Riddle => format!("You cracked riddles before, {name}!"),
        _ => format!("You did great on quizzes before, {name}!"),
    }
}
