use std::collections::{HashSet, VecDeque};

use crate::types::HistoryEntry;

/// Hard ceiling on retained entries, whatever the configured capacity.
pub const MAX_HISTORY: usize = 20;
/// Hard ceiling on entries returned by [`HistoryStore::relevant`].
pub const MAX_RELEVANT: usize = 3;

/// Bounded conversational history: FIFO ring with keyword lookup.
///
/// Relevance is plain token overlap, not semantics. "i like cats" and
/// "do you like dogs" are related through "like"; "kitten" and "cat" are not.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryStore {
    /// `capacity` is clamped to `1..=MAX_HISTORY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head past capacity.
    /// A timestamp older than the current tail is clamped to it.
    pub fn append(&mut self, mut entry: HistoryEntry) {
        if let Some(last) = self.entries.back()
            && entry.timestamp < last.timestamp
        {
            entry.timestamp = last.timestamp;
        }
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Up to `limit` (at most `MAX_RELEVANT`) entries sharing a token with
    /// `query`, newest first. Tokens come from the entry's input and its
    /// intent label.
    pub fn relevant(&self, query: &str, limit: usize) -> Vec<&HistoryEntry> {
        let wanted: HashSet<String> = tokenize(query).collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .rev()
            .filter(|e| {
                tokenize(&e.input)
                    .chain(label_tokens(e.intent.as_str()))
                    .any(|t| wanted.contains(&t))
            })
            .take(limit.min(MAX_RELEVANT))
            .collect()
    }

    /// All retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Lowercase whitespace tokens with punctuation trimmed from the edges.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
}

fn label_tokens(label: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(label.to_lowercase()).chain(
        label
            .split('_')
            .filter(|part| !part.is_empty())
            .map(str::to_lowercase),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Intent;
    use chrono::{Duration, Utc};

    fn entry(input: &str, intent: Intent) -> HistoryEntry {
        HistoryEntry::new(input, intent, "ok", "companion")
    }

    #[test]
    fn append_and_len() {
        let mut h = HistoryStore::new(20);
        h.append(entry("hello", Intent::Greeting));
        h.append(entry("math please", Intent::MathQuiz));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut h = HistoryStore::new(20);
        for i in 0..25 {
            h.append(entry(&format!("message {i}"), Intent::Fallback));
            assert!(h.len() <= 20);
        }
        let inputs: Vec<&str> = h.iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs.len(), 20);
        assert_eq!(inputs[0], "message 5");
        assert_eq!(inputs[19], "message 24");
    }

    #[test]
    fn oversized_capacity_is_clamped() {
        let mut h = HistoryStore::new(50);
        for i in 0..40 {
            h.append(entry(&format!("message {i}"), Intent::Fallback));
        }
        assert_eq!(h.len(), MAX_HISTORY);

        let mut tiny = HistoryStore::new(0);
        tiny.append(entry("one", Intent::Fallback));
        tiny.append(entry("two", Intent::Fallback));
        assert_eq!(tiny.len(), 1);
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut h = HistoryStore::new(4);
        let first = entry("one", Intent::Fallback);
        let stamp = first.timestamp;
        h.append(first);
        let mut stale = entry("two", Intent::Fallback);
        stale.timestamp = stamp - Duration::seconds(30);
        h.append(stale);
        let stamps: Vec<_> = h.iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(stamps[1] <= Utc::now());
    }

    #[test]
    fn relevant_matches_input_tokens_newest_first() {
        let mut h = HistoryStore::new(20);
        h.append(entry("i love dragons", Intent::Fallback));
        h.append(entry("count some numbers", Intent::MathQuiz));
        h.append(entry("more dragons please", Intent::BedtimeStory));
        let hits = h.relevant("Tell me about DRAGONS!", 3);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].input, "more dragons please");
        assert_eq!(hits[1].input, "i love dragons");
    }

    #[test]
    fn relevant_matches_intent_label_tokens() {
        let mut h = HistoryStore::new(20);
        h.append(entry("once upon a time", Intent::BedtimeStory));
        let hits = h.relevant("another bedtime tale", 3);
        assert_eq!(hits.len(), 1);
        let hits = h.relevant("bedtime_story again", 3);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn relevant_caps_at_limit() {
        let mut h = HistoryStore::new(20);
        for i in 0..6 {
            h.append(entry(&format!("cats {i}"), Intent::Fallback));
        }
        let hits = h.relevant("cats", 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].input, "cats 5");
        assert_eq!(h.relevant("cats", 10).len(), MAX_RELEVANT);
    }

    #[test]
    fn relevant_is_lexical_only() {
        // Known limitation: synonyms and inflections do not match.
        let mut h = HistoryStore::new(20);
        h.append(entry("my kitten is cute", Intent::Fallback));
        assert_eq!(h.relevant("cats are cute animals", 3).len(), 1); // via "cute"
        assert!(h.relevant("cat", 3).is_empty());
    }

    #[test]
    fn every_hit_shares_a_token() {
        let mut h = HistoryStore::new(20);
        h.append(entry("the sky is blue", Intent::Fallback));
        h.append(entry("trains go fast", Intent::Fallback));
        h.append(entry("quiz me", Intent::MathQuiz));
        let query = "is the train fast";
        let q: HashSet<String> = tokenize(query).collect();
        for hit in h.relevant(query, 3) {
            let shared = tokenize(&hit.input)
                .chain(label_tokens(hit.intent.as_str()))
                .any(|t| q.contains(&t));
            assert!(shared, "{hit:?} shares no token with {query:?}");
        }
    }

    #[test]
    fn clear_empties_store() {
        let mut h = HistoryStore::new(2);
        h.append(entry("hi", Intent::Greeting));
        h.clear();
        assert!(h.is_empty());
        assert!(h.relevant("hi", 3).is_empty());
    }
}
