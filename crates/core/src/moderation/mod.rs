//! Per-message policy gates, applied in order: safety, usage, escalation.

pub mod escalation;
pub mod safety;
pub mod usage;

pub use escalation::EscalationDetector;
pub use safety::SafetyFilter;
pub use usage::UsageMonitor;

/// First configured keyword occurring in `text` (case-insensitive substring).
pub(crate) fn find_keyword<'a>(keywords: &'a [String], text: &str) -> Option<&'a str> {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .map(String::as_str)
        .find(|k| !k.is_empty() && lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_keyword_is_case_insensitive_substring() {
        let kws = vec!["sad".to_string(), "angry".to_string()];
        assert_eq!(find_keyword(&kws, "I am ANGRY"), Some("angry"));
        assert_eq!(find_keyword(&kws, "so sadly"), Some("sad"));
        assert_eq!(find_keyword(&kws, "happy"), None);
    }

    #[test]
    fn empty_keyword_never_matches() {
        let kws = vec![String::new()];
        assert_eq!(find_keyword(&kws, "anything"), None);
    }
}
