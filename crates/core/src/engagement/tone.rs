/// Simpler words for the youngest children.
const YOUNG_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("interesting", "super fun"),
    ("let's try", "wanna play"),
];

/// Rewrite `text` for a child of `age`. Children at or below
/// `young_max_age` get literal phrase substitutions; everyone else gets
/// the text unchanged.
pub fn adjust_tone(text: &str, age: u8, young_max_age: u8) -> String {
    if age > young_max_age {
        return text.to_string();
    }
    YOUNG_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn young_child_gets_simpler_words() {
        assert_eq!(
            adjust_tone("that's interesting, let's try it", 5, 6),
            "that's super fun, wanna play it"
        );
        assert_eq!(adjust_tone("interesting", 6, 6), "super fun");
    }

    #[test]
    fn older_child_text_unchanged() {
        let text = "that's interesting, let's try it";
        assert_eq!(adjust_tone(text, 10, 6), text);
        assert_eq!(adjust_tone(text, 7, 6), text);
    }

    #[test]
    fn substitution_is_case_sensitive() {
        assert_eq!(adjust_tone("Interesting!", 4, 6), "Interesting!");
    }
}
