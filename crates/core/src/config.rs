use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::memory::history::{MAX_HISTORY, MAX_RELEVANT};

/// All sprout policy parameters. Loaded from the `sprout_config` table at
/// startup. First boot writes defaults; later boots read existing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SproutCfg {
    // history
    pub history_cap: usize,
    pub relevant_limit: usize,

    // safety
    pub unsafe_keywords: Vec<String>,

    // escalation
    pub distress_keywords: Vec<String>,
    pub escalation_history_threshold: usize,

    // usage limits
    pub older_child_age: u8,
    pub max_interactions_older: u32,
    pub max_interactions_younger: u32,
    pub max_session_secs_older: u64,
    pub max_session_secs_younger: u64,

    // tone & rewards
    pub young_tone_max_age: u8,
    pub reward_points: u32,

    // generation
    pub generation_timeout_secs: u64,
    pub generation_max_tokens: u32,
    pub generation_temperature: f32,
    pub generation_top_p: f32,

    // onboarding
    pub default_age: u8,
}

impl Default for SproutCfg {
    fn default() -> Self {
        Self {
            history_cap: 20,
            relevant_limit: 3,
            unsafe_keywords: to_list("adult,mature,violent,explicit"),
            distress_keywords: to_list("sad,scared,angry,lonely"),
            escalation_history_threshold: 3,
            older_child_age: 8,
            max_interactions_older: 15,
            max_interactions_younger: 10,
            max_session_secs_older: 3600,
            max_session_secs_younger: 1800,
            young_tone_max_age: 6,
            reward_points: 10,
            generation_timeout_secs: 30,
            generation_max_tokens: 1024,
            generation_temperature: 0.5,
            generation_top_p: 0.9,
            default_age: 7,
        }
    }
}

impl SproutCfg {
    /// Load config from `sprout_config` table. If table is empty, seed with defaults.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM sprout_config")
                .fetch_all(pool)
                .await?;

        if rows.is_empty() {
            let cfg = Self::default();
            cfg.seed(pool).await?;
            tracing::info!("sprout_config seeded with defaults");
            return Ok(cfg);
        }

        let map: HashMap<String, String> = rows.into_iter().collect();
        Ok(Self::from_map(&map))
    }

    /// Write all default values into `sprout_config` table.
    async fn seed(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        for (key, value, desc) in &self.to_entries() {
            sqlx::query(
                "INSERT INTO sprout_config (key, value, description) VALUES ($1, $2, $3) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .bind(desc)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            history_cap: get_or(m, "history_cap", d.history_cap).clamp(1, MAX_HISTORY),
            relevant_limit: get_or(m, "relevant_limit", d.relevant_limit).clamp(1, MAX_RELEVANT),
            unsafe_keywords: list_or(m, "unsafe_keywords", d.unsafe_keywords),
            distress_keywords: list_or(m, "distress_keywords", d.distress_keywords),
            escalation_history_threshold: get_or(m, "escalation_history_threshold", d.escalation_history_threshold),
            older_child_age: get_or(m, "older_child_age", d.older_child_age),
            max_interactions_older: get_or(m, "max_interactions_older", d.max_interactions_older),
            max_interactions_younger: get_or(m, "max_interactions_younger", d.max_interactions_younger),
            max_session_secs_older: get_or(m, "max_session_secs_older", d.max_session_secs_older),
            max_session_secs_younger: get_or(m, "max_session_secs_younger", d.max_session_secs_younger),
            young_tone_max_age: get_or(m, "young_tone_max_age", d.young_tone_max_age),
            reward_points: get_or(m, "reward_points", d.reward_points),
            generation_timeout_secs: get_or(m, "generation_timeout_secs", d.generation_timeout_secs),
            generation_max_tokens: get_or(m, "generation_max_tokens", d.generation_max_tokens),
            generation_temperature: get_or(m, "generation_temperature", d.generation_temperature),
            generation_top_p: get_or(m, "generation_top_p", d.generation_top_p),
            default_age: get_or(m, "default_age", d.default_age),
        }
    }

    fn to_entries(&self) -> Vec<(&str, String, &str)> {
        vec![
            ("history_cap", self.history_cap.to_string(), "Max retained history entries"),
            ("relevant_limit", self.relevant_limit.to_string(), "Max relevant history entries per query"),
            ("unsafe_keywords", self.unsafe_keywords.join(","), "Comma-separated unsafe keyword denylist"),
            ("distress_keywords", self.distress_keywords.join(","), "Comma-separated emotional distress keywords"),
            ("escalation_history_threshold", self.escalation_history_threshold.to_string(), "Distress entries in history that trigger escalation"),
            ("older_child_age", self.older_child_age.to_string(), "Age from which the older-child limits apply"),
            ("max_interactions_older", self.max_interactions_older.to_string(), "Interaction ceiling for older children"),
            ("max_interactions_younger", self.max_interactions_younger.to_string(), "Interaction ceiling for younger children"),
            ("max_session_secs_older", self.max_session_secs_older.to_string(), "Session time ceiling for older children"),
            ("max_session_secs_younger", self.max_session_secs_younger.to_string(), "Session time ceiling for younger children"),
            ("young_tone_max_age", self.young_tone_max_age.to_string(), "Max age for simplified vocabulary"),
            ("reward_points", self.reward_points.to_string(), "Points per completed quiz-like exchange"),
            ("generation_timeout_secs", self.generation_timeout_secs.to_string(), "Generation call timeout seconds"),
            ("generation_max_tokens", self.generation_max_tokens.to_string(), "Max completion tokens"),
            ("generation_temperature", self.generation_temperature.to_string(), "Sampling temperature"),
            ("generation_top_p", self.generation_top_p.to_string(), "Nucleus sampling cut-off"),
            ("default_age", self.default_age.to_string(), "Profile age used at onboarding"),
        ]
    }

    /// Interaction ceiling for a child of `age`.
    pub fn max_interactions(&self, age: u8) -> u32 {
        if age >= self.older_child_age {
            self.max_interactions_older
        } else {
            self.max_interactions_younger
        }
    }

    /// Session time ceiling in seconds for a child of `age`.
    pub fn max_session_secs(&self, age: u8) -> u64 {
        if age >= self.older_child_age {
            self.max_session_secs_older
        } else {
            self.max_session_secs_younger
        }
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma-separated list; an empty list falls back to the default.
fn list_or(map: &HashMap<String, String>, key: &str, default: Vec<String>) -> Vec<String> {
    match map.get(key).map(|v| to_list(v)) {
        Some(list) if !list.is_empty() => list,
        _ => default,
    }
}

fn to_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_thresholds() {
        let cfg = SproutCfg::default();
        assert_eq!(cfg.max_interactions(7), 10);
        assert_eq!(cfg.max_interactions(8), 15);
        assert_eq!(cfg.max_session_secs(5), 1800);
        assert_eq!(cfg.max_session_secs(9), 3600);
    }

    #[test]
    fn from_map_overrides_keywords() {
        let mut m = HashMap::new();
        m.insert("unsafe_keywords".to_string(), " Scary , gory,,".to_string());
        m.insert("reward_points".to_string(), "25".to_string());
        let cfg = SproutCfg::from_map(&m);
        assert_eq!(cfg.unsafe_keywords, vec!["scary", "gory"]);
        assert_eq!(cfg.reward_points, 25);
        assert_eq!(cfg.history_cap, 20);
    }

    #[test]
    fn from_map_ignores_bad_values() {
        let mut m = HashMap::new();
        m.insert("history_cap".to_string(), "lots".to_string());
        m.insert("distress_keywords".to_string(), " , ".to_string());
        let cfg = SproutCfg::from_map(&m);
        assert_eq!(cfg.history_cap, 20);
        assert_eq!(cfg.distress_keywords, SproutCfg::default().distress_keywords);
    }

    #[test]
    fn from_map_clamps_history_bounds() {
        let mut m = HashMap::new();
        m.insert("history_cap".to_string(), "50".to_string());
        m.insert("relevant_limit".to_string(), "9".to_string());
        let cfg = SproutCfg::from_map(&m);
        assert_eq!(cfg.history_cap, 20);
        assert_eq!(cfg.relevant_limit, 3);

        m.insert("history_cap".to_string(), "0".to_string());
        m.insert("relevant_limit".to_string(), "0".to_string());
        let cfg = SproutCfg::from_map(&m);
        assert_eq!(cfg.history_cap, 1);
        assert_eq!(cfg.relevant_limit, 1);

        m.insert("history_cap".to_string(), "12".to_string());
        assert_eq!(SproutCfg::from_map(&m).history_cap, 12);
    }

    #[test]
    fn entries_round_trip_through_map() {
        let cfg = SproutCfg::default();
        let map: HashMap<String, String> = cfg
            .to_entries()
            .into_iter()
            .map(|(k, v, _)| (k.to_string(), v))
            .collect();
        let back = SproutCfg::from_map(&map);
        assert_eq!(back.unsafe_keywords, cfg.unsafe_keywords);
        assert_eq!(back.max_session_secs_younger, cfg.max_session_secs_younger);
    }
}
