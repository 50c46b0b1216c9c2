use uuid::Uuid;

use crate::config::SproutCfg;
use crate::io::parental::{ParentalLog, ParentalSender};
use crate::memory::history::HistoryStore;
use crate::types::{HistoryEntry, SessionCounters, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("favorite theme must not be empty")]
    EmptyTheme,
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),
}

/// State bundle for one child's conversation. Owned by exactly one writer;
/// nothing here is shared across sessions.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    pub(crate) profile: UserProfile,
    pub(crate) counters: SessionCounters,
    pub(crate) history: HistoryStore,
    pub(crate) parental: ParentalLog,
    /// Input of the last message stopped by escalation, until the child
    /// answers the hand-off offer or sends something else.
    pub(crate) pending_escalation: Option<String>,
}

impl Session {
    /// Session with a placeholder profile, awaiting onboarding.
    pub fn new(cfg: &SproutCfg) -> Self {
        Self::with_profile(
            UserProfile {
                name: "friend".into(),
                age: cfg.default_age,
                favorite_theme: "fun surprises".into(),
            },
            cfg,
        )
    }

    pub fn with_profile(profile: UserProfile, cfg: &SproutCfg) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile,
            counters: SessionCounters::new(),
            history: HistoryStore::new(cfg.history_cap),
            parental: ParentalLog::new(),
            pending_escalation: None,
        }
    }

    /// Forward every parental notice over `tx` as well as logging it locally.
    pub fn with_parental_forward(mut self, tx: ParentalSender) -> Self {
        self.parental = ParentalLog::with_forward(tx);
        self
    }

    /// Onboarding: set name and favorite theme. Age is left as configured.
    pub fn set_profile(&mut self, name: &str, theme: &str) -> Result<String, SessionError> {
        let name = name.trim();
        let theme = theme.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if theme.is_empty() {
            return Err(SessionError::EmptyTheme);
        }
        self.profile.name = name.to_string();
        self.profile.favorite_theme = theme.to_string();
        tracing::info!(session = %self.id, name, theme, "profile set");
        Ok(format!("Awesome, {name}! I'll use {theme} in our chats!"))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::info!(session = %self.id, "history cleared");
    }

    /// Reset counters, points and history, and restart the session clock.
    /// Profile and the parental audit trail are kept.
    pub fn end_session(&mut self) {
        self.counters = SessionCounters::new();
        self.history.clear();
        self.pending_escalation = None;
        tracing::info!(session = %self.id, "session ended");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn points(&self) -> u32 {
        self.counters.points
    }

    pub fn interaction_count(&self) -> u32 {
        self.counters.interaction_count
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn parental_log(&self) -> &ParentalLog {
        &self.parental
    }
}
