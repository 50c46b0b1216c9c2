use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender id for replies produced by the pipeline itself rather than a persona.
pub const SYSTEM_SENDER: &str = "sprout";

// ── Routing types ───────────────────────────────────────────────

/// Discrete category a message is routed to. Policy outcomes get their own
/// labels so they can be recorded in history alongside real exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    BedtimeStory,
    MathQuiz,
    EmotionalCheckin,
    Riddle,
    Fallback,
    Safety,
    Overuse,
    Escalation,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::BedtimeStory => "bedtime_story",
            Self::MathQuiz => "math_quiz",
            Self::EmotionalCheckin => "emotional_checkin",
            Self::Riddle => "riddle",
            Self::Fallback => "fallback",
            Self::Safety => "safety",
            Self::Overuse => "overuse",
            Self::Escalation => "escalation",
        }
    }

    /// Quiz-like intents earn points.
    pub fn is_reward_eligible(self) -> bool {
        matches!(self, Self::MathQuiz | Self::Riddle)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named voice a generation request is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Greeter,
    /// General chit-chat; also the fallback handler.
    Companion,
    Storyteller,
    QuizGuide,
    Listener,
}

impl Persona {
    pub fn id(self) -> &'static str {
        match self {
            Self::Greeter => "greeter",
            Self::Companion => "companion",
            Self::Storyteller => "storyteller",
            Self::QuizGuide => "quiz_guide",
            Self::Listener => "listener",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything a handler invocation needs.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    pub persona: Persona,
    /// Task description with history snapshot and intent-specific enrichment.
    pub context: String,
    pub expected_output: String,
}

// ── Session types ───────────────────────────────────────────────

/// One recorded exchange. Never mutated after it enters the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub intent: Intent,
    pub output: String,
    pub sender: String,
}

impl HistoryEntry {
    pub fn new(input: impl Into<String>, intent: Intent, output: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            input: input.into(),
            intent,
            output: output.into(),
            sender: sender.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u8,
    pub favorite_theme: String,
}

/// Per-session usage and reward counters.
#[derive(Debug, Clone)]
pub struct SessionCounters {
    /// Monotonic start of the session, used for elapsed-time limits.
    pub session_start: Instant,
    pub interaction_count: u32,
    pub points: u32,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(session_start: Instant) -> Self {
        Self {
            session_start,
            interaction_count: 0,
            points: 0,
        }
    }
}

impl Default for SessionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Write-only audit record for guardians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentalNotice {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl ParentalNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

// ── Check verdicts ──────────────────────────────────────────────

/// Result of a single moderation check: whether the message may proceed,
/// plus the text to show when it may not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    /// The check could not do its job and let the message through;
    /// `message` is an apology for the child.
    pub degraded: bool,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { passed: true, message: message.into(), degraded: false }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { passed: false, message: message.into(), degraded: false }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self { passed: true, message: message.into(), degraded: true }
    }
}

// ── Reply types ─────────────────────────────────────────────────

/// Which moderation stage stopped a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    Safety,
    Overuse,
    Escalation,
}

impl PolicyViolation {
    /// History label recorded for the blocked exchange.
    pub fn intent(self) -> Intent {
        match self {
            Self::Safety => Intent::Safety,
            Self::Overuse => Intent::Overuse,
            Self::Escalation => Intent::Escalation,
        }
    }
}

/// How a message left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Empty input; nothing counted or recorded.
    Unheard,
    Blocked(PolicyViolation),
    Answered(Intent),
    /// The collaborator errored or timed out; state untouched.
    GenerationFailed,
    /// No collaborator configured.
    Napping,
}

/// One line of output for a front end to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatLine {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What `process_message` hands back to every front end.
#[derive(Debug, Clone)]
pub struct Reply {
    pub responses: Vec<ChatLine>,
    /// Set when the caller should offer a parental hand-off.
    pub escalation: bool,
    pub outcome: Outcome,
}

impl Reply {
    pub fn single(sender: impl Into<String>, text: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            responses: vec![ChatLine::new(sender, text)],
            escalation: matches!(outcome, Outcome::Blocked(PolicyViolation::Escalation)),
            outcome,
        }
    }

    /// Text of the first response line.
    pub fn text(&self) -> &str {
        self.responses.first().map(|l| l.text.as_str()).unwrap_or_default()
    }
}
