use std::sync::Arc;

use crate::cognition::generation;
use crate::config::SproutCfg;
use crate::engagement::reward::Rewarder;
use crate::engagement::tone;
use crate::moderation::{EscalationDetector, SafetyFilter, UsageMonitor};
use crate::routing::IntentClassifier;
use crate::session::Session;
use crate::types::{HistoryEntry, Outcome, PolicyViolation, Reply, SYSTEM_SENDER};
use sprout_llm::provider::LlmProvider;

pub const UNHEARD_MSG: &str = "Oops, I didn't hear you! What do you want to talk about?";
pub const NAPPING_MSG: &str = "My brain is taking a little nap right now. Can we try again in a bit?";
pub const GENERATION_FAILED_MSG: &str = "Oops, my thinking cap slipped! Can you ask me that again?";
pub const HANDOFF_MSG: &str = "Please ask a parent to assist you.";

/// Characters of the child's input quoted in "logged interaction" notices.
const LOG_EXCERPT_CHARS: usize = 50;

/// The per-message flow every front end goes through:
/// validation → safety → usage → escalation → classify → generate →
/// tone/reward → history.
///
/// Holds no session state; each call mutates only the session it is given.
pub struct Pipeline {
    cfg: Arc<SproutCfg>,
    llm: Option<Arc<dyn LlmProvider>>,
    safety: SafetyFilter,
    usage: UsageMonitor,
    escalation: EscalationDetector,
    classifier: IntentClassifier,
    rewarder: Rewarder,
}

impl Pipeline {
    pub fn new(cfg: Arc<SproutCfg>, llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            safety: SafetyFilter::from_cfg(&cfg),
            usage: UsageMonitor::new(Arc::clone(&cfg)),
            escalation: EscalationDetector::from_cfg(&cfg),
            classifier: IntentClassifier::from_cfg(&cfg),
            rewarder: Rewarder::new(cfg.reward_points),
            cfg,
            llm,
        }
    }

    /// Fresh session configured from this pipeline's settings.
    pub fn new_session(&self) -> Session {
        Session::new(&self.cfg)
    }

    /// Run one message through the pipeline. Never fails: every policy
    /// block or collaborator error becomes a reply.
    pub async fn process_message(&self, session: &mut Session, raw: &str) -> Reply {
        // Any new message withdraws an unanswered hand-off offer.
        session.pending_escalation = None;
        let input = raw.trim();
        if input.is_empty() {
            return Reply::single(SYSTEM_SENDER, UNHEARD_MSG, Outcome::Unheard);
        }

        let verdict = self.safety.check(input, &session.history);
        if !verdict.passed {
            tracing::warn!(session = %session.id(), "message blocked by safety filter");
            if let Err(e) = session.parental.notify(format!("Safety block for input: {input}")) {
                tracing::warn!(error = %e, "failed to forward safety notice");
            }
            return block(session, input, PolicyViolation::Safety, verdict.message);
        }

        let verdict = self.usage.check(session.profile.age, &mut session.counters, &mut session.parental);
        if !verdict.passed {
            tracing::warn!(session = %session.id(), "message blocked by usage monitor");
            return block(session, input, PolicyViolation::Overuse, verdict.message);
        }

        let verdict = self.escalation.check(input, &session.history, &mut session.parental);
        if !verdict.passed {
            tracing::warn!(session = %session.id(), "message escalated");
            session.pending_escalation = Some(input.to_string());
            return block(session, input, PolicyViolation::Escalation, verdict.message);
        }

        let mut reply = self.answer(session, input).await;
        // Escalation could not be reported; the child still gets an apology.
        if verdict.degraded
            && let Some(line) = reply.responses.first_mut()
        {
            line.text = format!("{}\n{}", line.text, verdict.message);
        }
        reply
    }

    async fn answer(&self, session: &mut Session, input: &str) -> Reply {
        let c = self.classifier.classify(input, &session.profile, &session.history);
        let age = session.profile.age;
        let young_max = self.cfg.young_tone_max_age;

        let Some(llm) = self.llm.as_deref() else {
            tracing::warn!(session = %session.id(), intent = %c.intent, "no generation backend configured");
            return Reply::single(SYSTEM_SENDER, NAPPING_MSG, Outcome::Napping);
        };

        let expected = tone::adjust_tone(&c.expected_output, age, young_max);
        let generated = match generation::generate(llm, c.persona, &c.context, &expected, &self.cfg).await {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(session = %session.id(), intent = %c.intent, error = %e, "generation failed");
                return Reply::single(SYSTEM_SENDER, GENERATION_FAILED_MSG, Outcome::GenerationFailed);
            }
        };

        let toned = tone::adjust_tone(&generated.text, age, young_max);
        let output = self.rewarder.reward(
            &toned,
            c.intent,
            &session.profile.name,
            &mut session.counters,
            &session.history,
        );

        session.history.append(HistoryEntry::new(input, c.intent, output.clone(), c.persona.id()));
        let excerpt: String = input.chars().take(LOG_EXCERPT_CHARS).collect();
        if let Err(e) = session
            .parental
            .notify(format!("Logged interaction: {excerpt}... (Intent: {})", c.intent))
        {
            tracing::warn!(error = %e, "failed to forward interaction notice");
        }

        tracing::info!(
            session = %session.id(),
            intent = %c.intent,
            persona = %c.persona,
            tokens = generated.metadata.as_ref().map(|m| m.output_tokens).unwrap_or(0),
            "exchange completed"
        );
        Reply::single(c.persona.id(), output, Outcome::Answered(c.intent))
    }

    /// The child accepted a parental hand-off after an escalation.
    pub fn confirm_parent_handoff(&self, session: &mut Session) -> String {
        session.pending_escalation = None;
        if let Err(e) = session.parental.notify("Child asked for a parent to join") {
            tracing::warn!(error = %e, "failed to forward hand-off notice");
        }
        HANDOFF_MSG.to_string()
    }

    /// The child declined a parental hand-off: answer the escalated message
    /// anyway. The gates already ran for it and it was already counted, so
    /// only classification, generation and post-processing run here.
    pub async fn continue_after_escalation(&self, session: &mut Session) -> Reply {
        let Some(input) = session.pending_escalation.take() else {
            return Reply::single(SYSTEM_SENDER, UNHEARD_MSG, Outcome::Unheard);
        };
        tracing::info!(session = %session.id(), "parental hand-off declined");
        self.answer(session, &input).await
    }
}

/// Record a blocked exchange under its policy label and build the reply.
fn block(session: &mut Session, input: &str, violation: PolicyViolation, message: String) -> Reply {
    let intent = violation.intent();
    session
        .history
        .append(HistoryEntry::new(input, intent, message.clone(), SYSTEM_SENDER));
    Reply::single(SYSTEM_SENDER, message, Outcome::Blocked(violation))
}
