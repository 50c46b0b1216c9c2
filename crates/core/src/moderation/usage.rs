use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SproutCfg;
use crate::io::parental::ParentalLog;
use crate::types::{SessionCounters, Verdict};

pub const OVERUSE_MSG: &str =
    "You've been chatting a lot! Let's take a break or ask a parent to join.";
pub const WITHIN_LIMITS_MSG: &str = "Usage within limits.";

/// Screen-time limiter. Ceilings depend only on the child's age.
#[derive(Debug, Clone)]
pub struct UsageMonitor {
    cfg: Arc<SproutCfg>,
}

impl UsageMonitor {
    pub fn new(cfg: Arc<SproutCfg>) -> Self {
        Self { cfg }
    }

    pub fn check(&self, age: u8, counters: &mut SessionCounters, parental: &mut ParentalLog) -> Verdict {
        self.check_at(age, counters, Instant::now(), parental)
    }

    /// Counts this call first, then compares against the ceilings, so the
    /// call that trips the limit is itself counted.
    pub fn check_at(
        &self,
        age: u8,
        counters: &mut SessionCounters,
        now: Instant,
        parental: &mut ParentalLog,
    ) -> Verdict {
        counters.interaction_count += 1;
        let elapsed = now.saturating_duration_since(counters.session_start);
        let max_count = self.cfg.max_interactions(age);
        let max_elapsed = Duration::from_secs(self.cfg.max_session_secs(age));

        if counters.interaction_count > max_count || elapsed > max_elapsed {
            tracing::warn!(
                count = counters.interaction_count,
                elapsed_secs = elapsed.as_secs(),
                age,
                "usage limit exceeded"
            );
            if let Err(e) = parental.notify(format!(
                "Child exceeded usage limits: {} interactions, {} seconds",
                counters.interaction_count,
                elapsed.as_secs()
            )) {
                tracing::warn!(error = %e, "failed to forward overuse notice");
            }
            return Verdict::fail(OVERUSE_MSG);
        }
        Verdict::pass(WITHIN_LIMITS_MSG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> UsageMonitor {
        UsageMonitor::new(Arc::new(SproutCfg::default()))
    }

    /// Index (1-based) of the first failing call, if any within `calls`.
    fn first_failure(age: u8, calls: u32) -> Option<u32> {
        let m = monitor();
        let mut counters = SessionCounters::new();
        let mut log = ParentalLog::new();
        (1..=calls).find(|_| !m.check(age, &mut counters, &mut log).passed)
    }

    #[test]
    fn younger_child_fails_on_eleventh_call() {
        assert_eq!(first_failure(7, 20), Some(11));
    }

    #[test]
    fn older_child_fails_on_sixteenth_call() {
        assert_eq!(first_failure(9, 20), Some(16));
        assert_eq!(first_failure(8, 20), Some(16));
    }

    #[test]
    fn failing_call_is_counted_and_logged() {
        let m = monitor();
        let mut counters = SessionCounters::new();
        let mut log = ParentalLog::new();
        for _ in 0..11 {
            m.check(7, &mut counters, &mut log);
        }
        assert_eq!(counters.interaction_count, 11);
        assert_eq!(log.len(), 1);
        assert!(log.records()[0].message.contains("11 interactions"));
    }

    #[test]
    fn session_time_limit_depends_on_age() {
        let m = monitor();
        let start = Instant::now();
        let later = start + Duration::from_secs(1801);
        let mut log = ParentalLog::new();

        let mut young = SessionCounters::started_at(start);
        let v = m.check_at(6, &mut young, later, &mut log);
        assert!(!v.passed);
        assert_eq!(v.message, OVERUSE_MSG);

        let mut older = SessionCounters::started_at(start);
        assert!(m.check_at(10, &mut older, later, &mut log).passed);
        let much_later = start + Duration::from_secs(3601);
        assert!(!m.check_at(10, &mut older, much_later, &mut log).passed);
    }

    #[test]
    fn ceilings_follow_configured_age_cutoff() {
        let cfg = SproutCfg {
            older_child_age: 10,
            max_interactions_younger: 2,
            max_interactions_older: 4,
            ..SproutCfg::default()
        };
        let m = UsageMonitor::new(Arc::new(cfg));
        let mut log = ParentalLog::new();
        let failing_call = |age: u8, log: &mut ParentalLog| {
            let mut counters = SessionCounters::new();
            (1..=10).find(|_| !m.check(age, &mut counters, log).passed)
        };
        assert_eq!(failing_call(9, &mut log), Some(3));
        assert_eq!(failing_call(10, &mut log), Some(5));
    }

    #[test]
    fn within_limits_message() {
        let m = monitor();
        let mut counters = SessionCounters::new();
        let mut log = ParentalLog::new();
        let v = m.check(9, &mut counters, &mut log);
        assert!(v.passed);
        assert_eq!(v.message, WITHIN_LIMITS_MSG);
        assert!(log.is_empty());
    }
}
