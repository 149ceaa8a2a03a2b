//! Render-cycle sequencing.
//!
//! Every settle event starts a new cycle. Fetches are never cancelled, so a
//! result can arrive after a newer cycle has already begun. [`StalePolicy`]
//! decides what happens to such a result.

use foundation::CycleId;

/// What to do with a fetch result whose cycle has been superseded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Drop results from any cycle older than the newest started one.
    #[default]
    DiscardSuperseded,
    /// Apply every result as it resolves; the last one to resolve stays visible.
    LastResolvedWins,
}

impl StalePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            StalePolicy::DiscardSuperseded => "discard",
            StalePolicy::LastResolvedWins => "last-resolved",
        }
    }
}

impl std::str::FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" | "discard-superseded" => Ok(StalePolicy::DiscardSuperseded),
            "last-resolved" | "last-resolved-wins" => Ok(StalePolicy::LastResolvedWins),
            other => Err(format!("unknown stale policy: {other}")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    Apply,
    Discard { newest: CycleId },
}

/// Hands out cycle ids and judges late results against the policy.
#[derive(Debug, Default)]
pub struct CycleTracker {
    policy: StalePolicy,
    last_started: Option<CycleId>,
    in_flight: usize,
}

impl CycleTracker {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            last_started: None,
            in_flight: 0,
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Newest cycle started so far.
    pub fn current(&self) -> Option<CycleId> {
        self.last_started
    }

    /// Number of cycles started but not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn start(&mut self) -> CycleId {
        let id = match self.last_started {
            Some(prev) => prev.next(),
            None => CycleId(1),
        };
        self.last_started = Some(id);
        self.in_flight += 1;
        id
    }

    /// Marks `cycle` resolved and reports whether its result may be applied.
    pub fn resolve(&mut self, cycle: CycleId) -> Admission {
        self.in_flight = self.in_flight.saturating_sub(1);
        let newest = self.last_started.unwrap_or(cycle);
        match self.policy {
            StalePolicy::LastResolvedWins => Admission::Apply,
            StalePolicy::DiscardSuperseded if cycle < newest => Admission::Discard { newest },
            StalePolicy::DiscardSuperseded => Admission::Apply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Admission, CycleTracker, StalePolicy};
    use foundation::CycleId;

    #[test]
    fn ids_increase_from_one() {
        let mut t = CycleTracker::new(StalePolicy::default());
        assert_eq!(t.current(), None);
        assert_eq!(t.start(), CycleId(1));
        assert_eq!(t.start(), CycleId(2));
        assert_eq!(t.current(), Some(CycleId(2)));
        assert_eq!(t.in_flight(), 2);
    }

    #[test]
    fn discard_policy_drops_superseded_results() {
        let mut t = CycleTracker::new(StalePolicy::DiscardSuperseded);
        let a = t.start();
        let b = t.start();
        assert_eq!(t.resolve(b), Admission::Apply);
        assert_eq!(t.resolve(a), Admission::Discard { newest: b });
        assert_eq!(t.in_flight(), 0);
    }

    #[test]
    fn last_resolved_policy_applies_everything() {
        let mut t = CycleTracker::new(StalePolicy::LastResolvedWins);
        let a = t.start();
        let b = t.start();
        assert_eq!(t.resolve(b), Admission::Apply);
        assert_eq!(t.resolve(a), Admission::Apply);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "discard".parse::<StalePolicy>(),
            Ok(StalePolicy::DiscardSuperseded)
        );
        assert_eq!(
            " Last-Resolved ".parse::<StalePolicy>(),
            Ok(StalePolicy::LastResolvedWins)
        );
        assert!("newest".parse::<StalePolicy>().is_err());
        assert_eq!(StalePolicy::LastResolvedWins.as_str(), "last-resolved");
    }
}
