//! Generation/regeneration session driven by validation results.
//!
//! The generator itself lives outside this crate. A session only consumes the
//! validation of each candidate it is handed and answers with the next step:
//! accept, retry with a correction directive, or give up with the best
//! candidate seen.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{IconGuardError, IconGuardResult};
use crate::models::{CorrectionDirective, ValidationResult};
use crate::validate::correction::synthesize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Generated,
    Validated,
    CorrectionIssued,
    Regenerated,
    Accepted,
    Exhausted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted)
    }
}

/// Bound on generation passes, counting the first one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub attempt: u32,
    pub document: String,
    pub result: ValidationResult,
}

impl Candidate {
    /// Valid candidates rank above invalid ones, then by score; ties keep `self`.
    fn outranks(&self, other: &Candidate) -> bool {
        match (self.result.is_valid, other.result.is_valid) {
            (true, false) => true,
            (false, true) => false,
            _ => self.result.score > other.result.score,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionStep {
    Accept(Candidate),
    Retry(CorrectionDirective),
    GiveUp(Candidate),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationSession {
    policy: RetryPolicy,
    state: SessionState,
    attempt: u32,
    best: Option<Candidate>,
    history: Vec<SessionState>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl GenerationSession {
    /// A session whose first candidate has been generated and awaits validation.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: RetryPolicy {
                max_attempts: policy.max_attempts.max(1),
            },
            state: SessionState::Generated,
            attempt: 1,
            best: None,
            history: vec![SessionState::Generated],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    fn enter(&mut self, state: SessionState) {
        self.state = state;
        self.history.push(state);
    }

    /// Feed the validation of the current candidate and get the next step.
    pub fn submit(
        &mut self,
        document: impl Into<String>,
        result: ValidationResult,
    ) -> IconGuardResult<SessionStep> {
        if self.state.is_terminal() {
            return Err(IconGuardError::Session(format!(
                "session already {:?}; no further candidates accepted",
                self.state
            )));
        }
        if self.state == SessionState::CorrectionIssued {
            self.enter(SessionState::Regenerated);
        }
        self.enter(SessionState::Validated);

        let candidate = Candidate {
            attempt: self.attempt,
            document: document.into(),
            result,
        };
        let directive = synthesize(&candidate.result, self.attempt);
        let replace_best = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.outranks(best));
        if replace_best {
            self.best = Some(candidate.clone());
        }

        match directive {
            None => {
                self.enter(SessionState::Accepted);
                info!(
                    "Candidate accepted on attempt {} with score {:.1}",
                    candidate.attempt, candidate.result.score
                );
                Ok(SessionStep::Accept(candidate))
            }
            Some(directive) if self.attempt < self.policy.max_attempts => {
                self.enter(SessionState::CorrectionIssued);
                debug!(
                    "Attempt {} failed with {} issues; requesting regeneration",
                    self.attempt,
                    directive.entries.len()
                );
                self.attempt += 1;
                Ok(SessionStep::Retry(directive))
            }
            Some(_) => {
                self.enter(SessionState::Exhausted);
                let best = self.best.clone().unwrap_or(candidate);
                info!(
                    "Attempts exhausted after {}; returning best candidate from attempt {} (score {:.1})",
                    self.attempt, best.attempt, best.result.score
                );
                Ok(SessionStep::GiveUp(best))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::document::parse_viewbox;
    use crate::extract::extract;
    use crate::profile::RuleProfile;
    use crate::validate::geometry::validate_geometry_with;

    const VALID_RECT: &str = r##"<svg viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16" rx="2" stroke="#000000" stroke-width="2"/></svg>"##;

    fn validate(doc: &str) -> ValidationResult {
        validate_geometry_with(&extract(doc), parse_viewbox(doc).as_ref(), &RuleProfile::default())
    }

    fn with_width(width: &str) -> String {
        VALID_RECT.replace(r#"stroke-width="2""#, &format!(r#"stroke-width="{width}""#))
    }

    #[test]
    fn test_accept_on_first_pass() {
        let mut session = GenerationSession::default();
        let step = session.submit(VALID_RECT, validate(VALID_RECT)).unwrap();
        assert!(matches!(step, SessionStep::Accept(ref c) if c.attempt == 1));
        assert_eq!(
            session.history(),
            &[SessionState::Generated, SessionState::Validated, SessionState::Accepted]
        );
    }

    #[test]
    fn test_retry_then_accept() {
        let mut session = GenerationSession::default();
        let bad = with_width("3");
        let step = session.submit(bad.clone(), validate(&bad)).unwrap();
        let SessionStep::Retry(directive) = step else {
            panic!("expected a retry step");
        };
        assert_eq!(directive.attempt, 1);
        assert_eq!(directive.entries[0].rule_id, "stroke.width");
        assert_eq!(session.state(), SessionState::CorrectionIssued);
        assert_eq!(session.attempt(), 2);

        let step = session.submit(VALID_RECT, validate(VALID_RECT)).unwrap();
        assert!(matches!(step, SessionStep::Accept(ref c) if c.attempt == 2));
        assert_eq!(
            session.history(),
            &[
                SessionState::Generated,
                SessionState::Validated,
                SessionState::CorrectionIssued,
                SessionState::Regenerated,
                SessionState::Validated,
                SessionState::Accepted,
            ]
        );
    }

    #[test]
    fn test_exhausted_returns_best_candidate() {
        let mut session = GenerationSession::default();
        // two critical issues, then one
        let worse = with_width("3").replace(r#"x="4""#, r#"x="4.5""#);
        let better = with_width("3");
        let first = validate(&worse);
        let second = validate(&better);
        assert!(second.score > first.score);

        assert!(matches!(
            session.submit(worse, first).unwrap(),
            SessionStep::Retry(_)
        ));
        let step = session.submit(better.clone(), second).unwrap();
        let SessionStep::GiveUp(best) = step else {
            panic!("expected a give-up step");
        };
        assert_eq!(best.attempt, 2);
        assert_eq!(best.document, better);
        assert_eq!(session.state(), SessionState::Exhausted);
    }

    #[test]
    fn test_submit_after_terminal_state_is_error() {
        let mut session = GenerationSession::default();
        session.submit(VALID_RECT, validate(VALID_RECT)).unwrap();
        let err = session.submit(VALID_RECT, validate(VALID_RECT)).unwrap_err();
        assert!(matches!(err, IconGuardError::Session(_)));
    }

    #[test]
    fn test_single_attempt_policy_gives_up_immediately() {
        let mut session = GenerationSession::new(RetryPolicy { max_attempts: 0 });
        let bad = with_width("3");
        let step = session.submit(bad.clone(), validate(&bad)).unwrap();
        assert!(matches!(step, SessionStep::GiveUp(ref c) if c.document == bad));
    }
}
