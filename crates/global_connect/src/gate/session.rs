//! Passcode gate state machine.
//!
//! A session first demands an ordered tone pattern, then a typed code. Both
//! factors draw from one shared attempt budget; running it dry locks the
//! session for good.

use crate::config::GateSettings;
use rand::Rng;

/// The only code that opens the gate. Compared case-insensitively.
pub const PASSCODE: &str = "1337LEET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatePhase {
    AwaitingTonePattern,
    ToneVerified,
    AwaitingCode,
    Unlocked,
    Locked,
}

impl GatePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GatePhase::Unlocked | GatePhase::Locked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRules {
    pub max_attempts: u32,
    pub max_code_length: usize,
    pub tone_length: usize,
    pub tone_fields: usize,
}

impl Default for GateRules {
    fn default() -> Self {
        Self::from(&GateSettings::default())
    }
}

impl From<&GateSettings> for GateRules {
    fn from(settings: &GateSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            max_code_length: settings.max_code_length.max(1),
            tone_length: settings.tone_length.max(1),
            tone_fields: settings.tone_fields.max(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneOutcome {
    Ignored,
    Accepted { progress: usize },
    Verified,
    /// Wrong field: progress cleared and a fresh sequence generated.
    Mismatch { attempts_remaining: u32 },
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Unlocked,
    Rejected { attempts_remaining: u32 },
    Locked,
}

#[derive(Debug, Clone)]
pub struct PasscodeSession {
    rules: GateRules,
    phase: GatePhase,
    entered: String,
    attempts_remaining: u32,
    tone_sequence: Vec<usize>,
    entered_tones: Vec<usize>,
}

impl PasscodeSession {
    pub fn new(rules: GateRules, rng: &mut impl Rng) -> Self {
        let mut session = Self {
            rules,
            phase: GatePhase::AwaitingTonePattern,
            entered: String::with_capacity(rules.max_code_length),
            attempts_remaining: rules.max_attempts,
            tone_sequence: Vec::with_capacity(rules.tone_length),
            entered_tones: Vec::with_capacity(rules.tone_length),
        };
        session.regenerate_tones(rng);
        session
    }

    pub fn rules(&self) -> GateRules {
        self.rules
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn entered(&self) -> &str {
        &self.entered
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn tone_sequence(&self) -> &[usize] {
        &self.tone_sequence
    }

    pub fn tone_progress(&self) -> usize {
        self.entered_tones.len()
    }

    pub fn is_locked(&self) -> bool {
        self.phase == GatePhase::Locked
    }

    pub fn accepts_code_input(&self) -> bool {
        matches!(self.phase, GatePhase::ToneVerified | GatePhase::AwaitingCode)
    }

    /// Checks one tapped field against the expected tone at the current position.
    pub fn tap_tone(&mut self, field: usize, rng: &mut impl Rng) -> ToneOutcome {
        if self.phase != GatePhase::AwaitingTonePattern || field >= self.rules.tone_fields {
            return ToneOutcome::Ignored;
        }

        let position = self.entered_tones.len();
        if self.tone_sequence.get(position) != Some(&field) {
            self.entered_tones.clear();
            let attempts_remaining = self.spend_attempt();
            if self.is_locked() {
                return ToneOutcome::Locked;
            }
            self.regenerate_tones(rng);
            return ToneOutcome::Mismatch { attempts_remaining };
        }

        self.entered_tones.push(field);
        if self.entered_tones.len() == self.tone_sequence.len() {
            self.phase = GatePhase::ToneVerified;
            ToneOutcome::Verified
        } else {
            ToneOutcome::Accepted {
                progress: self.entered_tones.len(),
            }
        }
    }

    /// Drops partial tone progress without spending an attempt.
    pub fn restart_tone_entry(&mut self) {
        if self.phase == GatePhase::AwaitingTonePattern {
            self.entered_tones.clear();
        }
    }

    /// Appends a digit or letter. Returns whether the code changed.
    pub fn press_key(&mut self, key: char) -> bool {
        if !self.accepts_code_input()
            || !key.is_ascii_alphanumeric()
            || self.entered.len() >= self.rules.max_code_length
        {
            return false;
        }
        self.entered.push(key.to_ascii_uppercase());
        self.phase = GatePhase::AwaitingCode;
        true
    }

    pub fn erase_last(&mut self) -> bool {
        self.accepts_code_input() && self.entered.pop().is_some()
    }

    pub fn clear(&mut self) -> bool {
        if !self.accepts_code_input() || self.entered.is_empty() {
            return false;
        }
        self.entered.clear();
        true
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.accepts_code_input() || self.entered.is_empty() {
            return SubmitOutcome::Ignored;
        }

        if self.entered.eq_ignore_ascii_case(PASSCODE) {
            self.phase = GatePhase::Unlocked;
            return SubmitOutcome::Unlocked;
        }

        self.entered.clear();
        let attempts_remaining = self.spend_attempt();
        if self.is_locked() {
            SubmitOutcome::Locked
        } else {
            SubmitOutcome::Rejected { attempts_remaining }
        }
    }

    fn spend_attempt(&mut self) -> u32 {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            self.phase = GatePhase::Locked;
        }
        self.attempts_remaining
    }

    fn regenerate_tones(&mut self, rng: &mut impl Rng) {
        self.tone_sequence.clear();
        self.tone_sequence.extend(
            (0..self.rules.tone_length).map(|_| rng.gen_range(0..self.rules.tone_fields)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn session() -> (PasscodeSession, StdRng) {
        let mut rng = StdRng::seed_from_u64(7);
        (PasscodeSession::new(GateRules::default(), &mut rng), rng)
    }

    fn replay_tones(session: &mut PasscodeSession, rng: &mut StdRng) {
        let sequence = session.tone_sequence().to_vec();
        for field in sequence {
            session.tap_tone(field, rng);
        }
    }

    fn wrong_field(session: &PasscodeSession) -> usize {
        let expected = session.tone_sequence()[session.tone_progress()];
        (expected + 1) % session.rules().tone_fields
    }

    fn type_code(session: &mut PasscodeSession, code: &str) {
        for key in code.chars() {
            session.press_key(key);
        }
    }

    #[test]
    fn new_session_awaits_tones() {
        let (session, _) = session();
        assert_eq!(session.phase(), GatePhase::AwaitingTonePattern);
        assert_eq!(session.attempts_remaining(), 3);
        assert_eq!(session.tone_sequence().len(), 4);
        assert!(session.tone_sequence().iter().all(|&f| f < 6));
    }

    #[test]
    fn code_input_is_blocked_until_tones_verified() {
        let (mut session, _) = session();
        assert!(!session.press_key('1'));
        assert_eq!(session.submit(), SubmitOutcome::Ignored);
        assert_eq!(session.entered(), "");
    }

    #[test]
    fn correct_tones_then_code_unlocks() {
        let (mut session, mut rng) = session();
        replay_tones(&mut session, &mut rng);
        assert_eq!(session.phase(), GatePhase::ToneVerified);

        type_code(&mut session, "1337leet");
        assert_eq!(session.phase(), GatePhase::AwaitingCode);
        assert_eq!(session.entered(), "1337LEET");
        assert_eq!(session.submit(), SubmitOutcome::Unlocked);
        assert_eq!(session.phase(), GatePhase::Unlocked);
    }

    #[test]
    fn wrong_tap_resets_progress_and_costs_one_attempt() {
        let (mut session, mut rng) = session();
        let first = session.tone_sequence()[0];
        assert_eq!(
            session.tap_tone(first, &mut rng),
            ToneOutcome::Accepted { progress: 1 }
        );

        let wrong = wrong_field(&session);
        assert_eq!(
            session.tap_tone(wrong, &mut rng),
            ToneOutcome::Mismatch {
                attempts_remaining: 2
            }
        );
        assert_eq!(session.tone_progress(), 0);
        assert_eq!(session.attempts_remaining(), 2);
        assert_eq!(session.phase(), GatePhase::AwaitingTonePattern);
    }

    #[test]
    fn tone_failures_lock_without_going_negative() {
        let (mut session, mut rng) = session();
        for _ in 0..2 {
            let wrong = wrong_field(&session);
            session.tap_tone(wrong, &mut rng);
        }
        let wrong = wrong_field(&session);
        assert_eq!(session.tap_tone(wrong, &mut rng), ToneOutcome::Locked);
        assert_eq!(session.attempts_remaining(), 0);

        assert_eq!(session.tap_tone(0, &mut rng), ToneOutcome::Ignored);
        assert_eq!(session.attempts_remaining(), 0);
    }

    #[test]
    fn three_wrong_codes_lock_even_against_the_right_one() {
        let (mut session, mut rng) = session();
        replay_tones(&mut session, &mut rng);

        for expected in [
            SubmitOutcome::Rejected {
                attempts_remaining: 2,
            },
            SubmitOutcome::Rejected {
                attempts_remaining: 1,
            },
            SubmitOutcome::Locked,
        ] {
            type_code(&mut session, "0000");
            assert_eq!(session.submit(), expected);
            assert_eq!(session.entered(), "");
        }

        assert!(session.is_locked());
        assert!(!session.press_key('1'));
        type_code(&mut session, PASSCODE);
        assert_eq!(session.submit(), SubmitOutcome::Ignored);
        assert_eq!(session.phase(), GatePhase::Locked);
    }

    #[test]
    fn attempt_budget_is_shared_between_factors() {
        let (mut session, mut rng) = session();
        let wrong = wrong_field(&session);
        session.tap_tone(wrong, &mut rng);
        replay_tones(&mut session, &mut rng);

        type_code(&mut session, "AAAA");
        session.submit();
        type_code(&mut session, "BBBB");
        assert_eq!(session.submit(), SubmitOutcome::Locked);
    }

    #[test]
    fn restarting_tone_entry_is_free() {
        let (mut session, mut rng) = session();
        let first = session.tone_sequence()[0];
        session.tap_tone(first, &mut rng);
        session.restart_tone_entry();

        assert_eq!(session.tone_progress(), 0);
        assert_eq!(session.attempts_remaining(), 3);
    }

    #[test]
    fn code_length_and_alphabet_are_enforced() {
        let (mut session, mut rng) = session();
        replay_tones(&mut session, &mut rng);

        assert!(!session.press_key('#'));
        type_code(&mut session, "123456789");
        assert_eq!(session.entered(), "12345678");

        assert!(session.erase_last());
        assert_eq!(session.entered(), "1234567");
        assert!(session.clear());
        assert_eq!(session.entered(), "");
        assert!(!session.clear());
        assert_eq!(session.submit(), SubmitOutcome::Ignored);
        assert_eq!(session.attempts_remaining(), 3);
    }
}
