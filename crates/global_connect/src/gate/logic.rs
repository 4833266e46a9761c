//! Gate session driver: applies gate commands, replays the tone challenge and
//! opens the globe once the session unlocks.

use super::session::{GatePhase, GateRules, PasscodeSession, SubmitOutcome, ToneOutcome};
use crate::AppScreen;
use crate::config::GateSettings;
use crate::utils::remove;
use app::LOG_GATE;
use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use settings::SettingsArc;
use std::collections::VecDeque;
use std::time::Duration;

pub struct GateLogicPlugin;

impl Plugin for GateLogicPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<GateCommand>()
            .add_message::<TonePlayed>()
            .init_resource::<GateRng>()
            .add_systems(OnEnter(AppScreen::Gate), start_session)
            .add_systems(
                Update,
                (advance_tone_playback, apply_gate_commands, tick_unlock_countdown)
                    .chain()
                    .run_if(in_state(AppScreen::Gate)),
            )
            .add_systems(
                OnExit(AppScreen::Gate),
                (
                    remove::<GateSession>,
                    remove::<TonePlayback>,
                    remove::<UnlockCountdown>,
                ),
            );
    }
}

/// Input to the gate, from the keypad, the tone fields or the keyboard.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCommand {
    ToneTap(usize),
    Key(char),
    EraseLast,
    Clear,
    Submit,
    ReplayTones,
}

/// A tone field sounded, either during playback or as tap feedback.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TonePlayed {
    pub field: usize,
}

#[derive(Resource, Deref, DerefMut)]
pub struct GateSession(pub PasscodeSession);

#[derive(Resource, Deref, DerefMut)]
pub struct GateRng(pub StdRng);

impl Default for GateRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Sequential replay of the tone challenge, one field per step.
#[derive(Resource, Debug)]
pub struct TonePlayback {
    pending: VecDeque<usize>,
    timer: Timer,
    started: bool,
    playing: bool,
}

impl TonePlayback {
    pub fn new(sequence: &[usize], step: Duration) -> Self {
        Self {
            pending: sequence.iter().copied().collect(),
            timer: Timer::new(step, TimerMode::Repeating),
            started: false,
            playing: true,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advances playback and yields the field to sound now, if any.
    ///
    /// The first field plays immediately; playback ends one step after the
    /// last field so the final tone is heard out before taps count again.
    pub fn advance(&mut self, delta: Duration) -> Option<usize> {
        if !self.playing {
            return None;
        }
        if !self.started {
            self.started = true;
            return self.next_field();
        }
        if self.timer.tick(delta).just_finished() {
            return self.next_field();
        }
        None
    }

    fn next_field(&mut self) -> Option<usize> {
        let next = self.pending.pop_front();
        if next.is_none() {
            self.playing = false;
        }
        next
    }
}

/// Celebration delay between unlocking and opening the globe.
#[derive(Resource)]
pub struct UnlockCountdown(pub Timer);

fn tone_step(settings: &GateSettings) -> Duration {
    Duration::from_secs_f32(settings.tone_step_secs.max(0.05))
}

fn start_session(
    mut commands: Commands,
    mut rng: ResMut<GateRng>,
    settings: Res<SettingsArc<GateSettings>>,
) {
    let session = PasscodeSession::new(GateRules::from(settings.0.as_ref()), &mut rng.0);
    info!(
        target: LOG_GATE,
        "Gate session started: {} tones over {} fields, {} attempts",
        session.rules().tone_length,
        session.rules().tone_fields,
        session.attempts_remaining()
    );

    commands.insert_resource(TonePlayback::new(
        session.tone_sequence(),
        tone_step(&settings),
    ));
    commands.insert_resource(GateSession(session));
}

fn advance_tone_playback(
    time: Res<Time>,
    mut playback: ResMut<TonePlayback>,
    mut played: MessageWriter<TonePlayed>,
) {
    if let Some(field) = playback.advance(time.delta()) {
        played.write(TonePlayed { field });
    }
}

fn apply_gate_commands(
    mut commands: Commands,
    mut reader: MessageReader<GateCommand>,
    mut session: ResMut<GateSession>,
    mut rng: ResMut<GateRng>,
    mut playback: ResMut<TonePlayback>,
    mut played: MessageWriter<TonePlayed>,
    settings: Res<SettingsArc<GateSettings>>,
) {
    for command in reader.read() {
        if session.is_locked() {
            continue;
        }

        match *command {
            GateCommand::ToneTap(field) => {
                if playback.is_playing() {
                    debug!(target: LOG_GATE, "Tone tap {field} ignored during playback");
                    continue;
                }
                let outcome = session.tap_tone(field, &mut rng.0);
                if outcome != ToneOutcome::Ignored {
                    played.write(TonePlayed { field });
                }
                match outcome {
                    ToneOutcome::Accepted { progress } => {
                        debug!(target: LOG_GATE, "Tone {progress} accepted");
                    }
                    ToneOutcome::Verified => {
                        info!(target: LOG_GATE, "Tone pattern verified, code entry open");
                    }
                    ToneOutcome::Mismatch { attempts_remaining } => {
                        warn!(
                            target: LOG_GATE,
                            "Tone mismatch, {attempts_remaining} attempts left, new pattern"
                        );
                        *playback =
                            TonePlayback::new(session.tone_sequence(), tone_step(&settings));
                    }
                    ToneOutcome::Locked => {
                        warn!(target: LOG_GATE, "Tone pattern failed too often, gate locked");
                    }
                    ToneOutcome::Ignored => {}
                }
            }
            GateCommand::Key(key) => {
                session.press_key(key);
            }
            GateCommand::EraseLast => {
                session.erase_last();
            }
            GateCommand::Clear => {
                session.clear();
            }
            GateCommand::Submit => match session.submit() {
                SubmitOutcome::Unlocked => {
                    info!(target: LOG_GATE, "Access granted");
                    commands.insert_resource(UnlockCountdown(Timer::from_seconds(
                        settings.unlock_delay_secs.max(0.0),
                        TimerMode::Once,
                    )));
                }
                SubmitOutcome::Rejected { attempts_remaining } => {
                    warn!(
                        target: LOG_GATE,
                        "Wrong passcode, {attempts_remaining} attempts left"
                    );
                }
                SubmitOutcome::Locked => {
                    warn!(target: LOG_GATE, "Wrong passcode, gate locked");
                }
                SubmitOutcome::Ignored => {}
            },
            GateCommand::ReplayTones => {
                if session.phase() == GatePhase::AwaitingTonePattern && !playback.is_playing() {
                    session.restart_tone_entry();
                    *playback = TonePlayback::new(session.tone_sequence(), tone_step(&settings));
                }
            }
        }
    }
}

fn tick_unlock_countdown(
    time: Res<Time>,
    countdown: Option<ResMut<UnlockCountdown>>,
    mut next_screen: ResMut<NextState<AppScreen>>,
) {
    let Some(mut countdown) = countdown else {
        return;
    };
    if countdown.0.tick(time.delta()).just_finished() {
        info!(target: LOG_GATE, "Opening globe");
        next_screen.set(AppScreen::Globe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_sounds_each_field_then_stops() {
        let step = Duration::from_millis(100);
        let mut playback = TonePlayback::new(&[3, 1], step);

        assert_eq!(playback.advance(Duration::ZERO), Some(3));
        assert_eq!(playback.advance(Duration::from_millis(50)), None);
        assert_eq!(playback.advance(Duration::from_millis(50)), Some(1));
        assert!(playback.is_playing());
        assert_eq!(playback.advance(step), None);
        assert!(!playback.is_playing());
        assert_eq!(playback.advance(step), None);
    }
}
