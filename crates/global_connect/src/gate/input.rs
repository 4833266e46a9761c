//! Keyboard shortcuts and typed characters on the gate screen.

use super::logic::{GateCommand, GateSession};
use super::session::GatePhase;
use super::ui::KeypadLayer;
use crate::{AppScreen, utils::cleanup};
use app::LOG_GATE;
use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

pub(super) struct GateInputPlugin;

impl Plugin for GateInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_input_context::<GateContext>()
            .add_systems(OnEnter(AppScreen::Gate), setup_input)
            .add_systems(Update, capture_typed_keys.run_if(in_state(AppScreen::Gate)))
            .add_systems(OnExit(AppScreen::Gate), cleanup::<GateContext>)
            .add_observer(handle_submit)
            .add_observer(handle_erase_last)
            .add_observer(handle_clear)
            .add_observer(handle_switch_layer)
            .add_observer(handle_replay_tones);
    }
}

#[derive(Component, Default)]
pub(super) struct GateContext;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct SubmitCode;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct EraseLast;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct ClearCode;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct SwitchKeypadLayer;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct ReplayTones;

fn setup_input(mut commands: Commands) {
    commands.spawn((
        Name::new("Gate Input Context"),
        GateContext,
        actions!(
            GateContext[
                (
                    Action::<SubmitCode>::new(),
                    bindings![KeyCode::Enter, KeyCode::NumpadEnter],
                ),
                (Action::<EraseLast>::new(), bindings![KeyCode::Backspace]),
                (Action::<ClearCode>::new(), bindings![KeyCode::Delete]),
                (Action::<SwitchKeypadLayer>::new(), bindings![KeyCode::Tab]),
                (Action::<ReplayTones>::new(), bindings![KeyCode::F5]),
            ]
        ),
    ));

    debug!(target: LOG_GATE, "Gate input initialized");
}

fn handle_submit(_trigger: On<Start<SubmitCode>>, mut gate: MessageWriter<GateCommand>) {
    gate.write(GateCommand::Submit);
}

fn handle_erase_last(_trigger: On<Start<EraseLast>>, mut gate: MessageWriter<GateCommand>) {
    gate.write(GateCommand::EraseLast);
}

fn handle_clear(_trigger: On<Start<ClearCode>>, mut gate: MessageWriter<GateCommand>) {
    gate.write(GateCommand::Clear);
}

fn handle_switch_layer(_trigger: On<Start<SwitchKeypadLayer>>, mut layer: ResMut<KeypadLayer>) {
    layer.toggle();
}

fn handle_replay_tones(_trigger: On<Start<ReplayTones>>, mut gate: MessageWriter<GateCommand>) {
    gate.write(GateCommand::ReplayTones);
}

/// Maps a typed character to a gate command for the current phase.
///
/// While the tone pattern is awaited, `1`..=`fields` tap the matching tone
/// field; afterwards characters go to the code.
pub(super) fn command_for_char(
    phase: GatePhase,
    tone_fields: usize,
    ch: char,
) -> Option<GateCommand> {
    match phase {
        GatePhase::AwaitingTonePattern => ch
            .to_digit(10)
            .map(|digit| digit as usize)
            .filter(|&digit| (1..=tone_fields).contains(&digit))
            .map(|digit| GateCommand::ToneTap(digit - 1)),
        GatePhase::ToneVerified | GatePhase::AwaitingCode => {
            ch.is_ascii_alphanumeric().then_some(GateCommand::Key(ch))
        }
        GatePhase::Unlocked | GatePhase::Locked => None,
    }
}

fn capture_typed_keys(
    mut keys: MessageReader<KeyboardInput>,
    session: Option<Res<GateSession>>,
    mut gate: MessageWriter<GateCommand>,
) {
    let Some(session) = session else {
        keys.clear();
        return;
    };

    for event in keys.read() {
        if !event.state.is_pressed() {
            continue;
        }
        let Key::Character(text) = &event.logical_key else {
            continue;
        };
        for ch in text.chars() {
            let tone_fields = session.rules().tone_fields;
            if let Some(command) = command_for_char(session.phase(), tone_fields, ch) {
                gate.write(command);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_tap_tones_until_the_pattern_is_verified() {
        let phase = GatePhase::AwaitingTonePattern;
        assert_eq!(command_for_char(phase, 6, '1'), Some(GateCommand::ToneTap(0)));
        assert_eq!(command_for_char(phase, 6, '6'), Some(GateCommand::ToneTap(5)));
        assert_eq!(command_for_char(phase, 6, '7'), None);
        assert_eq!(command_for_char(phase, 6, '0'), None);
        assert_eq!(command_for_char(phase, 6, 'a'), None);
    }

    #[test]
    fn characters_feed_the_code_after_verification() {
        for phase in [GatePhase::ToneVerified, GatePhase::AwaitingCode] {
            assert_eq!(command_for_char(phase, 6, '7'), Some(GateCommand::Key('7')));
            assert_eq!(command_for_char(phase, 6, 'e'), Some(GateCommand::Key('e')));
            assert_eq!(command_for_char(phase, 6, ' '), None);
        }
        assert_eq!(command_for_char(GatePhase::Locked, 6, '1'), None);
    }
}
