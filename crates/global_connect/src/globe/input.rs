//! Keyboard shortcuts on the globe screen.

use super::{chat, hud, mode};
use crate::{AppScreen, utils::cleanup};
use app::LOG_GLOBE;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

pub(super) struct GlobeInputPlugin;

impl Plugin for GlobeInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_input_context::<GlobeContext>()
            .add_systems(OnEnter(AppScreen::Globe), setup_input)
            .add_systems(OnExit(AppScreen::Globe), cleanup::<GlobeContext>)
            .add_observer(handle_toggle_mode)
            .add_observer(handle_toggle_directory)
            .add_observer(handle_toggle_chat)
            .add_observer(handle_back);
    }
}

#[derive(Component, Default)]
pub(super) struct GlobeContext;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct ToggleAlternateMode;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct ToggleDirectory;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct ToggleChat;

#[derive(Debug, InputAction)]
#[action_output(bool)]
struct BackToGate;

fn setup_input(mut commands: Commands) {
    commands.spawn((
        Name::new("Globe Input Context"),
        GlobeContext,
        actions!(
            GlobeContext[
                (Action::<ToggleAlternateMode>::new(), bindings![KeyCode::F2]),
                (Action::<ToggleDirectory>::new(), bindings![KeyCode::F3]),
                (Action::<ToggleChat>::new(), bindings![KeyCode::F1]),
                (Action::<BackToGate>::new(), bindings![KeyCode::Escape]),
            ]
        ),
    ));

    debug!(target: LOG_GLOBE, "Globe input initialized");
}

fn handle_toggle_mode(
    _trigger: On<Start<ToggleAlternateMode>>,
    mut toggle: MessageWriter<mode::ToggleAlternateMode>,
) {
    toggle.write(mode::ToggleAlternateMode);
}

fn handle_toggle_directory(
    _trigger: On<Start<ToggleDirectory>>,
    mut toggle: MessageWriter<hud::ToggleDirectory>,
) {
    toggle.write(hud::ToggleDirectory);
}

fn handle_toggle_chat(
    _trigger: On<Start<ToggleChat>>,
    mut toggle: MessageWriter<chat::ToggleChat>,
) {
    toggle.write(chat::ToggleChat);
}

fn handle_back(_trigger: On<Start<BackToGate>>, mut back: MessageWriter<hud::BackToGate>) {
    back.write(hud::BackToGate);
}
