//! Gate screen layout: tone fields, code readout and the two-layer keypad.

use super::logic::{GateCommand, GateSession, TonePlayback, TonePlayed};
use super::session::GatePhase;
use crate::ui::{ACCENT, TEXT, WARNING, label, themed_button};
use crate::{AppScreen, utils::cleanup};
use app::LOG_AUDIO;
use bevy::audio::{Pitch, Volume};
use bevy::prelude::*;
use std::time::Duration;

pub(super) struct GateUiPlugin;

impl Plugin for GateUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<KeypadLayer>()
            .add_systems(OnEnter(AppScreen::Gate), (reset_keypad_layer, spawn_ui).chain())
            .add_systems(
                Update,
                (
                    handle_gate_buttons,
                    rebuild_keypad.run_if(resource_changed::<KeypadLayer>),
                    sound_played_tones,
                    fade_tone_glow,
                    refresh_readout,
                )
                    .chain()
                    .run_if(in_state(AppScreen::Gate)),
            )
            .add_systems(OnExit(AppScreen::Gate), cleanup::<GateUi>);
    }
}

/// C major pentatonic, one note per tone field.
const TONE_FREQUENCIES: [f32; 6] = [261.63, 293.66, 329.63, 392.0, 440.0, 523.25];
const TONE_LENGTH: Duration = Duration::from_millis(320);

const TONE_COLORS: [Color; 6] = [
    Color::srgb(0.13, 0.83, 0.93),
    Color::srgb(0.23, 0.51, 0.96),
    Color::srgb(0.55, 0.36, 0.96),
    Color::srgb(0.93, 0.28, 0.6),
    Color::srgb(0.98, 0.75, 0.14),
    Color::srgb(0.2, 0.83, 0.6),
];

const DENIED: Color = Color::srgb(0.97, 0.44, 0.44);

/// Which keypad alphabet is showing.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum KeypadLayer {
    #[default]
    Digits,
    Letters,
}

impl KeypadLayer {
    pub(super) fn toggle(&mut self) {
        *self = match self {
            KeypadLayer::Digits => KeypadLayer::Letters,
            KeypadLayer::Letters => KeypadLayer::Digits,
        };
    }

    fn keys(self) -> Vec<char> {
        match self {
            KeypadLayer::Digits => "123456789".chars().collect(),
            KeypadLayer::Letters => ('A'..='Z').collect(),
        }
    }

    fn columns(self) -> usize {
        match self {
            KeypadLayer::Digits => 3,
            KeypadLayer::Letters => 6,
        }
    }

    fn key_size(self) -> f32 {
        match self {
            KeypadLayer::Digits => 56.0,
            KeypadLayer::Letters => 40.0,
        }
    }
}

/// Frequency of a tone field; fields past the scale repeat it an octave up.
pub(super) fn tone_frequency(field: usize) -> f32 {
    let octave = (field / TONE_FREQUENCIES.len()) as i32;
    TONE_FREQUENCIES[field % TONE_FREQUENCIES.len()] * 2f32.powi(octave)
}

fn tone_color(field: usize) -> Color {
    TONE_COLORS[field % TONE_COLORS.len()]
}

#[derive(Component)]
pub(super) struct GateUi;

#[derive(Component)]
struct KeypadGrid;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum GateButton {
    Key(char),
    Clear,
    EraseLast,
    Submit,
    Layer(KeypadLayer),
    Tone(usize),
}

#[derive(Component)]
struct ToneField {
    field: usize,
    glow: f32,
}

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum Readout {
    Status,
    Code,
    Attempts,
    Banner,
}

fn reset_keypad_layer(mut layer: ResMut<KeypadLayer>) {
    *layer = KeypadLayer::Digits;
}

fn spawn_ui(mut commands: Commands, session: Res<GateSession>, layer: Res<KeypadLayer>) {
    let tone_fields = session.rules().tone_fields;
    let layer = *layer;

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                ..default()
            },
            GateUi,
            Name::new("Gate UI Root"),
        ))
        .with_children(|root| {
            root.spawn((
                Node {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    row_gap: Val::Px(14.0),
                    padding: UiRect::all(Val::Px(24.0)),
                    border: UiRect::all(Val::Px(1.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.4)),
                BorderColor::all(ACCENT.with_alpha(0.5)),
                BorderRadius::all(Val::Px(8.0)),
            ))
            .with_children(|panel| {
                panel.spawn((label("Enter Code", 16.0, ACCENT), Readout::Status));

                panel
                    .spawn(Node {
                        column_gap: Val::Px(8.0),
                        ..default()
                    })
                    .with_children(|row| {
                        for field in 0..tone_fields {
                            row.spawn((
                                Button,
                                Node {
                                    width: Val::Px(40.0),
                                    height: Val::Px(40.0),
                                    border: UiRect::all(Val::Px(2.0)),
                                    ..default()
                                },
                                BorderColor::all(tone_color(field)),
                                BorderRadius::MAX,
                                BackgroundColor(tone_color(field).with_alpha(0.2)),
                                GateButton::Tone(field),
                                ToneField { field, glow: 0.0 },
                            ));
                        }
                    });

                panel
                    .spawn((
                        Node {
                            min_width: Val::Px(220.0),
                            padding: UiRect::axes(Val::Px(24.0), Val::Px(12.0)),
                            justify_content: JustifyContent::Center,
                            border: UiRect::all(Val::Px(1.0)),
                            ..default()
                        },
                        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                        BorderColor::all(ACCENT.with_alpha(0.6)),
                    ))
                    .with_children(|display| {
                        display.spawn((label("________", 28.0, TEXT), Readout::Code));
                    });

                panel
                    .spawn(Node {
                        column_gap: Val::Px(16.0),
                        ..default()
                    })
                    .with_children(|row| {
                        for (text, target) in
                            [("1-9", KeypadLayer::Digits), ("A-Z", KeypadLayer::Letters)]
                        {
                            row.spawn((
                                themed_button(Val::Px(64.0), Val::Px(32.0)),
                                GateButton::Layer(target),
                            ))
                            .with_children(|button| {
                                button.spawn(label(text, 14.0, TEXT));
                            });
                        }
                    });

                panel
                    .spawn((keypad_node(layer), KeypadGrid))
                    .with_children(|grid| spawn_keys(grid, layer));

                panel
                    .spawn((themed_button(Val::Percent(100.0), Val::Px(44.0)), GateButton::Submit))
                    .with_children(|button| {
                        button.spawn(label("ENTER", 18.0, TEXT));
                    });

                panel.spawn((label("", 12.0, ACCENT.with_alpha(0.6)), Readout::Attempts));
                panel.spawn((label("", 22.0, ACCENT), Readout::Banner));
            });
        });
}

fn keypad_node(layer: KeypadLayer) -> Node {
    let gap = 8.0;
    let columns = layer.columns() as f32;
    Node {
        width: Val::Px(columns * layer.key_size() + (columns - 1.0) * gap),
        flex_wrap: FlexWrap::Wrap,
        column_gap: Val::Px(gap),
        row_gap: Val::Px(gap),
        ..default()
    }
}

fn spawn_keys(grid: &mut ChildSpawnerCommands, layer: KeypadLayer) {
    for ch in layer.keys() {
        spawn_key(grid, layer, ch.to_string(), GateButton::Key(ch), TEXT);
    }
    spawn_key(grid, layer, "CLR".into(), GateButton::Clear, DENIED);
    if layer == KeypadLayer::Digits {
        spawn_key(grid, layer, "0".into(), GateButton::Key('0'), TEXT);
    }
    spawn_key(grid, layer, "←".into(), GateButton::EraseLast, WARNING);
}

fn spawn_key(
    grid: &mut ChildSpawnerCommands,
    layer: KeypadLayer,
    text: String,
    action: GateButton,
    color: Color,
) {
    let size = Val::Px(layer.key_size());
    let font = match layer {
        KeypadLayer::Digits => 22.0,
        KeypadLayer::Letters => 15.0,
    };
    grid.spawn((themed_button(size, size), action))
        .with_children(|button| {
            button.spawn(label(text, font, color));
        });
}

fn handle_gate_buttons(
    buttons: Query<(&Interaction, &GateButton), Changed<Interaction>>,
    mut layer: ResMut<KeypadLayer>,
    mut gate: MessageWriter<GateCommand>,
) {
    for (interaction, button) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let command = match *button {
            GateButton::Key(ch) => GateCommand::Key(ch),
            GateButton::Clear => GateCommand::Clear,
            GateButton::EraseLast => GateCommand::EraseLast,
            GateButton::Submit => GateCommand::Submit,
            GateButton::Tone(field) => GateCommand::ToneTap(field),
            GateButton::Layer(target) => {
                layer.set_if_neq(target);
                continue;
            }
        };
        gate.write(command);
    }
}

fn rebuild_keypad(
    mut commands: Commands,
    layer: Res<KeypadLayer>,
    mut grids: Query<(Entity, &mut Node), With<KeypadGrid>>,
) {
    let layer = *layer;
    for (grid, mut node) in &mut grids {
        *node = keypad_node(layer);
        commands
            .entity(grid)
            .despawn_related::<Children>()
            .with_children(|grid| spawn_keys(grid, layer));
    }
}

fn sound_played_tones(
    mut commands: Commands,
    mut played: MessageReader<TonePlayed>,
    mut fields: Query<&mut ToneField>,
    mut pitches: Option<ResMut<Assets<Pitch>>>,
) {
    for TonePlayed { field } in played.read() {
        for mut tone in &mut fields {
            if tone.field == *field {
                tone.glow = 1.0;
            }
        }

        let Some(pitches) = pitches.as_mut() else {
            continue;
        };
        trace!(target: LOG_AUDIO, "Tone field {field} at {:.2} Hz", tone_frequency(*field));
        commands.spawn((
            AudioPlayer(pitches.add(Pitch::new(tone_frequency(*field), TONE_LENGTH))),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(0.4)),
            GateUi,
        ));
    }
}

fn fade_tone_glow(time: Res<Time>, mut fields: Query<(&mut ToneField, &mut BackgroundColor)>) {
    let fade = time.delta_secs() * 3.0;
    for (mut tone, mut background) in &mut fields {
        if tone.glow > 0.0 {
            tone.glow = (tone.glow - fade).max(0.0);
        }
        let alpha = 0.2 + tone.glow * 0.8;
        let target = tone_color(tone.field).with_alpha(alpha);
        if background.0 != target {
            background.0 = target;
        }
    }
}

fn status_line(session: &GateSession, playing: bool) -> String {
    match session.phase() {
        GatePhase::AwaitingTonePattern if playing => "LISTEN TO THE TONE SEQUENCE".to_string(),
        GatePhase::AwaitingTonePattern => format!(
            "REPEAT THE TONES {}/{}",
            session.tone_progress(),
            session.tone_sequence().len()
        ),
        GatePhase::ToneVerified | GatePhase::AwaitingCode => "Enter Code".to_string(),
        GatePhase::Unlocked => "CODE ACCEPTED".to_string(),
        GatePhase::Locked => "TERMINAL LOCKED".to_string(),
    }
}

/// Entered characters padded with underscores to the maximum code length.
pub(super) fn code_readout(entered: &str, max_len: usize) -> String {
    let padding = max_len.saturating_sub(entered.chars().count());
    format!("{entered}{}", "_".repeat(padding))
}

fn refresh_readout(
    session: Option<Res<GateSession>>,
    playback: Option<Res<TonePlayback>>,
    mut texts: Query<(&Readout, &mut Text, &mut TextColor)>,
) {
    let Some(session) = session else {
        return;
    };
    let playing = playback.is_some_and(|p| p.is_playing());

    for (readout, mut text, mut color) in &mut texts {
        let (value, tint) = match readout {
            Readout::Status => (status_line(&session, playing), ACCENT),
            Readout::Code => (
                code_readout(session.entered(), session.rules().max_code_length),
                TEXT,
            ),
            Readout::Attempts => (
                format!("ATTEMPTS REMAINING: {}", session.attempts_remaining()),
                ACCENT.with_alpha(0.6),
            ),
            Readout::Banner => match session.phase() {
                GatePhase::Locked => ("ACCESS DENIED".to_string(), DENIED),
                GatePhase::Unlocked => ("ACCESS GRANTED".to_string(), ACCENT),
                _ => (String::new(), ACCENT),
            },
        };
        if text.0 != value {
            text.0 = value;
        }
        if color.0 != tint {
            color.0 = tint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_fields_follow_the_pentatonic_scale() {
        assert_eq!(tone_frequency(0), 261.63);
        assert_eq!(tone_frequency(5), 523.25);
        assert_eq!(tone_frequency(6), 261.63 * 2.0);
    }

    #[test]
    fn keypad_layers_cover_both_alphabets() {
        assert_eq!(KeypadLayer::Digits.keys().len(), 9);
        assert_eq!(KeypadLayer::Letters.keys().len(), 26);

        let mut layer = KeypadLayer::default();
        layer.toggle();
        assert_eq!(layer, KeypadLayer::Letters);
        layer.toggle();
        assert_eq!(layer, KeypadLayer::Digits);
    }

    #[test]
    fn code_readout_pads_to_max_length() {
        assert_eq!(code_readout("", 8), "________");
        assert_eq!(code_readout("13", 8), "13______");
        assert_eq!(code_readout("1337LEET", 8), "1337LEET");
    }
}
