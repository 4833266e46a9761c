//! Procedural "phantom sync" waveform under the globe.
//!
//! The curve is synthesized from layered sines and a kick envelope; it never
//! looks at real audio samples.

use super::{GlobeRng, GlobeScene};
use super::audio::{AudioLinkState, ToggleAudio};
use super::mode::AlternateMode;
use crate::AppScreen;
use crate::ui::{OVERLAY_LAYER, label};
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;
use std::f32::consts::PI;

pub struct VisualizerPlugin;

impl Plugin for VisualizerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeRng>()
            .init_gizmo_group::<WaveGlowGizmos>()
            .init_gizmo_group::<WaveCoreGizmos>()
            .add_systems(Startup, configure_wave_gizmos)
            .add_systems(OnEnter(AppScreen::Globe), spawn_panel)
            .add_systems(
                Update,
                (handle_panel_click, refresh_panel, draw_waveform)
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

pub const PANEL_WIDTH: f32 = 320.0;
pub const PANEL_HEIGHT: f32 = 80.0;
/// Panel bottom edge, as a fraction of the window height.
const PANEL_BOTTOM: f32 = 0.1;

const CYAN: Color = Color::srgb(0.133, 0.827, 0.933);
const AMBER: Color = Color::srgb(0.961, 0.62, 0.043);

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct WaveGlowGizmos;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct WaveCoreGizmos;

#[derive(Component)]
struct VisualizerPanel;

#[derive(Component)]
struct VisualizerLabel;

/// Beat envelope: sharp spikes twice a second.
pub fn kick(time: f32) -> f32 {
    let beat = ((time * PI * 4.0).sin() + 1.0) / 2.0;
    beat.powi(4)
}

/// Vertical offset from the center line for each of `width` columns.
pub fn sample_waveform(width: usize, time: f32, playing: bool, rng: &mut impl Rng) -> Vec<f32> {
    let kick = kick(time);
    let amplitude = if playing { 15.0 + kick * 30.0 } else { 2.0 };

    (0..width)
        .map(|column| {
            let x = column as f32;
            let nx = x / width as f32 * 2.0 - 1.0;
            let taper = (1.0 - nx.abs()).powi(2);
            let w1 = (x * 0.03 + time * 4.0).sin();
            let w2 = (x * 0.1 - time * 8.0).sin() * 0.3;
            let jitter = (rng.gen_range(0.0f32..1.0) - 0.5) * kick * 6.0;
            (w1 + w2) * amplitude * taper + jitter * taper
        })
        .collect()
}

pub fn visualizer_label(playing: bool, alternate: bool) -> &'static str {
    match (playing, alternate) {
        (false, _) => "AUDIO LINK",
        (true, false) => "SYSTEM ONLINE",
        (true, true) => "CORE CRITICAL",
    }
}

fn theme_color(alternate: bool) -> Color {
    if alternate { AMBER } else { CYAN }
}

fn configure_wave_gizmos(mut store: ResMut<GizmoConfigStore>) {
    let (glow, _) = store.config_mut::<WaveGlowGizmos>();
    glow.line.width = 5.0;
    glow.render_layers = RenderLayers::layer(OVERLAY_LAYER);

    let (core, _) = store.config_mut::<WaveCoreGizmos>();
    core.line.width = 1.5;
    core.render_layers = RenderLayers::layer(OVERLAY_LAYER);
}

fn spawn_panel(mut commands: Commands) {
    commands
        .spawn((
            Button,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Percent(PANEL_BOTTOM * 100.0),
                left: Val::Percent(50.0),
                margin: UiRect::left(Val::Px(-PANEL_WIDTH / 2.0)),
                width: Val::Px(PANEL_WIDTH),
                height: Val::Px(PANEL_HEIGHT),
                border: UiRect::new(Val::Px(1.0), Val::Px(1.0), Val::Px(0.0), Val::Px(1.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::FlexEnd,
                padding: UiRect::bottom(Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.06, 0.09, 0.16, 0.35)),
            BorderColor::all(CYAN.with_alpha(0.6)),
            VisualizerPanel,
            GlobeScene,
            Name::new("Visualizer"),
        ))
        .with_children(|panel| {
            panel.spawn((
                label(visualizer_label(false, false), 9.0, CYAN.with_alpha(0.9)),
                VisualizerLabel,
                Pickable::IGNORE,
            ));
        });
}

fn handle_panel_click(
    panels: Query<&Interaction, (Changed<Interaction>, With<VisualizerPanel>)>,
    mut toggle: MessageWriter<ToggleAudio>,
) {
    for interaction in &panels {
        if *interaction == Interaction::Pressed {
            toggle.write(ToggleAudio);
        }
    }
}

fn refresh_panel(
    link: Res<AudioLinkState>,
    mode: Res<AlternateMode>,
    mut labels: Query<(&mut Text, &mut TextColor), With<VisualizerLabel>>,
    mut panels: Query<&mut BorderColor, With<VisualizerPanel>>,
) {
    if !link.is_changed() && !mode.is_changed() {
        return;
    }
    let color = theme_color(mode.active());
    for (mut text, mut text_color) in &mut labels {
        text.0 = visualizer_label(link.playing, mode.active()).to_string();
        text_color.0 = color.with_alpha(0.9);
    }
    for mut border in &mut panels {
        *border = BorderColor::all(color.with_alpha(0.6));
    }
}

fn draw_waveform(
    time: Res<Time>,
    link: Res<AudioLinkState>,
    mode: Res<AlternateMode>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut rng: ResMut<GlobeRng>,
    mut glow: Gizmos<WaveGlowGizmos>,
    mut core: Gizmos<WaveCoreGizmos>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    // Overlay camera space: origin at the window center, y up.
    let center_y = -window.height() / 2.0 + window.height() * PANEL_BOTTOM + PANEL_HEIGHT / 2.0;
    let left = -PANEL_WIDTH / 2.0;
    let color = theme_color(mode.active());
    let width = PANEL_WIDTH as usize;
    let t = time.elapsed_secs();

    core.line_2d(
        Vec2::new(left, center_y),
        Vec2::new(-left, center_y),
        color.with_alpha(0.15),
    );

    let to_points = |samples: Vec<f32>| {
        samples
            .into_iter()
            .enumerate()
            .map(|(x, offset)| Vec2::new(left + x as f32, center_y - offset))
            .collect::<Vec<_>>()
    };
    glow.linestrip_2d(
        to_points(sample_waveform(width, t, link.playing, &mut rng.0)),
        color.with_alpha(0.5),
    );
    core.linestrip_2d(
        to_points(sample_waveform(width, t, link.playing, &mut rng.0)),
        Color::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn kick_spikes_stay_in_unit_range() {
        assert!((kick(0.125) - 1.0).abs() < 1e-5);
        assert!(kick(0.375) < 1e-5);
        for step in 0..100 {
            let k = kick(step as f32 * 0.013);
            assert!((0.0..=1.0).contains(&k));
        }
    }

    #[test]
    fn idle_wave_is_calm_and_edges_are_pinned() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples = sample_waveform(320, 0.375, false, &mut rng);
        assert_eq!(samples.len(), 320);
        assert!(samples[0].abs() < 1e-6);
        // Idle amplitude 2, w1 + w2 at most 1.3, near-zero kick.
        assert!(samples.iter().all(|y| y.abs() <= 2.7));
    }

    #[test]
    fn playing_wave_swings_wider_on_the_kick() {
        let mut rng = StdRng::seed_from_u64(3);
        let idle = sample_waveform(320, 0.125, false, &mut rng);
        let live = sample_waveform(320, 0.125, true, &mut rng);
        let peak = |s: &[f32]| s.iter().fold(0.0f32, |m, y| m.max(y.abs()));
        // Idle: amplitude 2 plus at most 3 of kick jitter.
        assert!(peak(&idle) <= 2.0 * 1.3 + 3.0);
        assert!(peak(&live) > 20.0);
        assert!(peak(&live) <= 45.0 * 1.3 + 3.0);
    }

    #[test]
    fn label_follows_playback_and_mode() {
        assert_eq!(visualizer_label(false, true), "AUDIO LINK");
        assert_eq!(visualizer_label(true, false), "SYSTEM ONLINE");
        assert_eq!(visualizer_label(true, true), "CORE CRITICAL");
    }
}
