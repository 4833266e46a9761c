//! Flat overlay on top of the globe: title, simulated link stats, mode
//! switch, record card, directory and the way back to the gate.

use super::{GlobeRng, GlobeScene};
use super::camera::FocusRequest;
use super::markers::select_record;
use super::mode::{AlternateMode, ToggleAlternateMode};
use crate::AppScreen;
use crate::locations::{LOCATIONS, LocationRecord, Selection};
use crate::ui::{ACCENT, TEXT, WARNING, label, themed_button};
use app::LOG_GLOBE;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use rand::Rng;
use std::ops::Range;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ToggleDirectory>()
            .add_message::<BackToGate>()
            .init_resource::<LiveStats>()
            .init_resource::<GlobeRng>()
            .init_resource::<Directory>()
            .add_systems(OnEnter(AppScreen::Globe), (reset_hud, spawn_hud).chain())
            .add_systems(
                Update,
                (
                    (
                        handle_hud_buttons,
                        handle_directory_rows,
                        scroll_directory,
                        toggle_directory,
                        tick_stats,
                    ),
                    (
                        refresh_stats.run_if(resource_changed::<LiveStats>),
                        refresh_mode_texts.run_if(resource_changed::<AlternateMode>),
                        refresh_card.run_if(
                            resource_changed::<Selection>.or(resource_changed::<AlternateMode>),
                        ),
                        refresh_directory.run_if(
                            resource_changed::<Directory>
                                .or(resource_changed::<Selection>)
                                .or(resource_changed::<AlternateMode>),
                        ),
                    ),
                    leave_globe,
                )
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

const AMBER: Color = Color::srgb(0.961, 0.62, 0.043);
const MUTED: Color = Color::srgb(0.8, 0.84, 0.88);
const VISIBLE_ROWS: usize = 10;

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct ToggleDirectory;

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct BackToGate;

/// Fake link telemetry, random-walked once per second.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LiveStats {
    pub latency_ms: f32,
    pub packet_flow: f32,
    timer: Timer,
}

impl Default for LiveStats {
    fn default() -> Self {
        Self {
            latency_ms: 18.0,
            packet_flow: 4.9,
            timer: Timer::from_seconds(1.0, TimerMode::Repeating),
        }
    }
}

impl LiveStats {
    pub fn step(&mut self, rng: &mut impl Rng) {
        self.latency_ms =
            (self.latency_ms + (rng.gen_range(0.0f32..1.0) - 0.5) * 5.0).clamp(12.0, 45.0);
        self.packet_flow =
            (self.packet_flow + (rng.gen_range(0.0f32..1.0) - 0.5) * 0.5).clamp(2.0, 9.9);
    }
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Directory {
    pub open: bool,
    pub scroll: usize,
}

impl Directory {
    pub fn scroll_by(&mut self, rows: isize) {
        let max = LOCATIONS.len().saturating_sub(VISIBLE_ROWS);
        self.scroll = self.scroll.saturating_add_signed(rows).min(max);
    }

    pub fn visible_rows(&self) -> Range<usize> {
        self.scroll..(self.scroll + VISIBLE_ROWS).min(LOCATIONS.len())
    }
}

pub fn mode_button_label(alternate: bool) -> (&'static str, &'static str) {
    if alternate {
        ("PHOENIX ACTIVE", "SECURE CHANNEL OPEN")
    } else {
        ("ACTIVATE PHOENIX", "WAITING FOR INPUT")
    }
}

pub fn title_caption(alternate: bool) -> &'static str {
    if alternate {
        "WARNING: UNRESTRICTED ACCESS"
    } else {
        "Enterprise Network Visualization"
    }
}

pub fn directory_button_label(open: bool) -> &'static str {
    if open { "CLOSE DATA STREAM" } else { "ACCESS DATA STREAM" }
}

pub fn format_coordinates(record: &LocationRecord) -> String {
    format!("{:.2}, {:.2}", record.lat, record.lon)
}

fn theme_color(alternate: bool) -> Color {
    if alternate { AMBER } else { ACCENT }
}

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum HudText {
    Latency,
    PacketFlow,
    Caption,
    ModeLabel,
    ModeCaption,
    Security,
    DirectoryLabel,
}

#[derive(Component, Clone, Copy, PartialEq, Eq)]
enum CardText {
    Name,
    Leader,
    City,
    Influence,
    Coordinates,
}

#[derive(Component, Clone, Copy)]
enum HudButton {
    AlternateMode,
    Directory,
    Back,
}

#[derive(Component)]
struct SelectionCard;

#[derive(Component)]
struct DirectoryPanel;

#[derive(Component)]
struct DirectoryRow(usize);

#[derive(Component)]
struct OverrideBanner;

fn reset_hud(mut stats: ResMut<LiveStats>, mut directory: ResMut<Directory>) {
    *stats = LiveStats::default();
    *directory = Directory::default();
}

/// Layout-only node that must not swallow pointer hits meant for the globe.
fn pass_through(node: Node) -> impl Bundle {
    (node, Pickable::IGNORE)
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            pass_through(Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            }),
            GlobeScene,
            Name::new("HUD"),
        ))
        .with_children(|hud| {
            spawn_banner(hud);
            spawn_header(hud);
            spawn_mode_button(hud);
            spawn_card(hud);
            spawn_directory(hud);

            hud.spawn(pass_through(Node {
                position_type: PositionType::Absolute,
                left: Val::Px(24.0),
                top: Val::Px(24.0),
                ..default()
            }))
            .with_children(|corner| {
                corner
                    .spawn((themed_button(Val::Px(150.0), Val::Px(32.0)), HudButton::Back))
                    .with_children(|button| {
                        button.spawn(label("← Back to Login", 13.0, TEXT));
                    });
            });
        });
}

fn spawn_banner(hud: &mut ChildSpawnerCommands) {
    hud.spawn((
        pass_through(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            display: Display::None,
            ..default()
        }),
        BackgroundColor(Color::srgba(0.27, 0.04, 0.04, 0.2)),
        OverrideBanner,
    ))
    .with_children(|banner| {
        banner
            .spawn((
                pass_through(Node {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    padding: UiRect::all(Val::Px(48.0)),
                    border: UiRect::all(Val::Px(1.0)),
                    ..default()
                }),
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.9)),
                BorderColor::all(AMBER),
            ))
            .with_children(|plate| {
                plate.spawn((label("SYSTEM OVERRIDE", 64.0, AMBER), Pickable::IGNORE));
                plate.spawn((
                    label("PROTOCOL LEVEL: OMEGA", 22.0, AMBER.with_alpha(0.8)),
                    Pickable::IGNORE,
                ));
            });
    });
}

fn spawn_header(hud: &mut ChildSpawnerCommands) {
    hud.spawn(pass_through(Node {
        position_type: PositionType::Absolute,
        top: Val::Px(24.0),
        width: Val::Percent(100.0),
        flex_direction: FlexDirection::Column,
        align_items: AlignItems::Center,
        ..default()
    }))
    .with_children(|title| {
        title.spawn((label("GLOBAL CONNECT", 44.0, TEXT), Pickable::IGNORE));
        title.spawn((
            label(title_caption(false), 12.0, MUTED),
            HudText::Caption,
            Pickable::IGNORE,
        ));
    });

    hud.spawn(pass_through(Node {
        position_type: PositionType::Absolute,
        left: Val::Px(24.0),
        top: Val::Px(80.0),
        width: Val::Px(192.0),
        flex_direction: FlexDirection::Column,
        row_gap: Val::Px(4.0),
        ..default()
    }))
    .with_children(|stats| {
        stats.spawn((label("NETWORK LATENCY", 10.0, MUTED), Pickable::IGNORE));
        stats.spawn((label("18 ms", 24.0, ACCENT), HudText::Latency, Pickable::IGNORE));
        stats.spawn((label("NODES: 18,441   SYNC: 100%", 10.0, MUTED), Pickable::IGNORE));
    });

    hud.spawn(pass_through(Node {
        position_type: PositionType::Absolute,
        right: Val::Px(40.0),
        top: Val::Px(360.0),
        width: Val::Px(224.0),
        flex_direction: FlexDirection::Column,
        align_items: AlignItems::FlexEnd,
        row_gap: Val::Px(4.0),
        ..default()
    }))
    .with_children(|flow| {
        flow.spawn((label("PACKET FLOW", 9.0, MUTED), Pickable::IGNORE));
        flow.spawn((label("4.9 M/s", 30.0, ACCENT), HudText::PacketFlow, Pickable::IGNORE));
        flow.spawn((
            label("SECURITY: ENCRYPTED", 9.0, MUTED),
            HudText::Security,
            Pickable::IGNORE,
        ));
    });
}

fn spawn_mode_button(hud: &mut ChildSpawnerCommands) {
    let (title, caption) = mode_button_label(false);
    hud.spawn(pass_through(Node {
        position_type: PositionType::Absolute,
        right: Val::Px(0.0),
        top: Val::Px(256.0),
        ..default()
    }))
    .with_children(|edge| {
        edge.spawn((themed_button(Val::Px(240.0), Val::Px(64.0)), HudButton::AlternateMode))
            .with_children(|button| {
                button
                    .spawn(pass_through(Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::FlexEnd,
                        ..default()
                    }))
                    .with_children(|text| {
                        text.spawn((label(title, 18.0, ACCENT), HudText::ModeLabel));
                        text.spawn((label(caption, 10.0, MUTED), HudText::ModeCaption));
                    });
            });
    });
}

fn spawn_card(hud: &mut ChildSpawnerCommands) {
    hud.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(32.0),
            top: Val::Px(128.0),
            width: Val::Px(320.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(8.0),
            padding: UiRect::all(Val::Px(24.0)),
            border: UiRect::left(Val::Px(2.0)),
            display: Display::None,
            ..default()
        },
        BackgroundColor(Color::srgba(0.06, 0.09, 0.16, 0.7)),
        BorderColor::all(ACCENT),
        SelectionCard,
    ))
    .with_children(|card| {
        card.spawn((label("", 28.0, ACCENT), CardText::Name));
        card.spawn(label("LEADER", 10.0, MUTED));
        card.spawn((label("", 18.0, TEXT), CardText::Leader));
        card.spawn(label("HQ", 10.0, MUTED));
        card.spawn((label("", 14.0, TEXT), CardText::City));
        card.spawn(label("DATA VALUE", 10.0, MUTED));
        card.spawn((label("", 18.0, ACCENT), CardText::Influence));
        card.spawn((label("", 10.0, MUTED), CardText::Coordinates));
    });
}

fn spawn_directory(hud: &mut ChildSpawnerCommands) {
    hud.spawn(pass_through(Node {
        position_type: PositionType::Absolute,
        left: Val::Px(24.0),
        bottom: Val::Px(24.0),
        flex_direction: FlexDirection::Column,
        align_items: AlignItems::FlexStart,
        row_gap: Val::Px(8.0),
        ..default()
    }))
    .with_children(|footer| {
        footer
            .spawn((
                Node {
                    width: Val::Px(288.0),
                    flex_direction: FlexDirection::Column,
                    display: Display::None,
                    ..default()
                },
                BackgroundColor(Color::srgba(0.06, 0.09, 0.16, 0.95)),
                Interaction::default(),
                DirectoryPanel,
            ))
            .with_children(|panel| {
                for (index, record) in LOCATIONS.iter().enumerate() {
                    panel
                        .spawn((
                            Button,
                            Node {
                                justify_content: JustifyContent::SpaceBetween,
                                padding: UiRect::axes(Val::Px(16.0), Val::Px(6.0)),
                                column_gap: Val::Px(8.0),
                                ..default()
                            },
                            BackgroundColor(Color::NONE),
                            DirectoryRow(index),
                        ))
                        .with_children(|row| {
                            row.spawn(label(record.name, 12.0, TEXT));
                            row.spawn(label(record.city, 12.0, MUTED));
                        });
                }
            });

        footer
            .spawn((themed_button(Val::Px(220.0), Val::Px(36.0)), HudButton::Directory))
            .with_children(|button| {
                button.spawn((
                    label(directory_button_label(false), 12.0, TEXT),
                    HudText::DirectoryLabel,
                ));
            });
    });
}

fn handle_hud_buttons(
    buttons: Query<(&Interaction, &HudButton), Changed<Interaction>>,
    mut alternate: MessageWriter<ToggleAlternateMode>,
    mut directory: MessageWriter<ToggleDirectory>,
    mut back: MessageWriter<BackToGate>,
) {
    for (interaction, button) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            HudButton::AlternateMode => {
                alternate.write(ToggleAlternateMode);
            }
            HudButton::Directory => {
                directory.write(ToggleDirectory);
            }
            HudButton::Back => {
                back.write(BackToGate);
            }
        }
    }
}

fn handle_directory_rows(
    rows: Query<(&Interaction, &DirectoryRow), Changed<Interaction>>,
    mut selection: ResMut<Selection>,
    mut focus: ResMut<FocusRequest>,
) {
    for (interaction, row) in &rows {
        if *interaction == Interaction::Pressed {
            select_record(row.0, &mut selection, &mut focus);
        }
    }
}

fn scroll_directory(
    mut wheel: MessageReader<MouseWheel>,
    panels: Query<&Interaction, With<DirectoryPanel>>,
    rows: Query<&Interaction, With<DirectoryRow>>,
    mut directory: ResMut<Directory>,
) {
    let hovered = panels.iter().chain(rows.iter()).any(|i| *i != Interaction::None);
    if !directory.open || !hovered {
        wheel.clear();
        return;
    }
    for event in wheel.read() {
        let rows = match event.unit {
            MouseScrollUnit::Line => event.y.round() as isize,
            MouseScrollUnit::Pixel => (event.y / 24.0).round() as isize,
        };
        if rows != 0 {
            directory.scroll_by(-rows);
        }
    }
}

fn toggle_directory(mut toggles: MessageReader<ToggleDirectory>, mut directory: ResMut<Directory>) {
    if toggles.read().count() % 2 == 1 {
        directory.open = !directory.open;
    }
}

fn tick_stats(time: Res<Time>, mut rng: ResMut<GlobeRng>, mut stats: ResMut<LiveStats>) {
    // The timer alone must not mark the stats as changed.
    if stats
        .bypass_change_detection()
        .timer
        .tick(time.delta())
        .just_finished()
    {
        stats.step(&mut rng.0);
    }
}

fn refresh_stats(stats: Res<LiveStats>, mut texts: Query<(&HudText, &mut Text)>) {
    for (kind, mut text) in &mut texts {
        match kind {
            HudText::Latency => text.0 = format!("{:.0} ms", stats.latency_ms),
            HudText::PacketFlow => text.0 = format!("{:.1} M/s", stats.packet_flow),
            _ => {}
        }
    }
}

fn refresh_mode_texts(
    mode: Res<AlternateMode>,
    directory: Res<Directory>,
    mut texts: Query<(&HudText, &mut Text, &mut TextColor)>,
    mut banners: Query<&mut Node, With<OverrideBanner>>,
) {
    let alternate = mode.active();
    let color = theme_color(alternate);
    let (title, caption) = mode_button_label(alternate);
    for (kind, mut text, mut text_color) in &mut texts {
        match kind {
            HudText::Latency | HudText::PacketFlow | HudText::ModeLabel => text_color.0 = color,
            _ => {}
        }
        match kind {
            HudText::Caption => text.0 = title_caption(alternate).to_string(),
            HudText::ModeLabel => text.0 = title.to_string(),
            HudText::ModeCaption => text.0 = caption.to_string(),
            HudText::Security => {
                text.0 = if alternate {
                    "SECURITY: BYPASSED"
                } else {
                    "SECURITY: ENCRYPTED"
                }
                .to_string();
                text_color.0 = if alternate { WARNING } else { MUTED };
            }
            HudText::DirectoryLabel => text.0 = directory_button_label(directory.open).to_string(),
            HudText::Latency | HudText::PacketFlow => {}
        }
    }
    for mut node in &mut banners {
        node.display = if alternate { Display::Flex } else { Display::None };
    }
}

fn refresh_card(
    selection: Res<Selection>,
    mode: Res<AlternateMode>,
    mut cards: Query<(&mut Node, &mut BorderColor), With<SelectionCard>>,
    mut texts: Query<(&CardText, &mut Text, &mut TextColor)>,
) {
    let record = selection.record();
    let color = theme_color(mode.active());
    for (mut node, mut border) in &mut cards {
        node.display = if record.is_some() { Display::Flex } else { Display::None };
        *border = BorderColor::all(color);
    }
    let Some(record) = record else {
        return;
    };
    for (kind, mut text, mut text_color) in &mut texts {
        text.0 = match kind {
            CardText::Name => record.name.to_uppercase(),
            CardText::Leader => record.leader_name.to_string(),
            CardText::City => record.place(),
            CardText::Influence => format!("{}%", record.influence_score),
            CardText::Coordinates => format!("{}   ● LIVE", format_coordinates(record)),
        };
        if matches!(kind, CardText::Name | CardText::Influence) {
            text_color.0 = color;
        }
    }
}

fn refresh_directory(
    directory: Res<Directory>,
    selection: Res<Selection>,
    mode: Res<AlternateMode>,
    mut panels: Query<&mut Node, (With<DirectoryPanel>, Without<DirectoryRow>)>,
    mut rows: Query<(&DirectoryRow, &mut Node, &mut BackgroundColor)>,
    mut labels: Query<(&HudText, &mut Text)>,
) {
    for mut node in &mut panels {
        node.display = if directory.open { Display::Flex } else { Display::None };
    }
    let visible = directory.visible_rows();
    let highlight = theme_color(mode.active()).with_alpha(0.15);
    for (row, mut node, mut background) in &mut rows {
        node.display = if visible.contains(&row.0) {
            Display::Flex
        } else {
            Display::None
        };
        background.0 = if selection.is(row.0) { highlight } else { Color::NONE };
    }
    for (kind, mut text) in &mut labels {
        if *kind == HudText::DirectoryLabel {
            text.0 = directory_button_label(directory.open).to_string();
        }
    }
}

fn leave_globe(mut back: MessageReader<BackToGate>, mut next_screen: ResMut<NextState<AppScreen>>) {
    if back.read().count() > 0 {
        info!(target: LOG_GLOBE, "Leaving globe for the gate");
        next_screen.set(AppScreen::Gate);
    }
}
