//! Shared overlay plumbing: the UI camera, palette and button feedback.

use crate::AppScreen;
use bevy::camera::ClearColorConfig;
use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;

/// Render layer shared by the UI camera and 2D gizmo overlays.
pub const OVERLAY_LAYER: usize = 1;

pub const BACKDROP: Color = Color::srgb(0.008, 0.012, 0.024);
pub const NORMAL_BUTTON: Color = Color::srgba(0.02, 0.09, 0.14, 0.85);
pub const HOVERED_BUTTON: Color = Color::srgba(0.05, 0.2, 0.28, 0.9);
pub const PRESSED_BUTTON: Color = Color::srgba(0.13, 0.83, 0.93, 0.9);
pub const ACCENT: Color = Color::srgb(0.13, 0.83, 0.93);
pub const ACCENT_DIM: Color = Color::srgb(0.02, 0.71, 0.83);
pub const WARNING: Color = Color::srgb(0.98, 0.45, 0.09);
pub const TEXT: Color = Color::srgb(0.85, 0.95, 1.0);

/// Marker component for the dedicated UI camera.
#[derive(Component)]
pub struct UiCamera;

/// Buttons that get the default hover/press colors.
#[derive(Component)]
pub struct ThemedButton;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BACKDROP))
            .add_systems(Startup, spawn_ui_camera_once)
            .add_systems(OnEnter(AppScreen::Gate), clear_behind_ui::<true>)
            .add_systems(OnEnter(AppScreen::Globe), clear_behind_ui::<false>)
            .add_systems(Update, paint_themed_buttons);
    }
}

fn spawn_ui_camera_once(mut commands: Commands, existing: Query<Entity, With<UiCamera>>) {
    if existing.is_empty() {
        commands.spawn((
            Camera2d,
            Camera {
                order: 10,
                clear_color: ClearColorConfig::Default,
                ..default()
            },
            RenderLayers::layer(OVERLAY_LAYER),
            UiCamera,
            Name::new("UI Camera"),
        ));
    }
}

/// The gate has no 3D camera, so the UI camera clears the frame there. On the
/// globe it must keep the 3D scene visible.
fn clear_behind_ui<const CLEAR: bool>(mut cameras: Query<&mut Camera, With<UiCamera>>) {
    for mut camera in &mut cameras {
        camera.clear_color = if CLEAR {
            ClearColorConfig::Default
        } else {
            ClearColorConfig::None
        };
    }
}

fn paint_themed_buttons(
    mut buttons: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<ThemedButton>),
    >,
) {
    for (interaction, mut color, mut border) in &mut buttons {
        let (fill, edge) = match *interaction {
            Interaction::Pressed => (PRESSED_BUTTON, Color::WHITE),
            Interaction::Hovered => (HOVERED_BUTTON, ACCENT),
            Interaction::None => (NORMAL_BUTTON, ACCENT_DIM),
        };
        *color = fill.into();
        *border = BorderColor::all(edge);
    }
}

/// Node, colors and border for a themed button of the given size.
pub fn themed_button(width: Val, height: Val) -> impl Bundle {
    (
        Button,
        ThemedButton,
        Node {
            width,
            height,
            border: UiRect::all(Val::Px(1.0)),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BorderColor::all(ACCENT_DIM),
        BorderRadius::all(Val::Px(4.0)),
        BackgroundColor(NORMAL_BUTTON),
    )
}

pub fn label(text: impl Into<String>, size: f32, color: Color) -> impl Bundle {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
    )
}
