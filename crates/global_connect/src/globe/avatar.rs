//! Robot head in the lower-right corner. It follows the pointer, blinks when
//! idle and bobbles while the chat assistant is working.

use super::{GlobeRng, GlobeScene};
use super::chat::{ChatSession, ToggleChat};
use crate::AppScreen;
use bevy::camera::visibility::RenderLayers;
use bevy::camera::{ClearColorConfig, Viewport};
use bevy::math::FloatExt;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;
use std::f32::consts::PI;

pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeRng>()
            .add_systems(OnEnter(AppScreen::Globe), spawn_avatar)
            .add_systems(
                Update,
                (fit_viewport, handle_avatar_click, move_head, animate_eyes)
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

pub const AVATAR_LAYER: usize = 2;
/// Logical size of the square avatar viewport.
const AVATAR_SIZE: f32 = 256.0;
const AVATAR_MARGIN: f32 = 24.0;
const BLINK_SECS: f32 = 0.15;

const EYE_THINKING: Color = Color::srgb(0.984, 0.749, 0.141);
const EYE_OPEN: Color = Color::srgb(0.133, 0.827, 0.933);
const EYE_IDLE: Color = Color::srgb(0.024, 0.714, 0.831);

#[derive(Component)]
struct AvatarCamera;

#[derive(Component)]
struct AvatarButton;

/// Euler pose of the head, eased every frame.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub lift: f32,
}

impl HeadPose {
    /// Thinking bobble while processing, otherwise turn toward `pointer`
    /// (normalized device coordinates) and settle.
    pub fn advance(self, pointer: Vec2, processing: bool, elapsed: f32, dt: f32) -> Self {
        if processing {
            return Self {
                roll: (elapsed * 20.0).sin() * 0.02,
                lift: (elapsed * 10.0).sin() * 0.05,
                ..self
            };
        }
        let rate = dt * 2.0;
        Self {
            pitch: self.pitch.lerp(pointer.y * 0.5, rate),
            yaw: self.yaw.lerp(pointer.x * 0.5, rate),
            roll: self.roll.lerp(0.0, rate),
            lift: self.lift.lerp(0.0, rate),
        }
    }

    fn transform(self) -> Transform {
        Transform::from_xyz(0.0, self.lift, 0.0).with_rotation(Quat::from_euler(
            EulerRot::XYZ,
            self.pitch,
            self.yaw,
            self.roll,
        ))
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BlinkClock {
    next: f32,
    started: Option<f32>,
}

impl Default for BlinkClock {
    fn default() -> Self {
        Self {
            next: 2.0,
            started: None,
        }
    }
}

impl BlinkClock {
    /// Vertical eye scale at `elapsed`. Blinks only happen while `idle`.
    pub fn eye_scale(&mut self, elapsed: f32, idle: bool, rng: &mut impl Rng) -> f32 {
        if !idle {
            return 1.0;
        }
        if elapsed > self.next && self.started.is_none() {
            self.started = Some(elapsed);
            self.next = elapsed + 2.0 + rng.gen_range(0.0..4.0);
        }
        let Some(start) = self.started else {
            return 1.0;
        };
        let progress = (elapsed - start) / BLINK_SECS;
        if progress >= 1.0 {
            self.started = None;
            1.0
        } else {
            (1.0 - (progress * PI).sin()).max(0.1)
        }
    }
}

pub fn eye_opacity(elapsed: f32, chat_open: bool, processing: bool) -> f32 {
    let base = if chat_open { 1.0 } else { 0.6 };
    let (frequency, amplitude) = match (processing, chat_open) {
        (true, _) => (25.0, 0.4),
        (false, true) => (10.0, 0.2),
        (false, false) => (2.0, 0.15),
    };
    (base + (elapsed * frequency).sin() * amplitude).clamp(0.0, 1.0)
}

pub fn eye_color(chat_open: bool, processing: bool) -> Color {
    match (processing, chat_open) {
        (true, _) => EYE_THINKING,
        (false, true) => EYE_OPEN,
        (false, false) => EYE_IDLE,
    }
}

#[derive(Component)]
struct AvatarEyes {
    material: Handle<StandardMaterial>,
}

fn spawn_avatar(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let layer = RenderLayers::layer(AVATAR_LAYER);

    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 5,
            clear_color: ClearColorConfig::None,
            is_active: false,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: 45f32.to_radians(),
            ..default()
        }),
        Transform::from_xyz(0.0, 0.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
        layer.clone(),
        AvatarCamera,
        GlobeScene,
        Name::new("Avatar Camera"),
    ));
    commands.spawn((
        PointLight {
            intensity: 400_000.0,
            ..default()
        },
        Transform::from_xyz(4.0, 4.0, 6.0),
        layer.clone(),
        GlobeScene,
    ));

    let shell = materials.add(StandardMaterial {
        base_color: Color::srgb(0.945, 0.961, 0.976),
        perceptual_roughness: 0.2,
        metallic: 0.1,
        clearcoat: 1.0,
        ..default()
    });
    let visor = materials.add(StandardMaterial {
        base_color: Color::srgb(0.059, 0.09, 0.165),
        perceptual_roughness: 0.2,
        metallic: 0.8,
        ..default()
    });
    let neck = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 0.255, 0.333),
        perceptual_roughness: 0.5,
        ..default()
    });
    let eye_material = materials.add(StandardMaterial {
        base_color: EYE_IDLE,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    let eye = meshes.add(Sphere::new(0.08));
    let ear = meshes.add(Cylinder::new(0.3, 0.2));

    commands
        .spawn((
            HeadPose::default().transform(),
            Visibility::default(),
            HeadPose::default(),
            layer.clone(),
            GlobeScene,
            Name::new("Avatar Head"),
        ))
        .with_children(|head| {
            head.spawn((
                Mesh3d(meshes.add(Sphere::new(0.5))),
                MeshMaterial3d(shell.clone()),
                Transform::from_scale(Vec3::new(1.4, 1.5, 1.4)),
                layer.clone(),
            ));
            head.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.1, 0.7, 0.5))),
                MeshMaterial3d(visor),
                Transform::from_xyz(0.0, 0.1, 0.55),
                layer.clone(),
            ));
            head.spawn((
                Transform::from_xyz(0.0, 0.15, 0.81),
                Visibility::default(),
                AvatarEyes {
                    material: eye_material.clone(),
                },
                BlinkClock::default(),
                layer.clone(),
            ))
            .with_children(|eyes| {
                for x in [-0.25, 0.25] {
                    eyes.spawn((
                        Mesh3d(eye.clone()),
                        MeshMaterial3d(eye_material.clone()),
                        Transform::from_xyz(x, 0.0, 0.0),
                        layer.clone(),
                    ));
                }
            });
            for x in [-0.8, 0.8] {
                head.spawn((
                    Mesh3d(ear.clone()),
                    MeshMaterial3d(shell.clone()),
                    Transform::from_xyz(x, 0.0, 0.0).with_rotation(Quat::from_rotation_z(PI / 2.0)),
                    layer.clone(),
                ));
            }
            head.spawn((
                Mesh3d(meshes.add(ConicalFrustum {
                    radius_top: 0.4,
                    radius_bottom: 0.6,
                    height: 0.5,
                })),
                MeshMaterial3d(neck),
                Transform::from_xyz(0.0, -0.9, 0.0),
                layer.clone(),
            ));
        });

    // Invisible hit area over the viewport.
    commands.spawn((
        Button,
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(AVATAR_MARGIN),
            bottom: Val::Px(AVATAR_MARGIN),
            width: Val::Px(AVATAR_SIZE),
            height: Val::Px(AVATAR_SIZE),
            ..default()
        },
        AvatarButton,
        GlobeScene,
        Name::new("Avatar Hit Area"),
    ));
}

/// Pins the avatar viewport to the lower-right corner; hides it when the
/// window is too small to hold it.
fn fit_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut Camera, With<AvatarCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let scale = window.scale_factor();
    let size = (AVATAR_SIZE * scale) as u32;
    let margin = (AVATAR_MARGIN * scale) as u32;
    let physical = window.physical_size();

    for mut camera in &mut cameras {
        let fits = physical.x >= size + margin && physical.y >= size + margin && size > 0;
        camera.is_active = fits;
        camera.viewport = fits.then(|| Viewport {
            physical_position: UVec2::new(physical.x - size - margin, physical.y - size - margin),
            physical_size: UVec2::splat(size),
            ..default()
        });
    }
}

fn handle_avatar_click(
    buttons: Query<&Interaction, (Changed<Interaction>, With<AvatarButton>)>,
    mut toggle: MessageWriter<ToggleChat>,
) {
    for interaction in &buttons {
        if *interaction == Interaction::Pressed {
            toggle.write(ToggleChat);
        }
    }
}

fn move_head(
    time: Res<Time>,
    chat: Res<ChatSession>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut heads: Query<(&mut HeadPose, &mut Transform)>,
) {
    let pointer = windows
        .single()
        .ok()
        .and_then(|window| {
            let cursor = window.cursor_position()?;
            let size = window.size();
            Some(Vec2::new(
                cursor.x / size.x * 2.0 - 1.0,
                -(cursor.y / size.y) * 2.0 + 1.0,
            ))
        })
        .unwrap_or(Vec2::ZERO);

    for (mut pose, mut transform) in &mut heads {
        *pose = pose.advance(
            pointer,
            chat.is_processing(),
            time.elapsed_secs(),
            time.delta_secs(),
        );
        *transform = pose.transform();
    }
}

fn animate_eyes(
    time: Res<Time>,
    chat: Res<ChatSession>,
    mut rng: ResMut<GlobeRng>,
    mut eyes: Query<(&AvatarEyes, &mut BlinkClock, &mut Transform)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let elapsed = time.elapsed_secs();
    let processing = chat.is_processing();
    let idle = !chat.open && !processing;

    for (eyes, mut blink, mut transform) in &mut eyes {
        transform.scale.y = blink.eye_scale(elapsed, idle, &mut rng.0);
        if let Some(material) = materials.get_mut(&eyes.material) {
            let opacity = eye_opacity(elapsed, chat.open, processing);
            material.base_color = eye_color(chat.open, processing).with_alpha(opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn thinking_bobbles_without_turning() {
        let pose = HeadPose {
            yaw: 0.3,
            ..default()
        };
        let next = pose.advance(Vec2::ONE, true, PI / 40.0, 0.016);
        assert_eq!(next.yaw, 0.3);
        assert!((next.roll - 0.02).abs() < 1e-6);
        assert!((next.lift - (PI / 4.0).sin() * 0.05).abs() < 1e-6);
    }

    #[test]
    fn idle_head_eases_toward_the_pointer() {
        let pose = HeadPose {
            roll: 0.02,
            lift: 0.05,
            ..default()
        };
        let next = pose.advance(Vec2::new(1.0, -1.0), false, 0.0, 0.25);
        assert!((next.yaw - 0.25).abs() < 1e-6);
        assert!((next.pitch + 0.25).abs() < 1e-6);
        assert!((next.roll - 0.01).abs() < 1e-6);
        assert!((next.lift - 0.025).abs() < 1e-6);
    }

    #[test]
    fn blink_closes_then_reopens_and_reschedules() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut blink = BlinkClock::default();
        assert_eq!(blink.eye_scale(1.0, true, &mut rng), 1.0);

        let start = 2.01;
        assert_eq!(blink.eye_scale(start, true, &mut rng), 1.0);
        let next = blink.next;
        assert!((start + 2.0..start + 6.0).contains(&next));

        let mid = blink.eye_scale(start + BLINK_SECS / 2.0, true, &mut rng);
        assert!((mid - 0.1).abs() < 1e-6);
        assert_eq!(blink.eye_scale(start + BLINK_SECS * 1.5, true, &mut rng), 1.0);
        assert_eq!(blink.next, next);
    }

    #[test]
    fn no_blinking_while_busy() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut blink = BlinkClock::default();
        assert_eq!(blink.eye_scale(10.0, false, &mut rng), 1.0);
        assert_eq!(blink, BlinkClock::default());
    }

    #[test]
    fn eyes_pulse_by_state() {
        assert!((eye_opacity(0.0, false, false) - 0.6).abs() < 1e-6);
        assert_eq!(eye_opacity(PI / 20.0, true, false), 1.0);
        let thinking = eye_opacity(PI / 50.0, false, true);
        assert!((thinking - 1.0).abs() < 1e-6);
        assert_eq!(eye_color(true, true), EYE_THINKING);
        assert_eq!(eye_color(true, false), EYE_OPEN);
        assert_eq!(eye_color(false, false), EYE_IDLE);
    }
}
