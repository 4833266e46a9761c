//! Phoenix sigil in the upper-right corner. It idles with a slow ember glow
//! and flares up, sparkles included, while the chat assistant is working.

use super::chat::ChatSession;
use super::{GlobeRng, GlobeScene};
use crate::AppScreen;
use crate::ui::label;
use crate::utils::remove;
use bevy::camera::visibility::RenderLayers;
use bevy::camera::{ClearColorConfig, Viewport};
use bevy::math::FloatExt;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;
use std::f32::consts::PI;

pub struct SigilPlugin;

impl Plugin for SigilPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeRng>()
            .add_systems(OnEnter(AppScreen::Globe), (spawn_sigil, spawn_label))
            .add_systems(
                Update,
                (
                    fit_viewport,
                    refresh_label.run_if(resource_changed::<ChatSession>),
                    animate_sigil,
                    drift_sparkles,
                )
                    .run_if(in_state(AppScreen::Globe)),
            )
            .add_systems(OnExit(AppScreen::Globe), remove::<SigilMaterials>);
    }
}

pub const SIGIL_LAYER: usize = 3;
pub const MAX_SPARKLES: usize = 150;
/// Logical size of the square sigil viewport.
const SIGIL_SIZE: f32 = 160.0;
const SIGIL_TOP: f32 = 24.0;
const SIGIL_RIGHT: f32 = 32.0;
const IDLE_GLOW: f32 = 0.2;
const ACTIVE_GLOW: f32 = 4.0;
const FEATHERS: usize = 7;

const ARMOR: Color = Color::srgb_u8(0xd9, 0x77, 0x06);
const ARMOR_EMISSIVE: Color = Color::srgb_u8(0x7c, 0x2d, 0x12);
const FIRE: Color = Color::srgb_u8(0xff, 0x45, 0x00);
const FIRE_HOT: Color = Color::srgb_u8(0xff, 0xaa, 0x00);
const ENERGY: Color = Color::srgb_u8(0xfb, 0xbf, 0x24);
const LABEL_ACTIVE: Color = Color::srgb_u8(0xfc, 0xd3, 0x4d);
const LABEL_IDLE: Color = Color::srgba(0.984, 0.573, 0.235, 0.7);

/// Everything about the sigil that depends on whether the assistant is busy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigilLook {
    pub label: &'static str,
    pub sparkles: usize,
    pub sparkle_speed: f32,
    /// Edge length of the cube the sparkles drift in.
    pub sparkle_spread: f32,
    pub sparkle_size: f32,
    /// Hover frequency of the whole sigil.
    pub float_speed: f32,
    /// Peak yaw sway while hovering, radians.
    pub sway: f32,
}

pub fn sigil_look(processing: bool) -> SigilLook {
    if processing {
        SigilLook {
            label: "PROCESSING...",
            sparkles: MAX_SPARKLES,
            sparkle_speed: 2.0,
            sparkle_spread: 4.0,
            sparkle_size: 6.0,
            float_speed: 5.0,
            sway: 0.3,
        }
    } else {
        SigilLook {
            label: "Phoenix Protocol",
            sparkles: 60,
            sparkle_speed: 0.8,
            sparkle_spread: 3.0,
            sparkle_size: 4.0,
            float_speed: 2.0,
            sway: 0.1,
        }
    }
}

/// Emissive strength of the armor: eases toward the mode's base level and
/// rides a pulse on top of it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SigilGlow {
    pub intensity: f32,
}

impl Default for SigilGlow {
    fn default() -> Self {
        Self {
            intensity: IDLE_GLOW,
        }
    }
}

impl SigilGlow {
    pub fn advance(&mut self, processing: bool, elapsed: f32, dt: f32) -> f32 {
        let target = if processing { ACTIVE_GLOW } else { IDLE_GLOW };
        self.intensity = self.intensity.lerp(target, (dt * 3.0).min(1.0));
        let pulse = if processing {
            (elapsed * 20.0).sin() * 1.5 + 1.5
        } else {
            (elapsed * 0.8).sin() * 0.2
        };
        self.intensity + pulse
    }
}

/// `(scale, lift, tilt)` of the breathing body at `elapsed`.
pub fn breathing(elapsed: f32) -> (f32, f32, f32) {
    (
        1.0 + (elapsed * 2.0).sin() * 0.03,
        elapsed.sin() * 0.1,
        (elapsed * 0.5).sin() * 0.05,
    )
}

/// A sparkle seeded at `anchor` (unit cube around the origin) after rising
/// `drift` units; it wraps back to the bottom of its cube.
pub fn sparkle_position(anchor: Vec3, drift: f32, spread: f32) -> Vec3 {
    let rise = (anchor.y + 0.5 + drift * 0.1).rem_euclid(1.0) - 0.5;
    Vec3::new(anchor.x, rise, anchor.z) * spread
}

#[derive(Resource)]
struct SigilMaterials {
    armor: Handle<StandardMaterial>,
    fire: Handle<StandardMaterial>,
    energy: Handle<StandardMaterial>,
}

#[derive(Component)]
struct SigilCamera;

#[derive(Component)]
struct SigilLabel;

/// Hover phase, advanced at the look's float speed so speed changes never jump.
#[derive(Component, Default)]
struct SigilFloat {
    phase: f32,
}

#[derive(Component)]
struct SigilBody;

#[derive(Component, Default)]
struct SparkleField {
    drift: f32,
}

#[derive(Component)]
struct Sparkle {
    index: usize,
    anchor: Vec3,
}

fn spawn_sigil(
    mut commands: Commands,
    mut rng: ResMut<GlobeRng>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let layer = RenderLayers::layer(SIGIL_LAYER);

    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 6,
            clear_color: ClearColorConfig::None,
            is_active: false,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: 50f32.to_radians(),
            ..default()
        }),
        Transform::from_xyz(0.0, 0.0, 4.5).looking_at(Vec3::ZERO, Vec3::Y),
        layer.clone(),
        SigilCamera,
        GlobeScene,
        Name::new("Sigil Camera"),
    ));
    for (color, intensity, position) in [
        (ENERGY, 600_000.0, Vec3::new(5.0, 10.0, 5.0)),
        (FIRE, 200_000.0, Vec3::new(0.0, -2.0, 2.0)),
    ] {
        commands.spawn((
            PointLight {
                color,
                intensity,
                range: 20.0,
                ..default()
            },
            Transform::from_translation(position),
            layer.clone(),
            GlobeScene,
        ));
    }

    let palette = SigilMaterials {
        armor: materials.add(StandardMaterial {
            base_color: ARMOR,
            emissive: ARMOR_EMISSIVE.to_linear() * IDLE_GLOW,
            perceptual_roughness: 0.3,
            metallic: 1.0,
            clearcoat: 1.0,
            ..default()
        }),
        fire: materials.add(StandardMaterial {
            base_color: FIRE.with_alpha(0.9),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        }),
        energy: materials.add(StandardMaterial {
            base_color: ENERGY.with_alpha(0.6),
            alpha_mode: AlphaMode::Add,
            unlit: true,
            ..default()
        }),
    };
    let sparkle = materials.add(StandardMaterial {
        base_color: ENERGY.with_alpha(0.5),
        alpha_mode: AlphaMode::Add,
        unlit: true,
        ..default()
    });

    let armor = palette.armor.clone();
    let fire = palette.fire.clone();
    let energy = palette.energy.clone();
    let mut part = |mesh: Mesh, material: &Handle<StandardMaterial>, transform: Transform| {
        (
            Mesh3d(meshes.add(mesh)),
            MeshMaterial3d(material.clone()),
            transform,
            layer.clone(),
        )
    };

    let chest = part(
        Sphere::new(0.35).mesh().uv(4, 2),
        &armor,
        Transform::from_xyz(0.0, 0.1, 0.1),
    );
    let core = part(
        Sphere::new(0.15).mesh().uv(5, 3),
        &energy,
        Transform::from_xyz(0.0, 0.1, 0.3),
    );
    let neck = part(
        ConicalFrustum {
            radius_top: 0.1,
            radius_bottom: 0.25,
            height: 0.6,
        }
        .mesh()
        .resolution(6)
        .build(),
        &armor,
        Transform::from_xyz(0.0, 0.4, 0.0),
    );

    let head_pose = Transform::from_xyz(0.0, 0.8, 0.2).with_rotation(Quat::from_rotation_x(0.2));
    let cranium = part(
        Cone::new(0.18, 0.4).mesh().resolution(4).build(),
        &armor,
        Transform::IDENTITY,
    );
    let beak = part(
        Cone::new(0.08, 0.4).mesh().resolution(4).build(),
        &armor,
        Transform::from_xyz(0.0, -0.1, 0.2).with_rotation(Quat::from_rotation_x(-2.5)),
    );
    let eyes = [0.1f32, -0.1].map(|x| {
        part(
            Cuboid::new(0.05, 0.1, 0.15).into(),
            &energy,
            Transform::from_xyz(x, 0.0, 0.12).with_rotation(Quat::from_rotation_z(-2.0 * x)),
        )
    });
    let crest = [
        (Vec3::new(0.0, 0.15, -0.1), Vec3::new(-0.5, 0.0, 0.0), 0.6),
        (Vec3::new(0.1, 0.1, -0.05), Vec3::new(-0.4, 0.0, -0.4), 0.5),
        (Vec3::new(-0.1, 0.1, -0.05), Vec3::new(-0.4, 0.0, 0.4), 0.5),
    ]
    .map(|(at, euler, length)| {
        part(
            Cone::new(0.02, length).mesh().resolution(4).build(),
            &fire,
            Transform::from_translation(at)
                .with_rotation(Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)),
        )
    });

    let wings = [1.0f32, -1.0].map(|side| {
        let arm = part(
            Cuboid::new(1.4, 0.15, 0.1).into(),
            &armor,
            Transform::from_xyz(side * 0.6, 0.0, 0.0)
                .with_rotation(Quat::from_rotation_z(side * -0.2)),
        );
        let feathers: Vec<_> = (0..FEATHERS)
            .map(|i| {
                let i = i as f32;
                let blade = part(
                    Cone::new(0.06, 0.8 + i * 0.1).mesh().resolution(4).build(),
                    &armor,
                    Transform::from_xyz(0.0, -0.4, 0.0),
                );
                let tip = part(
                    Cone::new(0.04, 0.6).mesh().resolution(4).build(),
                    &fire,
                    Transform::from_xyz(0.0, -0.9 - i * 0.05, 0.0)
                        .with_rotation(Quat::from_rotation_x(PI)),
                );
                let pose = Transform::from_xyz(side * (0.2 + i * 0.15), -0.05, 0.0)
                    .with_rotation(Quat::from_rotation_z(side * (-0.3 - i * 0.15)));
                (pose, blade, tip)
            })
            .collect();
        let pose = Transform::from_xyz(side * 0.2, 0.5, 0.0)
            .with_rotation(Quat::from_rotation_z(side * 0.3));
        (pose, arm, feathers)
    });

    let tail_cone = part(
        Cone::new(0.15, 1.2).mesh().resolution(5).build(),
        &armor,
        Transform::from_xyz(0.0, -0.5, 0.0).with_rotation(Quat::from_rotation_x(3.0)),
    );
    let ribbons = [
        (Vec3::new(-0.2, -0.5, 0.0), Vec3::new(0.0, 2.0, 1.0), 1.2, 0.03, &energy),
        (Vec3::new(0.2, -0.8, 0.1), Vec3::new(0.0, -2.5, -1.0), 1.0, 0.04, &fire),
        (Vec3::new(0.0, -1.2, 0.0), Vec3::new(1.5, 0.0, 0.0), 0.6, 0.02, &energy),
    ]
    .map(|(at, euler, major, minor, material)| {
        part(
            Torus::new(major - minor, major + minor).into(),
            material,
            Transform::from_translation(at)
                .with_rotation(Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)),
        )
    });
    let sparkle_mesh = meshes.add(Sphere::new(1.0).mesh().uv(6, 4));

    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            SigilFloat::default(),
            layer.clone(),
            GlobeScene,
            Name::new("Phoenix Sigil"),
        ))
        .with_children(|sigil| {
            sigil
                .spawn((
                    Transform::from_rotation(Quat::from_rotation_y(-0.3)),
                    Visibility::default(),
                    SigilBody,
                    SigilGlow::default(),
                    layer.clone(),
                ))
                .with_children(|body| {
                    body.spawn(chest);
                    body.spawn(core);
                    body.spawn(neck);
                    body.spawn((head_pose, Visibility::default(), layer.clone()))
                        .with_children(|head| {
                            head.spawn(cranium);
                            head.spawn(beak);
                            for piece in eyes.into_iter().chain(crest) {
                                head.spawn(piece);
                            }
                        });
                    for (pose, arm, feathers) in wings {
                        body.spawn((pose, Visibility::default(), layer.clone()))
                            .with_children(|wing| {
                                wing.spawn(arm);
                                for (pose, blade, tip) in feathers {
                                    wing.spawn((pose, Visibility::default(), layer.clone()))
                                        .with_children(|feather| {
                                            feather.spawn(blade);
                                            feather.spawn(tip);
                                        });
                                }
                            });
                    }
                    body.spawn((
                        Transform::from_xyz(0.0, -0.5, -0.2),
                        Visibility::default(),
                        layer.clone(),
                    ))
                    .with_children(|tail| {
                        tail.spawn(tail_cone);
                        for ribbon in ribbons {
                            tail.spawn(ribbon);
                        }
                    });
                    body.spawn((
                        Transform::default(),
                        Visibility::default(),
                        SparkleField::default(),
                        layer.clone(),
                    ))
                    .with_children(|field| {
                        for index in 0..MAX_SPARKLES {
                            let anchor = Vec3::new(
                                rng.gen_range(-0.5..0.5),
                                rng.gen_range(-0.5..0.5),
                                rng.gen_range(-0.5..0.5),
                            );
                            field.spawn((
                                Mesh3d(sparkle_mesh.clone()),
                                MeshMaterial3d(sparkle.clone()),
                                Transform::from_translation(anchor),
                                Visibility::Hidden,
                                Sparkle { index, anchor },
                                layer.clone(),
                            ));
                        }
                    });
                });
        });

    commands.insert_resource(palette);
}

fn spawn_label(mut commands: Commands) {
    let look = sigil_look(false);
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(SIGIL_TOP + SIGIL_SIZE),
                right: Val::Px(SIGIL_RIGHT),
                width: Val::Px(SIGIL_SIZE),
                justify_content: JustifyContent::Center,
                ..default()
            },
            Pickable::IGNORE,
            GlobeScene,
            Name::new("Sigil Label"),
        ))
        .with_children(|frame| {
            frame.spawn((label(look.label, 9.0, LABEL_IDLE), SigilLabel, Pickable::IGNORE));
        });
}

/// Pins the sigil viewport to the upper-right corner; hides it on small windows.
fn fit_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut Camera, With<SigilCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let scale = window.scale_factor();
    let size = (SIGIL_SIZE * scale) as u32;
    let right = (SIGIL_RIGHT * scale) as u32;
    let top = (SIGIL_TOP * scale) as u32;
    let physical = window.physical_size();

    for mut camera in &mut cameras {
        let fits = size > 0 && physical.x >= size + right && physical.y >= size + top;
        camera.is_active = fits;
        camera.viewport = fits.then(|| Viewport {
            physical_position: UVec2::new(physical.x - size - right, top),
            physical_size: UVec2::splat(size),
            ..default()
        });
    }
}

fn refresh_label(
    chat: Res<ChatSession>,
    mut labels: Query<(&mut Text, &mut TextColor), With<SigilLabel>>,
) {
    let processing = chat.is_processing();
    let look = sigil_look(processing);
    for (mut text, mut color) in &mut labels {
        if text.0 != look.label {
            text.0 = look.label.to_string();
        }
        color.0 = if processing { LABEL_ACTIVE } else { LABEL_IDLE };
    }
}

fn animate_sigil(
    time: Res<Time>,
    chat: Res<ChatSession>,
    palette: Option<Res<SigilMaterials>>,
    mut floats: Query<(&mut SigilFloat, &mut Transform), Without<SigilBody>>,
    mut bodies: Query<(&mut SigilGlow, &mut Transform), With<SigilBody>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let processing = chat.is_processing();
    let look = sigil_look(processing);
    let elapsed = time.elapsed_secs();
    let dt = time.delta_secs();
    let (scale, lift, tilt) = breathing(elapsed);

    for (mut float, mut transform) in &mut floats {
        float.phase += dt * look.float_speed;
        transform.translation.y = float.phase.sin() * 0.05;
        transform.rotation = Quat::from_rotation_y((float.phase * 0.5).sin() * look.sway);
    }

    let mut emission = IDLE_GLOW;
    for (mut glow, mut transform) in &mut bodies {
        emission = glow.advance(processing, elapsed, dt);
        transform.scale = Vec3::splat(scale);
        transform.translation.y = lift;
        transform.rotation = Quat::from_euler(EulerRot::XYZ, 0.0, -0.3, tilt);
    }

    let Some(palette) = palette else {
        return;
    };
    if let Some(armor) = materials.get_mut(&palette.armor) {
        armor.emissive = ARMOR_EMISSIVE.to_linear() * emission;
    }
    if let Some(energy) = materials.get_mut(&palette.energy) {
        let alpha = if processing { 1.0 } else { 0.6 + (scale - 1.0) * 2.0 };
        energy.base_color = ENERGY.with_alpha(alpha);
    }
    if let Some(fire) = materials.get_mut(&palette.fire) {
        let color = if processing { FIRE_HOT } else { FIRE };
        fire.base_color = color.with_alpha(0.9);
    }
}

fn drift_sparkles(
    time: Res<Time>,
    chat: Res<ChatSession>,
    mut fields: Query<&mut SparkleField>,
    mut sparkles: Query<(&Sparkle, &mut Transform, &mut Visibility)>,
) {
    let look = sigil_look(chat.is_processing());
    let Ok(mut field) = fields.single_mut() else {
        return;
    };
    field.drift += time.delta_secs() * look.sparkle_speed;
    let size = look.sparkle_size * 0.004;

    for (sparkle, mut transform, mut visibility) in &mut sparkles {
        if sparkle.index >= look.sparkles {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        }
        visibility.set_if_neq(Visibility::Inherited);
        transform.translation = sparkle_position(sparkle.anchor, field.drift, look.sparkle_spread);
        transform.scale = Vec3::splat(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::camera::FocusRequest;
    use crate::globe::chat::{ChatPlugin, SendChat};
    use crate::globe::flash::FlashPlugin;
    use crate::globe::test_support::globe_app;

    #[test]
    fn busy_sigil_flares_up() {
        let idle = sigil_look(false);
        assert_eq!(idle.label, "Phoenix Protocol");
        assert_eq!((idle.sparkles, idle.sparkle_speed), (60, 0.8));
        assert_eq!(idle.float_speed, 2.0);

        let busy = sigil_look(true);
        assert_eq!(busy.label, "PROCESSING...");
        assert_eq!((busy.sparkles, busy.sparkle_speed), (MAX_SPARKLES, 2.0));
        assert_eq!(busy.float_speed, 5.0);
        assert!(busy.sparkle_spread > idle.sparkle_spread);
        assert!(busy.sway > idle.sway);
    }

    #[test]
    fn glow_eases_toward_the_busy_level() {
        let mut glow = SigilGlow::default();
        let first = glow.advance(true, 0.0, 0.1);
        assert!((glow.intensity - (IDLE_GLOW + (ACTIVE_GLOW - IDLE_GLOW) * 0.3)).abs() < 1e-5);
        assert!((first - (glow.intensity + 1.5)).abs() < 1e-5);

        for _ in 0..100 {
            glow.advance(true, 0.0, 0.1);
        }
        assert!((glow.intensity - ACTIVE_GLOW).abs() < 1e-3);

        let idle = glow.advance(false, 0.0, 1.0);
        assert_eq!(glow.intensity, IDLE_GLOW);
        assert_eq!(idle, IDLE_GLOW);
    }

    #[test]
    fn sparkles_rise_and_wrap_inside_their_cube() {
        let anchor = Vec3::new(0.25, 0.4, -0.1);
        let start = sparkle_position(anchor, 0.0, 2.0);
        assert!((start - anchor * 2.0).length() < 1e-5);

        let risen = sparkle_position(anchor, 0.5, 2.0);
        assert!((risen.y - 0.9).abs() < 1e-5);
        let wrapped = sparkle_position(anchor, 2.0, 2.0);
        assert!((wrapped.y + 0.8).abs() < 1e-5);
        assert_eq!((wrapped.x, wrapped.z), (0.5, -0.2));

        for drift in [0.0, 3.3, 17.0, 250.0] {
            let p = sparkle_position(anchor, drift, 4.0);
            assert!((-2.0..2.0).contains(&p.y), "{p} left the cube");
        }
    }

    #[test]
    fn breathing_stays_subtle() {
        for t in [0.0, 0.7, 3.1, 42.0] {
            let (scale, lift, tilt) = breathing(t);
            assert!((scale - 1.0).abs() <= 0.03);
            assert!(lift.abs() <= 0.1);
            assert!(tilt.abs() <= 0.05);
        }
    }

    fn sigil_app() -> App {
        let mut app = globe_app();
        app.add_plugins((FlashPlugin, ChatPlugin, SigilPlugin))
            .init_resource::<FocusRequest>()
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>();
        app.update();
        app
    }

    fn label_text(app: &mut App) -> String {
        let mut labels = app.world_mut().query_filtered::<&Text, With<SigilLabel>>();
        labels.single(app.world()).expect("sigil label").0.clone()
    }

    fn shown_sparkles(app: &mut App) -> usize {
        let mut sparkles = app.world_mut().query::<(&Sparkle, &Visibility)>();
        sparkles
            .iter(app.world())
            .filter(|(_, visibility)| **visibility != Visibility::Hidden)
            .count()
    }

    #[test]
    fn label_reads_processing_while_a_command_is_pending() {
        let mut app = sigil_app();
        app.update();
        assert_eq!(label_text(&mut app), "Phoenix Protocol");
        assert_eq!(shown_sparkles(&mut app), 60);

        app.world_mut().resource_mut::<ChatSession>().input = "Show Europe".into();
        app.world_mut().write_message(SendChat);
        app.update();
        app.update();
        assert!(app.world().resource::<ChatSession>().is_processing());
        assert_eq!(label_text(&mut app), "PROCESSING...");
        assert_eq!(shown_sparkles(&mut app), MAX_SPARKLES);

        for _ in 0..15 {
            app.update();
        }
        assert!(!app.world().resource::<ChatSession>().is_processing());
        assert_eq!(label_text(&mut app), "Phoenix Protocol");
        assert_eq!(shown_sparkles(&mut app), 60);
    }
}
