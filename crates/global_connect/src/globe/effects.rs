//! Decorative scene pieces: scanner ring, energy prism and atmosphere glow.

use super::earth::{EarthRoot, earth_rotation};
use super::mode::{AlternateMode, ImpactPulse};
use super::{GlobeScene, GlobeSetup};
use crate::AppScreen;
use crate::utils::remove;
use bevy::prelude::*;
use bevy::render::render_resource::Face;
use std::f32::consts::{FRAC_PI_2, TAU};

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppScreen::Globe),
            spawn_effects.in_set(GlobeSetup::Surface),
        )
        .add_systems(
            Update,
            (draw_scanner, animate_prism, ease_atmosphere).run_if(in_state(AppScreen::Globe)),
        )
        .add_systems(
            OnExit(AppScreen::Globe),
            (remove::<PrismSpirals>, remove::<AtmosphereTint>),
        );
    }
}

const SCANNER_SPAN: f32 = 5.2;
const SCANNER_RADIUS: f32 = 5.08;
const PRISM_BOTTOM: f32 = -9.0;
const PRISM_TOP: f32 = -1.5;
const PRISM_WAVE_POINTS: usize = 51;
const ATMOSPHERE_RADIUS: f32 = 6.2;
const ATMOSPHERE_EASE: f32 = 0.05;

const CYAN: Color = Color::srgb(0.133, 0.827, 0.933);
const AMBER: Color = Color::srgb(0.984, 0.749, 0.141);
const ORANGE: Color = Color::srgb(0.976, 0.451, 0.086);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannerRing {
    pub y: f32,
    pub radius: f32,
    pub opacity: f32,
}

/// Horizontal ring sweeping up and down the globe, clipped to its surface.
pub fn scanner_ring(elapsed: f32) -> ScannerRing {
    let y = (elapsed * 0.4).sin() * SCANNER_SPAN;
    let radius = (SCANNER_RADIUS * SCANNER_RADIUS - y * y).max(0.0).sqrt();
    let pulse = 0.6 + (elapsed * 8.0).sin() * 0.4;
    let opacity = (1.0 - y.abs() / SCANNER_SPAN).max(0.0) * pulse;
    ScannerRing { y, radius, opacity }
}

/// Jittering lightning path from below the globe up into its core.
pub fn prism_core_wave(elapsed: f32, impact: f32) -> Vec<Vec3> {
    let t8 = elapsed * 8.0;
    (0..PRISM_WAVE_POINTS)
        .map(|i| {
            let u = i as f32 / (PRISM_WAVE_POINTS - 1) as f32;
            let y = PRISM_BOTTOM + (PRISM_TOP - PRISM_BOTTOM) * u;
            let amp = (1.0 - u) * 0.2 * (1.0 + impact * 2.0);
            let noise = (y * 10.0 + t8).sin() * 0.5 + (y * 23.0 - t8 * 2.0).sin() * 0.5;
            Vec3::new(noise * amp, y, (y * 15.0 + t8).cos() * amp)
        })
        .collect()
}

/// Three cone spirals threading the prism, wide at the bottom.
pub fn prism_spirals() -> [Vec<Vec3>; 3] {
    const SEGMENTS: usize = 80;
    const TURNS: f32 = 4.0;
    std::array::from_fn(|strand| {
        let phase = strand as f32 / 3.0 * TAU;
        (0..=SEGMENTS)
            .map(|i| {
                let t = i as f32 / SEGMENTS as f32;
                let y = PRISM_BOTTOM + (-1.8 - PRISM_BOTTOM) * t;
                let radius = 1.8 + (0.1 - 1.8) * t;
                let angle = t * TAU * TURNS + phase;
                Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
            })
            .collect()
    })
}

/// Spin and radial swell of the prism group.
pub fn prism_transform(elapsed: f32, impact: f32) -> Transform {
    let swell = 1.0 + impact * 0.3;
    Transform::from_rotation(Quat::from_rotation_y(-elapsed * 1.5))
        .with_scale(Vec3::new(swell, 1.0, swell))
}

pub fn atmosphere_target(alternate: bool) -> Vec3 {
    if alternate {
        Vec3::new(1.0, 0.2, 0.0)
    } else {
        Vec3::new(0.9, 0.8, 0.5)
    }
}

#[derive(Resource)]
struct PrismSpirals([Vec<Vec3>; 3]);

#[derive(Resource)]
struct AtmosphereTint {
    color: Vec3,
    material: Handle<StandardMaterial>,
}

#[derive(Component)]
struct PrismShell {
    material: Handle<StandardMaterial>,
    color: Vec3,
}

fn spawn_effects(
    mut commands: Commands,
    earth: Query<Entity, With<EarthRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let shell_color = CYAN.to_srgba();
    let shell_material = materials.add(StandardMaterial {
        base_color: CYAN.with_alpha(0.15),
        alpha_mode: AlphaMode::Add,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });
    let atmosphere = atmosphere_target(false);
    let atmosphere_material = materials.add(StandardMaterial {
        base_color: Color::srgba(atmosphere.x, atmosphere.y, atmosphere.z, 0.12),
        alpha_mode: AlphaMode::Add,
        unlit: true,
        cull_mode: Some(Face::Front),
        ..default()
    });

    if let Ok(earth) = earth.single() {
        commands.entity(earth).with_children(|earth| {
            earth.spawn((
                Mesh3d(meshes.add(ConicalFrustum {
                    radius_top: 0.05,
                    radius_bottom: 1.2,
                    height: 7.5,
                })),
                MeshMaterial3d(shell_material.clone()),
                Transform::from_xyz(0.0, -5.25, 0.0),
                Pickable::IGNORE,
                PrismShell {
                    material: shell_material,
                    color: Vec3::new(shell_color.red, shell_color.green, shell_color.blue),
                },
                Name::new("Prism Shell"),
            ));
        });
    }

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(ATMOSPHERE_RADIUS).mesh().uv(64, 64))),
        MeshMaterial3d(atmosphere_material.clone()),
        Pickable::IGNORE,
        GlobeScene,
        Name::new("Atmosphere"),
    ));

    commands.insert_resource(PrismSpirals(prism_spirals()));
    commands.insert_resource(AtmosphereTint {
        color: atmosphere,
        material: atmosphere_material,
    });
}

fn draw_scanner(mut gizmos: Gizmos, time: Res<Time>, mode: Res<AlternateMode>) {
    let ring = scanner_ring(time.elapsed_secs());
    if ring.opacity <= 0.0 || ring.radius <= 0.0 {
        return;
    }
    let base = if mode.active() { ORANGE } else { CYAN };
    let tilt = earth_rotation();
    gizmos
        .circle(
            Isometry3d::new(
                tilt * Vec3::new(0.0, ring.y, 0.0),
                tilt * Quat::from_rotation_x(FRAC_PI_2),
            ),
            ring.radius,
            base.with_alpha(ring.opacity),
        )
        .resolution(64);
}

fn animate_prism(
    mut gizmos: Gizmos,
    time: Res<Time>,
    mode: Res<AlternateMode>,
    impact: Res<ImpactPulse>,
    spirals: Option<Res<PrismSpirals>>,
    mut shells: Query<(&mut PrismShell, &mut Transform)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let elapsed = time.elapsed_secs();
    let impact = impact.0;
    let group = prism_transform(elapsed, impact);
    let tilt = earth_rotation();
    let place = |p: Vec3| tilt * group.transform_point(p);

    let core = if mode.active() {
        Color::WHITE
    } else {
        Color::srgb(0.878, 0.949, 0.996)
    };
    gizmos.linestrip(
        prism_core_wave(elapsed, impact).into_iter().map(place),
        core.with_alpha((0.9 + impact).min(1.0)),
    );

    let strand = if mode.active() { AMBER } else { CYAN };
    if let Some(spirals) = spirals {
        let alpha = if mode.active() { 0.9 } else { 0.7 };
        for spiral in &spirals.0 {
            gizmos.linestrip(spiral.iter().copied().map(place), strand.with_alpha(alpha));
        }
    }

    let target = strand.to_srgba();
    let target = Vec3::new(target.red, target.green, target.blue);
    let rate = (time.delta_secs() * 2.0).min(1.0);
    for (mut shell, mut transform) in &mut shells {
        shell.color = shell.color.lerp(target, rate);
        transform.rotation = group.rotation;
        transform.scale = group.scale;
        transform.translation = group.rotation * Vec3::new(0.0, -5.25, 0.0);
        if let Some(material) = materials.get_mut(&shell.material) {
            let flash = Vec3::splat(impact);
            let color = (shell.color + flash).min(Vec3::ONE);
            material.base_color = Color::srgba(color.x, color.y, color.z, 0.15 + impact * 0.5);
        }
    }
}

fn ease_atmosphere(
    mode: Res<AlternateMode>,
    tint: Option<ResMut<AtmosphereTint>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(mut tint) = tint else {
        return;
    };
    let target = atmosphere_target(mode.active());
    if tint.color.distance_squared(target) < 1e-6 {
        return;
    }
    tint.color = tint.color.lerp(target, ATMOSPHERE_EASE);
    if let Some(material) = materials.get_mut(&tint.material) {
        material.base_color = Color::srgba(tint.color.x, tint.color.y, tint.color.z, 0.12);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_starts_at_the_equator() {
        let ring = scanner_ring(0.0);
        assert_eq!(ring.y, 0.0);
        assert!((ring.radius - SCANNER_RADIUS).abs() < 1e-5);
        assert!((ring.opacity - 0.6).abs() < 1e-5);
    }

    #[test]
    fn scanner_vanishes_at_the_poles() {
        let at_pole = FRAC_PI_2 / 0.4;
        let ring = scanner_ring(at_pole);
        assert!((ring.y - SCANNER_SPAN).abs() < 1e-3);
        assert_eq!(ring.radius, 0.0);
        assert!(ring.opacity < 1e-3);
    }

    #[test]
    fn core_wave_spans_the_prism_and_calms_near_the_top() {
        let wave = prism_core_wave(1.3, 0.0);
        assert_eq!(wave.len(), PRISM_WAVE_POINTS);
        assert_eq!(wave[0].y, PRISM_BOTTOM);
        assert!((wave[50].y - PRISM_TOP).abs() < 1e-5);
        assert!(wave[50].x.abs() < 1e-6 && wave[50].z.abs() < 1e-6);
        assert!(wave.iter().all(|p| p.x.abs() <= 0.2 + 1e-6));
    }

    #[test]
    fn impact_widens_the_wave() {
        let calm = prism_core_wave(0.7, 0.0);
        let struck = prism_core_wave(0.7, 1.0);
        assert!((struck[10].z - calm[10].z * 3.0).abs() < 1e-5);
    }

    #[test]
    fn spirals_narrow_toward_the_top() {
        for spiral in prism_spirals() {
            assert_eq!(spiral.len(), 81);
            let bottom = Vec2::new(spiral[0].x, spiral[0].z).length();
            let top = Vec2::new(spiral[80].x, spiral[80].z).length();
            assert!((bottom - 1.8).abs() < 1e-4);
            assert!((top - 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn prism_swells_on_impact() {
        let transform = prism_transform(0.0, 1.0);
        assert!((transform.scale - Vec3::new(1.3, 1.0, 1.3)).length() < 1e-6);
    }
}
