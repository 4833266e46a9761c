//! Arcs fanning out from the selected record, or from the hub in alternate mode.

use super::earth::{EarthRoot, earth_rotation};
use super::{GLOBE_RADIUS, GlobeRng};
use super::mode::AlternateMode;
use crate::AppScreen;
use crate::geo::{arc_control_point, arc_points, lat_lon_to_vec3, quadratic_bezier};
use crate::locations::{ALTERNATE_HUB, LOCATIONS, Selection};
use crate::utils::remove;
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::PI;

pub struct ConnectionsPlugin;

impl Plugin for ConnectionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<ConnectionGizmos>()
            .init_resource::<ActiveConnections>()
            .init_resource::<GlobeRng>()
            .add_systems(
                Update,
                (
                    rebuild_connections.run_if(
                        resource_changed::<Selection>.or(resource_changed::<AlternateMode>),
                    ),
                    flow_particles,
                    draw_arcs,
                )
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            )
            .add_systems(
                OnExit(AppScreen::Globe),
                (reset_connections, remove::<FlowAssets>),
            );
    }
}

const ARC_SEGMENTS: usize = 30;
const FLOW_SPEED: f32 = 0.5;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct ConnectionGizmos;

#[derive(Debug, Clone)]
pub struct ConnectionArc {
    pub target: usize,
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
    pub points: Vec<Vec3>,
}

#[derive(Resource, Debug, Default)]
pub struct ActiveConnections {
    pub source: Option<usize>,
    pub alternate: bool,
    pub arcs: Vec<ConnectionArc>,
}

#[derive(Resource)]
struct FlowAssets {
    mesh: Handle<Mesh>,
    normal: Handle<StandardMaterial>,
    alternate: Handle<StandardMaterial>,
}

#[derive(Component)]
struct FlowParticle {
    arc: usize,
    progress: f32,
}

/// Record the arcs start from: the selection, else the hub in alternate mode.
pub fn connection_source(selection: Option<usize>, alternate: bool) -> Option<usize> {
    selection.or(alternate.then_some(ALTERNATE_HUB))
}

/// Alternate mode links the source to every record, itself included.
pub fn connection_targets(source: usize, alternate: bool) -> Vec<usize> {
    (0..LOCATIONS.len())
        .filter(|&index| alternate || index != source)
        .collect()
}

/// In alternate mode only every second arc carries a particle.
pub fn carries_particle(arc: usize, alternate: bool) -> bool {
    arc % if alternate { 2 } else { 1 } == 0
}

/// Progress along an arc after `dt` seconds, restarting past the end.
pub fn advance_flow(progress: f32, dt: f32) -> f32 {
    let next = progress + dt * FLOW_SPEED;
    if next > 1.0 { 0.0 } else { next }
}

pub fn flow_scale(progress: f32) -> f32 {
    (progress * PI).sin() * 0.25
}

fn build_arcs(source: usize, alternate: bool) -> Vec<ConnectionArc> {
    let place = |index: usize| {
        let record = &LOCATIONS[index];
        lat_lon_to_vec3(record.lat, record.lon, GLOBE_RADIUS)
    };
    let start = place(source);
    connection_targets(source, alternate)
        .into_iter()
        .map(|target| {
            let end = place(target);
            ConnectionArc {
                target,
                start,
                control: arc_control_point(start, end, GLOBE_RADIUS),
                end,
                points: arc_points(start, end, GLOBE_RADIUS, ARC_SEGMENTS),
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn rebuild_connections(
    mut commands: Commands,
    selection: Res<Selection>,
    mode: Res<AlternateMode>,
    mut connections: ResMut<ActiveConnections>,
    mut rng: ResMut<GlobeRng>,
    mut config_store: ResMut<GizmoConfigStore>,
    assets: Option<Res<FlowAssets>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    particles: Query<Entity, With<FlowParticle>>,
    earth: Query<Entity, With<EarthRoot>>,
) {
    let alternate = mode.active();
    let source = connection_source(selection.0, alternate);

    let (config, _) = config_store.config_mut::<ConnectionGizmos>();
    config.line.width = if alternate { 2.0 } else { 1.0 };

    for particle in &particles {
        commands.entity(particle).despawn();
    }

    connections.source = source;
    connections.alternate = alternate;
    connections.arcs = source.map(|s| build_arcs(s, alternate)).unwrap_or_default();

    let Ok(earth) = earth.single() else {
        return;
    };
    let (mesh, material) = match assets {
        Some(assets) => (
            assets.mesh.clone(),
            if alternate { assets.alternate.clone() } else { assets.normal.clone() },
        ),
        None => {
            let flow = |color: Color| StandardMaterial {
                base_color: color.with_alpha(0.95),
                alpha_mode: AlphaMode::Add,
                unlit: true,
                ..default()
            };
            let assets = FlowAssets {
                mesh: meshes.add(Sphere::new(1.0).mesh().uv(8, 8)),
                normal: materials.add(flow(Color::srgb_u8(0xfb, 0xbf, 0x24))),
                alternate: materials.add(flow(Color::WHITE)),
            };
            let picked = (
                assets.mesh.clone(),
                if alternate { assets.alternate.clone() } else { assets.normal.clone() },
            );
            commands.insert_resource(assets);
            picked
        }
    };

    commands.entity(earth).with_children(|earth| {
        for (arc, _) in connections.arcs.iter().enumerate() {
            if !carries_particle(arc, alternate) {
                continue;
            }
            earth.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_scale(Vec3::ZERO),
                Pickable::IGNORE,
                FlowParticle {
                    arc,
                    progress: rng.gen_range(0.0..1.0),
                },
            ));
        }
    });
}

fn reset_connections(mut connections: ResMut<ActiveConnections>) {
    *connections = ActiveConnections::default();
}

fn flow_particles(
    time: Res<Time>,
    connections: Res<ActiveConnections>,
    mut particles: Query<(&mut FlowParticle, &mut Transform)>,
) {
    let dt = time.delta_secs();
    for (mut particle, mut transform) in &mut particles {
        let Some(arc) = connections.arcs.get(particle.arc) else {
            continue;
        };
        particle.progress = advance_flow(particle.progress, dt);
        transform.translation =
            quadratic_bezier(arc.start, arc.control, arc.end, particle.progress);
        transform.scale = Vec3::splat(flow_scale(particle.progress));
    }
}

fn draw_arcs(mut gizmos: Gizmos<ConnectionGizmos>, connections: Res<ActiveConnections>) {
    let color = if connections.alternate {
        Color::srgb_u8(0xef, 0x44, 0x44).with_alpha(0.6)
    } else {
        Color::srgb_u8(0xd9, 0x77, 0x06).with_alpha(0.3)
    };
    let tilt = earth_rotation();
    for arc in &connections.arcs {
        gizmos.linestrip(arc.points.iter().map(|p| tilt * *p), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_wins_over_the_hub() {
        assert_eq!(connection_source(Some(3), true), Some(3));
        assert_eq!(connection_source(None, true), Some(ALTERNATE_HUB));
        assert_eq!(connection_source(None, false), None);
    }

    #[test]
    fn targets_skip_the_source_outside_alternate_mode() {
        let normal = connection_targets(5, false);
        assert_eq!(normal.len(), LOCATIONS.len() - 1);
        assert!(!normal.contains(&5));

        let alternate = connection_targets(5, true);
        assert_eq!(alternate.len(), LOCATIONS.len());
    }

    #[test]
    fn alternate_mode_thins_out_particles() {
        assert!((0..6).all(|arc| carries_particle(arc, false)));
        assert_eq!((0..6).filter(|&arc| carries_particle(arc, true)).count(), 3);
    }

    #[test]
    fn flow_wraps_past_the_end() {
        assert!((advance_flow(0.2, 0.1) - 0.25).abs() < 1e-6);
        assert_eq!(advance_flow(0.99, 0.1), 0.0);
        assert_eq!(flow_scale(0.0), 0.0);
        assert!((flow_scale(0.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn arcs_leave_the_source_and_land_on_targets() {
        let arcs = build_arcs(0, false);
        let first = &arcs[0];
        assert_eq!(first.points.len(), ARC_SEGMENTS + 1);
        assert!(first.points[0].distance(first.start) < 1e-4);
        assert!(first.points[ARC_SEGMENTS].distance(first.end) < 1e-4);
    }
}
