//! One pickable marker per location record.

use super::camera::FocusRequest;
use super::earth::EarthRoot;
use super::mode::AlternateMode;
use super::{GLOBE_RADIUS, GlobeSetup};
use crate::AppScreen;
use crate::geo::lat_lon_to_vec3;
use crate::locations::{LOCATIONS, Selection};
use crate::utils::remove;
use app::LOG_GLOBE;
use bevy::prelude::*;

pub struct MarkerPlugin;

impl Plugin for MarkerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoveredMarker>()
            .add_systems(
                OnEnter(AppScreen::Globe),
                spawn_markers.in_set(GlobeSetup::Surface),
            )
            .add_systems(
                Update,
                (
                    animate_markers,
                    tint_markers.run_if(
                        resource_changed::<Selection>.or(resource_changed::<AlternateMode>),
                    ),
                )
                    .run_if(in_state(AppScreen::Globe)),
            )
            .add_systems(
                OnExit(AppScreen::Globe),
                (remove::<MarkerMaterials>, clear_hover),
            );
    }
}

const SCALE_EASE: f32 = 0.1;
const SELECTED_LIFT: f32 = 0.2;

/// Record index under the pointer, if any.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HoveredMarker(pub Option<usize>);

#[derive(Component, Debug)]
pub struct Marker {
    pub index: usize,
    /// Unit direction from the globe center.
    direction: Vec3,
    scale: f32,
}

#[derive(Component, Clone, Copy)]
enum MarkerPart {
    Head { index: usize },
    Bar { index: usize },
}

impl MarkerPart {
    fn index(self) -> usize {
        match self {
            MarkerPart::Head { index } | MarkerPart::Bar { index } => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTint {
    Normal,
    Alternate,
    Selected,
}

impl MarkerTint {
    pub fn of(selected: bool, alternate: bool) -> Self {
        match (selected, alternate) {
            (true, _) => MarkerTint::Selected,
            (false, true) => MarkerTint::Alternate,
            (false, false) => MarkerTint::Normal,
        }
    }

    fn color(self) -> Color {
        match self {
            MarkerTint::Normal => Color::srgb_u8(0xfb, 0xbf, 0x24),
            MarkerTint::Alternate => Color::srgb_u8(0xef, 0x44, 0x44),
            MarkerTint::Selected => Color::WHITE,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Resource)]
struct MarkerMaterials {
    heads: [Handle<StandardMaterial>; 3],
    bars: [Handle<StandardMaterial>; 3],
}

/// Distance from the globe center; staggered per record to avoid z-fighting.
pub fn marker_radius(index: usize) -> f32 {
    GLOBE_RADIUS + 0.02 + index as f32 * 0.005
}

pub fn bar_height(influence_score: u8) -> f32 {
    f32::from(influence_score) / 100.0 * 1.5 + 0.2
}

pub fn target_scale(
    hovered: bool,
    selected: bool,
    alternate: bool,
    elapsed: f32,
    index: usize,
) -> f32 {
    let base = match (selected, hovered) {
        (true, _) => 2.2,
        (false, true) => 1.8,
        (false, false) => 1.0,
    };
    if alternate {
        base * (1.0 + (elapsed * 4.0 + index as f32).sin() * 0.2)
    } else {
        base
    }
}

fn spawn_markers(
    mut commands: Commands,
    earth: Query<Entity, With<EarthRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok(earth) = earth.single() else {
        warn!(target: LOG_GLOBE, "No earth to pin markers on");
        return;
    };

    let tints = [MarkerTint::Normal, MarkerTint::Alternate, MarkerTint::Selected];
    let heads = tints.map(|tint| {
        materials.add(StandardMaterial {
            base_color: tint.color().with_alpha(0.9),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        })
    });
    let bars = tints.map(|tint| {
        materials.add(StandardMaterial {
            base_color: tint.color().with_alpha(0.6),
            alpha_mode: AlphaMode::Add,
            unlit: true,
            ..default()
        })
    });
    let head_mesh = meshes.add(Sphere::new(0.04).mesh().uv(8, 8));

    commands.entity(earth).with_children(|earth| {
        for (index, record) in LOCATIONS.iter().enumerate() {
            let direction = lat_lon_to_vec3(record.lat, record.lon, 1.0);
            let height = bar_height(record.influence_score);
            let bar_mesh = meshes.add(ConicalFrustum {
                radius_top: 0.01,
                radius_bottom: 0.002,
                height,
            });

            earth
                .spawn((
                    Transform::from_translation(direction * marker_radius(index))
                        .looking_at(Vec3::ZERO, Vec3::Y),
                    Visibility::default(),
                    Marker {
                        index,
                        direction,
                        scale: 1.0,
                    },
                    Name::new(format!("Marker {}", record.name)),
                ))
                .with_children(|marker| {
                    marker
                        .spawn((
                            Mesh3d(head_mesh.clone()),
                            MeshMaterial3d(heads[0].clone()),
                            Transform::from_xyz(0.0, 0.0, -0.05),
                            Pickable::default(),
                            MarkerPart::Head { index },
                        ))
                        .observe(on_marker_over)
                        .observe(on_marker_out)
                        .observe(on_marker_click);
                    marker
                        .spawn((
                            Mesh3d(bar_mesh),
                            MeshMaterial3d(bars[0].clone()),
                            Transform::from_xyz(0.0, 0.0, height / 2.0)
                                .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
                            Pickable::default(),
                            MarkerPart::Bar { index },
                        ))
                        .observe(on_marker_over)
                        .observe(on_marker_out)
                        .observe(on_marker_click);
                });
        }
    });

    commands.insert_resource(MarkerMaterials { heads, bars });
    info!(target: LOG_GLOBE, "{} markers placed", LOCATIONS.len());
}

fn on_marker_over(
    mut event: On<Pointer<Over>>,
    parts: Query<&MarkerPart>,
    mut hovered: ResMut<HoveredMarker>,
) {
    event.propagate(false);
    if let Ok(part) = parts.get(event.event().event_target()) {
        hovered.0 = Some(part.index());
    }
}

fn on_marker_out(
    mut event: On<Pointer<Out>>,
    parts: Query<&MarkerPart>,
    mut hovered: ResMut<HoveredMarker>,
) {
    event.propagate(false);
    if let Ok(part) = parts.get(event.event().event_target()) {
        if hovered.0 == Some(part.index()) {
            hovered.0 = None;
        }
    }
}

fn on_marker_click(
    mut event: On<Pointer<Click>>,
    parts: Query<&MarkerPart>,
    mut selection: ResMut<Selection>,
    mut focus: ResMut<FocusRequest>,
) {
    event.propagate(false);
    let Ok(part) = parts.get(event.event().event_target()) else {
        return;
    };
    select_record(part.index(), &mut selection, &mut focus);
}

/// Selects a record and drops any pending camera focus.
pub fn select_record(index: usize, selection: &mut Selection, focus: &mut FocusRequest) {
    selection.0 = Some(index);
    focus.0 = None;
    if let Some(record) = selection.record() {
        info!(target: LOG_GLOBE, "Selected {} ({})", record.name, record.place());
    }
}

fn clear_hover(mut hovered: ResMut<HoveredMarker>) {
    hovered.0 = None;
}

fn animate_markers(
    time: Res<Time>,
    selection: Res<Selection>,
    hovered: Res<HoveredMarker>,
    mode: Res<AlternateMode>,
    mut markers: Query<(&mut Marker, &mut Transform)>,
) {
    let elapsed = time.elapsed_secs();
    for (mut marker, mut transform) in &mut markers {
        let selected = selection.is(marker.index);
        let target = target_scale(
            hovered.0 == Some(marker.index),
            selected,
            mode.active(),
            elapsed,
            marker.index,
        );
        marker.scale += (target - marker.scale) * SCALE_EASE;

        let lift = if selected { SELECTED_LIFT } else { 0.0 };
        transform.translation = marker.direction * (marker_radius(marker.index) + lift);
        transform.scale = Vec3::splat(marker.scale);
    }
}

fn tint_markers(
    selection: Res<Selection>,
    mode: Res<AlternateMode>,
    materials: Option<Res<MarkerMaterials>>,
    mut parts: Query<(&MarkerPart, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let Some(materials) = materials else {
        return;
    };
    for (part, mut material) in &mut parts {
        let slot = MarkerTint::of(selection.is(part.index()), mode.active()).slot();
        let handle = match part {
            MarkerPart::Head { .. } => &materials.heads[slot],
            MarkerPart::Bar { .. } => &materials.bars[slot],
        };
        if material.0 != *handle {
            material.0 = handle.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_staggered_above_the_surface() {
        assert!((marker_radius(0) - 5.02).abs() < 1e-6);
        assert!((marker_radius(10) - 5.07).abs() < 1e-5);
    }

    #[test]
    fn bar_height_tracks_influence() {
        assert!((bar_height(0) - 0.2).abs() < 1e-6);
        assert!((bar_height(100) - 1.7).abs() < 1e-6);
    }

    #[test]
    fn selection_outranks_hover() {
        assert_eq!(target_scale(false, false, false, 0.0, 3), 1.0);
        assert_eq!(target_scale(true, false, false, 0.0, 3), 1.8);
        assert_eq!(target_scale(true, true, false, 0.0, 3), 2.2);
    }

    #[test]
    fn alternate_mode_pulses_each_marker_out_of_phase() {
        let a = target_scale(false, false, true, 0.0, 0);
        let b = target_scale(false, false, true, 0.0, 1);
        assert_eq!(a, 1.0);
        assert!((b - (1.0 + 1f32.sin() * 0.2)).abs() < 1e-6);
    }

    #[test]
    fn tint_prefers_selection() {
        assert_eq!(MarkerTint::of(true, true), MarkerTint::Selected);
        assert_eq!(MarkerTint::of(false, true), MarkerTint::Alternate);
        assert_eq!(MarkerTint::of(false, false), MarkerTint::Normal);
    }

    #[test]
    fn selecting_clears_focus() {
        let mut selection = Selection::default();
        let mut focus = FocusRequest(Some(Vec3::ONE));
        select_record(17, &mut selection, &mut focus);
        assert_eq!(selection.0, Some(17));
        assert_eq!(focus.0, None);
    }
}
