//! The globe body: textured surface, night lights and a coordinate grid.

use super::mode::AlternateMode;
use super::{EARTH_TILT, GLOBE_RADIUS, GlobeScene, GlobeSetup};
use crate::AppScreen;
use crate::utils::remove;
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

pub struct EarthPlugin;

impl Plugin for EarthPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppScreen::Globe), spawn_earth.in_set(GlobeSetup::Earth))
            .add_systems(
                Update,
                (
                    tint_earth.run_if(resource_changed::<AlternateMode>),
                    draw_grid,
                )
                    .run_if(in_state(AppScreen::Globe)),
            )
            .add_systems(OnExit(AppScreen::Globe), remove::<EarthMaterials>);
    }
}

/// Parent of everything pinned to the surface; carries the axial tilt.
#[derive(Component)]
pub struct EarthRoot;

#[derive(Resource)]
struct EarthMaterials {
    surface: Handle<StandardMaterial>,
    lights: Handle<StandardMaterial>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthPalette {
    pub surface: Color,
    pub lights: Color,
    pub grid: Color,
}

impl EarthPalette {
    pub fn for_mode(alternate: bool) -> Self {
        if alternate {
            Self {
                surface: Color::srgb_u8(0x45, 0x0a, 0x0a),
                lights: Color::srgb_u8(0xef, 0x44, 0x44),
                grid: Color::srgb_u8(0xf9, 0x73, 0x16).with_alpha(0.15),
            }
        } else {
            Self {
                surface: Color::srgb_u8(0x3b, 0x07, 0x64),
                lights: Color::srgb_u8(0xfb, 0xbf, 0x24),
                grid: Color::srgb_u8(0xfc, 0xd3, 0x4d).with_alpha(0.05),
            }
        }
    }
}

pub fn earth_rotation() -> Quat {
    Quat::from_rotation_z(EARTH_TILT)
}

fn spawn_earth(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let palette = EarthPalette::for_mode(false);
    let surface = materials.add(StandardMaterial {
        base_color: palette.surface.with_alpha(0.95),
        base_color_texture: Some(asset_server.load("textures/earth_atmos.png")),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    let lights = materials.add(StandardMaterial {
        base_color: palette.lights.with_alpha(0.9),
        base_color_texture: Some(asset_server.load("textures/earth_lights.png")),
        alpha_mode: AlphaMode::Add,
        unlit: true,
        ..default()
    });

    commands
        .spawn((
            Transform::from_rotation(earth_rotation()),
            Visibility::default(),
            EarthRoot,
            GlobeScene,
            Name::new("Earth"),
        ))
        .with_children(|earth| {
            earth.spawn((
                Mesh3d(meshes.add(Sphere::new(GLOBE_RADIUS).mesh().uv(64, 64))),
                MeshMaterial3d(surface.clone()),
                Name::new("Earth Surface"),
            ));
            earth.spawn((
                Mesh3d(meshes.add(Sphere::new(GLOBE_RADIUS + 0.01).mesh().uv(64, 64))),
                MeshMaterial3d(lights.clone()),
                Pickable::IGNORE,
                Name::new("Earth Lights"),
            ));
        });

    commands.insert_resource(EarthMaterials { surface, lights });
}

fn tint_earth(
    mode: Res<AlternateMode>,
    handles: Option<Res<EarthMaterials>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(handles) = handles else {
        return;
    };
    let palette = EarthPalette::for_mode(mode.active());
    if let Some(surface) = materials.get_mut(&handles.surface) {
        surface.base_color = palette.surface.with_alpha(0.95);
    }
    if let Some(lights) = materials.get_mut(&handles.lights) {
        lights.base_color = palette.lights.with_alpha(0.9);
    }
}

fn draw_grid(mut gizmos: Gizmos, mode: Res<AlternateMode>) {
    let color = EarthPalette::for_mode(mode.active()).grid;
    let tilt = earth_rotation();
    let radius = GLOBE_RADIUS + 0.02;

    for step in -5..=5 {
        let lat = (step as f32 * 15.0).to_radians();
        let center = tilt * Vec3::new(0.0, radius * lat.sin(), 0.0);
        gizmos
            .circle(
                Isometry3d::new(center, tilt * Quat::from_rotation_x(FRAC_PI_2)),
                radius * lat.cos(),
                color,
            )
            .resolution(64);
    }
    for step in 0..12 {
        let lon = (step as f32 * 15.0).to_radians();
        gizmos
            .circle(
                Isometry3d::new(Vec3::ZERO, tilt * Quat::from_rotation_y(lon)),
                radius,
                color,
            )
            .resolution(64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternate_palette_is_brighter_on_the_grid() {
        let normal = EarthPalette::for_mode(false);
        let alternate = EarthPalette::for_mode(true);
        assert!(alternate.grid.alpha() > normal.grid.alpha());
        assert_ne!(normal.surface, alternate.surface);
    }
}
