//! Tiered twinkling star shell.

use super::{GlobeRng, GlobeScene};
use super::mode::AlternateMode;
use crate::AppScreen;
use crate::config::GlobeSettings;
use crate::utils::remove;
use app::LOG_GLOBE;
use bevy::prelude::*;
use rand::Rng;
use settings::SettingsArc;
use std::f32::consts::TAU;

pub struct StarFieldPlugin;

impl Plugin for StarFieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeRng>()
            .add_systems(OnEnter(AppScreen::Globe), spawn_stars)
            .add_systems(Update, twinkle.run_if(in_state(AppScreen::Globe)))
            .add_systems(OnExit(AppScreen::Globe), remove::<StarMaterials>);
    }
}

/// Shared materials per tier; stars within a bucket twinkle in step.
pub const PHASE_BUCKETS: usize = 8;
const INNER_RADIUS: f32 = 250.0;
const SHELL_DEPTH: f32 = 800.0;
/// World radius of a star per unit of its nominal size.
const SIZE_TO_RADIUS: f32 = 0.16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarTier {
    Hero,
    Mid,
    Background,
}

impl StarTier {
    pub const ALL: [StarTier; 3] = [StarTier::Hero, StarTier::Mid, StarTier::Background];

    /// 5% hero, 15% mid, the rest background.
    pub fn from_roll(roll: f32) -> Self {
        if roll > 0.95 {
            StarTier::Hero
        } else if roll > 0.8 {
            StarTier::Mid
        } else {
            StarTier::Background
        }
    }

    pub fn brightness(self) -> f32 {
        match self {
            StarTier::Hero => 1.0,
            StarTier::Mid => 0.6,
            StarTier::Background => 0.3,
        }
    }

    fn size(self, roll: f32) -> f32 {
        match self {
            StarTier::Hero => 4.0 + roll * 2.0,
            StarTier::Mid => 2.5 + roll * 1.5,
            StarTier::Background => 1.5 + roll,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub size: f32,
    pub tier: StarTier,
}

impl Star {
    /// Spatial phase offset of the twinkle, folded into `0..TAU`.
    pub fn phase(&self) -> f32 {
        (self.position.x * 0.1 + self.position.y * 0.1).rem_euclid(TAU)
    }

    pub fn bucket(&self) -> usize {
        ((self.phase() / TAU * PHASE_BUCKETS as f32) as usize).min(PHASE_BUCKETS - 1)
    }
}

pub fn generate_stars(count: usize, rng: &mut impl Rng) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let r = INNER_RADIUS + rng.gen_range(0.0..1.0) * SHELL_DEPTH;
            let theta = rng.gen_range(0.0..TAU);
            let phi = (rng.gen_range(0.0f32..1.0) * 2.0 - 1.0).acos();
            let tier = StarTier::from_roll(rng.gen_range(0.0..1.0));
            Star {
                position: Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                ),
                size: tier.size(rng.gen_range(0.0..1.0)),
                tier,
            }
        })
        .collect()
}

/// Per-star alpha: brighter tiers twinkle faster and wider.
pub fn twinkle_alpha(brightness: f32, time: f32, position: Vec3) -> f32 {
    twinkle_alpha_at_phase(brightness, time, position.x * 0.1 + position.y * 0.1)
}

fn twinkle_alpha_at_phase(brightness: f32, time: f32, phase: f32) -> f32 {
    brightness + 0.3 * (time * (2.0 + brightness) + phase).sin() * brightness
}

fn bucket_phase(bucket: usize) -> f32 {
    (bucket as f32 + 0.5) / PHASE_BUCKETS as f32 * TAU
}

#[derive(Resource)]
struct StarMaterials {
    buckets: [[Handle<StandardMaterial>; PHASE_BUCKETS]; 3],
}

fn star_color(alternate: bool) -> Color {
    if alternate {
        Color::srgb_u8(0xf8, 0x71, 0x71)
    } else {
        Color::WHITE
    }
}

fn spawn_stars(
    mut commands: Commands,
    settings: Res<SettingsArc<GlobeSettings>>,
    mut rng: ResMut<GlobeRng>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let stars = generate_stars(settings.star_count, &mut rng.0);
    let mesh = meshes.add(Sphere::new(1.0).mesh().uv(8, 6));

    let buckets = StarTier::ALL.map(|tier| {
        std::array::from_fn(|_| {
            materials.add(StandardMaterial {
                base_color: star_color(false).with_alpha(tier.brightness()),
                alpha_mode: AlphaMode::Add,
                unlit: true,
                ..default()
            })
        })
    });

    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            GlobeScene,
            Name::new("Star Field"),
        ))
        .with_children(|field| {
            for star in &stars {
                let material: &Handle<StandardMaterial> = &buckets[star.tier.slot()][star.bucket()];
                field.spawn((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::from_translation(star.position)
                        .with_scale(Vec3::splat(star.size * SIZE_TO_RADIUS)),
                    Pickable::IGNORE,
                ));
            }
        });

    commands.insert_resource(StarMaterials { buckets });
    debug!(target: LOG_GLOBE, "{} stars spawned", stars.len());
}

fn twinkle(
    time: Res<Time>,
    mode: Res<AlternateMode>,
    handles: Option<Res<StarMaterials>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(handles) = handles else {
        return;
    };
    let elapsed = time.elapsed_secs();
    let color = star_color(mode.active());

    for tier in StarTier::ALL {
        for (bucket, handle) in handles.buckets[tier.slot()].iter().enumerate() {
            let alpha = twinkle_alpha_at_phase(tier.brightness(), elapsed, bucket_phase(bucket));
            if let Some(material) = materials.get_mut(handle) {
                material.base_color = color.with_alpha(alpha.clamp(0.0, 1.0));
            }
        }
    }
}
