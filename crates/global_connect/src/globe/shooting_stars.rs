//! Fixed pool of shooting stars recycled through an index free-list.

use super::{GlobeRng, GlobeScene};
use crate::AppScreen;
use crate::config::GlobeSettings;
use bevy::prelude::*;
use rand::Rng;
use settings::SettingsArc;

pub struct ShootingStarPlugin;

impl Plugin for ShootingStarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeRng>()
            .add_systems(OnEnter(AppScreen::Globe), spawn_pool)
            .add_systems(Update, update_shooting_stars.run_if(in_state(AppScreen::Globe)));
    }
}

pub const POOL_SIZE: usize = 77;

const LAUNCH_RADIUS: f32 = 350.0;
const MIN_LAUNCH_HEIGHT: f32 = 50.0;
const DECAY_PER_SECOND: f32 = 0.3;
const TRAIL_COLOR: Color = Color::srgb(0.647, 0.953, 0.988);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShootingStar {
    pub position: Vec3,
    pub direction: Vec3,
    pub velocity: f32,
    pub life: f32,
    pub active: bool,
}

impl ShootingStar {
    /// A fresh star high above the globe, heading across the sky.
    pub fn launch(rng: &mut impl Rng) -> Self {
        let theta = rng.gen_range(0.0..std::f32::consts::TAU);
        let phi = rng.gen_range(0.0..1.2f32);
        let mut start = Vec3::new(
            LAUNCH_RADIUS * phi.sin() * theta.cos(),
            LAUNCH_RADIUS * phi.cos(),
            LAUNCH_RADIUS * phi.sin() * theta.sin(),
        );
        if start.y < MIN_LAUNCH_HEIGHT {
            start.y = MIN_LAUNCH_HEIGHT + rng.gen_range(0.0..100.0);
        }
        let heading = Vec3::new(
            (rng.gen_range(0.0f32..1.0) - 0.5) * 400.0,
            -rng.gen_range(0.0f32..1.0) * 100.0,
            (rng.gen_range(0.0f32..1.0) - 0.5) * 400.0,
        );

        Self {
            position: start,
            direction: heading.normalize_or_zero(),
            velocity: 4.0 + rng.gen_range(0.0..2.0),
            life: 1.0,
            active: true,
        }
    }

    /// Trail length factor.
    pub fn stretch(&self) -> f32 {
        self.life.max(0.0) * 100.0
    }

    pub fn opacity(&self) -> f32 {
        self.life.max(0.0) * 0.9
    }
}

/// Arena of `N` slots. `free` holds the indices of inactive slots and never
/// outgrows its initial capacity.
#[derive(Resource, Debug)]
pub struct ShootingStarPool<const N: usize> {
    slots: [ShootingStar; N],
    free: Vec<usize>,
}

impl<const N: usize> Default for ShootingStarPool<N> {
    fn default() -> Self {
        let mut free = Vec::with_capacity(N);
        free.extend((0..N).rev());
        Self {
            slots: [ShootingStar::default(); N],
            free,
        }
    }
}

impl<const N: usize> ShootingStarPool<N> {
    pub fn slot(&self, index: usize) -> Option<&ShootingStar> {
        self.slots.get(index)
    }

    pub fn active_count(&self) -> usize {
        N - self.free.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn free_capacity(&self) -> usize {
        self.free.capacity()
    }

    /// Activates the next free slot, if any.
    pub fn spawn(&mut self, rng: &mut impl Rng) -> Option<usize> {
        let index = self.free.pop()?;
        self.slots[index] = ShootingStar::launch(rng);
        Some(index)
    }

    /// Every free slot rolls `chance` once. Returns how many launched.
    pub fn roll_spawns(&mut self, chance: f32, rng: &mut impl Rng) -> usize {
        let mut launched = 0;
        let mut cursor = 0;
        while cursor < self.free.len() {
            if rng.gen_range(0.0f32..1.0) < chance {
                let index = self.free.swap_remove(cursor);
                self.slots[index] = ShootingStar::launch(rng);
                launched += 1;
            } else {
                cursor += 1;
            }
        }
        launched
    }

    /// Advances active stars; returns how many burned out this tick.
    pub fn tick(&mut self, dt: f32) -> usize {
        let mut expired = 0;
        for (index, star) in self.slots.iter_mut().enumerate() {
            if !star.active {
                continue;
            }
            star.position += star.direction * star.velocity * dt * 60.0;
            star.life -= dt * DECAY_PER_SECOND;
            if star.life <= 0.0 {
                star.active = false;
                self.free.push(index);
                expired += 1;
            }
        }
        expired
    }
}

#[derive(Component)]
struct ShootingStarSlot {
    index: usize,
    material: Handle<StandardMaterial>,
}

fn spawn_pool(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(ShootingStarPool::<POOL_SIZE>::default());

    let mesh = meshes.add(Cone {
        radius: 0.6,
        height: 1.0,
    });
    commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            GlobeScene,
            Name::new("Shooting Stars"),
        ))
        .with_children(|sky| {
            for index in 0..POOL_SIZE {
                let material = materials.add(StandardMaterial {
                    base_color: TRAIL_COLOR.with_alpha(0.0),
                    alpha_mode: AlphaMode::Add,
                    unlit: true,
                    ..default()
                });
                sky.spawn((
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::default(),
                    Visibility::Hidden,
                    Pickable::IGNORE,
                    ShootingStarSlot { index, material },
                ));
            }
        });
}

fn update_shooting_stars(
    time: Res<Time>,
    settings: Res<SettingsArc<GlobeSettings>>,
    pool: Option<ResMut<ShootingStarPool<POOL_SIZE>>>,
    mut rng: ResMut<GlobeRng>,
    mut slots: Query<(&ShootingStarSlot, &mut Transform, &mut Visibility)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(mut pool) = pool else {
        return;
    };
    pool.tick(time.delta_secs());
    pool.roll_spawns(settings.shooting_star_spawn_chance, &mut rng.0);

    for (slot, mut transform, mut visibility) in &mut slots {
        let Some(star) = pool.slot(slot.index) else {
            continue;
        };
        if !star.active {
            visibility.set_if_neq(Visibility::Hidden);
            continue;
        }
        visibility.set_if_neq(Visibility::Visible);
        // Apex trails behind the head.
        *transform = Transform::from_translation(star.position)
            .with_rotation(Quat::from_rotation_arc(Vec3::Y, -star.direction))
            .with_scale(Vec3::new(1.5, star.stretch().max(0.01), 1.5));
        if let Some(material) = materials.get_mut(&slot.material) {
            material.base_color = TRAIL_COLOR.with_alpha(star.opacity());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn launches_start_high_and_fresh() {
        let mut rng = rng();
        for _ in 0..200 {
            let star = ShootingStar::launch(&mut rng);
            assert!(star.active);
            assert_eq!(star.life, 1.0);
            assert!(star.position.y >= MIN_LAUNCH_HEIGHT);
            assert!((4.0..6.0).contains(&star.velocity));
            assert!((star.direction.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn life_strictly_decreases_until_the_slot_frees_up() {
        let mut pool = ShootingStarPool::<4>::default();
        let mut rng = rng();
        let index = pool.spawn(&mut rng).expect("free slot");
        assert_eq!(pool.active_count(), 1);

        let dt = 0.25;
        let mut last_life = 1.0;
        let mut ticks = 0;
        loop {
            let expired = pool.tick(dt);
            ticks += 1;
            let star = *pool.slot(index).expect("slot exists");
            if star.life <= 0.0 {
                assert!(!star.active);
                assert_eq!(expired, 1);
                break;
            }
            assert!(star.active);
            assert!(star.life < last_life);
            last_life = star.life;
        }

        // 1.0 / (0.25 * 0.3) ticks, rounded up.
        assert_eq!(ticks, 14);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), 4);
        assert!(pool.spawn(&mut rng).is_some(), "slot is reusable");
    }

    #[test]
    fn inactive_stars_do_not_move() {
        let mut pool = ShootingStarPool::<2>::default();
        pool.tick(1.0);
        assert_eq!(*pool.slot(0).expect("slot"), ShootingStar::default());
    }

    #[test]
    fn spawn_rolls_respect_chance_and_pool_size() {
        let mut pool = ShootingStarPool::<POOL_SIZE>::default();
        let mut rng = rng();
        let capacity = pool.free_capacity();

        assert_eq!(pool.roll_spawns(0.0, &mut rng), 0);
        assert_eq!(pool.roll_spawns(1.0, &mut rng), POOL_SIZE);
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.spawn(&mut rng), None);

        for _ in 0..20 {
            pool.tick(0.25);
        }
        assert_eq!(pool.free_count(), POOL_SIZE);
        assert_eq!(pool.free_capacity(), capacity);
    }

    #[test]
    fn trail_fades_with_life() {
        let star = ShootingStar {
            life: 0.5,
            ..default()
        };
        assert_eq!(star.stretch(), 50.0);
        assert!((star.opacity() - 0.45).abs() < 1e-6);
    }
}
