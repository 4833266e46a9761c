//! Globe screen: the earth and its markers, camera, ambient effects and the
//! overlay panels around them.

pub mod audio;
pub mod avatar;
pub mod camera;
pub mod chat;
pub mod connections;
pub mod earth;
pub mod effects;
pub mod flash;
pub mod hud;
mod input;
pub mod markers;
pub mod mode;
pub mod shooting_stars;
pub mod sigil;
pub mod stars;
pub mod visualizer;

use crate::AppScreen;
use crate::locations::Selection;
use crate::utils::cleanup;
use app::LOG_GLOBE;
use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

pub const GLOBE_RADIUS: f32 = 5.0;
/// Axial tilt of the earth group, radians around Z.
pub const EARTH_TILT: f32 = 0.2;

/// Tag for everything spawned for the globe screen; despawned on exit.
#[derive(Component)]
pub struct GlobeScene;

/// Randomness for the procedural globe systems. Seed it to replay a run.
#[derive(Resource, Deref, DerefMut)]
pub struct GlobeRng(pub StdRng);

impl Default for GlobeRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Spawn order on entering the globe: surface children need the earth root.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobeSetup {
    Earth,
    Surface,
}

pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Selection>()
            .init_resource::<GlobeRng>()
            .configure_sets(
                OnEnter(AppScreen::Globe),
                (GlobeSetup::Earth, GlobeSetup::Surface).chain(),
            )
            .add_plugins((
                mode::ModePlugin,
                flash::FlashPlugin,
                camera::GlobeCameraPlugin,
                earth::EarthPlugin,
                markers::MarkerPlugin,
                connections::ConnectionsPlugin,
                effects::EffectsPlugin,
                stars::StarFieldPlugin,
            ))
            .add_plugins((
                shooting_stars::ShootingStarPlugin,
                sigil::SigilPlugin,
                audio::AudioLinkPlugin,
                visualizer::VisualizerPlugin,
                chat::ChatPlugin,
                avatar::AvatarPlugin,
                hud::HudPlugin,
                input::GlobeInputPlugin,
            ))
            .add_systems(OnEnter(AppScreen::Globe), log_enter)
            .add_systems(
                OnExit(AppScreen::Globe),
                (cleanup::<GlobeScene>, reset_globe_state),
            );
    }
}

fn log_enter() {
    info!(target: LOG_GLOBE, "Globe online");
}

fn reset_globe_state(mut selection: ResMut<Selection>, mut focus: ResMut<camera::FocusRequest>) {
    *selection = Selection::default();
    *focus = camera::FocusRequest::default();
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::AppScreen;
    use crate::config::register_settings;
    use bevy::input::keyboard::KeyboardInput;
    use bevy::input::mouse::MouseWheel;
    use bevy::prelude::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    /// Headless app already sitting on the globe screen, stepping 100 ms per update.
    pub fn globe_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .add_message::<KeyboardInput>()
            .add_message::<MouseWheel>();
        register_settings(&mut app);
        app.insert_state(AppScreen::Globe);
        app
    }
}
