//! Globe camera: an intro dolly, then a priority-ordered directive applied
//! to the pan-orbit controller every frame.

mod util;

use super::GlobeScene;
use super::mode::AlternateMode;
use crate::AppScreen;
use crate::config::GlobeSettings;
use crate::locations::Selection;
use app::LOG_GLOBE;
use bevy::camera::ClearColorConfig;
use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;
use bevy_tweening::{AnimCompletedEvent, Tween, TweenAnim, lens::Lens};
use settings::SettingsArc;
use std::f32::consts::TAU;
use std::time::Duration;

pub use util::{orbit_from_translation, translation_from_orbit};

const INTRO_DISTANCE: f32 = 40.0;
const INTRO_DURATION: Duration = Duration::from_secs(2);
const ALTERNATE_POSE: Vec3 = Vec3::new(10.0, -5.0, 12.0);
const SLOW_ROTATE: f32 = 0.5;
const FAST_ROTATE: f32 = 5.0;

pub struct GlobeCameraPlugin;

impl Plugin for GlobeCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FocusRequest>()
            .add_systems(OnEnter(AppScreen::Globe), spawn_camera)
            .add_systems(
                Update,
                (finish_intro, drive_camera)
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

/// Camera target requested from outside the globe, e.g. by chat commands.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct FocusRequest(pub Option<Vec3>);

#[derive(Component)]
pub struct GlobeCamera;

/// Camera behaviour for one frame, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraDirective {
    ExternalFocus(Vec3),
    AlternateMode,
    MarkerSelected,
    Idle,
}

/// What a directive asks of the camera this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPlan {
    /// Target position and lerp factor.
    pub ease_position: Option<(Vec3, f32)>,
    /// Auto-rotate speed; a speed of 1 is one turn per minute.
    pub auto_rotate: Option<f32>,
    /// Lerp factor pulling the orbit focus back to the origin.
    pub recenter: Option<f32>,
}

impl CameraDirective {
    pub fn select(focus: Option<Vec3>, alternate_mode: bool, marker_selected: bool) -> Self {
        match (focus, alternate_mode, marker_selected) {
            (Some(point), _, _) => CameraDirective::ExternalFocus(point),
            (None, true, _) => CameraDirective::AlternateMode,
            (None, false, true) => CameraDirective::MarkerSelected,
            (None, false, false) => CameraDirective::Idle,
        }
    }

    pub fn plan(self, elapsed: f32, dt: f32) -> CameraPlan {
        let breathing = (elapsed * 0.5).sin() * 0.4;
        match self {
            CameraDirective::ExternalFocus(point) => CameraPlan {
                ease_position: Some((point + Vec3::splat(breathing * 0.1), dt * 1.5)),
                auto_rotate: None,
                recenter: Some(dt * 2.0),
            },
            CameraDirective::AlternateMode => CameraPlan {
                ease_position: Some((
                    ALTERNATE_POSE + Vec3::new(breathing, 0.0, breathing),
                    dt * 0.5,
                )),
                auto_rotate: Some(FAST_ROTATE),
                recenter: None,
            },
            CameraDirective::MarkerSelected => CameraPlan {
                auto_rotate: Some(SLOW_ROTATE),
                ..default()
            },
            CameraDirective::Idle => CameraPlan {
                auto_rotate: Some(SLOW_ROTATE),
                recenter: Some(dt * 2.0),
                ..default()
            },
        }
    }
}

/// Radians per second for an auto-rotate speed.
pub fn auto_rotate_rate(speed: f32) -> f32 {
    speed * TAU / 60.0
}

#[derive(Clone)]
struct DollyLens {
    start: Vec3,
    end: Vec3,
}

impl Lens<Transform> for DollyLens {
    fn lerp(&mut self, mut target: Mut<Transform>, ratio: f32) {
        target.translation = self.start.lerp(self.end, ratio);
        target.look_at(Vec3::ZERO, Vec3::Y);
    }
}

/// Present while the intro dolly runs.
#[derive(Component)]
struct IntroDolly;

fn spawn_camera(
    mut commands: Commands,
    mut focus: ResMut<FocusRequest>,
    settings: Res<SettingsArc<GlobeSettings>>,
) {
    focus.0 = None;

    let start = Vec3::new(0.0, 0.0, INTRO_DISTANCE);
    let end = Vec3::new(0.0, 0.0, settings.start_distance);
    let tween = Tween::new(
        EaseFunction::QuadraticInOut,
        INTRO_DURATION,
        DollyLens { start, end },
    );

    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::srgb(0.008, 0.0, 0.02)),
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: 60f32.to_radians(),
            ..default()
        }),
        Transform::from_translation(start).looking_at(Vec3::ZERO, Vec3::Y),
        PanOrbitCamera {
            focus: Vec3::ZERO,
            yaw: Some(0.0),
            pitch: Some(0.0),
            radius: Some(INTRO_DISTANCE),
            zoom_lower_limit: settings.min_distance,
            zoom_upper_limit: Some(settings.max_distance),
            pan_sensitivity: 0.0,
            orbit_sensitivity: 0.5,
            allow_upside_down: false,
            button_orbit: MouseButton::Left,
            enabled: false,
            ..default()
        },
        TweenAnim::new(tween),
        IntroDolly,
        GlobeCamera,
        GlobeScene,
        Name::new("Globe Camera"),
    ));

    debug!(target: LOG_GLOBE, "Globe camera spawned, dolly {start} -> {end}");
}

/// Hands the camera to the orbit controller once the dolly lands.
fn finish_intro(
    mut commands: Commands,
    mut completed: MessageReader<AnimCompletedEvent>,
    mut cameras: Query<(&mut PanOrbitCamera, &Transform), With<IntroDolly>>,
) {
    for event in completed.read() {
        let Ok((mut orbit, transform)) = cameras.get_mut(event.anim_entity) else {
            continue;
        };
        let (yaw, pitch, radius) =
            orbit_from_translation(transform.translation, orbit.focus, orbit.axis);
        set_orbit(&mut orbit, yaw, pitch, radius);
        orbit.enabled = true;

        commands
            .entity(event.anim_entity)
            .remove::<(TweenAnim, IntroDolly)>();
        info!(target: LOG_GLOBE, "Intro finished, orbit controls enabled");
    }
}

fn set_orbit(orbit: &mut PanOrbitCamera, yaw: f32, pitch: f32, radius: f32) {
    orbit.yaw = Some(yaw);
    orbit.target_yaw = yaw;
    orbit.pitch = Some(pitch);
    orbit.target_pitch = pitch;
    orbit.radius = Some(radius);
    orbit.target_radius = radius;
}

fn drive_camera(
    time: Res<Time>,
    focus: Res<FocusRequest>,
    mode: Res<AlternateMode>,
    selection: Res<Selection>,
    mut cameras: Query<
        (&mut PanOrbitCamera, &Transform),
        (With<GlobeCamera>, Without<IntroDolly>),
    >,
) {
    let directive = CameraDirective::select(focus.0, mode.active(), selection.0.is_some());
    let dt = time.delta_secs();
    let plan = directive.plan(time.elapsed_secs(), dt);

    for (mut orbit, transform) in &mut cameras {
        if !orbit.enabled {
            continue;
        }

        if let Some((target, rate)) = plan.ease_position {
            let eased = transform.translation.lerp(target, util::ease_factor(rate));
            let (yaw, pitch, radius) = orbit_from_translation(eased, orbit.focus, orbit.axis);
            set_orbit(&mut orbit, yaw, pitch, radius);
        }

        if let Some(speed) = plan.auto_rotate {
            orbit.target_yaw += auto_rotate_rate(speed) * dt;
        }

        if let Some(rate) = plan.recenter {
            let recentered = orbit.target_focus.lerp(Vec3::ZERO, util::ease_factor(rate));
            orbit.target_focus = recentered;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::flash::FlashPlugin;
    use crate::globe::mode::{ModePlugin, ToggleAlternateMode};
    use crate::globe::test_support::globe_app;

    const AXIS: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];
    const START: Vec3 = Vec3::new(0.0, 0.0, 18.0);

    fn camera_app() -> App {
        let mut app = globe_app();
        app.add_plugins((FlashPlugin, ModePlugin, GlobeCameraPlugin))
            .init_resource::<Selection>()
            .add_message::<AnimCompletedEvent>();
        app.update();
        app
    }

    /// An orbit camera past its intro, resting at [`START`].
    fn spawn_orbit(app: &mut App) -> Entity {
        let (yaw, pitch, radius) = orbit_from_translation(START, Vec3::ZERO, AXIS);
        let mut orbit = PanOrbitCamera {
            enabled: true,
            ..default()
        };
        set_orbit(&mut orbit, yaw, pitch, radius);
        app.world_mut()
            .spawn((orbit, Transform::from_translation(START), GlobeCamera))
            .id()
    }

    fn orbit_of(app: &App, camera: Entity) -> &PanOrbitCamera {
        app.world().get::<PanOrbitCamera>(camera).expect("orbit camera")
    }

    /// `(elapsed, dt)` of the frame that just ran.
    fn last_frame(app: &App) -> (f32, f32) {
        let time = app.world().resource::<Time>();
        (time.elapsed_secs(), time.delta_secs())
    }

    fn eased_yaw(directive: CameraDirective, elapsed: f32, dt: f32) -> (f32, f32) {
        let (target, rate) = directive
            .plan(elapsed, dt)
            .ease_position
            .expect("directive eases the camera");
        let eased = START.lerp(target, util::ease_factor(rate));
        let (yaw, _, radius) = orbit_from_translation(eased, Vec3::ZERO, AXIS);
        (yaw, radius)
    }

    #[test]
    fn external_focus_outranks_everything() {
        let point = Vec3::new(2.5, 5.0, 4.0);
        assert_eq!(
            CameraDirective::select(Some(point), true, true),
            CameraDirective::ExternalFocus(point)
        );
        assert_eq!(
            CameraDirective::select(Some(point), false, true),
            CameraDirective::ExternalFocus(point)
        );
    }

    #[test]
    fn remaining_priorities_are_fixed() {
        assert_eq!(CameraDirective::select(None, true, true), CameraDirective::AlternateMode);
        assert_eq!(CameraDirective::select(None, false, true), CameraDirective::MarkerSelected);
        assert_eq!(CameraDirective::select(None, false, false), CameraDirective::Idle);
    }

    #[test]
    fn focus_plan_stops_rotation_and_recenters() {
        let point = Vec3::new(-4.0, 3.0, 6.0);
        let plan = CameraDirective::ExternalFocus(point).plan(0.0, 0.1);
        let (target, rate) = plan.ease_position.expect("eases toward focus");

        assert_eq!(target, point);
        assert!((rate - 0.15).abs() < 1e-6);
        assert_eq!(plan.auto_rotate, None);
        assert!((plan.recenter.unwrap_or_default() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn alternate_plan_breathes_around_its_pose() {
        let elapsed = std::f32::consts::PI;
        let plan = CameraDirective::AlternateMode.plan(elapsed, 0.1);
        let (target, _) = plan.ease_position.expect("eases toward pose");

        assert!((target - Vec3::new(10.4, -5.0, 12.4)).length() < 1e-4);
        assert_eq!(plan.auto_rotate, Some(FAST_ROTATE));
        assert_eq!(plan.recenter, None);
    }

    #[test]
    fn selected_and_idle_rotate_slowly() {
        let selected = CameraDirective::MarkerSelected.plan(1.0, 0.1);
        assert_eq!(selected.ease_position, None);
        assert_eq!(selected.auto_rotate, Some(SLOW_ROTATE));
        assert_eq!(selected.recenter, None);

        let idle = CameraDirective::Idle.plan(1.0, 0.1);
        assert_eq!(idle.auto_rotate, Some(SLOW_ROTATE));
        assert!(idle.recenter.is_some());
    }

    #[test]
    fn auto_rotate_matches_orbit_controls_units() {
        assert!((auto_rotate_rate(60.0) - TAU).abs() < 1e-5);
    }

    #[test]
    fn focus_request_outranks_selection_and_stops_rotation() {
        let mut app = camera_app();
        let camera = spawn_orbit(&mut app);
        app.world_mut()
            .get_mut::<PanOrbitCamera>(camera)
            .expect("orbit camera")
            .target_focus = Vec3::ONE;
        let point = Vec3::new(-4.0, 3.0, 6.0);
        app.world_mut().resource_mut::<FocusRequest>().0 = Some(point);
        app.world_mut().resource_mut::<Selection>().0 = Some(0);
        app.update();

        let (elapsed, dt) = last_frame(&app);
        assert!(dt > 0.0);
        let (yaw, radius) = eased_yaw(CameraDirective::ExternalFocus(point), elapsed, dt);
        let orbit = orbit_of(&app, camera);
        assert!((orbit.target_yaw - yaw).abs() < 1e-5, "no spin on top of the ease");
        assert!((orbit.target_radius - radius).abs() < 1e-4);

        let placed = translation_from_orbit(
            orbit.target_yaw,
            orbit.target_pitch,
            orbit.target_radius,
            Vec3::ZERO,
            AXIS,
        );
        assert!(placed.distance(point) < START.distance(point));
        assert!(orbit.target_focus.length() < Vec3::ONE.length(), "focus pulled home");
    }

    #[test]
    fn alternate_mode_spins_fast_while_easing_to_its_pose() {
        let mut app = camera_app();
        let camera = spawn_orbit(&mut app);
        app.world_mut().write_message(ToggleAlternateMode);
        app.update();
        app.update();

        let (elapsed, dt) = last_frame(&app);
        let (yaw, _) = eased_yaw(CameraDirective::AlternateMode, elapsed, dt);
        let spin = auto_rotate_rate(FAST_ROTATE) * dt;
        assert!(spin > 0.05);
        assert!((orbit_of(&app, camera).target_yaw - (yaw + spin)).abs() < 1e-5);
    }

    #[test]
    fn idle_camera_drifts_slowly() {
        let mut app = camera_app();
        let camera = spawn_orbit(&mut app);
        let before = orbit_of(&app, camera).target_yaw;
        app.update();

        let (_, dt) = last_frame(&app);
        let after = orbit_of(&app, camera).target_yaw;
        assert!((after - before - auto_rotate_rate(SLOW_ROTATE) * dt).abs() < 1e-6);
    }

    #[test]
    fn intro_and_disabled_cameras_are_left_alone() {
        let mut app = camera_app();
        let dolly = spawn_orbit(&mut app);
        app.world_mut().entity_mut(dolly).insert(IntroDolly);
        let disabled = spawn_orbit(&mut app);
        app.world_mut()
            .get_mut::<PanOrbitCamera>(disabled)
            .expect("orbit camera")
            .enabled = false;

        let snapshot = |app: &App, camera| {
            let orbit = orbit_of(app, camera);
            (orbit.target_yaw, orbit.target_radius, orbit.target_focus)
        };
        let before = (snapshot(&app, dolly), snapshot(&app, disabled));

        app.world_mut().resource_mut::<FocusRequest>().0 = Some(Vec3::new(2.5, 5.0, 4.0));
        for _ in 0..3 {
            app.update();
        }
        assert_eq!((snapshot(&app, dolly), snapshot(&app, disabled)), before);
    }
}
