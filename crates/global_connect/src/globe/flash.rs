//! Full-screen lightning flash.

use super::GlobeScene;
use crate::AppScreen;
use bevy::prelude::*;

pub struct FlashPlugin;

impl Plugin for FlashPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<Flash>()
            .init_resource::<ActiveFlash>()
            .add_systems(OnEnter(AppScreen::Globe), spawn_overlay)
            .add_systems(
                Update,
                (start_flash, animate_flash)
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Single,
    Double,
    Soft,
}

impl FlashKind {
    /// `(seconds, opacity)` pairs, linearly interpolated.
    fn keyframes(self) -> &'static [(f32, f32)] {
        match self {
            FlashKind::Single => &[(0.0, 0.0), (0.05, 0.6), (0.1, 0.6), (0.35, 0.0)],
            FlashKind::Double => &[
                (0.0, 0.0),
                (0.05, 0.8),
                (0.08, 0.8),
                (0.13, 0.0),
                (0.2, 0.0),
                (0.25, 1.0),
                (0.3, 1.0),
                (0.6, 0.0),
            ],
            FlashKind::Soft => &[(0.0, 0.0), (0.5, 0.15), (0.6, 0.15), (1.1, 0.0)],
        }
    }

    /// Overlay opacity `elapsed` seconds into the flash, `None` once it is over.
    pub fn opacity_at(self, elapsed: f32) -> Option<f32> {
        let frames = self.keyframes();
        let elapsed = elapsed.max(0.0);
        frames.windows(2).find_map(|pair| {
            let [(t0, a0), (t1, a1)] = [pair[0], pair[1]];
            (elapsed >= t0 && elapsed < t1).then(|| a0 + (a1 - a0) * (elapsed - t0) / (t1 - t0))
        })
    }
}

/// Requests a flash; a new request restarts the overlay.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash(pub FlashKind);

#[derive(Resource, Debug, Default)]
pub struct ActiveFlash(Option<(FlashKind, f32)>);

impl ActiveFlash {
    pub fn kind(&self) -> Option<FlashKind> {
        self.0.map(|(kind, _)| kind)
    }
}

#[derive(Component)]
struct FlashOverlay;

fn spawn_overlay(mut commands: Commands, mut active: ResMut<ActiveFlash>) {
    active.0 = None;
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        BackgroundColor(Color::WHITE.with_alpha(0.0)),
        GlobalZIndex(100),
        Pickable::IGNORE,
        FlashOverlay,
        GlobeScene,
        Name::new("Flash Overlay"),
    ));
}

fn start_flash(mut requests: MessageReader<Flash>, mut active: ResMut<ActiveFlash>) {
    if let Some(Flash(kind)) = requests.read().last() {
        active.0 = Some((*kind, 0.0));
    }
}

fn animate_flash(
    time: Res<Time>,
    mut active: ResMut<ActiveFlash>,
    mut overlay: Query<&mut BackgroundColor, With<FlashOverlay>>,
) {
    let Some((kind, elapsed)) = active.0.as_mut() else {
        return;
    };
    let opacity = kind.opacity_at(*elapsed);
    *elapsed += time.delta_secs();
    if opacity.is_none() {
        active.0 = None;
    }

    for mut background in &mut overlay {
        background.0 = Color::WHITE.with_alpha(opacity.unwrap_or(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: Option<f32>, expected: f32) {
        let actual = actual.expect("flash still running");
        assert!((actual - expected).abs() < 1e-4, "{actual} != {expected}");
    }

    #[test]
    fn single_holds_then_fades() {
        close(FlashKind::Single.opacity_at(0.0), 0.0);
        close(FlashKind::Single.opacity_at(0.07), 0.6);
        close(FlashKind::Single.opacity_at(0.225), 0.3);
        assert_eq!(FlashKind::Single.opacity_at(0.35), None);
    }

    #[test]
    fn double_goes_dark_between_strikes() {
        close(FlashKind::Double.opacity_at(0.06), 0.8);
        close(FlashKind::Double.opacity_at(0.15), 0.0);
        close(FlashKind::Double.opacity_at(0.27), 1.0);
        assert_eq!(FlashKind::Double.opacity_at(0.6), None);
    }

    #[test]
    fn soft_eases_to_a_low_ceiling() {
        close(FlashKind::Soft.opacity_at(0.25), 0.075);
        close(FlashKind::Soft.opacity_at(0.55), 0.15);
        assert!(FlashKind::Soft.opacity_at(1.0).is_some());
        assert_eq!(FlashKind::Soft.opacity_at(2.0), None);
    }
}
