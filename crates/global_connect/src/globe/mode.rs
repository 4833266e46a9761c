//! Alternate visual mode and the one-shot impact pulse fired when it flips.

use super::flash::{Flash, FlashKind};
use crate::AppScreen;
use app::LOG_GLOBE;
use bevy::prelude::*;

pub struct ModePlugin;

impl Plugin for ModePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ToggleAlternateMode>()
            .add_message::<AlternateModeChanged>()
            .init_resource::<AlternateMode>()
            .init_resource::<ImpactPulse>()
            .add_systems(OnEnter(AppScreen::Globe), reset_mode)
            .add_systems(
                Update,
                (toggle_alternate_mode, trigger_impact, decay_impact)
                    .chain()
                    .run_if(in_state(AppScreen::Globe)),
            );
    }
}

/// Global theme switch. Only [`ToggleAlternateMode`] changes it.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq, Deref)]
pub struct AlternateMode(bool);

impl AlternateMode {
    pub fn active(&self) -> bool {
        self.0
    }
}

/// Decaying intensity spike, 1.0 right after a mode flip.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ImpactPulse(pub f32);

#[derive(Message, Debug, Default, Clone, Copy)]
pub struct ToggleAlternateMode;

/// Edge signal written exactly once per flip.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlternateModeChanged {
    pub active: bool,
}

/// One frame of exponential-ish decay toward zero.
pub fn decayed_impact(impact: f32, dt: f32) -> f32 {
    impact * (1.0 - (dt * 3.0).clamp(0.0, 1.0))
}

fn reset_mode(mut mode: ResMut<AlternateMode>, mut impact: ResMut<ImpactPulse>) {
    *mode = AlternateMode::default();
    *impact = ImpactPulse::default();
}

fn toggle_alternate_mode(
    mut toggles: MessageReader<ToggleAlternateMode>,
    mut mode: ResMut<AlternateMode>,
    mut changed: MessageWriter<AlternateModeChanged>,
    mut flash: MessageWriter<Flash>,
) {
    for _ in toggles.read() {
        mode.0 = !mode.0;
        info!(
            target: LOG_GLOBE,
            "Alternate mode {}",
            if mode.0 { "engaged" } else { "released" }
        );
        changed.write(AlternateModeChanged { active: mode.0 });
        flash.write(Flash(FlashKind::Double));
    }
}

fn trigger_impact(
    mut changed: MessageReader<AlternateModeChanged>,
    mut impact: ResMut<ImpactPulse>,
) {
    if changed.read().count() > 0 {
        impact.0 = 1.0;
    }
}

fn decay_impact(time: Res<Time>, mut impact: ResMut<ImpactPulse>) {
    if impact.0 > 0.0 {
        impact.0 = decayed_impact(impact.0, time.delta_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::globe::flash::FlashPlugin;
    use crate::globe::test_support::globe_app;

    #[test]
    fn decay_never_overshoots() {
        assert_eq!(decayed_impact(1.0, 0.0), 1.0);
        assert!((decayed_impact(1.0, 0.1) - 0.7).abs() < 1e-6);
        assert_eq!(decayed_impact(1.0, 2.0), 0.0);
    }

    #[test]
    fn toggle_flips_mode_and_fires_one_pulse() {
        let mut app = globe_app();
        app.add_plugins((FlashPlugin, ModePlugin));
        app.update();

        app.world_mut().write_message(ToggleAlternateMode);
        app.update();

        assert!(app.world().resource::<AlternateMode>().active());
        let after_flip = app.world().resource::<ImpactPulse>().0;
        assert!(after_flip > 0.6, "pulse fired, got {after_flip}");

        for _ in 0..10 {
            app.update();
        }
        let settled = app.world().resource::<ImpactPulse>().0;
        assert!(settled < 0.1, "pulse decays without re-triggering, got {settled}");
        assert!(app.world().resource::<AlternateMode>().active());

        app.world_mut().write_message(ToggleAlternateMode);
        app.update();
        assert!(!app.world().resource::<AlternateMode>().active());
        assert!(app.world().resource::<ImpactPulse>().0 > 0.6);
    }
}
