//! User-tunable sections of `<app_id>.settings.ron`.

use app::LOG_MAIN;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use settings::{AppSettingsExt, Settings, SettingsArc};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateSettings {
    pub max_attempts: u32,
    pub max_code_length: usize,
    pub tone_length: usize,
    pub tone_fields: usize,
    /// Spacing between tones while the challenge is replayed.
    pub tone_step_secs: f32,
    /// Time the "ACCESS GRANTED" banner stays up before the globe opens.
    pub unlock_delay_secs: f32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_code_length: 8,
            tone_length: 4,
            tone_fields: 6,
            tone_step_secs: 0.45,
            unlock_delay_secs: 1.5,
        }
    }
}

impl Settings for GateSettings {
    const SECTION: &'static str = "gate";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeSettings {
    pub star_count: usize,
    pub shooting_star_spawn_chance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub start_distance: f32,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            star_count: 4500,
            shooting_star_spawn_chance: 0.002,
            min_distance: 8.0,
            max_distance: 35.0,
            start_distance: 18.0,
        }
    }
}

impl Settings for GlobeSettings {
    const SECTION: &'static str = "globe";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    /// Linear volume applied once the audio link reports ready.
    pub volume: f32,
    pub track: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.6,
            track: "audio/orbit_theme.ogg".to_string(),
        }
    }
}

impl Settings for AudioSettings {
    const SECTION: &'static str = "audio";
}

/// Registers every section, seeding defaults when the store is missing or broken.
pub fn register_settings(app: &mut App) {
    register_or_default::<GateSettings>(app);
    register_or_default::<GlobeSettings>(app);
    register_or_default::<AudioSettings>(app);
}

fn register_or_default<S: Settings>(app: &mut App) {
    if let Err(err) = app.register_settings_section::<S>() {
        warn!(
            target: LOG_MAIN,
            "settings section `{}` unusable ({err}), using defaults",
            S::SECTION
        );
        app.insert_resource(SettingsArc::<S>(Arc::new(S::default())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_without_store_seeds_defaults() {
        let mut app = App::new();
        register_settings(&mut app);

        let gate = app.world().resource::<SettingsArc<GateSettings>>();
        assert_eq!(*gate.0, GateSettings::default());
        assert!(app.world().contains_resource::<SettingsArc<GlobeSettings>>());
        assert!(app.world().contains_resource::<SettingsArc<AudioSettings>>());
    }
}
