//! Global Connect: a passcode gate in front of a holographic globe.

pub mod config;
pub mod gate;
pub mod geo;
pub mod globe;
pub mod locations;
pub mod ui;
mod utils;

use bevy::prelude::*;

pub use gate::GatePlugin;
pub use globe::GlobePlugin;
pub use ui::UiPlugin;

/// Top-level screens. The gate is the entry point; the globe is reached only
/// after a successful unlock and left through the back button.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppScreen {
    #[default]
    Gate,
    Globe,
}
