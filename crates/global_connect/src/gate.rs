//! Entry screen: tone challenge followed by the typed passcode.

mod input;
mod logic;
mod session;
mod ui;

use bevy::prelude::*;

pub use logic::{
    GateCommand, GateLogicPlugin, GateRng, GateSession, TonePlayback, TonePlayed, UnlockCountdown,
};
pub use session::{
    GatePhase, GateRules, PASSCODE, PasscodeSession, SubmitOutcome, ToneOutcome,
};

/// Everything the gate screen needs: session logic, keyboard input and the keypad UI.
pub struct GatePlugin;

impl Plugin for GatePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GateLogicPlugin, input::GateInputPlugin, ui::GateUiPlugin));
    }
}
