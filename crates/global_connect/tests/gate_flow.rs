//! Headless runs of the gate: tone challenge, passcode and lockout.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use global_connect::AppScreen;
use global_connect::config::register_settings;
use global_connect::gate::{GateCommand, GateLogicPlugin, GatePhase, GateSession, TonePlayback};
use std::time::Duration;

fn gate_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
    register_settings(&mut app);
    app.init_state::<AppScreen>().add_plugins(GateLogicPlugin);
    app.update();
    app
}

fn screen(app: &App) -> AppScreen {
    *app.world().resource::<State<AppScreen>>().get()
}

fn phase(app: &App) -> GatePhase {
    app.world().resource::<GateSession>().phase()
}

fn wait_for_playback(app: &mut App) {
    for _ in 0..100 {
        if !app.world().resource::<TonePlayback>().is_playing() {
            return;
        }
        app.update();
    }
    panic!("tone playback never finished");
}

fn send(app: &mut App, commands: impl IntoIterator<Item = GateCommand>) {
    for command in commands {
        app.world_mut().write_message(command);
    }
    app.update();
}

fn pass_tones(app: &mut App) {
    wait_for_playback(app);
    let sequence = app.world().resource::<GateSession>().tone_sequence().to_vec();
    send(app, sequence.into_iter().map(GateCommand::ToneTap));
    assert_eq!(phase(app), GatePhase::ToneVerified);
}

fn submit_code(app: &mut App, code: &str) {
    send(
        app,
        code.chars()
            .map(GateCommand::Key)
            .chain(std::iter::once(GateCommand::Submit)),
    );
}

#[test]
fn tones_then_passcode_open_the_globe_after_the_banner() {
    let mut app = gate_app();
    assert_eq!(screen(&app), AppScreen::Gate);
    assert_eq!(phase(&app), GatePhase::AwaitingTonePattern);

    pass_tones(&mut app);
    submit_code(&mut app, "1337leet");
    assert_eq!(phase(&app), GatePhase::Unlocked);

    // Still celebrating on the gate right after the unlock.
    app.update();
    assert_eq!(screen(&app), AppScreen::Gate);

    for _ in 0..30 {
        app.update();
    }
    assert_eq!(screen(&app), AppScreen::Globe);
    assert!(!app.world().contains_resource::<GateSession>());
}

#[test]
fn taps_during_playback_are_ignored() {
    let mut app = gate_app();
    assert!(app.world().resource::<TonePlayback>().is_playing());

    let wrong = (app.world().resource::<GateSession>().tone_sequence()[0] + 1) % 6;
    send(&mut app, [GateCommand::ToneTap(wrong)]);

    let session = app.world().resource::<GateSession>();
    assert_eq!(session.attempts_remaining(), 3);
    assert_eq!(session.tone_progress(), 0);
}

#[test]
fn wrong_code_stays_on_the_gate() {
    let mut app = gate_app();
    pass_tones(&mut app);
    submit_code(&mut app, "0000");

    for _ in 0..30 {
        app.update();
    }
    assert_eq!(screen(&app), AppScreen::Gate);
    let session = app.world().resource::<GateSession>();
    assert_eq!(session.attempts_remaining(), 2);
    assert_eq!(session.entered(), "");
}

#[test]
fn three_wrong_codes_lock_the_gate() {
    let mut app = gate_app();
    pass_tones(&mut app);
    for _ in 0..3 {
        submit_code(&mut app, "0000");
    }
    assert_eq!(phase(&app), GatePhase::Locked);

    submit_code(&mut app, "1337LEET");
    for _ in 0..30 {
        app.update();
    }
    assert_eq!(phase(&app), GatePhase::Locked);
    assert_eq!(screen(&app), AppScreen::Gate);
}
