use anyhow::anyhow;
use app::{AppBuilder, Application, LOG_MAIN};
use bevy::log::LogPlugin;
use bevy::picking::mesh_picking::MeshPickingPlugin;
use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;
use bevy_panorbit_camera::PanOrbitCameraPlugin;
use bevy_tweening::TweeningPlugin;
use global_connect::config::register_settings;
use global_connect::{AppScreen, GatePlugin, GlobePlugin, UiPlugin};
use settings::{AppSettingsExt, SettingsStore};

struct GlobalConnect;

impl Application for GlobalConnect {
    const APP_ID: &'static str = "global_connect";
}

fn main() -> anyhow::Result<()> {
    let mut app = AppBuilder::<GlobalConnect>::new(env!("CARGO_PKG_VERSION"))
        .map_err(|e| anyhow!(e))?
        .build_with_bevy(|mut app, ctx| {
            // Logging is owned by the app crate's tracing subscriber.
            app.add_plugins(
                DefaultPlugins
                    .build()
                    .disable::<LogPlugin>()
                    .set(WindowPlugin {
                        primary_window: Some(Window {
                            title: "Global Connect".to_string(),
                            ..default()
                        }),
                        ..default()
                    }),
            );

            let settings_file = ctx.path_context().settings_file(None);
            match SettingsStore::builder()
                .with_settings_file(settings_file.clone())
                .build()
            {
                Ok(store) => {
                    app.insert_settings_store(store);
                }
                Err(err) => warn!(
                    target: LOG_MAIN,
                    "settings store at {settings_file:?} unavailable ({err}), running on defaults"
                ),
            }
            register_settings(&mut app);

            app.init_state::<AppScreen>().add_plugins((
                EnhancedInputPlugin,
                PanOrbitCameraPlugin,
                TweeningPlugin,
                MeshPickingPlugin,
                UiPlugin,
                GatePlugin,
                GlobePlugin,
            ));
            app
        });

    let context = app.context();
    info!(
        target: LOG_MAIN,
        "{} {} configured, handing over to the engine",
        context.app_id(),
        context.version()
    );
    app.run();
    Ok(())
}
