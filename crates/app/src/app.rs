use paths::PathContext;
use std::marker::PhantomData;
#[cfg(debug_assertions)]
use std::path::PathBuf;
use tracing_subscriber::{
    Layer, filter::LevelFilter, filter::filter_fn, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const LOG_MAIN: &str = "main";
pub const LOG_GATE: &str = "gate";
pub const LOG_GLOBE: &str = "globe";
pub const LOG_AUDIO: &str = "audio";
pub const LOG_CHAT: &str = "chat";

/// Application infrastructure context.
///
/// Owns the path layout and keeps the file logger alive.
pub struct AppContext {
    pub path_context: PathContext,
    pub version: &'static str,
    /// Dropping the guard flushes and stops the non-blocking log writer.
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn app_id(&self) -> &str {
        self.path_context.app_id()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn path_context(&self) -> &PathContext {
        &self.path_context
    }
}

/// Application identity. Pure constants, no logic.
pub trait Application: Sized + 'static {
    const APP_ID: &'static str;
    const STUDIO: &'static str = "nightshift";
    const PROJECT_ID: &'static str = "global_connect";
}

/// Builder that prepares paths and logging before any app code runs.
pub struct AppBuilder<A: Application> {
    context: AppContext,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    /// Create a new application builder.
    ///
    /// - resolves the path context (repo-local `.out` in debug builds)
    /// - creates the project and log directories
    /// - installs a file + console `tracing` subscriber
    pub fn new(version: &'static str) -> Result<Self, BoxError> {
        #[cfg(debug_assertions)]
        let path_context = PathContext::with_base_path(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join("..")
                .join(".out"),
            A::STUDIO,
            A::PROJECT_ID,
            A::APP_ID,
        );
        #[cfg(not(debug_assertions))]
        let path_context = PathContext::new(A::STUDIO, A::PROJECT_ID, A::APP_ID);

        path_context.ensure_directories()?;

        let log_file_path = path_context.log_file_now();
        let log_dir = log_file_path
            .parent()
            .ok_or("log file path has no parent directory")?;
        let log_filename = log_file_path
            .file_name()
            .ok_or("log file path has no file name")?;

        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        #[cfg(debug_assertions)]
        let level = LevelFilter::INFO;

        #[cfg(not(debug_assertions))]
        let level = LevelFilter::WARN;

        let file_layer = fmt::Layer::default()
            .with_target(true)
            .with_ansi(false)
            .with_writer(non_blocking)
            .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

        let console_layer = fmt::Layer::default()
            .with_target(true)
            .with_filter(filter_fn(move |metadata| metadata.level() <= &level));

        tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer)
            .try_init()?;

        tracing::info!(
            target: LOG_MAIN,
            "{} {} starting ({:?}), {}/{} under {:?}",
            path_context.app_id(),
            version,
            path_context.environment(),
            path_context.studio(),
            path_context.project_id(),
            path_context.base_path()
        );

        Ok(Self {
            context: AppContext {
                path_context,
                version,
                _log_guard: guard,
            },
            _marker: PhantomData,
        })
    }

    /// Build a Bevy-based application.
    ///
    /// ```ignore
    /// let app = AppBuilder::<MyApp>::new("1.0.0")?
    ///     .build_with_bevy(|mut app, ctx| {
    ///         app.add_plugins(DefaultPlugins);
    ///         app
    ///     });
    /// ```
    #[cfg(feature = "bevy")]
    pub fn build_with_bevy(
        self,
        configure: impl FnOnce(bevy::prelude::App, &AppContext) -> bevy::prelude::App,
    ) -> BevyApp<A> {
        let bevy_app = bevy::prelude::App::new();
        let configured_app = configure(bevy_app, &self.context);

        BevyApp {
            context: self.context,
            app: configured_app,
            _marker: PhantomData,
        }
    }
}

/// Bevy app plus the context that keeps logging alive.
#[cfg(feature = "bevy")]
pub struct BevyApp<A: Application> {
    pub context: AppContext,
    pub app: bevy::prelude::App,
    _marker: PhantomData<A>,
}

#[cfg(feature = "bevy")]
impl<A: Application> BevyApp<A> {
    pub fn run(&mut self) -> bevy::app::AppExit {
        self.app.run()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }
}
