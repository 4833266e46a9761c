//! Path context for runtime environment detection and project-aware paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies the runtime environment where the application is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running via `cargo run` or from a `target/` directory
    Development,
    /// Running as an installed binary
    Production,
}

/// Directory layout of one application: `<base>/<studio>/<project_id>`.
#[derive(Debug, Clone)]
pub struct PathContext {
    environment: RuntimeEnvironment,
    base_path: Arc<Path>,
    studio: String,
    project_id: String,
    app_id: &'static str,
}

impl PathContext {
    /// Creates a new PathContext with automatic environment detection.
    pub fn new(
        studio: impl Into<String>,
        project_id: impl Into<String>,
        app_id: &'static str,
    ) -> Self {
        let environment = Self::detect_environment();
        let base_path = Self::determine_base_path(environment);
        Self::assemble(environment, base_path, studio, project_id, app_id)
    }

    /// Creates a PathContext rooted at an explicit base path.
    pub fn with_base_path(
        base_path: PathBuf,
        studio: impl Into<String>,
        project_id: impl Into<String>,
        app_id: &'static str,
    ) -> Self {
        Self::assemble(
            Self::detect_environment(),
            base_path,
            studio,
            project_id,
            app_id,
        )
    }

    fn assemble(
        environment: RuntimeEnvironment,
        base_path: PathBuf,
        studio: impl Into<String>,
        project_id: impl Into<String>,
        app_id: &'static str,
    ) -> Self {
        Self {
            environment,
            base_path: base_path.into(),
            studio: studio.into(),
            project_id: project_id.into(),
            app_id,
        }
    }

    fn detect_environment() -> RuntimeEnvironment {
        if let Ok(exe_path) = std::env::current_exe() {
            if exe_path.components().any(|c| c.as_os_str() == "target") {
                return RuntimeEnvironment::Development;
            }
        }

        if std::env::var("CARGO").is_ok() || std::env::var("CARGO_MANIFEST_DIR").is_ok() {
            return RuntimeEnvironment::Development;
        }

        RuntimeEnvironment::Production
    }

    fn determine_base_path(environment: RuntimeEnvironment) -> PathBuf {
        match environment {
            RuntimeEnvironment::Development => std::env::var("CARGO_MANIFEST_DIR")
                .map(PathBuf::from)
                .or_else(|_| std::env::current_dir())
                .unwrap_or_else(|_| PathBuf::from(".")),
            // Falls back to the working directory on platforms without a data dir (wasm).
            RuntimeEnvironment::Production => dirs::data_local_dir()
                .map(|dir| dir.join("GlobalConnect"))
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn environment(&self) -> RuntimeEnvironment {
        self.environment
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn studio(&self) -> &str {
        &self.studio
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn app_id(&self) -> &str {
        self.app_id
    }

    /// Returns the project root path: `<base>/<studio>/<project_id>`
    pub fn project_root(&self) -> PathBuf {
        self.base_path.join(&self.studio).join(&self.project_id)
    }

    /// Returns the settings file path: `<studio>/<project_id>/<app_id>.settings.ron`
    pub fn settings_file(&self, app_id: Option<&str>) -> PathBuf {
        self.project_root()
            .join(format!("{}.settings.ron", app_id.unwrap_or(self.app_id)))
    }

    /// Returns the logs directory path: `<studio>/<project_id>/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.project_root().join("logs")
    }

    /// Returns a log file path: `<studio>/<project_id>/logs/<app_id>.<timestamp>.log`
    pub fn log_file(&self, timestamp: &str) -> PathBuf {
        self.logs_dir()
            .join(format!("{}.{}.log", self.app_id, timestamp))
    }

    /// Returns a log file path stamped with the current local time.
    pub fn log_file_now(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.log_file(&timestamp)
    }

    /// Creates the project root and the logs directory if missing.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [self.project_root(), self.logs_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_context_structure() {
        let ctx = PathContext::with_base_path(
            PathBuf::from("/test/base"),
            "studio",
            "global_connect",
            "globe",
        );

        assert_eq!(ctx.studio(), "studio");
        assert_eq!(ctx.project_id(), "global_connect");
        assert_eq!(ctx.app_id(), "globe");
        assert_eq!(ctx.base_path(), Path::new("/test/base"));
        // test binaries run from target/
        assert_eq!(ctx.environment(), RuntimeEnvironment::Development);
        assert_eq!(
            ctx.project_root(),
            PathBuf::from("/test/base/studio/global_connect")
        );
    }

    #[test]
    fn settings_paths() {
        let ctx = PathContext::with_base_path(PathBuf::from("/base"), "studio", "project", "app");

        assert_eq!(
            ctx.settings_file(None),
            PathBuf::from("/base/studio/project/app.settings.ron")
        );
        assert_eq!(
            ctx.settings_file(Some("other")),
            PathBuf::from("/base/studio/project/other.settings.ron")
        );
    }

    #[test]
    fn log_file_path() {
        let ctx = PathContext::with_base_path(PathBuf::from("/base"), "studio", "project", "app");

        assert_eq!(
            ctx.log_file("20240315-120000"),
            PathBuf::from("/base/studio/project/logs/app.20240315-120000.log")
        );
        assert!(ctx.log_file_now().starts_with("/base/studio/project/logs"));
    }

    #[test]
    fn ensure_directories_creates_layout() {
        let base = std::env::temp_dir().join(format!(
            "paths_test_{}",
            std::process::id()
        ));
        let ctx = PathContext::with_base_path(base.clone(), "studio", "project", "app");

        ctx.ensure_directories().unwrap();
        assert!(ctx.logs_dir().is_dir());

        let _ = std::fs::remove_dir_all(base);
    }
}
