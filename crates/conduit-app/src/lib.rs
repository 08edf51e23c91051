//! Conduit application layer.
//!
//! [`Launcher`] is the surface a presentation layer (CLI here, a GUI
//! elsewhere) talks to: submit a share-link, start and stop the engine,
//! list link history. Every failure comes back as a [`LaunchError`];
//! nothing in this crate aborts the process.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use conduit_core::{EngineConfig, ShareLink};
use conduit_engine::{EngineHandle, EngineSupervisor, LogSink};
use conduit_storage::LinkStore;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Link parsing or config generation failed.
    #[error(transparent)]
    Core(#[from] conduit_core::CoreError),

    /// History persistence failed.
    #[error(transparent)]
    Storage(#[from] conduit_storage::StorageError),

    /// Engine supervision failed.
    #[error(transparent)]
    Engine(#[from] conduit_engine::EngineError),

    /// No usable data directory on this platform.
    #[error("No data directory available")]
    NoDataDir,
}

/// Result type for launcher operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

/// File locations and the engine binary the launcher works with.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    /// Proxy engine binary; a bare name resolves through PATH.
    pub engine: PathBuf,
    /// Where the generated config document is written.
    pub config: PathBuf,
    /// Where link history is persisted.
    pub history: PathBuf,
}

impl LauncherPaths {
    /// Platform-default locations under the project data directory,
    /// with the engine binary resolved from PATH.
    pub fn default_paths() -> Result<Self> {
        let dirs = ProjectDirs::from("", "conduit", "Conduit").ok_or(LaunchError::NoDataDir)?;
        let data = dirs.data_dir();
        Ok(Self {
            engine: PathBuf::from("xray"),
            config: data.join("config.json"),
            history: data.join(conduit_storage::store::HISTORY_FILE),
        })
    }
}

/// The core collaborator behind any Conduit front-end.
pub struct Launcher {
    paths: LauncherPaths,
    store: LinkStore,
    supervisor: EngineSupervisor,
}

impl Launcher {
    /// Creates a launcher over the given paths.
    pub fn new(paths: LauncherPaths) -> Self {
        let store = LinkStore::new(&paths.history);
        let supervisor = EngineSupervisor::new(&paths.engine);
        Self {
            paths,
            store,
            supervisor,
        }
    }

    /// The paths this launcher was built with.
    pub fn paths(&self) -> &LauncherPaths {
        &self.paths
    }

    /// Parses `raw`, writes the engine config, and records the link in
    /// history. Returns the config file path on success.
    ///
    /// History is only appended after the config was written, so a
    /// rejected link never pollutes the history.
    pub fn submit(&self, raw: &str) -> Result<PathBuf> {
        let link = ShareLink::parse(raw)?;
        EngineConfig::for_link(&link).write_to(&self.paths.config)?;
        self.store.append(raw.trim())?;
        tracing::info!(
            "Prepared config for {}:{} at {}",
            link.host,
            link.port,
            self.paths.config.display()
        );
        Ok(self.paths.config.clone())
    }

    /// Parses `raw` and writes the engine config to `output` without
    /// touching history or starting anything.
    pub fn convert(&self, raw: &str, output: &Path) -> Result<()> {
        let link = ShareLink::parse(raw)?;
        EngineConfig::for_link(&link).write_to(output)?;
        Ok(())
    }

    /// Starts the engine against `config_path`, relaying its output to
    /// `sink`.
    pub fn start(&self, config_path: &Path, sink: LogSink) -> Result<EngineHandle> {
        Ok(self.supervisor.start(config_path, sink)?)
    }

    /// Forcefully stops the running engine, if any.
    pub fn stop(&self) {
        self.supervisor.stop();
    }

    /// Whether a launched engine is still tracked as running.
    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Loads the stored link history for display.
    pub fn history(&self) -> Result<Vec<String>> {
        Ok(self.store.load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = "vless://u1@example.com:443?sni=s.example&pbk=PK&sid=SD#lab";

    fn launcher_in(dir: &tempfile::TempDir) -> Launcher {
        Launcher::new(LauncherPaths {
            engine: PathBuf::from("/nonexistent/engine"),
            config: dir.path().join("config.json"),
            history: dir.path().join("links.json"),
        })
    }

    #[test]
    fn test_submit_writes_config_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_in(&dir);

        let config_path = launcher.submit(LINK).unwrap();
        assert!(config_path.exists());

        let json = std::fs::read_to_string(&config_path).unwrap();
        assert!(json.contains("\"address\": \"example.com\""));

        assert_eq!(launcher.history().unwrap(), vec![LINK]);
    }

    #[test]
    fn test_submit_dedups_history() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_in(&dir);

        launcher.submit(LINK).unwrap();
        launcher.submit(LINK).unwrap();

        assert_eq!(launcher.history().unwrap().len(), 1);
    }

    #[test]
    fn test_submit_rejects_bad_link_without_history_entry() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_in(&dir);

        let err = launcher.submit("vless://u1@example.com:443?sni=x").unwrap_err();
        assert!(matches!(err, LaunchError::Core(_)));
        assert!(launcher.history().unwrap().is_empty());
    }

    #[test]
    fn test_convert_leaves_history_alone() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_in(&dir);
        let out = dir.path().join("out.json");

        launcher.convert(LINK, &out).unwrap();

        assert!(out.exists());
        assert!(launcher.history().unwrap().is_empty());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher_in(&dir);
        launcher.stop();
        assert!(!launcher.is_running());
    }
}
