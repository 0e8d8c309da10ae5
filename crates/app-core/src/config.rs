//! Thread-safe configuration loading with optional file-watch reloading.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use std::time::Duration;

use config::{Config as RawConfig, File};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration file")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize file watcher")]
    Watch(#[from] notify::Error),

    #[error("Configuration lock was poisoned, indicating a panic in another thread")]
    LockPoisoned,
}

#[derive(Debug)]
pub struct Config {
    // RwLock so readers never block each other; the watcher thread takes the
    // write lock only while swapping in a freshly parsed file.
    inner: Arc<RwLock<RawConfig>>,
    // Dropping the watcher stops the reload thread.
    _watcher: Option<RecommendedWatcher>,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let guard = self.inner.read().map_err(|_| ConfigError::LockPoisoned)?;
        guard.get(key).map_err(ConfigError::from)
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    watch: bool,
    watch_interval: Duration,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, watch: false, watch_interval: Duration::from_secs(2) }
    }

    pub fn watch(mut self) -> Self {
        self.watch = true;
        self
    }

    pub fn watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let raw = load(&self.path)?;
        let inner = Arc::new(RwLock::new(raw));

        let watcher = if self.watch {
            Some(spawn_reload_watcher(self.path, Arc::clone(&inner), self.watch_interval)?)
        } else {
            None
        };

        Ok(Config { inner, _watcher: watcher })
    }
}

fn load(path: &Path) -> Result<RawConfig, ConfigError> {
    RawConfig::builder()
        .add_source(File::from(path))
        .build()
        .map_err(ConfigError::from)
}

fn spawn_reload_watcher(
    path: PathBuf,
    inner: Arc<RwLock<RawConfig>>,
    interval: Duration,
) -> Result<RecommendedWatcher, ConfigError> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default().with_poll_interval(interval))?;
    watcher.watch(&path, RecursiveMode::NonRecursive)?;

    thread::spawn(move || {
        tracing::info!("Watching configuration file for changes: {}", path.to_string_lossy());
        while let Ok(event) = rx.recv() {
            match event {
                Ok(Event { kind: notify::EventKind::Modify(_), .. }) => {
                    tracing::info!("Configuration file changed. Reloading...");
                    match load(&path) {
                        Ok(fresh) => {
                            if let Ok(mut guard) = inner.write() {
                                *guard = fresh;
                                tracing::info!("Configuration reloaded successfully.");
                            } else {
                                tracing::error!("Failed to acquire write lock for reloading config.");
                            }
                        },
                        Err(err) => {
                            tracing::error!("Failed to reload configuration file: {err:?}");
                        },
                    }
                },
                Ok(_) => {},
                Err(err) => tracing::error!("Configuration watcher error: {err:?}"),
            }
        }
    });

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write as _;

    use serde::Deserialize;
    use tempfile::NamedTempFile;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct DatabaseSection {
        url: String,
        max_connections: u32,
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".yaml").expect("Failed to create temp config");
        file.write_all(content.as_bytes()).expect("Failed to write temp config");
        file.flush().expect("Failed to flush temp config");
        file
    }

    #[test]
    fn test_get_typed_values() {
        let file = write_config(
            r#"
            server:
                address: "0.0.0.0:8000"
                timeout_secs: 30
            database:
                url: "postgres://localhost/app"
                max_connections: 10
            "#,
        );

        let config = Config::builder(file.path()).build().expect("Failed to build config");

        let address: String = config.get("server.address").unwrap();
        let timeout: u64 = config.get("server.timeout_secs").unwrap();
        let db: DatabaseSection = config.get("database").unwrap();

        assert_eq!(address, "0.0.0.0:8000");
        assert_eq!(timeout, 30);
        assert_eq!(db.url, "postgres://localhost/app");
        assert_eq!(db.max_connections, 10);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let file = write_config("server:\n    address: \"0.0.0.0:8000\"\n");
        let config = Config::builder(file.path()).build().expect("Failed to build config");

        let result = config.get::<String>("server.nope");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_nonexistent_file_is_an_error() {
        let result = Config::builder("/nonexistent/path/config.yaml").build();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let file = write_config("server: [unterminated\n");
        let result = Config::builder(file.path()).build();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_auto_reload_picks_up_changes() {
        let file = write_config("app_name: \"before\"\n");
        let config = Config::builder(file.path())
            .watch()
            .watch_interval(Duration::from_millis(100))
            .build()
            .expect("Failed to build config with watch");

        let name: String = config.get("app_name").unwrap();
        assert_eq!(name, "before");

        fs::write(file.path(), "app_name: \"after\"\n").expect("Failed to update config file");

        // Wait for the watcher to observe the change and swap the config in.
        thread::sleep(Duration::from_millis(500));

        let name: String = config.get("app_name").unwrap();
        assert_eq!(name, "after");
    }
}
