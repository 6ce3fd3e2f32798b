use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

/// What the dashboard tracks when nothing has been persisted yet.
pub const DEFAULT_CITY: &str = "臺北市";

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// CWA open-data authorization key.
    pub api_key: Option<String>,

    /// Canonical name of the last city picked in the settings flow.
    pub city_name: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skydash", "skydash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The configured authorization key, with a hint when it is missing.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No CWA authorization key configured.\n\
                 Hint: run `skydash configure` and paste your opendata.cwa.gov.tw key."
            )
        })
    }

    /// The persisted city, falling back to the default.
    pub fn city(&self) -> &str {
        self.city_name.as_deref().unwrap_or(DEFAULT_CITY)
    }
}

/// Read/write collaborator for the persisted city selection.
///
/// The dashboard core never touches storage directly; embedders inject
/// whichever store fits them.
pub trait SelectionStore: Send + Sync + Debug {
    fn load(&self) -> Option<String>;
    fn store(&self, city_name: &str) -> Result<()>;
}

/// Persists the selection inside the TOML config file.
#[derive(Debug)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: Config::config_file_path()?,
        })
    }

    /// Store backed by an explicit file instead of the platform config dir.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self) -> Option<String> {
        Config::load_from(&self.path).ok()?.city_name
    }

    fn store(&self, city_name: &str) -> Result<()> {
        let mut config = Config::load_from(&self.path)?;
        config.city_name = Some(city_name.to_string());
        config.save_to(&self.path)
    }
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    city: Mutex<Option<String>>,
}

impl MemorySelectionStore {
    pub fn with(city_name: &str) -> Self {
        Self {
            city: Mutex::new(Some(city_name.to_string())),
        }
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load(&self) -> Option<String> {
        self.city.lock().clone()
    }

    fn store(&self, city_name: &str) -> Result<()> {
        *self.city.lock() = Some(city_name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_falls_back_to_the_default() {
        let cfg = Config::default();
        assert_eq!(cfg.city(), DEFAULT_CITY);

        let cfg = Config {
            city_name: Some("高雄市".to_string()),
            ..Config::default()
        };
        assert_eq!(cfg.city(), "高雄市");
    }

    #[test]
    fn missing_api_key_errors_with_a_hint() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();
        assert!(err.to_string().contains("skydash configure"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            city_name: Some("臺北市".to_string()),
        };

        let toml = toml::to_string_pretty(&cfg).expect("serializes");
        let back: Config = toml::from_str(&toml).expect("parses");

        assert_eq!(back.api_key.as_deref(), Some("KEY"));
        assert_eq!(back.city_name.as_deref(), Some("臺北市"));
    }

    #[test]
    fn file_store_round_trips_and_keeps_the_key() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");

        let seeded = Config {
            api_key: Some("KEY".to_string()),
            city_name: None,
        };
        seeded.save_to(&path).expect("seed config");

        let store = FileSelectionStore::at(path.clone());
        assert_eq!(store.load(), None);

        store.store("高雄市").expect("store city");
        assert_eq!(store.load(), Some("高雄市".to_string()));

        let reloaded = Config::load_from(&path).expect("reload");
        assert_eq!(reloaded.api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileSelectionStore::at(dir.path().join("nope.toml"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySelectionStore::default();
        assert_eq!(store.load(), None);
        store.store("臺南市").expect("store city");
        assert_eq!(store.load(), Some("臺南市".to_string()));

        let seeded = MemorySelectionStore::with("基隆市");
        assert_eq!(seeded.load(), Some("基隆市".to_string()));
    }
}
