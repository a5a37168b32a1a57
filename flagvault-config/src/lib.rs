// Configuration management for FlagVault
//
// Settings are layered: built-in defaults, then a JSON/TOML/.env file, then
// `FLAGVAULT_*` environment variables. Later layers win key by key.

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{LoadTestSettings, Settings, SimulationSettings};
pub use validation::{ConfigValidator, Validate};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Layered configuration manager
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Value,
    env_prefix: String,
}

impl ConfigManager {
    /// Create an empty manager reading `FLAGVAULT_*` variables
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Value::Object(Map::new()),
            env_prefix: prefix.into(),
        }
    }

    /// Start from the serialized form of `defaults`
    pub fn with_defaults<T: Serialize>(mut self, defaults: &T) -> Result<Self> {
        let value = serde_json::to_value(defaults)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        self.merge_value(value);
        Ok(self)
    }

    /// Overlay prefixed variables from the process environment
    pub fn load_env(&mut self) -> &mut Self {
        let env = EnvLoader::new(self.env_prefix.clone()).load();
        self.merge_value(env);
        self
    }

    /// Overlay prefixed variables from explicit pairs
    pub fn load_env_from<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let env = EnvLoader::new(self.env_prefix.clone()).load_from(vars);
        self.merge_value(env);
        self
    }

    /// Overlay a configuration file, format detected from its name
    pub fn load_file(&mut self, path: &Path) -> Result<&mut Self> {
        let loader = ConfigLoader::for_path(path)?;
        let data = loader.load_file(path)?;

        if !data.is_object() {
            return Err(ConfigError::ParseError(format!(
                "{} must contain a table at the top level",
                path.display()
            )));
        }

        debug!(path = %path.display(), format = ?loader.format(), "configuration file loaded");
        self.merge_value(data);
        Ok(self)
    }

    /// Overlay an arbitrary JSON value
    pub fn merge_value(&mut self, value: Value) {
        loader::merge(&mut self.config, value);
    }

    /// Set a value by dotted path
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        let overlay = key.rsplit('.').fold(json_value, |inner, part| {
            let mut map = Map::new();
            map.insert(part.to_string(), inner);
            Value::Object(map)
        });
        self.merge_value(overlay);
        Ok(())
    }

    /// Get a value by dotted path, e.g. `simulation.population`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .lookup(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::DeserializationError(format!("{}: {}", key, e)))
    }

    /// Get a value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Check if a dotted path exists
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.config, |value, part| value.get(part))
    }

    /// Deserialize the merged configuration and validate it
    pub fn build<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let built: T = serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        built.validate()?;

        Ok(built)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Load settings from defaults, an optional file, and `FLAGVAULT_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut manager = ConfigManager::new().with_defaults(&Settings::default())?;
        if let Some(path) = path {
            manager.load_file(path)?;
        }
        manager.load_env();
        manager.build()
    }

    /// Load settings from a file only, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut manager = ConfigManager::new().with_defaults(&Settings::default())?;
        manager.load_file(path)?;
        manager.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut manager = ConfigManager::new();
        manager.set("simulation.prefix", "member-").unwrap();

        let value: String = manager.get("simulation.prefix").unwrap();
        assert_eq!(value, "member-");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: usize = manager.get_or("simulation.population", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_missing_key() {
        let manager = ConfigManager::new();
        assert!(matches!(
            manager.get::<String>("missing"),
            Err(ConfigError::KeyNotFound(_))
        ));
        assert!(!manager.has("missing"));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut manager = ConfigManager::new()
            .with_defaults(&Settings::default())
            .unwrap();
        manager.load_env_from([
            ("FLAGVAULT_SIMULATION__POPULATION", "250"),
            ("FLAGVAULT_LOAD_TEST__PAUSE_MS", "0"),
        ]);

        let settings: Settings = manager.build().unwrap();
        assert_eq!(settings.simulation.population, 250);
        assert_eq!(settings.simulation.prefix, "user-");
        assert_eq!(settings.load_test.pause_ms, 0);
    }

    #[test]
    fn test_build_validates() {
        let mut manager = ConfigManager::new()
            .with_defaults(&Settings::default())
            .unwrap();
        manager.merge_value(json!({"simulation": {"workers": 0}}));

        assert!(matches!(
            manager.build::<Settings>(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_build_reports_type_errors() {
        let mut manager = ConfigManager::new();
        manager.merge_value(json!({"simulation": {"population": "lots"}}));

        assert!(matches!(
            manager.build::<Settings>(),
            Err(ConfigError::DeserializationError(_))
        ));
    }
}
