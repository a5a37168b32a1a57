// Environment variable loading

use crate::loader::{insert_flat, parse_scalar};
use serde_json::{Map, Value};
use std::env;

/// Default prefix for FlagVault environment variables.
pub const DEFAULT_PREFIX: &str = "FLAGVAULT";

/// Environment variable loader
///
/// `FLAGVAULT_SIMULATION__POPULATION=5000` becomes
/// `{"simulation": {"population": 5000}}`.
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a loader for variables starting with `{prefix}_`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load all matching variables from the process environment
    pub fn load(&self) -> Value {
        self.load_from(env::vars())
    }

    /// Load matching variables from an explicit set of pairs
    pub fn load_from<I, K, V>(&self, vars: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Map::new();
        let prefix = format!("{}_", self.prefix);

        for (key, value) in vars {
            if let Some(stripped) = key.as_ref().strip_prefix(&prefix) {
                insert_flat(&mut map, stripped, parse_scalar(value.as_ref()));
            }
        }

        Value::Object(map)
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
