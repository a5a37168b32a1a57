// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Separator between nesting levels in flat keys (`SIMULATION__POPULATION`).
pub const NESTING_SEPARATOR: &str = "__";

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect the format of a path. A bare `.env` file counts as `Env`.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Ok(FileFormat::Env);
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file name
    pub fn for_path(path: &Path) -> Result<Self> {
        Ok(Self::new(FileFormat::from_path(path)?))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => parse_json(content),
            FileFormat::Toml => parse_toml(content),
            FileFormat::Env => parse_env(content),
        }
    }
}

fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
}

fn parse_toml(content: &str) -> Result<Value> {
    let toml_value: toml::Value = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    serde_json::to_value(toml_value)
        .map_err(|e| ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e)))
}

fn parse_env(content: &str) -> Result<Value> {
    let mut map = Map::new();

    for item in dotenvy::from_read_iter(content.as_bytes()) {
        let (key, value) =
            item.map_err(|e| ConfigError::ParseError(format!(".env parse error: {}", e)))?;
        insert_flat(&mut map, &key, parse_scalar(&value));
    }

    Ok(Value::Object(map))
}

/// Interpret an environment-style value: booleans and numbers become typed
/// JSON values, anything else stays a string.
pub fn parse_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(int) = raw.parse::<i64>() {
                return Value::from(int);
            }
            match raw.parse::<f64>() {
                Ok(float) if float.is_finite() => Value::from(float),
                _ => Value::String(raw.to_string()),
            }
        }
    }
}

/// Insert `value` under a flat key, nesting on [`NESTING_SEPARATOR`].
/// Keys are lower-cased.
pub fn insert_flat(map: &mut Map<String, Value>, key: &str, value: Value) {
    let key = key.to_lowercase();
    let mut parts = key.split(NESTING_SEPARATOR).filter(|p| !p.is_empty()).peekable();
    let mut current = map;

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }

        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(inner) => inner,
            _ => return,
        };
    }
}

/// Recursively merge `overlay` into `base`. Objects merge key by key; any
/// other value replaces the base.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let result = loader.parse(r#"{"flags": [{"key": "beta"}]}"#).unwrap();
        assert_eq!(result["flags"][0]["key"], "beta");
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let toml = r#"
            [simulation]
            population = 500

            [[flags]]
            key = "beta"
            rollout = { percentage = 12.5, seed = "s" }
        "#;

        let result = loader.parse(toml).unwrap();
        assert_eq!(result["simulation"]["population"], 500);
        assert_eq!(result["flags"][0]["rollout"]["percentage"], 12.5);
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let env = r#"
            SIMULATION__POPULATION=5000
            export SIMULATION__PREFIX="member-"
            # Comment
            LOAD_TEST__PAUSE_MS=0
            VERBOSE=true
        "#;

        let result = loader.parse(env).unwrap();
        assert_eq!(
            result,
            json!({
                "simulation": {"population": 5000, "prefix": "member-"},
                "load_test": {"pause_ms": 0},
                "verbose": true
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ConfigLoader::new(FileFormat::Json).parse("{"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            ConfigLoader::new(FileFormat::Toml).parse("key ="),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            ConfigLoader::new(FileFormat::Env).parse("SIMULATION__POPULATION=5\nnot a pair\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("unknown"), None);

        assert_eq!(
            FileFormat::from_path(Path::new("config/flags.toml")).unwrap(),
            FileFormat::Toml
        );
        assert_eq!(FileFormat::from_path(Path::new(".env")).unwrap(), FileFormat::Env);
        assert!(matches!(
            FileFormat::from_path(Path::new("flags.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_path(Path::new("flags")).is_err());
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("42"), json!(42));
        assert_eq!(parse_scalar("12.5"), json!(12.5));
        assert_eq!(parse_scalar("false"), json!(false));
        assert_eq!(parse_scalar("seed-1"), json!("seed-1"));
        assert_eq!(parse_scalar("nan"), json!("nan"));
    }

    #[test]
    fn test_merge() {
        let mut base = json!({
            "simulation": {"population": 10000, "prefix": "user-"},
            "flags": [1]
        });
        merge(&mut base, json!({"simulation": {"population": 50}, "flags": [2, 3]}));

        assert_eq!(
            base,
            json!({"simulation": {"population": 50, "prefix": "user-"}, "flags": [2, 3]})
        );
    }

    #[test]
    fn test_insert_flat_replaces_scalars() {
        let mut map = Map::new();
        insert_flat(&mut map, "SIMULATION", json!(1));
        insert_flat(&mut map, "SIMULATION__WORKERS", json!(2));
        assert_eq!(Value::Object(map), json!({"simulation": {"workers": 2}}));
    }
}
