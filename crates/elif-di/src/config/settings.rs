use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{
    CapacityValidator, ConfigError, ConfigSource, ConfigValidator, NameValidator, SourceMap,
};

pub const ENV_NAME: &str = "ELIF_DI_NAME";
pub const ENV_POOL_CAPACITY: &str = "ELIF_DI_POOL_CAPACITY";
pub const ENV_REGISTER_POOLED: &str = "ELIF_DI_REGISTER_POOLED";

const DEFAULT_NAME: &str = "default";
const DEFAULT_POOL_CAPACITY: usize = 2;

/// Settings applied to a [`ContextConfig`](crate::container::ContextConfig)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectSettings {
    /// Context name used in logs and graph exports
    pub name: String,
    /// Capacity of pools created by the pooled scope
    pub pool_capacity: usize,
    /// Register the pooled scope when the registry is created
    pub register_pooled: bool,
}

/// File layer; absent keys leave the lower layer untouched
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    name: Option<String>,
    pool_capacity: Option<usize>,
    register_pooled: Option<bool>,
}

impl InjectSettings {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            register_pooled: false,
        }
    }

    /// Load settings from `ELIF_DI_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::layered(None).map(|(settings, _)| settings)
    }

    /// Defaults, then the optional file, then `ELIF_DI_*` variables
    ///
    /// Returns the validated settings with the origin of every field.
    pub fn layered(file: Option<&Path>) -> Result<(Self, SourceMap), ConfigError> {
        let mut settings = Self::new();
        let mut sources = SourceMap::new();
        sources.record("name", ConfigSource::Default(DEFAULT_NAME.to_string()));
        sources.record(
            "pool_capacity",
            ConfigSource::Default(DEFAULT_POOL_CAPACITY.to_string()),
        );
        sources.record("register_pooled", ConfigSource::Default("false".to_string()));

        if let Some(path) = file {
            let layer: SettingsFile = parse_file(path)?;
            let origin = || ConfigSource::File(path.to_path_buf());
            if let Some(name) = layer.name {
                settings.name = name;
                sources.record("name", origin());
            }
            if let Some(capacity) = layer.pool_capacity {
                settings.pool_capacity = capacity;
                sources.record("pool_capacity", origin());
            }
            if let Some(flag) = layer.register_pooled {
                settings.register_pooled = flag;
                sources.record("register_pooled", origin());
            }
        }

        if let Ok(name) = env::var(ENV_NAME) {
            settings.name = name;
            sources.record("name", ConfigSource::EnvVar(ENV_NAME.to_string()));
        }

        if let Ok(capacity) = env::var(ENV_POOL_CAPACITY) {
            settings.pool_capacity = capacity.trim().parse().map_err(|_| {
                ConfigError::invalid_value("pool_capacity", capacity.clone(), "positive integer")
            })?;
            sources.record("pool_capacity", ConfigSource::EnvVar(ENV_POOL_CAPACITY.to_string()));
        }

        if let Ok(flag) = env::var(ENV_REGISTER_POOLED) {
            settings.register_pooled = parse_flag(&flag).ok_or_else(|| {
                ConfigError::invalid_value("register_pooled", flag.clone(), "true or false")
            })?;
            sources.record(
                "register_pooled",
                ConfigSource::EnvVar(ENV_REGISTER_POOLED.to_string()),
            );
        }

        settings.validate()?;
        tracing::debug!(
            name = %settings.name,
            overridden = ?sources.overridden(),
            "Resolved injection settings"
        );
        Ok((settings, sources))
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a `.json` file, anything else is read as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Self = parse_file(path.as_ref())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        NameValidator.validate(self.name.as_str())?;
        CapacityValidator::default().validate(&self.pool_capacity)?;
        Ok(())
    }

    /// Origin of each current value as far as the environment can tell
    ///
    /// A value matching its `ELIF_DI_*` variable is reported as coming from it and
    /// a value equal to the default as the default. Anything else was set in code
    /// or by a settings file; use [`layered`](Self::layered) to keep file origins.
    pub fn config_sources(&self) -> SourceMap {
        let mut sources = SourceMap::new();
        sources.record(
            "name",
            source_of(
                ENV_NAME,
                |value| value == self.name,
                &self.name,
                DEFAULT_NAME,
            ),
        );
        sources.record(
            "pool_capacity",
            source_of(
                ENV_POOL_CAPACITY,
                |value| value.trim().parse::<usize>().ok() == Some(self.pool_capacity),
                &self.pool_capacity.to_string(),
                &DEFAULT_POOL_CAPACITY.to_string(),
            ),
        );
        sources.record(
            "register_pooled",
            source_of(
                ENV_REGISTER_POOLED,
                |value| parse_flag(value) == Some(self.register_pooled),
                &self.register_pooled.to_string(),
                "false",
            ),
        );
        sources
    }
}

impl Default for InjectSettings {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "Loading injection settings");

    match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => Ok(serde_json::from_str(&source)?),
        _ => Ok(serde_yaml::from_str(&source)?),
    }
}

fn source_of(
    var: &str,
    matches_env: impl Fn(&str) -> bool,
    current: &str,
    default: &str,
) -> ConfigSource {
    match env::var(var) {
        Ok(value) if matches_env(&value) => ConfigSource::EnvVar(var.to_string()),
        _ if current == default => ConfigSource::Default(default.to_string()),
        _ => ConfigSource::Programmatic,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = InjectSettings::default();
        assert_eq!(settings.name, "default");
        assert_eq!(settings.pool_capacity, 2);
        assert!(!settings.register_pooled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_yaml_fills_missing_fields() {
        let settings =
            InjectSettings::from_yaml_str("name: orders\nregister_pooled: true\n").unwrap();
        assert_eq!(settings.name, "orders");
        assert_eq!(settings.pool_capacity, 2);
        assert!(settings.register_pooled);
    }

    #[test]
    fn test_json_rejects_zero_capacity() {
        let result = InjectSettings::from_json_str(r#"{"pool_capacity": 0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = InjectSettings::from_yaml_str("pool_capacity: [1, 2");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" Yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
