use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Origin of one settings value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the named environment variable
    EnvVar(String),
    /// Read from a settings file
    File(PathBuf),
    /// Built-in default, rendered as text
    Default(String),
    /// Set in code, or by a source that was not recorded
    Programmatic,
}

impl ConfigSource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "environment variable {}", var),
            ConfigSource::File(path) => write!(f, "file {}", path.display()),
            ConfigSource::Default(value) => write!(f, "default ({})", value),
            ConfigSource::Programmatic => write!(f, "set programmatically"),
        }
    }
}

/// Per-field origins collected while layering settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    sources: HashMap<&'static str, ConfigSource>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where `field` came from, replacing a lower layer
    pub fn record(&mut self, field: &'static str, source: ConfigSource) {
        self.sources.insert(field, source);
    }

    pub fn get(&self, field: &str) -> Option<&ConfigSource> {
        self.sources.get(field)
    }

    /// Fields whose value did not come from a default
    pub fn overridden(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = self
            .sources
            .iter()
            .filter(|(_, source)| !source.is_default())
            .map(|(field, _)| *field)
            .collect();
        fields.sort_unstable();
        fields
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
