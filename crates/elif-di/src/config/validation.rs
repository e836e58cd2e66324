use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T: ?Sized> {
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Bounds for a pool capacity
pub struct CapacityValidator {
    pub min: usize,
    pub max: usize,
}

impl Default for CapacityValidator {
    fn default() -> Self {
        Self { min: 1, max: 1024 }
    }
}

impl ConfigValidator<usize> for CapacityValidator {
    fn validate(&self, value: &usize) -> Result<(), ConfigError> {
        if *value < self.min || *value > self.max {
            return Err(ConfigError::invalid_value(
                "pool_capacity",
                value.to_string(),
                format!("capacity between {} and {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Context names show up in logs and graph exports
pub struct NameValidator;

impl ConfigValidator<str> for NameValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "name",
                "A context needs a non-blank name",
            ));
        }

        if let Some(invalid) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ConfigError::invalid_value(
                "name",
                value,
                format!("letters, digits, '-', '_' or '.', found '{}'", invalid),
            ));
        }
        Ok(())
    }
}
