//! Configuration types for the responder

use serde::{Deserialize, Serialize};

use crate::builder::RESERVED_PREFIX;
use crate::error::ConfigError;

/// Default name of the reserved introspection method.
///
/// Registered member names cannot start with `@`, so this never collides
/// with a real method.
pub const DEFAULT_INTROSPECTION_METHOD: &str = "@definition";

/// Responder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Name of the method that returns the whole definition tree. Must
    /// start with `@`.
    pub introspection_method: String,

    /// Whether the introspection method is served at all
    pub enable_introspection: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            introspection_method: DEFAULT_INTROSPECTION_METHOD.to_string(),
            enable_introspection: true,
        }
    }
}

impl ResponderConfig {
    pub fn with_introspection_method(mut self, name: impl Into<String>) -> Self {
        self.introspection_method = name.into();
        self
    }

    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.enable_introspection = enabled;
        self
    }

    /// Load from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject an introspection name that a registered method could also use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enable_introspection && !self.introspection_method.starts_with(RESERVED_PREFIX) {
            return Err(ConfigError::UnreservedIntrospectionName(
                self.introspection_method.clone(),
            ));
        }
        Ok(())
    }

    /// The reserved method name, if introspection is enabled
    pub fn introspection(&self) -> Option<&str> {
        self.enable_introspection
            .then_some(self.introspection_method.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResponderConfig::default();
        assert_eq!(config.introspection(), Some("@definition"));
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = ResponderConfig::default()
            .with_introspection_method("@describe")
            .with_introspection(false);
        assert_eq!(config.introspection_method, "@describe");
        assert_eq!(config.introspection(), None);
    }

    #[test]
    fn test_introspection_name_must_be_reserved() {
        let config = ResponderConfig::default().with_introspection_method("describe");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnreservedIntrospectionName(name)) if name == "describe"
        ));

        assert!(ResponderConfig::default()
            .with_introspection_method("@describe")
            .validate()
            .is_ok());

        // a disabled method cannot shadow anything
        assert!(config.with_introspection(false).validate().is_ok());

        assert!(matches!(
            ResponderConfig::from_json_str(r#"{"introspection_method": "describe"}"#),
            Err(ConfigError::UnreservedIntrospectionName(_))
        ));
    }

    #[test]
    fn test_partial_json() {
        let config = ResponderConfig::from_json_str(r#"{"enable_introspection": false}"#).unwrap();
        assert_eq!(config.introspection_method, DEFAULT_INTROSPECTION_METHOD);
        assert!(!config.enable_introspection);

        assert!(matches!(
            ResponderConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
