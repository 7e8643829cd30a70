//! Connection options.

use crate::error::{ConfigurationError, Error};
use serde::Deserialize;
use std::path::Path;

/// Default connection name.
pub const DEFAULT_CONNECTION_NAME: &str = "default";

fn default_name() -> String {
    DEFAULT_CONNECTION_NAME.to_string()
}

/// Connection-wide options that influence metadata resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionOptions {
    /// Connection name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Prefix applied to every table name.
    pub entity_prefix: Option<String>,

    /// Default schema for tables that do not declare one.
    pub schema: Option<String>,

    /// Default database for tables that do not declare one.
    pub database: Option<String>,

    /// Entity classes to load. `None` loads every registered table.
    pub entities: Option<Vec<String>>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            entity_prefix: None,
            schema: None,
            database: None,
            entities: None,
        }
    }
}

impl ConnectionOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the table name prefix.
    pub fn with_entity_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entity_prefix = Some(prefix.into());
        self
    }

    /// Set the default schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the default database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Restrict loading to the given entity classes.
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entities = Some(entities.into_iter().map(Into::into).collect());
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidOptions(e.to_string()).into())
    }

    /// Read options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder() {
        let options = ConnectionOptions::new()
            .with_entity_prefix("app_")
            .with_schema("public")
            .with_entities(["User", "Post"]);

        assert_eq!(options.name, DEFAULT_CONNECTION_NAME);
        assert_eq!(options.entity_prefix.as_deref(), Some("app_"));
        assert_eq!(options.schema.as_deref(), Some("public"));
        assert_eq!(options.entities.unwrap().len(), 2);
    }

    #[test]
    fn test_from_json_uses_defaults() {
        let options = ConnectionOptions::from_json(r#"{"entityPrefix": "t_"}"#).unwrap();

        assert_eq!(options.name, DEFAULT_CONNECTION_NAME);
        assert_eq!(options.entity_prefix.as_deref(), Some("t_"));
        assert!(options.entities.is_none());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = ConnectionOptions::from_json(r#"{"schema": 3}"#).unwrap_err();

        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "reporting", "database": "warehouse"}}"#).unwrap();

        let options = ConnectionOptions::from_json_file(file.path()).unwrap();
        assert_eq!(options.name, "reporting");
        assert_eq!(options.database.as_deref(), Some("warehouse"));
    }
}
