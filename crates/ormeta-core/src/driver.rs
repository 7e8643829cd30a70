//! Driver capabilities consumed by the metadata builder.
//!
//! The builder never inspects which concrete driver is in use. Everything it
//! needs to know about the target database family is carried by a
//! [`DriverDescriptor`].

use crate::error::Error;
use std::fmt::Debug;

/// How a table path is composed from database, schema and table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePathStyle {
    /// `database.schema.table`, skipping absent parts.
    Qualified,
    /// `database.schema.table`, with an empty schema slot (`database..table`)
    /// when a database is given without a schema.
    EmptySchemaPlaceholder,
    /// `schema.table`; the database is not part of the path.
    SchemaOnly,
    /// `database.table`; schemas are not part of the path.
    DatabaseOnly,
}

/// Capability descriptor of a database family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDescriptor {
    /// Driver family name.
    pub name: String,
    /// Unique constraints are represented as unique indices.
    pub represents_unique_as_index: bool,
    /// Table path composition rule.
    pub table_path_style: TablePathStyle,
}

impl DriverDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, table_path_style: TablePathStyle) -> Self {
        Self {
            name: name.into(),
            represents_unique_as_index: false,
            table_path_style,
        }
    }

    /// Represent unique constraints as unique indices.
    pub fn with_unique_as_index(mut self) -> Self {
        self.represents_unique_as_index = true;
        self
    }

    /// PostgreSQL family.
    pub fn postgres() -> Self {
        Self::new("postgres", TablePathStyle::SchemaOnly)
    }

    /// MySQL / MariaDB family.
    pub fn mysql() -> Self {
        Self::new("mysql", TablePathStyle::DatabaseOnly).with_unique_as_index()
    }

    /// SQLite family.
    pub fn sqlite() -> Self {
        Self::new("sqlite", TablePathStyle::Qualified)
    }

    /// SQL Server family.
    pub fn mssql() -> Self {
        Self::new("mssql", TablePathStyle::EmptySchemaPlaceholder)
    }

    /// SAP HANA family.
    pub fn sap() -> Self {
        Self::new("sap", TablePathStyle::Qualified).with_unique_as_index()
    }

    /// Compose the table path.
    pub fn build_table_path(
        &self,
        table_name: &str,
        schema: Option<&str>,
        database: Option<&str>,
    ) -> String {
        let mut path: Vec<&str> = Vec::with_capacity(3);
        match self.table_path_style {
            TablePathStyle::Qualified => {
                path.extend(database);
                path.extend(schema);
            }
            TablePathStyle::EmptySchemaPlaceholder => {
                if let Some(database) = database {
                    path.push(database);
                    path.push(schema.unwrap_or(""));
                } else {
                    path.extend(schema);
                }
            }
            TablePathStyle::SchemaOnly => path.extend(schema),
            TablePathStyle::DatabaseOnly => path.extend(database),
        }
        path.push(table_name);
        path.join(".")
    }

    /// Compose the schema path. `None` when there is no schema.
    pub fn build_schema_path(&self, schema: Option<&str>, database: Option<&str>) -> Option<String> {
        let schema = schema?;
        match (database, self.table_path_style) {
            (_, TablePathStyle::SchemaOnly) | (None, _) => Some(schema.to_string()),
            (Some(database), _) => Some(format!("{database}.{schema}")),
        }
    }
}

impl Default for DriverDescriptor {
    fn default() -> Self {
        Self::postgres()
    }
}

/// A database driver as seen by the connection lifecycle.
///
/// Implementations own their network resources. `connect` is called before
/// metadata is built and `disconnect` whenever the connection is closed or its
/// bootstrap fails.
pub trait Driver: Debug + Send + Sync {
    /// Capability descriptor.
    fn descriptor(&self) -> &DriverDescriptor;

    /// Acquire driver resources.
    fn connect(&self) -> Result<(), Error>;

    /// Release driver resources.
    fn disconnect(&self) -> Result<(), Error>;
}

/// A driver without I/O, for building and inspecting metadata offline.
#[derive(Debug, Clone, Default)]
pub struct OfflineDriver {
    descriptor: DriverDescriptor,
}

impl OfflineDriver {
    /// Create an offline driver for the given database family.
    pub fn new(descriptor: DriverDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Driver for OfflineDriver {
    fn descriptor(&self) -> &DriverDescriptor {
        &self.descriptor
    }

    fn connect(&self) -> Result<(), Error> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_paths() {
        assert_eq!(
            DriverDescriptor::sqlite().build_table_path("users", Some("app"), Some("main")),
            "main.app.users"
        );
        assert_eq!(
            DriverDescriptor::mssql().build_table_path("users", None, Some("main")),
            "main..users"
        );
        assert_eq!(
            DriverDescriptor::mssql().build_table_path("users", Some("dbo"), Some("main")),
            "main.dbo.users"
        );
        assert_eq!(
            DriverDescriptor::postgres().build_table_path("users", Some("app"), Some("main")),
            "app.users"
        );
        assert_eq!(
            DriverDescriptor::mysql().build_table_path("users", Some("app"), Some("main")),
            "main.users"
        );
        assert_eq!(
            DriverDescriptor::sqlite().build_table_path("users", None, None),
            "users"
        );
    }

    #[test]
    fn test_schema_paths() {
        assert_eq!(DriverDescriptor::postgres().build_schema_path(None, Some("main")), None);
        assert_eq!(
            DriverDescriptor::postgres().build_schema_path(Some("app"), Some("main")),
            Some("app".to_string())
        );
        assert_eq!(
            DriverDescriptor::mssql().build_schema_path(Some("dbo"), Some("main")),
            Some("main.dbo".to_string())
        );
    }

    #[test]
    fn test_unique_representation_flag() {
        assert!(DriverDescriptor::mysql().represents_unique_as_index);
        assert!(!DriverDescriptor::postgres().represents_unique_as_index);
    }
}
