//! Naming strategies.
//!
//! A naming strategy maps class and property names (plus optional user
//! overrides) to physical table, column and constraint names. The builder only
//! consumes the [`NamingStrategy`] contract; [`DefaultNamingStrategy`] is the
//! policy used when the caller does not supply one.

use inflector::Inflector;
use std::fmt::Debug;

/// Length of the hash part of generated constraint names.
const CONSTRAINT_HASH_LEN: usize = 26;

/// Policy converting logical names into physical names.
pub trait NamingStrategy: Debug + Send + Sync {
    /// Table name for a target. `given_name` wins when present.
    fn table_name(&self, target_name: &str, given_name: Option<&str>) -> String;

    /// Apply the global entity prefix to a table name.
    fn prefix_table_name(&self, prefix: &str, table_name: &str) -> String {
        format!("{prefix}{table_name}")
    }

    /// Column name for a property, inside zero or more embedded prefixes.
    fn column_name(
        &self,
        property_name: &str,
        given_name: Option<&str>,
        embedded_prefixes: &[String],
    ) -> String;

    /// Foreign key column name for a relation.
    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String;

    /// Index name.
    fn index_name(&self, table_name: &str, column_names: &[String], where_clause: Option<&str>)
        -> String;

    /// Unique constraint name.
    fn unique_constraint_name(&self, table_name: &str, column_names: &[String]) -> String;

    /// Check constraint name.
    fn check_constraint_name(&self, table_name: &str, expression: &str) -> String;

    /// Foreign key constraint name.
    fn foreign_key_name(&self, table_name: &str, column_names: &[String]) -> String;

    /// Name of the unique constraint backing a one-to-one relation.
    fn relation_constraint_name(&self, table_name: &str, column_names: &[String]) -> String;
}

/// The default naming policy.
///
/// Tables are snake_cased class names, embedded columns are prefixed in
/// camelCase (`address` + `city` → `addressCity`), join columns are
/// `relation` + `Id`, and constraint names are a kind prefix followed by a
/// truncated hash of the table and column names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl DefaultNamingStrategy {
    fn hashed(prefix: &str, key: &str) -> String {
        let digest = hex::encode(blake3::hash(key.as_bytes()).as_bytes());
        format!("{prefix}{}", &digest[..CONSTRAINT_HASH_LEN])
    }

    fn sorted_key(table_name: &str, column_names: &[String]) -> String {
        let mut sorted = column_names.to_vec();
        sorted.sort();
        format!("{table_name}_{}", sorted.join("_"))
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn table_name(&self, target_name: &str, given_name: Option<&str>) -> String {
        match given_name {
            Some(name) => name.to_string(),
            None => target_name.to_snake_case(),
        }
    }

    fn column_name(
        &self,
        property_name: &str,
        given_name: Option<&str>,
        embedded_prefixes: &[String],
    ) -> String {
        let name = given_name.unwrap_or(property_name);
        let prefixes: Vec<&str> = embedded_prefixes
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .collect();
        if prefixes.is_empty() {
            return name.to_string();
        }

        let mut chars = name.chars();
        let titled = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{}{titled}", prefixes.join("_").to_camel_case())
    }

    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String {
        format!("{relation_name}_{referenced_column_name}").to_camel_case()
    }

    fn index_name(
        &self,
        table_name: &str,
        column_names: &[String],
        where_clause: Option<&str>,
    ) -> String {
        let mut key = Self::sorted_key(table_name, column_names);
        if let Some(condition) = where_clause {
            key.push('_');
            key.push_str(condition);
        }
        Self::hashed("IDX_", &key)
    }

    fn unique_constraint_name(&self, table_name: &str, column_names: &[String]) -> String {
        Self::hashed("UQ_", &Self::sorted_key(table_name, column_names))
    }

    fn check_constraint_name(&self, table_name: &str, expression: &str) -> String {
        Self::hashed("CHK_", &format!("{table_name}_{expression}"))
    }

    fn foreign_key_name(&self, table_name: &str, column_names: &[String]) -> String {
        Self::hashed("FK_", &Self::sorted_key(table_name, column_names))
    }

    fn relation_constraint_name(&self, table_name: &str, column_names: &[String]) -> String {
        Self::hashed("REL_", &Self::sorted_key(table_name, column_names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        let naming = DefaultNamingStrategy;

        assert_eq!(naming.table_name("ContentModel", None), "content_model");
        assert_eq!(naming.table_name("User", Some("users")), "users");
        assert_eq!(naming.prefix_table_name("app_", "users"), "app_users");
    }

    #[test]
    fn test_column_name_with_embedded_prefixes() {
        let naming = DefaultNamingStrategy;

        assert_eq!(naming.column_name("city", None, &[]), "city");
        assert_eq!(
            naming.column_name("city", None, &["address".to_string()]),
            "addressCity"
        );
        assert_eq!(
            naming.column_name("city", Some("town"), &["home".into(), "address".into()]),
            "homeAddressTown"
        );
        assert_eq!(naming.column_name("city", None, &[String::new()]), "city");
    }

    #[test]
    fn test_join_column_name() {
        let naming = DefaultNamingStrategy;

        assert_eq!(naming.join_column_name("author", "id"), "authorId");
    }

    #[test]
    fn test_constraint_names_are_stable_and_order_independent() {
        let naming = DefaultNamingStrategy;
        let a = naming.index_name("users", &["name".into(), "email".into()], None);
        let b = naming.index_name("users", &["email".into(), "name".into()], None);

        assert_eq!(a, b);
        assert!(a.starts_with("IDX_"));
        assert_eq!(a.len(), "IDX_".len() + CONSTRAINT_HASH_LEN);
        assert_ne!(a, naming.index_name("users", &["name".into()], None));
        assert_ne!(
            naming.index_name("users", &["name".into()], None),
            naming.index_name("users", &["name".into()], Some("name IS NOT NULL"))
        );
        assert!(naming
            .unique_constraint_name("users", &["email".into()])
            .starts_with("UQ_"));
        assert!(naming
            .check_constraint_name("users", "age > 0")
            .starts_with("CHK_"));
    }
}
