//! Entity target identity.

use rkyv::{Archive, Deserialize, Serialize};
use std::fmt;

/// The identity an entity is registered under.
///
/// A target is either a declared class (which may take part in class
/// inheritance) or a bare table name for schema-defined entities that have no
/// class. The two kinds never compare equal, even when the names coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
pub enum Target {
    /// A declared entity class.
    Class(String),
    /// A string-identified table without a class.
    Table(String),
}

impl Target {
    /// Create a class target.
    pub fn class(name: impl Into<String>) -> Self {
        Target::Class(name.into())
    }

    /// Create a table target.
    pub fn table(name: impl Into<String>) -> Self {
        Target::Table(name.into())
    }

    /// The raw name of the target.
    pub fn name(&self) -> &str {
        match self {
            Target::Class(name) | Target::Table(name) => name,
        }
    }

    /// Class name, if this is a class target.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Target::Class(name) => Some(name),
            Target::Table(_) => None,
        }
    }

    /// Check if this is a class target.
    pub fn is_class(&self) -> bool {
        matches!(self, Target::Class(_))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
