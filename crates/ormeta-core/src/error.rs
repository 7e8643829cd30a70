//! Core error types.

use crate::registry::Target;
use thiserror::Error;

/// Metadata engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally inconsistent registrations or options.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Registrations that reference things that do not exist.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Metadata lookup miss at runtime.
    #[error("no metadata for \"{target}\" was found")]
    NotFound {
        /// The requested target.
        target: Target,
    },

    /// A lazy relation was accessed on an instance created without a loader.
    #[error("lazy relation \"{property}\" of \"{entity}\" cannot be loaded without a relation loader")]
    MissingRelationLoader {
        /// Entity name.
        entity: String,
        /// Relation property path.
        property: String,
    },

    /// Driver failure while opening or closing a connection.
    #[error("driver error: {0}")]
    Driver(String),

    /// Value model error.
    #[error("value error: {0}")]
    Value(#[from] ormeta_proto::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Options file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Fatal to bootstrap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The same target was registered as a table more than once.
    #[error("entity \"{target}\" is registered as a table more than once")]
    DuplicateTarget { target: Target },

    /// Two different entities resolve to the same physical table.
    #[error("table \"{table}\" is claimed by both \"{first}\" and \"{second}\"")]
    DuplicateTableName {
        table: String,
        first: String,
        second: String,
    },

    /// A single-table child has no single-table ancestor table.
    #[error("entity \"{entity}\" is a single-table child but no single-table parent was found")]
    UnresolvedSingleTableParent { entity: String },

    /// The declared class hierarchy contains a cycle.
    #[error("class hierarchy of \"{class}\" is cyclic")]
    CyclicClassHierarchy { class: String },

    /// A scalar id was given for an entity with a composite primary key.
    #[error(
        "cannot create entity id map for \"{entity}\": it has multiple primary keys and a scalar id ({id}) was given"
    )]
    CannotCreateEntityIdMap { entity: String, id: String },

    /// The connection is already open.
    #[error("connection is already open")]
    AlreadyConnected,

    /// The connection is not open.
    #[error("connection is not open")]
    NotConnected,

    /// Connection options could not be parsed.
    #[error("invalid connection options: {0}")]
    InvalidOptions(String),
}

/// Validation errors. Fatal to bootstrap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A relation points at a type that has no entity metadata.
    #[error("entity metadata for {entity}#{property} was not found (relation target \"{target}\")")]
    MissingRelationTarget {
        entity: String,
        property: String,
        target: String,
    },

    /// A relation declares an inverse side that does not exist.
    #[error("{entity}#{property} declares inverse side \"{inverse}\" which does not exist on \"{target}\"")]
    MissingInverseSide {
        entity: String,
        property: String,
        target: String,
        inverse: String,
    },

    /// An embedded type embeds itself, directly or transitively.
    #[error("embedded \"{embedded}\" in \"{entity}\" embeds itself through {path}")]
    EmbeddedCycle {
        entity: String,
        embedded: String,
        path: String,
    },

    /// An index or unique constraint references a property that does not exist.
    #[error("{kind} {name}contains column that is missing in the entity ({entity}): {property}")]
    MissingConstraintColumn {
        kind: &'static str,
        name: String,
        entity: String,
        property: String,
    },

    /// A relation id or relation count references an unknown relation.
    #[error("{entity}#{property} references relation \"{relation}\" which does not exist")]
    MissingRelation {
        entity: String,
        property: String,
        relation: String,
    },

    /// Two columns of one entity share a property path.
    #[error("entity \"{entity}\" has more than one column with property path \"{path}\"")]
    DuplicatePropertyPath { entity: String, path: String },

    /// A join column references a column that does not exist on the related entity.
    #[error("{entity}#{property} references column \"{column}\" which does not exist on \"{target}\"")]
    MissingReferencedColumn {
        entity: String,
        property: String,
        target: String,
        column: String,
    },
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;
