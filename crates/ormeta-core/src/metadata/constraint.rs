//! Index, unique, check and foreign key metadata.

use super::graph::{ColumnKey, EmbeddedKey, EntityKey};
use crate::registry::{CheckArgs, IndexArgs, ReferentialAction, Target, UniqueArgs};

/// A resolved index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Embedded the index was declared in.
    pub embedded: Option<EmbeddedKey>,
    /// Declaring target.
    pub target: Target,
    /// User-given name.
    pub given_name: Option<String>,
    /// Resolved name.
    pub name: String,
    /// Property paths as declared. Empty when columns were resolved at creation.
    pub given_column_names: Vec<String>,
    /// Indexed columns.
    pub columns: Vec<ColumnKey>,
    /// Unique index.
    pub is_unique: bool,
    /// Spatial index.
    pub is_spatial: bool,
    /// Partial index condition.
    pub where_clause: Option<String>,
    /// Whether schema synchronization may touch this index.
    pub synchronize: bool,
}

impl IndexMetadata {
    pub(crate) fn from_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &IndexArgs) -> Self {
        Self {
            entity,
            embedded,
            target: args.target.clone(),
            given_name: args.name.clone(),
            name: args.name.clone().unwrap_or_default(),
            given_column_names: args.columns.clone(),
            columns: Vec::new(),
            is_unique: args.unique,
            is_spatial: args.spatial,
            where_clause: args.where_clause.clone(),
            synchronize: args.synchronize,
        }
    }

    /// A unique index standing in for a unique constraint.
    pub(crate) fn from_unique_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &UniqueArgs) -> Self {
        Self {
            entity,
            embedded,
            target: args.target.clone(),
            given_name: args.name.clone(),
            name: args.name.clone().unwrap_or_default(),
            given_column_names: args.columns.clone(),
            columns: Vec::new(),
            is_unique: true,
            is_spatial: false,
            where_clause: None,
            synchronize: true,
        }
    }
}

/// A resolved unique constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Embedded the constraint was declared in.
    pub embedded: Option<EmbeddedKey>,
    /// Declaring target.
    pub target: Target,
    /// User-given name.
    pub given_name: Option<String>,
    /// Resolved name.
    pub name: String,
    /// Property paths as declared. Empty when columns were resolved at creation.
    pub given_column_names: Vec<String>,
    /// Constrained columns.
    pub columns: Vec<ColumnKey>,
}

impl UniqueMetadata {
    pub(crate) fn from_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &UniqueArgs) -> Self {
        Self {
            entity,
            embedded,
            target: args.target.clone(),
            given_name: args.name.clone(),
            name: args.name.clone().unwrap_or_default(),
            given_column_names: args.columns.clone(),
            columns: Vec::new(),
        }
    }
}

/// A resolved check constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Declaring target.
    pub target: Target,
    /// User-given name.
    pub given_name: Option<String>,
    /// Resolved name.
    pub name: String,
    /// Boolean expression.
    pub expression: String,
}

impl CheckMetadata {
    pub(crate) fn from_args(entity: EntityKey, args: &CheckArgs) -> Self {
        Self {
            entity,
            target: args.target.clone(),
            given_name: args.name.clone(),
            name: args.name.clone().unwrap_or_default(),
            expression: args.expression.clone(),
        }
    }
}

/// A foreign key from join columns to the referenced entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyMetadata {
    /// Entity holding the join columns.
    pub entity: EntityKey,
    /// Referenced entity.
    pub referenced_entity: EntityKey,
    /// Constraint name.
    pub name: String,
    /// Join columns.
    pub columns: Vec<ColumnKey>,
    /// Referenced columns, positionally matching `columns`.
    pub referenced_columns: Vec<ColumnKey>,
    /// Delete action.
    pub on_delete: Option<ReferentialAction>,
    /// Update action.
    pub on_update: Option<ReferentialAction>,
}
