//! Column metadata.

use super::graph::{ColumnKey, EmbeddedKey, EntityKey, RelationKey};
use crate::registry::{ColumnArgs, ColumnMode, ColumnType, GenerationStrategy, Target};

/// A resolved column.
///
/// Join columns materialized for relations are virtual columns whose
/// `property_name` is the relation's property name and whose
/// `referenced_column` points at the related entity's column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Entity that owns the column slot.
    pub entity: EntityKey,
    /// Declaring target. `None` for join and discriminator columns created by
    /// the builder.
    pub target: Option<Target>,
    /// Entity property the column maps.
    pub property_name: String,
    /// Dotted path through embeddeds.
    pub property_path: String,
    /// Physical column name.
    pub database_name: String,
    /// Physical column name without embedded prefixes.
    pub database_name_without_prefixes: String,
    /// Dotted physical path through embeddeds.
    pub database_path: String,
    /// User-given column name.
    pub given_database_name: Option<String>,
    /// Column type. `None` when neither declared nor inferred.
    pub column_type: Option<ColumnType>,
    /// Length for bounded types.
    pub length: Option<u32>,
    /// Default expression.
    pub default: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Column role.
    pub mode: ColumnMode,
    /// Part of the primary key.
    pub is_primary: bool,
    /// Column accepts null.
    pub is_nullable: bool,
    /// Value is generated by the database.
    pub is_generated: bool,
    /// Generation strategy, when generated.
    pub generation_strategy: Option<GenerationStrategy>,
    /// Document-store object id.
    pub is_object_id: bool,
    /// Column has no backing entity property.
    pub is_virtual: bool,
    /// Single-table-inheritance discriminator.
    pub is_discriminator: bool,
    /// Embedded the column lives in.
    pub embedded: Option<EmbeddedKey>,
    /// Relation this column is a join column of.
    pub relation: Option<RelationKey>,
    /// Column this join column references.
    pub referenced_column: Option<ColumnKey>,
}

impl ColumnMetadata {
    /// Create a column from its registration. Names and paths are filled in
    /// when the column is built.
    pub(crate) fn from_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &ColumnArgs) -> Self {
        Self {
            entity,
            target: Some(args.target.clone()),
            property_name: args.property_name.clone(),
            property_path: args.property_name.clone(),
            database_name: String::new(),
            database_name_without_prefixes: String::new(),
            database_path: String::new(),
            given_database_name: args.options.name.clone(),
            column_type: args.options.column_type.clone(),
            length: args.options.length,
            default: args.options.default.clone(),
            comment: args.options.comment.clone(),
            mode: args.mode,
            is_primary: args.options.primary,
            is_nullable: args.options.nullable,
            is_generated: false,
            generation_strategy: None,
            is_object_id: args.mode == ColumnMode::ObjectId,
            is_virtual: args.mode == ColumnMode::Virtual,
            is_discriminator: false,
            embedded,
            relation: None,
            referenced_column: None,
        }
    }

    /// Create a virtual column that has no registration of its own.
    pub(crate) fn virtual_column(
        entity: EntityKey,
        embedded: Option<EmbeddedKey>,
        property_name: impl Into<String>,
        given_database_name: Option<String>,
    ) -> Self {
        let property_name = property_name.into();
        Self {
            entity,
            target: None,
            property_path: property_name.clone(),
            property_name,
            database_name: String::new(),
            database_name_without_prefixes: String::new(),
            database_path: String::new(),
            given_database_name,
            column_type: None,
            length: None,
            default: None,
            comment: None,
            mode: ColumnMode::Virtual,
            is_primary: false,
            is_nullable: true,
            is_generated: false,
            generation_strategy: None,
            is_object_id: false,
            is_virtual: true,
            is_discriminator: false,
            embedded,
            relation: None,
            referenced_column: None,
        }
    }

    /// Set on insert.
    pub fn is_create_date(&self) -> bool {
        self.mode == ColumnMode::CreateDate
    }

    /// Set on every update.
    pub fn is_update_date(&self) -> bool {
        self.mode == ColumnMode::UpdateDate
    }

    /// Soft-delete marker.
    pub fn is_delete_date(&self) -> bool {
        self.mode == ColumnMode::DeleteDate
    }

    /// Optimistic-lock version counter.
    pub fn is_version(&self) -> bool {
        self.mode == ColumnMode::Version
    }

    /// Join column of a relation.
    pub fn is_join_column(&self) -> bool {
        self.relation.is_some() && self.referenced_column.is_some()
    }
}
