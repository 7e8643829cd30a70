//! Relation metadata.

use super::graph::{ColumnKey, EmbeddedKey, EntityKey, ForeignKeyKey, RelationKey};
use crate::registry::{CascadeOptions, ReferentialAction, RelationArgs, RelationType, Target};

/// A resolved relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMetadata {
    /// Entity that owns the relation slot.
    pub entity: EntityKey,
    /// Declaring target.
    pub target: Target,
    /// Entity property holding the related value.
    pub property_name: String,
    /// Dotted path through embeddeds.
    pub property_path: String,
    /// Relation kind.
    pub relation_type: RelationType,
    /// The related target as declared.
    pub related: Target,
    /// Embedded the relation lives in.
    pub embedded: Option<EmbeddedKey>,
    /// Inverse side property as declared.
    pub inverse_side_property: Option<String>,
    /// Inverse side property path on the related entity.
    pub inverse_side_property_path: Option<String>,
    /// Related entity. Set once every entity exists.
    pub inverse_entity_metadata: Option<EntityKey>,
    /// Relation on the related entity pointing back.
    pub inverse_relation: Option<RelationKey>,
    /// Join columns holding the foreign key.
    pub join_columns: Vec<ColumnKey>,
    /// Foreign keys created for the join columns.
    pub foreign_keys: Vec<ForeignKeyKey>,
    /// Loaded on first access.
    pub is_lazy: bool,
    /// Loaded with its owner.
    pub is_eager: bool,
    /// May be absent.
    pub is_nullable: bool,
    /// Join columns are part of the primary key.
    pub is_primary: bool,
    /// This side owns the foreign key.
    pub is_owning: bool,
    /// This side has join columns.
    pub is_with_join_column: bool,
    /// Cascades.
    pub cascade: CascadeOptions,
    /// Foreign key delete action.
    pub on_delete: Option<ReferentialAction>,
    /// Foreign key update action.
    pub on_update: Option<ReferentialAction>,
    /// Whether a foreign key constraint is created.
    pub create_foreign_key_constraints: bool,
}

impl RelationMetadata {
    pub(crate) fn from_args(entity: EntityKey, embedded: Option<EmbeddedKey>, args: &RelationArgs) -> Self {
        let is_primary = args.options.primary;
        Self {
            entity,
            target: args.target.clone(),
            property_name: args.property_name.clone(),
            property_path: args.property_name.clone(),
            relation_type: args.relation_type,
            related: args.related.clone(),
            embedded,
            inverse_side_property: args.inverse_side.clone(),
            inverse_side_property_path: None,
            inverse_entity_metadata: None,
            inverse_relation: None,
            join_columns: Vec::new(),
            foreign_keys: Vec::new(),
            is_lazy: args.is_lazy,
            is_eager: args.options.eager,
            is_nullable: args.options.nullable && !is_primary,
            is_primary,
            is_owning: args.relation_type == RelationType::ManyToOne,
            is_with_join_column: args.relation_type == RelationType::ManyToOne,
            cascade: args.options.cascade,
            on_delete: args.options.on_delete,
            on_update: args.options.on_update,
            create_foreign_key_constraints: args.options.create_foreign_key_constraints,
        }
    }

    /// One-to-one relation.
    pub fn is_one_to_one(&self) -> bool {
        self.relation_type == RelationType::OneToOne
    }

    /// One-to-many relation.
    pub fn is_one_to_many(&self) -> bool {
        self.relation_type == RelationType::OneToMany
    }

    /// Many-to-one relation.
    pub fn is_many_to_one(&self) -> bool {
        self.relation_type == RelationType::ManyToOne
    }

    /// Many-to-many relation.
    pub fn is_many_to_many(&self) -> bool {
        self.relation_type == RelationType::ManyToMany
    }

    /// Owning side of a one-to-one relation.
    pub fn is_one_to_one_owner(&self) -> bool {
        self.is_one_to_one() && self.is_owning
    }

    /// Points at a single related entity.
    pub fn is_to_one(&self) -> bool {
        self.is_one_to_one() || self.is_many_to_one()
    }

    /// Record materialized join columns and derive ownership from them.
    pub(crate) fn register_join_columns(&mut self, columns: Vec<ColumnKey>) {
        self.join_columns = columns;
        self.is_owning = self.is_many_to_one()
            || ((self.is_many_to_many() || self.is_one_to_one()) && !self.join_columns.is_empty());
        self.is_with_join_column = self.is_many_to_one() || self.is_one_to_one_owner();
    }
}
