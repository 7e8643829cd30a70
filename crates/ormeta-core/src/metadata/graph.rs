//! The metadata arena.
//!
//! Every resolved element lives in exactly one arena slot and is referenced
//! everywhere else by a copyable key. Single-table-inheritance children hold
//! the keys of their parent's columns and relations, so a change to a shared
//! slot is visible through every subtype.

use super::column::ColumnMetadata;
use super::constraint::{CheckMetadata, ForeignKeyMetadata, IndexMetadata, UniqueMetadata};
use super::embedded::EmbeddedMetadata;
use super::entity::{EntityMetadata, EntityRef};
use super::listener::EntityListenerMetadata;
use super::relation::RelationMetadata;
use super::relation_id::{RelationCountMetadata, RelationIdMetadata};
use crate::error::{Error, Result};
use crate::registry::Target;
use ormeta_proto::Value;

macro_rules! arena_key {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) usize);

            impl $name {
                /// Position in the arena.
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

arena_key!(
    /// Key of an entity.
    EntityKey,
    /// Key of a column.
    ColumnKey,
    /// Key of a relation.
    RelationKey,
    /// Key of an embedded.
    EmbeddedKey,
    /// Key of an index.
    IndexKey,
    /// Key of a unique constraint.
    UniqueKey,
    /// Key of a check constraint.
    CheckKey,
    /// Key of a foreign key.
    ForeignKeyKey,
    /// Key of a relation id.
    RelationIdKey,
    /// Key of a relation count.
    RelationCountKey,
    /// Key of an entity listener.
    ListenerKey,
);

/// Options for [`MetadataGraph::get_value_map`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueMapOptions {
    /// Treat null values like missing ones.
    pub skip_nulls: bool,
}

/// The resolved metadata of one bootstrap.
#[derive(Debug, Clone, Default)]
pub struct MetadataGraph {
    pub(crate) entities: Vec<EntityMetadata>,
    pub(crate) columns: Vec<ColumnMetadata>,
    pub(crate) relations: Vec<RelationMetadata>,
    pub(crate) embeddeds: Vec<EmbeddedMetadata>,
    pub(crate) indices: Vec<IndexMetadata>,
    pub(crate) uniques: Vec<UniqueMetadata>,
    pub(crate) checks: Vec<CheckMetadata>,
    pub(crate) foreign_keys: Vec<ForeignKeyMetadata>,
    pub(crate) relation_ids: Vec<RelationIdMetadata>,
    pub(crate) relation_counts: Vec<RelationCountMetadata>,
    pub(crate) listeners: Vec<EntityListenerMetadata>,
}

impl MetadataGraph {
    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities, in registration order.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        (0..self.entities.len()).map(move |i| EntityRef::new(self, EntityKey(i)))
    }

    /// View of one entity.
    pub fn entity(&self, key: EntityKey) -> EntityRef<'_> {
        EntityRef::new(self, key)
    }

    /// Entity record.
    pub fn entity_metadata(&self, key: EntityKey) -> &EntityMetadata {
        &self.entities[key.0]
    }

    /// Column record.
    pub fn column(&self, key: ColumnKey) -> &ColumnMetadata {
        &self.columns[key.0]
    }

    /// Relation record.
    pub fn relation(&self, key: RelationKey) -> &RelationMetadata {
        &self.relations[key.0]
    }

    /// Embedded record.
    pub fn embedded(&self, key: EmbeddedKey) -> &EmbeddedMetadata {
        &self.embeddeds[key.0]
    }

    /// Index record.
    pub fn index(&self, key: IndexKey) -> &IndexMetadata {
        &self.indices[key.0]
    }

    /// Unique constraint record.
    pub fn unique(&self, key: UniqueKey) -> &UniqueMetadata {
        &self.uniques[key.0]
    }

    /// Check constraint record.
    pub fn check(&self, key: CheckKey) -> &CheckMetadata {
        &self.checks[key.0]
    }

    /// Foreign key record.
    pub fn foreign_key(&self, key: ForeignKeyKey) -> &ForeignKeyMetadata {
        &self.foreign_keys[key.0]
    }

    /// Relation id record.
    pub fn relation_id(&self, key: RelationIdKey) -> &RelationIdMetadata {
        &self.relation_ids[key.0]
    }

    /// Relation count record.
    pub fn relation_count(&self, key: RelationCountKey) -> &RelationCountMetadata {
        &self.relation_counts[key.0]
    }

    /// Listener record.
    pub fn listener(&self, key: ListenerKey) -> &EntityListenerMetadata {
        &self.listeners[key.0]
    }

    /// Check if metadata exists for the target.
    pub fn has_metadata(&self, target: &Target) -> bool {
        self.find_metadata(target).is_some()
    }

    /// Find the metadata of a target.
    ///
    /// Targets match exactly first. A table target that matches nothing is
    /// then looked up as a table path when it contains a dot, otherwise as an
    /// entity name or table name.
    pub fn find_metadata(&self, target: &Target) -> Option<EntityRef<'_>> {
        if let Some(i) = self.entities.iter().position(|e| &e.target == target) {
            return Some(EntityRef::new(self, EntityKey(i)));
        }
        let Target::Table(name) = target else {
            return None;
        };
        let position = if name.contains('.') {
            self.entities.iter().position(|e| &e.table_path == name)
        } else {
            self.entities
                .iter()
                .position(|e| &e.name == name || &e.table_name == name)
        };
        position.map(|i| EntityRef::new(self, EntityKey(i)))
    }

    /// Get the metadata of a target, failing when there is none.
    pub fn get_metadata(&self, target: &Target) -> Result<EntityRef<'_>> {
        self.find_metadata(target).ok_or_else(|| Error::NotFound {
            target: target.clone(),
        })
    }

    /// Property names leading to a column's value, through its embeddeds.
    pub(crate) fn column_value_path(&self, key: ColumnKey) -> Vec<&str> {
        let column = self.column(key);
        let mut path: Vec<&str> = match column.embedded {
            Some(embedded) => self
                .embedded(embedded)
                .parent_property_names
                .iter()
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        };
        path.push(&column.property_name);
        path
    }

    /// Property names leading to a relation's value, through its embeddeds.
    pub(crate) fn relation_value_path(&self, key: RelationKey) -> Vec<&str> {
        let relation = self.relation(key);
        let mut path: Vec<&str> = match relation.embedded {
            Some(embedded) => self
                .embedded(embedded)
                .parent_property_names
                .iter()
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        };
        path.push(&relation.property_name);
        path
    }

    /// Value of a column on an entity. `None` when undefined.
    ///
    /// For a join column whose relation holds a related object, the value is
    /// the referenced column's value on that object.
    pub fn column_entity_value(&self, key: ColumnKey, entity: &Value) -> Option<Value> {
        let value = entity.get_path(&self.column_value_path(key))?;
        match self.column(key).referenced_column {
            Some(referenced) if value.is_object() => self.column_entity_value(referenced, value),
            _ => Some(value.clone()),
        }
    }

    /// A column's contribution to a value map: its value nested under its
    /// property path.
    ///
    /// `None` when the value is undefined, or null with `skip_nulls`.
    pub fn column_value_map(&self, key: ColumnKey, entity: &Value, options: ValueMapOptions) -> Option<Value> {
        let path = self.column_value_path(key);
        let value = entity.get_path(&path)?;
        if value.is_null() && options.skip_nulls {
            return None;
        }

        let leaf = match self.column(key).referenced_column {
            Some(referenced) if value.is_object() => self.column_value_map(referenced, value, options)?,
            Some(referenced) if !value.is_null() => self.create_value_map(referenced, value.clone()),
            _ => value.clone(),
        };
        Some(Value::nest(&path, leaf))
    }

    /// Nest a raw value under a column's property path.
    ///
    /// Join columns nest the value under the referenced column as well, so
    /// `author` referencing `id` yields `{author: {id: value}}`.
    pub fn create_value_map(&self, key: ColumnKey, value: Value) -> Value {
        let leaf = match self.column(key).referenced_column {
            Some(referenced) => self.create_value_map(referenced, value),
            None => value,
        };
        Value::nest(&self.column_value_path(key), leaf)
    }

    /// Deep-merge the value maps of `columns` taken from `entity`.
    ///
    /// Returns `None` as soon as any column has no value, signalling an
    /// incomplete key.
    pub fn get_value_map(&self, entity: &Value, columns: &[ColumnKey], options: ValueMapOptions) -> Option<Value> {
        let mut map = Value::object();
        for &column in columns {
            map.merge_deep(self.column_value_map(column, entity, options)?);
        }
        Some(map)
    }
}
