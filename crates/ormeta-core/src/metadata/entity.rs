//! Entity metadata and its runtime operations.

use super::column::ColumnMetadata;
use super::graph::{
    CheckKey, ColumnKey, EmbeddedKey, EntityKey, ForeignKeyKey, IndexKey, ListenerKey,
    MetadataGraph, RelationCountKey, RelationIdKey, RelationKey, UniqueKey, ValueMapOptions,
};
use super::instance::{EntityInstance, RelationLoader};
use super::relation::RelationMetadata;
use crate::error::{ConfigurationError, Result};
use crate::registry::{InheritancePattern, OrderBy, TableArgs, TableType, Target, TreeType};
use ormeta_proto::Value;
use std::ops::Deref;
use std::sync::Arc;

/// A resolved entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    /// Identity the entity is registered under.
    pub target: Target,
    /// Class name, or table name for table targets.
    pub name: String,
    /// Raw target name.
    pub target_name: String,
    /// User-given table name.
    pub given_table_name: Option<String>,
    /// Table name including the global prefix.
    pub table_name: String,
    /// Table name without the global prefix.
    pub table_name_without_prefix: String,
    /// Full table path, composed per driver.
    pub table_path: String,
    /// Schema path, composed per driver.
    pub schema_path: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Schema name.
    pub schema: Option<String>,
    /// Storage engine hint.
    pub engine: Option<String>,
    /// Whether schema synchronization may touch this table.
    pub synchronize: bool,
    /// Default ordering.
    pub order_by: Option<Vec<OrderBy>>,
    /// Table classification.
    pub table_type: TableType,
    /// Tree storage kind.
    pub tree_type: Option<TreeType>,
    /// Inheritance pattern. Children carry their parent's pattern.
    pub inheritance_pattern: Option<InheritancePattern>,
    /// Targets whose registrations feed this entity, root first.
    pub inheritance_tree: Vec<Target>,
    /// Discriminator value for single-table inheritance.
    pub discriminator_value: Option<String>,
    /// Single-table parent.
    pub parent_entity_metadata: Option<EntityKey>,
    /// Entities whose target subclasses this one.
    pub child_entity_metadatas: Vec<EntityKey>,

    /// Columns declared on the inheritance tree, plus join and discriminator columns.
    pub own_columns: Vec<ColumnKey>,
    /// Own columns followed by every embedded column.
    pub columns: Vec<ColumnKey>,
    /// Columns that are part of the primary key.
    pub primary_columns: Vec<ColumnKey>,
    /// More than one primary column.
    pub has_multiple_primary_keys: bool,
    /// Some column is generated or uses the uuid strategy.
    pub has_uuid_generated_columns: bool,
    /// Generated and object id columns.
    pub generated_columns: Vec<ColumnKey>,
    /// Create date column.
    pub create_date_column: Option<ColumnKey>,
    /// Update date column.
    pub update_date_column: Option<ColumnKey>,
    /// Delete date column.
    pub delete_date_column: Option<ColumnKey>,
    /// Version column.
    pub version_column: Option<ColumnKey>,
    /// Discriminator column.
    pub discriminator_column: Option<ColumnKey>,
    /// Object id column.
    pub object_id_column: Option<ColumnKey>,

    /// Relations declared on the inheritance tree.
    pub own_relations: Vec<RelationKey>,
    /// Own relations followed by every embedded relation.
    pub relations: Vec<RelationKey>,
    /// Relations loaded with the entity.
    pub eager_relations: Vec<RelationKey>,
    /// Relations loaded on first access.
    pub lazy_relations: Vec<RelationKey>,
    /// Relations that have join columns on this side.
    pub relations_with_join_columns: Vec<RelationKey>,
    /// Relation id properties.
    pub relation_ids: Vec<RelationIdKey>,
    /// Relation count properties.
    pub relation_counts: Vec<RelationCountKey>,

    /// Indices declared on the inheritance tree.
    pub own_indices: Vec<IndexKey>,
    /// Own indices followed by every embedded index.
    pub indices: Vec<IndexKey>,
    /// Unique constraints declared on the inheritance tree.
    pub own_uniques: Vec<UniqueKey>,
    /// Own unique constraints followed by every embedded one.
    pub uniques: Vec<UniqueKey>,
    /// Check constraints.
    pub checks: Vec<CheckKey>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyKey>,

    /// Listeners declared on the inheritance tree.
    pub own_listeners: Vec<ListenerKey>,
    /// Own listeners followed by every embedded listener.
    pub listeners: Vec<ListenerKey>,

    /// Top-level embeddeds.
    pub embeddeds: Vec<EmbeddedKey>,
    /// Every embedded at any depth.
    pub all_embeddeds: Vec<EmbeddedKey>,

    /// Nested map of property names to their dotted paths.
    pub properties_map: Value,
}

impl EntityMetadata {
    /// Create an empty entity for a table registration.
    pub(crate) fn new(
        args: &TableArgs,
        table_type: TableType,
        inheritance_tree: Vec<Target>,
        inheritance_pattern: Option<InheritancePattern>,
        tree_type: Option<TreeType>,
    ) -> Self {
        Self {
            target: args.target.clone(),
            name: args.target.name().to_string(),
            target_name: args.target.name().to_string(),
            given_table_name: args.name.clone(),
            table_name: String::new(),
            table_name_without_prefix: String::new(),
            table_path: String::new(),
            schema_path: None,
            database: args.database.clone(),
            schema: args.schema.clone(),
            engine: args.engine.clone(),
            synchronize: args.synchronize != Some(false),
            order_by: args.order_by.clone(),
            table_type,
            tree_type,
            inheritance_pattern,
            inheritance_tree,
            discriminator_value: None,
            parent_entity_metadata: None,
            child_entity_metadatas: Vec::new(),
            own_columns: Vec::new(),
            columns: Vec::new(),
            primary_columns: Vec::new(),
            has_multiple_primary_keys: false,
            has_uuid_generated_columns: false,
            generated_columns: Vec::new(),
            create_date_column: None,
            update_date_column: None,
            delete_date_column: None,
            version_column: None,
            discriminator_column: None,
            object_id_column: None,
            own_relations: Vec::new(),
            relations: Vec::new(),
            eager_relations: Vec::new(),
            lazy_relations: Vec::new(),
            relations_with_join_columns: Vec::new(),
            relation_ids: Vec::new(),
            relation_counts: Vec::new(),
            own_indices: Vec::new(),
            indices: Vec::new(),
            own_uniques: Vec::new(),
            uniques: Vec::new(),
            checks: Vec::new(),
            foreign_keys: Vec::new(),
            own_listeners: Vec::new(),
            listeners: Vec::new(),
            embeddeds: Vec::new(),
            all_embeddeds: Vec::new(),
            properties_map: Value::object(),
        }
    }

    /// Single-table-inheritance child sharing its parent's table.
    pub fn is_single_table_child(&self) -> bool {
        self.table_type == TableType::EntityChild
    }
}

/// A read view of one entity inside its graph.
///
/// Dereferences to [`EntityMetadata`] and carries the runtime operations that
/// need to follow keys into the rest of the graph.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef<'g> {
    graph: &'g MetadataGraph,
    key: EntityKey,
}

impl<'g> Deref for EntityRef<'g> {
    type Target = EntityMetadata;

    fn deref(&self) -> &EntityMetadata {
        self.graph.entity_metadata(self.key)
    }
}

impl<'g> EntityRef<'g> {
    pub(crate) fn new(graph: &'g MetadataGraph, key: EntityKey) -> Self {
        Self { graph, key }
    }

    /// Entity key.
    pub fn key(&self) -> EntityKey {
        self.key
    }

    /// Graph the entity lives in.
    pub fn graph(&self) -> &'g MetadataGraph {
        self.graph
    }

    /// Entity record, borrowed for the graph lifetime.
    pub fn metadata(&self) -> &'g EntityMetadata {
        self.graph.entity_metadata(self.key)
    }

    /// Single-table parent.
    pub fn parent(&self) -> Option<EntityRef<'g>> {
        self.metadata()
            .parent_entity_metadata
            .map(|key| EntityRef::new(self.graph, key))
    }

    /// Entities whose target subclasses this one.
    pub fn children(&self) -> impl Iterator<Item = EntityRef<'g>> + 'g {
        let graph = self.graph;
        self.metadata()
            .child_entity_metadatas
            .iter()
            .map(move |&key| EntityRef::new(graph, key))
    }

    /// Resolved columns.
    pub fn columns(&self) -> impl Iterator<Item = &'g ColumnMetadata> + 'g {
        let graph = self.graph;
        self.metadata().columns.iter().map(move |&key| graph.column(key))
    }

    /// Primary columns.
    pub fn primary_columns(&self) -> impl Iterator<Item = &'g ColumnMetadata> + 'g {
        let graph = self.graph;
        self.metadata()
            .primary_columns
            .iter()
            .map(move |&key| graph.column(key))
    }

    /// Resolved relations.
    pub fn relations(&self) -> impl Iterator<Item = &'g RelationMetadata> + 'g {
        let graph = self.graph;
        self.metadata()
            .relations
            .iter()
            .map(move |&key| graph.relation(key))
    }

    /// Create a blank instance with lazy relation slots.
    ///
    /// Class targets produce an instance tagged with the class name; table
    /// targets produce a plain record.
    pub fn create(&self, loader: Option<Arc<dyn RelationLoader>>) -> EntityInstance {
        let lazy = self
            .metadata()
            .lazy_relations
            .iter()
            .map(|&key| self.graph.relation(key).clone())
            .collect();
        EntityInstance::new(
            self.name.clone(),
            self.target.class_name().map(str::to_string),
            lazy,
            loader,
        )
    }

    /// Check if every primary column has a defined, non-null, non-empty value.
    pub fn has_id(&self, entity: &Value) -> bool {
        if !entity.is_object() || self.primary_columns.is_empty() {
            return false;
        }
        self.primary_columns.iter().all(|&key| {
            match self.graph.column_entity_value(key, entity) {
                Some(value) => !value.is_null() && !value.is_empty_string(),
                None => false,
            }
        })
    }

    /// Check if every primary column has a defined, non-null value.
    ///
    /// Unlike [`has_id`](Self::has_id), empty strings and zeros are accepted.
    pub fn has_all_primary_keys(&self, entity: &Value) -> bool {
        if !entity.is_object() || self.primary_columns.is_empty() {
            return false;
        }
        self.primary_columns.iter().all(|&key| {
            self.graph
                .column_entity_value(key, entity)
                .is_some_and(|value| !value.is_null())
        })
    }

    /// Turn an id into an id map.
    ///
    /// Maps pass through. A scalar is nested under the single primary
    /// column's property path; a scalar for a composite key is an error.
    pub fn ensure_entity_id_map(&self, id: Value) -> Result<Value> {
        if id.is_object() {
            return Ok(id);
        }
        match self.primary_columns.as_slice() {
            [primary] => Ok(self.graph.create_value_map(*primary, id)),
            _ => Err(ConfigurationError::CannotCreateEntityIdMap {
                entity: self.name.clone(),
                id: format!("{id:?}"),
            }
            .into()),
        }
    }

    /// Id map of an entity, skipping nulls.
    ///
    /// `None` when the entity is absent (not an object) or a primary value is
    /// missing.
    pub fn get_entity_id_map(&self, entity: &Value) -> Option<Value> {
        if !entity.is_object() {
            return None;
        }
        self.graph.get_value_map(
            entity,
            &self.primary_columns,
            ValueMapOptions { skip_nulls: true },
        )
    }

    /// Id map for composite keys, the bare id value otherwise.
    pub fn get_entity_id_mixed_map(&self, entity: &Value) -> Option<Value> {
        let id_map = self.get_entity_id_map(entity)?;
        if self.has_multiple_primary_keys {
            return Some(id_map);
        }
        let primary = *self.primary_columns.first()?;
        self.graph.column_entity_value(primary, &id_map)
    }

    /// Check if two entities have the same identity. Never fails; entities
    /// without an id compare unequal.
    pub fn compare_entities(&self, first: &Value, second: &Value) -> bool {
        match (self.get_entity_id_map(first), self.get_entity_id_map(second)) {
            (Some(first), Some(second)) => first == second,
            _ => false,
        }
    }

    /// Value map of `columns` taken from `entity`.
    pub fn get_value_map(&self, entity: &Value, columns: &[ColumnKey], options: ValueMapOptions) -> Option<Value> {
        self.graph.get_value_map(entity, columns, options)
    }

    /// Column with the given property path.
    ///
    /// A path naming a to-one relation resolves to its single join column.
    pub fn find_column_with_property_path(&self, property_path: &str) -> Option<ColumnKey> {
        if let Some(&key) = self
            .columns
            .iter()
            .find(|&&key| self.graph.column(key).property_path == property_path)
        {
            return Some(key);
        }
        let relation = self.find_relation_with_property_path(property_path)?;
        match self.graph.relation(relation).join_columns.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Columns addressed by a property path: the column itself, or every join
    /// column of the relation with that path.
    pub fn find_columns_with_property_path(&self, property_path: &str) -> Vec<ColumnKey> {
        if let Some(&key) = self.columns.iter().find(|&&key| {
            let column = self.graph.column(key);
            column.property_path == property_path && !column.is_join_column()
        }) {
            return vec![key];
        }
        match self.find_relation_with_property_path(property_path) {
            Some(relation) if !self.graph.relation(relation).join_columns.is_empty() => {
                self.graph.relation(relation).join_columns.clone()
            }
            _ => self.find_column_with_property_path(property_path).into_iter().collect(),
        }
    }

    /// Relation with the given property path.
    pub fn find_relation_with_property_path(&self, property_path: &str) -> Option<RelationKey> {
        self.relations
            .iter()
            .copied()
            .find(|&key| self.graph.relation(key).property_path == property_path)
    }

    /// Column with the given database name.
    pub fn find_column_with_database_name(&self, database_name: &str) -> Option<ColumnKey> {
        self.columns
            .iter()
            .copied()
            .find(|&key| self.graph.column(key).database_name == database_name)
    }

    /// Embedded with the given property path, at any depth.
    pub fn find_embedded_with_property_path(&self, property_path: &str) -> Option<EmbeddedKey> {
        self.all_embeddeds
            .iter()
            .copied()
            .find(|&key| self.graph.embedded(key).property_path == property_path)
    }

    /// Single-table subtype stored with the given discriminator value.
    pub fn child_for_discriminator(&self, value: &str) -> Option<EntityRef<'g>> {
        self.children()
            .find(|child| child.discriminator_value.as_deref() == Some(value))
    }

    /// Related values of an entity, one tuple per related object.
    ///
    /// Array values are flattened and null or undefined values skipped. The
    /// metadata of each related object is the relation's inverse entity, or
    /// the single-table subtype named by the object's discriminator value.
    pub fn extract_relation_values_from_entity<'v>(
        &self,
        entity: &'v Value,
        relations: &[RelationKey],
    ) -> Vec<(&'g RelationMetadata, &'v Value, EntityRef<'g>)> {
        let mut values = Vec::new();
        for &key in relations {
            let relation = self.graph.relation(key);
            let Some(inverse) = relation.inverse_entity_metadata else {
                continue;
            };
            let inverse = EntityRef::new(self.graph, inverse);
            let Some(value) = entity.get_path(&self.graph.relation_value_path(key)) else {
                continue;
            };
            match value {
                Value::Null => {}
                Value::Array(items) => values.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (relation, item, inverse.subtype_of(item))),
                ),
                value => values.push((relation, value, inverse.subtype_of(value))),
            }
        }
        values
    }

    fn subtype_of(&self, value: &Value) -> EntityRef<'g> {
        let discriminator = self
            .metadata()
            .discriminator_column
            .and_then(|column| self.graph.column_entity_value(column, value));
        match discriminator.as_ref().and_then(Value::as_str) {
            Some(discriminator) => self.child_for_discriminator(discriminator).unwrap_or(*self),
            None => *self,
        }
    }
}
