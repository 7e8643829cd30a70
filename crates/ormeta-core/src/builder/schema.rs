//! Own schema elements of an entity.

use super::EntityMetadataBuilder;
use crate::error::{Result, ValidationError};
use crate::metadata::{
    CheckKey, CheckMetadata, ColumnKey, ColumnMetadata, EmbeddedKey, EmbeddedMetadata, EntityKey,
    EntityListenerMetadata, IndexKey, IndexMetadata, ListenerKey, MetadataGraph, RelationCountKey,
    RelationCountMetadata, RelationIdKey, RelationIdMetadata, RelationKey, RelationMetadata,
    UniqueKey, UniqueMetadata,
};
use crate::registry::{ColumnType, EmbeddedArgs, InheritancePattern, Target, UniqueArgs};

/// Default discriminator property and column name.
const DEFAULT_DISCRIMINATOR_COLUMN: &str = "type";

impl<'a> EntityMetadataBuilder<'a> {
    /// Pass 5: discriminator value, embeddeds, columns, relations, relation
    /// ids and counts, listeners, indices, uniques and checks.
    ///
    /// Single-table children reuse their parent's column, relation, embedded,
    /// relation id and relation count slots by property name. Everything else
    /// is created per entity.
    pub(super) fn build_own_elements(&self, graph: &mut MetadataGraph, key: EntityKey) -> Result<()> {
        let entity = &graph.entities[key.0];
        let tree = entity.inheritance_tree.clone();
        let target = entity.target.clone();
        let parent = entity.parent_entity_metadata;
        let single_table = entity.inheritance_pattern == Some(InheritancePattern::SingleTable);

        graph.entities[key.0].discriminator_value = Some(
            self.registry
                .find_discriminator_value(&target)
                .map(|d| d.value.clone())
                .unwrap_or_else(|| target.name().to_string()),
        );

        let embeddeds = match parent {
            Some(parent) => self.reuse_embeddeds(graph, parent, &tree, single_table)?,
            None => {
                let args = self.registry.filter_embeddeds(&tree);
                self.build_embeddeds(graph, key, None, args, &mut Vec::new(), single_table)?
            }
        };
        graph.entities[key.0].embeddeds = embeddeds;

        let columns = self.build_own_columns(graph, key, parent, &tree, single_table);
        graph.entities[key.0].own_columns = columns;
        match parent {
            Some(parent) => self.share_discriminator_column(graph, key, parent),
            None if single_table => self.create_discriminator_column(graph, key, &target),
            None => {}
        }

        let relations = self.build_own_relations(graph, key, parent, &tree, single_table);
        graph.entities[key.0].own_relations = relations;
        let relation_ids = self.build_relation_ids(graph, key, parent, &tree);
        graph.entities[key.0].relation_ids = relation_ids;
        let relation_counts = self.build_relation_counts(graph, key, parent, &tree);
        graph.entities[key.0].relation_counts = relation_counts;

        let listeners = self.build_listeners(graph, key, None, &tree);
        graph.entities[key.0].own_listeners = listeners;
        let mut indices = self.build_indices(graph, key, None, &tree);
        let (unique_indices, uniques) = self.build_uniques(graph, key, None, &tree);
        indices.extend(unique_indices);
        graph.entities[key.0].own_indices = indices;
        graph.entities[key.0].own_uniques = uniques;

        let checks = self
            .registry
            .filter_checks(&tree)
            .into_iter()
            .map(|args| {
                graph.checks.push(CheckMetadata::from_args(key, args));
                CheckKey(graph.checks.len() - 1)
            })
            .collect();
        graph.entities[key.0].checks = checks;
        Ok(())
    }

    fn build_own_columns(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        parent: Option<EntityKey>,
        tree: &[Target],
        single_table: bool,
    ) -> Vec<ColumnKey> {
        let mut columns = Vec::new();
        for args in self.registry.filter_columns(tree) {
            if let Some(parent) = parent {
                let shared = graph.entities[parent.0]
                    .own_columns
                    .iter()
                    .copied()
                    .find(|&c| {
                        let column = &graph.columns[c.0];
                        column.property_name == args.property_name && !column.is_join_column()
                    });
                if let Some(shared) = shared {
                    columns.push(shared);
                    continue;
                }
            }

            let owner = parent.unwrap_or(key);
            let mut column = ColumnMetadata::from_args(owner, None, args);
            if single_table && !column.is_primary {
                column.is_nullable = true;
            }
            let column = push_column(graph, column);
            self.build_column(graph, column);
            if owner != key {
                graph.entities[owner.0].own_columns.push(column);
            }
            columns.push(column);
        }
        columns
    }

    /// Root of a single-table group: mark or create its discriminator column.
    fn create_discriminator_column(&self, graph: &mut MetadataGraph, key: EntityKey, target: &Target) {
        let options = self
            .registry
            .find_inheritance_type(target)
            .and_then(|inheritance| inheritance.column.clone())
            .unwrap_or_default();
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_DISCRIMINATOR_COLUMN.to_string());

        let existing = graph.entities[key.0]
            .own_columns
            .iter()
            .copied()
            .find(|&c| graph.columns[c.0].property_name == name);
        if let Some(existing) = existing {
            let column = &mut graph.columns[existing.0];
            column.is_discriminator = true;
            column.is_nullable = false;
            return;
        }

        let mut column = ColumnMetadata::virtual_column(key, None, name.clone(), Some(name));
        column.target = Some(target.clone());
        column.column_type = Some(options.column_type.unwrap_or(ColumnType::Varchar));
        column.length = options.length;
        column.is_nullable = false;
        column.is_discriminator = true;
        let column = push_column(graph, column);
        self.build_column(graph, column);
        graph.entities[key.0].own_columns.push(column);
    }

    fn share_discriminator_column(&self, graph: &mut MetadataGraph, key: EntityKey, parent: EntityKey) {
        let discriminator = graph.entities[parent.0]
            .own_columns
            .iter()
            .copied()
            .find(|&c| graph.columns[c.0].is_discriminator);
        if let Some(discriminator) = discriminator {
            let own = &mut graph.entities[key.0].own_columns;
            if !own.contains(&discriminator) {
                own.push(discriminator);
            }
        }
    }

    fn build_own_relations(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        parent: Option<EntityKey>,
        tree: &[Target],
        single_table: bool,
    ) -> Vec<RelationKey> {
        let mut relations = Vec::new();
        for args in self.registry.filter_relations(tree) {
            if let Some(parent) = parent {
                let shared = graph.entities[parent.0]
                    .own_relations
                    .iter()
                    .copied()
                    .find(|&r| graph.relations[r.0].property_name == args.property_name);
                if let Some(shared) = shared {
                    relations.push(shared);
                    continue;
                }
            }

            let owner = parent.unwrap_or(key);
            let mut relation = RelationMetadata::from_args(owner, None, args);
            if single_table && !relation.is_primary {
                relation.is_nullable = true;
            }
            graph.relations.push(relation);
            let relation = RelationKey(graph.relations.len() - 1);
            self.build_relation(graph, relation);
            if owner != key {
                graph.entities[owner.0].own_relations.push(relation);
            }
            relations.push(relation);
        }
        relations
    }

    fn build_relation_ids(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        parent: Option<EntityKey>,
        tree: &[Target],
    ) -> Vec<RelationIdKey> {
        let mut relation_ids = Vec::new();
        for args in self.registry.filter_relation_ids(tree) {
            let shared = parent.and_then(|parent| {
                graph.entities[parent.0]
                    .relation_ids
                    .iter()
                    .copied()
                    .find(|&r| graph.relation_ids[r.0].property_name == args.property_name)
            });
            let relation_id = match shared {
                Some(shared) => shared,
                None => {
                    graph
                        .relation_ids
                        .push(RelationIdMetadata::from_args(parent.unwrap_or(key), args));
                    RelationIdKey(graph.relation_ids.len() - 1)
                }
            };
            relation_ids.push(relation_id);
        }
        relation_ids
    }

    fn build_relation_counts(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        parent: Option<EntityKey>,
        tree: &[Target],
    ) -> Vec<RelationCountKey> {
        let mut relation_counts = Vec::new();
        for args in self.registry.filter_relation_counts(tree) {
            let shared = parent.and_then(|parent| {
                graph.entities[parent.0]
                    .relation_counts
                    .iter()
                    .copied()
                    .find(|&r| graph.relation_counts[r.0].property_name == args.property_name)
            });
            let relation_count = match shared {
                Some(shared) => shared,
                None => {
                    graph
                        .relation_counts
                        .push(RelationCountMetadata::from_args(parent.unwrap_or(key), args));
                    RelationCountKey(graph.relation_counts.len() - 1)
                }
            };
            relation_counts.push(relation_count);
        }
        relation_counts
    }

    fn build_listeners(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        embedded: Option<EmbeddedKey>,
        tree: &[Target],
    ) -> Vec<ListenerKey> {
        self.registry
            .filter_listeners(tree)
            .into_iter()
            .map(|args| {
                graph
                    .listeners
                    .push(EntityListenerMetadata::from_args(key, embedded, args));
                ListenerKey(graph.listeners.len() - 1)
            })
            .collect()
    }

    fn build_indices(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        embedded: Option<EmbeddedKey>,
        tree: &[Target],
    ) -> Vec<IndexKey> {
        self.registry
            .filter_indices(tree)
            .into_iter()
            .map(|args| push_index(graph, IndexMetadata::from_args(key, embedded, args)))
            .collect()
    }

    /// Unique registrations, as unique indices when the driver represents
    /// uniqueness that way and as unique constraints otherwise.
    fn build_uniques(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        embedded: Option<EmbeddedKey>,
        tree: &[Target],
    ) -> (Vec<IndexKey>, Vec<UniqueKey>) {
        let uniques: Vec<&UniqueArgs> = self.registry.filter_uniques(tree);
        if self.driver.represents_unique_as_index {
            let indices = uniques
                .into_iter()
                .map(|args| push_index(graph, IndexMetadata::from_unique_args(key, embedded, args)))
                .collect();
            (indices, Vec::new())
        } else {
            let uniques = uniques
                .into_iter()
                .map(|args| {
                    graph
                        .uniques
                        .push(UniqueMetadata::from_args(key, embedded, args));
                    UniqueKey(graph.uniques.len() - 1)
                })
                .collect();
            (Vec::new(), uniques)
        }
    }

    /// Children take the parent's embeddeds by property name. An embedded the
    /// parent lacks is created on the parent and shared.
    fn reuse_embeddeds(
        &self,
        graph: &mut MetadataGraph,
        parent: EntityKey,
        tree: &[Target],
        single_table: bool,
    ) -> Result<Vec<EmbeddedKey>> {
        let mut embeddeds = Vec::new();
        for args in self.registry.filter_embeddeds(tree) {
            let shared = graph.entities[parent.0]
                .embeddeds
                .iter()
                .copied()
                .find(|&e| graph.embeddeds[e.0].property_name == args.property_name);
            match shared {
                Some(shared) => embeddeds.push(shared),
                None => {
                    let built =
                        self.build_embeddeds(graph, parent, None, vec![args], &mut Vec::new(), single_table)?;
                    graph.entities[parent.0].embeddeds.extend(built.iter().copied());
                    embeddeds.extend(built);
                }
            }
        }
        Ok(embeddeds)
    }

    /// Build embeddeds recursively. `stack` holds the embedded types on the
    /// way down and detects types that embed themselves.
    pub(super) fn build_embeddeds(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        parent: Option<EmbeddedKey>,
        args: Vec<&'a EmbeddedArgs>,
        stack: &mut Vec<String>,
        force_nullable: bool,
    ) -> Result<Vec<EmbeddedKey>> {
        let mut embeddeds = Vec::with_capacity(args.len());
        for args in args {
            if stack.contains(&args.embedded_type) {
                let mut path = stack.clone();
                path.push(args.embedded_type.clone());
                return Err(ValidationError::EmbeddedCycle {
                    entity: graph.entities[key.0].name.clone(),
                    embedded: args.embedded_type.clone(),
                    path: path.join(" -> "),
                }
                .into());
            }

            let embedded = {
                let parent_metadata = parent.map(|p| &graph.embeddeds[p.0]);
                EmbeddedMetadata::from_args(key, parent_metadata, parent, args)
            };
            graph.embeddeds.push(embedded);
            let embedded = EmbeddedKey(graph.embeddeds.len() - 1);
            let tree = self
                .resolver
                .ancestor_chain(&Target::class(args.embedded_type.as_str()))?;

            let mut columns = Vec::new();
            for column_args in self.registry.filter_columns(&tree) {
                let mut column = ColumnMetadata::from_args(key, Some(embedded), column_args);
                if force_nullable && !column.is_primary {
                    column.is_nullable = true;
                }
                let column = push_column(graph, column);
                self.build_column(graph, column);
                columns.push(column);
            }

            let mut relations = Vec::new();
            for relation_args in self.registry.filter_relations(&tree) {
                let mut relation = RelationMetadata::from_args(key, Some(embedded), relation_args);
                if force_nullable && !relation.is_primary {
                    relation.is_nullable = true;
                }
                graph.relations.push(relation);
                let relation = RelationKey(graph.relations.len() - 1);
                self.build_relation(graph, relation);
                relations.push(relation);
            }

            let listeners = self.build_listeners(graph, key, Some(embedded), &tree);
            let mut indices = self.build_indices(graph, key, Some(embedded), &tree);
            let (unique_indices, uniques) = self.build_uniques(graph, key, Some(embedded), &tree);
            indices.extend(unique_indices);

            stack.push(args.embedded_type.clone());
            let nested_args = self.registry.filter_embeddeds(&tree);
            let nested = self.build_embeddeds(graph, key, Some(embedded), nested_args, stack, force_nullable)?;
            stack.pop();

            let metadata = &mut graph.embeddeds[embedded.0];
            metadata.columns = columns;
            metadata.relations = relations;
            metadata.listeners = listeners;
            metadata.indices = indices;
            metadata.uniques = uniques;
            metadata.embeddeds = nested;
            embeddeds.push(embedded);
        }
        Ok(embeddeds)
    }
}

fn push_column(graph: &mut MetadataGraph, column: ColumnMetadata) -> ColumnKey {
    graph.columns.push(column);
    ColumnKey(graph.columns.len() - 1)
}

fn push_index(graph: &mut MetadataGraph, index: IndexMetadata) -> IndexKey {
    graph.indices.push(index);
    IndexKey(graph.indices.len() - 1)
}
