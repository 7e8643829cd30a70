//! Relation resolution: inverse sides, join columns and foreign keys.

use super::{all_keys, EntityMetadataBuilder};
use crate::error::{Result, ValidationError};
use crate::metadata::{
    ColumnKey, ColumnMetadata, EntityKey, ForeignKeyKey, ForeignKeyMetadata, IndexKey,
    IndexMetadata, MetadataGraph, RelationKey, UniqueKey, UniqueMetadata,
};
use crate::registry::{JoinColumnArgs, Target, UniqueArgs};
use tracing::trace;

impl<'a> EntityMetadataBuilder<'a> {
    /// Passes 7 and 8: link inverse sides, materialize join columns and their
    /// foreign keys, then bind relation ids and counts to their relations.
    pub(super) fn resolve_relations(&self, graph: &mut MetadataGraph) -> Result<()> {
        for relation in (0..graph.relations.len()).map(RelationKey) {
            self.resolve_inverse_side(graph, relation)?;
        }

        for key in all_keys(graph) {
            if graph.entities[key.0].is_single_table_child() {
                continue;
            }
            let relations: Vec<RelationKey> = graph.entities[key.0]
                .relations
                .iter()
                .copied()
                .filter(|&r| {
                    let relation = &graph.relations[r.0];
                    relation.entity == key && relation.is_to_one()
                })
                .collect();
            for relation in relations {
                self.build_join_columns(graph, key, relation)?;
            }
        }

        for key in all_keys(graph) {
            self.compute_derived(graph, key)?;
        }
        self.resolve_relation_ids(graph)?;
        self.resolve_relation_counts(graph)
    }

    fn resolve_inverse_side(&self, graph: &mut MetadataGraph, key: RelationKey) -> Result<()> {
        let relation = &graph.relations[key.0];
        let owner = &graph.entities[relation.entity.0];
        let inverse = find_related(graph, &relation.related).ok_or_else(|| {
            ValidationError::MissingRelationTarget {
                entity: owner.name.clone(),
                property: relation.property_name.clone(),
                target: relation.related.name().to_string(),
            }
        })?;

        let inverse_relation = match &relation.inverse_side_property {
            Some(property) => {
                let found = graph.entities[inverse.0].relations.iter().copied().find(|&r| {
                    let candidate = &graph.relations[r.0];
                    &candidate.property_path == property || &candidate.property_name == property
                });
                match found {
                    Some(found) => Some(found),
                    None => {
                        return Err(ValidationError::MissingInverseSide {
                            entity: owner.name.clone(),
                            property: relation.property_name.clone(),
                            target: graph.entities[inverse.0].name.clone(),
                            inverse: property.clone(),
                        }
                        .into())
                    }
                }
            }
            None => None,
        };

        let inverse_path = inverse_relation.map(|r| graph.relations[r.0].property_path.clone());
        let relation = &mut graph.relations[key.0];
        relation.inverse_entity_metadata = Some(inverse);
        relation.inverse_relation = inverse_relation;
        relation.inverse_side_property_path = inverse_path;
        Ok(())
    }

    /// Join columns for a to-one relation owned by `key`.
    ///
    /// A one-to-one relation gets join columns only when it declares them.
    fn build_join_columns(&self, graph: &mut MetadataGraph, key: EntityKey, relation_key: RelationKey) -> Result<()> {
        let relation = &graph.relations[relation_key.0];
        let args = self
            .registry
            .filter_join_columns(&relation.target, &relation.property_name);
        if relation.is_one_to_one() && args.is_empty() {
            return Ok(());
        }
        let Some(inverse) = relation.inverse_entity_metadata else {
            return Ok(());
        };

        let referenced = self.referenced_columns(graph, key, relation_key, inverse, &args)?;
        let mut join_columns = Vec::with_capacity(referenced.len());
        for referenced_column in referenced {
            let column = self.join_column(graph, relation_key, referenced_column, &args);
            join_columns.push(column);
        }
        graph.relations[relation_key.0].register_join_columns(join_columns.clone());
        trace!(
            relation = %graph.relations[relation_key.0].property_path,
            columns = join_columns.len(),
            "Built join columns"
        );

        let foreign_key = if join_columns.is_empty() {
            None
        } else {
            self.build_foreign_key(graph, key, relation_key, inverse, &join_columns)
        };
        propagate_to_children(graph, key, relation_key, &join_columns, foreign_key);
        Ok(())
    }

    /// Foreign key for materialized join columns, plus the unique constraint
    /// of a one-to-one relation. `None` when foreign keys are disabled.
    fn build_foreign_key(
        &self,
        graph: &mut MetadataGraph,
        key: EntityKey,
        relation_key: RelationKey,
        inverse: EntityKey,
        join_columns: &[ColumnKey],
    ) -> Option<ForeignKeyKey> {
        let relation = &graph.relations[relation_key.0];
        if !relation.create_foreign_key_constraints {
            return None;
        }

        let entity = &graph.entities[key.0];
        let column_names: Vec<String> = join_columns
            .iter()
            .map(|&c| graph.columns[c.0].database_name.clone())
            .collect();
        let referenced_columns = join_columns
            .iter()
            .filter_map(|&c| graph.columns[c.0].referenced_column)
            .collect();
        let foreign_key = ForeignKeyMetadata {
            entity: key,
            referenced_entity: inverse,
            name: self.naming.foreign_key_name(&entity.table_name, &column_names),
            columns: join_columns.to_vec(),
            referenced_columns,
            on_delete: relation.on_delete,
            on_update: relation.on_update,
        };
        let is_one_to_one = relation.is_one_to_one();
        let constraint_name = self
            .naming
            .relation_constraint_name(&entity.table_name, &column_names);
        let relation_target = relation.target.clone();
        let relation_embedded = relation.embedded;

        graph.foreign_keys.push(foreign_key);
        let foreign_key = ForeignKeyKey(graph.foreign_keys.len() - 1);
        graph.relations[relation_key.0].foreign_keys.push(foreign_key);
        graph.entities[key.0].foreign_keys.push(foreign_key);

        if is_one_to_one {
            let args = UniqueArgs::new(relation_target, Vec::<String>::new()).named(constraint_name);
            if self.driver.represents_unique_as_index {
                let mut index = IndexMetadata::from_unique_args(key, relation_embedded, &args);
                index.columns = join_columns.to_vec();
                graph.indices.push(index);
                graph.entities[key.0]
                    .own_indices
                    .push(IndexKey(graph.indices.len() - 1));
            } else {
                let mut unique = UniqueMetadata::from_args(key, relation_embedded, &args);
                unique.columns = join_columns.to_vec();
                graph.uniques.push(unique);
                graph.entities[key.0]
                    .own_uniques
                    .push(UniqueKey(graph.uniques.len() - 1));
            }
        }

        Some(foreign_key)
    }

    /// Columns of the related entity the join columns point at.
    ///
    /// The related primary columns unless some join column names its
    /// referenced property explicitly.
    fn referenced_columns(
        &self,
        graph: &MetadataGraph,
        key: EntityKey,
        relation: RelationKey,
        inverse: EntityKey,
        args: &[&JoinColumnArgs],
    ) -> Result<Vec<ColumnKey>> {
        let inverse = &graph.entities[inverse.0];
        if !args.iter().any(|a| a.referenced_column_name.is_some()) {
            return Ok(inverse.primary_columns.clone());
        }

        args.iter()
            .filter_map(|a| a.referenced_column_name.as_deref())
            .map(|name| {
                inverse
                    .own_columns
                    .iter()
                    .copied()
                    .find(|&c| graph.columns[c.0].property_name == name)
                    .ok_or_else(|| {
                        ValidationError::MissingReferencedColumn {
                            entity: graph.entities[key.0].name.clone(),
                            property: graph.relations[relation.0].property_name.clone(),
                            target: inverse.name.clone(),
                            column: name.to_string(),
                        }
                        .into()
                    })
            })
            .collect()
    }

    /// Find or create the join column pointing at `referenced`.
    ///
    /// A column already declared with the same unprefixed name becomes the
    /// join column instead of a new virtual one.
    fn join_column(
        &self,
        graph: &mut MetadataGraph,
        relation_key: RelationKey,
        referenced: ColumnKey,
        args: &[&JoinColumnArgs],
    ) -> ColumnKey {
        let relation = &graph.relations[relation_key.0];
        let referenced_column = &graph.columns[referenced.0];
        let name = args
            .iter()
            .find(|a| {
                a.name.is_some()
                    && a.referenced_column_name
                        .as_deref()
                        .map_or(true, |r| r == referenced_column.property_name)
            })
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| {
                self.naming
                    .join_column_name(&relation.property_name, &referenced_column.property_name)
            });

        let candidates = match relation.embedded {
            Some(embedded) => &graph.embeddeds[embedded.0].columns,
            None => &graph.entities[relation.entity.0].own_columns,
        };
        let existing = candidates
            .iter()
            .copied()
            .find(|&c| graph.columns[c.0].database_name_without_prefixes == name);

        let column = match existing {
            Some(existing) => existing,
            None => {
                let mut column = ColumnMetadata::virtual_column(
                    relation.entity,
                    relation.embedded,
                    relation.property_name.clone(),
                    Some(name),
                );
                column.is_primary = relation.is_primary;
                column.is_nullable = relation.is_nullable;
                let embedded = relation.embedded;
                let owner = relation.entity;
                graph.columns.push(column);
                let column = ColumnKey(graph.columns.len() - 1);
                match embedded {
                    Some(embedded) => graph.embeddeds[embedded.0].columns.push(column),
                    None => graph.entities[owner.0].own_columns.push(column),
                }
                column
            }
        };

        let (column_type, length) = {
            let referenced = &graph.columns[referenced.0];
            (referenced.column_type.clone(), referenced.length)
        };
        let metadata = &mut graph.columns[column.0];
        metadata.referenced_column = Some(referenced);
        metadata.column_type = column_type;
        metadata.length = length;
        metadata.relation = Some(relation_key);
        self.build_column(graph, column);
        column
    }

    fn resolve_relation_ids(&self, graph: &mut MetadataGraph) -> Result<()> {
        for index in 0..graph.relation_ids.len() {
            let relation_id = &graph.relation_ids[index];
            let relation = find_relation(graph, relation_id.entity, &relation_id.relation_name)
                .ok_or_else(|| ValidationError::MissingRelation {
                    entity: graph.entities[relation_id.entity.0].name.clone(),
                    property: relation_id.property_name.clone(),
                    relation: relation_id.relation_name.clone(),
                })?;
            graph.relation_ids[index].relation = Some(relation);
        }
        Ok(())
    }

    fn resolve_relation_counts(&self, graph: &mut MetadataGraph) -> Result<()> {
        for index in 0..graph.relation_counts.len() {
            let relation_count = &graph.relation_counts[index];
            let relation = find_relation(graph, relation_count.entity, &relation_count.relation_name)
                .ok_or_else(|| ValidationError::MissingRelation {
                    entity: graph.entities[relation_count.entity.0].name.clone(),
                    property: relation_count.property_name.clone(),
                    relation: relation_count.relation_name.clone(),
                })?;
            graph.relation_counts[index].relation = Some(relation);
        }
        Ok(())
    }
}

/// Entity a relation points at. Table targets also match by table name.
fn find_related(graph: &MetadataGraph, related: &Target) -> Option<EntityKey> {
    graph
        .entities
        .iter()
        .position(|entity| &entity.target == related)
        .or_else(|| match related {
            Target::Table(name) => graph.entities.iter().position(|entity| {
                &entity.target_name == name || entity.given_table_name.as_ref() == Some(name)
            }),
            Target::Class(_) => None,
        })
        .map(EntityKey)
}

fn find_relation(graph: &MetadataGraph, entity: EntityKey, property_path: &str) -> Option<RelationKey> {
    graph.entities[entity.0]
        .relations
        .iter()
        .copied()
        .find(|&r| graph.relations[r.0].property_path == property_path)
}

/// Single-table children holding the relation see its join columns and
/// foreign key too.
fn propagate_to_children(
    graph: &mut MetadataGraph,
    key: EntityKey,
    relation: RelationKey,
    join_columns: &[ColumnKey],
    foreign_key: Option<ForeignKeyKey>,
) {
    let embedded = graph.relations[relation.0].embedded.is_some();
    let children: Vec<EntityKey> = graph.entities[key.0]
        .child_entity_metadatas
        .iter()
        .copied()
        .filter(|&child| {
            let child = &graph.entities[child.0];
            child.parent_entity_metadata == Some(key) && child.relations.contains(&relation)
        })
        .collect();

    for child in children {
        let child = &mut graph.entities[child.0];
        if !embedded {
            for &column in join_columns {
                if !child.own_columns.contains(&column) {
                    child.own_columns.push(column);
                }
            }
        }
        child.foreign_keys.extend(foreign_key);
    }
}
