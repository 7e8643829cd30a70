//! Names, paths and derived entity lists.

use super::EntityMetadataBuilder;
use crate::error::{Result, ValidationError};
use crate::metadata::{
    ColumnKey, ColumnMetadata, EmbeddedKey, EntityKey, MetadataGraph, RelationKey, RelationMetadata,
};
use crate::registry::GenerationStrategy;
use ormeta_proto::Value;
use std::collections::HashSet;

impl<'a> EntityMetadataBuilder<'a> {
    /// Compute a column's property path and physical names.
    pub(super) fn build_column(&self, graph: &mut MetadataGraph, key: ColumnKey) {
        let column = &graph.columns[key.0];
        let (mut names, prefixes) = match column.embedded {
            Some(embedded) => {
                let embedded = &graph.embeddeds[embedded.0];
                (
                    embedded.parent_property_names.clone(),
                    embedded.parent_prefixes.clone(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        names.push(column.property_name.clone());
        let mut property_path = names.join(".");
        if column.is_virtual {
            if let Some(referenced) = column.referenced_column {
                let referenced = &graph.columns[referenced.0].property_name;
                if referenced != &column.property_name {
                    property_path = format!("{property_path}.{referenced}");
                }
            }
        }
        names.pop();

        let given = column.given_database_name.as_deref();
        let database_name = self.naming.column_name(&column.property_name, given, &prefixes);
        let without_prefixes = self.naming.column_name(&column.property_name, given, &[]);
        names.push(database_name.clone());
        let database_path = names.join(".");

        let column = &mut graph.columns[key.0];
        column.property_path = property_path;
        column.database_name = database_name;
        column.database_name_without_prefixes = without_prefixes;
        column.database_path = database_path;
    }

    /// Compute a relation's property path.
    pub(super) fn build_relation(&self, graph: &mut MetadataGraph, key: RelationKey) {
        let path = graph.relation_value_path(key).join(".");
        graph.relations[key.0].property_path = path;
    }

    /// Recompute everything derived from an entity's own elements and its
    /// embeddeds.
    pub(super) fn compute_derived(&self, graph: &mut MetadataGraph, key: EntityKey) -> Result<()> {
        let mut all_embeddeds = Vec::new();
        for embedded in graph.entities[key.0].embeddeds.clone() {
            refresh_embedded(graph, embedded, None, &mut all_embeddeds);
        }

        let entity = &graph.entities[key.0];
        let mut columns = entity.own_columns.clone();
        let mut relations = entity.own_relations.clone();
        let mut listeners = entity.own_listeners.clone();
        let mut indices = entity.own_indices.clone();
        let mut uniques = entity.own_uniques.clone();
        for &embedded in &entity.embeddeds {
            let embedded = &graph.embeddeds[embedded.0];
            columns.extend_from_slice(&embedded.columns_from_tree);
            relations.extend_from_slice(&embedded.relations_from_tree);
            listeners.extend_from_slice(&embedded.listeners_from_tree);
            indices.extend_from_slice(&embedded.indices_from_tree);
            uniques.extend_from_slice(&embedded.uniques_from_tree);
        }

        for &column in &columns {
            self.build_column(graph, column);
        }
        for &relation in &relations {
            self.build_relation(graph, relation);
        }

        let find_column = |predicate: fn(&ColumnMetadata) -> bool| {
            columns
                .iter()
                .copied()
                .find(|&c| predicate(&graph.columns[c.0]))
        };
        let filter_columns = |predicate: fn(&ColumnMetadata) -> bool| {
            columns
                .iter()
                .copied()
                .filter(|&c| predicate(&graph.columns[c.0]))
                .collect::<Vec<_>>()
        };
        let filter_relations = |predicate: fn(&RelationMetadata) -> bool| {
            relations
                .iter()
                .copied()
                .filter(|&r| predicate(&graph.relations[r.0]))
                .collect::<Vec<_>>()
        };

        let primary_columns = filter_columns(|c| c.is_primary);
        let generated_columns = filter_columns(|c| c.is_generated || c.is_object_id);
        let has_uuid_generated_columns = columns
            .iter()
            .any(|&c| graph.columns[c.0].generation_strategy == Some(GenerationStrategy::Uuid));
        let create_date_column = find_column(|c| c.is_create_date());
        let update_date_column = find_column(|c| c.is_update_date());
        let delete_date_column = find_column(|c| c.is_delete_date());
        let version_column = find_column(|c| c.is_version());
        let discriminator_column = find_column(|c| c.is_discriminator);
        let object_id_column = find_column(|c| c.is_object_id);
        let eager_relations = filter_relations(|r| r.is_eager);
        let lazy_relations = filter_relations(|r| r.is_lazy);
        let relations_with_join_columns = filter_relations(|r| r.is_with_join_column);

        let mut seen = HashSet::new();
        let mut properties_map = Value::object();
        for &column in &columns {
            let column = &graph.columns[column.0];
            if column.is_join_column() {
                continue;
            }
            if !seen.insert(column.property_path.as_str()) {
                return Err(ValidationError::DuplicatePropertyPath {
                    entity: graph.entities[key.0].name.clone(),
                    path: column.property_path.clone(),
                }
                .into());
            }
            properties_map.merge_deep(path_leaf(&column.property_path));
        }
        for &relation in &relations {
            properties_map.merge_deep(path_leaf(&graph.relations[relation.0].property_path));
        }

        let entity = &mut graph.entities[key.0];
        entity.has_multiple_primary_keys = primary_columns.len() > 1;
        entity.primary_columns = primary_columns;
        entity.generated_columns = generated_columns;
        entity.has_uuid_generated_columns = has_uuid_generated_columns;
        entity.create_date_column = create_date_column;
        entity.update_date_column = update_date_column;
        entity.delete_date_column = delete_date_column;
        entity.version_column = version_column;
        entity.discriminator_column = discriminator_column;
        entity.object_id_column = object_id_column;
        entity.eager_relations = eager_relations;
        entity.lazy_relations = lazy_relations;
        entity.relations_with_join_columns = relations_with_join_columns;
        entity.columns = columns;
        entity.relations = relations;
        entity.listeners = listeners;
        entity.indices = indices;
        entity.uniques = uniques;
        entity.all_embeddeds = all_embeddeds;
        entity.properties_map = properties_map;
        Ok(())
    }
}

/// Rebuild an embedded's paths and its `*_from_tree` lists, depth first.
fn refresh_embedded(
    graph: &mut MetadataGraph,
    key: EmbeddedKey,
    parent: Option<EmbeddedKey>,
    all: &mut Vec<EmbeddedKey>,
) {
    let parent_metadata = parent.map(|parent| graph.embeddeds[parent.0].clone());
    graph.embeddeds[key.0].build_paths(parent_metadata.as_ref());
    all.push(key);

    let nested = graph.embeddeds[key.0].embeddeds.clone();
    for &child in &nested {
        refresh_embedded(graph, child, Some(key), all);
    }

    let embedded = &graph.embeddeds[key.0];
    let mut columns = embedded.columns.clone();
    let mut relations = embedded.relations.clone();
    let mut listeners = embedded.listeners.clone();
    let mut indices = embedded.indices.clone();
    let mut uniques = embedded.uniques.clone();
    for &child in &nested {
        let child = &graph.embeddeds[child.0];
        columns.extend_from_slice(&child.columns_from_tree);
        relations.extend_from_slice(&child.relations_from_tree);
        listeners.extend_from_slice(&child.listeners_from_tree);
        indices.extend_from_slice(&child.indices_from_tree);
        uniques.extend_from_slice(&child.uniques_from_tree);
    }

    let embedded = &mut graph.embeddeds[key.0];
    embedded.columns_from_tree = columns;
    embedded.relations_from_tree = relations;
    embedded.listeners_from_tree = listeners;
    embedded.indices_from_tree = indices;
    embedded.uniques_from_tree = uniques;
}

/// `a.b.c` as `{a: {b: {c: "a.b.c"}}}`.
fn path_leaf(path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    Value::nest(&segments, Value::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_leaf() {
        let leaf = path_leaf("address.city");
        assert_eq!(
            leaf.get_dotted("address.city"),
            Some(&Value::from("address.city"))
        );
    }
}
