//! Index, unique and check constraint resolution.

use super::{all_keys, EntityMetadataBuilder};
use crate::error::{Result, ValidationError};
use crate::metadata::{ColumnKey, EmbeddedKey, EntityKey, MetadataGraph};

impl<'a> EntityMetadataBuilder<'a> {
    /// Pass 8: resolve constraint columns and names.
    pub(super) fn build_constraints(&self, graph: &mut MetadataGraph) -> Result<()> {
        for key in all_keys(graph) {
            self.resolve_indices(graph, key)?;
            self.resolve_uniques(graph, key)?;
            self.resolve_checks(graph, key);
        }
        Ok(())
    }

    fn resolve_indices(&self, graph: &mut MetadataGraph, key: EntityKey) -> Result<()> {
        for index_key in graph.entities[key.0].indices.clone() {
            let index = &graph.indices[index_key.0];
            if !index.synchronize {
                let name = index.given_name.clone().unwrap_or_default();
                graph.indices[index_key.0].name = name;
                continue;
            }

            let columns = if index.given_column_names.is_empty() {
                index.columns.clone()
            } else {
                resolve_columns(
                    graph,
                    key,
                    index.embedded,
                    &index.given_column_names,
                    "Index",
                    index.given_name.as_deref(),
                )?
            };
            let name = match &index.given_name {
                Some(name) => name.clone(),
                None => self.naming.index_name(
                    &graph.entities[key.0].table_name,
                    &database_names(graph, &columns),
                    index.where_clause.as_deref(),
                ),
            };

            let index = &mut graph.indices[index_key.0];
            index.columns = columns;
            index.name = name;
        }
        Ok(())
    }

    fn resolve_uniques(&self, graph: &mut MetadataGraph, key: EntityKey) -> Result<()> {
        for unique_key in graph.entities[key.0].uniques.clone() {
            let unique = &graph.uniques[unique_key.0];
            let columns = if unique.given_column_names.is_empty() {
                unique.columns.clone()
            } else {
                resolve_columns(
                    graph,
                    key,
                    unique.embedded,
                    &unique.given_column_names,
                    "Unique constraint",
                    unique.given_name.as_deref(),
                )?
            };
            let name = match &unique.given_name {
                Some(name) => name.clone(),
                None => self.naming.unique_constraint_name(
                    &graph.entities[key.0].table_name,
                    &database_names(graph, &columns),
                ),
            };

            let unique = &mut graph.uniques[unique_key.0];
            unique.columns = columns;
            unique.name = name;
        }
        Ok(())
    }

    fn resolve_checks(&self, graph: &mut MetadataGraph, key: EntityKey) {
        for check_key in graph.entities[key.0].checks.clone() {
            let check = &graph.checks[check_key.0];
            let name = match &check.given_name {
                Some(name) => name.clone(),
                None => self
                    .naming
                    .check_constraint_name(&graph.entities[key.0].table_name, &check.expression),
            };
            graph.checks[check_key.0].name = name;
        }
    }
}

/// Resolve the property paths named by a constraint to columns.
///
/// Names declared inside an embedded are relative to it. A name matching a
/// relation with join columns expands to those join columns.
fn resolve_columns(
    graph: &MetadataGraph,
    key: EntityKey,
    embedded: Option<EmbeddedKey>,
    given: &[String],
    kind: &'static str,
    given_name: Option<&str>,
) -> Result<Vec<ColumnKey>> {
    let entity = &graph.entities[key.0];
    let prefix = embedded.map(|e| graph.embeddeds[e.0].property_path.as_str());

    let mut paths: Vec<String> = Vec::with_capacity(given.len());
    for name in given {
        let name = name.trim();
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        };
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    let mut columns = Vec::new();
    for path in paths {
        let column = entity
            .columns
            .iter()
            .copied()
            .find(|&c| graph.columns[c.0].property_path == path);
        if let Some(column) = column {
            columns.push(column);
            continue;
        }

        let relation = entity.relations.iter().copied().find(|&r| {
            let relation = &graph.relations[r.0];
            relation.is_with_join_column && relation.property_path == path
        });
        match relation {
            Some(relation) => columns.extend_from_slice(&graph.relations[relation.0].join_columns),
            None => {
                return Err(ValidationError::MissingConstraintColumn {
                    kind,
                    name: given_name.map(|n| format!("\"{n}\" ")).unwrap_or_default(),
                    entity: entity.target_name.clone(),
                    property: path,
                }
                .into())
            }
        }
    }
    Ok(columns)
}

fn database_names(graph: &MetadataGraph, columns: &[ColumnKey]) -> Vec<String> {
    columns
        .iter()
        .map(|&c| graph.columns[c.0].database_name.clone())
        .collect()
}
