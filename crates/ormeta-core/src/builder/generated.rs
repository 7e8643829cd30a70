//! Generated column resolution.

use super::{all_keys, EntityMetadataBuilder};
use crate::error::Result;
use crate::metadata::{ColumnKey, EntityKey, MetadataGraph};
use crate::registry::{ColumnType, GenerationStrategy};
use std::collections::BTreeSet;
use tracing::trace;

impl<'a> EntityMetadataBuilder<'a> {
    /// Pass 9: mark generated columns and fix their types.
    ///
    /// Uuid columns become `Uuid`, increment columns keep a numeric type or
    /// fall back to `Int`. Join columns referencing a generated column take
    /// its type as well.
    pub(super) fn resolve_generated_columns(&self, graph: &mut MetadataGraph) -> Result<()> {
        let mut touched = BTreeSet::new();
        for key in all_keys(graph) {
            for column in graph.entities[key.0].columns.clone() {
                let Some(target) = graph.columns[column.0].target.as_ref() else {
                    continue;
                };
                let Some(generated) = self
                    .registry
                    .find_generated(target, &graph.columns[column.0].property_name)
                else {
                    continue;
                };

                let metadata = &mut graph.columns[column.0];
                if metadata.is_generated {
                    continue;
                }
                metadata.is_generated = true;
                metadata.generation_strategy = Some(generated.strategy);
                metadata.column_type = Some(match generated.strategy {
                    GenerationStrategy::Uuid => ColumnType::Uuid,
                    GenerationStrategy::Increment => match metadata.column_type.take() {
                        Some(column_type) if column_type.is_numeric() => column_type,
                        _ => ColumnType::Int,
                    },
                });
                trace!(column = %metadata.property_path, strategy = ?generated.strategy, "Generated column");
                self.build_column(graph, column);

                touched.extend(holders(graph, column));
                for referencing in cascade_type(graph, column) {
                    touched.extend(holders(graph, referencing));
                }
            }
        }

        for key in touched {
            self.compute_derived(graph, key)?;
        }
        Ok(())
    }
}

/// Entities whose column set holds the column. Single-table children share
/// their parent's slots, so this is more than the owning entity.
fn holders(graph: &MetadataGraph, column: ColumnKey) -> Vec<EntityKey> {
    all_keys(graph)
        .filter(|key| graph.entities[key.0].columns.contains(&column))
        .collect()
}

/// Copy a generated column's type onto the join columns that reference it,
/// transitively. Returns the updated columns.
fn cascade_type(graph: &mut MetadataGraph, generated: ColumnKey) -> Vec<ColumnKey> {
    let column_type = graph.columns[generated.0].column_type.clone();
    let referencing: Vec<ColumnKey> = (0..graph.columns.len())
        .map(ColumnKey)
        .filter(|&c| graph.columns[c.0].referenced_column == Some(generated))
        .collect();

    let mut updated = Vec::new();
    for column in referencing {
        graph.columns[column.0].column_type = column_type.clone();
        updated.push(column);
        updated.extend(cascade_type(graph, column));
    }
    updated
}
