//! Entity metadata builder.
//!
//! Turns the registrations of a [`MetadataRegistry`] into a
//! [`MetadataGraph`]. The build runs as a fixed sequence of passes, each one
//! a full loop over all entities before the next starts:
//!
//! 0. select and classify table registrations
//! 1. construct empty entities
//! 2. link single-table children to their parent
//! 3. link every entity to its subclasses
//! 4. resolve table identity
//! 5. build own columns, relations, embeddeds and constraint shells
//! 6. compute derived properties
//! 7. resolve inverse relations and materialize join columns
//! 8. build indices, uniques and checks
//! 9. resolve generated columns

mod constraints;
mod derived;
mod generated;
mod relations;
mod schema;

use crate::driver::DriverDescriptor;
use crate::error::{ConfigurationError, Result};
use crate::inheritance::InheritanceResolver;
use crate::metadata::{EntityKey, EntityMetadata, MetadataGraph};
use crate::naming::NamingStrategy;
use crate::options::ConnectionOptions;
use crate::registry::{InheritancePattern, MetadataRegistry, TableArgs, TableType, Target};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Builds entity metadata from registrations.
#[derive(Debug, Clone, Copy)]
pub struct EntityMetadataBuilder<'a> {
    registry: &'a MetadataRegistry,
    options: &'a ConnectionOptions,
    naming: &'a dyn NamingStrategy,
    driver: &'a DriverDescriptor,
    resolver: InheritanceResolver<'a>,
}

impl<'a> EntityMetadataBuilder<'a> {
    /// Create a builder.
    pub fn new(
        registry: &'a MetadataRegistry,
        options: &'a ConnectionOptions,
        naming: &'a dyn NamingStrategy,
        driver: &'a DriverDescriptor,
    ) -> Self {
        Self {
            registry,
            options,
            naming,
            driver,
            resolver: InheritanceResolver::new(registry),
        }
    }

    /// Build metadata for the tables registered for `targets`, or for every
    /// registered table when `targets` is `None`.
    #[instrument(skip_all, fields(connection = %self.options.name, driver = %self.driver.name))]
    pub fn build(&self, targets: Option<&[Target]>) -> Result<MetadataGraph> {
        let tables = self.select_tables(targets)?;
        debug!(
            tables = tables.len(),
            single_table_groups = self.resolver.single_table_groups()?.len(),
            "Selected table registrations"
        );

        let mut graph = MetadataGraph::default();
        for (args, table_type) in tables {
            let entity = self.create_entity(args, table_type)?;
            graph.entities.push(entity);
        }

        self.link_parents(&mut graph)?;
        self.link_children(&mut graph);

        let (roots, children) = partition_children(&graph);
        for &key in roots.iter().chain(&children) {
            self.build_table_identity(&mut graph, key);
        }
        check_duplicate_tables(&graph, &roots)?;
        debug!(entities = graph.len(), children = children.len(), "Resolved table identities");

        for &key in roots.iter().chain(&children) {
            self.build_own_elements(&mut graph, key)?;
        }
        for key in all_keys(&graph) {
            self.compute_derived(&mut graph, key)?;
        }
        debug!(columns = graph.columns.len(), relations = graph.relations.len(), "Built schema elements");

        self.resolve_relations(&mut graph)?;
        debug!(foreign_keys = graph.foreign_keys.len(), "Resolved relations");

        self.build_constraints(&mut graph)?;
        debug!(
            indices = graph.indices.len(),
            uniques = graph.uniques.len(),
            checks = graph.checks.len(),
            "Built constraints"
        );

        self.resolve_generated_columns(&mut graph)?;
        Ok(graph)
    }

    /// Pass 0: tables that get entity metadata, with their classification.
    fn select_tables(&self, targets: Option<&[Target]>) -> Result<Vec<(&'a TableArgs, TableType)>> {
        let candidates = match targets {
            Some(targets) => self.registry.filter_tables(targets),
            None => self.registry.tables.iter().collect(),
        };

        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(candidates.len());
        for table in candidates {
            let table_type = self.resolver.classify(table)?;
            if !matches!(
                table_type,
                TableType::Regular | TableType::Closure | TableType::EntityChild
            ) {
                continue;
            }
            if !seen.insert(&table.target) {
                return Err(ConfigurationError::DuplicateTarget {
                    target: table.target.clone(),
                }
                .into());
            }
            selected.push((table, table_type));
        }
        Ok(selected)
    }

    /// Pass 1: an empty entity carrying its tree and patterns.
    fn create_entity(&self, args: &TableArgs, table_type: TableType) -> Result<EntityMetadata> {
        let tree = self.resolver.inheritance_tree(args)?;
        let pattern = self
            .registry
            .find_inheritance_type(&args.target)
            .map(|inheritance| inheritance.pattern);
        let tree_type = self.registry.find_tree(&args.target).map(|t| t.tree_type);
        Ok(EntityMetadata::new(args, table_type, tree, pattern, tree_type))
    }

    /// Pass 2: each single-table child links to the deepest single-table
    /// root among its ancestors.
    fn link_parents(&self, graph: &mut MetadataGraph) -> Result<()> {
        for i in 0..graph.entities.len() {
            if !graph.entities[i].is_single_table_child() {
                continue;
            }
            let target = &graph.entities[i].target;
            let parent = graph
                .entities
                .iter()
                .enumerate()
                .filter(|(j, candidate)| {
                    *j != i
                        && !candidate.is_single_table_child()
                        && candidate.inheritance_pattern == Some(InheritancePattern::SingleTable)
                        && candidate.inheritance_tree.contains(target)
                        && self.resolver.is_subclass(target, &candidate.target)
                })
                .reduce(|best, next| {
                    if self.resolver.is_subclass(&next.1.target, &best.1.target) {
                        next
                    } else {
                        best
                    }
                })
                .map(|(j, candidate)| (j, candidate.inheritance_pattern));

            let Some((parent, pattern)) = parent else {
                return Err(ConfigurationError::UnresolvedSingleTableParent {
                    entity: graph.entities[i].name.clone(),
                }
                .into());
            };
            graph.entities[i].parent_entity_metadata = Some(EntityKey(parent));
            graph.entities[i].inheritance_pattern = pattern;
        }
        Ok(())
    }

    /// Pass 3: every entity links to the entities whose target subclasses it.
    fn link_children(&self, graph: &mut MetadataGraph) {
        for i in 0..graph.entities.len() {
            let target = &graph.entities[i].target;
            let children: Vec<EntityKey> = graph
                .entities
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && self.resolver.is_subclass(&other.target, target))
                .map(|(j, _)| EntityKey(j))
                .collect();
            graph.entities[i].child_entity_metadatas = children;
        }
    }

    /// Pass 4: table names and paths. Children take their parent's table.
    fn build_table_identity(&self, graph: &mut MetadataGraph, key: EntityKey) {
        let entity = &graph.entities[key.0];
        let parent = entity
            .parent_entity_metadata
            .map(|parent| &graph.entities[parent.0]);

        let (database, schema, given_table_name, table_source, engine) = match parent {
            Some(parent) => (
                parent.database.clone(),
                entity.schema.clone().or_else(|| parent.schema.clone()),
                parent.given_table_name.clone(),
                parent.target_name.clone(),
                entity.engine.clone().or_else(|| parent.engine.clone()),
            ),
            None => (
                entity.database.clone().or_else(|| self.options.database.clone()),
                entity.schema.clone().or_else(|| self.options.schema.clone()),
                entity.given_table_name.clone(),
                entity.target_name.clone(),
                entity.engine.clone(),
            ),
        };

        let without_prefix = self
            .naming
            .table_name(&table_source, given_table_name.as_deref());
        let table_name = match &self.options.entity_prefix {
            Some(prefix) => self.naming.prefix_table_name(prefix, &without_prefix),
            None => without_prefix.clone(),
        };
        let table_path =
            self.driver
                .build_table_path(&table_name, schema.as_deref(), database.as_deref());
        let schema_path = self
            .driver
            .build_schema_path(schema.as_deref(), database.as_deref());

        let entity = &mut graph.entities[key.0];
        entity.database = database;
        entity.schema = schema;
        entity.engine = engine;
        entity.given_table_name = given_table_name;
        entity.table_name_without_prefix = without_prefix;
        entity.table_name = table_name;
        entity.table_path = table_path;
        entity.schema_path = schema_path;
        entity.name = entity.target_name.clone();
    }
}

/// Entity keys split into non-children and single-table children.
fn partition_children(graph: &MetadataGraph) -> (Vec<EntityKey>, Vec<EntityKey>) {
    all_keys(graph).partition(|key| !graph.entities[key.0].is_single_table_child())
}

fn all_keys(graph: &MetadataGraph) -> impl Iterator<Item = EntityKey> {
    (0..graph.entities.len()).map(EntityKey)
}

/// Two non-child entities may not share a table path.
fn check_duplicate_tables(graph: &MetadataGraph, roots: &[EntityKey]) -> Result<()> {
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for key in roots {
        let entity = &graph.entities[key.0];
        if let Some(first) = claimed.insert(&entity.table_path, &entity.name) {
            return Err(ConfigurationError::DuplicateTableName {
                table: entity.table_path.clone(),
                first: first.to_string(),
                second: entity.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNamingStrategy;

    fn build(registry: &MetadataRegistry, options: &ConnectionOptions, driver: &DriverDescriptor) -> Result<MetadataGraph> {
        EntityMetadataBuilder::new(registry, options, &DefaultNamingStrategy, driver).build(None)
    }

    #[test]
    fn test_table_identity_with_prefix_and_schema() {
        let registry = MetadataRegistry::new()
            .with_class("BlogPost")
            .with_table(TableArgs::new(Target::class("BlogPost")).with_database("main"));
        let options = ConnectionOptions::new()
            .with_entity_prefix("app_")
            .with_schema("content");

        let graph = build(&registry, &options, &DriverDescriptor::mssql()).unwrap();
        let post = graph.get_metadata(&Target::class("BlogPost")).unwrap();

        assert_eq!(post.table_name_without_prefix, "blog_post");
        assert_eq!(post.table_name, "app_blog_post");
        assert_eq!(post.table_path, "main.content.app_blog_post");
        assert_eq!(post.schema_path.as_deref(), Some("main.content"));
        assert_eq!(post.name, "BlogPost");
    }

    #[test]
    fn test_table_target_identity() {
        let registry = MetadataRegistry::new().with_table(TableArgs::new(Target::table("audit_log")));
        let graph = build(&registry, &ConnectionOptions::new(), &DriverDescriptor::postgres()).unwrap();

        let audit = graph.get_metadata(&Target::table("audit_log")).unwrap();
        assert_eq!(audit.name, "audit_log");
        assert_eq!(audit.table_name, "audit_log");
        assert_eq!(audit.target, Target::table("audit_log"));
    }

    #[test]
    fn test_duplicate_target_is_rejected() {
        let registry = MetadataRegistry::new()
            .with_class("User")
            .with_table(TableArgs::new(Target::class("User")))
            .with_table(TableArgs::new(Target::class("User")).named("people"));

        let err = build(&registry, &ConnectionOptions::new(), &DriverDescriptor::postgres()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Configuration(ConfigurationError::DuplicateTarget { .. })
        ));
    }

    #[test]
    fn test_junction_and_embedded_only_tables_are_skipped() {
        let registry = MetadataRegistry::new()
            .with_table(TableArgs::new(Target::table("post_tags")).with_type(TableType::Junction))
            .with_table(TableArgs::new(Target::class("Address")).with_type(TableType::EmbeddedOnly))
            .with_table(TableArgs::new(Target::class("Post")));

        let graph = build(&registry, &ConnectionOptions::new(), &DriverDescriptor::postgres()).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_target_restriction() {
        let registry = MetadataRegistry::new()
            .with_table(TableArgs::new(Target::class("User")))
            .with_table(TableArgs::new(Target::class("Post")));
        let options = ConnectionOptions::new();
        let driver = DriverDescriptor::sqlite();
        let builder = EntityMetadataBuilder::new(&registry, &options, &DefaultNamingStrategy, &driver);

        let graph = builder.build(Some(&[Target::class("Post")])).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.has_metadata(&Target::class("Post")));
        assert!(!graph.has_metadata(&Target::class("User")));
    }

    #[test]
    fn test_unresolved_single_table_parent() {
        let registry = MetadataRegistry::new()
            .with_class("Shape")
            .with_subclass("Circle", "Shape")
            .with_table(TableArgs::new(Target::class("Shape")))
            .with_table(TableArgs::child(Target::class("Circle")));

        let err = build(&registry, &ConnectionOptions::new(), &DriverDescriptor::postgres()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Configuration(ConfigurationError::UnresolvedSingleTableParent { .. })
        ));
    }
}
