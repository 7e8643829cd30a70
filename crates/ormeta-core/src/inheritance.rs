//! Class inheritance resolution.
//!
//! Walks the class hierarchy declared in the registry. Table targets have no
//! class and never inherit.

use crate::error::{ConfigurationError, Result};
use crate::registry::{InheritancePattern, MetadataRegistry, TableArgs, TableType, Target};
use std::collections::BTreeMap;

/// Answers inheritance questions over a registry.
#[derive(Debug, Clone, Copy)]
pub struct InheritanceResolver<'a> {
    registry: &'a MetadataRegistry,
}

impl<'a> InheritanceResolver<'a> {
    /// Create a resolver over a registry.
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        Self { registry }
    }

    /// Ancestor chain of a target, root first and ending with the target.
    pub fn ancestor_chain(&self, target: &Target) -> Result<Vec<Target>> {
        let Target::Class(class) = target else {
            return Ok(vec![target.clone()]);
        };

        let mut chain = vec![class.as_str()];
        let mut current = self.registry.parent_of(class);
        while let Some(parent) = current {
            if chain.contains(&parent) {
                return Err(ConfigurationError::CyclicClassHierarchy {
                    class: class.clone(),
                }
                .into());
            }
            chain.push(parent);
            current = self.registry.parent_of(parent);
        }
        Ok(chain.into_iter().rev().map(Target::class).collect())
    }

    /// Check if `child` strictly and transitively subclasses `parent`.
    pub fn is_subclass(&self, child: &Target, parent: &Target) -> bool {
        self.registry.is_subclass(child, parent)
    }

    fn is_single_table_root(&self, target: &Target) -> bool {
        self.registry
            .find_inheritance_type(target)
            .is_some_and(|i| i.pattern == InheritancePattern::SingleTable)
    }

    /// Classify a table registration.
    ///
    /// A table is a single-table child when registered as one, or when it
    /// declares single-table inheritance itself while a strict ancestor is an
    /// already registered single-table root.
    pub fn classify(&self, table: &TableArgs) -> Result<TableType> {
        if table.table_type != TableType::Regular || !self.is_single_table_root(&table.target) {
            return Ok(table.table_type);
        }

        let chain = self.ancestor_chain(&table.target)?;
        let joins_root = chain[..chain.len() - 1].iter().any(|ancestor| {
            self.is_single_table_root(ancestor)
                && self
                    .registry
                    .tables
                    .iter()
                    .any(|t| &t.target == ancestor && t.table_type == TableType::Regular)
        });
        Ok(if joins_root {
            TableType::EntityChild
        } else {
            TableType::Regular
        })
    }

    /// Targets whose registrations feed the table's entity.
    ///
    /// The ancestor chain, followed by every registered subclass table when
    /// single-table inheritance applies, so that subtype columns are visible
    /// while building the shared table.
    pub fn inheritance_tree(&self, table: &TableArgs) -> Result<Vec<Target>> {
        let mut tree = self.ancestor_chain(&table.target)?;
        let single_table = self.classify(table)? == TableType::EntityChild
            || self.is_single_table_root(&table.target);
        if single_table {
            for child in self.registry.filter_single_table_children(&table.target) {
                if child.target.is_class() && !tree.contains(&child.target) {
                    tree.push(child.target.clone());
                }
            }
        }
        Ok(tree)
    }

    /// Single-table roots mapped to the targets of their registered subtypes.
    pub fn single_table_groups(&self) -> Result<BTreeMap<Target, Vec<Target>>> {
        let mut groups = BTreeMap::new();
        for table in &self.registry.tables {
            if !self.is_single_table_root(&table.target)
                || self.classify(table)? != TableType::Regular
            {
                continue;
            }
            let members = self
                .registry
                .filter_single_table_children(&table.target)
                .into_iter()
                .map(|child| child.target.clone())
                .collect();
            groups.insert(table.target.clone(), members);
        }
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::InheritanceArgs;

    fn content_registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with_class("Unit")
            .with_subclass("ContentModel", "Unit")
            .with_subclass("Post", "ContentModel")
            .with_subclass("Page", "ContentModel")
            .with_table(TableArgs::new(Target::class("ContentModel")))
            .with_table(TableArgs::child(Target::class("Post")))
            .with_table(TableArgs::child(Target::class("Page")))
            .with_inheritance(InheritanceArgs::single_table(Target::class("ContentModel")))
    }

    #[test]
    fn test_ancestor_chain_is_root_first() {
        let registry = content_registry();
        let resolver = InheritanceResolver::new(&registry);

        assert_eq!(
            resolver.ancestor_chain(&Target::class("Post")).unwrap(),
            vec![
                Target::class("Unit"),
                Target::class("ContentModel"),
                Target::class("Post")
            ]
        );
        assert_eq!(
            resolver.ancestor_chain(&Target::table("audit_log")).unwrap(),
            vec![Target::table("audit_log")]
        );
    }

    #[test]
    fn test_ancestor_chain_rejects_cycles() {
        let registry = MetadataRegistry::new()
            .with_subclass("A", "B")
            .with_subclass("B", "A");
        let resolver = InheritanceResolver::new(&registry);

        let err = resolver.ancestor_chain(&Target::class("A")).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::CyclicClassHierarchy { .. })
        ));
    }

    #[test]
    fn test_inheritance_tree_appends_single_table_children() {
        let registry = content_registry();
        let resolver = InheritanceResolver::new(&registry);

        let tree = resolver.inheritance_tree(&registry.tables[0]).unwrap();
        assert_eq!(
            tree,
            vec![
                Target::class("Unit"),
                Target::class("ContentModel"),
                Target::class("Post"),
                Target::class("Page")
            ]
        );

        let post_tree = resolver.inheritance_tree(&registry.tables[1]).unwrap();
        assert_eq!(post_tree.len(), 3);
    }

    #[test]
    fn test_classify_child_declaring_single_table() {
        let registry = content_registry()
            .with_subclass("Article", "ContentModel")
            .with_table(TableArgs::new(Target::class("Article")))
            .with_inheritance(InheritanceArgs::single_table(Target::class("Article")));
        let resolver = InheritanceResolver::new(&registry);

        let article = registry.tables.last().unwrap();
        assert_eq!(resolver.classify(article).unwrap(), TableType::EntityChild);
        assert_eq!(
            resolver.classify(&registry.tables[0]).unwrap(),
            TableType::Regular
        );
    }

    #[test]
    fn test_single_table_groups() {
        let registry = content_registry();
        let resolver = InheritanceResolver::new(&registry);

        let groups = resolver.single_table_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[&Target::class("ContentModel")],
            vec![Target::class("Post"), Target::class("Page")]
        );
    }
}
