//! Metadata registry - append-only store of raw registration records.

use super::args::{
    CheckArgs, ClassArgs, ColumnArgs, DiscriminatorArgs, EmbeddedArgs, EntityListenerArgs,
    GeneratedArgs, IndexArgs, InheritanceArgs, JoinColumnArgs, RelationArgs, RelationCountArgs,
    RelationIdArgs, TableArgs, TreeArgs, UniqueArgs,
};
use super::target::Target;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// Records that are declared on an entity property.
trait PropertyArgs {
    fn target(&self) -> &Target;
    fn property_name(&self) -> &str;
}

macro_rules! impl_property_args {
    ($($ty:ty),* $(,)?) => {
        $(impl PropertyArgs for $ty {
            fn target(&self) -> &Target {
                &self.target
            }

            fn property_name(&self) -> &str {
                &self.property_name
            }
        })*
    };
}

impl_property_args!(
    ColumnArgs,
    RelationArgs,
    RelationIdArgs,
    RelationCountArgs,
    EmbeddedArgs,
);

/// Every registration made for one bootstrap.
///
/// The registry performs no resolution. It is filled once, then handed to the
/// metadata builder by reference. Queries take an inheritance tree (a list of
/// targets) and return the records declared on any of them.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct MetadataRegistry {
    /// Class hierarchy declarations.
    pub classes: Vec<ClassArgs>,
    /// Table registrations.
    pub tables: Vec<TableArgs>,
    /// Column registrations.
    pub columns: Vec<ColumnArgs>,
    /// Relation registrations.
    pub relations: Vec<RelationArgs>,
    /// Join column registrations.
    pub join_columns: Vec<JoinColumnArgs>,
    /// Relation id registrations.
    pub relation_ids: Vec<RelationIdArgs>,
    /// Relation count registrations.
    pub relation_counts: Vec<RelationCountArgs>,
    /// Index registrations.
    pub indices: Vec<IndexArgs>,
    /// Unique constraint registrations.
    pub uniques: Vec<UniqueArgs>,
    /// Check constraint registrations.
    pub checks: Vec<CheckArgs>,
    /// Embedded registrations.
    pub embeddeds: Vec<EmbeddedArgs>,
    /// Inheritance registrations.
    pub inheritances: Vec<InheritanceArgs>,
    /// Discriminator value registrations.
    pub discriminator_values: Vec<DiscriminatorArgs>,
    /// Generated value registrations.
    pub generations: Vec<GeneratedArgs>,
    /// Entity listener registrations.
    pub entity_listeners: Vec<EntityListenerArgs>,
    /// Tree registrations.
    pub trees: Vec<TreeArgs>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root class.
    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.classes.push(ClassArgs {
            name: name.into(),
            parent: None,
        });
        self
    }

    /// Declare a class and its direct supertype.
    pub fn with_subclass(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.classes.push(ClassArgs {
            name: name.into(),
            parent: Some(parent.into()),
        });
        self
    }

    /// Register a table.
    pub fn with_table(mut self, args: TableArgs) -> Self {
        self.tables.push(args);
        self
    }

    /// Register a column.
    pub fn with_column(mut self, args: ColumnArgs) -> Self {
        self.columns.push(args);
        self
    }

    /// Register a relation.
    pub fn with_relation(mut self, args: RelationArgs) -> Self {
        self.relations.push(args);
        self
    }

    /// Register a join column.
    pub fn with_join_column(mut self, args: JoinColumnArgs) -> Self {
        self.join_columns.push(args);
        self
    }

    /// Register a relation id property.
    pub fn with_relation_id(mut self, args: RelationIdArgs) -> Self {
        self.relation_ids.push(args);
        self
    }

    /// Register a relation count property.
    pub fn with_relation_count(mut self, args: RelationCountArgs) -> Self {
        self.relation_counts.push(args);
        self
    }

    /// Register an index.
    pub fn with_index(mut self, args: IndexArgs) -> Self {
        self.indices.push(args);
        self
    }

    /// Register a unique constraint.
    pub fn with_unique(mut self, args: UniqueArgs) -> Self {
        self.uniques.push(args);
        self
    }

    /// Register a check constraint.
    pub fn with_check(mut self, args: CheckArgs) -> Self {
        self.checks.push(args);
        self
    }

    /// Register an embedded object.
    pub fn with_embedded(mut self, args: EmbeddedArgs) -> Self {
        self.embeddeds.push(args);
        self
    }

    /// Register an inheritance pattern.
    pub fn with_inheritance(mut self, args: InheritanceArgs) -> Self {
        self.inheritances.push(args);
        self
    }

    /// Register a discriminator value.
    pub fn with_discriminator_value(mut self, target: Target, value: impl Into<String>) -> Self {
        self.discriminator_values.push(DiscriminatorArgs {
            target,
            value: value.into(),
        });
        self
    }

    /// Register a generated value.
    pub fn with_generated(mut self, args: GeneratedArgs) -> Self {
        self.generations.push(args);
        self
    }

    /// Register an entity listener.
    pub fn with_listener(mut self, args: EntityListenerArgs) -> Self {
        self.entity_listeners.push(args);
        self
    }

    /// Register a tree.
    pub fn with_tree(mut self, args: TreeArgs) -> Self {
        self.trees.push(args);
        self
    }

    /// Direct supertype of a class.
    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.name == class)
            .and_then(|c| c.parent.as_deref())
    }

    /// Check if `child` is a strict, transitive subclass of `parent`.
    ///
    /// Table targets never take part in class inheritance. A cyclic hierarchy
    /// answers `false`; cycles are reported by the inheritance resolver.
    pub fn is_subclass(&self, child: &Target, parent: &Target) -> bool {
        let (Target::Class(child), Target::Class(parent)) = (child, parent) else {
            return false;
        };
        let mut current = self.parent_of(child);
        let mut steps = 0;
        while let Some(class) = current {
            if class == parent {
                return true;
            }
            steps += 1;
            if steps > self.classes.len() {
                return false;
            }
            current = self.parent_of(class);
        }
        false
    }

    /// Tables registered for any of the given targets.
    pub fn filter_tables(&self, targets: &[Target]) -> Vec<&TableArgs> {
        self.tables
            .iter()
            .filter(|t| targets.contains(&t.target))
            .collect()
    }

    /// Columns declared on the tree.
    pub fn filter_columns(&self, tree: &[Target]) -> Vec<&ColumnArgs> {
        filter_without_duplicate_properties(&self.columns, tree)
    }

    /// Relations declared on the tree.
    pub fn filter_relations(&self, tree: &[Target]) -> Vec<&RelationArgs> {
        filter_without_duplicate_properties(&self.relations, tree)
    }

    /// Relation ids declared on the tree.
    pub fn filter_relation_ids(&self, tree: &[Target]) -> Vec<&RelationIdArgs> {
        filter_without_duplicate_properties(&self.relation_ids, tree)
    }

    /// Relation counts declared on the tree.
    pub fn filter_relation_counts(&self, tree: &[Target]) -> Vec<&RelationCountArgs> {
        filter_without_duplicate_properties(&self.relation_counts, tree)
    }

    /// Embeddeds declared on the tree.
    pub fn filter_embeddeds(&self, tree: &[Target]) -> Vec<&EmbeddedArgs> {
        filter_without_duplicate_properties(&self.embeddeds, tree)
    }

    /// Join columns declared for one relation property.
    pub fn filter_join_columns(&self, target: &Target, property_name: &str) -> Vec<&JoinColumnArgs> {
        self.join_columns
            .iter()
            .filter(|j| &j.target == target && j.property_name == property_name)
            .collect()
    }

    /// Indices declared on the tree.
    pub fn filter_indices(&self, tree: &[Target]) -> Vec<&IndexArgs> {
        self.indices
            .iter()
            .filter(|i| tree.contains(&i.target))
            .collect()
    }

    /// Unique constraints declared on the tree.
    pub fn filter_uniques(&self, tree: &[Target]) -> Vec<&UniqueArgs> {
        self.uniques
            .iter()
            .filter(|u| tree.contains(&u.target))
            .collect()
    }

    /// Check constraints declared on the tree.
    pub fn filter_checks(&self, tree: &[Target]) -> Vec<&CheckArgs> {
        self.checks
            .iter()
            .filter(|c| tree.contains(&c.target))
            .collect()
    }

    /// Entity listeners declared on the tree.
    pub fn filter_listeners(&self, tree: &[Target]) -> Vec<&EntityListenerArgs> {
        self.entity_listeners
            .iter()
            .filter(|l| tree.contains(&l.target))
            .collect()
    }

    /// Inheritance registration of a target.
    pub fn find_inheritance_type(&self, target: &Target) -> Option<&InheritanceArgs> {
        self.inheritances.iter().find(|i| &i.target == target)
    }

    /// Tree registration of a target.
    pub fn find_tree(&self, target: &Target) -> Option<&TreeArgs> {
        self.trees.iter().find(|t| &t.target == target)
    }

    /// Discriminator value of a target.
    pub fn find_discriminator_value(&self, target: &Target) -> Option<&DiscriminatorArgs> {
        self.discriminator_values
            .iter()
            .find(|d| &d.target == target)
    }

    /// Generated-value registration of a property.
    pub fn find_generated(&self, target: &Target, property_name: &str) -> Option<&GeneratedArgs> {
        self.generations
            .iter()
            .find(|g| &g.target == target && g.property_name == property_name)
    }

    /// Tables whose target is a strict subclass of `target`.
    pub fn filter_single_table_children(&self, target: &Target) -> Vec<&TableArgs> {
        self.tables
            .iter()
            .filter(|t| self.is_subclass(&t.target, target))
            .collect()
    }

    /// Serialize the registry to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a registry from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Records declared on the tree, one per property name.
///
/// When several targets of the tree declare the same property, the
/// declaration from the deepest target (highest tree position) wins and takes
/// the slot of the first declaration.
fn filter_without_duplicate_properties<'a, T: PropertyArgs>(
    records: &'a [T],
    tree: &[Target],
) -> Vec<&'a T> {
    let mut found: Vec<(usize, &'a T)> = Vec::new();
    for record in records {
        let Some(depth) = tree.iter().position(|t| t == record.target()) else {
            continue;
        };
        match found
            .iter_mut()
            .find(|(_, existing)| existing.property_name() == record.property_name())
        {
            Some(slot) => {
                if depth > slot.0 {
                    *slot = (depth, record);
                }
            }
            None => found.push((depth, record)),
        }
    }
    found.into_iter().map(|(_, record)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ColumnType, GenerationStrategy};

    fn user() -> Target {
        Target::class("User")
    }

    fn admin() -> Target {
        Target::class("Admin")
    }

    fn sample_registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with_class("User")
            .with_subclass("Admin", "User")
            .with_subclass("SuperAdmin", "Admin")
            .with_table(TableArgs::new(user()))
            .with_table(TableArgs::child(admin()))
            .with_table(TableArgs::child(Target::class("SuperAdmin")))
            .with_column(ColumnArgs::primary(user(), "id", ColumnType::Int))
            .with_column(ColumnArgs::new(user(), "name", ColumnType::Varchar))
            .with_column(ColumnArgs::new(admin(), "name", ColumnType::Text))
            .with_column(ColumnArgs::new(admin(), "level", ColumnType::Int))
            .with_generated(GeneratedArgs {
                target: user(),
                property_name: "id".into(),
                strategy: GenerationStrategy::Increment,
            })
    }

    #[test]
    fn test_is_subclass_is_transitive_and_strict() {
        let registry = sample_registry();

        assert!(registry.is_subclass(&admin(), &user()));
        assert!(registry.is_subclass(&Target::class("SuperAdmin"), &user()));
        assert!(!registry.is_subclass(&user(), &user()));
        assert!(!registry.is_subclass(&user(), &admin()));
        assert!(!registry.is_subclass(&Target::table("admins"), &user()));
    }

    #[test]
    fn test_filter_columns_deepest_declaration_wins() {
        let registry = sample_registry();
        let columns = registry.filter_columns(&[user(), admin()]);

        let names: Vec<_> = columns.iter().map(|c| c.property_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "level"]);
        assert_eq!(columns[1].target, admin());
        assert_eq!(columns[1].options.column_type, Some(ColumnType::Text));
    }

    #[test]
    fn test_filter_columns_ignores_targets_outside_tree() {
        let registry = sample_registry();
        let columns = registry.filter_columns(&[user()]);

        assert_eq!(columns.len(), 2);
        assert!(columns.iter().all(|c| c.target == user()));
    }

    #[test]
    fn test_filter_single_table_children() {
        let registry = sample_registry();
        let children = registry.filter_single_table_children(&user());

        assert_eq!(children.len(), 2);
        assert!(registry.filter_single_table_children(&admin()).len() == 1);
    }

    #[test]
    fn test_find_generated() {
        let registry = sample_registry();

        assert!(registry.find_generated(&user(), "id").is_some());
        assert!(registry.find_generated(&user(), "name").is_none());
        assert!(registry.find_generated(&admin(), "id").is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let registry = sample_registry();
        let bytes = registry.to_bytes().unwrap();
        let decoded = MetadataRegistry::from_bytes(&bytes).unwrap();

        assert_eq!(registry, decoded);
    }
}
