//! Embedded object metadata.

use super::graph::{ColumnKey, EmbeddedKey, EntityKey, IndexKey, ListenerKey, RelationKey, UniqueKey};
use crate::registry::{EmbeddedArgs, EmbeddedPrefix};

/// An embedded object flattened into its owner's table.
///
/// Embeddeds form a tree rooted at the owning entity. Columns of an embedded
/// are prefixed by every prefix on the way down (`parent_prefixes`) and
/// addressed by the dotted `property_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Property holding the embedded object.
    pub property_name: String,
    /// Dotted path from the entity.
    pub property_path: String,
    /// Embedded class name.
    pub embedded_type: String,
    /// Prefix policy as declared.
    pub custom_prefix: EmbeddedPrefix,
    /// Resolved prefix of this level. Empty when disabled.
    pub prefix: String,
    /// The property holds an array of embedded objects.
    pub is_array: bool,
    /// Property names from the entity down to and including this embedded.
    pub parent_property_names: Vec<String>,
    /// Prefixes from the entity down to and including this embedded.
    pub parent_prefixes: Vec<String>,
    /// Enclosing embedded.
    pub parent_embedded: Option<EmbeddedKey>,
    /// Direct columns.
    pub columns: Vec<ColumnKey>,
    /// Direct relations.
    pub relations: Vec<RelationKey>,
    /// Direct listeners.
    pub listeners: Vec<ListenerKey>,
    /// Direct indices.
    pub indices: Vec<IndexKey>,
    /// Direct unique constraints.
    pub uniques: Vec<UniqueKey>,
    /// Nested embeddeds.
    pub embeddeds: Vec<EmbeddedKey>,
    /// Columns of this embedded and every nested one.
    pub columns_from_tree: Vec<ColumnKey>,
    /// Relations of this embedded and every nested one.
    pub relations_from_tree: Vec<RelationKey>,
    /// Listeners of this embedded and every nested one.
    pub listeners_from_tree: Vec<ListenerKey>,
    /// Indices of this embedded and every nested one.
    pub indices_from_tree: Vec<IndexKey>,
    /// Unique constraints of this embedded and every nested one.
    pub uniques_from_tree: Vec<UniqueKey>,
}

impl EmbeddedMetadata {
    pub(crate) fn from_args(entity: EntityKey, parent: Option<&EmbeddedMetadata>, parent_key: Option<EmbeddedKey>, args: &EmbeddedArgs) -> Self {
        let mut embedded = Self {
            entity,
            property_name: args.property_name.clone(),
            property_path: args.property_name.clone(),
            embedded_type: args.embedded_type.clone(),
            custom_prefix: args.prefix.clone(),
            prefix: String::new(),
            is_array: args.is_array,
            parent_property_names: Vec::new(),
            parent_prefixes: Vec::new(),
            parent_embedded: parent_key,
            columns: Vec::new(),
            relations: Vec::new(),
            listeners: Vec::new(),
            indices: Vec::new(),
            uniques: Vec::new(),
            embeddeds: Vec::new(),
            columns_from_tree: Vec::new(),
            relations_from_tree: Vec::new(),
            listeners_from_tree: Vec::new(),
            indices_from_tree: Vec::new(),
            uniques_from_tree: Vec::new(),
        };
        embedded.build_paths(parent);
        embedded
    }

    /// Recompute prefix and paths from the enclosing embedded.
    pub(crate) fn build_paths(&mut self, parent: Option<&EmbeddedMetadata>) {
        self.prefix = match &self.custom_prefix {
            EmbeddedPrefix::Default => self.property_name.clone(),
            EmbeddedPrefix::Custom(prefix) => prefix.clone(),
            EmbeddedPrefix::Disabled => String::new(),
        };

        let (mut names, mut prefixes) = match parent {
            Some(parent) => (
                parent.parent_property_names.clone(),
                parent.parent_prefixes.clone(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        names.push(self.property_name.clone());
        prefixes.push(self.prefix.clone());

        self.property_path = names.join(".");
        self.parent_property_names = names;
        self.parent_prefixes = prefixes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Target;

    fn args(property: &str, prefix: EmbeddedPrefix) -> EmbeddedArgs {
        EmbeddedArgs::new(Target::class("User"), property, "Address").with_prefix(prefix)
    }

    #[test]
    fn test_prefix_policies() {
        let entity = EntityKey(0);

        let default = EmbeddedMetadata::from_args(entity, None, None, &args("address", EmbeddedPrefix::Default));
        assert_eq!(default.prefix, "address");

        let custom = EmbeddedMetadata::from_args(
            entity,
            None,
            None,
            &args("address", EmbeddedPrefix::Custom("addr".into())),
        );
        assert_eq!(custom.prefix, "addr");

        let disabled = EmbeddedMetadata::from_args(entity, None, None, &args("address", EmbeddedPrefix::Disabled));
        assert_eq!(disabled.prefix, "");
        assert_eq!(disabled.parent_prefixes, vec![String::new()]);
    }

    #[test]
    fn test_nested_paths() {
        let entity = EntityKey(0);
        let outer = EmbeddedMetadata::from_args(entity, None, None, &args("home", EmbeddedPrefix::Default));
        let inner = EmbeddedMetadata::from_args(
            entity,
            Some(&outer),
            Some(EmbeddedKey(0)),
            &args("address", EmbeddedPrefix::Default),
        );

        assert_eq!(inner.property_path, "home.address");
        assert_eq!(inner.parent_property_names, vec!["home", "address"]);
        assert_eq!(inner.parent_prefixes, vec!["home", "address"]);
        assert_eq!(inner.parent_embedded, Some(EmbeddedKey(0)));
    }
}
