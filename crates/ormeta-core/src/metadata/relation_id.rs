//! Relation id and relation count metadata.

use super::graph::{EntityKey, RelationKey};
use crate::registry::{RelationCountArgs, RelationIdArgs, Target};

/// A property that receives the ids of a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationIdMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Declaring target.
    pub target: Target,
    /// Property receiving the ids.
    pub property_name: String,
    /// Property path of the relation as declared.
    pub relation_name: String,
    /// Resolved relation.
    pub relation: Option<RelationKey>,
}

impl RelationIdMetadata {
    pub(crate) fn from_args(entity: EntityKey, args: &RelationIdArgs) -> Self {
        Self {
            entity,
            target: args.target.clone(),
            property_name: args.property_name.clone(),
            relation_name: args.relation_name.clone(),
            relation: None,
        }
    }
}

/// A property that receives the number of related rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationCountMetadata {
    /// Owning entity.
    pub entity: EntityKey,
    /// Declaring target.
    pub target: Target,
    /// Property receiving the count.
    pub property_name: String,
    /// Property path of the relation as declared.
    pub relation_name: String,
    /// Resolved relation.
    pub relation: Option<RelationKey>,
}

impl RelationCountMetadata {
    pub(crate) fn from_args(entity: EntityKey, args: &RelationCountArgs) -> Self {
        Self {
            entity,
            target: args.target.clone(),
            property_name: args.property_name.clone(),
            relation_name: args.relation_name.clone(),
            relation: None,
        }
    }
}
