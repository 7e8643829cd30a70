//! Resolved entity metadata.
//!
//! Everything produced by the metadata builder lives in one
//! [`MetadataGraph`]. Runtime operations that follow keys through the graph
//! are exposed on [`EntityRef`].

mod column;
mod constraint;
mod embedded;
mod entity;
mod graph;
mod instance;
mod listener;
mod relation;
mod relation_id;

pub use column::ColumnMetadata;
pub use constraint::{CheckMetadata, ForeignKeyMetadata, IndexMetadata, UniqueMetadata};
pub use embedded::EmbeddedMetadata;
pub use entity::{EntityMetadata, EntityRef};
pub use graph::{
    CheckKey, ColumnKey, EmbeddedKey, EntityKey, ForeignKeyKey, IndexKey, ListenerKey,
    MetadataGraph, RelationCountKey, RelationIdKey, RelationKey, UniqueKey, ValueMapOptions,
};
pub use instance::{EntityInstance, RelationLoader};
pub use listener::EntityListenerMetadata;
pub use relation::RelationMetadata;
pub use relation_id::{RelationCountMetadata, RelationIdMetadata};
