//! ormeta core - entity metadata registry, inheritance resolution and the
//! metadata builder.
//!
//! Registrations are collected in a [`MetadataRegistry`], resolved by the
//! [`EntityMetadataBuilder`] into a [`MetadataGraph`], and published by a
//! [`Connection`] as a shared read-only snapshot.

pub mod builder;
pub mod connection;
pub mod driver;
pub mod error;
pub mod inheritance;
pub mod metadata;
pub mod naming;
pub mod options;
pub mod registry;

pub use builder::EntityMetadataBuilder;
pub use connection::{Connection, MetadataHandle};
pub use driver::{Driver, DriverDescriptor, OfflineDriver, TablePathStyle};
pub use error::{ConfigurationError, Error, Result, ValidationError};
pub use inheritance::InheritanceResolver;
pub use metadata::{
    CheckMetadata, ColumnKey, ColumnMetadata, EmbeddedKey, EmbeddedMetadata, EntityInstance,
    EntityKey, EntityListenerMetadata, EntityMetadata, EntityRef, ForeignKeyMetadata, IndexMetadata,
    MetadataGraph, RelationCountMetadata, RelationIdMetadata, RelationKey, RelationLoader,
    RelationMetadata, UniqueMetadata, ValueMapOptions,
};
pub use naming::{DefaultNamingStrategy, NamingStrategy};
pub use options::ConnectionOptions;
pub use registry::{MetadataRegistry, Target};

/// Re-export protocol types.
pub use ormeta_proto as proto;
