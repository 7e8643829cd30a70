//! Registration records and the registry that stores them.
//!
//! The registry is the builder's only input describing the user's entities.
//! It is an explicit value, constructed per bootstrap and passed by reference.

mod args;
mod registry;
mod target;

pub use args::{
    CascadeOptions, CheckArgs, ClassArgs, ColumnArgs, ColumnMode, ColumnOptions, ColumnType,
    DiscriminatorArgs, DiscriminatorColumnOptions, EmbeddedArgs, EmbeddedPrefix,
    EntityListenerArgs, GeneratedArgs, GenerationStrategy, IndexArgs, InheritanceArgs,
    InheritancePattern, JoinColumnArgs, ListenerEvent, OrderBy, OrderDirection, ReferentialAction,
    RelationArgs, RelationCountArgs, RelationIdArgs, RelationOptions, RelationType, TableArgs,
    TableType, TreeArgs, TreeType, UniqueArgs,
};
pub use registry::MetadataRegistry;
pub use target::Target;
