//! Raw registration records.
//!
//! These are the immutable inputs of the metadata builder. Each record is
//! tagged with the target that declared it and, where relevant, the property
//! it was declared on.

use super::target::Target;
use rkyv::{Archive, Deserialize, Serialize};

/// Declares a class and its direct supertype.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ClassArgs {
    /// Class name.
    pub name: String,
    /// Direct supertype, if any.
    pub parent: Option<String>,
}

/// Table registration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum TableType {
    /// Standalone table.
    Regular,
    /// Single-table-inheritance subtype sharing its parent's table.
    EntityChild,
    /// Closure-table tree entity.
    Closure,
    /// Many-to-many junction table.
    Junction,
    /// Type that only exists embedded in other entities.
    EmbeddedOnly,
}

/// Default ordering of an entity.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct OrderBy {
    /// Property path to order by.
    pub property: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderBy {
    /// Create ascending order.
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create descending order.
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// A table registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct TableArgs {
    /// Registered target.
    pub target: Target,
    /// User-given table name.
    pub name: Option<String>,
    /// Registration type.
    pub table_type: TableType,
    /// Storage engine hint.
    pub engine: Option<String>,
    /// Database name.
    pub database: Option<String>,
    /// Schema name.
    pub schema: Option<String>,
    /// Whether schema synchronization may touch this table.
    pub synchronize: Option<bool>,
    /// Default ordering.
    pub order_by: Option<Vec<OrderBy>>,
}

impl TableArgs {
    /// Register a regular table for the target.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            name: None,
            table_type: TableType::Regular,
            engine: None,
            database: None,
            schema: None,
            synchronize: None,
            order_by: None,
        }
    }

    /// Register a single-table-inheritance child.
    pub fn child(target: Target) -> Self {
        Self::new(target).with_type(TableType::EntityChild)
    }

    /// Set the table name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the registration type.
    pub fn with_type(mut self, table_type: TableType) -> Self {
        self.table_type = table_type;
        self
    }

    /// Set the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the storage engine.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Exclude the table from schema synchronization.
    pub fn without_synchronize(mut self) -> Self {
        self.synchronize = Some(false);
        self
    }

    /// Set the default ordering.
    pub fn with_order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

/// Column data types.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ColumnType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Floating point.
    Float,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// Bounded string.
    Varchar,
    /// Unbounded string.
    Text,
    /// Boolean.
    Boolean,
    /// UUID.
    Uuid,
    /// Timestamp.
    Timestamp,
    /// Calendar date.
    Date,
    /// JSON document.
    Json,
    /// Binary data.
    Blob,
}

impl ColumnType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::BigInt | ColumnType::Float | ColumnType::Decimal { .. }
        )
    }
}

/// Special column roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
pub enum ColumnMode {
    /// Plain column.
    #[default]
    Regular,
    /// Set on insert.
    CreateDate,
    /// Set on every update.
    UpdateDate,
    /// Soft-delete marker.
    DeleteDate,
    /// Optimistic-lock version counter.
    Version,
    /// Document-store object id.
    ObjectId,
    /// Column without a backing entity property.
    Virtual,
}

/// Column options as declared.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct ColumnOptions {
    /// User-given database column name.
    pub name: Option<String>,
    /// Declared type. `None` until inferred.
    pub column_type: Option<ColumnType>,
    /// Part of the primary key.
    pub primary: bool,
    /// Column accepts null.
    pub nullable: bool,
    /// Length for bounded types.
    pub length: Option<u32>,
    /// Default expression.
    pub default: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
}

/// A column registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ColumnArgs {
    /// Declaring target.
    pub target: Target,
    /// Entity property the column maps.
    pub property_name: String,
    /// Column role.
    pub mode: ColumnMode,
    /// Declared options.
    pub options: ColumnOptions,
}

impl ColumnArgs {
    /// Create a regular column.
    pub fn new(target: Target, property_name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            target,
            property_name: property_name.into(),
            mode: ColumnMode::Regular,
            options: ColumnOptions {
                column_type: Some(column_type),
                ..Default::default()
            },
        }
    }

    /// Create a column whose type is left for later inference.
    pub fn untyped(target: Target, property_name: impl Into<String>) -> Self {
        Self {
            target,
            property_name: property_name.into(),
            mode: ColumnMode::Regular,
            options: ColumnOptions::default(),
        }
    }

    /// Create a primary column.
    pub fn primary(target: Target, property_name: impl Into<String>, column_type: ColumnType) -> Self {
        let mut args = Self::new(target, property_name, column_type);
        args.options.primary = true;
        args
    }

    /// Mark the column nullable.
    pub fn nullable(mut self) -> Self {
        self.options.nullable = true;
        self
    }

    /// Set the database column name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Set the column role.
    pub fn with_mode(mut self, mode: ColumnMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.options.length = Some(length);
        self
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.options.default = Some(default.into());
        self
    }
}

/// Relation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum RelationType {
    /// One-to-one.
    OneToOne,
    /// One-to-many (inverse of many-to-one).
    OneToMany,
    /// Many-to-one (owns the foreign key).
    ManyToOne,
    /// Many-to-many (requires a junction table).
    ManyToMany,
}

/// Referential action for foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// Delete or update related rows.
    Cascade,
    /// Prevent the change if related rows exist.
    Restrict,
    /// Set foreign key to null.
    SetNull,
    /// Set foreign key to its default.
    SetDefault,
    /// Defer to the database.
    NoAction,
}

/// Which persistence operations cascade through a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
pub struct CascadeOptions {
    /// Cascade inserts.
    pub insert: bool,
    /// Cascade updates.
    pub update: bool,
    /// Cascade removals.
    pub remove: bool,
    /// Cascade soft removals.
    pub soft_remove: bool,
    /// Cascade recovers.
    pub recover: bool,
}

impl CascadeOptions {
    /// Cascade everything.
    pub fn all() -> Self {
        Self {
            insert: true,
            update: true,
            remove: true,
            soft_remove: true,
            recover: true,
        }
    }
}

/// Relation options as declared.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationOptions {
    /// Cascades.
    pub cascade: CascadeOptions,
    /// The relation may be absent.
    pub nullable: bool,
    /// Always loaded with its owner.
    pub eager: bool,
    /// The join columns are part of the primary key.
    pub primary: bool,
    /// Foreign key delete action.
    pub on_delete: Option<ReferentialAction>,
    /// Foreign key update action.
    pub on_update: Option<ReferentialAction>,
    /// Whether a foreign key constraint is created for the join columns.
    pub create_foreign_key_constraints: bool,
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            cascade: CascadeOptions::default(),
            nullable: true,
            eager: false,
            primary: false,
            on_delete: None,
            on_update: None,
            create_foreign_key_constraints: true,
        }
    }
}

/// A relation registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationArgs {
    /// Declaring target.
    pub target: Target,
    /// Entity property holding the related value.
    pub property_name: String,
    /// Relation kind.
    pub relation_type: RelationType,
    /// The related target.
    pub related: Target,
    /// Property on the related entity pointing back.
    pub inverse_side: Option<String>,
    /// Loaded on first access.
    pub is_lazy: bool,
    /// Declared options.
    pub options: RelationOptions,
}

impl RelationArgs {
    /// Create a relation.
    pub fn new(
        target: Target,
        property_name: impl Into<String>,
        relation_type: RelationType,
        related: Target,
    ) -> Self {
        Self {
            target,
            property_name: property_name.into(),
            relation_type,
            related,
            inverse_side: None,
            is_lazy: false,
            options: RelationOptions::default(),
        }
    }

    /// Create a many-to-one relation.
    pub fn many_to_one(target: Target, property_name: impl Into<String>, related: Target) -> Self {
        Self::new(target, property_name, RelationType::ManyToOne, related)
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        target: Target,
        property_name: impl Into<String>,
        related: Target,
        inverse_side: impl Into<String>,
    ) -> Self {
        Self::new(target, property_name, RelationType::OneToMany, related).with_inverse(inverse_side)
    }

    /// Create a one-to-one relation.
    pub fn one_to_one(target: Target, property_name: impl Into<String>, related: Target) -> Self {
        Self::new(target, property_name, RelationType::OneToOne, related)
    }

    /// Set the inverse side property.
    pub fn with_inverse(mut self, inverse_side: impl Into<String>) -> Self {
        self.inverse_side = Some(inverse_side.into());
        self
    }

    /// Mark the relation lazy.
    pub fn lazy(mut self) -> Self {
        self.is_lazy = true;
        self
    }

    /// Mark the relation eager.
    pub fn eager(mut self) -> Self {
        self.options.eager = true;
        self
    }

    /// Mark the relation required.
    pub fn required(mut self) -> Self {
        self.options.nullable = false;
        self
    }

    /// Skip foreign key constraints for the join columns.
    pub fn without_foreign_key_constraints(mut self) -> Self {
        self.options.create_foreign_key_constraints = false;
        self
    }

    /// Set the cascades.
    pub fn with_cascade(mut self, cascade: CascadeOptions) -> Self {
        self.options.cascade = cascade;
        self
    }

    /// Set the delete action.
    pub fn with_on_delete(mut self, action: ReferentialAction) -> Self {
        self.options.on_delete = Some(action);
        self
    }
}

/// A join column registration for an owning relation.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct JoinColumnArgs {
    /// Declaring target.
    pub target: Target,
    /// Relation property.
    pub property_name: String,
    /// Database column name.
    pub name: Option<String>,
    /// Referenced property on the related entity.
    pub referenced_column_name: Option<String>,
}

impl JoinColumnArgs {
    /// Create a join column registration with default naming.
    pub fn new(target: Target, property_name: impl Into<String>) -> Self {
        Self {
            target,
            property_name: property_name.into(),
            name: None,
            referenced_column_name: None,
        }
    }

    /// Set the database column name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the referenced property.
    pub fn referencing(mut self, referenced: impl Into<String>) -> Self {
        self.referenced_column_name = Some(referenced.into());
        self
    }
}

/// Exposes the ids of a relation as a plain property.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationIdArgs {
    /// Declaring target.
    pub target: Target,
    /// Property receiving the ids.
    pub property_name: String,
    /// Property path of the relation.
    pub relation_name: String,
}

/// Exposes the number of related rows as a plain property.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationCountArgs {
    /// Declaring target.
    pub target: Target,
    /// Property receiving the count.
    pub property_name: String,
    /// Property path of the relation.
    pub relation_name: String,
}

/// An index registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct IndexArgs {
    /// Declaring target.
    pub target: Target,
    /// User-given index name.
    pub name: Option<String>,
    /// Indexed property paths.
    pub columns: Vec<String>,
    /// Unique index.
    pub unique: bool,
    /// Spatial index.
    pub spatial: bool,
    /// Partial index condition.
    pub where_clause: Option<String>,
    /// Whether schema synchronization may touch this index.
    pub synchronize: bool,
}

impl IndexArgs {
    /// Create an index over the given property paths.
    pub fn new(target: Target, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            target,
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            spatial: false,
            where_clause: None,
            synchronize: true,
        }
    }

    /// Set the index name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the index unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the partial index condition.
    pub fn with_where(mut self, condition: impl Into<String>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }
}

/// A unique constraint registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct UniqueArgs {
    /// Declaring target.
    pub target: Target,
    /// User-given constraint name.
    pub name: Option<String>,
    /// Property paths that must be unique together.
    pub columns: Vec<String>,
}

impl UniqueArgs {
    /// Create a unique constraint.
    pub fn new(target: Target, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            target,
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the constraint name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A check constraint registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct CheckArgs {
    /// Declaring target.
    pub target: Target,
    /// User-given constraint name.
    pub name: Option<String>,
    /// Boolean expression.
    pub expression: String,
}

impl CheckArgs {
    /// Create a check constraint.
    pub fn new(target: Target, expression: impl Into<String>) -> Self {
        Self {
            target,
            name: None,
            expression: expression.into(),
        }
    }

    /// Set the constraint name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Column-name prefix policy for embedded columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
pub enum EmbeddedPrefix {
    /// Prefix with the embedding property name.
    #[default]
    Default,
    /// Prefix with a custom string.
    Custom(String),
    /// No prefix.
    Disabled,
}

/// An embedded-object registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EmbeddedArgs {
    /// Declaring target.
    pub target: Target,
    /// Property holding the embedded object.
    pub property_name: String,
    /// Class whose columns are embedded.
    pub embedded_type: String,
    /// Column-name prefix policy.
    pub prefix: EmbeddedPrefix,
    /// The property holds an array of embedded objects.
    pub is_array: bool,
}

impl EmbeddedArgs {
    /// Create an embedded registration.
    pub fn new(target: Target, property_name: impl Into<String>, embedded_type: impl Into<String>) -> Self {
        Self {
            target,
            property_name: property_name.into(),
            embedded_type: embedded_type.into(),
            prefix: EmbeddedPrefix::Default,
            is_array: false,
        }
    }

    /// Set the prefix policy.
    pub fn with_prefix(mut self, prefix: EmbeddedPrefix) -> Self {
        self.prefix = prefix;
        self
    }
}

/// Inheritance patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum InheritancePattern {
    /// All subtypes share one table.
    SingleTable,
}

/// Discriminator column options for single-table inheritance.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct DiscriminatorColumnOptions {
    /// Property and column name.
    pub name: Option<String>,
    /// Column type.
    pub column_type: Option<ColumnType>,
    /// Column length.
    pub length: Option<u32>,
}

/// An inheritance registration on a hierarchy root.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct InheritanceArgs {
    /// Declaring target.
    pub target: Target,
    /// Pattern.
    pub pattern: InheritancePattern,
    /// Discriminator column options.
    pub column: Option<DiscriminatorColumnOptions>,
}

impl InheritanceArgs {
    /// Single-table inheritance with the default discriminator column.
    pub fn single_table(target: Target) -> Self {
        Self {
            target,
            pattern: InheritancePattern::SingleTable,
            column: None,
        }
    }

    /// Set the discriminator column options.
    pub fn with_column(mut self, column: DiscriminatorColumnOptions) -> Self {
        self.column = Some(column);
        self
    }
}

/// A discriminator value for a single-table subtype.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct DiscriminatorArgs {
    /// Declaring target.
    pub target: Target,
    /// Value stored in the discriminator column.
    pub value: String,
}

/// Database-side value generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum GenerationStrategy {
    /// Auto-increment integer.
    Increment,
    /// Generated UUID.
    Uuid,
}

/// A generated-value registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct GeneratedArgs {
    /// Declaring target.
    pub target: Target,
    /// Generated property.
    pub property_name: String,
    /// Strategy.
    pub strategy: GenerationStrategy,
}

/// Entity lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ListenerEvent {
    /// After an entity is loaded.
    AfterLoad,
    /// Before insert.
    BeforeInsert,
    /// After insert.
    AfterInsert,
    /// Before update.
    BeforeUpdate,
    /// After update.
    AfterUpdate,
    /// Before removal.
    BeforeRemove,
    /// After removal.
    AfterRemove,
    /// Before soft removal.
    BeforeSoftRemove,
    /// After soft removal.
    AfterSoftRemove,
    /// Before recover.
    BeforeRecover,
    /// After recover.
    AfterRecover,
}

/// An entity listener registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EntityListenerArgs {
    /// Declaring target.
    pub target: Target,
    /// Method invoked.
    pub property_name: String,
    /// Event listened to.
    pub event: ListenerEvent,
}

/// Tree storage kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum TreeType {
    /// Parent pointer per row.
    AdjacencyList,
    /// Separate closure junction table.
    ClosureTable,
    /// Left/right bounds.
    NestedSet,
    /// Path string per row.
    MaterializedPath,
}

/// A tree registration.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct TreeArgs {
    /// Declaring target.
    pub target: Target,
    /// Tree kind.
    pub tree_type: TreeType,
}
