//! Integration tests for runtime entity metadata operations.

use ormeta_core::proto::Value;
use ormeta_core::registry::{ColumnArgs, ColumnType, EmbeddedArgs, InheritanceArgs, RelationArgs, TableArgs};
use ormeta_core::{
    ConfigurationError, ConnectionOptions, DefaultNamingStrategy, DriverDescriptor,
    EntityMetadataBuilder, Error, MetadataGraph, MetadataRegistry, Target, ValueMapOptions,
};
use serde_json::json;

fn user() -> Target {
    Target::class("User")
}

fn build(registry: &MetadataRegistry) -> MetadataGraph {
    let options = ConnectionOptions::new();
    let driver = DriverDescriptor::sqlite();
    EntityMetadataBuilder::new(registry, &options, &DefaultNamingStrategy, &driver)
        .build(None)
        .unwrap()
}

fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn registry() -> MetadataRegistry {
    let membership = Target::class("Membership");
    MetadataRegistry::new()
        .with_class("User")
        .with_class("Address")
        .with_class("Membership")
        .with_class("Comment")
        .with_table(TableArgs::new(user()))
        .with_table(TableArgs::new(membership.clone()))
        .with_table(TableArgs::new(Target::class("Comment")))
        .with_column(ColumnArgs::primary(user(), "id", ColumnType::Varchar))
        .with_column(ColumnArgs::new(user(), "name", ColumnType::Varchar))
        .with_column(ColumnArgs::new(Target::class("Address"), "city", ColumnType::Varchar))
        .with_column(ColumnArgs::new(Target::class("Address"), "street", ColumnType::Varchar))
        .with_embedded(EmbeddedArgs::new(user(), "address", "Address"))
        .with_column(ColumnArgs::primary(membership.clone(), "userId", ColumnType::Varchar))
        .with_column(ColumnArgs::primary(membership, "groupId", ColumnType::Int))
        .with_column(ColumnArgs::primary(Target::class("Comment"), "id", ColumnType::Int))
        .with_relation(RelationArgs::many_to_one(Target::class("Comment"), "author", user()))
        .with_relation(RelationArgs::many_to_one(Target::class("Comment"), "reviewer", user()).lazy())
}

#[test]
fn test_ensure_entity_id_map() {
    let graph = build(&registry());
    let user = graph.get_metadata(&user()).unwrap();

    let id_map = user.ensure_entity_id_map(Value::from("u1")).unwrap();
    assert_eq!(id_map, value(json!({"id": "u1"})));

    let passthrough = value(json!({"id": "u2"}));
    assert_eq!(user.ensure_entity_id_map(passthrough.clone()).unwrap(), passthrough);

    let entity = value(json!({"id": "u1", "name": "x"}));
    assert_eq!(user.get_entity_id_map(&entity), Some(id_map));
    assert_eq!(user.get_entity_id_mixed_map(&entity), Some(Value::from("u1")));
}

#[test]
fn test_composite_key_id_maps() {
    let graph = build(&registry());
    let membership = graph.get_metadata(&Target::class("Membership")).unwrap();
    assert!(membership.has_multiple_primary_keys);

    let err = membership.ensure_entity_id_map(Value::from(1)).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::CannotCreateEntityIdMap { .. })
    ));

    let entity = value(json!({"userId": "u1", "groupId": 3, "role": "admin"}));
    let expected = value(json!({"userId": "u1", "groupId": 3}));
    assert_eq!(membership.get_entity_id_mixed_map(&entity), Some(expected));
    assert_eq!(membership.get_entity_id_map(&value(json!({"userId": "u1"}))), None);
}

#[test]
fn test_has_id() {
    let graph = build(&registry());
    let user = graph.get_metadata(&user()).unwrap();

    assert!(user.has_id(&value(json!({"id": "u1"}))));
    assert!(!user.has_id(&value(json!({"id": ""}))));
    assert!(!user.has_id(&value(json!({"id": null}))));
    assert!(!user.has_id(&value(json!({"name": "x"}))));
    assert!(!user.has_id(&Value::Null));

    assert!(user.has_all_primary_keys(&value(json!({"id": ""}))));
    assert!(!user.has_all_primary_keys(&value(json!({"id": null}))));
}

#[test]
fn test_compare_entities() {
    let graph = build(&registry());
    let user = graph.get_metadata(&user()).unwrap();

    let a = value(json!({"id": "u1", "name": "a"}));
    let b = value(json!({"id": "u1", "name": "b"}));
    let c = value(json!({"id": "u2"}));
    let anonymous = value(json!({"name": "a"}));

    assert!(user.compare_entities(&a, &a));
    assert!(user.compare_entities(&a, &b));
    assert!(!user.compare_entities(&a, &c));
    assert!(!user.compare_entities(&anonymous, &anonymous));
}

#[test]
fn test_embedded_value_map() {
    let graph = build(&registry());
    let user = graph.get_metadata(&user()).unwrap();
    let city = user.find_column_with_property_path("address.city").unwrap();

    let entity = value(json!({"id": "u1", "address": {"city": "Oslo", "street": "Main"}}));
    let map = user
        .get_value_map(&entity, &[city], ValueMapOptions::default())
        .unwrap();
    assert_eq!(map, value(json!({"address": {"city": "Oslo"}})));
    assert_eq!(graph.create_value_map(city, Value::from("Oslo")), map);

    let missing = value(json!({"id": "u1"}));
    assert_eq!(user.get_value_map(&missing, &[city], ValueMapOptions::default()), None);

    let null = value(json!({"address": {"city": null}}));
    assert_eq!(
        user.get_value_map(&null, &[city], ValueMapOptions::default()),
        Some(value(json!({"address": {"city": null}})))
    );
    assert_eq!(user.get_value_map(&null, &[city], ValueMapOptions { skip_nulls: true }), None);
}

#[test]
fn test_join_column_value_maps() {
    let graph = build(&registry());
    let comment = graph.get_metadata(&Target::class("Comment")).unwrap();
    let author = comment.find_column_with_property_path("author").unwrap();

    let with_object = value(json!({"id": 1, "author": {"id": "u1", "name": "x"}}));
    assert_eq!(
        graph.column_entity_value(author, &with_object),
        Some(Value::from("u1"))
    );
    assert_eq!(
        comment.get_value_map(&with_object, &[author], ValueMapOptions::default()),
        Some(value(json!({"author": {"id": "u1"}})))
    );

    let with_scalar = value(json!({"author": "u1"}));
    assert_eq!(
        comment.get_value_map(&with_scalar, &[author], ValueMapOptions::default()),
        Some(value(json!({"author": {"id": "u1"}})))
    );
}

#[test]
fn test_find_columns_with_property_path() {
    let graph = build(&registry());
    let comment = graph.get_metadata(&Target::class("Comment")).unwrap();

    let author = comment.find_columns_with_property_path("author");
    assert_eq!(author.len(), 1);
    assert_eq!(graph.column(author[0]).database_name, "authorId");
    assert_eq!(comment.find_column_with_database_name("authorId"), Some(author[0]));
    assert!(comment.find_columns_with_property_path("missing").is_empty());
}

#[test]
fn test_extract_relation_values() {
    let graph = build(&registry());
    let comment = graph.get_metadata(&Target::class("Comment")).unwrap();
    let user = graph.get_metadata(&user()).unwrap();

    let entity = value(json!({"id": 1, "author": {"id": "u1"}, "reviewer": null}));
    let values = comment.extract_relation_values_from_entity(&entity, &comment.relations);
    assert_eq!(values.len(), 1);

    let (relation, related, metadata) = &values[0];
    assert_eq!(relation.property_name, "author");
    assert_eq!(*related, &value(json!({"id": "u1"})));
    assert_eq!(metadata.key(), user.key());
}

#[test]
fn test_extract_relation_values_resolves_subtypes() {
    let content = Target::class("ContentModel");
    let registry = MetadataRegistry::new()
        .with_class("ContentModel")
        .with_subclass("Post", "ContentModel")
        .with_class("Feed")
        .with_table(TableArgs::new(content.clone()))
        .with_table(TableArgs::child(Target::class("Post")))
        .with_table(TableArgs::new(Target::class("Feed")))
        .with_inheritance(InheritanceArgs::single_table(content.clone()))
        .with_column(ColumnArgs::primary(content.clone(), "id", ColumnType::Int))
        .with_column(ColumnArgs::primary(Target::class("Feed"), "id", ColumnType::Int))
        .with_relation(RelationArgs::one_to_many(
            Target::class("Feed"),
            "items",
            content.clone(),
            "feed",
        ))
        .with_relation(RelationArgs::many_to_one(content.clone(), "feed", Target::class("Feed")));
    let graph = build(&registry);
    let feed = graph.get_metadata(&Target::class("Feed")).unwrap();
    let post = graph.get_metadata(&Target::class("Post")).unwrap();
    let content = graph.get_metadata(&content).unwrap();

    let entity = value(json!({
        "id": 1,
        "items": [{"id": 1, "type": "Post"}, null, {"id": 2, "type": "ContentModel"}]
    }));
    let values = feed.extract_relation_values_from_entity(&entity, &feed.relations);
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].2.key(), post.key());
    assert_eq!(values[1].2.key(), content.key());
}

#[test]
fn test_create_instances() {
    let graph = build(&registry());
    let comment = graph.get_metadata(&Target::class("Comment")).unwrap();

    let instance = comment.create(None);
    assert_eq!(instance.class_name(), Some("Comment"));
    assert!(instance.is_lazy("reviewer"));
    assert!(!instance.is_lazy("author"));
    assert_eq!(comment.lazy_relations.len(), 1);

    let registry = MetadataRegistry::new().with_table(TableArgs::new(Target::table("audit_log")));
    let graph = build(&registry);
    let audit = graph.get_metadata(&Target::table("audit_log")).unwrap();
    assert!(audit.create(None).is_plain());
}
