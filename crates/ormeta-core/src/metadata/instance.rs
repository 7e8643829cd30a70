//! Entity instances with lazy relation slots.

use super::relation::RelationMetadata;
use crate::error::{Error, Result};
use ormeta_proto::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Loads the value of a lazy relation on demand.
pub trait RelationLoader: Debug + Send + Sync {
    /// Load the related value of `relation` for `owner`.
    fn load(&self, relation: &RelationMetadata, owner: &Value) -> Result<Value>;
}

#[derive(Debug, Clone)]
struct LazySlot {
    relation: RelationMetadata,
    loaded: bool,
}

/// A blank entity created from metadata.
///
/// Values are kept as a [`Value::Object`]. Lazy relations start unloaded and
/// are filled through the [`RelationLoader`] on first [`load`](Self::load), or
/// by assigning them directly.
#[derive(Debug, Clone)]
pub struct EntityInstance {
    entity_name: String,
    class_name: Option<String>,
    values: Value,
    lazy: BTreeMap<String, LazySlot>,
    loader: Option<Arc<dyn RelationLoader>>,
}

impl EntityInstance {
    pub(crate) fn new(
        entity_name: String,
        class_name: Option<String>,
        lazy_relations: Vec<RelationMetadata>,
        loader: Option<Arc<dyn RelationLoader>>,
    ) -> Self {
        let lazy = lazy_relations
            .into_iter()
            .map(|relation| {
                (
                    relation.property_path.clone(),
                    LazySlot {
                        relation,
                        loaded: false,
                    },
                )
            })
            .collect();
        Self {
            entity_name,
            class_name,
            values: Value::object(),
            lazy,
            loader,
        }
    }

    /// Class the instance belongs to. `None` for plain records.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Check if this is a plain record without a class.
    pub fn is_plain(&self) -> bool {
        self.class_name.is_none()
    }

    /// Current values.
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Consume the instance, returning its values.
    pub fn into_values(self) -> Value {
        self.values
    }

    /// Value at a dotted property path. Unloaded lazy relations are undefined.
    pub fn get(&self, property_path: &str) -> Option<&Value> {
        self.values.get_dotted(property_path)
    }

    /// Assign a value at a dotted property path.
    ///
    /// Assigning a lazy relation marks it loaded.
    pub fn set(&mut self, property_path: &str, value: Value) -> Result<()> {
        let path: Vec<&str> = property_path.split('.').collect();
        self.values.set_path(&path, value)?;
        if let Some(slot) = self.lazy.get_mut(property_path) {
            slot.loaded = true;
        }
        Ok(())
    }

    /// Check if the property is a lazy relation.
    pub fn is_lazy(&self, property_path: &str) -> bool {
        self.lazy.contains_key(property_path)
    }

    /// Check if a lazy relation has a value. Non-lazy properties count as loaded.
    pub fn is_loaded(&self, property_path: &str) -> bool {
        self.lazy
            .get(property_path)
            .map_or(true, |slot| slot.loaded)
    }

    /// Value at a property path, loading it first when it is an unloaded lazy
    /// relation.
    pub fn load(&mut self, property_path: &str) -> Result<Option<&Value>> {
        let relation = match self.lazy.get(property_path) {
            Some(slot) if !slot.loaded => slot.relation.clone(),
            _ => return Ok(self.get(property_path)),
        };
        let loader = self
            .loader
            .clone()
            .ok_or_else(|| Error::MissingRelationLoader {
                entity: self.entity_name.clone(),
                property: property_path.to_string(),
            })?;

        let value = loader.load(&relation, &self.values)?;
        self.set(property_path, value)?;
        Ok(self.get(property_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::graph::EntityKey;
    use crate::registry::{RelationArgs, Target};
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct CountingLoader {
        calls: Mutex<usize>,
    }

    impl RelationLoader for CountingLoader {
        fn load(&self, relation: &RelationMetadata, owner: &Value) -> Result<Value> {
            *self.calls.lock() += 1;
            let owner_id = owner.get("id").cloned().unwrap_or_default();
            let mut loaded = Value::object();
            loaded.set_path(&["owner"], owner_id)?;
            loaded.set_path(&["relation"], Value::from(relation.property_name.as_str()))?;
            Ok(loaded)
        }
    }

    fn lazy_profile() -> RelationMetadata {
        let args = RelationArgs::one_to_one(Target::class("User"), "profile", Target::class("Profile")).lazy();
        RelationMetadata::from_args(EntityKey(0), None, &args)
    }

    #[test]
    fn test_lazy_relation_loads_once() {
        let loader = Arc::new(CountingLoader::default());
        let mut instance = EntityInstance::new(
            "User".into(),
            Some("User".into()),
            vec![lazy_profile()],
            Some(loader.clone() as Arc<dyn RelationLoader>),
        );
        instance.set("id", Value::from(7)).unwrap();

        assert!(instance.is_lazy("profile"));
        assert!(!instance.is_loaded("profile"));
        assert!(instance.get("profile").is_none());

        let loaded = instance.load("profile").unwrap().cloned().unwrap();
        assert_eq!(loaded.get("owner"), Some(&Value::Int32(7)));
        assert!(instance.is_loaded("profile"));

        instance.load("profile").unwrap();
        assert_eq!(*loader.calls.lock(), 1);
    }

    #[test]
    fn test_lazy_relation_without_loader() {
        let mut instance = EntityInstance::new("User".into(), None, vec![lazy_profile()], None);

        assert!(instance.is_plain());
        let err = instance.load("profile").unwrap_err();
        assert!(matches!(err, Error::MissingRelationLoader { .. }));
    }

    #[test]
    fn test_assignment_marks_lazy_relation_loaded() {
        let mut instance = EntityInstance::new("User".into(), None, vec![lazy_profile()], None);
        instance.set("profile", Value::object()).unwrap();

        assert!(instance.is_loaded("profile"));
        assert_eq!(instance.load("profile").unwrap(), Some(&Value::object()));
    }
}
