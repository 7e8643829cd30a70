//! Integration tests for the connection lifecycle.

use ormeta_core::registry::{ColumnArgs, ColumnType, RelationArgs, TableArgs};
use ormeta_core::{
    ConfigurationError, Connection, ConnectionOptions, DefaultNamingStrategy, Driver,
    DriverDescriptor, Error, MetadataRegistry, NamingStrategy, OfflineDriver, Target,
    ValidationError,
};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Records connect and disconnect calls.
#[derive(Debug)]
struct RecordingDriver {
    descriptor: DriverDescriptor,
    events: Mutex<Vec<&'static str>>,
}

impl RecordingDriver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            descriptor: DriverDescriptor::postgres(),
            events: Mutex::new(Vec::new()),
        })
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }
}

impl Driver for RecordingDriver {
    fn descriptor(&self) -> &DriverDescriptor {
        &self.descriptor
    }

    fn connect(&self) -> Result<(), Error> {
        self.events.lock().push("connect");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), Error> {
        self.events.lock().push("disconnect");
        Ok(())
    }
}

/// Default naming that stalls the next table name lookup once armed.
#[derive(Debug, Default)]
struct StallingNaming {
    armed: AtomicBool,
    stalled: AtomicBool,
}

impl NamingStrategy for StallingNaming {
    fn table_name(&self, target_name: &str, given_name: Option<&str>) -> String {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.stalled.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
        }
        DefaultNamingStrategy.table_name(target_name, given_name)
    }

    fn column_name(&self, property_name: &str, given_name: Option<&str>, prefixes: &[String]) -> String {
        DefaultNamingStrategy.column_name(property_name, given_name, prefixes)
    }

    fn join_column_name(&self, relation_name: &str, referenced_column_name: &str) -> String {
        DefaultNamingStrategy.join_column_name(relation_name, referenced_column_name)
    }

    fn index_name(&self, table_name: &str, column_names: &[String], where_clause: Option<&str>) -> String {
        DefaultNamingStrategy.index_name(table_name, column_names, where_clause)
    }

    fn unique_constraint_name(&self, table_name: &str, column_names: &[String]) -> String {
        DefaultNamingStrategy.unique_constraint_name(table_name, column_names)
    }

    fn check_constraint_name(&self, table_name: &str, expression: &str) -> String {
        DefaultNamingStrategy.check_constraint_name(table_name, expression)
    }

    fn foreign_key_name(&self, table_name: &str, column_names: &[String]) -> String {
        DefaultNamingStrategy.foreign_key_name(table_name, column_names)
    }

    fn relation_constraint_name(&self, table_name: &str, column_names: &[String]) -> String {
        DefaultNamingStrategy.relation_constraint_name(table_name, column_names)
    }
}

fn registry() -> Arc<MetadataRegistry> {
    Arc::new(
        MetadataRegistry::new()
            .with_class("User")
            .with_class("Post")
            .with_table(TableArgs::new(Target::class("User")).named("users"))
            .with_table(TableArgs::new(Target::class("Post")))
            .with_column(ColumnArgs::primary(Target::class("User"), "id", ColumnType::Int))
            .with_column(ColumnArgs::primary(Target::class("Post"), "id", ColumnType::Int)),
    )
}

#[test]
fn test_connect_publishes_metadata() {
    let driver = RecordingDriver::new();
    let connection = Connection::new(ConnectionOptions::new(), driver.clone(), registry());

    assert!(!connection.is_connected());
    assert!(connection.find_metadata(&Target::class("User")).is_none());

    connection.connect().unwrap();
    assert!(connection.is_connected());
    assert!(connection.has_metadata(&Target::table("users")));

    let user = connection.get_metadata(&Target::class("User")).unwrap();
    assert_eq!(user.entity().table_name, "users");
    assert_eq!(connection.metadata().unwrap().len(), 2);

    let err = connection.connect().unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::AlreadyConnected)
    ));

    connection.close().unwrap();
    assert!(!connection.is_connected());
    assert_eq!(driver.events(), vec!["connect", "disconnect"]);

    // The handle outlives the connection's snapshot.
    assert_eq!(user.entity().name, "User");
}

#[test]
fn test_failed_build_releases_driver() {
    let registry = MetadataRegistry::new()
        .with_table(TableArgs::new(Target::class("Post")))
        .with_relation(RelationArgs::many_to_one(
            Target::class("Post"),
            "author",
            Target::class("Ghost"),
        ));
    let driver = RecordingDriver::new();
    let connection = Connection::new(ConnectionOptions::new(), driver.clone(), Arc::new(registry));

    let err = connection.connect().unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingRelationTarget { .. })
    ));
    assert!(!connection.is_connected());
    assert_eq!(driver.events(), vec!["connect", "disconnect"]);
}

#[test]
fn test_close_without_connect() {
    let connection = Connection::new(
        ConnectionOptions::new(),
        Arc::new(OfflineDriver::default()),
        registry(),
    );

    let err = connection.close().unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::NotConnected)
    ));
    assert!(connection.metadata().is_err());
}

#[test]
fn test_rebuild_keeps_old_snapshot() {
    let connection = Connection::new(
        ConnectionOptions::new(),
        Arc::new(OfflineDriver::default()),
        registry(),
    );
    connection.connect().unwrap();

    let before = connection.metadata().unwrap();
    connection.rebuild().unwrap();
    let after = connection.metadata().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), after.len());
}

#[test]
fn test_rebuild_after_close() {
    let connection = Connection::new(
        ConnectionOptions::new(),
        Arc::new(OfflineDriver::default()),
        registry(),
    );
    connection.connect().unwrap();
    connection.close().unwrap();

    let err = connection.rebuild().unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::NotConnected)
    ));
    assert!(!connection.is_connected());
}

#[test]
fn test_close_during_rebuild_stays_closed() {
    let driver = RecordingDriver::new();
    let naming = Arc::new(StallingNaming::default());
    let connection = Connection::new(ConnectionOptions::new(), driver.clone(), registry())
        .with_naming_strategy(naming.clone());
    connection.connect().unwrap();

    naming.armed.store(true, Ordering::SeqCst);
    thread::scope(|scope| {
        let rebuild = scope.spawn(|| connection.rebuild());
        while !naming.stalled.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        connection.close().unwrap();
        rebuild.join().unwrap().unwrap();
    });

    assert!(!connection.is_connected());
    assert!(connection.metadata().is_err());
    assert_eq!(driver.events(), vec!["connect", "disconnect"]);
}

#[test]
fn test_options_from_file_restrict_entities() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"name": "blog", "entities": ["Post"], "entityPrefix": "blog_"}}"#
    )
    .unwrap();

    let options = ConnectionOptions::from_json_file(file.path()).unwrap();
    let connection = Connection::new(options, Arc::new(OfflineDriver::default()), registry());
    connection.connect().unwrap();

    assert_eq!(connection.name(), "blog");
    assert!(!connection.has_metadata(&Target::class("User")));
    let post = connection.get_metadata(&Target::class("Post")).unwrap();
    assert_eq!(post.entity().table_name, "blog_post");

    let err = connection.get_metadata(&Target::class("User")).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}
