//! Connection bootstrap and metadata publication.
//!
//! A [`Connection`] owns the driver, naming strategy and registry of one data
//! source. Opening it runs the metadata builder to completion and publishes
//! the result as an immutable snapshot that readers share without locking.

use crate::builder::EntityMetadataBuilder;
use crate::driver::Driver;
use crate::error::{ConfigurationError, Result};
use crate::metadata::{EntityKey, EntityRef, MetadataGraph};
use crate::naming::{DefaultNamingStrategy, NamingStrategy};
use crate::options::ConnectionOptions;
use crate::registry::{MetadataRegistry, Target};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One entity inside a published metadata snapshot.
///
/// Keeps the snapshot alive for as long as the handle is held.
#[derive(Debug, Clone)]
pub struct MetadataHandle {
    graph: Arc<MetadataGraph>,
    key: EntityKey,
}

impl MetadataHandle {
    /// View of the entity.
    pub fn entity(&self) -> EntityRef<'_> {
        self.graph.entity(self.key)
    }

    /// Snapshot the entity belongs to.
    pub fn graph(&self) -> &Arc<MetadataGraph> {
        &self.graph
    }

    /// Entity key.
    pub fn key(&self) -> EntityKey {
        self.key
    }
}

/// A data source whose entity metadata is built on connect.
#[derive(Debug)]
pub struct Connection {
    options: ConnectionOptions,
    driver: Arc<dyn Driver>,
    naming: Arc<dyn NamingStrategy>,
    registry: Arc<MetadataRegistry>,
    metadata: RwLock<Option<Arc<MetadataGraph>>>,
}

impl Connection {
    /// Create a closed connection using the default naming strategy.
    pub fn new(options: ConnectionOptions, driver: Arc<dyn Driver>, registry: Arc<MetadataRegistry>) -> Self {
        Self {
            options,
            driver,
            naming: Arc::new(DefaultNamingStrategy),
            registry,
            metadata: RwLock::new(None),
        }
    }

    /// Replace the naming strategy.
    pub fn with_naming_strategy(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    /// Connection options.
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Connection name.
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// Check if the connection is open.
    pub fn is_connected(&self) -> bool {
        self.metadata.read().is_some()
    }

    /// Open the driver and build entity metadata.
    ///
    /// On a build failure the driver is released before the error is
    /// returned and the connection stays closed.
    #[instrument(skip(self), fields(connection = %self.options.name))]
    pub fn connect(&self) -> Result<()> {
        let mut slot = self.metadata.write();
        if slot.is_some() {
            return Err(ConfigurationError::AlreadyConnected.into());
        }

        self.driver.connect()?;
        match self.build_metadata() {
            Ok(graph) => {
                info!(entities = graph.len(), "Published entity metadata");
                *slot = Some(Arc::new(graph));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Metadata build failed, releasing driver");
                if let Err(release) = self.driver.disconnect() {
                    warn!(error = %release, "Driver release failed");
                }
                Err(e)
            }
        }
    }

    /// Drop the published metadata and close the driver.
    pub fn close(&self) -> Result<()> {
        let mut slot = self.metadata.write();
        if slot.take().is_none() {
            return Err(ConfigurationError::NotConnected.into());
        }
        self.driver.disconnect()?;
        info!(connection = %self.options.name, "Connection closed");
        Ok(())
    }

    /// Build a fresh snapshot and publish it in place of the current one.
    ///
    /// Holders of the previous snapshot keep it unchanged. Readers are not
    /// blocked while the new snapshot is built; `close` waits for it.
    pub fn rebuild(&self) -> Result<()> {
        let slot = self.metadata.upgradable_read();
        if slot.is_none() {
            return Err(ConfigurationError::NotConnected.into());
        }
        let graph = Arc::new(self.build_metadata()?);
        info!(connection = %self.options.name, entities = graph.len(), "Rebuilt entity metadata");
        *RwLockUpgradableReadGuard::upgrade(slot) = Some(graph);
        Ok(())
    }

    /// Current metadata snapshot.
    pub fn metadata(&self) -> Result<Arc<MetadataGraph>> {
        self.metadata
            .read()
            .clone()
            .ok_or_else(|| ConfigurationError::NotConnected.into())
    }

    /// Check if metadata exists for a target.
    pub fn has_metadata(&self, target: &Target) -> bool {
        self.metadata
            .read()
            .as_ref()
            .is_some_and(|graph| graph.has_metadata(target))
    }

    /// Metadata for a target. `None` when closed or not found.
    pub fn find_metadata(&self, target: &Target) -> Option<MetadataHandle> {
        let graph = self.metadata.read().clone()?;
        let key = graph.find_metadata(target)?.key();
        Some(MetadataHandle { graph, key })
    }

    /// Metadata for a target, failing when it is not found.
    pub fn get_metadata(&self, target: &Target) -> Result<MetadataHandle> {
        let graph = self.metadata()?;
        let key = graph.get_metadata(target)?.key();
        Ok(MetadataHandle { graph, key })
    }

    fn build_metadata(&self) -> Result<MetadataGraph> {
        let targets: Option<Vec<Target>> = self.options.entities.as_ref().map(|names| {
            names
                .iter()
                .flat_map(|name| [Target::class(name.as_str()), Target::table(name.as_str())])
                .collect()
        });
        EntityMetadataBuilder::new(
            &self.registry,
            &self.options,
            self.naming.as_ref(),
            self.driver.descriptor(),
        )
        .build(targets.as_deref())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.metadata.get_mut().take().is_some() {
            if let Err(e) = self.driver.disconnect() {
                warn!(connection = %self.options.name, error = %e, "Driver release failed on drop");
            }
        }
    }
}

