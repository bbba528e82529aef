//! Explicit handle that drives index lifecycle operations.
//!
//! The controller owns its [`TableStore`] and settings; nothing is shared
//! through globals. Every call runs to completion on the calling thread.

use std::time::Duration;

use crate::client::{DynamoTableStore, ProviderConfig};
use crate::errors::GsiError;
use crate::index_operations::{
    create_index, delete_index, import_index, read_index, refresh_index, update_index,
};
use crate::model::{IndexIdentity, IndexSpec, IndexState, ObservedIndex};
use crate::poller::StateChangeConf;
use crate::store::TableStore;

/// How long each kind of transition may take before the wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            update: Duration::from_secs(20 * 60),
            delete: Duration::from_secs(10 * 60),
        }
    }
}

/// Inter-poll timing shared by every wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub delay: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub not_found_checks: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            min_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(10),
            not_found_checks: 20,
        }
    }
}

impl PollSettings {
    /// Poll with no sleeping at all. Meant for in-memory stores.
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
            min_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            not_found_checks: 20,
        }
    }

    pub fn state_change<L>(
        &self,
        pending: Vec<L>,
        target: Vec<L>,
        timeout: Duration,
    ) -> StateChangeConf<L>
    where
        L: PartialEq + Clone + std::fmt::Debug,
    {
        let mut conf = StateChangeConf::new(pending, target, timeout);
        conf.delay = self.delay;
        conf.min_poll_interval = self.min_interval;
        conf.max_poll_interval = self.max_interval;
        conf.not_found_checks = self.not_found_checks;
        conf
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerSettings {
    pub auto_import: bool,
    pub timeouts: Timeouts,
    pub poll: PollSettings,
}

impl From<&ProviderConfig> for ControllerSettings {
    fn from(config: &ProviderConfig) -> Self {
        let defaults = Timeouts::default();
        let poll_defaults = PollSettings::default();
        Self {
            auto_import: config.auto_import,
            timeouts: Timeouts {
                create: config
                    .create_timeout
                    .map_or(defaults.create, Duration::from_secs),
                update: config
                    .update_timeout
                    .map_or(defaults.update, Duration::from_secs),
                delete: config
                    .delete_timeout
                    .map_or(defaults.delete, Duration::from_secs),
            },
            poll: PollSettings {
                min_interval: config
                    .poll_min_interval_ms
                    .map_or(poll_defaults.min_interval, Duration::from_millis),
                max_interval: config
                    .poll_max_interval_ms
                    .map_or(poll_defaults.max_interval, Duration::from_millis),
                ..poll_defaults
            },
        }
    }
}

/// Lifecycle entry point for one provider configuration.
pub struct IndexController<S> {
    store: S,
    settings: ControllerSettings,
}

impl IndexController<DynamoTableStore> {
    /// Connect to DynamoDB using `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Provider configuration (region, credentials, endpoint, timeouts)
    ///
    /// # Returns
    ///
    /// A controller backed by a [`DynamoTableStore`].
    ///
    /// # Errors
    ///
    /// Returns `GsiError::Client` if the runtime or SDK client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, GsiError> {
        let store = DynamoTableStore::connect(config)?;
        Ok(Self::new(store, ControllerSettings::from(config)))
    }
}

impl<S: TableStore> IndexController<S> {
    pub fn new(store: S, settings: ControllerSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Create the index (or adopt it when auto-import is on) and wait until it is active.
    ///
    /// # Arguments
    ///
    /// * `spec` - Declared index
    ///
    /// # Returns
    ///
    /// The persisted state, populated from what DynamoDB reports after creation.
    ///
    /// # Errors
    ///
    /// - `Validation` if the spec breaks a billing or structural rule
    /// - `Conflict` if a key attribute is already defined with another type
    /// - `NotFound` if the table does not exist
    /// - `Timeout` if the index is not ACTIVE within the create timeout
    /// - `Remote` for any other DynamoDB failure
    pub fn create(&self, spec: &IndexSpec) -> Result<IndexState, GsiError> {
        create_index(&self.store, &self.settings, spec)
    }

    /// Observe the index.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the table or index is gone.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if DescribeTable fails for any other reason, or
    /// `MissingAttributeDefinition` if a key attribute has no table definition.
    pub fn read(&self, id: &IndexIdentity) -> Result<Option<ObservedIndex>, GsiError> {
        read_index(&self.store, id)
    }

    /// Re-read persisted state. `Ok(None)` means the caller should drop it.
    pub fn refresh(&self, state: &IndexState) -> Result<Option<IndexState>, GsiError> {
        refresh_index(&self.store, state)
    }

    /// Adopt an existing index by identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the table or index does not exist.
    pub fn import(&self, id: &IndexIdentity) -> Result<IndexState, GsiError> {
        import_index(&self.store, id)
    }

    /// Apply capacity changes from `desired` to the index described by `prior`.
    ///
    /// # Arguments
    ///
    /// * `prior` - State persisted by the last create, update or refresh
    /// * `desired` - Declared index
    ///
    /// # Returns
    ///
    /// The new persisted state, re-read after any throughput change settles.
    ///
    /// # Errors
    ///
    /// - `Validation` if the spec is invalid or a create-only field changed
    /// - `NotFound` if the index has disappeared
    /// - `Timeout` if the throughput change does not settle within the update timeout
    pub fn update(&self, prior: &IndexState, desired: &IndexSpec) -> Result<IndexState, GsiError> {
        update_index(&self.store, &self.settings, prior, desired)
    }

    /// Delete the index and wait until it is gone. Already-absent counts as success.
    ///
    /// # Errors
    ///
    /// Returns `Remote` if DynamoDB rejects the delete, or `Timeout` if the
    /// index is still present after the delete timeout.
    pub fn delete(&self, id: &IndexIdentity) -> Result<(), GsiError> {
        delete_index(&self.store, &self.settings, id)
    }
}
