//! Lifecycle management for DynamoDB global secondary indexes.
//!
//! An [`IndexController`] creates, reads, updates, deletes and imports a
//! single GSI on an existing table, blocking until DynamoDB reports the
//! transition complete. Remote access goes through the [`TableStore`] trait;
//! [`DynamoTableStore`] is the AWS SDK implementation.
//!
//! ```no_run
//! use dynamo_gsi::{IndexController, IndexIdentity, ProviderConfig};
//!
//! # fn main() -> Result<(), dynamo_gsi::GsiError> {
//! let config = ProviderConfig::from_env();
//! let controller = IndexController::from_config(&config)?;
//! let id: IndexIdentity = "orders:by_customer".parse()?;
//! if let Some(index) = controller.read(&id)? {
//!     println!("{:?}", index.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod client;
pub mod controller;
pub mod conversions;
pub mod errors;
pub mod index_operations;
pub mod logging;
pub mod model;
pub mod poller;
pub mod store;
pub mod types;
pub mod validation;

pub use client::{DynamoTableStore, ProviderConfig};
pub use controller::{ControllerSettings, IndexController, PollSettings, Timeouts};
pub use errors::{GsiError, Phase, StoreError, StoreErrorKind};
pub use model::{IndexIdentity, IndexSpec, IndexState, ObservedIndex};
pub use store::TableStore;
pub use types::{BillingMode, IndexStatus, KeyRole, ProjectionType, ScalarType};
