//! Lifecycle operations for a global secondary index.
//!
//! This module provides:
//! - `create` - Create (or auto-import) an index and wait for it to become active
//! - `read` - Observe an index, refresh persisted state, import by identifier
//! - `update` - Apply capacity changes; everything else is create-only
//! - `delete` - Delete an index and wait for it to disappear
//! - `wait` - Status polling for the transitions above

mod create;
mod delete;
mod read;
mod update;
mod wait;

// Re-export public functions
pub use create::create_index;
pub use delete::delete_index;
pub use read::{import_index, observe_index, read_index, refresh_index};
pub use update::{CapacityChange, capacity_changes, replacement_fields, update_index};
