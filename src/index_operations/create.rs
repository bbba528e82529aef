//! Create a global secondary index.

use tracing::{debug, info, instrument};

use super::read::read_index;
use super::wait::wait_for_index_active;
use crate::attributes::{KeyAttribute, reconcile_attribute_definitions};
use crate::controller::ControllerSettings;
use crate::errors::{GsiError, Phase};
use crate::model::{IndexSpec, IndexState, ObservedIndex};
use crate::store::{CreateIndexAction, IndexUpdate, TableStore, UpdateTableRequest};
use crate::types::KeyRole;
use crate::validation::validate_spec;

/// State for `spec` once `observed` has been read back.
///
/// An autoscaler owns capacity, so none is recorded for autoscaled indexes.
fn settled_state(spec: &IndexSpec, observed: &ObservedIndex) -> IndexState {
    let mut state = IndexState::from_spec(spec);
    if spec.autoscaling_enabled {
        state.read_capacity = None;
        state.write_capacity = None;
    }
    state.apply_observed(observed);
    state
}

/// Create the index described by `spec` and block until it is ACTIVE.
///
/// With auto-import enabled, an existing index of the same name is adopted
/// as-is and no create call is made.
///
/// # Arguments
///
/// * `store` - Table store to talk to
/// * `settings` - Auto-import flag, timeouts and poll timing
/// * `spec` - Declared index
///
/// # Errors
///
/// Fails with `Validation` before any remote call if the spec is invalid.
/// A missing table is `NotFound`; a key type mismatch is `Conflict`.
#[instrument(skip(store, settings, spec), fields(table = %spec.table_name, index = %spec.name))]
pub fn create_index<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    spec: &IndexSpec,
) -> Result<IndexState, GsiError> {
    validate_spec(spec)?;
    let id = spec.identity();

    if settings.auto_import
        && let Some(observed) = read_index(store, &id)?
    {
        info!(id = %id, "index already exists, importing");
        return Ok(settled_state(spec, &observed));
    }

    let table = store.describe_table(&spec.table_name).map_err(|e| {
        if e.is_not_found() {
            GsiError::not_found(&spec.table_name, &spec.name)
        } else {
            GsiError::remote(&spec.table_name, &spec.name, Phase::Describe, e)
        }
    })?;

    let mut keys = vec![KeyAttribute {
        name: &spec.hash_key,
        scalar_type: spec.hash_key_type,
        role: KeyRole::Hash,
    }];
    if let Some((name, scalar_type)) = spec.range() {
        keys.push(KeyAttribute {
            name,
            scalar_type,
            role: KeyRole::Range,
        });
    }
    let reconciled = reconcile_attribute_definitions(&table.attribute_definitions, &keys)?;
    if !reconciled.staged.is_empty() {
        debug!(staged = ?reconciled.staged, "adding attribute definitions");
    }

    let request = UpdateTableRequest {
        table_name: spec.table_name.clone(),
        attribute_definitions: Some(reconciled.definitions),
        index_update: IndexUpdate::Create(CreateIndexAction {
            index_name: spec.name.clone(),
            key_schema: spec.key_schema(),
            projection: spec.projection(),
            throughput: spec.throughput(),
        }),
    };
    store
        .update_table(request)
        .map_err(|e| GsiError::remote(&spec.table_name, &spec.name, Phase::Create, e))?;

    wait_for_index_active(store, settings, &spec.table_name, &spec.name)?;

    let Some(observed) = read_index(store, &id)? else {
        return Err(GsiError::not_found(&spec.table_name, &spec.name));
    };
    info!(id = %id, "index created");
    Ok(settled_state(spec, &observed))
}
