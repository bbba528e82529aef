//! Update an existing index.
//!
//! Only throughput is mutable in place. Every other field of the index is
//! create-only and must be changed by replacing the index.

use tracing::{debug, info, instrument};

use super::read::read_index;
use super::wait::wait_for_index_updated;
use crate::controller::ControllerSettings;
use crate::errors::{GsiError, Phase};
use crate::model::{IndexSpec, IndexState};
use crate::store::{IndexUpdate, TableStore, Throughput, UpdateIndexAction, UpdateTableRequest};
use crate::types::BillingMode;
use crate::validation::validate_spec;

/// Fields of `desired` that differ from `prior` and cannot be changed in place.
pub fn replacement_fields(prior: &IndexState, desired: &IndexSpec) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if prior.table_name != desired.table_name {
        fields.push("table_name");
    }
    if prior.name != desired.name {
        fields.push("name");
    }
    if prior.hash_key != desired.hash_key {
        fields.push("hash_key");
    }
    if prior.hash_key_type != desired.hash_key_type {
        fields.push("hash_key_type");
    }
    if prior.range_key != desired.range_key {
        fields.push("range_key");
    }
    if prior.range_key_type != desired.range_key_type {
        fields.push("range_key_type");
    }
    if prior.projection_type != Some(desired.projection_type) {
        fields.push("projection_type");
    }
    if prior.non_key_attributes != desired.non_key_attributes {
        fields.push("non_key_attributes");
    }
    fields
}

/// Capacity fields that need to be sent. `None` means unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityChange {
    pub read_capacity: Option<i64>,
    pub write_capacity: Option<i64>,
}

impl CapacityChange {
    pub fn is_empty(&self) -> bool {
        self.read_capacity.is_none() && self.write_capacity.is_none()
    }
}

/// Diff declared capacity against the last recorded capacity.
///
/// Nothing is reported for on-demand indexes or while autoscaling owns the
/// capacity.
pub fn capacity_changes(prior: &IndexState, desired: &IndexSpec) -> CapacityChange {
    if desired.autoscaling_enabled || desired.billing_mode != BillingMode::Provisioned {
        return CapacityChange::default();
    }
    CapacityChange {
        read_capacity: desired
            .read_capacity
            .filter(|_| desired.read_capacity != prior.read_capacity),
        write_capacity: desired
            .write_capacity
            .filter(|_| desired.write_capacity != prior.write_capacity),
    }
}

/// Apply `desired` to the index recorded in `prior`.
///
/// An UpdateTable call is issued only when provisioned capacity changed.
///
/// # Returns
///
/// The new state. Capacity is `None` for on-demand or autoscaled indexes.
///
/// # Errors
///
/// Returns `Validation` when a create-only field differs from `prior`.
#[instrument(skip(store, settings, prior, desired), fields(table = %prior.table_name, index = %prior.name))]
pub fn update_index<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    prior: &IndexState,
    desired: &IndexSpec,
) -> Result<IndexState, GsiError> {
    validate_spec(desired)?;

    let replaced = replacement_fields(prior, desired);
    if !replaced.is_empty() {
        return Err(GsiError::validation(format!(
            "cannot change {} of an existing index; the index must be replaced",
            replaced.join(", ")
        )));
    }

    let table_name = &prior.table_name;
    let index_name = &prior.name;
    let change = capacity_changes(prior, desired);

    if change.is_empty() {
        debug!("no capacity change, skipping UpdateTable");
    } else {
        // DynamoDB wants both units even when only one of them moved.
        let throughput = Throughput {
            read_capacity_units: desired.read_capacity.unwrap_or(0),
            write_capacity_units: desired.write_capacity.unwrap_or(0),
        };
        let request = UpdateTableRequest {
            table_name: table_name.clone(),
            attribute_definitions: None,
            index_update: IndexUpdate::Update(UpdateIndexAction {
                index_name: index_name.clone(),
                throughput,
            }),
        };
        store.update_table(request).map_err(|e| {
            if e.is_not_found() {
                GsiError::not_found(table_name, index_name)
            } else {
                GsiError::remote(table_name, index_name, Phase::Update, e)
            }
        })?;
        info!(?change, "index throughput updated");

        wait_for_index_updated(store, settings, table_name, index_name)?;
    }

    let mut state = prior.clone();
    state.billing_mode = desired.billing_mode;
    state.autoscaling_enabled = desired.autoscaling_enabled;
    if desired.autoscaling_enabled || desired.billing_mode == BillingMode::PayPerRequest {
        state.read_capacity = None;
        state.write_capacity = None;
    } else {
        state.read_capacity = desired.read_capacity;
        state.write_capacity = desired.write_capacity;
    }

    let Some(observed) = read_index(store, &prior.id)? else {
        return Err(GsiError::not_found(table_name, index_name));
    };
    state.apply_observed(&observed);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProjectionType, ScalarType};
    use std::collections::BTreeSet;

    fn spec() -> IndexSpec {
        IndexSpec {
            table_name: "orders".into(),
            name: "by_customer".into(),
            hash_key: "customer_id".into(),
            hash_key_type: ScalarType::String,
            range_key: None,
            range_key_type: None,
            projection_type: ProjectionType::All,
            non_key_attributes: BTreeSet::new(),
            billing_mode: BillingMode::Provisioned,
            read_capacity: Some(5),
            write_capacity: Some(5),
            autoscaling_enabled: false,
        }
    }

    #[test]
    fn unchanged_spec_needs_nothing() {
        let prior = IndexState::from_spec(&spec());
        assert!(replacement_fields(&prior, &spec()).is_empty());
        assert!(capacity_changes(&prior, &spec()).is_empty());
    }

    #[test]
    fn only_changed_capacity_is_reported() {
        let prior = IndexState::from_spec(&spec());
        let mut desired = spec();
        desired.write_capacity = Some(10);

        assert_eq!(
            capacity_changes(&prior, &desired),
            CapacityChange {
                read_capacity: None,
                write_capacity: Some(10),
            }
        );
    }

    #[test]
    fn autoscaling_suppresses_capacity_drift() {
        let prior = IndexState::from_spec(&spec());
        let mut desired = spec();
        desired.autoscaling_enabled = true;
        desired.read_capacity = Some(50);

        assert!(capacity_changes(&prior, &desired).is_empty());
    }

    #[test]
    fn key_changes_require_replacement() {
        let prior = IndexState::from_spec(&spec());
        let mut desired = spec();
        desired.hash_key = "region".into();
        desired.range_key = Some("created_at".into());
        desired.range_key_type = Some(ScalarType::Number);

        assert_eq!(
            replacement_fields(&prior, &desired),
            vec!["hash_key", "range_key", "range_key_type"]
        );
    }
}
