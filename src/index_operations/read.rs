//! Observe an index and derive persisted state from it.

use tracing::{debug, instrument, warn};

use crate::attributes::attribute_type;
use crate::errors::{GsiError, Phase, StoreError};
use crate::model::{IndexIdentity, IndexState, ObservedIndex};
use crate::store::{IndexDescription, TableDescription, TableStore};
use crate::types::KeyRole;

/// Describe the table and pick out `index_name`.
///
/// Returns `Ok(None)` when either the table or the index does not exist.
pub(crate) fn describe_index<S: TableStore>(
    store: &S,
    table_name: &str,
    index_name: &str,
) -> Result<Option<(TableDescription, IndexDescription)>, GsiError> {
    let table = match store.describe_table(table_name) {
        Ok(table) => table,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(GsiError::remote(table_name, index_name, Phase::Describe, e)),
    };
    let index = table.index(index_name).cloned();
    Ok(index.map(|index| (table, index)))
}

/// Resolve key types through the table's attribute definitions.
pub fn observe_index(
    table: &TableDescription,
    index: &IndexDescription,
) -> Result<ObservedIndex, GsiError> {
    let mut hash_key = None;
    let mut range_key = None;

    for key in &index.key_schema {
        let Some(scalar_type) = attribute_type(&table.attribute_definitions, &key.attribute_name)
        else {
            return Err(GsiError::MissingAttributeDefinition {
                table: table.name.clone(),
                index: index.name.clone(),
                attribute: key.attribute_name.clone(),
            });
        };
        match key.role {
            KeyRole::Hash => hash_key = Some((key.attribute_name.clone(), scalar_type)),
            KeyRole::Range => range_key = Some((key.attribute_name.clone(), scalar_type)),
        }
    }

    let Some((hash_key, hash_key_type)) = hash_key else {
        return Err(GsiError::remote(
            &table.name,
            &index.name,
            Phase::Describe,
            StoreError::other("index key schema has no HASH key"),
        ));
    };

    Ok(ObservedIndex {
        arn: index.arn.clone(),
        hash_key,
        hash_key_type,
        range_key,
        projection: index.projection.clone(),
        throughput: index.throughput,
        status: index.status,
    })
}

#[instrument(skip(store, id), fields(table = %id.table_name, index = %id.index_name))]
pub fn read_index<S: TableStore>(
    store: &S,
    id: &IndexIdentity,
) -> Result<Option<ObservedIndex>, GsiError> {
    match describe_index(store, &id.table_name, &id.index_name)? {
        Some((table, index)) => {
            let observed = observe_index(&table, &index)?;
            debug!(status = ?observed.status, "index observed");
            Ok(Some(observed))
        }
        None => Ok(None),
    }
}

/// Bring persisted state in line with the remote index.
///
/// `Ok(None)` means the index is gone and the state should be dropped.
pub fn refresh_index<S: TableStore>(
    store: &S,
    state: &IndexState,
) -> Result<Option<IndexState>, GsiError> {
    match read_index(store, &state.id)? {
        Some(observed) => {
            let mut refreshed = state.clone();
            refreshed.apply_observed(&observed);
            Ok(Some(refreshed))
        }
        None => {
            warn!(id = %state.id, "index not found, removing from state");
            Ok(None)
        }
    }
}

/// Adopt an existing index by its `table:index` identifier.
pub fn import_index<S: TableStore>(store: &S, id: &IndexIdentity) -> Result<IndexState, GsiError> {
    match read_index(store, id)? {
        Some(observed) => Ok(IndexState::from_observed(id.clone(), &observed)),
        None => Err(GsiError::not_found(&id.table_name, &id.index_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AttributeDefinition, KeySchemaElement};
    use crate::types::{IndexStatus, ScalarType};

    fn table(defs: Vec<AttributeDefinition>, index: IndexDescription) -> TableDescription {
        TableDescription {
            name: "orders".into(),
            status: Some("ACTIVE".into()),
            attribute_definitions: defs,
            indexes: vec![index],
        }
    }

    fn index(keys: &[(&str, KeyRole)]) -> IndexDescription {
        IndexDescription {
            name: "by_customer".into(),
            arn: None,
            key_schema: keys
                .iter()
                .map(|(name, role)| KeySchemaElement {
                    attribute_name: name.to_string(),
                    role: *role,
                })
                .collect(),
            projection: None,
            throughput: None,
            status: Some(IndexStatus::Active),
        }
    }

    #[test]
    fn resolves_key_types_from_table_definitions() {
        let idx = index(&[("customer_id", KeyRole::Hash), ("created_at", KeyRole::Range)]);
        let t = table(
            vec![
                AttributeDefinition::new("customer_id", ScalarType::String),
                AttributeDefinition::new("created_at", ScalarType::Number),
            ],
            idx.clone(),
        );

        let observed = observe_index(&t, &idx).unwrap();
        assert_eq!(observed.hash_key, "customer_id");
        assert_eq!(observed.hash_key_type, ScalarType::String);
        assert_eq!(
            observed.range_key,
            Some(("created_at".to_string(), ScalarType::Number))
        );
    }

    #[test]
    fn undefined_key_attribute_is_reported() {
        let idx = index(&[("customer_id", KeyRole::Hash)]);
        let t = table(vec![], idx.clone());

        match observe_index(&t, &idx).unwrap_err() {
            GsiError::MissingAttributeDefinition { attribute, .. } => {
                assert_eq!(attribute, "customer_id")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
