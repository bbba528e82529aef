//! Delete a global secondary index.

use tracing::{info, instrument};

use super::wait::wait_for_index_deleted;
use crate::controller::ControllerSettings;
use crate::errors::{GsiError, Phase};
use crate::model::IndexIdentity;
use crate::store::{IndexUpdate, TableStore, UpdateTableRequest};

/// Delete the index and block until it no longer appears on the table.
///
/// An index (or table) that is already gone counts as deleted.
#[instrument(skip(store, settings, id), fields(table = %id.table_name, index = %id.index_name))]
pub fn delete_index<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    id: &IndexIdentity,
) -> Result<(), GsiError> {
    let request = UpdateTableRequest {
        table_name: id.table_name.clone(),
        attribute_definitions: None,
        index_update: IndexUpdate::Delete {
            index_name: id.index_name.clone(),
        },
    };

    match store.update_table(request) {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            info!("index already absent");
            return Ok(());
        }
        Err(e) => {
            return Err(GsiError::remote(
                &id.table_name,
                &id.index_name,
                Phase::Delete,
                e,
            ));
        }
    }

    wait_for_index_deleted(store, settings, &id.table_name, &id.index_name)?;
    info!("index deleted");
    Ok(())
}
