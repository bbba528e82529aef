//! Wait for an index to finish a transition.

use tracing::debug;

use crate::controller::ControllerSettings;
use crate::errors::{GsiError, Phase};
use crate::poller::{StateChangeConf, WaitError};
use crate::store::{IndexDescription, TableStore};
use crate::types::IndexStatus;

/// Current status of one index. A missing table or index reads as `None`.
fn index_status<S: TableStore>(
    store: &S,
    table_name: &str,
    index_name: &str,
    phase: Phase,
) -> Result<Option<(IndexDescription, IndexStatus)>, GsiError> {
    let table = match store.describe_table(table_name) {
        Ok(table) => table,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(GsiError::remote(table_name, index_name, phase, e)),
    };

    let Some(index) = table.index(index_name) else {
        return Ok(None);
    };
    match index.status {
        Some(status) => {
            debug!(table = table_name, index = index_name, status = %status, "polled index status");
            Ok(Some((index.clone(), status)))
        }
        None => Err(GsiError::UnexpectedState {
            table: table_name.to_string(),
            index: index_name.to_string(),
            phase,
            status: "<none>".to_string(),
        }),
    }
}

fn wait<S: TableStore>(
    store: &S,
    conf: StateChangeConf<IndexStatus>,
    table_name: &str,
    index_name: &str,
    phase: Phase,
) -> Result<(), GsiError> {
    conf.wait_for_state(|| index_status(store, table_name, index_name, phase))
        .map(|_| ())
        .map_err(|e| match e {
            WaitError::Timeout {
                last_state,
                timeout,
                ..
            } => GsiError::Timeout {
                table: table_name.to_string(),
                index: index_name.to_string(),
                phase,
                timeout,
                last_status: last_state.map_or_else(|| "<none>".to_string(), |s| s.to_string()),
            },
            WaitError::UnexpectedState { state, .. } => GsiError::UnexpectedState {
                table: table_name.to_string(),
                index: index_name.to_string(),
                phase,
                status: state.to_string(),
            },
            WaitError::NotFound { .. } => GsiError::not_found(table_name, index_name),
            WaitError::Refresh(e) => e,
        })
}

/// Wait until a freshly created index is ACTIVE.
pub(crate) fn wait_for_index_active<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    table_name: &str,
    index_name: &str,
) -> Result<(), GsiError> {
    let conf = settings.poll.state_change(
        vec![IndexStatus::Creating, IndexStatus::Updating],
        vec![IndexStatus::Active],
        settings.timeouts.create,
    );
    wait(store, conf, table_name, index_name, Phase::WaitActive)
}

/// Wait until a throughput change has been applied.
///
/// CREATING counts as settled: the index may still be backfilling from its
/// creation when the capacity change lands.
pub(crate) fn wait_for_index_updated<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    table_name: &str,
    index_name: &str,
) -> Result<(), GsiError> {
    let conf = settings.poll.state_change(
        vec![IndexStatus::Updating],
        vec![IndexStatus::Creating, IndexStatus::Active],
        settings.timeouts.update,
    );
    wait(store, conf, table_name, index_name, Phase::WaitUpdated)
}

/// Wait until the index no longer appears on its table.
pub(crate) fn wait_for_index_deleted<S: TableStore>(
    store: &S,
    settings: &ControllerSettings,
    table_name: &str,
    index_name: &str,
) -> Result<(), GsiError> {
    let conf = settings.poll.state_change(
        vec![IndexStatus::Deleting, IndexStatus::Active],
        vec![],
        settings.timeouts.delete,
    );
    wait(store, conf, table_name, index_name, Phase::WaitDeleted)
}
