//! Schema migration runner.
//!
//! A state machine over packed version integers: read the current version,
//! apply the single step that starts there, re-read, repeat until the target
//! is reached. Steps apply one version at a time, never batched; each step's
//! own statements advance the version row. The runner has no cycle
//! detection; upgrade chains must have no cycles and no gaps.

use crate::error::Result;
use crate::store::WorkStore;
use crate::version::DataVersion;

/// Drive the store's stored version to `target`.
///
/// The whole walk runs inside one transaction, so a failed run leaves the
/// version exactly as it was before the call, never at an intermediate step.
pub(crate) fn run<S: WorkStore + ?Sized>(store: &mut S, target: i32) -> Result<bool> {
    let current = store.data_version()?;
    if current == target {
        return Ok(true);
    }

    log::info!(
        "migrating schema from {} to {}",
        DataVersion::unpack(current),
        DataVersion::unpack(target)
    );

    store.begin_transaction()?;
    match step_until(store, current, target) {
        Ok(true) => {
            store.commit_transaction()?;
            Ok(true)
        }
        Ok(false) => {
            store.rollback_transaction()?;
            Ok(false)
        }
        Err(e) => {
            let _ = store.rollback_transaction();
            Err(e)
        }
    }
}

fn step_until<S: WorkStore + ?Sized>(store: &mut S, mut current: i32, target: i32) -> Result<bool> {
    while current != target {
        if !store.upgrade_step(current)? {
            log::warn!(
                "no migration step starts at version {}, target {} unreachable",
                DataVersion::unpack(current),
                DataVersion::unpack(target)
            );
            return Ok(false);
        }
        let next = store.data_version()?;
        if next == current {
            log::warn!(
                "migration step at version {} did not advance the version row",
                DataVersion::unpack(current)
            );
            return Ok(false);
        }
        log::info!(
            "schema migrated {} -> {}",
            DataVersion::unpack(current),
            DataVersion::unpack(next)
        );
        current = next;
    }
    Ok(true)
}
