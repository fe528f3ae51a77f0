//! Structural invariant checks of [`super::SortedTargetList`].
//!
//! The list checks itself after every mutation in debug builds. [`super::SortedTargetList::validate`] exposes the same checks for tests and for tools editing the targets in bulk.

use std::collections::HashMap;

use thiserror::Error;

use crate::time::BeatTick;

use super::{
    flags::{update_chain_flags, update_sync_pair_flags},
    model::{ButtonType, TargetId, TimelineTarget},
};

/// A broken invariant of the sorted target list.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvariantViolation {
    /// The target at `index` is after the next one in `(tick, button_type)` order.
    #[error("target {index} ({tick:?}, {button_type:?}) is out of order")]
    NotSorted {
        /// The index of the target.
        index: usize,
        /// The tick of the target.
        tick: BeatTick,
        /// The button type of the target.
        button_type: ButtonType,
    },
    /// The sync pair flags of the target at `index` do not match the targets on its tick.
    #[error("target {index} has stale sync pair flags")]
    StaleSyncPair {
        /// The index of the target.
        index: usize,
    },
    /// The chain start or end flag of the target at `index` does not match its neighbors.
    #[error("target {index} has stale chain fragment flags")]
    StaleChainFragment {
        /// The index of the target.
        index: usize,
    },
    /// The target at `index` has no id.
    #[error("target {index} has no id")]
    MissingId {
        /// The index of the target.
        index: usize,
    },
    /// The id of the target at `index` is mapped to another index, or not mapped.
    #[error("target {index} has id {id} mapped to {mapped:?}")]
    IdIndexMismatch {
        /// The index of the target.
        index: usize,
        /// The id of the target.
        id: TargetId,
        /// The index which the id is mapped to.
        mapped: Option<usize>,
    },
    /// The id map has entries not in the list, or the same id is shared.
    #[error("id map has {ids} entries for {targets} targets")]
    IdCountMismatch {
        /// The number of the targets.
        targets: usize,
        /// The number of the id map entries.
        ids: usize,
    },
}

/// Checks that `targets` are sorted, their derived flags are up to date, and `id_to_index` maps exactly their ids.
pub(crate) fn validate(
    targets: &[TimelineTarget],
    id_to_index: &HashMap<TargetId, usize>,
) -> Result<(), InvariantViolation> {
    if let Some((index, target)) = targets
        .windows(2)
        .enumerate()
        .find_map(|(index, pair)| match pair {
            [current, next] if current.sort_key() > next.sort_key() => Some((index, current)),
            _ => None,
        })
    {
        return Err(InvariantViolation::NotSorted {
            index,
            tick: target.tick,
            button_type: target.button_type,
        });
    }

    let mut expected = targets.to_vec();
    update_sync_pair_flags(&mut expected);
    update_chain_flags(&mut expected);
    for (index, (actual, expected)) in targets.iter().zip(&expected).enumerate() {
        let (actual, expected) = (actual.flags, expected.flags);
        if actual.is_sync() != expected.is_sync()
            || actual.index_within_sync_pair() != expected.index_within_sync_pair()
            || actual.sync_pair_count() != expected.sync_pair_count()
            || actual.same_type_sync_index() != expected.same_type_sync_index()
            || actual.same_type_sync_count() != expected.same_type_sync_count()
        {
            return Err(InvariantViolation::StaleSyncPair { index });
        }
        if actual.is_chain_start() != expected.is_chain_start()
            || actual.is_chain_end() != expected.is_chain_end()
        {
            return Err(InvariantViolation::StaleChainFragment { index });
        }
    }

    for (index, target) in targets.iter().enumerate() {
        let Some(id) = target.id() else {
            return Err(InvariantViolation::MissingId { index });
        };
        let mapped = id_to_index.get(&id).copied();
        if mapped != Some(index) {
            return Err(InvariantViolation::IdIndexMismatch { index, id, mapped });
        }
    }
    if id_to_index.len() != targets.len() {
        return Err(InvariantViolation::IdCountMismatch {
            targets: targets.len(),
            ids: id_to_index.len(),
        });
    }
    Ok(())
}
