//! Derivation of the sync pair and chain fragment flags.
//!
//! Sync pairs are local: a target only shares its flags with the targets on the same tick, which are adjacent in a sorted list. So they are updated over whole runs of the same tick around the edit.
//!
//! Chain fragments are not local, adding a slide in the middle of a chain may split or merge fragments far away. So they are always updated over the whole list.

use crate::time::BeatTick;

use super::model::{ButtonType, TimelineTarget};

/// The largest tick gap between two chain slides of the same direction to be in the same fragment.
///
/// This is a fixed tick distance, independent of the tempo.
pub const CHAIN_FRAGMENT_MAX_GAP: BeatTick = BeatTick::from_ticks(BeatTick::from_bars(1).ticks() / 12);

/// Finds the first index of the run sharing the tick with `targets[index]`.
///
/// `index` is clamped into the slice.
pub(crate) fn floor_to_sync_pair(targets: &[TimelineTarget], index: usize) -> usize {
    let Some(last) = targets.len().checked_sub(1) else {
        return 0;
    };
    let index = index.min(last);
    let Some(tick) = targets.get(index).map(|target| target.tick) else {
        return 0;
    };
    targets
        .get(..index)
        .map_or(0, |before| before.iter().rposition(|target| target.tick != tick).map_or(0, |i| i + 1))
}

/// Finds the index just after the run sharing the tick with `targets[index]`.
///
/// `index` is clamped into the slice.
pub(crate) fn ceil_to_sync_pair(targets: &[TimelineTarget], index: usize) -> usize {
    let Some(last) = targets.len().checked_sub(1) else {
        return 0;
    };
    let index = index.min(last);
    let Some(tick) = targets.get(index).map(|target| target.tick) else {
        return 0;
    };
    targets.get(index + 1..).map_or(targets.len(), |after| {
        after
            .iter()
            .position(|target| target.tick != tick)
            .map_or(targets.len(), |i| index + 1 + i)
    })
}

/// Updates the sync pair flags of `targets`, which must be sorted and must consist of whole runs of the same tick.
pub(crate) fn update_sync_pair_flags(targets: &mut [TimelineTarget]) {
    for run in targets.chunk_by_mut(|a, b| a.tick == b.tick) {
        let count = run.len();
        for (index, target) in run.iter_mut().enumerate() {
            target.flags.set_sync_pair(index, count);
        }
        for same_type_run in run.chunk_by_mut(|a, b| a.button_type == b.button_type) {
            let count = same_type_run.len();
            for (index, target) in same_type_run.iter_mut().enumerate() {
                target.flags.set_same_type_sync(index, count);
            }
        }
    }
}

/// Updates the chain start and end flags of every target in the sorted `targets`.
///
/// Each slide direction is processed independently. A chain slide starts a fragment unless the previous slide of the same direction is also a chain slide within [`CHAIN_FRAGMENT_MAX_GAP`], and ends a fragment in the same way with the next one. Targets without [`super::TargetFlags::is_chain`] never start nor end a fragment.
pub(crate) fn update_chain_flags(targets: &mut [TimelineTarget]) {
    for target in targets.iter_mut().filter(|target| !target.button_type.is_slide()) {
        target.flags.set_chain_bounds(false, false);
    }

    for direction in [ButtonType::SlideL, ButtonType::SlideR] {
        let slides: Vec<(usize, BeatTick, bool)> = targets
            .iter()
            .enumerate()
            .filter(|(_, target)| target.button_type == direction)
            .map(|(index, target)| (index, target.tick, target.flags.is_chain()))
            .collect();

        for (position, &(index, tick, is_chain)) in slides.iter().enumerate() {
            let is_linked_with = |neighbor: Option<&(usize, BeatTick, bool)>| {
                neighbor.is_some_and(|&(_, neighbor_tick, neighbor_is_chain)| {
                    let gap = (tick - neighbor_tick).ticks().abs();
                    neighbor_is_chain && gap <= CHAIN_FRAGMENT_MAX_GAP.ticks()
                })
            };
            let (is_start, is_end) = if is_chain {
                let previous = position.checked_sub(1).and_then(|p| slides.get(p));
                let next = slides.get(position + 1);
                (!is_linked_with(previous), !is_linked_with(next))
            } else {
                (false, false)
            };
            if let Some(target) = targets.get_mut(index) {
                target.flags.set_chain_bounds(is_start, is_end);
            }
        }
    }
}
