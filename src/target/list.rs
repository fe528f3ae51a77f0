//! This module introduces struct [`SortedTargetList`], which owns the targets of the chart.

use std::{
    collections::{HashMap, HashSet},
    ops::{Deref, DerefMut, Index, Range},
};

use thiserror::Error;

use crate::time::BeatTick;

use super::{
    flags::{ceil_to_sync_pair, floor_to_sync_pair, update_chain_flags, update_sync_pair_flags},
    model::{ButtonType, TargetId, TimelineTarget},
    validity::{self, InvariantViolation},
};

/// An error on loading targets into a [`SortedTargetList`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetListError {
    /// A target to be loaded already has an id, which must be given by the list.
    #[error("target {index} already has id {id}")]
    IdAlreadyAssigned {
        /// The index of the target in the input.
        index: usize,
        /// The id the target has.
        id: TargetId,
    },
}

/// The targets of the chart, sorted by their tick and then their button type.
///
/// Every target in the list has a unique [`TargetId`], which stays the same while the target moves around. The derived flags of the targets (sync pairs and chain fragments) are updated on every mutation.
///
/// The targets cannot be mutated through indexing. Use [`SortedTargetList::edit_range`] or [`SortedTargetList::edit_all`] to edit them in place, which sorts them and updates the flags on drop.
#[derive(Debug, Clone, Default)]
pub struct SortedTargetList {
    targets: Vec<TimelineTarget>,
    id_to_index: HashMap<TargetId, usize>,
}

impl SortedTargetList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the target, giving a new id if it has none, and returns its id.
    ///
    /// A target added on the same tick with the same button type as existing ones is placed after them.
    ///
    /// # Panics
    ///
    /// Panics if the id of `target` is already in the list.
    pub fn add(&mut self, mut target: TimelineTarget) -> TargetId {
        let id = target.id().unwrap_or_else(TargetId::next_unique);
        assert!(
            !self.id_to_index.contains_key(&id),
            "target {id} is already in the list"
        );
        target.set_id(id);

        let key = target.sort_key();
        let index = self
            .targets
            .partition_point(|other| other.sort_key() <= key);
        self.targets.insert(index, target);
        self.remap_ids(index..self.targets.len());

        self.update_sync_pair_flags_around(index, index);
        update_chain_flags(&mut self.targets);
        self.debug_validate();
        id
    }

    /// Removes the target with the same id, or the first one with the same tick and button type if not found.
    ///
    /// Returns the removed target, or `None` if nothing matched.
    pub fn remove(&mut self, target: &TimelineTarget) -> Option<TimelineTarget> {
        let index = target
            .id()
            .and_then(|id| self.find_index_by_id(id))
            .or_else(|| self.find_index_of(target.tick, target.button_type))?;
        self.remove_at(index)
    }

    /// Removes the target at `index`, or returns `None` if out of bounds.
    pub fn remove_at(&mut self, index: usize) -> Option<TimelineTarget> {
        if self.targets.len() <= index {
            return None;
        }
        let removed = self.targets.remove(index);
        if let Some(id) = removed.id() {
            self.id_to_index.remove(&id);
        }
        self.remap_ids(index..self.targets.len());

        if !self.targets.is_empty() {
            self.update_sync_pair_flags_around(index.saturating_sub(1), index);
        }
        update_chain_flags(&mut self.targets);
        self.debug_validate();
        Some(removed)
    }

    /// Removes all the targets.
    pub fn clear(&mut self) {
        self.targets.clear();
        self.id_to_index.clear();
    }

    /// Replaces all the targets with new ones, giving them new ids.
    ///
    /// # Panics
    ///
    /// Panics if any of `targets` already has an id. Use the [`TryFrom`] implementation to handle it.
    pub fn replace_all(&mut self, targets: Vec<TimelineTarget>) {
        if let Err(err) = Self::check_no_ids(&targets) {
            panic!("{err}");
        }
        self.load(targets);
    }

    fn check_no_ids(targets: &[TimelineTarget]) -> Result<(), TargetListError> {
        match targets
            .iter()
            .enumerate()
            .find_map(|(index, target)| Some((index, target.id()?)))
        {
            Some((index, id)) => Err(TargetListError::IdAlreadyAssigned { index, id }),
            None => Ok(()),
        }
    }

    fn load(&mut self, mut targets: Vec<TimelineTarget>) {
        for target in &mut targets {
            target.set_id(TargetId::next_unique());
        }
        targets.sort_by_key(TimelineTarget::sort_key);
        self.targets = targets;
        self.id_to_index.clear();
        self.remap_ids(0..self.targets.len());

        update_sync_pair_flags(&mut self.targets);
        update_chain_flags(&mut self.targets);
        log::debug!("loaded {} targets", self.targets.len());
        self.debug_validate();
    }

    /// Finds the index of the first target on `tick`.
    #[must_use]
    pub fn find_index(&self, tick: BeatTick) -> Option<usize> {
        let index = self.targets.partition_point(|target| target.tick < tick);
        self.targets
            .get(index)
            .is_some_and(|target| target.tick == tick)
            .then_some(index)
    }

    /// Finds the index of the first target on `tick` with `button_type`.
    #[must_use]
    pub fn find_index_of(&self, tick: BeatTick, button_type: ButtonType) -> Option<usize> {
        let key = (tick, button_type);
        let index = self
            .targets
            .partition_point(|target| target.sort_key() < key);
        self.targets
            .get(index)
            .is_some_and(|target| target.sort_key() == key)
            .then_some(index)
    }

    /// Finds the index of the target with `id`.
    #[must_use]
    pub fn find_index_by_id(&self, id: TargetId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    /// Gets the number of the targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Gets the target at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TimelineTarget> {
        self.targets.get(index)
    }

    /// Iterates the targets in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimelineTarget> {
        self.targets.iter()
    }

    /// Gets the targets as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[TimelineTarget] {
        &self.targets
    }

    /// Sorts the targets in `range` and updates their flags, after editing them in place.
    ///
    /// The range is widened to the whole runs of the same tick. If the sorted targets no longer fit between their neighbors, the whole list is sorted instead.
    ///
    /// Targets outside of `range` always keep their ids. A target in `range` without an id, or with an id already used by a target outside of `range` or earlier in `range`, gets a new id.
    pub fn explicitly_update_flags_and_sort_range(&mut self, range: Range<usize>) {
        let len = self.targets.len();
        let end = range.end.min(len);
        let start = range.start.min(end);
        if start == end {
            return;
        }

        self.resolve_edited_ids(start..end);
        if let Some(edited) = self.targets.get_mut(start..end) {
            edited.sort_by_key(TimelineTarget::sort_key);
        }
        let in_order = |left: Option<usize>, right: usize| {
            left.and_then(|left| self.targets.get(left))
                .zip(self.targets.get(right))
                .is_none_or(|(left, right)| left.sort_key() <= right.sort_key())
        };
        let fits = in_order(start.checked_sub(1), start) && in_order(Some(end - 1), end);

        let (update_start, update_end) = if fits {
            (
                floor_to_sync_pair(&self.targets, start.saturating_sub(1)),
                ceil_to_sync_pair(&self.targets, end),
            )
        } else {
            log::warn!(
                "edited targets {start}..{end} moved out of their neighbors, sorting all {len} targets"
            );
            self.targets.sort_by_key(TimelineTarget::sort_key);
            (0, len)
        };

        self.id_to_index.clear();
        self.remap_ids(0..len);
        log::trace!("updating sync pair flags of targets {update_start}..{update_end}");
        if let Some(updated) = self.targets.get_mut(update_start..update_end) {
            update_sync_pair_flags(updated);
        }
        update_chain_flags(&mut self.targets);
        self.debug_validate();
    }

    /// Sorts all the targets and updates their flags, after editing them in place.
    pub fn explicitly_update_flags_and_sort_everything(&mut self) {
        self.explicitly_update_flags_and_sort_range(0..self.targets.len());
    }

    /// Borrows the targets in `range` mutably. They are sorted and their flags are updated when the guard is dropped.
    ///
    /// The range is clamped into the list.
    pub fn edit_range(&mut self, range: Range<usize>) -> TargetListEditGuard<'_> {
        let end = range.end.min(self.targets.len());
        let start = range.start.min(end);
        TargetListEditGuard {
            list: self,
            range: start..end,
        }
    }

    /// Borrows all the targets mutably. They are sorted and their flags are updated when the guard is dropped.
    pub fn edit_all(&mut self) -> TargetListEditGuard<'_> {
        self.edit_range(0..self.targets.len())
    }

    /// Checks the invariants of the list: sorted, derived flags up to date, and the id map matching the targets.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        validity::validate(&self.targets, &self.id_to_index)
    }

    fn debug_validate(&self) {
        debug_assert_eq!(self.validate(), Ok(()));
    }

    fn remap_ids(&mut self, range: Range<usize>) {
        let start = range.start;
        let Some(targets) = self.targets.get(range) else {
            return;
        };
        for (offset, target) in targets.iter().enumerate() {
            if let Some(id) = target.id() {
                self.id_to_index.insert(id, start + offset);
            }
        }
    }

    /// Gives new ids to the targets in `range` which lost theirs or copied one, before they move.
    fn resolve_edited_ids(&mut self, range: Range<usize>) {
        let Some((before, rest)) = self.targets.split_at_mut_checked(range.start) else {
            return;
        };
        let Some((edited, after)) = rest.split_at_mut_checked(range.len()) else {
            return;
        };
        let mut taken: HashSet<TargetId> = before
            .iter()
            .chain(after.iter())
            .filter_map(TimelineTarget::id)
            .collect();
        for (offset, target) in edited.iter_mut().enumerate() {
            match target.id() {
                Some(id) if taken.insert(id) => {}
                _ => {
                    let id = TargetId::next_unique();
                    log::debug!("edited target {} got new id {id}", range.start + offset);
                    target.set_id(id);
                    taken.insert(id);
                }
            }
        }
    }

    fn update_sync_pair_flags_around(&mut self, first: usize, last: usize) {
        let start = floor_to_sync_pair(&self.targets, first);
        let end = ceil_to_sync_pair(&self.targets, last);
        log::trace!("updating sync pair flags of targets {start}..{end}");
        if let Some(run) = self.targets.get_mut(start..end) {
            update_sync_pair_flags(run);
        }
    }
}

impl Index<usize> for SortedTargetList {
    type Output = TimelineTarget;

    fn index(&self, index: usize) -> &Self::Output {
        let len = self.targets.len();
        self.targets
            .get(index)
            .unwrap_or_else(|| panic!("target index {index} out of bounds for {len} targets"))
    }
}

impl<'a> IntoIterator for &'a SortedTargetList {
    type Item = &'a TimelineTarget;
    type IntoIter = std::slice::Iter<'a, TimelineTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl TryFrom<Vec<TimelineTarget>> for SortedTargetList {
    type Error = TargetListError;

    /// Loads the targets without ids, giving them new ids.
    fn try_from(targets: Vec<TimelineTarget>) -> Result<Self, Self::Error> {
        Self::check_no_ids(&targets)?;
        let mut list = Self::new();
        list.load(targets);
        Ok(list)
    }
}

impl FromIterator<TimelineTarget> for SortedTargetList {
    /// Loads the targets, giving them new ids.
    ///
    /// # Panics
    ///
    /// Panics if any of the targets already has an id.
    fn from_iter<T: IntoIterator<Item = TimelineTarget>>(iter: T) -> Self {
        let mut list = Self::new();
        list.replace_all(iter.into_iter().collect());
        list
    }
}

/// Mutable access to a range of a [`SortedTargetList`], from [`SortedTargetList::edit_range`].
///
/// Dropping it sorts the range and updates the derived flags, so the list is consistent again whenever it is observable.
#[derive(Debug)]
pub struct TargetListEditGuard<'a> {
    list: &'a mut SortedTargetList,
    range: Range<usize>,
}

impl TargetListEditGuard<'_> {
    /// Gets the range of the list being edited.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }
}

impl Deref for TargetListEditGuard<'_> {
    type Target = [TimelineTarget];

    fn deref(&self) -> &Self::Target {
        self.list.targets.get(self.range.clone()).unwrap_or(&[])
    }
}

impl DerefMut for TargetListEditGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.list
            .targets
            .get_mut(self.range.clone())
            .unwrap_or(&mut [])
    }
}

impl Drop for TargetListEditGuard<'_> {
    fn drop(&mut self) {
        self.list
            .explicitly_update_flags_and_sort_range(self.range.clone());
    }
}
