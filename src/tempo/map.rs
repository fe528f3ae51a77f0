//! This module introduces struct [`SortedTempoMap`], which manages the tempo changes of the chart.

use itertools::Itertools;

use crate::time::{BeatTick, TimeSpan};

use super::{
    acceleration::TempoMapAccelerationStructure,
    change::{FlyingTimeFactor, Tempo, TempoChange, TimeSignature},
};

/// The tempo changes of the chart, sorted by their tick.
///
/// It always has at least one tempo change. Removing the last one puts [`TempoChange::DEFAULT`] back on tick `0`.
///
/// Conversions between ticks and real time read the acceleration structures, which are rebuilt only by [`SortedTempoMap::rebuild_acceleration_structure`]. Batch the edits and rebuild once.
#[derive(Debug, Clone)]
pub struct SortedTempoMap {
    tempo_changes: Vec<TempoChange>,
    acceleration_structure: TempoMapAccelerationStructure,
    flying_time_acceleration_structure: TempoMapAccelerationStructure,
    needs_rebuild: bool,
}

impl Default for SortedTempoMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedTempoMap {
    /// Creates a tempo map with only [`TempoChange::DEFAULT`], ready to convert.
    #[must_use]
    pub fn new() -> Self {
        let tempo_changes = vec![TempoChange::DEFAULT];
        Self {
            acceleration_structure: TempoMapAccelerationStructure::new(&tempo_changes, |change| {
                change.tempo
            }),
            flying_time_acceleration_structure: TempoMapAccelerationStructure::new(
                &tempo_changes,
                TempoChange::flying_tempo,
            ),
            tempo_changes,
            needs_rebuild: false,
        }
    }

    /// Resets into only [`TempoChange::DEFAULT`]. The acceleration structures are not rebuilt.
    pub fn reset(&mut self) {
        self.tempo_changes.clear();
        self.tempo_changes.push(TempoChange::DEFAULT);
        self.needs_rebuild = true;
    }

    /// Inserts a tempo change on `tick`, or updates the change already there.
    ///
    /// An updated change keeps its flying time factor, and a new change inherits the factor in effect at `tick`.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is negative, or the BPM or either part of the signature is not positive.
    pub fn set_tempo_change(&mut self, tick: BeatTick, tempo: Tempo, signature: TimeSignature) {
        let flying_time_factor = self.find_tempo_change_at_tick(tick).flying_time_factor;
        self.set_tempo_change_with_flying_time(tick, tempo, flying_time_factor, signature);
    }

    /// Inserts a tempo change on `tick` with the flying time factor, or updates the change already there.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is negative, or the BPM, the factor or either part of the signature is not positive.
    pub fn set_tempo_change_with_flying_time(
        &mut self,
        tick: BeatTick,
        tempo: Tempo,
        flying_time_factor: FlyingTimeFactor,
        signature: TimeSignature,
    ) {
        let new_change = TempoChange::new(tick, tempo, flying_time_factor, signature);
        assert_valid_change(&new_change);
        match self
            .tempo_changes
            .binary_search_by_key(&tick, |change| change.tick)
        {
            Ok(index) => {
                if let Some(existing) = self.tempo_changes.get_mut(index) {
                    *existing = new_change;
                }
            }
            Err(index) => self.tempo_changes.insert(index, new_change),
        }
        self.needs_rebuild = true;
    }

    /// Removes the tempo change on `tick`, if any. Removing the only change puts [`TempoChange::DEFAULT`] back.
    pub fn remove_tempo_change(&mut self, tick: BeatTick) {
        let Ok(index) = self
            .tempo_changes
            .binary_search_by_key(&tick, |change| change.tick)
        else {
            return;
        };
        self.tempo_changes.remove(index);
        if self.tempo_changes.is_empty() {
            self.tempo_changes.push(TempoChange::DEFAULT);
        }
        self.needs_rebuild = true;
    }

    /// Rebuilds the lookup tables of both the real tempo and the flying time tempo.
    pub fn rebuild_acceleration_structure(&mut self) {
        self.acceleration_structure
            .rebuild(&self.tempo_changes, |change| change.tempo);
        self.flying_time_acceleration_structure
            .rebuild(&self.tempo_changes, TempoChange::flying_tempo);
        self.needs_rebuild = false;
        log::debug!(
            "rebuilt tempo map acceleration structure: {} tempo changes, {} ticks tabulated",
            self.tempo_changes.len(),
            self.acceleration_structure.last_tabulated_tick().ticks() + 1,
        );
    }

    /// Whether the tempo changes were edited after the last rebuild.
    #[must_use]
    pub const fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Converts the tick into the real time.
    #[must_use]
    pub fn tick_to_time(&self, tick: BeatTick) -> TimeSpan {
        self.acceleration_structure.tick_to_time(tick)
    }

    /// Converts the real time into the nearest tick.
    #[must_use]
    pub fn time_to_tick(&self, time: TimeSpan) -> BeatTick {
        self.acceleration_structure.time_to_tick(time)
    }

    /// Converts the tick into the time on the flying time tempo, which only makes sense as a difference of two ticks.
    #[must_use]
    pub fn tick_to_flying_time(&self, tick: BeatTick) -> TimeSpan {
        self.flying_time_acceleration_structure.tick_to_time(tick)
    }

    /// Gets the lookup table of the real tempo.
    #[must_use]
    pub const fn acceleration_structure(&self) -> &TempoMapAccelerationStructure {
        &self.acceleration_structure
    }

    /// Computes when the target on `tick` appears and when it reaches its button.
    ///
    /// A target flies for one bar of four beats at the flying time tempo.
    #[must_use]
    pub fn target_spawn_times(&self, tick: BeatTick) -> TargetSpawnTimes {
        let button_time = self.tick_to_time(tick);
        let flying_time =
            self.tick_to_flying_time(tick) - self.tick_to_flying_time(tick - BeatTick::from_bars(1));
        TargetSpawnTimes {
            spawn_time: button_time - flying_time,
            button_time,
            flying_time,
        }
    }

    /// Finds the tempo change in effect on `tick`, that is the last one not after it.
    ///
    /// Ticks before every change get the first change.
    #[must_use]
    pub fn find_tempo_change_at_tick(&self, tick: BeatTick) -> &TempoChange {
        let after = self
            .tempo_changes
            .partition_point(|change| change.tick <= tick);
        after
            .checked_sub(1)
            .and_then(|index| self.tempo_changes.get(index))
            .or_else(|| self.tempo_changes.first())
            .unwrap_or(&TempoChange::DEFAULT)
    }

    /// Gets the number of the tempo changes, which is at least 1.
    #[must_use]
    pub fn tempo_change_count(&self) -> usize {
        self.tempo_changes.len()
    }

    /// Gets the tempo change at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TempoChange> {
        self.tempo_changes.get(index)
    }

    /// Gets the first tempo change.
    #[must_use]
    pub fn first(&self) -> &TempoChange {
        self.tempo_changes.first().unwrap_or(&TempoChange::DEFAULT)
    }

    /// Gets the last tempo change.
    #[must_use]
    pub fn last(&self) -> &TempoChange {
        self.tempo_changes.last().unwrap_or(&TempoChange::DEFAULT)
    }

    /// Iterates the tempo changes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TempoChange> {
        self.tempo_changes.iter()
    }

    /// Gets the tempo changes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[TempoChange] {
        &self.tempo_changes
    }

    /// Iterates every beat from tick `0`, following the time signatures.
    ///
    /// A time signature change starts a new bar on its tick, even if the previous bar is not complete. A change with the same signature keeps the bar grid going. It ends at [`i32::MAX`] ticks.
    pub fn beats(&self) -> BeatIter<'_> {
        BeatIter::new(&self.tempo_changes)
    }

    /// Iterates the first beat of every bar.
    pub fn bars(&self) -> impl Iterator<Item = BeatPosition> + '_ {
        self.beats().filter(BeatPosition::is_bar)
    }

    /// Calls `visitor` with the tick and the index of every bar, until it returns `true`.
    pub fn for_each_bar(&self, mut visitor: impl FnMut(BeatTick, usize) -> bool) {
        for bar in self.bars() {
            if visitor(bar.tick, bar.bar_index) {
                break;
            }
        }
    }

    /// Calls `visitor` with the tick and the index of the bar of every beat, and whether the beat starts the bar, until it returns `true`.
    pub fn for_each_beat_bar(&self, mut visitor: impl FnMut(BeatTick, usize, bool) -> bool) {
        for beat in self.beats() {
            if visitor(beat.tick, beat.bar_index, beat.is_bar()) {
                break;
            }
        }
    }

    /// Whether a bar starts exactly on `tick`.
    #[must_use]
    pub fn is_tick_on_bar(&self, tick: BeatTick) -> bool {
        self.bars()
            .map(|bar| bar.tick)
            .find(|&bar_tick| tick <= bar_tick)
            .is_some_and(|bar_tick| bar_tick == tick)
    }
}

fn assert_valid_change(change: &TempoChange) {
    let TempoChange {
        tick,
        tempo,
        flying_time_factor,
        signature,
    } = *change;
    assert!(BeatTick::zero() <= tick, "tempo change on negative tick: {tick:?}");
    assert!(
        0.0 < tempo.beats_per_minute,
        "BPM must be positive: {tempo:?}"
    );
    assert!(
        0.0 < flying_time_factor.factor,
        "flying time factor must be positive: {flying_time_factor:?}"
    );
    assert!(
        0 < signature.numerator && 0 < signature.denominator,
        "time signature must be positive: {signature}"
    );
}

impl From<Vec<TempoChange>> for SortedTempoMap {
    /// Creates a tempo map from unsorted changes and builds the acceleration structures. The last change wins on the same tick.
    ///
    /// An empty input results in [`TempoChange::DEFAULT`].
    ///
    /// # Panics
    ///
    /// Panics on the same changes as [`SortedTempoMap::set_tempo_change_with_flying_time`] does: on a negative tick, or a BPM, factor or signature part not positive.
    fn from(mut changes: Vec<TempoChange>) -> Self {
        changes.iter().for_each(assert_valid_change);
        changes.sort();
        let mut tempo_changes: Vec<_> = changes
            .into_iter()
            .rev()
            .dedup_by(|a, b| a.tick == b.tick)
            .collect();
        tempo_changes.reverse();
        if tempo_changes.is_empty() {
            tempo_changes.push(TempoChange::DEFAULT);
        }
        let mut map = Self {
            tempo_changes,
            ..Self::new()
        };
        map.rebuild_acceleration_structure();
        map
    }
}

impl<'a> IntoIterator for &'a SortedTempoMap {
    type Item = &'a TempoChange;
    type IntoIter = std::slice::Iter<'a, TempoChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// When a target appears and reaches its button, from [`SortedTempoMap::target_spawn_times`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetSpawnTimes {
    /// The time the target appears.
    pub spawn_time: TimeSpan,
    /// The time the target must be hit.
    pub button_time: TimeSpan,
    /// The time the target flies, `button_time - spawn_time`.
    pub flying_time: TimeSpan,
}

/// A beat on the timeline, yielded by [`SortedTempoMap::beats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatPosition {
    /// The tick of the beat.
    pub tick: BeatTick,
    /// The index of the bar containing the beat, from `0`.
    pub bar_index: usize,
    /// The index of the beat in its bar, from `0`.
    pub beat_in_bar: i32,
}

impl BeatPosition {
    /// Whether this beat starts a bar.
    #[must_use]
    pub const fn is_bar(&self) -> bool {
        self.beat_in_bar == 0
    }
}

/// An iterator over the beats of the tempo map. See [`SortedTempoMap::beats`].
#[derive(Debug, Clone)]
pub struct BeatIter<'a> {
    tempo_changes: &'a [TempoChange],
    segment: usize,
    tick: Option<i32>,
    next_bar_index: usize,
    beat_in_bar: i32,
}

impl<'a> BeatIter<'a> {
    fn new(tempo_changes: &'a [TempoChange]) -> Self {
        Self {
            tempo_changes,
            segment: 0,
            tick: Some(0),
            next_bar_index: 0,
            beat_in_bar: 0,
        }
    }

    fn signature(&self) -> TimeSignature {
        self.tempo_changes
            .get(self.segment)
            .map_or(TimeSignature::DEFAULT, |change| change.signature)
    }

    fn segment_end(&self) -> i32 {
        self.tempo_changes
            .get(self.segment + 1)
            .map_or(i32::MAX, |next| next.tick.ticks())
    }
}

impl Iterator for BeatIter<'_> {
    type Item = BeatPosition;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tick = self.tick?;
        while self.segment + 1 < self.tempo_changes.len() && self.segment_end() <= tick {
            let previous_signature = self.signature();
            self.segment += 1;
            if let Some(change) = self.tempo_changes.get(self.segment) {
                if change.signature != previous_signature {
                    tick = change.tick.ticks();
                    self.beat_in_bar = 0;
                }
            }
        }

        let signature = self.signature();
        if self.beat_in_bar == 0 {
            self.next_bar_index += 1;
        }
        let position = BeatPosition {
            tick: BeatTick::from_ticks(tick),
            bar_index: self.next_bar_index - 1,
            beat_in_bar: self.beat_in_bar,
        };

        self.beat_in_bar = (self.beat_in_bar + 1) % signature.beats_per_bar();
        self.tick = tick.checked_add(signature.ticks_per_beat());
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::time::TICKS_PER_BEAT;

    fn beat(tick: i32, bar_index: usize, beat_in_bar: i32) -> BeatPosition {
        BeatPosition {
            tick: BeatTick::from_ticks(tick),
            bar_index,
            beat_in_bar,
        }
    }

    #[test]
    fn set_inserts_sorted_and_updates_in_place() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::from_bars(2), Tempo::new(200.0), TimeSignature::DEFAULT);
        map.set_tempo_change(BeatTick::from_bars(1), Tempo::new(180.0), TimeSignature::DEFAULT);
        map.set_tempo_change(BeatTick::from_bars(1), Tempo::new(190.0), TimeSignature::new(3, 4));
        let ticks: Vec<_> = map.iter().map(|change| change.tick).collect();
        assert_eq!(
            ticks,
            vec![BeatTick::zero(), BeatTick::from_bars(1), BeatTick::from_bars(2)]
        );
        let updated = map.find_tempo_change_at_tick(BeatTick::from_bars(1));
        assert_eq!(updated.tempo, Tempo::new(190.0));
        assert_eq!(updated.signature, TimeSignature::new(3, 4));
        assert!(map.needs_rebuild());
    }

    #[test]
    fn new_change_inherits_flying_time_factor() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change_with_flying_time(
            BeatTick::zero(),
            Tempo::new(120.0),
            FlyingTimeFactor::new(2.0),
            TimeSignature::DEFAULT,
        );
        map.set_tempo_change(BeatTick::from_bars(4), Tempo::new(150.0), TimeSignature::DEFAULT);
        assert_eq!(map.last().flying_time_factor, FlyingTimeFactor::new(2.0));
    }

    #[test]
    #[should_panic(expected = "negative tick")]
    fn set_on_negative_tick_panics() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::from_ticks(-1), Tempo::new(120.0), TimeSignature::DEFAULT);
    }

    #[test]
    #[should_panic(expected = "BPM must be positive")]
    fn set_zero_bpm_panics() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::zero(), Tempo::new(0.0), TimeSignature::DEFAULT);
    }

    #[test]
    fn removing_only_change_restores_default() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::zero(), Tempo::new(120.0), TimeSignature::new(3, 4));
        map.remove_tempo_change(BeatTick::zero());
        assert_eq!(map.tempo_change_count(), 1);
        assert_eq!(map.first().tick, BeatTick::zero());
        assert_eq!(map.first().tempo, Tempo::DEFAULT);
        assert_eq!(map.first().signature, TimeSignature::DEFAULT);
    }

    #[test]
    fn removing_missing_tick_is_noop() {
        let mut map = SortedTempoMap::new();
        map.remove_tempo_change(BeatTick::from_beats(3));
        assert_eq!(map.tempo_change_count(), 1);
        assert!(!map.needs_rebuild());
    }

    #[test]
    fn conversions_wait_for_rebuild() {
        let mut map = SortedTempoMap::new();
        let before = map.tick_to_time(BeatTick::from_beats(4));
        map.set_tempo_change(BeatTick::zero(), Tempo::new(120.0), TimeSignature::DEFAULT);
        assert_eq!(map.tick_to_time(BeatTick::from_beats(4)), before);
        map.rebuild_acceleration_structure();
        assert_eq!(map.tick_to_time(BeatTick::from_beats(4)), TimeSpan::SECOND * 2);
    }

    #[test]
    fn beats_follow_signature() {
        let map = SortedTempoMap::new();
        let beats: Vec<_> = map.beats().take(6).collect();
        let tpb = TICKS_PER_BEAT;
        assert_eq!(
            beats,
            vec![
                beat(0, 0, 0),
                beat(tpb, 0, 1),
                beat(tpb * 2, 0, 2),
                beat(tpb * 3, 0, 3),
                beat(tpb * 4, 1, 0),
                beat(tpb * 5, 1, 1),
            ]
        );
    }

    #[test]
    fn signature_change_starts_new_bar() {
        let mut map = SortedTempoMap::new();
        let tpb = TICKS_PER_BEAT;
        map.set_tempo_change(BeatTick::from_ticks(tpb * 2), Tempo::DEFAULT, TimeSignature::new(3, 4));
        let bars: Vec<_> = map.bars().take(3).map(|bar| bar.tick.ticks()).collect();
        assert_eq!(bars, vec![0, tpb * 2, tpb * 5]);
    }

    #[test]
    fn tempo_only_change_keeps_bar_grid() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::from_ticks(72), Tempo::new(200.0), TimeSignature::DEFAULT);
        let bars: Vec<_> = map.bars().take(3).map(|bar| bar.tick).collect();
        assert_eq!(
            bars,
            vec![BeatTick::zero(), BeatTick::from_bars(1), BeatTick::from_bars(2)]
        );
        assert!(map.is_tick_on_bar(BeatTick::from_bars(2)));
        assert!(!map.is_tick_on_bar(BeatTick::from_beats(3)));
    }

    #[test]
    fn eighth_note_signature_beats() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change(BeatTick::zero(), Tempo::DEFAULT, TimeSignature::new(6, 8));
        let bars: Vec<_> = map.bars().take(3).map(|bar| bar.tick.ticks()).collect();
        assert_eq!(bars, vec![0, TICKS_PER_BEAT * 3, TICKS_PER_BEAT * 6]);
    }

    #[test]
    fn visitor_stops_when_asked() {
        let map = SortedTempoMap::new();
        let mut visited = Vec::new();
        map.for_each_bar(|tick, index| {
            visited.push((tick, index));
            index == 2
        });
        assert_eq!(visited.len(), 3);

        let mut beats = 0;
        map.for_each_beat_bar(|_, bar_index, _| {
            beats += 1;
            bar_index == 1
        });
        assert_eq!(beats, 5);
    }

    #[test]
    fn spawn_times_use_flying_tempo() {
        let mut map = SortedTempoMap::new();
        map.set_tempo_change_with_flying_time(
            BeatTick::zero(),
            Tempo::new(120.0),
            FlyingTimeFactor::new(2.0),
            TimeSignature::DEFAULT,
        );
        map.rebuild_acceleration_structure();
        let times = map.target_spawn_times(BeatTick::from_bars(2));
        assert_eq!(times.button_time, TimeSpan::SECOND * 4);
        assert!((times.flying_time.as_secs_f64() - 1.0).abs() < 2e-9);
        assert!((times.spawn_time.as_secs_f64() - 3.0).abs() < 2e-9);
        assert_eq!(times.spawn_time + times.flying_time, times.button_time);
    }

    #[test]
    fn from_unsorted_changes() {
        let tempo = |tick: i32, bpm: f32| {
            TempoChange::new(
                BeatTick::from_ticks(tick),
                Tempo::new(bpm),
                FlyingTimeFactor::DEFAULT,
                TimeSignature::DEFAULT,
            )
        };
        let map = SortedTempoMap::from(vec![tempo(96, 100.0), tempo(0, 120.0), tempo(96, 140.0)]);
        assert_eq!(map.tempo_change_count(), 2);
        assert_eq!(map.last().tempo, Tempo::new(140.0));
        assert!(!map.needs_rebuild());

        let empty = SortedTempoMap::from(Vec::new());
        assert_eq!(empty.as_slice(), &[TempoChange::DEFAULT]);
    }

    #[test]
    #[should_panic(expected = "negative tick")]
    fn from_changes_on_negative_tick_panics() {
        let _ = SortedTempoMap::from(vec![TempoChange::DEFAULT, TempoChange {
            tick: BeatTick::from_ticks(-48),
            ..TempoChange::DEFAULT
        }]);
    }

    #[test]
    #[should_panic(expected = "BPM must be positive")]
    fn from_changes_with_zero_bpm_panics() {
        let _ = SortedTempoMap::from(vec![TempoChange {
            tempo: Tempo::new(0.0),
            ..TempoChange::DEFAULT
        }]);
    }

    #[test]
    #[should_panic(expected = "time signature must be positive")]
    fn from_changes_with_zero_signature_panics() {
        let _ = SortedTempoMap::from(vec![TempoChange {
            signature: TimeSignature::new(0, 4),
            ..TempoChange::DEFAULT
        }]);
    }
}
