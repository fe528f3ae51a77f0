//! The lookup table for converting between ticks and real time.

use crate::time::{BeatTick, TimeSpan, TimeSpanExt};

use super::change::{Tempo, TempoChange};

/// A dense lookup table holding the real time of every tick from `0` up to the last tempo change.
///
/// Ticks and times outside of the table are extrapolated linearly with the first or the last tempo, so the table never has to cover the whole song. Tick to time is `O(1)`, and time to tick is a binary search.
///
/// The table is derived data. It is stale after editing the tempo changes until [`TempoMapAccelerationStructure::rebuild`] is called again.
#[derive(Debug, Clone)]
pub struct TempoMapAccelerationStructure {
    tick_times: Vec<TimeSpan>,
    first_tempo: Tempo,
    last_tempo: Tempo,
}

impl Default for TempoMapAccelerationStructure {
    fn default() -> Self {
        Self {
            tick_times: vec![TimeSpan::ZERO],
            first_tempo: Tempo::DEFAULT,
            last_tempo: Tempo::DEFAULT,
        }
    }
}

impl TempoMapAccelerationStructure {
    /// Builds the table from the sorted tempo changes, with the tempo picked by `tempo_of`.
    ///
    /// # Panics
    ///
    /// Panics if `changes` is empty.
    #[must_use]
    pub fn new(changes: &[TempoChange], tempo_of: impl Fn(&TempoChange) -> Tempo) -> Self {
        let mut structure = Self::default();
        structure.rebuild(changes, tempo_of);
        structure
    }

    /// Rebuilds the table from the sorted tempo changes, with the tempo picked by `tempo_of`.
    ///
    /// Each tempo applies from its tick until the next change. The first tempo also covers the ticks before it, if the first change is not on tick `0`.
    ///
    /// # Panics
    ///
    /// Panics if `changes` is empty.
    pub fn rebuild(&mut self, changes: &[TempoChange], tempo_of: impl Fn(&TempoChange) -> Tempo) {
        let (Some(first), Some(last)) = (changes.first(), changes.last()) else {
            panic!("tempo map must have at least one tempo change");
        };
        let table_len = last.tick.ticks().max(0) as usize + 1;

        self.tick_times.clear();
        self.tick_times.resize(table_len, TimeSpan::ZERO);

        // The time where the current segment starts, accumulated per segment for the precision.
        let mut segment_start_time = TimeSpan::ZERO;
        for (index, change) in changes.iter().enumerate() {
            let seconds_per_tick = tempo_of(change).seconds_per_tick();
            let segment_start = if index == 0 {
                0
            } else {
                change.tick.ticks().max(0) as usize
            };
            let segment_end = changes
                .get(index + 1)
                .map_or(table_len, |next| next.tick.ticks().max(0) as usize);

            let Some(segment) = self.tick_times.get_mut(segment_start..segment_end) else {
                continue;
            };
            for (offset, time) in segment.iter_mut().enumerate() {
                *time = segment_start_time + TimeSpan::from_secs_f64(seconds_per_tick * offset as f64);
            }
            segment_start_time += TimeSpan::from_secs_f64(seconds_per_tick * segment.len() as f64);
        }

        self.first_tempo = tempo_of(first);
        self.last_tempo = tempo_of(last);
    }

    /// Gets the tempo used to extrapolate before tick `0`.
    #[must_use]
    pub const fn first_tempo(&self) -> Tempo {
        self.first_tempo
    }

    /// Gets the tempo used to extrapolate after the table.
    #[must_use]
    pub const fn last_tempo(&self) -> Tempo {
        self.last_tempo
    }

    /// Gets the last tick having its own entry in the table.
    #[must_use]
    pub fn last_tabulated_tick(&self) -> BeatTick {
        BeatTick::from_ticks(self.tick_times.len() as i32 - 1)
    }

    /// Gets the time of the last tick in the table.
    #[must_use]
    pub fn last_tabulated_time(&self) -> TimeSpan {
        self.tick_times.last().copied().unwrap_or(TimeSpan::ZERO)
    }

    /// Converts the tick into the real time, looking up the table for the ticks in it.
    #[must_use]
    pub fn tick_to_time(&self, tick: BeatTick) -> TimeSpan {
        let ticks = tick.ticks();
        if ticks < 0 {
            return TimeSpan::from_secs_f64(self.first_tempo.seconds_per_tick() * f64::from(ticks));
        }
        match self.tick_times.get(ticks as usize) {
            Some(&time) => time,
            None => {
                let remaining_ticks = ticks - self.last_tabulated_tick().ticks();
                self.last_tabulated_time()
                    + TimeSpan::from_secs_f64(self.last_tempo.seconds_per_tick() * f64::from(remaining_ticks))
            }
        }
    }

    /// Converts the real time into the nearest tick, searching the table for the times in it.
    ///
    /// Times too far from the chart to be represented saturate to the first or the last [`BeatTick`].
    #[must_use]
    pub fn time_to_tick(&self, time: TimeSpan) -> BeatTick {
        if time.is_negative() {
            let ticks = time.as_secs_f64() / self.first_tempo.seconds_per_tick();
            return BeatTick::from_ticks(ticks.round() as i32);
        }

        let last_time = self.last_tabulated_time();
        if last_time <= time {
            let ticks_past_last = (time - last_time).as_secs_f64() / self.last_tempo.seconds_per_tick();
            let ticks = self
                .last_tabulated_tick()
                .ticks()
                .saturating_add(ticks_past_last.round() as i32);
            return BeatTick::from_ticks(ticks);
        }

        // `tick_times[0]` is zero and `time` is less than the last time, so `0 < right < len` holds on a miss.
        let right = self.tick_times.partition_point(|&tick_time| tick_time < time);
        let (Some(&right_time), Some(&left_time)) = (
            self.tick_times.get(right),
            right.checked_sub(1).and_then(|left| self.tick_times.get(left)),
        ) else {
            return BeatTick::from_ticks(right as i32);
        };
        if right_time == time || right_time - time < time - left_time {
            BeatTick::from_ticks(right as i32)
        } else {
            BeatTick::from_ticks(right as i32 - 1)
        }
    }
}
