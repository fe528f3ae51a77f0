//! Definition of [`BeatTick`], the fixed-point musical time unit.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};

use num::Integer;

/// The number of ticks in a beat.
///
/// All code is built around this value, so that changing it only changes the maximum precision of the timeline.
pub const TICKS_PER_BEAT: i32 = 192 / 4;

/// The default number of beats in a bar, used by [`BeatTick::from_bars`].
pub const DEFAULT_BEATS_PER_BAR: i32 = 4;

/// A position or a distance on the timeline, in ticks.
///
/// One beat is split into [`TICKS_PER_BEAT`] ticks. Ticks before the first beat are negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BeatTick(i32);

impl BeatTick {
    /// The tick of the chart start.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Creates a tick from the raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: i32) -> Self {
        Self(ticks)
    }

    /// Creates a tick from the whole beats.
    #[must_use]
    pub const fn from_beats(beats: i32) -> Self {
        Self(TICKS_PER_BEAT * beats)
    }

    /// Creates a tick from the whole bars of [`DEFAULT_BEATS_PER_BAR`] beats.
    #[must_use]
    pub const fn from_bars(bars: i32) -> Self {
        Self::from_bars_with_beats(bars, DEFAULT_BEATS_PER_BAR)
    }

    /// Creates a tick from the whole bars of `beats_per_bar` beats.
    #[must_use]
    pub const fn from_bars_with_beats(bars: i32, beats_per_bar: i32) -> Self {
        Self::from_beats(bars * beats_per_bar)
    }

    /// Gets the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> i32 {
        self.0
    }

    /// Gets the position in beats, including the fraction.
    #[must_use]
    pub fn beats_fraction(self) -> f32 {
        self.0 as f32 / TICKS_PER_BEAT as f32
    }

    /// Snaps down onto the grid of `grid` spacing. Negative ticks snap towards negative infinity.
    ///
    /// # Panics
    ///
    /// Panics if `grid` is not positive.
    #[must_use]
    pub fn floor_to_grid(self, grid: Self) -> Self {
        assert!(0 < grid.0, "grid must be positive: {grid:?}");
        Self(Integer::div_floor(&self.0, &grid.0) * grid.0)
    }

    /// Snaps up onto the grid of `grid` spacing.
    ///
    /// # Panics
    ///
    /// Panics if `grid` is not positive.
    #[must_use]
    pub fn ceil_to_grid(self, grid: Self) -> Self {
        let floor = self.floor_to_grid(grid);
        if floor == self { floor } else { floor + grid }
    }

    /// Snaps onto the nearest grid line of `grid` spacing, rounding half up.
    ///
    /// # Panics
    ///
    /// Panics if `grid` is not positive.
    #[must_use]
    pub fn round_to_grid(self, grid: Self) -> Self {
        let floor = self.floor_to_grid(grid);
        if (self - floor).0 * 2 < grid.0 {
            floor
        } else {
            floor + grid
        }
    }
}

impl From<i32> for BeatTick {
    fn from(ticks: i32) -> Self {
        Self(ticks)
    }
}

impl From<BeatTick> for i32 {
    fn from(tick: BeatTick) -> Self {
        tick.0
    }
}

impl Add for BeatTick {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for BeatTick {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i32> for BeatTick {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<i32> for BeatTick {
    type Output = Self;

    fn div(self, rhs: i32) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Rem for BeatTick {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self::Output {
        Self(self.0 % rhs.0)
    }
}

impl Neg for BeatTick {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl AddAssign for BeatTick {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for BeatTick {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl MulAssign<i32> for BeatTick {
    fn mul_assign(&mut self, rhs: i32) {
        self.0 *= rhs;
    }
}

impl DivAssign<i32> for BeatTick {
    fn div_assign(&mut self, rhs: i32) {
        self.0 /= rhs;
    }
}

impl RemAssign for BeatTick {
    fn rem_assign(&mut self, rhs: Self) {
        self.0 %= rhs.0;
    }
}
