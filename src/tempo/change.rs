//! Definitions of a tempo map breakpoint.

use thiserror::Error;

use crate::time::{BeatTick, TICKS_PER_BEAT, TimeSpan, TimeSpanExt};

/// An error on constructing tempo map values from unchecked input.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TempoError {
    /// The BPM was not a finite value in [`Tempo::MIN_BPM`]..=[`Tempo::MAX_BPM`].
    #[error("BPM out of range: {0}")]
    BpmOutOfRange(f32),
    /// The numerator or denominator was not in [`TimeSignature::MIN_VALUE`]..=[`TimeSignature::MAX_VALUE`].
    #[error("time signature out of range: {numerator}/{denominator}")]
    SignatureOutOfRange {
        /// The requested numerator.
        numerator: i16,
        /// The requested denominator.
        denominator: i16,
    },
    /// The flying time factor was not a finite positive value.
    #[error("flying time factor must be finite and positive: {0}")]
    InvalidFlyingTimeFactor(f32),
    /// Tempo changes must not be placed before the chart start.
    #[error("tempo change on negative tick: {0:?}")]
    NegativeTick(BeatTick),
}

/// A tempo, in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo {
    /// The beats in a minute.
    pub beats_per_minute: f32,
}

impl Tempo {
    /// The minimum BPM accepted by [`Tempo::try_new`].
    pub const MIN_BPM: f32 = 1.0;
    /// The maximum BPM accepted by [`Tempo::try_new`].
    pub const MAX_BPM: f32 = 960.0;
    /// The tempo of a new chart.
    pub const DEFAULT: Self = Self::new(160.0);

    /// Creates a tempo without validation.
    #[must_use]
    pub const fn new(beats_per_minute: f32) -> Self {
        Self { beats_per_minute }
    }

    /// Creates a tempo, rejecting values outside of [`Tempo::MIN_BPM`]..=[`Tempo::MAX_BPM`].
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::BpmOutOfRange`] if the BPM is out of range or not finite.
    pub fn try_new(beats_per_minute: f32) -> Result<Self, TempoError> {
        if (Self::MIN_BPM..=Self::MAX_BPM).contains(&beats_per_minute) {
            Ok(Self::new(beats_per_minute))
        } else {
            Err(TempoError::BpmOutOfRange(beats_per_minute))
        }
    }

    /// Gets the length of a beat in seconds.
    #[must_use]
    pub fn seconds_per_beat(self) -> f64 {
        60.0 / f64::from(self.beats_per_minute)
    }

    /// Gets the length of a tick in seconds, without rounding to the nanosecond.
    #[must_use]
    pub fn seconds_per_tick(self) -> f64 {
        self.seconds_per_beat() / f64::from(TICKS_PER_BEAT)
    }

    /// Gets the real time length of a beat.
    #[must_use]
    pub fn beat_duration(self) -> TimeSpan {
        TimeSpan::from_secs_f64(self.seconds_per_beat())
    }

    /// Gets the real time length of a tick, rounded to the nanosecond.
    #[must_use]
    pub fn tick_duration(self) -> TimeSpan {
        TimeSpan::from_secs_f64(self.seconds_per_tick())
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f32> for Tempo {
    type Error = TempoError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

/// A time signature, such as `3/4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// The beats in a bar.
    pub numerator: i16,
    /// The note value of a beat, `4` for quarter notes.
    pub denominator: i16,
}

impl TimeSignature {
    /// The minimum numerator and denominator.
    pub const MIN_VALUE: i16 = 1;
    /// The maximum numerator and denominator.
    pub const MAX_VALUE: i16 = 64;
    /// The signature of a new chart.
    pub const DEFAULT: Self = Self::new(4, 4);

    /// Creates a signature without validation.
    #[must_use]
    pub const fn new(numerator: i16, denominator: i16) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Creates a signature, rejecting parts outside of [`TimeSignature::MIN_VALUE`]..=[`TimeSignature::MAX_VALUE`].
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::SignatureOutOfRange`] if either part is out of range.
    pub fn try_new(numerator: i16, denominator: i16) -> Result<Self, TempoError> {
        let range = Self::MIN_VALUE..=Self::MAX_VALUE;
        if range.contains(&numerator) && range.contains(&denominator) {
            Ok(Self::new(numerator, denominator))
        } else {
            Err(TempoError::SignatureOutOfRange {
                numerator,
                denominator,
            })
        }
    }

    /// Gets the ticks in a beat of this signature. A beat of `x/8` is half of a quarter note, for example.
    #[must_use]
    pub fn ticks_per_beat(self) -> i32 {
        (TICKS_PER_BEAT * 4 / i32::from(self.denominator.max(1))).max(1)
    }

    /// Gets the beats in a bar.
    #[must_use]
    pub fn beats_per_bar(self) -> i32 {
        i32::from(self.numerator.max(1))
    }

    /// Gets the ticks in a bar.
    #[must_use]
    pub fn ticks_per_bar(self) -> i32 {
        self.ticks_per_beat() * self.beats_per_bar()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A factor applied to the tempo when computing how long a target flies before reaching its button.
///
/// A factor of `2.0` makes targets fly twice as fast as the music goes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlyingTimeFactor {
    /// The scale of the tempo.
    pub factor: f32,
}

impl FlyingTimeFactor {
    /// The factor of a new chart.
    pub const DEFAULT: Self = Self::new(1.0);

    /// Creates a factor without validation.
    #[must_use]
    pub const fn new(factor: f32) -> Self {
        Self { factor }
    }

    /// Creates a factor, rejecting non finite or non positive values.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::InvalidFlyingTimeFactor`] on invalid values.
    pub fn try_new(factor: f32) -> Result<Self, TempoError> {
        if factor.is_finite() && 0.0 < factor {
            Ok(Self::new(factor))
        } else {
            Err(TempoError::InvalidFlyingTimeFactor(factor))
        }
    }

    /// Applies this factor to the tempo.
    #[must_use]
    pub fn apply(self, tempo: Tempo) -> Tempo {
        Tempo::new(tempo.beats_per_minute * self.factor)
    }
}

impl Default for FlyingTimeFactor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A breakpoint of the tempo map. It applies from its tick until the next change.
///
/// Tempo changes are compared and ordered by their tick only.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TempoChange {
    /// The tick to begin this tempo.
    pub tick: BeatTick,
    /// The tempo to be.
    pub tempo: Tempo,
    /// The flying time factor to be.
    pub flying_time_factor: FlyingTimeFactor,
    /// The time signature to be.
    pub signature: TimeSignature,
}

impl TempoChange {
    /// The change which a new tempo map starts with.
    pub const DEFAULT: Self = Self::new(
        BeatTick::zero(),
        Tempo::DEFAULT,
        FlyingTimeFactor::DEFAULT,
        TimeSignature::DEFAULT,
    );

    /// Creates a tempo change without validation.
    #[must_use]
    pub const fn new(
        tick: BeatTick,
        tempo: Tempo,
        flying_time_factor: FlyingTimeFactor,
        signature: TimeSignature,
    ) -> Self {
        Self {
            tick,
            tempo,
            flying_time_factor,
            signature,
        }
    }

    /// Creates a tempo change, validating every part.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError`] if the tick is negative or any value is out of range.
    pub fn try_new(
        tick: BeatTick,
        beats_per_minute: f32,
        flying_time_factor: f32,
        numerator: i16,
        denominator: i16,
    ) -> Result<Self, TempoError> {
        if tick < BeatTick::zero() {
            return Err(TempoError::NegativeTick(tick));
        }
        Ok(Self::new(
            tick,
            Tempo::try_new(beats_per_minute)?,
            FlyingTimeFactor::try_new(flying_time_factor)?,
            TimeSignature::try_new(numerator, denominator)?,
        ))
    }

    /// Gets the tempo which targets fly with.
    #[must_use]
    pub fn flying_tempo(&self) -> Tempo {
        self.flying_time_factor.apply(self.tempo)
    }
}

impl Default for TempoChange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PartialEq for TempoChange {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
    }
}

impl Eq for TempoChange {}

impl PartialOrd for TempoChange {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TempoChange {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.tick.cmp(&other.tick)
    }
}
