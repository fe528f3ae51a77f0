//! Floating point helpers over [`TimeSpan`], the real time unit.
//!
//! Tempos are fractional, so a tick rarely lasts a whole number of nanoseconds. Tempo math is done in `f64` seconds and rounded to the nanosecond once per result, instead of accumulating the rounding of every tick.

pub use gametime::TimeSpan;

/// Conversions between [`TimeSpan`] and seconds in `f64`.
pub trait TimeSpanExt: Sized {
    /// Creates a span from seconds, rounded to the nearest nanosecond.
    ///
    /// Out of range values saturate to [`TimeSpan::MIN`] or [`TimeSpan::MAX`], and `NaN` becomes [`TimeSpan::ZERO`].
    fn from_secs_f64(seconds: f64) -> Self;

    /// Scales the span by a real factor, rounded to the nearest nanosecond.
    #[must_use]
    fn mul_f64(self, factor: f64) -> Self;

    /// Divides the span by another span without truncating.
    fn div_span_f64(self, rhs: Self) -> f64;
}

impl TimeSpanExt for TimeSpan {
    fn from_secs_f64(seconds: f64) -> Self {
        let nanos = (seconds * TimeSpan::SECOND.as_nanos() as f64).round();
        // `as` saturates on overflow and maps `NaN` to zero.
        TimeSpan::new(nanos as i64)
    }

    fn mul_f64(self, factor: f64) -> Self {
        Self::from_secs_f64(self.as_secs_f64() * factor)
    }

    fn div_span_f64(self, rhs: Self) -> f64 {
        self.as_nanos() as f64 / rhs.as_nanos() as f64
    }
}
