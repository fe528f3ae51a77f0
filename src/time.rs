//! Definitions of time on the chart.
//!
//! Every position on the chart is stored as a [`BeatTick`], a count of the finest subdivision of a beat. Real time is a [`TimeSpan`] of `gametime`, and converting between the two requires a tempo map (see [`crate::tempo`]).

pub mod beat_tick;
pub mod time_span;

pub use self::{
    beat_tick::{BeatTick, TICKS_PER_BEAT},
    time_span::{TimeSpan, TimeSpanExt},
};
