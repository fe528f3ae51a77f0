//! The tempo map of the chart.
//!
//! A tempo map is a sparse sorted list of [`TempoChange`]s, which [`SortedTempoMap`] owns. Converting between ticks and real time goes through a [`TempoMapAccelerationStructure`], a dense per-tick lookup table built from the tempo changes.
//!
//! The lookup table is not rebuilt automatically. After editing the tempo changes, call [`SortedTempoMap::rebuild_acceleration_structure`] once before converting again.

pub mod acceleration;
pub mod change;
pub mod map;

pub use self::{
    acceleration::TempoMapAccelerationStructure,
    change::{FlyingTimeFactor, Tempo, TempoChange, TempoError, TimeSignature},
    map::{BeatIter, BeatPosition, SortedTempoMap, TargetSpawnTimes},
};
