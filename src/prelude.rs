//! Prelude module for this crate.
//!
//! This module re-exports the types commonly used with the crate, so that `use chart_timeline::prelude::*;` is enough.

pub use crate::{
    target::{
        ButtonType, ButtonTypeFlags, CHAIN_FRAGMENT_MAX_GAP, InvariantViolation,
        MAX_TARGET_HOLD_DURATION, SortedTargetList, TargetFlags, TargetId, TargetListEditGuard,
        TargetListError, TargetProperties, TargetPropertyFlags, TargetPropertyType,
        TimelineTarget, Vec2,
    },
    tempo::{
        BeatIter, BeatPosition, FlyingTimeFactor, SortedTempoMap, TargetSpawnTimes, Tempo,
        TempoChange, TempoError, TempoMapAccelerationStructure, TimeSignature,
    },
    time::{BeatTick, TICKS_PER_BEAT, TimeSpan, TimeSpanExt},
};
