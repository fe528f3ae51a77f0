//! The timeline data model of rhythm game chart editors.
//!
//! This crate consists of three parts: musical/real time units, the tempo map, and the sorted target list.
//!
//! `time` module provides [`time::BeatTick`], the fixed-point musical time unit which every chart position is stored in, and re-exports [`time::TimeSpan`] of `gametime` as the real time unit.
//!
//! `tempo` module provides [`tempo::SortedTempoMap`], which owns the tempo changes of the chart and converts between ticks and real time through a precomputed lookup table.
//!
//! `target` module provides [`target::SortedTargetList`], which owns the targets (the notes to be hit) of the chart and keeps their derived flags (sync pairs and chain fragments) up to date.
//!
//! In detail, our policies are:
//!
//! - Every mutation of a collection leaves it sorted and its derived data consistent. There is no way to observe a half updated list.
//! - Rebuilding the tempo lookup table is explicit, so that many tempo edits can be batched.
//! - Programming errors (such as a negative BPM) panic, and lookups of missing values return `None`.
//!
//! # Example
//!
//! ```
//! use chart_timeline::prelude::*;
//!
//! let mut tempo_map = SortedTempoMap::new();
//! tempo_map.set_tempo_change(BeatTick::zero(), Tempo::new(120.0), TimeSignature::DEFAULT);
//! tempo_map.rebuild_acceleration_structure();
//! let time = tempo_map.tick_to_time(BeatTick::from_beats(4));
//! assert_eq!(time, TimeSpan::SECOND * 2);
//!
//! let mut targets = SortedTargetList::new();
//! targets.add(TimelineTarget::new(BeatTick::from_beats(1), ButtonType::Circle));
//! targets.add(TimelineTarget::new(BeatTick::from_beats(1), ButtonType::Triangle));
//! assert_eq!(targets[0].button_type, ButtonType::Triangle);
//! assert!(targets[1].flags.is_sync());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod prelude;
pub mod target;
pub mod tempo;
pub mod time;
