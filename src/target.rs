//! The targets of the chart and their sorted list.
//!
//! A [`TimelineTarget`] is a note to be hit on its tick with its button. [`SortedTargetList`] owns the targets, keeps them sorted by the tick and the button type, and derives these flags of them:
//!
//! - Sync pairs: the targets sharing the same tick are hit at once. Each of them knows how many targets share the tick and its index among them, also among the ones with the same button type.
//! - Chain fragments: the chain slides of the same direction close to each other (see [`CHAIN_FRAGMENT_MAX_GAP`]) form a fragment. The first and the last slide of each fragment are marked.

pub mod flags;
pub mod list;
pub mod model;
pub mod validity;

pub use self::{
    flags::CHAIN_FRAGMENT_MAX_GAP,
    list::{SortedTargetList, TargetListEditGuard, TargetListError},
    model::{
        ButtonType, ButtonTypeFlags, MAX_TARGET_HOLD_DURATION, TargetFlags, TargetId,
        TargetProperties, TargetPropertyFlags, TargetPropertyType, TimelineTarget, Vec2,
    },
    validity::InvariantViolation,
};
