//! Definitions of a target on the timeline and its attributes.

use std::{
    num::NonZeroU32,
    ops::{BitOr, BitOrAssign, Index, IndexMut},
    sync::atomic::{AtomicU32, Ordering},
};

use crate::time::{BeatTick, TimeSpan};

/// The longest duration a hold target can be held.
pub const MAX_TARGET_HOLD_DURATION: TimeSpan = TimeSpan::new(5 * TimeSpan::SECOND.as_nanos());

/// The button which a target must be hit with.
///
/// Button types are ordered as declared, and targets on the same tick are sorted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ButtonType {
    /// The triangle face button.
    Triangle,
    /// The square face button.
    Square,
    /// The cross face button.
    Cross,
    /// The circle face button.
    Circle,
    /// The slide to the left.
    SlideL,
    /// The slide to the right.
    SlideR,
}

impl ButtonType {
    /// Every button type in order.
    pub const ALL: [Self; 6] = [
        Self::Triangle,
        Self::Square,
        Self::Cross,
        Self::Circle,
        Self::SlideL,
        Self::SlideR,
    ];

    /// Whether this is [`ButtonType::SlideL`] or [`ButtonType::SlideR`].
    #[must_use]
    pub const fn is_slide(self) -> bool {
        matches!(self, Self::SlideL | Self::SlideR)
    }

    /// Swaps the slide direction. Face buttons are returned as is.
    #[must_use]
    pub const fn flip_slide(self) -> Self {
        match self {
            Self::SlideL => Self::SlideR,
            Self::SlideR => Self::SlideL,
            other => other,
        }
    }

    /// Mirrors the button on the face layout, swapping triangle with circle, square with cross, and both slides.
    #[must_use]
    pub const fn mirror(self) -> Self {
        match self {
            Self::Triangle => Self::Circle,
            Self::Circle => Self::Triangle,
            Self::Square => Self::Cross,
            Self::Cross => Self::Square,
            Self::SlideL => Self::SlideR,
            Self::SlideR => Self::SlideL,
        }
    }

    /// Gets the single bit representing this type in [`ButtonTypeFlags`].
    #[must_use]
    pub const fn flag(self) -> ButtonTypeFlags {
        ButtonTypeFlags(1 << self as u8)
    }
}

/// A set of [`ButtonType`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ButtonTypeFlags(u8);

impl ButtonTypeFlags {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// The four face buttons.
    pub const NORMAL_ALL: Self = Self(0b00_1111);
    /// Both slides.
    pub const SLIDE_ALL: Self = Self(0b11_0000);
    /// Every button type.
    pub const ALL: Self = Self(0b11_1111);

    /// Whether `button_type` is in the set.
    #[must_use]
    pub const fn contains(self, button_type: ButtonType) -> bool {
        self.0 & button_type.flag().0 != 0
    }

    /// Counts the types in the set.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the types in the set, in order.
    pub fn iter(self) -> impl Iterator<Item = ButtonType> {
        ButtonType::ALL
            .into_iter()
            .filter(move |&button_type| self.contains(button_type))
    }
}

impl From<ButtonType> for ButtonTypeFlags {
    fn from(value: ButtonType) -> Self {
        value.flag()
    }
}

impl BitOr for ButtonTypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<ButtonType> for ButtonTypeFlags {
    type Output = Self;

    fn bitor(self, rhs: ButtonType) -> Self::Output {
        self | rhs.flag()
    }
}

impl BitOrAssign for ButtonTypeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<ButtonType> for ButtonTypeFlags {
    fn from_iter<T: IntoIterator<Item = ButtonType>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NONE, |flags, ty| flags | ty)
    }
}

/// A 2D vector of the target properties.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    /// The horizontal component.
    pub x: f32,
    /// The vertical component.
    pub y: f32,
}

impl Vec2 {
    /// Creates a vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A scalar component of [`TargetProperties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TargetPropertyType {
    /// The horizontal position.
    PositionX,
    /// The vertical position.
    PositionY,
    /// The angle of the flying path.
    Angle,
    /// The frequency of the flying path wave.
    Frequency,
    /// The amplitude of the flying path wave.
    Amplitude,
    /// The distance the target flies.
    Distance,
}

impl TargetPropertyType {
    /// Every property type in order.
    pub const ALL: [Self; 6] = [
        Self::PositionX,
        Self::PositionY,
        Self::Angle,
        Self::Frequency,
        Self::Amplitude,
        Self::Distance,
    ];

    /// Gets the single bit representing this type in [`TargetPropertyFlags`].
    #[must_use]
    pub const fn flag(self) -> TargetPropertyFlags {
        TargetPropertyFlags(1 << self as u8)
    }
}

/// A set of [`TargetPropertyType`]s, such as the properties to be edited at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TargetPropertyFlags(u8);

impl TargetPropertyFlags {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Both position components.
    pub const POSITION: Self = Self(0b00_0011);
    /// Every property.
    pub const ALL: Self = Self(0b11_1111);

    /// Whether `property` is in the set.
    #[must_use]
    pub const fn contains(self, property: TargetPropertyType) -> bool {
        self.0 & property.flag().0 != 0
    }

    /// Iterates the properties in the set, in order.
    pub fn iter(self) -> impl Iterator<Item = TargetPropertyType> {
        TargetPropertyType::ALL
            .into_iter()
            .filter(move |&property| self.contains(property))
    }
}

impl BitOr for TargetPropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<TargetPropertyType> for TargetPropertyFlags {
    type Output = Self;

    fn bitor(self, rhs: TargetPropertyType) -> Self::Output {
        self | rhs.flag()
    }
}

/// The free-form attributes of a target, which are not part of the ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetProperties {
    /// Where the button is placed.
    pub position: Vec2,
    /// The angle of the flying path, in degrees.
    pub angle: f32,
    /// The frequency of the flying path wave.
    pub frequency: f32,
    /// The amplitude of the flying path wave.
    pub amplitude: f32,
    /// The distance the target flies.
    pub distance: f32,
}

impl TargetProperties {
    /// Gets the component of `property`.
    #[must_use]
    pub const fn get(&self, property: TargetPropertyType) -> f32 {
        match property {
            TargetPropertyType::PositionX => self.position.x,
            TargetPropertyType::PositionY => self.position.y,
            TargetPropertyType::Angle => self.angle,
            TargetPropertyType::Frequency => self.frequency,
            TargetPropertyType::Amplitude => self.amplitude,
            TargetPropertyType::Distance => self.distance,
        }
    }

    /// Gets the component of `property` mutably.
    pub const fn get_mut(&mut self, property: TargetPropertyType) -> &mut f32 {
        match property {
            TargetPropertyType::PositionX => &mut self.position.x,
            TargetPropertyType::PositionY => &mut self.position.y,
            TargetPropertyType::Angle => &mut self.angle,
            TargetPropertyType::Frequency => &mut self.frequency,
            TargetPropertyType::Amplitude => &mut self.amplitude,
            TargetPropertyType::Distance => &mut self.distance,
        }
    }
}

impl Index<TargetPropertyType> for TargetProperties {
    type Output = f32;

    fn index(&self, index: TargetPropertyType) -> &Self::Output {
        match index {
            TargetPropertyType::PositionX => &self.position.x,
            TargetPropertyType::PositionY => &self.position.y,
            TargetPropertyType::Angle => &self.angle,
            TargetPropertyType::Frequency => &self.frequency,
            TargetPropertyType::Amplitude => &self.amplitude,
            TargetPropertyType::Distance => &self.distance,
        }
    }
}

impl IndexMut<TargetPropertyType> for TargetProperties {
    fn index_mut(&mut self, index: TargetPropertyType) -> &mut Self::Output {
        self.get_mut(index)
    }
}

/// The flags of a target, packed into 32 bits.
///
/// `has_properties`, `is_hold`, `is_chain` and `is_chance` are set by the user. The others are derived by [`crate::target::SortedTargetList`] and read only from outside of this crate.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TargetFlags(u32);

impl TargetFlags {
    const HAS_PROPERTIES: u32 = 1 << 0;
    const IS_HOLD: u32 = 1 << 1;
    const IS_CHAIN: u32 = 1 << 2;
    const IS_CHANCE: u32 = 1 << 3;
    const IS_SYNC: u32 = 1 << 4;
    const IS_CHAIN_START: u32 = 1 << 5;
    const IS_CHAIN_END: u32 = 1 << 6;

    const INDEX_WITHIN_SYNC_PAIR_SHIFT: u32 = 8;
    const SYNC_PAIR_COUNT_SHIFT: u32 = 12;
    const SAME_TYPE_SYNC_INDEX_SHIFT: u32 = 16;
    const SAME_TYPE_SYNC_COUNT_SHIFT: u32 = 20;
    const NIBBLE: u32 = 0xF;

    /// The largest value of the 4 bit fields. Larger values saturate to this.
    pub const MAX_SYNC_FIELD: u8 = 15;

    /// Creates the flags with nothing set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Gets the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    const fn bit(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    const fn set_bit(&mut self, mask: u32, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    const fn nibble(self, shift: u32) -> u8 {
        ((self.0 >> shift) & Self::NIBBLE) as u8
    }

    const fn set_nibble(&mut self, shift: u32, value: usize) {
        let value = if value > Self::MAX_SYNC_FIELD as usize {
            Self::MAX_SYNC_FIELD as u32
        } else {
            value as u32
        };
        self.0 = (self.0 & !(Self::NIBBLE << shift)) | (value << shift);
    }

    /// Whether the target has its own [`TargetProperties`] rather than the ones computed by the game.
    #[must_use]
    pub const fn has_properties(self) -> bool {
        self.bit(Self::HAS_PROPERTIES)
    }

    /// Sets whether the target has its own properties.
    pub const fn set_has_properties(&mut self, value: bool) {
        self.set_bit(Self::HAS_PROPERTIES, value);
    }

    /// Whether the target must be held.
    #[must_use]
    pub const fn is_hold(self) -> bool {
        self.bit(Self::IS_HOLD)
    }

    /// Sets whether the target must be held.
    pub const fn set_is_hold(&mut self, value: bool) {
        self.set_bit(Self::IS_HOLD, value);
    }

    /// Whether the slide target is a part of a chain slide.
    #[must_use]
    pub const fn is_chain(self) -> bool {
        self.bit(Self::IS_CHAIN)
    }

    /// Sets whether the slide target is a part of a chain slide.
    pub const fn set_is_chain(&mut self, value: bool) {
        self.set_bit(Self::IS_CHAIN, value);
    }

    /// Whether the target is in a chance time.
    #[must_use]
    pub const fn is_chance(self) -> bool {
        self.bit(Self::IS_CHANCE)
    }

    /// Sets whether the target is in a chance time.
    pub const fn set_is_chance(&mut self, value: bool) {
        self.set_bit(Self::IS_CHANCE, value);
    }

    /// Whether another target shares the tick.
    #[must_use]
    pub const fn is_sync(self) -> bool {
        self.bit(Self::IS_SYNC)
    }

    /// Gets the index in the targets sharing the tick.
    #[must_use]
    pub const fn index_within_sync_pair(self) -> u8 {
        self.nibble(Self::INDEX_WITHIN_SYNC_PAIR_SHIFT)
    }

    /// Gets the number of the targets sharing the tick, `1` for a lone target.
    #[must_use]
    pub const fn sync_pair_count(self) -> u8 {
        self.nibble(Self::SYNC_PAIR_COUNT_SHIFT)
    }

    /// Gets the index in the targets sharing both the tick and the button type.
    #[must_use]
    pub const fn same_type_sync_index(self) -> u8 {
        self.nibble(Self::SAME_TYPE_SYNC_INDEX_SHIFT)
    }

    /// Gets the number of the targets sharing both the tick and the button type.
    #[must_use]
    pub const fn same_type_sync_count(self) -> u8 {
        self.nibble(Self::SAME_TYPE_SYNC_COUNT_SHIFT)
    }

    /// Whether the chain slide target starts a chain fragment.
    #[must_use]
    pub const fn is_chain_start(self) -> bool {
        self.bit(Self::IS_CHAIN_START)
    }

    /// Whether the chain slide target ends a chain fragment.
    #[must_use]
    pub const fn is_chain_end(self) -> bool {
        self.bit(Self::IS_CHAIN_END)
    }

    pub(crate) const fn set_sync_pair(&mut self, index: usize, count: usize) {
        self.set_bit(Self::IS_SYNC, count > 1);
        self.set_nibble(Self::INDEX_WITHIN_SYNC_PAIR_SHIFT, index);
        self.set_nibble(Self::SYNC_PAIR_COUNT_SHIFT, count);
    }

    pub(crate) const fn set_same_type_sync(&mut self, index: usize, count: usize) {
        self.set_nibble(Self::SAME_TYPE_SYNC_INDEX_SHIFT, index);
        self.set_nibble(Self::SAME_TYPE_SYNC_COUNT_SHIFT, count);
    }

    pub(crate) const fn set_chain_bounds(&mut self, is_start: bool, is_end: bool) {
        self.set_bit(Self::IS_CHAIN_START, is_start);
        self.set_bit(Self::IS_CHAIN_END, is_end);
    }
}

impl std::fmt::Debug for TargetFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetFlags")
            .field("has_properties", &self.has_properties())
            .field("is_hold", &self.is_hold())
            .field("is_chain", &self.is_chain())
            .field("is_chance", &self.is_chance())
            .field("is_sync", &self.is_sync())
            .field("index_within_sync_pair", &self.index_within_sync_pair())
            .field("sync_pair_count", &self.sync_pair_count())
            .field("same_type_sync_index", &self.same_type_sync_index())
            .field("same_type_sync_count", &self.same_type_sync_count())
            .field("is_chain_start", &self.is_chain_start())
            .field("is_chain_end", &self.is_chain_end())
            .finish()
    }
}

/// A stable handle of a target, unique in the process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TargetId(NonZeroU32);

static NEXT_TARGET_ID: AtomicU32 = AtomicU32::new(1);

impl TargetId {
    /// Allocates a new id from the process wide counter.
    ///
    /// # Panics
    ///
    /// Panics when the ids are exhausted.
    #[must_use]
    pub fn next_unique() -> Self {
        let raw = NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed);
        let Some(id) = NonZeroU32::new(raw) else {
            panic!("target ids exhausted");
        };
        Self(id)
    }

    /// Gets the raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A target on the timeline, a note to be hit on its tick with its button.
///
/// Targets are sorted by their tick and then their button type in [`crate::target::SortedTargetList`]. The id is given by the list on adding, and cannot be rewritten afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimelineTarget {
    /// The tick to be hit.
    pub tick: BeatTick,
    /// The button to be hit with.
    pub button_type: ButtonType,
    /// Whether the target is selected in the editor.
    pub is_selected: bool,
    /// The user and derived flags.
    pub flags: TargetFlags,
    /// The attributes, which are used if [`TargetFlags::has_properties`] is set.
    pub properties: TargetProperties,
    id: Option<TargetId>,
}

impl TimelineTarget {
    /// Creates a target without an id, to be given by a list.
    #[must_use]
    pub fn new(tick: BeatTick, button_type: ButtonType) -> Self {
        Self {
            tick,
            button_type,
            is_selected: false,
            flags: TargetFlags::new(),
            properties: TargetProperties::default(),
            id: None,
        }
    }

    /// Creates a target carrying `id`, such as the one removed before and to be added back.
    #[must_use]
    pub fn with_id(tick: BeatTick, button_type: ButtonType, id: TargetId) -> Self {
        Self {
            id: Some(id),
            ..Self::new(tick, button_type)
        }
    }

    /// Gets the id, which is `None` until added into a list.
    #[must_use]
    pub const fn id(&self) -> Option<TargetId> {
        self.id
    }

    pub(crate) const fn set_id(&mut self, id: TargetId) {
        self.id = Some(id);
    }

    /// Gets the key which targets are sorted by.
    #[must_use]
    pub const fn sort_key(&self) -> (BeatTick, ButtonType) {
        (self.tick, self.button_type)
    }
}
